#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

pub const NOTEBOOK_JSON: &str = r##"{
 "cells": [
  {
   "cell_type": "code",
   "execution_count": 1,
   "metadata": {},
   "outputs": [],
   "source": ["print('hello')"]
  }
 ],
 "metadata": {
  "kernelspec": {"display_name": "Python 3", "language": "python", "name": "python3"},
  "language_info": {"name": "python", "file_extension": ".py", "nbconvert_exporter": "python"}
 },
 "nbformat": 4,
 "nbformat_minor": 4
}
"##;

pub fn write_notebook(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(format!("{name}.ipynb"));
    fs::write(&path, NOTEBOOK_JSON).unwrap();
    path
}

pub fn write_file(path: &Path, content: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

/// A stand-in for `jupyter` that only understands `nbconvert --to script`.
#[cfg(unix)]
pub fn fake_jupyter(dir: &Path) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join("fake-jupyter");
    fs::write(
        &path,
        "#!/bin/sh\n\
         # nbconvert --to FORMAT --output-dir DIR --output BASE NOTEBOOK\n\
         printf '#!/usr/bin/env python\\n# coding: utf-8\\n\\n# In[1]:\\n\\n\\nprint(1)\\n' > \"$5/$7.py\"\n",
    )
    .unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    path
}
