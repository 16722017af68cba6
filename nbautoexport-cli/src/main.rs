use clap::{Parser, Subcommand};
use nbautoexport::clean::{find_files_to_clean, remove_files};
use nbautoexport::hook::{post_save, save_hook, ContentModel};
use nbautoexport::jupyter_config::{
    default_config_path, install_post_save_hook, post_save_hook_status, HookStatus,
    InstallOutcome,
};
use nbautoexport::notebook::{find_notebooks, Notebook};
use nbautoexport::sentinel::{self, sentinel_path, CleanConfig, NbAutoexportConfig};
use nbautoexport::watcher::NotebookWatcher;
use nbautoexport::{export_notebook, ExportFormat, NbAutoexportError, NbConvert, OrganizeBy};
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use std::process;

/// Automatically export Jupyter notebooks to various file formats (.py, .html, and more) upon save.
#[derive(Parser)]
#[command(name = "nbautoexport", version, about)]
struct Cli {
    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// The `jupyter` executable used to run nbconvert
    #[arg(long, global = true, default_value = "jupyter")]
    jupyter: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create a .nbautoexport configuration file in DIRECTORY
    Configure {
        /// Directory containing the notebooks to export on save
        directory: PathBuf,
        /// Format(s) to export each notebook to; repeat for several (e.g. -f script -f html)
        #[arg(short = 'f', long = "export-format", value_parser = parse_export_format)]
        export_formats: Vec<ExportFormat>,
        /// Save exports in a folder per notebook or a folder per format
        #[arg(short = 'b', long = "organize-by", value_parser = parse_organize_by, default_value = "extension")]
        organize_by: OrganizeBy,
        /// Glob pattern (relative to DIRECTORY) that cleaning never removes; repeatable
        #[arg(short = 'e', long = "clean-exclude")]
        clean_exclude: Vec<String>,
        /// Remove stale files automatically after each export on save
        #[arg(long)]
        clean_on_save: bool,
        /// Overwrite an existing configuration
        #[arg(short, long)]
        overwrite: bool,
    },

    /// Export a notebook, or every notebook in a directory, right now
    Export {
        /// Notebook file or directory of notebooks
        input: PathBuf,
        /// Format(s) to export to; overrides the directory's configuration
        #[arg(short = 'f', long = "export-format", value_parser = parse_export_format)]
        export_formats: Vec<ExportFormat>,
        /// Subfolder strategy; overrides the directory's configuration
        #[arg(short = 'b', long = "organize-by", value_parser = parse_organize_by)]
        organize_by: Option<OrganizeBy>,
    },

    /// Remove files in DIRECTORY that are not notebooks or their expected exports
    Clean {
        /// Directory with a .nbautoexport configuration
        directory: PathBuf,
        /// Additional glob pattern to keep; repeatable
        #[arg(short = 'e', long = "exclude")]
        exclude: Vec<String>,
        /// Delete without asking for confirmation
        #[arg(short = 'y', long)]
        yes: bool,
        /// List the files that would be removed and exit
        #[arg(long)]
        dry_run: bool,
    },

    /// Register the post-save hook in the Jupyter configuration file
    Install {
        /// Path to jupyter_notebook_config.py (default: Jupyter's config directory)
        #[arg(long)]
        jupyter_config: Option<PathBuf>,
    },

    /// Run the post-save hook for a saved file (called by Jupyter)
    PostSave {
        /// Filesystem path of the saved file
        path: PathBuf,
        /// Content model type reported by Jupyter
        #[arg(long = "type", default_value = "notebook")]
        model_type: String,
    },

    /// Watch DIRECTORY and export notebooks whenever they are saved
    Watch {
        /// Directory with a .nbautoexport configuration
        directory: PathBuf,
    },
}

fn parse_export_format(s: &str) -> Result<ExportFormat, String> {
    s.parse().map_err(|e: NbAutoexportError| e.to_string())
}

fn parse_organize_by(s: &str) -> Result<OrganizeBy, String> {
    s.parse().map_err(|e: NbAutoexportError| e.to_string())
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn init_logging(verbose: bool) {
    let level = if verbose { "nbautoexport=debug" } else { "nbautoexport=info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .format_target(false)
        .init();
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let converter = NbConvert::new(cli.jupyter);

    match cli.command {
        Command::Configure {
            directory,
            export_formats,
            organize_by,
            clean_exclude,
            clean_on_save,
            overwrite,
        } => {
            require_directory(&directory)?;
            let config = NbAutoexportConfig {
                export_formats: if export_formats.is_empty() {
                    NbAutoexportConfig::default().export_formats
                } else {
                    export_formats
                },
                organize_by,
                clean: CleanConfig {
                    enabled: clean_on_save,
                    exclude: clean_exclude,
                },
            };
            let path = sentinel::save(&directory, &config, overwrite)?;
            println!("Configuration written to {}:", path.display());
            println!("{}", config.to_json()?);

            match post_save_hook_status(&default_config_path())? {
                HookStatus::Missing => println!(
                    "Warning: nbautoexport is not properly installed with Jupyter. \
                     Run 'nbautoexport install' to export notebooks on save."
                ),
                HookStatus::Outdated { .. } => println!(
                    "Warning: nbautoexport initialize is an older version. \
                     Run 'nbautoexport install' to update it."
                ),
                HookStatus::Current => {}
            }
        }

        Command::Export {
            input,
            export_formats,
            organize_by,
        } => {
            let (directory, notebooks) = if input.is_dir() {
                let notebooks = find_notebooks(&input)?;
                (input.clone(), notebooks)
            } else {
                let notebook = Notebook::from_file(&input)?;
                (notebook.directory().to_path_buf(), vec![notebook])
            };
            if notebooks.is_empty() {
                return Err(format!("No notebooks found in {}", input.display()).into());
            }

            let mut config = sentinel::load_if_present(&working_dir(&directory))?
                .unwrap_or_default();
            if !export_formats.is_empty() {
                config.export_formats = export_formats;
                config.dedup_formats();
            }
            if let Some(organize_by) = organize_by {
                config.organize_by = organize_by;
            }

            for notebook in &notebooks {
                export_notebook(&notebook.path, &config, &converter)?;
            }
            println!("Exported {} notebook(s).", notebooks.len());
        }

        Command::Clean {
            directory,
            exclude,
            yes,
            dry_run,
        } => {
            require_directory(&directory)?;
            let indicator = sentinel_path(&directory);
            if !indicator.exists() {
                let path = sentinel_path(&directory.canonicalize()?);
                return Err(NbAutoexportError::MissingConfig { path }.into());
            }
            let mut config = sentinel::load(&indicator)?;
            config.clean.exclude.extend(exclude);

            let to_clean = find_files_to_clean(&directory, &config)?;
            if to_clean.is_empty() {
                println!("No files identified for cleaning. Exiting.");
                return Ok(());
            }

            println!("Identified following files to clean up:");
            for path in &to_clean {
                println!("  {}", path.display());
            }

            if dry_run {
                println!("Dry run completed. Exiting.");
                return Ok(());
            }

            if !yes && !confirm(&format!(
                "Are you sure you want to delete these {} files?",
                to_clean.len()
            ))? {
                println!("Aborted!");
                process::exit(1);
            }

            println!("Removing identified files...");
            remove_files(&directory, &to_clean)?;
            println!("Cleaning complete.");
        }

        Command::Install { jupyter_config } => {
            let program = std::env::current_exe()
                .map(|p| p.to_string_lossy().to_string())
                .unwrap_or_else(|_| "nbautoexport".to_string());
            match install_post_save_hook(jupyter_config.as_deref(), &program)? {
                InstallOutcome::Unchanged { installed } => {
                    println!("nbautoexport post-save hook version {installed} already installed. No changes made.");
                }
                _ => println!("nbautoexport post-save hook installed."),
            }
        }

        Command::PostSave { path, model_type } => {
            let model = ContentModel {
                kind: model_type,
                name: path.file_name().map(|n| n.to_string_lossy().to_string()),
                path: Some(path.to_string_lossy().to_string()),
            };
            post_save(&model, &path, &converter);
        }

        Command::Watch { directory } => {
            require_directory(&directory)?;
            let hook = save_hook(converter);
            let watcher = NotebookWatcher::start(&directory)?;
            println!(
                "Watching {} for notebook saves. Press Ctrl-C to stop.",
                directory.display()
            );
            for event in watcher.event_rx.iter() {
                hook(&ContentModel::notebook(), &event.path)?;
            }
        }
    }

    Ok(())
}

fn require_directory(directory: &Path) -> Result<(), Box<dyn std::error::Error>> {
    if !directory.is_dir() {
        return Err(format!("Directory does not exist: {}", directory.display()).into());
    }
    Ok(())
}

/// A notebook's parent may be the empty path for bare file names.
fn working_dir(directory: &Path) -> PathBuf {
    if directory.as_os_str().is_empty() {
        PathBuf::from(".")
    } else {
        directory.to_path_buf()
    }
}

fn confirm(prompt: &str) -> Result<bool, Box<dyn std::error::Error>> {
    print!("{prompt} [y/N]: ");
    std::io::stdout().flush()?;

    let mut answer = String::new();
    std::io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}
