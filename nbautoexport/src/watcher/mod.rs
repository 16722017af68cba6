use crate::error::Result;
use crate::notebook::has_notebook_extension;
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::time::{Duration, Instant};

const DEBOUNCE: Duration = Duration::from_millis(100);

/// A notebook in the watched directory that was written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveEvent {
    pub path: PathBuf,
}

/// Watches one directory (not its subfolders) for notebook saves, standing
/// in for the host's post-save callback. Debounced events arrive on `event_rx`.
pub struct NotebookWatcher {
    _watcher: RecommendedWatcher,
    /// Handle to the background thread processing events
    _thread: std::thread::JoinHandle<()>,
    pub event_rx: mpsc::Receiver<SaveEvent>,
}

impl NotebookWatcher {
    pub fn start(directory: &Path) -> Result<Self> {
        let (notify_tx, notify_rx) = mpsc::channel::<notify::Result<Event>>();
        let (event_tx, event_rx) = mpsc::channel::<SaveEvent>();

        let mut watcher = RecommendedWatcher::new(
            move |res| {
                let _ = notify_tx.send(res);
            },
            Config::default(),
        )?;
        watcher.watch(directory, RecursiveMode::NonRecursive)?;

        let thread = std::thread::spawn(move || {
            let mut pending: Vec<PathBuf> = Vec::new();
            let mut last_event = Instant::now();

            loop {
                match notify_rx.recv_timeout(DEBOUNCE) {
                    Ok(Ok(event)) => {
                        if matches!(event.kind, EventKind::Create(_) | EventKind::Modify(_)) {
                            pending.extend(
                                event.paths.into_iter().filter(|p| is_saved_notebook(p)),
                            );
                        }
                        last_event = Instant::now();
                    }
                    Ok(Err(e)) => {
                        log::warn!("File watcher error: {e}");
                    }
                    Err(mpsc::RecvTimeoutError::Timeout) => {
                        if !pending.is_empty() && last_event.elapsed() >= DEBOUNCE {
                            for path in dedup(pending.drain(..)) {
                                if event_tx.send(SaveEvent { path }).is_err() {
                                    return; // Receiver dropped
                                }
                            }
                        }
                    }
                    Err(mpsc::RecvTimeoutError::Disconnected) => break,
                }
            }
        });

        Ok(NotebookWatcher {
            _watcher: watcher,
            _thread: thread,
            event_rx,
        })
    }
}

fn is_saved_notebook(path: &Path) -> bool {
    has_notebook_extension(path) && path.is_file()
}

/// Collapse repeated paths, keeping first-seen order.
fn dedup(paths: impl Iterator<Item = PathBuf>) -> Vec<PathBuf> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for path in paths {
        if seen.insert(path.clone()) {
            out.push(path);
        }
    }
    out
}
