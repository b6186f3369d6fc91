//! File watching for `ariel-view watch`
//!
//! Watches the parent directory of one file (editors often replace files
//! rather than write in place) and reports whether an event touched it.
//! Debouncing is left to the session.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::time::Duration;

use anyhow::{anyhow, Result};
use notify::{Event, RecommendedWatcher, RecursiveMode, Watcher};
use tracing::{debug, trace, warn};

/// Watches a single diagram file
pub struct FileWatcher {
    _watcher: RecommendedWatcher,
    rx: Receiver<notify::Result<Event>>,
    watch_root: PathBuf,
    target_path: PathBuf,
    target_name: Option<OsString>,
}

impl FileWatcher {
    pub fn new(path: impl AsRef<Path>) -> notify::Result<Self> {
        // Event paths are canonical; compare against the canonical target.
        let target_path = path
            .as_ref()
            .canonicalize()
            .unwrap_or_else(|_| path.as_ref().to_path_buf());
        let target_name = target_path.file_name().map(std::ffi::OsStr::to_os_string);
        let watch_root = watch_root_for(&target_path);

        let (tx, rx) = mpsc::channel();
        let mut watcher = notify::recommended_watcher(move |res| {
            let _ = tx.send(res);
        })?;
        watcher.watch(&watch_root, RecursiveMode::NonRecursive)?;
        debug!(root = %watch_root.display(), target = %target_path.display(), "Watching");

        Ok(Self {
            _watcher: watcher,
            rx,
            watch_root,
            target_path,
            target_name,
        })
    }

    pub fn target_path(&self) -> &Path {
        &self.target_path
    }

    /// Wait up to `timeout` for events and drain whatever arrived.
    ///
    /// Returns true when at least one event concerned the watched file.
    pub fn wait(&self, timeout: Duration) -> Result<bool> {
        let first = match self.rx.recv_timeout(timeout) {
            Ok(event) => event,
            Err(RecvTimeoutError::Timeout) => return Ok(false),
            Err(RecvTimeoutError::Disconnected) => {
                return Err(anyhow!("File watcher stopped unexpectedly"))
            }
        };

        let mut changed = self.accept(first);
        while let Ok(event) = self.rx.try_recv() {
            changed |= self.accept(event);
        }
        Ok(changed)
    }

    fn accept(&self, event: notify::Result<Event>) -> bool {
        match event {
            Ok(ev) if self.is_relevant(&ev) => {
                trace!(kind = ?ev.kind, "Watched file changed");
                true
            }
            Ok(ev) => {
                trace!(kind = ?ev.kind, paths = ?ev.paths, "Ignoring unrelated event");
                false
            }
            Err(err) => {
                warn!(error = %err, "Watcher error");
                false
            }
        }
    }

    fn is_relevant(&self, event: &Event) -> bool {
        event.paths.iter().any(|path| {
            path == &self.watch_root
                || path == &self.target_path
                || self
                    .target_name
                    .as_ref()
                    .is_some_and(|name| path.file_name().is_some_and(|f| f == name))
        })
    }
}

fn watch_root_for(path: &Path) -> PathBuf {
    path.parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map_or_else(|| PathBuf::from("."), Path::to_path_buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::EventKind;
    use tempfile::tempdir;

    fn event(paths: Vec<PathBuf>) -> Event {
        Event {
            kind: EventKind::Any,
            paths,
            attrs: notify::event::EventAttributes::new(),
        }
    }

    #[test]
    fn test_watch_root_for_bare_file_is_dot() {
        assert_eq!(watch_root_for(Path::new("diagram.mmd")), PathBuf::from("."));
    }

    #[test]
    fn test_relevance() {
        let dir = tempdir().unwrap();
        let root = dir.path().canonicalize().unwrap();
        let path = root.join("diagram.mmd");
        std::fs::write(&path, "flowchart TD").unwrap();
        let watcher = FileWatcher::new(&path).unwrap();

        assert_eq!(watcher.target_path(), path.as_path());
        assert!(watcher.is_relevant(&event(vec![path.clone()])));
        assert!(watcher.is_relevant(&event(vec![root.clone()])));
        assert!(!watcher.is_relevant(&event(vec![root.join("other.mmd")])));
    }

    #[test]
    fn test_wait_times_out_quietly() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("diagram.mmd");
        std::fs::write(&path, "flowchart TD").unwrap();
        let watcher = FileWatcher::new(&path).unwrap();
        // Drain anything produced by the initial write.
        let _ = watcher.wait(Duration::from_millis(50));
        assert!(!watcher.wait(Duration::from_millis(10)).unwrap());
    }
}
