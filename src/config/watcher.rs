//! Configuration file watcher for hot reload.
//!
//! The parent directory is watched rather than the file itself: editors that
//! save by writing a temporary file and renaming it over the original replace
//! the inode, and a watch on the old inode goes quiet after the first save.

use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::config::loader::load_config;
use crate::config::schema::EdgeConfig;
use crate::observability::metrics;

/// A watcher that monitors the configuration file for changes.
pub struct ConfigWatcher {
    path: PathBuf,
    update_tx: mpsc::UnboundedSender<EdgeConfig>,
}

impl ConfigWatcher {
    /// Create a new ConfigWatcher.
    ///
    /// Returns the watcher and a receiver for configuration updates.
    pub fn new(path: &Path) -> (Self, mpsc::UnboundedReceiver<EdgeConfig>) {
        let (update_tx, update_rx) = mpsc::unbounded_channel();

        (
            Self {
                path: path.to_path_buf(),
                update_tx,
            },
            update_rx,
        )
    }

    /// Start watching the file in a background thread.
    ///
    /// The returned watcher must be kept alive for as long as reloads are wanted.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let tx = self.update_tx;
        let path = self.path.clone();
        let file_name = self.path.file_name().map(OsString::from);
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    if !touches_file(&event, file_name.as_deref()) {
                        return;
                    }
                    if matches!(event.kind, EventKind::Modify(_) | EventKind::Create(_)) {
                        tracing::info!(path = ?path, "Config file change detected, reloading");
                        match load_config(&path) {
                            Ok(new_config) => {
                                let _ = tx.send(new_config);
                            }
                            Err(e) => {
                                metrics::record_config_reload(false);
                                tracing::error!(error = %e, "Failed to reload config, keeping current configuration");
                            }
                        }
                    }
                }
                Err(e) => tracing::error!(error = ?e, "Watch error"),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        watcher.watch(&dir, RecursiveMode::NonRecursive)?;

        tracing::info!(path = ?self.path, dir = ?dir, "Config watcher started");
        Ok(watcher)
    }
}

/// Whether `event` concerns the watched file rather than a sibling in the same directory.
fn touches_file(event: &Event, file_name: Option<&OsStr>) -> bool {
    let Some(file_name) = file_name else {
        return false;
    };
    event.paths.iter().any(|p| p.file_name() == Some(file_name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use notify::event::{CreateKind, ModifyKind};

    const RELOADED: &str = r#"
        [redirects]
        default_target = "https://reloaded.example/"
    "#;

    /// Wait for a reload whose default target is `target`.
    ///
    /// A write can surface as several events (truncate, then data), so earlier
    /// reloads of a half-written file are skipped.
    async fn reload_with_target(rx: &mut mpsc::UnboundedReceiver<EdgeConfig>, target: &str) -> bool {
        let wait = async {
            while let Some(config) = rx.recv().await {
                if config.redirects.default_target == target {
                    return true;
                }
            }
            false
        };
        tokio::time::timeout(Duration::from_secs(10), wait).await.unwrap_or(false)
    }

    #[test]
    fn test_only_events_for_the_config_file_match() {
        let name = OsStr::new("edge.toml");
        let ours = Event::new(EventKind::Create(CreateKind::File)).add_path(PathBuf::from("/etc/edge/edge.toml"));
        let sibling =
            Event::new(EventKind::Modify(ModifyKind::Any)).add_path(PathBuf::from("/etc/edge/other.toml"));

        assert!(touches_file(&ours, Some(name)));
        assert!(!touches_file(&sibling, Some(name)));
        assert!(!touches_file(&ours, None));
    }

    #[tokio::test]
    async fn test_reload_after_in_place_write() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("edge.toml");
        fs::write(&path, "").unwrap();

        let (watcher, mut rx) = ConfigWatcher::new(&path);
        let _watcher = watcher.run().unwrap();

        fs::write(&path, RELOADED).unwrap();

        assert!(reload_with_target(&mut rx, "https://reloaded.example/").await);
    }

    #[tokio::test]
    async fn test_reload_survives_atomic_rename_saves() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("edge.toml");
        fs::write(&path, "").unwrap();

        let (watcher, mut rx) = ConfigWatcher::new(&path);
        let _watcher = watcher.run().unwrap();

        for target in ["https://first.example/", "https://second.example/"] {
            let staged = dir.path().join(".edge.toml.swp");
            fs::write(&staged, format!("[redirects]\ndefault_target = {target:?}\n")).unwrap();
            fs::rename(&staged, &path).unwrap();

            assert!(reload_with_target(&mut rx, target).await, "no reload for {target}");
        }
    }
}
