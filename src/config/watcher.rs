//! Live settings file watcher.

use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::config::loader::load_settings;
use crate::config::setting::Settings;

/// Watches the live settings file and publishes every successfully parsed snapshot.
pub struct SettingsWatcher {
    path: PathBuf,
    poll_interval: Duration,
    update_tx: mpsc::UnboundedSender<Settings>,
}

impl SettingsWatcher {
    /// Create a new watcher.
    ///
    /// Returns the watcher and a receiver for settings snapshots.
    pub fn new(path: &Path, poll_interval: Duration) -> (Self, mpsc::UnboundedReceiver<Settings>) {
        let (update_tx, update_rx) = mpsc::unbounded_channel();

        (
            Self {
                path: path.to_path_buf(),
                poll_interval,
                update_tx,
            },
            update_rx,
        )
    }

    /// Start watching. The returned handle must be kept alive.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let tx = self.update_tx.clone();
        let path = self.path.clone();

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    if event.kind.is_modify() || event.kind.is_create() {
                        tracing::info!(path = ?path, "Live settings change detected, reloading");
                        match load_settings(&path) {
                            Ok(settings) => {
                                let _ = tx.send(settings);
                            }
                            Err(e) => {
                                tracing::warn!(
                                    error = %e,
                                    "Failed to reload live settings, keeping current values"
                                );
                            }
                        }
                    }
                }
                Err(e) => tracing::error!(error = ?e, "Live settings watch error"),
            },
            Config::default().with_poll_interval(self.poll_interval),
        )?;

        watcher.watch(&self.path, RecursiveMode::NonRecursive)?;

        tracing::info!(path = ?self.path, "Live settings watcher started");
        Ok(watcher)
    }
}
