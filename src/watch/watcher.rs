// src/watch/watcher.rs

use std::path::{Path, PathBuf};

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::errors::WatchError;
use crate::watch::controller::WatchEvent;

/// Handle for the filesystem watcher.
///
/// Exists so the underlying `RecommendedWatcher` stays alive for as long as
/// the session needs it. Dropping this handle releases the subscription.
pub struct WatcherHandle {
    _inner: RecommendedWatcher,
}

impl std::fmt::Debug for WatcherHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatcherHandle").finish()
    }
}

/// Subscribe to change notifications under `root` (recursively) and forward
/// each changed path into the controller channel as a
/// [`WatchEvent::PathChanged`], relativized against `root`.
pub fn spawn_fs_watcher(
    root: impl Into<PathBuf>,
    events_tx: mpsc::Sender<WatchEvent>,
) -> Result<WatcherHandle, WatchError> {
    let root = root.into();
    let root = root.canonicalize().unwrap_or_else(|_| root.clone());

    // Channel from the blocking notify callback into the async world.
    let (raw_tx, mut raw_rx) = mpsc::unbounded_channel::<Event>();

    let mut watcher = RecommendedWatcher::new(
        move |res: notify::Result<Event>| match res {
            Ok(event) => {
                if let Err(err) = raw_tx.send(event) {
                    eprintln!("pipeforge: failed to forward notify event: {err}");
                }
            }
            Err(err) => {
                eprintln!("pipeforge: file watch error: {err}");
            }
        },
        Config::default(),
    )?;

    watcher.watch(&root, RecursiveMode::Recursive)?;
    info!("file watcher started on {:?}", root);

    tokio::spawn(async move {
        while let Some(event) = raw_rx.recv().await {
            debug!("received notify event: {:?}", event);

            for path in &event.paths {
                let Some(rel) = relative_str(&root, path) else {
                    warn!("could not relativize path {:?} against root {:?}", path, root);
                    continue;
                };

                if events_tx
                    .send(WatchEvent::PathChanged(rel))
                    .await
                    .is_err()
                {
                    // Controller gone; no point keeping this loop alive.
                    debug!("controller channel closed; stopping watch forwarding");
                    return;
                }
            }
        }

        debug!("file watcher loop ended");
    });

    Ok(WatcherHandle { _inner: watcher })
}

/// Convert a path into a string relative to `root`, with forward slashes.
fn relative_str(root: &Path, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(root).ok()?;
    Some(rel.to_string_lossy().replace('\\', "/"))
}
