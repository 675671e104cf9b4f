// src/watch/watcher.rs

use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;

use anyhow::{Context, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::coordinator::CoordinatorEvent;
use crate::watch::TemplateWatcher;

/// Handle for the template filesystem watcher.
///
/// This exists mainly so the underlying `RecommendedWatcher` is kept alive
/// for as long as needed. Dropping this handle stops file watching.
pub struct WatcherHandle {
    _inner: RecommendedWatcher,
}

impl std::fmt::Debug for WatcherHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatcherHandle").finish()
    }
}

impl TemplateWatcher for WatcherHandle {
    fn close(self: Box<Self>) -> Pin<Box<dyn Future<Output = Result<()>> + Send>> {
        Box::pin(async move {
            // Dropping the notify watcher releases its OS resources.
            drop(self);
            debug!("template watcher closed");
            Ok(())
        })
    }
}

/// Spawn a filesystem watcher that observes the given `root` directory
/// recursively and sends `CoordinatorEvent::TemplateChanged` for every
/// changed path matching `pattern`.
///
/// - `root` is the project root against which the glob is evaluated.
/// - `pattern` is a glob like `**/*.php`, relative to `root`.
/// - `events_tx` is the channel into the coordinator.
pub fn spawn_template_watcher(
    root: impl Into<PathBuf>,
    pattern: &str,
    events_tx: mpsc::Sender<CoordinatorEvent>,
) -> Result<WatcherHandle> {
    let root = root.into();
    let root = root.canonicalize().unwrap_or_else(|_| root.clone()); // best-effort

    let glob_set = build_globset(pattern)
        .with_context(|| format!("compiling template watch pattern: {pattern}"))?;

    // Channel from the blocking notify callback into the async world.
    let (event_tx, mut event_rx) = tokio::sync::mpsc::unbounded_channel::<Event>();

    // Closure called synchronously by notify whenever an event arrives.
    let mut watcher = RecommendedWatcher::new(
        move |res: notify::Result<Event>| {
            match res {
                Ok(event) => {
                    if let Err(err) = event_tx.send(event) {
                        // We can't log via tracing here easily, so fallback to stderr.
                        eprintln!("themedev: failed to forward notify event: {err}");
                    }
                }
                Err(err) => {
                    eprintln!("themedev: file watch error: {err}");
                }
            }
        },
        Config::default(),
    )?;

    watcher.watch(&root, RecursiveMode::Recursive)?;

    info!("template watcher started on {:?}", root);

    // Async task that consumes notify events and forwards matches to the
    // coordinator.
    tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            debug!("received notify event: {:?}", event);

            for path in &event.paths {
                let Some(rel_str) = relative_str(&root, path) else {
                    warn!(
                        "could not relativize path {:?} against root {:?}",
                        path, root
                    );
                    continue;
                };

                if !glob_set.is_match(&rel_str) {
                    continue;
                }

                debug!(path = %rel_str, "template change detected");
                if events_tx
                    .send(CoordinatorEvent::TemplateChanged { path: rel_str })
                    .await
                    .is_err()
                {
                    // If the coordinator channel is closed, there's no point
                    // keeping the watcher loop alive.
                    warn!("coordinator channel closed; stopping template watcher loop");
                    return;
                }
            }
        }

        debug!("template watcher loop ended");
    });

    Ok(WatcherHandle { _inner: watcher })
}

/// Convert a path into a string relative to `root`, with forward slashes.
///
/// Returns `None` if the path is not under `root` and cannot be relativized.
fn relative_str(root: &Path, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(root).ok()?;
    let s = rel.to_string_lossy().replace('\\', "/");
    Some(s)
}

fn build_globset(pattern: &str) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    builder.add(Glob::new(pattern)?);
    Ok(builder.build()?)
}
