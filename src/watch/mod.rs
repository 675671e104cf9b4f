// src/watch/mod.rs

//! Generic template file watching.
//!
//! Server-side template files (PHP and friends) bypass the bundlers, so a
//! plain filesystem watcher turns their changes into full-page reload
//! requests. It does **not** know about the pipelines or the proxy; it only
//! forwards change events to the coordinator.

pub mod watcher;

use std::future::Future;
use std::pin::Pin;

use crate::errors::Result;

pub use watcher::{spawn_template_watcher, WatcherHandle};

/// Handle for the template watcher, releasable exactly once during shutdown.
pub trait TemplateWatcher: Send {
    fn close(self: Box<Self>) -> Pin<Box<dyn Future<Output = Result<()>> + Send>>;
}
