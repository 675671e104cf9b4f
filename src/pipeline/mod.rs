// src/pipeline/mod.rs

//! Pipeline watch adapter.
//!
//! This module is responsible for starting a long-lived watch-mode build per
//! asset pipeline and normalizing whatever the bundler prints into
//! [`BuildEvent`]s for the coordinator. It knows nothing about the proxy or
//! the first-success sequencing; it only turns bundler output into events.
//!
//! The runtime talks to a [`BundlerBackend`] instead of spawning processes
//! directly. This makes it easy to swap in a fake backend in tests while the
//! production implementation lives in [`bundler`].

pub mod bundler;

use std::future::Future;
use std::pin::Pin;

use tokio::sync::mpsc;

use crate::config::PipelineSpec;
use crate::coordinator::{CoordinatorEvent, Pipeline};
use crate::errors::Result;

pub use bundler::{
    parse_build_line, ProcessBundler, DEFAULT_FAILURE_PATTERN, DEFAULT_SUCCESS_PATTERN,
};

/// Handle for one running pipeline watch.
///
/// `unsubscribe` consumes the handle, so a subscription cannot be released
/// twice.
pub trait Subscription: Send {
    /// Stop the watch and wait for the underlying process to go away.
    fn unsubscribe(self: Box<Self>) -> Pin<Box<dyn Future<Output = Result<()>> + Send>>;
}

/// Trait abstracting how pipeline watches are started and torn down.
///
/// Production code uses [`ProcessBundler`]; tests can provide their own
/// implementation that doesn't spawn real processes.
pub trait BundlerBackend: Send {
    /// Start a watch-mode build for one pipeline.
    ///
    /// Every finished build must result in exactly one
    /// `CoordinatorEvent::Build` sent on `events_tx`.
    fn watch(
        &mut self,
        pipeline: Pipeline,
        spec: PipelineSpec,
        events_tx: mpsc::Sender<CoordinatorEvent>,
    ) -> Pin<Box<dyn Future<Output = Result<Box<dyn Subscription>>> + Send + '_>>;

    /// Stop any workers shared between the pipelines.
    ///
    /// Called during shutdown, after both subscriptions have been released.
    fn shutdown(&mut self) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>>;
}
