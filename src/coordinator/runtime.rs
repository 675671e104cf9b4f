// src/coordinator/runtime.rs

use anyhow::{Context, Result};
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, warn};

use crate::coordinator::state::{Pipeline, StartupState};
use crate::debounce::Debouncer;
use crate::pipeline::{BundlerBackend, Subscription};
use crate::proxy::ReloadProxy;
use crate::watch::TemplateWatcher;

/// Normalized outcome of one bundler build, as reported by a pipeline watch
/// subscription. Consumed once per emission, never stored.
#[derive(Debug, Clone)]
pub enum BuildEvent {
    Success { bundles: usize, elapsed_ms: u64 },
    Failure { diagnostics: Vec<String> },
}

/// Events sent into the coordinator from its producers.
///
/// - pipeline watch subscriptions send `Build`
/// - the template watcher sends `TemplateChanged`
/// - Ctrl-C handling sends `ShutdownRequested`
#[derive(Debug, Clone)]
pub enum CoordinatorEvent {
    Build {
        pipeline: Pipeline,
        event: BuildEvent,
    },
    TemplateChanged {
        path: String,
    },
    ShutdownRequested,
}

/// The collaborators the coordinator owns for its whole lifetime.
///
/// All of these are trait objects so tests can substitute instrumented
/// stubs for the real process-backed implementations.
pub struct CoordinatorHandles {
    pub proxy: Box<dyn ReloadProxy>,
    pub backend: Box<dyn BundlerBackend>,
    pub styles: Box<dyn Subscription>,
    pub scripts: Box<dyn Subscription>,
    pub templates: Box<dyn TemplateWatcher>,
}

/// The build coordinator.
///
/// Responsibilities:
/// - Consume `CoordinatorEvent`s from watchers and the signal handler.
/// - Track the first-success state and start the reload proxy exactly once,
///   only after both pipelines have produced a successful build.
/// - Push reload notifications to the active proxy.
/// - Poke the debounced lint task on every styles build.
/// - Tear everything down in order on shutdown.
pub struct Coordinator {
    startup: StartupState,
    proxy: Box<dyn ReloadProxy>,
    backend: Box<dyn BundlerBackend>,
    styles_sub: Option<Box<dyn Subscription>>,
    scripts_sub: Option<Box<dyn Subscription>>,
    templates: Option<Box<dyn TemplateWatcher>>,
    lint: Debouncer,

    /// Resolved to `true` exactly once, when the proxy comes up; the
    /// debounced lint task waits on the receiving side.
    ready_tx: watch::Sender<bool>,

    /// Injection target for styles rebuilds; `None` means full reload.
    styles_reload_target: Option<String>,

    /// Unified event stream from all producers.
    events_rx: mpsc::Receiver<CoordinatorEvent>,
}

impl Coordinator {
    pub fn new(
        handles: CoordinatorHandles,
        lint: Debouncer,
        ready_tx: watch::Sender<bool>,
        styles_reload_target: Option<String>,
        events_rx: mpsc::Receiver<CoordinatorEvent>,
    ) -> Self {
        Self {
            startup: StartupState::NotStarted,
            proxy: handles.proxy,
            backend: handles.backend,
            styles_sub: Some(handles.styles),
            scripts_sub: Some(handles.scripts),
            templates: Some(handles.templates),
            lint,
            ready_tx,
            styles_reload_target,
            events_rx,
        }
    }

    /// Main event loop.
    ///
    /// Returns `Ok(())` after a clean shutdown; proxy startup failure is the
    /// one error that propagates out of here (the dev server is useless
    /// without a working proxy).
    pub async fn run(mut self) -> Result<()> {
        info!("coordinator started");

        while let Some(event) = self.events_rx.recv().await {
            debug!(?event, "coordinator received event");

            let keep_running = match event {
                CoordinatorEvent::Build { pipeline, event } => {
                    self.handle_build(pipeline, event).await?
                }
                CoordinatorEvent::TemplateChanged { path } => self.handle_template_change(&path),
                CoordinatorEvent::ShutdownRequested => {
                    self.shutdown().await;
                    false
                }
            };

            if !keep_running {
                break;
            }
        }

        info!("🚪 Exiting. Bye!");
        Ok(())
    }

    /// Handle one normalized build event from either pipeline.
    ///
    /// Failures are logged and change nothing; they never count towards
    /// proxy startup and never trigger a reload.
    pub async fn handle_build(&mut self, pipeline: Pipeline, event: BuildEvent) -> Result<bool> {
        match event {
            BuildEvent::Success {
                bundles,
                elapsed_ms,
            } => {
                info!(
                    "🎉 Built {bundles} {pipeline} bundle{} in {elapsed_ms}ms!",
                    if bundles == 1 { "" } else { "s" }
                );
                self.handle_build_success(pipeline).await?;
            }
            BuildEvent::Failure { diagnostics } => {
                error!("❗ {pipeline} build failed");
                for diagnostic in &diagnostics {
                    error!(pipeline = %pipeline, "{diagnostic}");
                }
            }
        }

        Ok(true)
    }

    async fn handle_build_success(&mut self, pipeline: Pipeline) -> Result<()> {
        // Proxy-active status is authoritative; the startup state only
        // matters before the proxy exists.
        if self.proxy.active() {
            match pipeline {
                Pipeline::Styles => {
                    let target = self.styles_reload_target.clone();
                    self.proxy.reload(target.as_deref());
                }
                Pipeline::Scripts => self.proxy.reload(None),
            }
        } else {
            self.advance_startup(pipeline).await?;
        }

        // Styles builds also schedule a debounced lint pass; the debouncer
        // holds it back until the proxy is up.
        if pipeline == Pipeline::Styles {
            self.lint.call();
        }

        Ok(())
    }

    /// Two-slot first-success tracking while the proxy is not yet up.
    async fn advance_startup(&mut self, pipeline: Pipeline) -> Result<()> {
        match self.startup {
            StartupState::NotStarted => {
                debug!(first = %pipeline, "first pipeline built; waiting for the other");
                self.startup = StartupState::WaitingOn(pipeline.other());
            }
            StartupState::WaitingOn(awaited) if awaited == pipeline => {
                info!("🔄 Starting reload proxy...");
                self.proxy
                    .init()
                    .await
                    .context("starting the reload proxy")?;
                self.startup = StartupState::ProxyActive;
                // Wake the debounced lint task; no receivers is fine.
                let _ = self.ready_tx.send(true);
            }
            StartupState::WaitingOn(_) => {
                debug!(pipeline = %pipeline, "repeat success before proxy startup; ignoring");
            }
            StartupState::ProxyActive => {
                warn!(pipeline = %pipeline, "proxy started but not active; skipping reload");
            }
        }

        Ok(())
    }

    /// A server-side template changed: full-page reload, the bundlers are
    /// not involved.
    pub fn handle_template_change(&mut self, path: &str) -> bool {
        if self.proxy.active() {
            info!("🐘 Detected change in {path}. Reloading!");
            self.proxy.reload(None);
        } else {
            debug!(path, "template changed before proxy startup; nothing to reload");
        }

        true
    }

    /// Ordered teardown: stop everything that can emit reload requests
    /// before exiting the proxy.
    ///
    /// Best-effort: a failing step is logged and the remaining steps still
    /// run, so a stuck pipeline watcher cannot leave the proxy or the other
    /// watchers behind.
    pub async fn shutdown(&mut self) {
        info!("shutting down");

        if let Some(sub) = self.styles_sub.take() {
            if let Err(err) = sub.unsubscribe().await {
                error!(error = %err, "failed to unsubscribe the styles pipeline watcher");
            }
        }
        if let Some(sub) = self.scripts_sub.take() {
            if let Err(err) = sub.unsubscribe().await {
                error!(error = %err, "failed to unsubscribe the scripts pipeline watcher");
            }
        }
        if let Some(watcher) = self.templates.take() {
            if let Err(err) = watcher.close().await {
                error!(error = %err, "failed to close the template watcher");
            }
        }

        if let Err(err) = self.backend.shutdown().await {
            error!(error = %err, "failed to stop bundler workers");
        }

        self.proxy.exit();
    }

    /// Current startup state (used by tests and the dry-run printer).
    pub fn startup_state(&self) -> StartupState {
        self.startup
    }
}
