#![allow(dead_code)]

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, Once};
use std::time::Duration;

use tokio::sync::mpsc;
use tracing_subscriber::{fmt, EnvFilter};

use themedev::config::PipelineSpec;
use themedev::coordinator::{
    Coordinator, CoordinatorEvent, CoordinatorHandles, Pipeline,
};
use themedev::debounce::Debouncer;
use themedev::errors::Result;
use themedev::pipeline::{BundlerBackend, Subscription};
use themedev::proxy::ReloadProxy;
use themedev::watch::TemplateWatcher;

static INIT: Once = Once::new();

/// Initialise tracing for tests.
///
/// - Uses `with_test_writer()`, so logs are captured per-test.
/// - The Rust test harness only prints captured output for **failing** tests
///   (unless you run with `-- --nocapture`).
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .init();
    });
}

/// Shared, ordered log of collaborator calls, asserted on by the tests.
pub type CallLog = Arc<Mutex<Vec<String>>>;

pub fn new_call_log() -> CallLog {
    Arc::new(Mutex::new(Vec::new()))
}

pub fn record(log: &CallLog, entry: impl Into<String>) {
    log.lock().unwrap().push(entry.into());
}

pub fn entries(log: &CallLog) -> Vec<String> {
    log.lock().unwrap().clone()
}

/// Instrumented proxy stub: records every call, flips `active` on `init`.
pub struct StubProxy {
    pub calls: CallLog,
    pub active: Arc<AtomicBool>,
    /// When true, `init` records the attempt and fails.
    pub fail_init: bool,
}

impl StubProxy {
    pub fn new(calls: CallLog) -> Self {
        Self {
            calls,
            active: Arc::new(AtomicBool::new(false)),
            fail_init: false,
        }
    }

    pub fn failing(calls: CallLog) -> Self {
        Self {
            fail_init: true,
            ..Self::new(calls)
        }
    }
}

impl ReloadProxy for StubProxy {
    fn init(&mut self) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        Box::pin(async move {
            record(&self.calls, "proxy.init");
            if self.fail_init {
                anyhow::bail!("stub proxy refused to start");
            }
            self.active.store(true, Ordering::SeqCst);
            Ok(())
        })
    }

    fn reload(&mut self, path: Option<&str>) {
        match path {
            Some(path) => record(&self.calls, format!("reload:{path}")),
            None => record(&self.calls, "reload:full"),
        }
    }

    fn exit(&mut self) {
        self.active.store(false, Ordering::SeqCst);
        record(&self.calls, "proxy.exit");
    }

    fn active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }
}

/// Subscription stub: records its release, optionally after a delay.
pub struct StubSubscription {
    pub label: &'static str,
    pub calls: CallLog,
    pub delay: Option<Duration>,
    /// When true, `unsubscribe` records the attempt and fails.
    pub fail: bool,
}

impl StubSubscription {
    pub fn new(label: &'static str, calls: CallLog) -> Box<Self> {
        Box::new(Self {
            label,
            calls,
            delay: None,
            fail: false,
        })
    }

    pub fn slow(label: &'static str, calls: CallLog, delay: Duration) -> Box<Self> {
        Box::new(Self {
            label,
            calls,
            delay: Some(delay),
            fail: false,
        })
    }

    pub fn failing(label: &'static str, calls: CallLog) -> Box<Self> {
        Box::new(Self {
            label,
            calls,
            delay: None,
            fail: true,
        })
    }
}

impl Subscription for StubSubscription {
    fn unsubscribe(self: Box<Self>) -> Pin<Box<dyn Future<Output = Result<()>> + Send>> {
        Box::pin(async move {
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            record(&self.calls, format!("unsub:{}", self.label));
            if self.fail {
                anyhow::bail!("stub subscription refused to release");
            }
            Ok(())
        })
    }
}

/// Bundler backend stub: never spawns anything, records its shutdown.
pub struct StubBackend {
    pub calls: CallLog,
}

impl StubBackend {
    pub fn new(calls: CallLog) -> Self {
        Self { calls }
    }
}

impl BundlerBackend for StubBackend {
    fn watch(
        &mut self,
        pipeline: Pipeline,
        _spec: PipelineSpec,
        _events_tx: mpsc::Sender<CoordinatorEvent>,
    ) -> Pin<Box<dyn Future<Output = Result<Box<dyn Subscription>>> + Send + '_>> {
        let calls = Arc::clone(&self.calls);
        Box::pin(async move {
            let label = match pipeline {
                Pipeline::Styles => "styles",
                Pipeline::Scripts => "scripts",
            };
            Ok(StubSubscription::new(label, calls) as Box<dyn Subscription>)
        })
    }

    fn shutdown(&mut self) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        Box::pin(async move {
            record(&self.calls, "workers.end");
            Ok(())
        })
    }
}

/// Template watcher stub.
pub struct StubTemplates {
    pub calls: CallLog,
}

impl StubTemplates {
    pub fn new(calls: CallLog) -> Box<Self> {
        Box::new(Self { calls })
    }
}

impl TemplateWatcher for StubTemplates {
    fn close(self: Box<Self>) -> Pin<Box<dyn Future<Output = Result<()>> + Send>> {
        Box::pin(async move {
            record(&self.calls, "templates.close");
            Ok(())
        })
    }
}

/// A coordinator wired entirely to stubs, plus the pieces tests drive it with.
pub struct TestCoordinator {
    pub coordinator: Coordinator,
    pub calls: CallLog,
    pub events_tx: mpsc::Sender<CoordinatorEvent>,
}

/// Build a coordinator over instrumented stubs.
///
/// The debounced lint task records `"lint"` when it fires; its readiness
/// follows the stub proxy's `init`.
pub fn stub_coordinator(proxy: StubProxy, calls: CallLog) -> TestCoordinator {
    let (events_tx, events_rx) = mpsc::channel::<CoordinatorEvent>(16);
    let (ready_tx, ready_rx) = tokio::sync::watch::channel(false);

    let lint_calls = Arc::clone(&calls);
    let lint = Debouncer::spawn(Duration::from_millis(10), ready_rx, move || {
        let lint_calls = Arc::clone(&lint_calls);
        async move { record(&lint_calls, "lint") }
    });

    let handles = CoordinatorHandles {
        proxy: Box::new(proxy),
        backend: Box::new(StubBackend::new(Arc::clone(&calls))),
        styles: StubSubscription::new("styles", Arc::clone(&calls)),
        scripts: StubSubscription::new("scripts", Arc::clone(&calls)),
        templates: StubTemplates::new(Arc::clone(&calls)),
    };

    let coordinator = Coordinator::new(
        handles,
        lint,
        ready_tx,
        Some("dist/sass/global.css".to_string()),
        events_rx,
    );

    TestCoordinator {
        coordinator,
        calls,
        events_tx,
    }
}
