// src/lib.rs

pub mod cli;
pub mod config;
pub mod coordinator;
pub mod debounce;
pub mod errors;
pub mod exec;
pub mod hmr;
pub mod lint;
pub mod logging;
pub mod pipeline;
pub mod proxy;
pub mod watch;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::sync::mpsc;
use tracing::info;

use crate::cli::CliArgs;
use crate::config::loader::{load_and_validate, project_root};
use crate::config::model::{ConfigFile, PipelineSpec};
use crate::coordinator::{Coordinator, CoordinatorEvent, CoordinatorHandles, Pipeline};
use crate::debounce::Debouncer;
use crate::lint::{Linter, StylelintRunner};
use crate::pipeline::{BundlerBackend, ProcessBundler};
use crate::proxy::BrowserSyncProxy;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading
/// - the hot-reload feature flag
/// - both pipeline watches, the template watcher, and the proxy
/// - the debounced lint task
/// - Ctrl-C handling
pub async fn run(args: CliArgs) -> Result<()> {
    let config_path = PathBuf::from(&args.config);
    let cfg = load_and_validate(&config_path)?;
    let root = project_root(&config_path, &cfg);

    let hmr_enabled = hmr::hmr_enabled(args.disable_hmr, args.hmr, &root);

    if args.dry_run {
        print_dry_run(&cfg, hmr_enabled);
        return Ok(());
    }

    info!("🚀 Starting themedev development server");
    if hmr_enabled {
        info!("🔥 Hot module replacement enabled");
    }

    // Coordinator event channel.
    let (events_tx, events_rx) = mpsc::channel::<CoordinatorEvent>(64);

    // Pipeline watches. The bundlers watch for changes and rebuild assets;
    // we only consume their build events.
    info!("📦 Bundling assets and watching...");
    let mut backend = ProcessBundler::new(root.clone());
    let styles_sub = backend
        .watch(
            Pipeline::Styles,
            cfg.pipeline.styles.clone(),
            events_tx.clone(),
        )
        .await?;
    let scripts_sub = backend
        .watch(
            Pipeline::Scripts,
            scripts_spec(&cfg.pipeline.scripts, hmr_enabled),
            events_tx.clone(),
        )
        .await?;

    // We also want to reload on template changes.
    let templates =
        watch::spawn_template_watcher(root.clone(), &cfg.templates.watch, events_tx.clone())?;

    // Ctrl-C → graceful shutdown.
    {
        let tx = events_tx.clone();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                eprintln!("failed to listen for Ctrl+C: {e}");
                return;
            }
            let _ = tx.send(CoordinatorEvent::ShutdownRequested).await;
        });
    }

    // Proxy readiness condition; the coordinator resolves it on startup and
    // the debounced lint task waits on it.
    let (ready_tx, ready_rx) = tokio::sync::watch::channel(false);

    let linter: Arc<dyn Linter> = Arc::new(StylelintRunner::new(cfg.lint.cmd.clone(), root));
    let lint = Debouncer::spawn(
        Duration::from_millis(cfg.lint.quiet_period_ms),
        ready_rx,
        move || {
            let linter = Arc::clone(&linter);
            async move { lint::run_lint_pass(linter.as_ref()).await }
        },
    );

    let handles = CoordinatorHandles {
        proxy: Box::new(BrowserSyncProxy::new(cfg.proxy.clone())),
        backend: Box::new(backend),
        styles: styles_sub,
        scripts: scripts_sub,
        templates: Box::new(templates),
    };

    let coordinator = Coordinator::new(
        handles,
        lint,
        ready_tx,
        cfg.pipeline.styles.reload_target.clone(),
        events_rx,
    );
    coordinator.run().await
}

/// The effective scripts pipeline spec, with HMR arguments appended when the
/// feature flag is on.
fn scripts_spec(spec: &PipelineSpec, hmr_enabled: bool) -> PipelineSpec {
    let mut spec = spec.clone();
    if hmr_enabled {
        if let Some(ref hmr_args) = spec.hmr_args {
            spec.cmd = format!("{} {}", spec.cmd, hmr_args);
        }
    }
    spec
}

/// Simple dry-run output: print the resolved pipelines, proxy and lint setup.
fn print_dry_run(cfg: &ConfigFile, hmr_enabled: bool) {
    println!("themedev dry-run");
    println!("  hmr_enabled = {hmr_enabled}");
    println!();

    println!("proxy:");
    println!("  target: {}", cfg.proxy.target);
    println!("  port: {}", cfg.proxy.port);
    if let Some(ref key) = cfg.proxy.https_key {
        println!("  https_key: {key}");
    }
    if let Some(ref cert) = cfg.proxy.https_cert {
        println!("  https_cert: {cert}");
    }

    println!("pipelines:");
    for (name, spec) in [
        ("styles", &cfg.pipeline.styles),
        ("scripts", &cfg.pipeline.scripts),
    ] {
        println!("  - {name}");
        println!("      cmd: {}", spec.cmd);
        if let Some(ref target) = spec.reload_target {
            println!("      reload_target: {target}");
        }
        if let Some(ref hmr_args) = spec.hmr_args {
            println!("      hmr_args: {hmr_args}");
        }
    }

    println!("lint:");
    println!("  cmd: {}", cfg.lint.cmd);
    println!("  quiet_period_ms: {}", cfg.lint.quiet_period_ms);

    println!("templates:");
    println!("  watch: {}", cfg.templates.watch);
}
