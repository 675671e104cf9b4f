// src/proxy/mod.rs

//! Reload-proxy collaborator.
//!
//! The proxy serves the theme's site behind a local HTTPS reverse proxy and
//! pushes reload/inject notifications to connected browsers. The coordinator
//! only ever talks to the [`ReloadProxy`] trait; production code uses the
//! browser-sync backed [`BrowserSyncProxy`], tests use instrumented stubs.

use std::future::Future;
use std::pin::Pin;
use std::process::Stdio;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use regex::Regex;
use tokio::io::{AsyncBufReadExt, BufReader, Lines};
use tokio::process::{Child, ChildStdout};
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::config::ProxySection;
use crate::exec::shell_command;

/// Matches the line browser-sync prints once the proxy is serving.
const DEFAULT_READY_PATTERN: &str = r"(?i)proxying:";

/// Contract for the reload-proxy service.
///
/// `init` is asynchronous and may fail (missing TLS certificates surface
/// here, at first use). `reload` and `exit` are fire-and-forget.
pub trait ReloadProxy: Send {
    /// Start the proxy and wait until it is serving.
    fn init(&mut self) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>>;

    /// Push a reload notification to connected browsers.
    ///
    /// `Some(path)` requests a path-scoped inject of one changed output
    /// (e.g. a stylesheet); `None` requests a full-page reload.
    fn reload(&mut self, path: Option<&str>);

    /// Tear the proxy down. Safe to call on a proxy that never started.
    fn exit(&mut self);

    /// Whether the proxy is up and reload notifications will be delivered.
    fn active(&self) -> bool;
}

/// Production proxy backed by a browser-sync child process.
pub struct BrowserSyncProxy {
    config: ProxySection,
    child: Option<Child>,
    active: bool,
}

impl BrowserSyncProxy {
    pub fn new(config: ProxySection) -> Self {
        Self {
            config,
            child: None,
            active: false,
        }
    }

    /// The command used to start the proxy, assembled from config unless
    /// overridden wholesale via `[proxy].cmd`.
    fn start_command(&self) -> String {
        if let Some(ref cmd) = self.config.cmd {
            return cmd.clone();
        }

        let mut cmd = format!(
            "npx browser-sync start --proxy '{}' --port {} --no-open --no-ui",
            self.config.target, self.config.port
        );
        if let (Some(key), Some(cert)) = (&self.config.https_key, &self.config.https_cert) {
            cmd.push_str(&format!(" --https-key '{key}' --https-cert '{cert}'"));
        }
        cmd
    }
}

async fn wait_until_ready(
    lines: &mut Lines<BufReader<ChildStdout>>,
    ready_re: &Regex,
) -> Result<()> {
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                debug!("proxy stdout: {}", line);
                if ready_re.is_match(&line) {
                    return Ok(());
                }
            }
            Ok(None) => {
                // Stdout closed: the process died before becoming ready.
                // Missing or unreadable TLS certificates end up here.
                return Err(anyhow!("reload proxy exited before becoming ready"));
            }
            Err(err) => {
                return Err(err).context("reading reload proxy stdout");
            }
        }
    }
}

impl ReloadProxy for BrowserSyncProxy {
    fn init(&mut self) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        Box::pin(async move {
            let ready_pattern = self
                .config
                .ready_pattern
                .as_deref()
                .unwrap_or(DEFAULT_READY_PATTERN);
            let ready_re = Regex::new(ready_pattern)
                .with_context(|| format!("invalid proxy ready_pattern: {ready_pattern}"))?;

            let cmd = self.start_command();
            info!(cmd = %cmd, "starting reload proxy");

            let mut child = shell_command(&cmd)
                .stdout(Stdio::piped())
                .stderr(Stdio::piped())
                .kill_on_drop(true)
                .spawn()
                .context("spawning reload proxy process")?;

            let stdout = child
                .stdout
                .take()
                .ok_or_else(|| anyhow!("reload proxy has no stdout pipe"))?;
            let mut lines = BufReader::new(stdout).lines();

            let startup = Duration::from_secs(self.config.startup_timeout_secs);
            timeout(startup, wait_until_ready(&mut lines, &ready_re))
                .await
                .map_err(|_| {
                    anyhow!(
                        "reload proxy did not become ready within {}s",
                        self.config.startup_timeout_secs
                    )
                })??;

            // Keep draining stdout so the proxy never blocks on a full pipe.
            tokio::spawn(async move {
                while let Ok(Some(line)) = lines.next_line().await {
                    debug!("proxy stdout: {}", line);
                }
            });
            if let Some(stderr) = child.stderr.take() {
                tokio::spawn(async move {
                    let mut lines = BufReader::new(stderr).lines();
                    while let Ok(Some(line)) = lines.next_line().await {
                        debug!("proxy stderr: {}", line);
                    }
                });
            }

            self.child = Some(child);
            self.active = true;
            info!("reload proxy serving {}", self.config.target);
            // Visual break after the browser-sync URL listing.
            println!();

            Ok(())
        })
    }

    fn reload(&mut self, path: Option<&str>) {
        if !self.active {
            warn!("reload requested while proxy inactive; dropping");
            return;
        }

        let mut cmd = format!("npx browser-sync reload --port {}", self.config.port);
        match path {
            Some(path) => {
                info!("🔄 Injecting {path}");
                cmd.push_str(&format!(" --files '{path}'"));
            }
            None => info!("🔄 Reloading"),
        }

        // Fire-and-forget; a failed notification is not worth stopping for.
        tokio::spawn(async move {
            match shell_command(&cmd).output().await {
                Ok(output) if !output.status.success() => {
                    warn!(code = ?output.status.code(), "reload notification failed");
                }
                Ok(_) => {}
                Err(err) => warn!(error = %err, "could not send reload notification"),
            }
        });
    }

    fn exit(&mut self) {
        self.active = false;
        if let Some(mut child) = self.child.take() {
            let _ = child.start_kill();
            debug!("reload proxy stopped");
        }
    }

    fn active(&self) -> bool {
        self.active
    }
}
