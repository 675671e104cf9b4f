// src/pipeline/bundler.rs

use std::collections::VecDeque;
use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use std::process::Stdio;
use std::time::Duration;

use anyhow::{Context, Result};
use regex::Regex;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Child;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::config::PipelineSpec;
use crate::coordinator::{BuildEvent, CoordinatorEvent, Pipeline};
use crate::exec::shell_command;
use crate::pipeline::{BundlerBackend, Subscription};

/// Matches e.g. `Built 2 bundles in 431ms` and `✨ Built in 431ms`.
pub const DEFAULT_SUCCESS_PATTERN: &str = r"[Bb]uilt(?:\s+(\d+)\s+bundles?)?\s+in\s+(\d+)\s*ms";
pub const DEFAULT_FAILURE_PATTERN: &str = r"[Bb]uild failed";

/// How many stdout lines preceding a failure match are kept as diagnostics.
/// Bundlers print the compile errors before the summary line, so this window
/// is what the operator needs to see.
const DIAGNOSTIC_CONTEXT_LINES: usize = 16;

/// Upper bound on waiting for a stdout/stderr monitor task during shutdown.
const MONITOR_REAP_TIMEOUT: Duration = Duration::from_secs(2);

/// Production bundler backend: runs each pipeline's watch command as a
/// long-lived child process and parses its stdout for build results.
pub struct ProcessBundler {
    workdir: PathBuf,
    /// Stdout monitor tasks, shared across both pipelines. Reaped in
    /// `shutdown` once the subscriptions have killed the children.
    monitors: Vec<JoinHandle<()>>,
}

impl ProcessBundler {
    pub fn new(workdir: impl Into<PathBuf>) -> Self {
        Self {
            workdir: workdir.into(),
            monitors: Vec::new(),
        }
    }
}

impl BundlerBackend for ProcessBundler {
    fn watch(
        &mut self,
        pipeline: Pipeline,
        spec: PipelineSpec,
        events_tx: mpsc::Sender<CoordinatorEvent>,
    ) -> Pin<Box<dyn Future<Output = Result<Box<dyn Subscription>>> + Send + '_>> {
        Box::pin(async move {
            let success_re = compile_pattern(
                spec.success_pattern.as_deref(),
                DEFAULT_SUCCESS_PATTERN,
                pipeline,
                "success_pattern",
            )?;
            let failure_re = compile_pattern(
                spec.failure_pattern.as_deref(),
                DEFAULT_FAILURE_PATTERN,
                pipeline,
                "failure_pattern",
            )?;

            let mut child = shell_command(&spec.cmd)
                .current_dir(&self.workdir)
                .stdout(Stdio::piped())
                .stderr(Stdio::piped())
                .kill_on_drop(true)
                .spawn()
                .with_context(|| {
                    format!("spawning watch process for the {pipeline} pipeline")
                })?;

            info!(pipeline = %pipeline, cmd = %spec.cmd, "pipeline watch started");

            if let Some(stdout) = child.stdout.take() {
                let monitor = spawn_stdout_monitor(
                    pipeline,
                    stdout,
                    success_re,
                    failure_re,
                    events_tx.clone(),
                );
                self.monitors.push(monitor);
            }

            // Always consume stderr so buffers don't fill. Compile errors
            // commonly land here, so it is logged at a visible level.
            if let Some(stderr) = child.stderr.take() {
                self.monitors.push(tokio::spawn(async move {
                    let reader = BufReader::new(stderr);
                    let mut lines = reader.lines();
                    while let Ok(Some(line)) = lines.next_line().await {
                        info!(pipeline = %pipeline, "stderr: {}", line);
                    }
                }));
            }

            Ok(Box::new(ProcessSubscription { pipeline, child }) as Box<dyn Subscription>)
        })
    }

    fn shutdown(&mut self) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        Box::pin(async move {
            debug!(
                monitors = self.monitors.len(),
                "waiting for bundler monitor tasks to finish"
            );
            for mut monitor in self.monitors.drain(..) {
                // During teardown nothing drains the coordinator channel
                // anymore, so a monitor can sit in a blocked send forever.
                if timeout(MONITOR_REAP_TIMEOUT, &mut monitor).await.is_err() {
                    warn!("bundler monitor did not finish in time; aborting it");
                    monitor.abort();
                }
            }
            Ok(())
        })
    }
}

/// Subscription backed by a child process. Unsubscribing kills the process
/// and waits for it to be reaped.
struct ProcessSubscription {
    pipeline: Pipeline,
    child: Child,
}

impl Subscription for ProcessSubscription {
    fn unsubscribe(mut self: Box<Self>) -> Pin<Box<dyn Future<Output = Result<()>> + Send>> {
        Box::pin(async move {
            // start_kill errors if the process already exited; that's fine.
            let _ = self.child.start_kill();
            self.child.wait().await.with_context(|| {
                format!("waiting for the {} watch process to exit", self.pipeline)
            })?;
            debug!(pipeline = %self.pipeline, "pipeline watch stopped");
            Ok(())
        })
    }
}

fn compile_pattern(
    override_pattern: Option<&str>,
    default_pattern: &str,
    pipeline: Pipeline,
    what: &str,
) -> Result<Regex> {
    let pattern = override_pattern.unwrap_or(default_pattern);
    Regex::new(pattern)
        .with_context(|| format!("invalid {what} for the {pipeline} pipeline: {pattern}"))
}

/// Map one stdout line to a normalized build event, if it is one.
///
/// Success capture group 1 is the bundle count (default 1), group 2 the
/// elapsed milliseconds (default 0).
pub fn parse_build_line(line: &str, success_re: &Regex, failure_re: &Regex) -> Option<BuildEvent> {
    if let Some(caps) = success_re.captures(line) {
        return Some(BuildEvent::Success {
            bundles: caps
                .get(1)
                .and_then(|m| m.as_str().parse().ok())
                .unwrap_or(1),
            elapsed_ms: caps
                .get(2)
                .and_then(|m| m.as_str().parse().ok())
                .unwrap_or(0),
        });
    }
    if failure_re.is_match(line) {
        return Some(BuildEvent::Failure {
            diagnostics: vec![line.to_string()],
        });
    }
    None
}

/// Watch the bundler's stdout and emit one normalized `BuildEvent` per
/// recognized build result line.
///
/// A sliding window of recent lines is attached to `Failure` events, so the
/// compile errors printed before the "build failed" summary reach the
/// coordinator's error log.
fn spawn_stdout_monitor(
    pipeline: Pipeline,
    stdout: tokio::process::ChildStdout,
    success_re: Regex,
    failure_re: Regex,
    events_tx: mpsc::Sender<CoordinatorEvent>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let reader = BufReader::new(stdout);
        let mut lines = reader.lines();
        let mut recent: VecDeque<String> = VecDeque::with_capacity(DIAGNOSTIC_CONTEXT_LINES);

        while let Ok(Some(line)) = lines.next_line().await {
            debug!(pipeline = %pipeline, "stdout: {}", line);

            if recent.len() == DIAGNOSTIC_CONTEXT_LINES {
                recent.pop_front();
            }
            recent.push_back(line.clone());

            if let Some(mut event) = parse_build_line(&line, &success_re, &failure_re) {
                match &mut event {
                    BuildEvent::Success { .. } => recent.clear(),
                    BuildEvent::Failure { diagnostics } => {
                        *diagnostics = recent.drain(..).collect();
                    }
                }

                if events_tx
                    .send(CoordinatorEvent::Build { pipeline, event })
                    .await
                    .is_err()
                {
                    // Coordinator is gone; no point keeping the monitor alive.
                    warn!(pipeline = %pipeline, "coordinator channel closed; stopping monitor");
                    return;
                }
            }
        }

        debug!(pipeline = %pipeline, "stdout monitor ended");
    })
}
