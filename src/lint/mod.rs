// src/lint/mod.rs

//! Style linter collaborator.
//!
//! The lint pass runs after styles builds, debounced and held back until the
//! proxy is up. A failing *tool* (spawn error, signal) is logged and never
//! stops the coordinator; lint *violations* are ordinary output.

use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use std::process::Stdio;

use anyhow::{Context, Result};
use tracing::{error, info, warn};

use crate::exec::shell_command;

/// Result of one lint pass. `output` is the linter's formatted diagnostics;
/// empty means no findings.
#[derive(Debug, Clone)]
pub struct LintReport {
    pub output: String,
}

/// Contract for the style linter.
pub trait Linter: Send + Sync {
    fn lint(&self) -> Pin<Box<dyn Future<Output = Result<LintReport>> + Send + '_>>;
}

/// Production linter: runs the configured stylelint command, non-fixing, and
/// reports its combined output.
pub struct StylelintRunner {
    cmd: String,
    workdir: PathBuf,
}

impl StylelintRunner {
    pub fn new(cmd: impl Into<String>, workdir: impl Into<PathBuf>) -> Self {
        Self {
            cmd: cmd.into(),
            workdir: workdir.into(),
        }
    }
}

impl Linter for StylelintRunner {
    fn lint(&self) -> Pin<Box<dyn Future<Output = Result<LintReport>> + Send + '_>> {
        Box::pin(async move {
            let output = shell_command(&self.cmd)
                .current_dir(&self.workdir)
                .stdin(Stdio::null())
                .output()
                .await
                .with_context(|| format!("running lint command: {}", self.cmd))?;

            // stylelint exits non-zero when it finds violations; that is a
            // report, not a tool failure.
            let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
            let stderr = String::from_utf8_lossy(&output.stderr);
            if !stderr.trim().is_empty() {
                if !combined.is_empty() {
                    combined.push('\n');
                }
                combined.push_str(stderr.trim_end());
            }

            Ok(LintReport { output: combined })
        })
    }
}

/// Run one lint pass and log the outcome. This is the body of the debounced
/// lint task; errors stop here.
pub async fn run_lint_pass(linter: &dyn Linter) {
    info!("🎨 Running stylelint");

    match linter.lint().await {
        Ok(report) => {
            let trimmed = report.output.trim();
            if trimmed.is_empty() {
                info!("✅ No stylelint issues");
            } else {
                warn!("❗ Stylelint found issues:\n\n{trimmed}\n");
            }
        }
        Err(err) => {
            error!("❗ Stylelint failed: {err:#}");
        }
    }
}
