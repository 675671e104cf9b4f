// src/config/validate.rs

use anyhow::{anyhow, Context, Result};
use globset::Glob;
use regex::Regex;

use crate::config::model::{ConfigFile, PipelineSpec};

/// Run basic semantic validation against a loaded configuration.
///
/// This checks:
/// - `[proxy].target` is non-empty
/// - both pipeline commands are non-empty
/// - `[lint].quiet_period_ms >= 1`
/// - the template watch glob compiles
/// - all regex overrides (ready/success/failure patterns) compile
///
/// It does **not** check that the commands themselves exist or that TLS
/// certificate files are readable; those fail at first use.
pub fn validate_config(cfg: &ConfigFile) -> Result<()> {
    validate_proxy(cfg)?;
    validate_pipeline("styles", &cfg.pipeline.styles)?;
    validate_pipeline("scripts", &cfg.pipeline.scripts)?;
    validate_lint(cfg)?;
    validate_templates(cfg)?;
    Ok(())
}

fn validate_proxy(cfg: &ConfigFile) -> Result<()> {
    if cfg.proxy.target.trim().is_empty() {
        return Err(anyhow!("[proxy].target must not be empty"));
    }

    if let Some(ref pat) = cfg.proxy.ready_pattern {
        Regex::new(pat).with_context(|| format!("invalid [proxy].ready_pattern: {pat}"))?;
    }

    Ok(())
}

fn validate_pipeline(name: &str, spec: &PipelineSpec) -> Result<()> {
    if spec.cmd.trim().is_empty() {
        return Err(anyhow!("[pipeline.{name}].cmd must not be empty"));
    }

    if let Some(ref pat) = spec.success_pattern {
        Regex::new(pat)
            .with_context(|| format!("invalid [pipeline.{name}].success_pattern: {pat}"))?;
    }
    if let Some(ref pat) = spec.failure_pattern {
        Regex::new(pat)
            .with_context(|| format!("invalid [pipeline.{name}].failure_pattern: {pat}"))?;
    }

    Ok(())
}

fn validate_lint(cfg: &ConfigFile) -> Result<()> {
    if cfg.lint.cmd.trim().is_empty() {
        return Err(anyhow!("[lint].cmd must not be empty"));
    }
    if cfg.lint.quiet_period_ms == 0 {
        return Err(anyhow!("[lint].quiet_period_ms must be >= 1 (got 0)"));
    }
    Ok(())
}

fn validate_templates(cfg: &ConfigFile) -> Result<()> {
    Glob::new(&cfg.templates.watch)
        .with_context(|| format!("invalid [templates].watch glob: {}", cfg.templates.watch))?;
    Ok(())
}
