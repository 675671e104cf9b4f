// src/config/model.rs

use serde::Deserialize;

/// Top-level configuration as read from a TOML file.
///
/// ```toml
/// [proxy]
/// target = "https://airdev.test"
///
/// [pipeline.styles]
/// cmd = "npx parcel watch sass/global.scss --dist-dir dist/sass"
/// reload_target = "dist/sass/global.css"
///
/// [pipeline.scripts]
/// cmd = "npx parcel watch js/front-end.js --dist-dir dist/js"
/// hmr_args = "--hmr-port 3005"
///
/// [lint]
/// cmd = "npx stylelint 'sass/**/*.scss' --formatter string"
///
/// [templates]
/// watch = "**/*.php"
/// ```
///
/// The `[proxy]` target and both pipeline commands are required; everything
/// else has defaults.
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigFile {
    /// Project-level settings from `[project]`.
    #[serde(default)]
    pub project: ProjectSection,

    /// Reload-proxy settings from `[proxy]`.
    pub proxy: ProxySection,

    /// The two asset pipelines from `[pipeline.styles]` / `[pipeline.scripts]`.
    pub pipeline: PipelineTable,

    /// Style linter settings from `[lint]`.
    #[serde(default)]
    pub lint: LintSection,

    /// Template watcher settings from `[templates]`.
    #[serde(default)]
    pub templates: TemplatesSection,
}

/// `[project]` section.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ProjectSection {
    /// Directory containing `package.json`.
    ///
    /// Relative paths are resolved against the config file's directory; if
    /// omitted, the config file's directory itself is used.
    #[serde(default)]
    pub root: Option<String>,
}

/// `[proxy]` section: how to start and talk to the reload proxy.
#[derive(Debug, Clone, Deserialize)]
pub struct ProxySection {
    /// URL of the locally running site to proxy (e.g. `https://airdev.test`).
    pub target: String,

    /// Port the proxy listens on. Also used by reload notifications.
    #[serde(default = "default_proxy_port")]
    pub port: u16,

    /// TLS key/cert file paths passed to the proxy. Not validated up front;
    /// a missing file surfaces as a proxy startup failure.
    #[serde(default)]
    pub https_key: Option<String>,

    #[serde(default)]
    pub https_cert: Option<String>,

    /// Override for the full proxy start command. If `None`, a browser-sync
    /// command line is assembled from the fields above.
    #[serde(default)]
    pub cmd: Option<String>,

    /// Regex matched against proxy stdout to detect successful startup.
    #[serde(default)]
    pub ready_pattern: Option<String>,

    /// How long to wait for the ready line before giving up on startup.
    #[serde(default = "default_startup_timeout_secs")]
    pub startup_timeout_secs: u64,
}

fn default_proxy_port() -> u16 {
    3000
}

fn default_startup_timeout_secs() -> u64 {
    30
}

/// `[pipeline]` table: exactly one styles and one scripts pipeline.
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineTable {
    pub styles: PipelineSpec,
    pub scripts: PipelineSpec,
}

/// One `[pipeline.<name>]` section: a watch-mode bundler invocation.
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineSpec {
    /// The watch-mode build command to run (long-lived).
    pub cmd: String,

    /// Output path to inject on rebuild, relative to the served site.
    ///
    /// If `None`, rebuilds trigger a full-page reload instead of a
    /// path-scoped inject.
    #[serde(default)]
    pub reload_target: Option<String>,

    /// Extra arguments appended to `cmd` when hot module replacement is
    /// enabled. Only meaningful for the scripts pipeline.
    #[serde(default)]
    pub hmr_args: Option<String>,

    /// Regex matched against bundler stdout to detect a finished build.
    ///
    /// Capture group 1 is the bundle count, group 2 the elapsed milliseconds;
    /// both are optional. Default matches `Built 2 bundles in 431ms`.
    #[serde(default)]
    pub success_pattern: Option<String>,

    /// Regex matched against bundler stdout to detect a failed build.
    /// Default matches lines containing `Build failed`.
    #[serde(default)]
    pub failure_pattern: Option<String>,
}

/// `[lint]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct LintSection {
    /// The lint command, non-fixing. Its combined output is reported as-is.
    #[serde(default = "default_lint_cmd")]
    pub cmd: String,

    /// Quiet period for the debounced lint trigger.
    #[serde(default = "default_quiet_period_ms")]
    pub quiet_period_ms: u64,
}

fn default_lint_cmd() -> String {
    "npx stylelint 'sass/**/*.scss' --formatter string".to_string()
}

fn default_quiet_period_ms() -> u64 {
    1000
}

impl Default for LintSection {
    fn default() -> Self {
        Self {
            cmd: default_lint_cmd(),
            quiet_period_ms: default_quiet_period_ms(),
        }
    }
}

/// `[templates]` section: server-side files that bypass the bundlers.
#[derive(Debug, Clone, Deserialize)]
pub struct TemplatesSection {
    /// Glob pattern (relative to the project root) for template files whose
    /// changes should trigger a full-page reload.
    #[serde(default = "default_templates_watch")]
    pub watch: String,
}

fn default_templates_watch() -> String {
    "**/*.php".to_string()
}

impl Default for TemplatesSection {
    fn default() -> Self {
        Self {
            watch: default_templates_watch(),
        }
    }
}
