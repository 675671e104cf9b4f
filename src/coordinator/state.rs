// src/coordinator/state.rs

use std::fmt;

/// The two asset pipelines the coordinator sequences.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pipeline {
    Styles,
    Scripts,
}

impl Pipeline {
    /// The other pipeline.
    pub fn other(self) -> Self {
        match self {
            Pipeline::Styles => Pipeline::Scripts,
            Pipeline::Scripts => Pipeline::Styles,
        }
    }

    /// Human-readable label used in log messages.
    pub fn label(self) -> &'static str {
        match self {
            Pipeline::Styles => "Sass",
            Pipeline::Scripts => "JavaScript",
        }
    }
}

impl fmt::Display for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Progress of the one-time proxy startup.
///
/// Transitions are forward-only:
///
/// - `NotStarted` → first successful build from either pipeline →
///   `WaitingOn(the other pipeline)`.
/// - `WaitingOn(x)` → first successful build from `x` → `ProxyActive`
///   (proxy startup is triggered exactly at this transition).
/// - A repeat success from the already-counted pipeline does not advance
///   the state.
/// - `ProxyActive` is terminal for the lifetime of the process.
///
/// Once the proxy exists, its own `active` status is authoritative; this
/// state only matters before then.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartupState {
    NotStarted,
    WaitingOn(Pipeline),
    ProxyActive,
}
