// src/hmr.rs

//! Hot-module-replacement feature flag.
//!
//! Most theme JavaScript runs inside a `DOMContentLoaded` handler and cannot
//! be hot-swapped, so HMR is opt-in: it is enabled on explicit request, or
//! when the project depends on a reactive UI framework that can actually make
//! use of it.

use std::path::Path;

use serde::Deserialize;
use tracing::{debug, warn};

/// Dependencies considered evidence that HMR is worthwhile.
const REACTIVE_FRAMEWORKS: &[&str] = &["react", "react-dom"];

/// The slice of `package.json` we care about.
#[derive(Debug, Deserialize, Default)]
struct PackageJson {
    #[serde(default)]
    dependencies: serde_json::Map<String, serde_json::Value>,
}

/// Decide whether hot module replacement should be enabled.
///
/// Precedence, highest first:
/// 1. `disable` forces false.
/// 2. `enable` forces true.
/// 3. `package.json` in `project_root` lists a reactive framework dependency.
/// 4. Otherwise false.
///
/// A missing or unreadable `package.json` counts as "no matching dependency".
pub fn hmr_enabled(disable: bool, enable: bool, project_root: &Path) -> bool {
    if disable {
        return false;
    }
    if enable {
        return true;
    }
    has_reactive_dependency(&project_root.join("package.json"))
}

fn has_reactive_dependency(package_json: &Path) -> bool {
    let contents = match std::fs::read_to_string(package_json) {
        Ok(c) => c,
        Err(err) => {
            debug!(path = ?package_json, error = %err, "no readable package.json");
            return false;
        }
    };

    let parsed: PackageJson = match serde_json::from_str(&contents) {
        Ok(p) => p,
        Err(err) => {
            warn!(path = ?package_json, error = %err, "failed to parse package.json");
            return false;
        }
    };

    REACTIVE_FRAMEWORKS
        .iter()
        .any(|dep| parsed.dependencies.contains_key(*dep))
}
