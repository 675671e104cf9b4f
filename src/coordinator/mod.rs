// src/coordinator/mod.rs

//! Build coordination for the development server.
//!
//! This module ties together:
//! - the first-success state machine that decides when the reload proxy
//!   may start
//! - the main event loop that reacts to:
//!   - pipeline build events (success/failure)
//!   - template file changes
//!   - shutdown signals
//! - the ordered shutdown of watchers, bundler workers, and the proxy

pub mod runtime;
pub mod state;

pub use runtime::{BuildEvent, Coordinator, CoordinatorEvent, CoordinatorHandles};
pub use state::{Pipeline, StartupState};
