// src/config/mod.rs

//! Configuration handling: TOML model, loading, and semantic validation.

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{load_and_validate, load_from_path};
pub use model::{
    ConfigFile, LintSection, PipelineSpec, ProjectSection, ProxySection, TemplatesSection,
};
pub use validate::validate_config;
