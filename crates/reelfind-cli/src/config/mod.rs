//! Application configuration module.
//!
//! Reads the TOML config file and overlays environment variables to
//! produce the effective [`Settings`].

#[allow(clippy::module_inception)]
mod config;
mod paths;
mod settings;

#[allow(clippy::module_name_repetitions)]
pub use config::AppConfig;
pub use paths::resolve_config_path;
pub use settings::{AppwriteSettings, Settings};
