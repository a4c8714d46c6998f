//! Configuration module for salesql.
//!
//! Handles the config file, environment variables, and schema selection.

mod settings;

pub use settings::{expand_env_vars, CompilerSettings, SchemaSettings, Settings, SettingsError};
