//! Configuration module for the buildline front end
//!
//! Provides types, discovery and parsing for `buildline.toml` project
//! configuration.

pub mod loader;
pub mod schema;

pub use loader::{default_config, find_config, find_config_from, load_config, ConfigError};
pub use schema::*;
