//! Buildline - ordered build steps for game player builds
//!
//! This library provides functionality to:
//! - Order build steps by kind-level before/after constraints
//! - Bind `-name=value` option tokens and environment values onto steps
//! - Run pre-build and post-build hooks around an engine player build

pub mod builder;
pub mod cli;
pub mod config;
pub mod engine;
pub mod options;
pub mod ordering;
pub mod settings;
pub mod step;
pub mod steps;
