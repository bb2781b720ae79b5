//! Options registry module.
//!
//! Binds command-line tokens of the form `-name=value` and environment
//! variables onto build steps through declarative option specs, with typed
//! conversion, environment variable indirection and secret masking.

pub mod descriptor;
pub mod registry;
pub mod value;

pub use descriptor::{OptionParam, OptionSpec};
pub use registry::{AppliedOption, OptionsRegistry};
pub use value::{Args, OptionValue, ParamType};

use thiserror::Error;

use crate::step::KindId;

/// Errors raised while collecting or applying options.
#[derive(Debug, Error)]
pub enum OptionsError {
    /// Schema violation: an option spec declares no parameters
    #[error("option '{option}' on step '{step}' must declare at least one parameter")]
    NoParameters { step: KindId, option: String },

    /// Schema violation: a non-first parameter has no default
    #[error("option '{option}' on step '{step}': parameter '{param}' after the first must have a default")]
    MissingDefault { step: KindId, option: String, param: String },

    /// A value could not be converted to the parameter's declared type.
    /// Secret values are masked before they reach this message.
    #[error("cannot convert '{value}' to {expected} for parameter '{param}'")]
    Conversion { param: String, expected: &'static str, value: String },

    /// More comma-separated values supplied than parameters declared
    #[error("option '{option}' got {given} values but declares only {declared} parameters")]
    TooManyValues { option: String, given: usize, declared: usize },

    /// A setter dispatched for a name the step does not bind
    #[error("step '{step}' has no option binding '{binding}'")]
    UnknownBinding { step: KindId, binding: String },

    /// A setter disagreed with its spec about a parameter type
    #[error("setter argument {index} has unexpected type (expected {expected})")]
    ArgMismatch { index: usize, expected: &'static str },

    /// A setter rejected an otherwise well-typed value
    #[error("{0}")]
    Rejected(String),

    /// Wrapper adding the option name and masked value to any error raised
    /// while applying that option
    #[error("failed to apply option '-{option}={value}': {source}")]
    Apply {
        option: String,
        value: String,
        #[source]
        source: Box<OptionsError>,
    },
}
