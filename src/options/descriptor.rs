//! Option binding declarations.
//!
//! An [`OptionSpec`] describes one bindable surface of a step: the command
//! line name, the ordered parameter list with types and defaults, and nothing
//! else. The registry validates specs during collection and uses them to
//! convert raw values before dispatching back to the declaring step.

use super::value::{OptionValue, ParamType};

/// One named, typed parameter of an option.
#[derive(Debug, Clone)]
pub struct OptionParam {
    /// Parameter name, shown in listings and error messages
    pub name: String,
    /// Conversion target
    pub ty: ParamType,
    /// Fallback used when the supplied value list is shorter than the
    /// parameter list. Required for every parameter after the first.
    pub default: Option<OptionValue>,
}

/// Declarative description of one option binding.
///
/// Most options bind a single parameter named after the option itself.
/// Multi-parameter options append extra parameters via [`OptionSpec::param`];
/// one comma-separated command line value then fills the parameters
/// positionally, with missing trailing values taken from the defaults.
#[derive(Debug, Clone)]
pub struct OptionSpec {
    /// Primary name matched against `-name=value` tokens and environment
    /// variables, and passed back to the step's setter
    pub name: String,
    /// Positional parameters, length >= 1 for a valid spec
    pub params: Vec<OptionParam>,
}

impl OptionSpec {
    /// A single-parameter option named `name`.
    pub fn new(name: impl Into<String>, ty: ParamType) -> Self {
        let name = name.into();
        let params = vec![OptionParam { name: name.clone(), ty, default: None }];
        Self { name, params }
    }

    /// Append an extra parameter with a default value.
    pub fn param(mut self, name: impl Into<String>, ty: ParamType, default: OptionValue) -> Self {
        self.params.push(OptionParam { name: name.into(), ty, default: Some(default) });
        self
    }

    /// True if values of this option must be masked in logs and audit
    /// records.
    pub fn is_secret(&self) -> bool {
        self.name.to_lowercase().contains("pass")
    }

    /// One-line summary for the `steps` listing, e.g.
    /// `addScene (string addScene, int scenePosition = -1)`.
    pub fn describe(&self) -> String {
        let params: Vec<String> = self
            .params
            .iter()
            .map(|p| match &p.default {
                Some(d) => format!("{} {} = {}", p.ty, p.name, d),
                None => format!("{} {}", p.ty, p.name),
            })
            .collect();
        format!("{} ({})", self.name, params.join(", "))
    }
}
