//! Compiler define management.

use std::any::Any;

use crate::builder::BuildError;
use crate::options::{Args, OptionSpec, OptionValue, OptionsError, ParamType};
use crate::step::{BuildContext, BuildStep, Kind, KindId, RunsPreBuild, StepLocator};

/// Adds and removes compiler defines. Defines are upper-cased and
/// deduplicated; removal wins over addition of the same define.
#[derive(Debug, Default)]
pub struct DefinesStep {
    add: Vec<String>,
    remove: Vec<String>,
}

impl DefinesStep {
    pub const ID: KindId = "DefinesStep";
    pub const KIND: Kind = Kind::root(Self::ID);

    fn push_define(list: &mut Vec<String>, define: &str) -> Result<(), OptionsError> {
        if define.is_empty() {
            return Err(OptionsError::Rejected("define cannot be empty".to_string()));
        }
        let define = define.to_uppercase();
        if !list.contains(&define) {
            list.push(define);
        }
        Ok(())
    }
}

impl BuildStep for DefinesStep {
    fn kind(&self) -> &'static Kind {
        &Self::KIND
    }

    fn options(&self) -> Vec<OptionSpec> {
        vec![
            OptionSpec::new("define", ParamType::Str),
            OptionSpec::new("undefine", ParamType::Str),
        ]
    }

    fn apply_option(&mut self, name: &str, values: &[OptionValue]) -> Result<(), OptionsError> {
        let args = Args(values);
        match name {
            "define" => Self::push_define(&mut self.add, args.str(0)?),
            "undefine" => Self::push_define(&mut self.remove, args.str(0)?),
            other => Err(OptionsError::UnknownBinding {
                step: Self::ID,
                binding: other.to_string(),
            }),
        }
    }

    fn dump_params(&self) -> Vec<(String, String)> {
        vec![
            ("add_defines".to_string(), self.add.join(", ")),
            ("remove_defines".to_string(), self.remove.join(", ")),
        ]
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn pre_build(&mut self) -> Option<&mut dyn RunsPreBuild> {
        Some(self)
    }
}

impl RunsPreBuild for DefinesStep {
    fn on_pre_build(
        &mut self,
        _locator: &StepLocator<'_>,
        ctx: &mut BuildContext<'_>,
    ) -> Result<(), BuildError> {
        let mut defines = ctx.settings.defines.clone();
        for define in &self.add {
            if !defines.contains(define) {
                defines.push(define.clone());
            }
        }
        defines.retain(|d| !self.remove.contains(d));
        ctx.settings.defines = defines;
        Ok(())
    }
}
