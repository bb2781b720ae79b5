//! Rendering options shared by mobile targets.

use std::any::Any;

use crate::builder::BuildError;
use crate::options::{Args, OptionSpec, OptionValue, OptionsError, ParamType};
use crate::step::{BuildContext, BuildStep, Kind, KindId, RunsPreBuild, StepLocator};
use crate::steps::GeneralOptionsStep;

/// Runs before [`GeneralOptionsStep`] so the general step sees the final
/// rendering configuration.
#[derive(Debug)]
pub struct MobileRenderingOptionsStep {
    multithreaded_rendering: bool,
    color_space: String,
}

impl Default for MobileRenderingOptionsStep {
    fn default() -> Self {
        Self { multithreaded_rendering: true, color_space: "gamma".to_string() }
    }
}

impl MobileRenderingOptionsStep {
    pub const ID: KindId = "MobileRenderingOptionsStep";
    pub const KIND: Kind = Kind::root(Self::ID).run_before(&[GeneralOptionsStep::ID]);
}

impl BuildStep for MobileRenderingOptionsStep {
    fn kind(&self) -> &'static Kind {
        &Self::KIND
    }

    fn options(&self) -> Vec<OptionSpec> {
        vec![
            OptionSpec::new("multithreadedRendering", ParamType::Bool),
            OptionSpec::new("colorSpace", ParamType::Symbol),
        ]
    }

    fn apply_option(&mut self, name: &str, values: &[OptionValue]) -> Result<(), OptionsError> {
        let args = Args(values);
        match name {
            "multithreadedRendering" => self.multithreaded_rendering = args.bool(0)?,
            "colorSpace" => {
                let symbol = args.str(0)?;
                if symbol != "gamma" && symbol != "linear" {
                    return Err(OptionsError::Rejected(format!(
                        "unknown color space '{}', expected 'gamma' or 'linear'",
                        symbol
                    )));
                }
                self.color_space = symbol.to_string();
            }
            other => {
                return Err(OptionsError::UnknownBinding {
                    step: Self::ID,
                    binding: other.to_string(),
                })
            }
        }
        Ok(())
    }

    fn dump_params(&self) -> Vec<(String, String)> {
        vec![
            ("multithreaded_rendering".to_string(), self.multithreaded_rendering.to_string()),
            ("color_space".to_string(), self.color_space.clone()),
        ]
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn pre_build(&mut self) -> Option<&mut dyn RunsPreBuild> {
        Some(self)
    }
}

impl RunsPreBuild for MobileRenderingOptionsStep {
    fn on_pre_build(
        &mut self,
        _locator: &StepLocator<'_>,
        ctx: &mut BuildContext<'_>,
    ) -> Result<(), BuildError> {
        ctx.settings.multithreaded_rendering = self.multithreaded_rendering;
        ctx.settings.color_space = self.color_space.clone();
        Ok(())
    }
}
