//! General player options shared between platforms.

use std::any::Any;

use crate::builder::BuildError;
use crate::options::{Args, OptionSpec, OptionValue, OptionsError, ParamType};
use crate::settings::BuildTarget;
use crate::step::{BuildContext, BuildStep, Kind, KindId, RunsPreBuild, StepLocator};
use crate::steps::PipelineStep;

/// iOS caps the bundle version string length.
const IOS_VERSION_LIMIT: usize = 18;

#[derive(Debug, Default)]
pub struct GeneralOptionsStep {
    product_name: String,
    bundle_version: String,
    show_splash_screen: bool,
    show_engine_logo: bool,
}

impl GeneralOptionsStep {
    pub const ID: KindId = "GeneralOptionsStep";
    pub const KIND: Kind = Kind::root(Self::ID);
}

impl BuildStep for GeneralOptionsStep {
    fn kind(&self) -> &'static Kind {
        &Self::KIND
    }

    fn options(&self) -> Vec<OptionSpec> {
        vec![
            OptionSpec::new("productName", ParamType::Str),
            OptionSpec::new("bundleVersion", ParamType::Str),
            OptionSpec::new("showSplashScreen", ParamType::Bool),
            OptionSpec::new("showEngineLogo", ParamType::Bool),
        ]
    }

    fn apply_option(&mut self, name: &str, values: &[OptionValue]) -> Result<(), OptionsError> {
        let args = Args(values);
        match name {
            "productName" => self.product_name = args.str(0)?.to_string(),
            "bundleVersion" => self.bundle_version = args.str(0)?.to_string(),
            "showSplashScreen" => self.show_splash_screen = args.bool(0)?,
            "showEngineLogo" => self.show_engine_logo = args.bool(0)?,
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
            ("product_name".to_string(), self.product_name.clone()),
            ("bundle_version".to_string(), self.bundle_version.clone()),
            ("show_splash_screen".to_string(), self.show_splash_screen.to_string()),
            ("show_engine_logo".to_string(), self.show_engine_logo.to_string()),
        ]
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn pre_build(&mut self) -> Option<&mut dyn RunsPreBuild> {
        Some(self)
    }
}

impl RunsPreBuild for GeneralOptionsStep {
    fn on_pre_build(
        &mut self,
        locator: &StepLocator<'_>,
        ctx: &mut BuildContext<'_>,
    ) -> Result<(), BuildError> {
        let target = locator
            .get::<PipelineStep>()
            .map(PipelineStep::target)
            .unwrap_or_default();

        ctx.settings.product_name = self.product_name.clone();
        ctx.settings.bundle_version = if target == BuildTarget::Ios {
            self.bundle_version.chars().take(IOS_VERSION_LIMIT).collect()
        } else {
            self.bundle_version.clone()
        };
        ctx.settings.show_splash_screen = self.show_splash_screen;
        ctx.settings.show_engine_logo = self.show_engine_logo;
        Ok(())
    }
}
