//! Keystore and signing credential options.
//!
//! The password option names contain `pass`, so their values are masked in
//! the audit trail and the parameter dump while the real values still reach
//! the settings.

use std::any::Any;

use crate::builder::BuildError;
use crate::options::{Args, OptionSpec, OptionValue, OptionsError, ParamType};
use crate::step::{BuildContext, BuildStep, Kind, KindId, RunsPreBuild, StepLocator};

#[derive(Debug, Default)]
pub struct SigningOptionsStep {
    keystore: String,
    keystore_password: String,
    keyalias: String,
    keyalias_password: String,
}

impl SigningOptionsStep {
    pub const ID: KindId = "SigningOptionsStep";
    pub const KIND: Kind = Kind::root(Self::ID);
}

impl BuildStep for SigningOptionsStep {
    fn kind(&self) -> &'static Kind {
        &Self::KIND
    }

    fn options(&self) -> Vec<OptionSpec> {
        vec![
            OptionSpec::new("keystore", ParamType::Str),
            OptionSpec::new("keystorePassword", ParamType::Str),
            OptionSpec::new("keyalias", ParamType::Str),
            OptionSpec::new("keyaliasPassword", ParamType::Str),
        ]
    }

    fn apply_option(&mut self, name: &str, values: &[OptionValue]) -> Result<(), OptionsError> {
        let args = Args(values);
        let value = args.str(0)?.to_string();
        match name {
            "keystore" => self.keystore = value,
            "keystorePassword" => self.keystore_password = value,
            "keyalias" => self.keyalias = value,
            "keyaliasPassword" => self.keyalias_password = value,
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
            ("keystore".to_string(), self.keystore.clone()),
            ("keystore_password".to_string(), self.keystore_password.clone()),
            ("keyalias".to_string(), self.keyalias.clone()),
            ("keyalias_password".to_string(), self.keyalias_password.clone()),
        ]
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn pre_build(&mut self) -> Option<&mut dyn RunsPreBuild> {
        Some(self)
    }
}

impl RunsPreBuild for SigningOptionsStep {
    fn on_pre_build(
        &mut self,
        _locator: &StepLocator<'_>,
        ctx: &mut BuildContext<'_>,
    ) -> Result<(), BuildError> {
        let signing = &mut ctx.settings.signing;
        signing.keystore = self.keystore.clone();
        signing.keystore_password = self.keystore_password.clone();
        signing.keyalias = self.keyalias.clone();
        signing.keyalias_password = self.keyalias_password.clone();
        Ok(())
    }
}
