//! Build info generation.
//!
//! Writes a `build_info.json` into the project before the player build so it
//! gets packaged into the player, and removes it again afterwards.

use std::any::Any;
use std::fs;
use std::path::{Path, PathBuf};

use crate::builder::BuildError;
use crate::settings::BuildInfo;
use crate::step::{BuildContext, BuildStep, Kind, KindId, RunsPostBuild, RunsPreBuild, StepLocator};
use crate::steps::GeneralOptionsStep;

/// Project-relative location the generated file is packaged from.
const BUILD_INFO_PATH: &str = "assets/resources/build_info.json";

/// Runs after [`GeneralOptionsStep`] so the generated info reflects the
/// resolved product settings.
#[derive(Debug, Default)]
pub struct BuildInfoStep {
    written: Option<PathBuf>,
}

impl BuildInfoStep {
    pub const ID: KindId = "BuildInfoStep";
    pub const KIND: Kind = Kind::root(Self::ID).run_after(&[GeneralOptionsStep::ID]);

    /// Where the info file lives under `project_root`.
    pub fn info_path(project_root: &Path) -> PathBuf {
        project_root.join(BUILD_INFO_PATH)
    }
}

impl BuildStep for BuildInfoStep {
    fn kind(&self) -> &'static Kind {
        &Self::KIND
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn pre_build(&mut self) -> Option<&mut dyn RunsPreBuild> {
        Some(self)
    }

    fn post_build(&mut self) -> Option<&mut dyn RunsPostBuild> {
        Some(self)
    }
}

impl RunsPreBuild for BuildInfoStep {
    fn on_pre_build(
        &mut self,
        _locator: &StepLocator<'_>,
        ctx: &mut BuildContext<'_>,
    ) -> Result<(), BuildError> {
        let info = BuildInfo::assemble(ctx.settings);
        let path = Self::info_path(&ctx.project_root);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, serde_json::to_vec_pretty(&info)?)?;
        if ctx.verbose {
            println!("Wrote build info: {}", path.display());
        }
        self.written = Some(path);
        Ok(())
    }
}

impl RunsPostBuild for BuildInfoStep {
    fn on_post_build(
        &mut self,
        _locator: &StepLocator<'_>,
        ctx: &mut BuildContext<'_>,
    ) -> Result<(), BuildError> {
        if let Some(path) = self.written.take() {
            if path.exists() {
                fs::remove_file(&path)?;
            }
            if ctx.verbose {
                println!("Removed build info: {}", path.display());
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::ManifestEngine;
    use crate::settings::PlayerSettings;
    use tempfile::TempDir;

    #[test]
    fn test_info_written_pre_build_and_removed_post_build() {
        let temp = TempDir::new().unwrap();
        let mut step = BuildInfoStep::default();
        let mut settings = PlayerSettings {
            bundle_version: "2.0".to_string(),
            ..Default::default()
        };
        let mut engine = ManifestEngine::new();
        let mut ctx = BuildContext {
            settings: &mut settings,
            engine: &mut engine,
            project_root: temp.path().to_path_buf(),
            verbose: false,
        };

        let locator = StepLocator::new(&[], &[]);
        step.on_pre_build(&locator, &mut ctx).unwrap();

        let path = BuildInfoStep::info_path(temp.path());
        let raw = fs::read_to_string(&path).unwrap();
        let info: BuildInfo = serde_json::from_str(&raw).unwrap();
        assert_eq!(info.bundle_version, "2.0");

        step.on_post_build(&locator, &mut ctx).unwrap();
        assert!(!path.exists());
    }
}
