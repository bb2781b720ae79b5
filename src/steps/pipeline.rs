//! The pipeline step: resolves the build request and calls the engine.
//!
//! This is the designated final kind; the scheduler forces every other step
//! before it so that all settings mutations land before the player build.

use std::any::Any;
use std::path::PathBuf;

use crate::builder::BuildError;
use crate::engine::{BuildReport, BuildRequest};
use crate::options::{Args, OptionSpec, OptionValue, OptionsError, ParamType};
use crate::settings::BuildTarget;
use crate::step::{BuildContext, BuildStep, Kind, KindId, RunsPreBuild, StepLocator};

/// Options needed to build a player, plus the engine build call itself.
#[derive(Debug)]
pub struct PipelineStep {
    target: BuildTarget,
    build_dir: PathBuf,
    build_file: String,
    development: bool,
    allow_debugging: bool,
    server_build: bool,
    dry_run: bool,
    scenes: Vec<String>,
    report: Option<BuildReport>,
}

impl Default for PipelineStep {
    fn default() -> Self {
        Self {
            target: BuildTarget::default(),
            build_dir: PathBuf::from("builds"),
            build_file: String::new(),
            development: false,
            allow_debugging: false,
            server_build: false,
            dry_run: false,
            scenes: Vec::new(),
            report: None,
        }
    }
}

impl PipelineStep {
    pub const ID: KindId = "PipelineStep";
    pub const KIND: Kind = Kind::root(Self::ID);

    /// Target platform resolved from options; other steps read this during
    /// their hooks.
    pub fn target(&self) -> BuildTarget {
        self.target
    }

    pub fn scenes(&self) -> &[String] {
        &self.scenes
    }

    /// Report of the engine build, present after a successful non-dry run.
    pub fn report(&self) -> Option<&BuildReport> {
        self.report.as_ref()
    }

    /// Add a scene at `position` (-1 appends). An already listed scene is
    /// moved instead of duplicated; paths compare normalized and
    /// case-insensitive.
    fn add_scene(&mut self, path: &str, position: i64) -> Result<(), OptionsError> {
        if path.is_empty() {
            return Err(OptionsError::Rejected("scene path cannot be empty".to_string()));
        }

        let normalized = normalize_scene_path(path);
        self.remove_scene(&normalized);
        if position < 0 {
            self.scenes.push(normalized);
        } else {
            let at = (position as usize).min(self.scenes.len());
            self.scenes.insert(at, normalized);
        }
        Ok(())
    }

    fn remove_scene(&mut self, path: &str) {
        let normalized = normalize_scene_path(path);
        self.scenes.retain(|s| normalize_scene_path(s) != normalized);
    }

    fn output_path(&self, ctx: &BuildContext<'_>) -> PathBuf {
        let dir = if self.build_dir.is_absolute() {
            self.build_dir.clone()
        } else {
            ctx.project_root.join(&self.build_dir)
        };
        let file = if self.build_file.is_empty() {
            format!("player-{}", self.target)
        } else {
            self.build_file.clone()
        };
        dir.join(file)
    }
}

/// Collapse separators and lower-case a scene path so equality checks are
/// stable across platforms.
fn normalize_scene_path(path: &str) -> String {
    let mut out = path.replace('\\', "/").to_lowercase();
    while out.contains("//") {
        out = out.replace("//", "/");
    }
    out
}

impl BuildStep for PipelineStep {
    fn kind(&self) -> &'static Kind {
        &Self::KIND
    }

    fn options(&self) -> Vec<OptionSpec> {
        vec![
            OptionSpec::new("switchBuildTarget", ParamType::Symbol),
            OptionSpec::new("buildDir", ParamType::Str),
            OptionSpec::new("buildFile", ParamType::Str),
            OptionSpec::new("developmentBuild", ParamType::Bool),
            OptionSpec::new("allowDebugging", ParamType::Bool),
            OptionSpec::new("serverBuild", ParamType::Bool),
            OptionSpec::new("dryRun", ParamType::Bool),
            OptionSpec::new("addScene", ParamType::Str).param(
                "scenePosition",
                ParamType::Int,
                OptionValue::Int(-1),
            ),
            OptionSpec::new("withoutScene", ParamType::Str),
            OptionSpec::new("setScene", ParamType::Str),
        ]
    }

    fn apply_option(&mut self, name: &str, values: &[OptionValue]) -> Result<(), OptionsError> {
        let args = Args(values);
        match name {
            "switchBuildTarget" => {
                let symbol = args.str(0)?;
                self.target = BuildTarget::parse(symbol).ok_or_else(|| {
                    OptionsError::Rejected(format!("unknown build target '{}'", symbol))
                })?;
            }
            "buildDir" => self.build_dir = PathBuf::from(args.str(0)?),
            "buildFile" => self.build_file = args.str(0)?.to_string(),
            "developmentBuild" => self.development = args.bool(0)?,
            "allowDebugging" => self.allow_debugging = args.bool(0)?,
            "serverBuild" => self.server_build = args.bool(0)?,
            "dryRun" => self.dry_run = args.bool(0)?,
            "addScene" => self.add_scene(args.str(0)?, args.int(1)?)?,
            "withoutScene" => self.remove_scene(args.str(0)?),
            "setScene" => {
                let path = args.str(0)?.to_string();
                self.scenes.clear();
                self.add_scene(&path, -1)?;
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
            ("target".to_string(), self.target.to_string()),
            ("build_dir".to_string(), self.build_dir.display().to_string()),
            ("build_file".to_string(), self.build_file.clone()),
            ("development".to_string(), self.development.to_string()),
            ("allow_debugging".to_string(), self.allow_debugging.to_string()),
            ("server_build".to_string(), self.server_build.to_string()),
            ("dry_run".to_string(), self.dry_run.to_string()),
            ("scenes".to_string(), self.scenes.join(", ")),
        ]
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn pre_build(&mut self) -> Option<&mut dyn RunsPreBuild> {
        Some(self)
    }
}

impl RunsPreBuild for PipelineStep {
    fn on_pre_build(
        &mut self,
        _locator: &StepLocator<'_>,
        ctx: &mut BuildContext<'_>,
    ) -> Result<(), BuildError> {
        let request = BuildRequest {
            target: self.target,
            scenes: self.scenes.clone(),
            output: self.output_path(ctx),
            development: self.development,
            allow_debugging: self.allow_debugging,
            server_build: self.server_build,
            settings: ctx.settings.clone(),
        };

        if self.dry_run {
            println!(
                "Dry run selected. Would build player with:\nScenes: {}\nOutput: {}",
                request.scenes.join(", "),
                request.output.display()
            );
            return Ok(());
        }

        if ctx.verbose {
            println!("Building player for target '{}' ...", request.target);
        }
        self.report = Some(ctx.engine.build_player(&request)?);
        Ok(())
    }
}
