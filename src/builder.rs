//! Build orchestration.
//!
//! The [`Builder`] owns the step set for one run: it applies the
//! `include_steps`/`exclude_steps` meta options, sorts the steps, binds
//! command-line and environment options onto them, and runs the two-phase
//! protocol - pre-build hooks in sorted order, post-build hooks in reverse
//! sorted order - around the engine collaborator, with settings backup and
//! restore wrapped around the whole run.

use std::cell::RefCell;
use std::mem;
use std::path::PathBuf;
use std::rc::Rc;

use thiserror::Error;

use crate::engine::{BuildReport, Engine, EngineError};
use crate::options::{
    AppliedOption, Args, OptionSpec, OptionsError, OptionsRegistry, ParamType,
};
use crate::ordering::{sort_steps, CycleError};
use crate::settings::PlayerSettings;
use crate::step::{BuildContext, BuildStep, KindId, StepLocator};
use crate::steps::PipelineStep;

/// Error aborting a build run.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error(transparent)]
    Cycle(#[from] CycleError),

    #[error(transparent)]
    Options(#[from] OptionsError),

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("failed to serialize build metadata: {0}")]
    Serialize(#[from] serde_json::Error),

    /// A step name passed to `include_steps`/`exclude_steps` matches no
    /// available step
    #[error("unknown build step '{0}'")]
    UnknownStep(String),

    #[error("include_steps and exclude_steps cannot be used at the same time")]
    ConflictingStepFilters,

    /// A hook failed for a step-specific reason
    #[error("step '{step}' failed: {message}")]
    Step { step: KindId, message: String },
}

/// Result of a completed run.
#[derive(Debug)]
pub struct BuildOutcome {
    /// Ordered audit records from command-line and environment option
    /// application, secrets masked
    pub applied: Vec<AppliedOption>,
    /// Settings as resolved by the pre-build phase
    pub settings: PlayerSettings,
    /// Engine report, absent for dry runs
    pub report: Option<BuildReport>,
}

/// Discovers nothing itself: callers hand the builder an explicit step list
/// (usually [`crate::steps::default_steps`]) and the raw option tokens.
pub struct Builder {
    steps: Vec<Box<dyn BuildStep>>,
    settings: PlayerSettings,
    project_root: PathBuf,
    verbose: bool,
}

impl Builder {
    /// Build over an explicit step set.
    pub fn new(steps: Vec<Box<dyn BuildStep>>) -> Self {
        Self {
            steps,
            settings: PlayerSettings::default(),
            project_root: PathBuf::from("."),
            verbose: false,
        }
    }

    /// Build over the built-in step set.
    pub fn with_default_steps() -> Self {
        Self::new(crate::steps::default_steps())
    }

    /// Settings the run starts from, before any step mutates them.
    pub fn settings(mut self, settings: PlayerSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Root of the game project being built.
    pub fn project_root(mut self, root: PathBuf) -> Self {
        self.project_root = root;
        self
    }

    /// Emit progress and the option/parameter dump.
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Run the full two-phase build.
    ///
    /// Engine settings are backed up before the phases and restored on the
    /// way out, also when the run fails.
    pub fn build_game(
        mut self,
        tokens: &[String],
        engine: &mut dyn Engine,
    ) -> Result<BuildOutcome, BuildError> {
        let (include, exclude) = step_filters(tokens)?;
        self.steps = filter_steps(self.steps, include.as_deref(), exclude.as_deref())?;

        engine.backup_settings()?;
        let result = self.run_phases(tokens, engine);
        let restore = engine.restore_settings();

        let outcome = result?;
        restore?;
        Ok(outcome)
    }

    fn run_phases(
        &mut self,
        tokens: &[String],
        engine: &mut dyn Engine,
    ) -> Result<BuildOutcome, BuildError> {
        self.steps = sort_steps(mem::take(&mut self.steps), Some(PipelineStep::ID))?;

        let mut registry = OptionsRegistry::new();
        registry.collect(&self.steps)?;
        // Tokens first, then the environment pass, which re-applies any
        // option with a matching variable and so overrides token values.
        let mut applied = registry.process_options(&mut self.steps, tokens)?;
        applied.extend(registry.process_environment(&mut self.steps)?);

        if self.verbose {
            println!("Running build with options:");
            for record in &applied {
                println!("    '{}' = '{}'", record.name, record.value);
            }
            self.dump_parameters();
        }

        // Pre-build hooks in sorted order.
        for i in 0..self.steps.len() {
            let (head, rest) = self.steps.split_at_mut(i);
            if let Some((step, tail)) = rest.split_first_mut() {
                if let Some(pre) = step.pre_build() {
                    let locator = StepLocator::new(head, tail);
                    let mut ctx = BuildContext {
                        settings: &mut self.settings,
                        engine: &mut *engine,
                        project_root: self.project_root.clone(),
                        verbose: self.verbose,
                    };
                    pre.on_pre_build(&locator, &mut ctx)?;
                }
            }
        }

        // Post-build hooks in reverse sorted order.
        for i in (0..self.steps.len()).rev() {
            let (head, rest) = self.steps.split_at_mut(i);
            if let Some((step, tail)) = rest.split_first_mut() {
                if let Some(post) = step.post_build() {
                    let locator = StepLocator::new(head, tail);
                    let mut ctx = BuildContext {
                        settings: &mut self.settings,
                        engine: &mut *engine,
                        project_root: self.project_root.clone(),
                        verbose: self.verbose,
                    };
                    post.on_post_build(&locator, &mut ctx)?;
                }
            }
        }

        let report = self
            .steps
            .iter()
            .find_map(|s| s.as_any().downcast_ref::<PipelineStep>())
            .and_then(|p| p.report().cloned());

        Ok(BuildOutcome { applied, settings: self.settings.clone(), report })
    }

    fn dump_parameters(&self) {
        println!("Build step parameters:");
        for step in &self.steps {
            println!("  [{}]", step.kind().id());
            for (name, value) in step.dump_params() {
                let shown = if name.to_lowercase().contains("pass") && !value.is_empty() {
                    "*".repeat(value.chars().count())
                } else {
                    value
                };
                println!("    {} = {}", name, shown);
            }
        }
    }
}

/// Parse the orchestrator meta options out of the raw token stream using an
/// explicitly registered option pair.
fn step_filters(tokens: &[String]) -> Result<(Option<String>, Option<String>), OptionsError> {
    let include = Rc::new(RefCell::new(None));
    let exclude = Rc::new(RefCell::new(None));

    let mut registry = OptionsRegistry::new();
    for (name, slot) in [("include_steps", &include), ("exclude_steps", &exclude)] {
        let slot = Rc::clone(slot);
        registry.register(OptionSpec::new(name, ParamType::Str), move |values| {
            *slot.borrow_mut() = Some(Args(values).str(0)?.to_string());
            Ok(())
        });
    }
    registry.process_options(&mut [], tokens)?;

    let unwrap = |slot: &Rc<RefCell<Option<String>>>| {
        slot.borrow().clone().filter(|s| !s.trim().is_empty())
    };
    Ok((unwrap(&include), unwrap(&exclude)))
}

/// Apply the include/exclude filters, validating every named step against
/// the available set before any ordering or option work happens.
fn filter_steps(
    steps: Vec<Box<dyn BuildStep>>,
    include: Option<&str>,
    exclude: Option<&str>,
) -> Result<Vec<Box<dyn BuildStep>>, BuildError> {
    if include.is_some() && exclude.is_some() {
        return Err(BuildError::ConflictingStepFilters);
    }

    let Some((list, keep_listed)) = include.map(|l| (l, true)).or(exclude.map(|l| (l, false)))
    else {
        return Ok(steps);
    };

    let names: Vec<&str> = list.split_whitespace().collect();
    for name in &names {
        if !steps.iter().any(|s| s.kind().id() == *name) {
            return Err(BuildError::UnknownStep(name.to_string()));
        }
    }

    Ok(steps
        .into_iter()
        .filter(|s| names.contains(&s.kind().id()) == keep_listed)
        .collect())
}
