//! Build step trait and kind descriptors.
//!
//! A build step is a unit of build work. Steps carry a [`Kind`] descriptor
//! that gives them a nominal identity, an optional ancestor chain, and the
//! before/after ordering constraints the scheduler consumes. Constraints
//! declared on an ancestor kind bind every kind derived from it.

use std::any::Any;
use std::path::PathBuf;

use crate::engine::Engine;
use crate::options::{OptionSpec, OptionValue, OptionsError};
use crate::settings::PlayerSettings;

/// Identity of a step kind. Kind ids double as the names accepted by the
/// `include_steps`/`exclude_steps` meta options.
pub type KindId = &'static str;

/// Descriptor for a step kind: identity, ancestry and ordering constraints.
///
/// Kinds form a nominal hierarchy through `parent`. A constraint declared on
/// a base kind applies to every derived kind without redeclaration; the
/// scheduler resolves the full chain once per run via [`Kind::run_before_all`]
/// and [`Kind::run_after_all`].
#[derive(Debug, Clone, Copy)]
pub struct Kind {
    id: KindId,
    parent: Option<&'static Kind>,
    run_before: &'static [KindId],
    run_after: &'static [KindId],
}

impl Kind {
    /// Create a root kind with no ancestors and no constraints.
    pub const fn root(id: KindId) -> Self {
        Self { id, parent: None, run_before: &[], run_after: &[] }
    }

    /// Create a kind derived from `parent`. The new kind inherits the
    /// parent's constraints in addition to any it declares itself.
    pub const fn derive(id: KindId, parent: &'static Kind) -> Self {
        Self { id, parent: Some(parent), run_before: &[], run_after: &[] }
    }

    /// Declare that steps of this kind must run before the given kinds.
    pub const fn run_before(mut self, kinds: &'static [KindId]) -> Self {
        self.run_before = kinds;
        self
    }

    /// Declare that steps of this kind must run after the given kinds.
    pub const fn run_after(mut self, kinds: &'static [KindId]) -> Self {
        self.run_after = kinds;
        self
    }

    /// The kind's own id.
    pub fn id(&self) -> KindId {
        self.id
    }

    /// Membership test over the kind hierarchy: true if this kind is `id`
    /// itself or derives from it. This is what makes a constraint targeting
    /// a base kind also bind derived-kind instances.
    pub fn is(&self, id: KindId) -> bool {
        let mut kind = Some(self);
        while let Some(k) = kind {
            if k.id == id {
                return true;
            }
            kind = k.parent.map(|p| p as &Kind);
        }
        false
    }

    /// All run-before declarations along the ancestor chain, most-derived
    /// first. Resolved once per sort, not per membership test.
    pub fn run_before_all(&self) -> Vec<KindId> {
        self.fold_chain(|k| k.run_before)
    }

    /// All run-after declarations along the ancestor chain.
    pub fn run_after_all(&self) -> Vec<KindId> {
        self.fold_chain(|k| k.run_after)
    }

    fn fold_chain(&self, pick: impl Fn(&Kind) -> &'static [KindId]) -> Vec<KindId> {
        let mut out = Vec::new();
        let mut kind = Some(self);
        while let Some(k) = kind {
            out.extend_from_slice(pick(k));
            kind = k.parent.map(|p| p as &Kind);
        }
        out
    }
}

/// Shared state a hook can read and mutate while it runs.
pub struct BuildContext<'a> {
    /// In-memory engine settings mutated by option steps
    pub settings: &'a mut PlayerSettings,
    /// Engine collaborator that performs the actual player build
    pub engine: &'a mut dyn Engine,
    /// Root of the game project being built
    pub project_root: PathBuf,
    /// Emit progress output
    pub verbose: bool,
}

/// Read access to the sibling steps of the one currently running a hook.
///
/// Hooks use this to read state another step computed, e.g. the target
/// platform held by the pipeline step.
pub struct StepLocator<'a> {
    head: &'a [Box<dyn BuildStep>],
    tail: &'a [Box<dyn BuildStep>],
}

impl<'a> StepLocator<'a> {
    pub(crate) fn new(head: &'a [Box<dyn BuildStep>], tail: &'a [Box<dyn BuildStep>]) -> Self {
        Self { head, tail }
    }

    /// Find the first sibling step of concrete type `T`.
    pub fn get<T: Any>(&self) -> Option<&T> {
        self.head
            .iter()
            .chain(self.tail.iter())
            .find_map(|s| s.as_any().downcast_ref::<T>())
    }
}

/// Capability tag for steps that run before the player build.
pub trait RunsPreBuild {
    fn on_pre_build(
        &mut self,
        locator: &StepLocator<'_>,
        ctx: &mut BuildContext<'_>,
    ) -> Result<(), crate::builder::BuildError>;
}

/// Capability tag for steps that run after the player build.
pub trait RunsPostBuild {
    fn on_post_build(
        &mut self,
        locator: &StepLocator<'_>,
        ctx: &mut BuildContext<'_>,
    ) -> Result<(), crate::builder::BuildError>;
}

/// A unit of build work.
///
/// A step may run pre-build, post-build, both, or neither; a step with no
/// hooks can still contribute options. Options are declared through
/// [`BuildStep::options`] and written back through [`BuildStep::apply_option`]
/// with values already converted to the declared parameter types.
pub trait BuildStep {
    /// The step's kind descriptor.
    fn kind(&self) -> &'static Kind;

    /// Option bindings this step exposes.
    fn options(&self) -> Vec<OptionSpec> {
        Vec::new()
    }

    /// Apply a converted option value set. `name` is the primary option name
    /// of the matching spec.
    fn apply_option(&mut self, name: &str, values: &[OptionValue]) -> Result<(), OptionsError> {
        let _ = values;
        Err(OptionsError::UnknownBinding { step: self.kind().id(), binding: name.to_string() })
    }

    /// Current parameter values as `(name, value)` pairs for the build log.
    /// Values of parameters whose name contains `pass` are masked by the
    /// caller before printing.
    fn dump_params(&self) -> Vec<(String, String)> {
        Vec::new()
    }

    fn as_any(&self) -> &dyn Any;

    /// Pre-build capability, if the step has one.
    fn pre_build(&mut self) -> Option<&mut dyn RunsPreBuild> {
        None
    }

    /// Post-build capability, if the step has one.
    fn post_build(&mut self) -> Option<&mut dyn RunsPostBuild> {
        None
    }
}

impl std::fmt::Debug for dyn BuildStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BuildStep").field("kind", &self.kind().id()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    static BASE: Kind = Kind::root("Base").run_before(&["Other"]);
    static DERIVED: Kind = Kind::derive("Derived", &BASE).run_after(&["Third"]);

    #[test]
    fn test_kind_is_self() {
        assert!(BASE.is("Base"));
        assert!(!BASE.is("Derived"));
    }

    #[test]
    fn test_kind_is_ancestor() {
        assert!(DERIVED.is("Derived"));
        assert!(DERIVED.is("Base"));
        assert!(!DERIVED.is("Other"));
    }

    #[test]
    fn test_derived_kind_inherits_constraints() {
        assert_eq!(DERIVED.run_before_all(), vec!["Other"]);
        assert_eq!(DERIVED.run_after_all(), vec!["Third"]);
    }

    #[test]
    fn test_root_kind_has_own_constraints_only() {
        assert_eq!(BASE.run_before_all(), vec!["Other"]);
        assert!(BASE.run_after_all().is_empty());
    }
}
