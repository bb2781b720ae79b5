//! Step ordering engine.
//!
//! Turns the declarative before/after constraints carried by step kinds into
//! a deterministic execution order using Kahn's algorithm over a kind-level
//! edge list, instantiated against the concrete step instances of a run.
//! Constraints are between kinds, not instances: an edge targeting a base
//! kind also blocks every derived-kind instance.

use std::collections::VecDeque;

use thiserror::Error;

use crate::step::{BuildStep, KindId};

/// The declared constraints admit no valid total order.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("circular ordering constraint involving step '{kind}'")]
pub struct CycleError {
    /// One kind participating in a remaining cycle
    pub kind: KindId,
}

/// Sort steps so every declared `(before, after)` constraint is respected.
///
/// Constraint edges are gathered from each instance's kind chain, so rules
/// declared on an ancestor kind apply to derived kinds without redeclaration.
/// If a step of `final_kind` is present, every other instance is forced
/// before it. Among instances with no relative constraint the original input
/// order is preserved.
pub fn sort_steps(
    steps: Vec<Box<dyn BuildStep>>,
    final_kind: Option<KindId>,
) -> Result<Vec<Box<dyn BuildStep>>, CycleError> {
    let mut edges = collect_edges(&steps, final_kind);

    let blocked = |step: &dyn BuildStep, edges: &[(KindId, KindId)]| {
        edges.iter().any(|&(_, after)| step.kind().is(after))
    };

    let mut queued = vec![false; steps.len()];
    let mut queue = VecDeque::new();
    for (i, step) in steps.iter().enumerate() {
        if !blocked(step.as_ref(), &edges) {
            queued[i] = true;
            queue.push_back(i);
        }
    }

    let mut order = Vec::with_capacity(steps.len());
    while let Some(i) = queue.pop_front() {
        order.push(i);

        let kind = steps[i].kind();
        edges.retain(|&(before, _)| !kind.is(before));

        // Newly unblocked instances enter the queue in input order.
        for (j, step) in steps.iter().enumerate() {
            if !queued[j] && !blocked(step.as_ref(), &edges) {
                queued[j] = true;
                queue.push_back(j);
            }
        }
    }

    if order.len() != steps.len() {
        // Every unplaced instance is blocked by a remaining edge; name the
        // source kind of one of them rather than dropping steps silently.
        let kind = edges.first().map(|&(before, _)| before).unwrap_or("");
        return Err(CycleError { kind });
    }

    let mut slots: Vec<Option<Box<dyn BuildStep>>> = steps.into_iter().map(Some).collect();
    Ok(order.iter().filter_map(|&i| slots[i].take()).collect())
}

/// Normalize every run-before/run-after declaration reachable from the
/// instance set into `(before, after)` edges, plus the synthesized edges
/// forcing everything before the final kind when one is present.
fn collect_edges(steps: &[Box<dyn BuildStep>], final_kind: Option<KindId>) -> Vec<(KindId, KindId)> {
    let final_present = final_kind
        .map(|f| steps.iter().any(|s| s.kind().id() == f))
        .unwrap_or(false);

    let mut edges = Vec::new();
    for step in steps {
        let kind = step.kind();
        for before in kind.run_before_all() {
            edges.push((kind.id(), before));
        }
        for after in kind.run_after_all() {
            edges.push((after, kind.id()));
        }

        if final_present {
            if let Some(f) = final_kind {
                if kind.id() != f {
                    edges.push((kind.id(), f));
                }
            }
        }
    }

    // An edge whose source kind has no instance could never be retired and
    // would deadlock the sort; constraints naming absent kinds are vacuous.
    edges.retain(|&(before, after)| {
        steps.iter().any(|s| s.kind().is(before)) && steps.iter().any(|s| s.kind().is(after))
    });

    edges
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::step::Kind;
    use std::any::Any;

    macro_rules! test_step {
        ($name:ident, $kind:expr) => {
            struct $name;

            impl $name {
                const KIND: Kind = $kind;
            }

            impl BuildStep for $name {
                fn kind(&self) -> &'static Kind {
                    &Self::KIND
                }

                fn as_any(&self) -> &dyn Any {
                    self
                }
            }
        };
    }

    test_step!(Plain, Kind::root("Plain"));
    test_step!(Second, Kind::root("Second"));
    test_step!(Early, Kind::root("Early").run_before(&["Plain"]));
    test_step!(Late, Kind::root("Late").run_after(&["Plain"]));
    test_step!(Final, Kind::root("Final"));

    static BASE: Kind = Kind::root("Base").run_after(&["Plain"]);
    test_step!(Derived, Kind::derive("Derived", &BASE));
    test_step!(BlocksBase, Kind::root("BlocksBase").run_before(&["Base"]));

    test_step!(CycleA, Kind::root("CycleA").run_before(&["CycleB"]));
    test_step!(CycleB, Kind::root("CycleB").run_before(&["CycleA"]));

    fn ids(steps: &[Box<dyn BuildStep>]) -> Vec<KindId> {
        steps.iter().map(|s| s.kind().id()).collect()
    }

    #[test]
    fn test_unconstrained_steps_keep_input_order() {
        let sorted = sort_steps(vec![Box::new(Second), Box::new(Plain)], None).unwrap();
        assert_eq!(ids(&sorted), vec!["Second", "Plain"]);
    }

    #[test]
    fn test_run_before_is_respected() {
        let sorted = sort_steps(vec![Box::new(Plain), Box::new(Early)], None).unwrap();
        assert_eq!(ids(&sorted), vec!["Early", "Plain"]);
    }

    #[test]
    fn test_run_after_is_respected() {
        let sorted = sort_steps(vec![Box::new(Late), Box::new(Plain)], None).unwrap();
        assert_eq!(ids(&sorted), vec!["Plain", "Late"]);
    }

    #[test]
    fn test_derived_kind_inherits_run_after() {
        // Derived declares nothing itself but inherits Base's run-after rule.
        let sorted = sort_steps(vec![Box::new(Derived), Box::new(Plain)], None).unwrap();
        assert_eq!(ids(&sorted), vec!["Plain", "Derived"]);
    }

    #[test]
    fn test_edge_targeting_base_kind_blocks_derived_instance() {
        let sorted =
            sort_steps(vec![Box::new(Derived), Box::new(Plain), Box::new(BlocksBase)], None)
                .unwrap();
        let order = ids(&sorted);
        let blocks = order.iter().position(|&id| id == "BlocksBase").unwrap();
        let derived = order.iter().position(|&id| id == "Derived").unwrap();
        assert!(blocks < derived);
    }

    #[test]
    fn test_final_kind_runs_last() {
        let sorted = sort_steps(
            vec![Box::new(Final), Box::new(Plain), Box::new(Second)],
            Some("Final"),
        )
        .unwrap();
        assert_eq!(ids(&sorted), vec!["Plain", "Second", "Final"]);
    }

    #[test]
    fn test_absent_final_kind_synthesizes_nothing() {
        let sorted = sort_steps(vec![Box::new(Second), Box::new(Plain)], Some("Final")).unwrap();
        assert_eq!(ids(&sorted), vec!["Second", "Plain"]);
    }

    #[test]
    fn test_cycle_fails_instead_of_dropping_steps() {
        let err = sort_steps(vec![Box::new(CycleA), Box::new(CycleB)], None).unwrap_err();
        assert!(err.kind == "CycleA" || err.kind == "CycleB");
    }

    #[test]
    fn test_transitive_cycle_through_final_kind() {
        // Final must run last, but Late insists on running after it.
        test_step!(AfterFinal, Kind::root("AfterFinal").run_after(&["Final"]));
        let err =
            sort_steps(vec![Box::new(AfterFinal), Box::new(Final)], Some("Final")).unwrap_err();
        assert!(!err.kind.is_empty());
    }

    #[test]
    fn test_same_kind_instances_keep_input_order() {
        let sorted = sort_steps(
            vec![Box::new(Late), Box::new(Late), Box::new(Plain)],
            None,
        )
        .unwrap();
        assert_eq!(ids(&sorted), vec!["Plain", "Late", "Late"]);
    }

    #[test]
    fn test_constraint_on_absent_kind_is_vacuous() {
        let sorted = sort_steps(vec![Box::new(Early)], None).unwrap();
        assert_eq!(ids(&sorted), vec!["Early"]);
    }

    #[test]
    fn test_run_after_absent_kind_does_not_deadlock() {
        let sorted = sort_steps(vec![Box::new(Late), Box::new(Second)], None).unwrap();
        assert_eq!(ids(&sorted), vec!["Late", "Second"]);
    }
}
