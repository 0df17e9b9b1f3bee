//! The Reporter contract: side-effect-only notification hooks the engine
//! calls at fixed points. None are mandatory; any panic raised from
//! inside one propagates unchanged — the engine does not catch it.

use crate::criterion::{Criterion, RequirementInformation};
use crate::state::State;

pub trait Reporter<K, R, C> {
    /// Called once before resolution starts.
    fn starting(&self) {}

    /// Called before each round starts. `index` is zero-based.
    fn starting_round(&self, _index: usize) {}

    /// Called after a round completes without finishing resolution.
    fn ending_round(&self, _index: usize, _state: &State<K, R, C>) {}

    /// Called once resolution has succeeded, before `resolve` returns.
    fn ending(&self, _state: &State<K, R, C>) {}

    /// Called whenever a requirement is merged into the criteria map,
    /// whether it is a root requirement (`parent: None`) or contributed by
    /// a pinned candidate.
    fn adding_requirement(&self, _requirement: &R, _parent: Option<&C>) {}

    /// Unsatisfied identifiers found at the moment a backjump is about to
    /// start. Supplements `resolving_conflicts` with which identifiers
    /// triggered the retreat; inert unless overridden.
    fn backtracking_on(&self, _names: &[K], _unsatisfied_names: &[K]) {}

    /// Called when a pin has exhausted its candidates and the engine is
    /// about to attempt a backjump.
    fn resolving_conflicts(&self, _causes: &[RequirementInformation<R, C>]) {}

    /// Called for each candidate rejected while attempting to pin an
    /// identifier, because one of its dependencies conflicted.
    fn rejecting_candidate(&self, _criterion: &Criterion<R, C>, _candidate: &C) {}

    /// Called immediately before a candidate is committed as the pin for
    /// its identifier.
    fn pinning(&self, _candidate: &C) {}
}

/// A reporter that does nothing. The default for callers with no
/// observability needs.
pub struct NoopReporter;

impl<K, R, C> Reporter<K, R, C> for NoopReporter {}
