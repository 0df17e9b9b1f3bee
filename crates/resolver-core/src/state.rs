//! A point-in-time snapshot of the resolution search: pinned candidates,
//! per-identifier criteria, and the requirements blamed for the most
//! recent backjump. States are stacked; mutation happens on the top of
//! the stack.

use std::hash::Hash;

use indexmap::IndexMap;

use crate::criterion::{CriteriaMap, RequirementInformation};

/// `mapping` is insertion-ordered: the most recently pinned identifier is
/// last, which is exactly what backjump needs to find and undo its most
/// recent pin.
///
/// `criteria_order` records the order in which identifiers first entered
/// `criteria`, independent of `criteria`'s own hash order, so that picking
/// among several unsatisfied identifiers with a tied preference is
/// reproducible across calls instead of depending on hash-map iteration.
#[derive(Clone)]
pub struct State<K, R, C> {
    pub(crate) mapping: IndexMap<K, C>,
    pub(crate) criteria: CriteriaMap<K, R, C>,
    pub(crate) criteria_order: im_rc::Vector<K>,
    pub(crate) backtrack_causes: Vec<RequirementInformation<R, C>>,
}

impl<K: Clone + Eq + Hash, R: Clone, C: Clone> State<K, R, C> {
    pub(crate) fn empty() -> Self {
        State {
            mapping: IndexMap::new(),
            criteria: CriteriaMap::new(),
            criteria_order: im_rc::Vector::new(),
            backtrack_causes: Vec::new(),
        }
    }

    pub fn mapping(&self) -> &IndexMap<K, C> {
        &self.mapping
    }

    pub fn criteria(&self) -> &CriteriaMap<K, R, C> {
        &self.criteria
    }

    /// Identifiers in the order they first entered `criteria`.
    pub(crate) fn criteria_order(&self) -> &im_rc::Vector<K> {
        &self.criteria_order
    }

    pub fn backtrack_causes(&self) -> &[RequirementInformation<R, C>] {
        &self.backtrack_causes
    }

    /// Pop the most recently pinned `(identifier, candidate)` pair. `None`
    /// if nothing is pinned yet.
    pub(crate) fn pop_last_pin(&mut self) -> Option<(K, C)> {
        self.mapping.pop()
    }
}
