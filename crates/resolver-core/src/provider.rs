//! The Provider contract: everything the engine consumes but never
//! inspects the internals of. Identifiers, requirements, and candidates
//! are opaque to the engine; all meaning is delegated here.

use std::hash::Hash;

use indexmap::IndexMap;

use crate::criterion::{CriteriaMap, RequirementInformation};
use crate::view::IterableView;

/// Disambiguates the two things `Provider::identify` can be asked about,
/// since a requirement and a candidate are unrelated opaque types.
pub enum Identified<'a, R, C> {
    Requirement(&'a R),
    Candidate(&'a C),
}

/// A view over the requirements contributing to each identifier, as seen
/// by `find_matches`. Collates each identifier's committed criterion
/// information with at most one tentative, not-yet-committed entry, so a
/// provider sees the hypothetical future criterion even though no
/// `Criterion` has yet been constructed for it.
pub struct RequirementsView<'a, K, R, C> {
    criteria: &'a CriteriaMap<K, R, C>,
    pending: Option<(&'a K, &'a R)>,
}

impl<'a, K, R, C> RequirementsView<'a, K, R, C>
where
    K: Eq + Hash,
{
    pub(crate) fn new(criteria: &'a CriteriaMap<K, R, C>, pending: Option<(&'a K, &'a R)>) -> Self {
        RequirementsView { criteria, pending }
    }

    /// Every requirement currently contributing to `identifier`, in
    /// insertion order, including the pending one if it applies here.
    pub fn requirements_for(&self, identifier: &K) -> Box<dyn Iterator<Item = &'a R> + 'a> {
        let base = self
            .criteria
            .get(identifier)
            .into_iter()
            .flat_map(|c| c.iter_requirement());
        match self.pending {
            Some((k, r)) if k == identifier => Box::new(base.chain(std::iter::once(r))),
            _ => Box::new(base),
        }
    }

    pub fn identifiers(&self) -> impl Iterator<Item = &'a K> + '_ {
        let pending_key = self.pending.map(|(k, _)| k);
        self.criteria.keys().chain(pending_key).collect::<std::collections::HashSet<_>>().into_iter()
    }
}

/// A view over the candidates already ruled out for each identifier, with
/// an optional full override for exactly one identifier — used during
/// backjump to probe a hypothetical, not-yet-committed incompatibility set
/// before merging it into the real criterion.
pub struct IncompatibilitiesView<'a, K, R, C> {
    criteria: &'a CriteriaMap<K, R, C>,
    override_for: Option<(&'a K, &'a [C])>,
}

impl<'a, K, R, C> IncompatibilitiesView<'a, K, R, C>
where
    K: Eq + Hash,
{
    pub(crate) fn new(criteria: &'a CriteriaMap<K, R, C>, override_for: Option<(&'a K, &'a [C])>) -> Self {
        IncompatibilitiesView { criteria, override_for }
    }

    pub fn incompatibilities_for(&self, identifier: &K) -> Box<dyn Iterator<Item = &'a C> + 'a> {
        if let Some((k, extra)) = self.override_for {
            if k == identifier {
                return Box::new(extra.iter());
            }
        }
        Box::new(
            self.criteria
                .get(identifier)
                .into_iter()
                .flat_map(|c| c.incompatibilities()),
        )
    }
}

/// Bundles the current `resolutions`, per-identifier `candidates`/
/// `information`, and `backtrack_causes` passed to `get_preference` and
/// `narrow_requirement_selection`.
pub struct PreferenceContext<'a, K, R, C> {
    resolutions: &'a IndexMap<K, C>,
    criteria: &'a CriteriaMap<K, R, C>,
    backtrack_causes: &'a [RequirementInformation<R, C>],
}

impl<'a, K, R, C> PreferenceContext<'a, K, R, C>
where
    K: Eq + Hash,
{
    pub(crate) fn new(
        resolutions: &'a IndexMap<K, C>,
        criteria: &'a CriteriaMap<K, R, C>,
        backtrack_causes: &'a [RequirementInformation<R, C>],
    ) -> Self {
        PreferenceContext {
            resolutions,
            criteria,
            backtrack_causes,
        }
    }

    pub fn resolutions(&self) -> &'a IndexMap<K, C> {
        self.resolutions
    }

    pub fn information(&self, identifier: &K) -> impl Iterator<Item = &'a RequirementInformation<R, C>> + '_
    where
        R: Clone,
        C: Clone,
    {
        self.criteria.get(identifier).into_iter().flat_map(|c| c.information())
    }

    pub fn candidates(&self, identifier: &K) -> Box<dyn Iterator<Item = C> + '_>
    where
        R: Clone,
        C: Clone,
    {
        match self.criteria.get(identifier) {
            Some(c) => c.candidates().iter(),
            None => Box::new(std::iter::empty()),
        }
    }

    pub fn backtrack_causes(&self) -> &'a [RequirementInformation<R, C>] {
        self.backtrack_causes
    }
}

/// Delegate trait supplying all domain knowledge the engine itself does
/// not have: what an identifier is, how candidates are ranked and found,
/// and what a candidate depends on.
///
/// The engine treats the provider as pure and deterministic for the
/// duration of a single `resolve` call.
pub trait Provider<K, R, C> {
    /// Total order used to rank unsatisfied identifiers; lower sorts
    /// first (more preferred).
    type Preference: Ord;

    /// A stable identifier for a requirement or candidate. Two values
    /// that should merge or match must identify to the same `K`.
    fn identify(&self, item: Identified<'_, R, C>) -> K;

    /// Sort key for picking which unsatisfied identifier to work on next.
    /// Called once per unsatisfied identifier per round unless narrowed
    /// by [`Provider::narrow_requirement_selection`].
    fn get_preference(&self, identifier: &K, context: PreferenceContext<'_, K, R, C>) -> Self::Preference;

    /// Viable candidates for `identifier`, already filtered against both
    /// the union of `requirements` and the set of `incompatibilities`.
    /// Candidate order defines preference (most preferred first).
    fn find_matches(
        &self,
        identifier: &K,
        requirements: RequirementsView<'_, K, R, C>,
        incompatibilities: IncompatibilitiesView<'_, K, R, C>,
    ) -> IterableView<C>;

    /// Final check between a single requirement and a same-identifier
    /// candidate.
    fn is_satisfied_by(&self, requirement: &R, candidate: &C) -> bool;

    /// Requirements a pinned candidate introduces.
    fn get_dependencies(&self, candidate: &C) -> Vec<R>;

    /// Optionally narrow which unsatisfied identifiers get a
    /// `get_preference` call this round. Must return a non-empty subset
    /// of `identifiers`. Default: identity (no narrowing).
    fn narrow_requirement_selection<'a>(
        &self,
        identifiers: Vec<&'a K>,
        _context: PreferenceContext<'_, K, R, C>,
    ) -> Vec<&'a K> {
        identifiers
    }
}
