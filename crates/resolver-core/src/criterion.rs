//! Per-identifier bookkeeping: which requirements contributed to an
//! identifier, which candidates have already been ruled out for it, and
//! the currently viable candidate view.

use std::hash::Hash;

use crate::provider::{IncompatibilitiesView, Provider, RequirementsView};
use crate::reporter::Reporter;
use crate::view::IterableView;

/// A requirement together with the candidate that introduced it, or
/// `None` if it is one of the root requirements passed to `resolve`.
#[derive(Clone)]
pub struct RequirementInformation<R, C> {
    pub requirement: R,
    pub parent: Option<C>,
}

impl<R: std::fmt::Debug, C: std::fmt::Debug> std::fmt::Debug for RequirementInformation<R, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequirementInformation")
            .field("requirement", &self.requirement)
            .field("parent", &self.parent)
            .finish()
    }
}

impl<R, C> RequirementInformation<R, C> {
    pub fn new(requirement: R, parent: Option<C>) -> Self {
        RequirementInformation { requirement, parent }
    }
}

/// The per-identifier aggregate: every contributing requirement (in
/// insertion order), every candidate already proven unusable, and the
/// view of candidates still viable given both.
///
/// For a criterion held inside a live `State`, `candidates` is guaranteed
/// non-empty. The only exception is a criterion carried inside the
/// internal conflict error raised by [`add_requirement`], whose
/// `candidates` is deliberately empty.
#[derive(Clone)]
pub struct Criterion<R, C> {
    information: im_rc::Vector<RequirementInformation<R, C>>,
    incompatibilities: im_rc::Vector<C>,
    candidates: IterableView<C>,
}

impl<R: std::fmt::Debug, C: std::fmt::Debug> std::fmt::Debug for Criterion<R, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Criterion")
            .field("information", &self.information)
            .field("incompatibilities", &self.incompatibilities)
            .field("candidates", &"<iterable view>")
            .finish()
    }
}

impl<R: Clone, C: Clone> Criterion<R, C> {
    pub fn information(&self) -> impl Iterator<Item = &RequirementInformation<R, C>> {
        self.information.iter()
    }

    pub fn iter_requirement(&self) -> impl Iterator<Item = &R> {
        self.information.iter().map(|info| &info.requirement)
    }

    pub fn iter_parent(&self) -> impl Iterator<Item = Option<&C>> {
        self.information.iter().map(|info| info.parent.as_ref())
    }

    pub fn incompatibilities(&self) -> impl Iterator<Item = &C> {
        self.incompatibilities.iter()
    }

    pub fn candidates(&self) -> &IterableView<C> {
        &self.candidates
    }

    /// Build a new criterion with the same `information` but a replaced
    /// incompatibility set and candidate view — used when backjump learns
    /// a new incompatibility for an identifier it does not otherwise
    /// touch.
    pub(crate) fn with_incompatibilities(
        &self,
        incompatibilities: im_rc::Vector<C>,
        candidates: IterableView<C>,
    ) -> Self {
        Criterion {
            information: self.information.clone(),
            incompatibilities,
            candidates,
        }
    }

    /// Drop every `information` entry whose parent is pinned but was
    /// invalidated this round, keeping root requirements (`parent: None`)
    /// untouched.
    pub(crate) fn without_information_from<F>(&self, mut is_invalidated: F) -> Self
    where
        F: FnMut(&C) -> bool,
    {
        let information = self
            .information
            .iter()
            .filter(|info| match &info.parent {
                None => true,
                Some(p) => !is_invalidated(p),
            })
            .cloned()
            .collect();
        Criterion {
            information,
            incompatibilities: self.incompatibilities.clone(),
            candidates: self.candidates.clone(),
        }
    }
}

/// `K -> Criterion` for every identifier currently under consideration.
/// A persistent hash map so that cloning a `State` between rounds stays
/// cheap even as the criteria set grows.
pub type CriteriaMap<K, R, C> = im_rc::HashMap<K, Criterion<R, C>>;

/// Raised internally when merging a requirement into a criterion leaves
/// no viable candidates. Never escapes the crate: it is either converted
/// into a candidate rejection during pinning, or into
/// [`crate::error::ResolutionError::Impossible`] when seeding the root
/// requirements.
pub(crate) struct RequirementsConflicted<R, C>(pub(crate) Criterion<R, C>);

/// Add `requirement` (contributed by `parent`, or `None` for a root
/// requirement) under `identifier` into `criteria`. `order` records the
/// order identifiers first enter `criteria`, independent of `criteria`'s
/// own hash order, so callers can iterate unsatisfied identifiers
/// deterministically.
pub(crate) fn add_requirement<K, R, C, P, Rep>(
    provider: &P,
    reporter: &Rep,
    criteria: &mut CriteriaMap<K, R, C>,
    order: &mut im_rc::Vector<K>,
    identifier: &K,
    requirement: R,
    parent: Option<C>,
) -> Result<(), RequirementsConflicted<R, C>>
where
    K: Clone + Eq + Hash,
    R: Clone,
    C: Clone,
    P: Provider<K, R, C>,
    Rep: Reporter<K, R, C>,
{
    reporter.adding_requirement(&requirement, parent.as_ref());

    let is_new = !criteria.contains_key(identifier);

    let mut information = criteria
        .get(identifier)
        .map(|c| c.information.clone())
        .unwrap_or_default();
    information.push_back(RequirementInformation::new(requirement.clone(), parent.clone()));

    let incompatibilities = criteria
        .get(identifier)
        .map(|c| c.incompatibilities.clone())
        .unwrap_or_default();

    let requirements_view = RequirementsView::new(criteria, Some((identifier, &requirement)));
    let incompatibilities_view = IncompatibilitiesView::new(criteria, None);
    let candidates = provider.find_matches(identifier, requirements_view, incompatibilities_view);

    if candidates.is_empty() {
        return Err(RequirementsConflicted(Criterion {
            information,
            incompatibilities,
            candidates,
        }));
    }

    criteria.insert(
        identifier.clone(),
        Criterion {
            information,
            incompatibilities,
            candidates,
        },
    );
    if is_new {
        order.push_back(identifier.clone());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reporter::NoopReporter;

    /// A minimal provider: identifiers and requirements are both `&str`
    /// names, candidates are `i32` versions, and a requirement matches any
    /// candidate whose value is in its fixed allow-list.
    struct ListProvider;

    impl Provider<&'static str, (&'static str, Vec<i32>), i32> for ListProvider {
        type Preference = i32;

        fn identify(&self, item: crate::provider::Identified<'_, (&'static str, Vec<i32>), i32>) -> &'static str {
            match item {
                crate::provider::Identified::Requirement((name, _)) => name,
                crate::provider::Identified::Candidate(_) => "n/a",
            }
        }

        fn get_preference(
            &self,
            _identifier: &&'static str,
            _ctx: crate::provider::PreferenceContext<'_, &'static str, (&'static str, Vec<i32>), i32>,
        ) -> i32 {
            0
        }

        fn find_matches(
            &self,
            identifier: &&'static str,
            requirements: RequirementsView<'_, &'static str, (&'static str, Vec<i32>), i32>,
            incompatibilities: IncompatibilitiesView<'_, &'static str, (&'static str, Vec<i32>), i32>,
        ) -> IterableView<i32> {
            let allowed: Vec<i32> = requirements
                .requirements_for(identifier)
                .map(|(_, versions)| versions.clone())
                .fold(None, |acc: Option<Vec<i32>>, versions| match acc {
                    None => Some(versions),
                    Some(acc) => Some(acc.into_iter().filter(|v| versions.contains(v)).collect()),
                })
                .unwrap_or_default();
            let excluded: Vec<i32> = incompatibilities.incompatibilities_for(identifier).cloned().collect();
            let mut remaining: Vec<i32> = allowed.into_iter().filter(|v| !excluded.contains(v)).collect();
            remaining.sort_unstable_by(|a, b| b.cmp(a));
            IterableView::from_candidates(remaining)
        }

        fn is_satisfied_by(&self, requirement: &(&'static str, Vec<i32>), candidate: &i32) -> bool {
            requirement.1.contains(candidate)
        }

        fn get_dependencies(&self, _candidate: &i32) -> Vec<(&'static str, Vec<i32>)> {
            Vec::new()
        }
    }

    #[test]
    fn first_requirement_seeds_the_criterion() {
        let provider = ListProvider;
        let reporter = NoopReporter;
        let mut criteria = CriteriaMap::new();
        let mut order = im_rc::Vector::new();
        add_requirement(&provider, &reporter, &mut criteria, &mut order, &"a", ("a", vec![1, 2, 3]), None).unwrap();
        let criterion = criteria.get("a").unwrap();
        assert_eq!(criterion.candidates().iter().collect::<Vec<_>>(), vec![3, 2, 1]);
        assert_eq!(criterion.information().count(), 1);
        assert_eq!(order.iter().collect::<Vec<_>>(), vec![&"a"]);
    }

    #[test]
    fn second_requirement_narrows_candidates() {
        let provider = ListProvider;
        let reporter = NoopReporter;
        let mut criteria = CriteriaMap::new();
        let mut order = im_rc::Vector::new();
        add_requirement(&provider, &reporter, &mut criteria, &mut order, &"a", ("a", vec![1, 2, 3]), None).unwrap();
        add_requirement(&provider, &reporter, &mut criteria, &mut order, &"a", ("a", vec![2, 3]), None).unwrap();
        let criterion = criteria.get("a").unwrap();
        assert_eq!(criterion.candidates().iter().collect::<Vec<_>>(), vec![3, 2]);
        assert_eq!(criterion.information().count(), 2);
        // Re-adding to an already-seen identifier does not duplicate its
        // entry in the order list.
        assert_eq!(order.iter().collect::<Vec<_>>(), vec![&"a"]);
    }

    #[test]
    fn conflicting_requirement_raises_and_leaves_map_untouched() {
        let provider = ListProvider;
        let reporter = NoopReporter;
        let mut criteria = CriteriaMap::new();
        let mut order = im_rc::Vector::new();
        add_requirement(&provider, &reporter, &mut criteria, &mut order, &"a", ("a", vec![1]), None).unwrap();
        let err = add_requirement(&provider, &reporter, &mut criteria, &mut order, &"a", ("a", vec![2]), None);
        assert!(err.is_err());
        // The map at `a` must still reflect only the first requirement.
        assert_eq!(criteria.get("a").unwrap().information().count(), 1);
    }
}
