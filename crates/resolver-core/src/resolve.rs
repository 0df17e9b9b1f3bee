//! The resolution engine: the round loop, pinning, conflict-driven
//! backjump, and the one-shot `Resolution` entry point.

use std::cell::Cell;
use std::collections::{HashMap, HashSet};
use std::hash::Hash;
use std::marker::PhantomData;

use tracing::{debug, trace};

use crate::criterion::{add_requirement, CriteriaMap, Criterion, RequirementInformation};
use crate::error::ResolutionError;
use crate::provider::{Identified, IncompatibilitiesView, PreferenceContext, Provider, RequirementsView};
use crate::reporter::{NoopReporter, Reporter};
use crate::result::{build_result, Result as EngineResult};
use crate::state::State;

/// In-process construction options for a resolve call. No file, env, or
/// wire format attaches to this — it exists only so `max_rounds` does not
/// have to be threaded as a bare positional argument.
#[derive(Debug, Clone, Copy)]
pub struct ResolutionOptions {
    max_rounds: usize,
}

impl ResolutionOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Default 100.
    pub fn max_rounds(mut self, max_rounds: usize) -> Self {
        self.max_rounds = max_rounds;
        self
    }
}

impl Default for ResolutionOptions {
    fn default() -> Self {
        ResolutionOptions { max_rounds: 100 }
    }
}

/// A one-shot stateful resolution: construct with a `Provider` (and
/// optionally a `Reporter`), call `resolve` exactly once.
pub struct Resolution<K, R, C, P, Rep = NoopReporter> {
    provider: P,
    reporter: Rep,
    resolved: Cell<bool>,
    _marker: PhantomData<(K, R, C)>,
}

impl<K, R, C, P> Resolution<K, R, C, P, NoopReporter> {
    pub fn new(provider: P) -> Self {
        Resolution {
            provider,
            reporter: NoopReporter,
            resolved: Cell::new(false),
            _marker: PhantomData,
        }
    }
}

impl<K, R, C, P, Rep> Resolution<K, R, C, P, Rep>
where
    K: Clone + Eq + Hash,
    R: Clone + std::fmt::Debug,
    C: Clone + std::fmt::Debug,
    P: Provider<K, R, C>,
    Rep: Reporter<K, R, C>,
{
    pub fn with_reporter(provider: P, reporter: Rep) -> Self {
        Resolution {
            provider,
            reporter,
            resolved: Cell::new(false),
            _marker: PhantomData,
        }
    }

    /// Resolve `root_requirements` into a consistent pin for every
    /// identifier they transitively touch. Calling this a second time on
    /// the same `Resolution` fails with `AlreadyResolved`.
    #[tracing::instrument(skip_all)]
    pub fn resolve(
        &self,
        root_requirements: impl IntoIterator<Item = R>,
        options: ResolutionOptions,
    ) -> std::result::Result<EngineResult<K, R, C>, ResolutionError<R, C>> {
        if self.resolved.replace(true) {
            return Err(ResolutionError::AlreadyResolved);
        }

        let mut root_state: State<K, R, C> = State::empty();
        for requirement in root_requirements {
            let identifier = self.provider.identify(Identified::Requirement(&requirement));
            if let Err(conflicted) = add_requirement(
                &self.provider,
                &self.reporter,
                &mut root_state.criteria,
                &mut root_state.criteria_order,
                &identifier,
                requirement,
                None,
            ) {
                let causes = conflicted.0.information().cloned().collect();
                return Err(ResolutionError::Impossible { causes });
            }
        }

        let working = root_state.clone();
        let mut stack: Vec<State<K, R, C>> = vec![root_state, working];

        self.reporter.starting();

        for round_index in 0..options.max_rounds {
            self.reporter.starting_round(round_index);

            // Walked in `criteria_order`, not `criteria`'s own hash order,
            // so that tie-breaking in `choose_identifier` is reproducible
            // across calls instead of depending on hash-map iteration.
            let unsatisfied: Vec<K> = {
                let top = stack.last().unwrap();
                top.criteria_order()
                    .iter()
                    .filter(|k| top.criteria.contains_key(*k))
                    .filter(|k| !is_satisfied(top, k, &self.provider))
                    .cloned()
                    .collect()
            };
            let unsatisfied_set: HashSet<K> = unsatisfied.iter().cloned().collect();

            debug!(round_index, unsatisfied = unsatisfied.len(), "round start");

            if unsatisfied.is_empty() {
                let top = stack.last().unwrap();
                self.reporter.ending(top);
                return Ok(build_result(&self.provider, top));
            }

            let satisfied_before: HashSet<K> = {
                let top = stack.last().unwrap();
                top.criteria.keys().filter(|k| !unsatisfied_set.contains(k)).cloned().collect()
            };

            let chosen = self.choose_identifier(stack.last().unwrap(), &unsatisfied);

            let chosen_criterion = stack
                .last()
                .unwrap()
                .criteria
                .get(&chosen)
                .cloned()
                .expect("chosen identifier must have a criterion");

            match pin_identifier(&self.provider, &self.reporter, stack.last().unwrap(), &chosen_criterion) {
                Ok((candidate, updated_criteria, updated_order)) => {
                    trace!("pinned candidate");
                    {
                        let top = stack.last_mut().unwrap();
                        top.criteria = updated_criteria;
                        top.criteria_order = updated_order;
                        top.mapping.shift_remove(&chosen);
                        top.mapping.insert(chosen.clone(), candidate);
                    }

                    let newly_invalidated: HashSet<K> = {
                        let top = stack.last().unwrap();
                        satisfied_before
                            .iter()
                            .filter(|k| !is_satisfied(top, k, &self.provider))
                            .cloned()
                            .collect()
                    };

                    if !newly_invalidated.is_empty() {
                        let provider = &self.provider;
                        let top = stack.last_mut().unwrap();
                        let pruned: CriteriaMap<K, R, C> = top
                            .criteria
                            .iter()
                            .map(|(k, criterion)| {
                                let pruned_criterion = criterion.without_information_from(|parent| {
                                    let parent_id = provider.identify(Identified::Candidate(parent));
                                    newly_invalidated.contains(&parent_id)
                                });
                                (k.clone(), pruned_criterion)
                            })
                            .collect();
                        top.criteria = pruned;
                    }

                    let clone_for_next_round = stack.last().unwrap().clone();
                    stack.push(clone_for_next_round);
                }
                Err(PinOutcome::Inconsistent { candidate, criterion }) => {
                    return Err(ResolutionError::InconsistentCandidate { candidate, criterion });
                }
                Err(PinOutcome::Exhausted(causes)) => {
                    debug!(round_index, "pin exhausted, attempting backjump");
                    let unsatisfied_names: Vec<K> = unsatisfied.iter().cloned().collect();
                    let cause_names: Vec<K> = causes
                        .iter()
                        .map(|info| self.provider.identify(Identified::Requirement(&info.requirement)))
                        .collect();
                    self.reporter.backtracking_on(&cause_names, &unsatisfied_names);
                    self.reporter.resolving_conflicts(&causes);

                    if !attempt_backjump(&self.provider, &mut stack) {
                        return Err(ResolutionError::Impossible { causes });
                    }
                    stack.last_mut().unwrap().backtrack_causes = causes;
                }
            }

            let top = stack.last().unwrap();
            self.reporter.ending_round(round_index, top);
        }

        Err(ResolutionError::TooDeep { max_rounds: options.max_rounds })
    }

    fn choose_identifier(&self, top: &State<K, R, C>, unsatisfied: &[K]) -> K {
        let backtrack_causes = top.backtrack_causes().to_vec();
        let candidates: Vec<&K> = unsatisfied.iter().collect();
        let ctx = PreferenceContext::new(top.mapping(), top.criteria(), &backtrack_causes);
        let narrowed = self.provider.narrow_requirement_selection(candidates, ctx);
        assert!(!narrowed.is_empty(), "narrow_requirement_selection must return a non-empty subset");

        narrowed
            .into_iter()
            .map(|k| {
                let ctx = PreferenceContext::new(top.mapping(), top.criteria(), &backtrack_causes);
                let preference = self.provider.get_preference(k, ctx);
                (k.clone(), preference)
            })
            .min_by(|a, b| a.1.cmp(&b.1))
            .map(|(k, _)| k)
            .expect("unsatisfied is non-empty at this point")
    }
}

fn is_satisfied<K, R, C, P>(state: &State<K, R, C>, identifier: &K, provider: &P) -> bool
where
    K: Eq + Hash,
    R: Clone,
    C: Clone,
    P: Provider<K, R, C>,
{
    match state.mapping().get(identifier) {
        None => false,
        Some(candidate) => match state.criteria().get(identifier) {
            None => true,
            Some(criterion) => criterion.iter_requirement().all(|r| provider.is_satisfied_by(r, candidate)),
        },
    }
}

enum PinOutcome<R, C> {
    Exhausted(Vec<RequirementInformation<R, C>>),
    Inconsistent { candidate: C, criterion: Criterion<R, C> },
}

/// Attempt to pin `identifier` to a candidate from `criterion.candidates`,
/// in preference order.
fn pin_identifier<K, R, C, P, Rep>(
    provider: &P,
    reporter: &Rep,
    state: &State<K, R, C>,
    criterion: &Criterion<R, C>,
) -> std::result::Result<(C, CriteriaMap<K, R, C>, im_rc::Vector<K>), PinOutcome<R, C>>
where
    K: Clone + Eq + Hash,
    R: Clone,
    C: Clone,
    P: Provider<K, R, C>,
    Rep: Reporter<K, R, C>,
{
    let mut causes: Vec<RequirementInformation<R, C>> = Vec::new();

    for candidate in criterion.candidates().iter() {
        let mut updated = state.criteria.clone();
        let mut updated_order = state.criteria_order().clone();
        let dependencies = provider.get_dependencies(&candidate);

        let mut rejected = None;
        for dependency in dependencies {
            let dep_id = provider.identify(Identified::Requirement(&dependency));
            if let Err(conflicted) = add_requirement(
                provider,
                reporter,
                &mut updated,
                &mut updated_order,
                &dep_id,
                dependency,
                Some(candidate.clone()),
            ) {
                rejected = Some(conflicted);
                break;
            }
        }

        if let Some(conflicted) = rejected {
            reporter.rejecting_candidate(&conflicted.0, &candidate);
            causes.extend(conflicted.0.information().cloned());
            continue;
        }

        let inconsistent = criterion
            .information()
            .any(|info| !provider.is_satisfied_by(&info.requirement, &candidate));
        if inconsistent {
            return Err(PinOutcome::Inconsistent {
                candidate,
                criterion: criterion.clone(),
            });
        }

        reporter.pinning(&candidate);
        return Ok((candidate, updated, updated_order));
    }

    Err(PinOutcome::Exhausted(causes))
}

/// Conflict-driven non-chronological retreat. Returns
/// `false` once the stack falls below three states, meaning resolution is
/// impossible.
fn attempt_backjump<K, R, C, P>(provider: &P, stack: &mut Vec<State<K, R, C>>) -> bool
where
    K: Clone + Eq + Hash,
    R: Clone,
    C: Clone,
    P: Provider<K, R, C>,
{
    loop {
        if stack.len() < 3 {
            return false;
        }

        stack.pop(); // Z: the state whose pin attempt just failed.
        let mut y = stack.pop().unwrap();

        let (k, c) = match y.pop_last_pin() {
            Some(pin) => pin,
            None => return false,
        };

        let mut augmented: HashMap<K, Vec<C>> = y
            .criteria
            .iter()
            .map(|(ki, criterion)| (ki.clone(), criterion.incompatibilities().cloned().collect()))
            .collect();
        augmented.entry(k).or_default().push(c);

        let mut new_top = stack.last().unwrap().clone();
        let mut impossible = false;

        for (ki, incompatibilities) in augmented.iter() {
            if incompatibilities.is_empty() || !new_top.criteria.contains_key(ki) {
                continue;
            }

            let requirements_view = RequirementsView::new(&new_top.criteria, None);
            let incompatibilities_view = IncompatibilitiesView::new(&new_top.criteria, Some((ki, incompatibilities.as_slice())));
            let candidates = provider.find_matches(ki, requirements_view, incompatibilities_view);

            if candidates.is_empty() {
                impossible = true;
                break;
            }

            let merged = new_top
                .criteria
                .get(ki)
                .unwrap()
                .with_incompatibilities(incompatibilities.iter().cloned().collect(), candidates);
            new_top.criteria.insert(ki.clone(), merged);
        }

        stack.push(new_top);
        if !impossible {
            return true;
        }
        // The just-pushed state becomes the new Z on the next iteration.
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view::IterableView;

    #[derive(Debug, Clone)]
    struct Pkg {
        name: &'static str,
        version: i32,
        deps: Vec<(&'static str, Vec<i32>)>,
    }

    struct ListProvider {
        universe: Vec<Pkg>,
    }

    impl Provider<&'static str, (&'static str, Vec<i32>), Pkg> for ListProvider {
        type Preference = usize;

        fn identify(&self, item: Identified<'_, (&'static str, Vec<i32>), Pkg>) -> &'static str {
            match item {
                Identified::Requirement((name, _)) => name,
                Identified::Candidate(p) => p.name,
            }
        }

        fn get_preference(
            &self,
            identifier: &&'static str,
            context: PreferenceContext<'_, &'static str, (&'static str, Vec<i32>), Pkg>,
        ) -> usize {
            context.candidates(identifier).count()
        }

        fn find_matches(
            &self,
            identifier: &&'static str,
            requirements: RequirementsView<'_, &'static str, (&'static str, Vec<i32>), Pkg>,
            incompatibilities: IncompatibilitiesView<'_, &'static str, (&'static str, Vec<i32>), Pkg>,
        ) -> IterableView<Pkg> {
            let excluded: Vec<i32> = incompatibilities.incompatibilities_for(identifier).map(|p| p.version).collect();
            let mut matches: Vec<Pkg> = self
                .universe
                .iter()
                .filter(|p| p.name == *identifier)
                .filter(|p| {
                    requirements
                        .requirements_for(identifier)
                        .all(|(_, versions)| versions.contains(&p.version))
                })
                .filter(|p| !excluded.contains(&p.version))
                .cloned()
                .collect();
            matches.sort_unstable_by(|a, b| b.version.cmp(&a.version));
            IterableView::from_candidates(matches)
        }

        fn is_satisfied_by(&self, requirement: &(&'static str, Vec<i32>), candidate: &Pkg) -> bool {
            requirement.1.contains(&candidate.version)
        }

        fn get_dependencies(&self, candidate: &Pkg) -> Vec<(&'static str, Vec<i32>)> {
            candidate.deps.clone()
        }
    }

    fn init_tracing() {
        use std::sync::Once;
        static INIT: Once = Once::new();
        INIT.call_once(|| {
            let _ = tracing_subscriber::fmt::try_init();
        });
    }

    #[test]
    fn resolves_a_linear_chain() {
        init_tracing();
        let provider = ListProvider {
            universe: vec![
                Pkg { name: "a", version: 1, deps: vec![("b", vec![1])] },
                Pkg { name: "b", version: 1, deps: vec![] },
            ],
        };
        let resolution = Resolution::new(provider);
        let result = resolution.resolve(vec![("a", vec![1])], ResolutionOptions::new()).unwrap();
        assert_eq!(result.mapping.get("a").unwrap().version, 1);
        assert_eq!(result.mapping.get("b").unwrap().version, 1);
    }

    #[test]
    fn backtracks_past_a_dead_end() {
        init_tracing();
        // a's newest version needs a b that does not exist; the engine
        // must reject it and retry with a's older version.
        let provider = ListProvider {
            universe: vec![
                Pkg { name: "a", version: 2, deps: vec![("b", vec![2])] },
                Pkg { name: "a", version: 1, deps: vec![("b", vec![1])] },
                Pkg { name: "b", version: 1, deps: vec![] },
            ],
        };
        let resolution = Resolution::new(provider);
        let result = resolution.resolve(vec![("a", vec![1, 2])], ResolutionOptions::new()).unwrap();
        assert_eq!(result.mapping.get("a").unwrap().version, 1);
        assert_eq!(result.mapping.get("b").unwrap().version, 1);
    }

    #[test]
    fn exceeding_max_rounds_is_too_deep() {
        init_tracing();
        let provider = ListProvider {
            universe: vec![Pkg { name: "a", version: 1, deps: vec![] }],
        };
        let resolution = Resolution::new(provider);
        let err = resolution
            .resolve(vec![("a", vec![1])], ResolutionOptions::new().max_rounds(0))
            .unwrap_err();
        assert!(matches!(err, ResolutionError::TooDeep { max_rounds: 0 }));
    }

    #[test]
    fn resolving_twice_is_rejected() {
        init_tracing();
        let provider = ListProvider {
            universe: vec![Pkg { name: "a", version: 1, deps: vec![] }],
        };
        let resolution = Resolution::new(provider);
        resolution.resolve(vec![("a", vec![1])], ResolutionOptions::new()).unwrap();
        let err = resolution.resolve(vec![("a", vec![1])], ResolutionOptions::new()).unwrap_err();
        assert!(matches!(err, ResolutionError::AlreadyResolved));
    }
}
