//! Regression scenarios for the resolution engine: a trivial root, a
//! linear dependency chain, a case that needs to backtrack, an
//! impossible root, a diamond with a shared dependency, and the
//! provider-misbehavior case the engine must refuse to paper over.

use resolver_core::provider::{IncompatibilitiesView, PreferenceContext, Provider, RequirementsView};
use resolver_core::{Identified, IterableView, Resolution, ResolutionError, ResolutionOptions};
use resolver_tests::{dep, pkg, registry, validate, Dep, Pkg, TestProvider};

fn resolve(reg: &resolver_tests::Registry, roots: Vec<Dep>) -> Result<resolver_core::Result<String, Dep, Pkg>, ResolutionError<Dep, Pkg>> {
    let provider = TestProvider { registry: reg };
    let resolution = Resolution::new(provider);
    resolution.resolve(roots, ResolutionOptions::new())
}

#[test]
fn trivial_root_resolves_to_itself() {
    let reg = registry(vec![pkg("a", 1, vec![])]);
    let result = resolve(&reg, vec![dep("a", &[1])]).unwrap();
    assert_eq!(result.mapping.get("a").unwrap().version, 1);
    let provider = TestProvider { registry: &reg };
    validate(&provider, &result).unwrap();
}

#[test]
fn linear_chain_pins_every_link() {
    let reg = registry(vec![
        pkg("a", 1, vec![dep("b", &[1])]),
        pkg("b", 1, vec![dep("c", &[1])]),
        pkg("c", 1, vec![]),
    ]);
    let result = resolve(&reg, vec![dep("a", &[1])]).unwrap();
    assert_eq!(result.mapping.get("a").unwrap().version, 1);
    assert_eq!(result.mapping.get("b").unwrap().version, 1);
    assert_eq!(result.mapping.get("c").unwrap().version, 1);
    let provider = TestProvider { registry: &reg };
    validate(&provider, &result).unwrap();
}

#[test]
fn backtrack_falls_back_to_an_older_candidate() {
    // a's newest version (2) needs b==2, which does not exist; a==1 needs
    // b==1, which does. The engine must reject a==2 and retry with a==1.
    let reg = registry(vec![
        pkg("a", 2, vec![dep("b", &[2])]),
        pkg("a", 1, vec![dep("b", &[1])]),
        pkg("b", 1, vec![]),
    ]);
    let result = resolve(&reg, vec![dep("a", &[1, 2])]).unwrap();
    assert_eq!(result.mapping.get("a").unwrap().version, 1);
    assert_eq!(result.mapping.get("b").unwrap().version, 1);
    let provider = TestProvider { registry: &reg };
    validate(&provider, &result).unwrap();
}

#[test]
fn impossible_root_requirements_report_their_causes() {
    let reg = registry(vec![pkg("a", 1, vec![]), pkg("a", 2, vec![])]);
    let err = resolve(&reg, vec![dep("a", &[1]), dep("a", &[2])]).unwrap_err();
    match err {
        ResolutionError::Impossible { causes } => assert_eq!(causes.len(), 2),
        other => panic!("expected Impossible, got {other:?}"),
    }
}

#[test]
fn diamond_shares_the_common_dependency() {
    let reg = registry(vec![
        pkg("a", 1, vec![dep("b", &[1]), dep("c", &[1])]),
        pkg("b", 1, vec![dep("d", &[1, 2])]),
        pkg("c", 1, vec![dep("d", &[2])]),
        pkg("d", 2, vec![]),
        pkg("d", 1, vec![]),
    ]);
    let result = resolve(&reg, vec![dep("a", &[1])]).unwrap();
    assert_eq!(result.mapping.get("d").unwrap().version, 2);
    let provider = TestProvider { registry: &reg };
    validate(&provider, &result).unwrap();
}

#[test]
fn no_candidates_is_impossible_not_a_panic() {
    let reg = registry(vec![pkg("a", 1, vec![])]);
    let err = resolve(&reg, vec![dep("a", &[99])]).unwrap_err();
    assert!(matches!(err, ResolutionError::Impossible { .. }));
}

/// A provider whose `find_matches` forgets to honor one of the
/// requirements it was handed, so the candidate it hands back fails
/// `is_satisfied_by` against its own generating requirement. The engine
/// must surface this as a fatal `InconsistentCandidate`, not loop or
/// silently accept a broken pin.
struct LyingProvider<'a> {
    registry: &'a resolver_tests::Registry,
}

impl<'a> Provider<String, Dep, Pkg> for LyingProvider<'a> {
    type Preference = usize;

    fn identify(&self, item: Identified<'_, Dep, Pkg>) -> String {
        match item {
            Identified::Requirement(d) => d.name.clone(),
            Identified::Candidate(p) => p.name.clone(),
        }
    }

    fn get_preference(&self, _identifier: &String, _context: PreferenceContext<'_, String, Dep, Pkg>) -> usize {
        0
    }

    fn find_matches(
        &self,
        identifier: &String,
        _requirements: RequirementsView<'_, String, Dep, Pkg>,
        _incompatibilities: IncompatibilitiesView<'_, String, Dep, Pkg>,
    ) -> IterableView<Pkg> {
        // Ignores `_requirements` entirely, unlike a well-behaved provider.
        IterableView::from_candidates(
            self.registry
                .packages()
                .iter()
                .filter(|p| &p.name == identifier)
                .cloned(),
        )
    }

    fn is_satisfied_by(&self, requirement: &Dep, candidate: &Pkg) -> bool {
        requirement.allowed.contains(&candidate.version)
    }

    fn get_dependencies(&self, candidate: &Pkg) -> Vec<Dep> {
        candidate.deps.clone()
    }
}

#[test]
fn provider_returning_an_unsatisfying_candidate_is_fatal() {
    let reg = registry(vec![pkg("a", 1, vec![])]);
    let provider = LyingProvider { registry: &reg };
    let resolution = Resolution::new(provider);
    let err = resolution.resolve(vec![dep("a", &[99])], ResolutionOptions::new()).unwrap_err();
    assert!(matches!(err, ResolutionError::InconsistentCandidate { .. }));
}

#[test]
fn resolving_twice_is_rejected() {
    let reg = registry(vec![pkg("a", 1, vec![])]);
    let provider = TestProvider { registry: &reg };
    let resolution = Resolution::new(provider);
    resolution.resolve(vec![dep("a", &[1])], ResolutionOptions::new()).unwrap();
    let err = resolution.resolve(vec![dep("a", &[1])], ResolutionOptions::new()).unwrap_err();
    assert!(matches!(err, ResolutionError::AlreadyResolved));
}
