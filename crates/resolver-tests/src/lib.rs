//! Shared fixtures for exercising `resolver_core` against a small,
//! in-memory package registry: a name-and-integer-version toy domain
//! that is expressive enough to build every scenario `resolve.rs`'s
//! tests need (linear chains, diamonds, conflicts) without pulling in a
//! real package format.

use std::collections::HashMap;

use resolver_core::provider::{IncompatibilitiesView, PreferenceContext, Provider, RequirementsView};
use resolver_core::{Identified, IterableView, Result as EngineResult};

/// A requirement: an allow-list of versions for a named package. Two
/// requirements for the same package narrow by intersection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dep {
    pub name: String,
    pub allowed: Vec<u32>,
}

pub fn dep(name: &str, allowed: &[u32]) -> Dep {
    Dep {
        name: name.to_string(),
        allowed: allowed.to_vec(),
    }
}

/// A candidate: one published version of a package, with the
/// dependencies it would introduce if pinned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pkg {
    pub name: String,
    pub version: u32,
    pub deps: Vec<Dep>,
}

pub fn pkg(name: &str, version: u32, deps: Vec<Dep>) -> Pkg {
    Pkg {
        name: name.to_string(),
        version,
        deps,
    }
}

/// The full set of published versions across every package under test.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    packages: Vec<Pkg>,
}

impl Registry {
    pub fn new(packages: Vec<Pkg>) -> Self {
        Registry { packages }
    }

    fn versions_of(&self, name: &str) -> impl Iterator<Item = &Pkg> {
        self.packages.iter().filter(move |p| p.name == name)
    }

    pub fn packages(&self) -> &[Pkg] {
        &self.packages
    }
}

pub fn registry(packages: Vec<Pkg>) -> Registry {
    Registry::new(packages)
}

/// The `Provider` under test: names are identifiers, `Dep` is the
/// requirement type, `Pkg` is the candidate type. Preference is "fewest
/// remaining candidates first" (most-constrained-variable first), a
/// standard backtracking heuristic.
pub struct TestProvider<'a> {
    pub registry: &'a Registry,
}

impl<'a> Provider<String, Dep, Pkg> for TestProvider<'a> {
    type Preference = usize;

    fn identify(&self, item: Identified<'_, Dep, Pkg>) -> String {
        match item {
            Identified::Requirement(d) => d.name.clone(),
            Identified::Candidate(p) => p.name.clone(),
        }
    }

    fn get_preference(&self, identifier: &String, context: PreferenceContext<'_, String, Dep, Pkg>) -> usize {
        context.candidates(identifier).count()
    }

    fn find_matches(
        &self,
        identifier: &String,
        requirements: RequirementsView<'_, String, Dep, Pkg>,
        incompatibilities: IncompatibilitiesView<'_, String, Dep, Pkg>,
    ) -> IterableView<Pkg> {
        let excluded: Vec<Pkg> = incompatibilities.incompatibilities_for(identifier).cloned().collect();
        let mut matches: Vec<Pkg> = self
            .versions_of(identifier)
            .filter(|candidate| {
                requirements
                    .requirements_for(identifier)
                    .all(|requirement| requirement.allowed.contains(&candidate.version))
            })
            .filter(|candidate| !excluded.contains(candidate))
            .cloned()
            .collect();
        matches.sort_unstable_by(|a, b| b.version.cmp(&a.version));
        IterableView::from_candidates(matches)
    }

    fn is_satisfied_by(&self, requirement: &Dep, candidate: &Pkg) -> bool {
        requirement.name == candidate.name && requirement.allowed.contains(&candidate.version)
    }

    fn get_dependencies(&self, candidate: &Pkg) -> Vec<Dep> {
        candidate.deps.clone()
    }
}

/// Check that a successful resolution is internally consistent: every
/// pinned candidate satisfies every requirement recorded against its
/// identifier, and every dependency it introduces is itself pinned. A
/// resolver with a real bug typically fails this even when it happens to
/// terminate.
pub fn validate(provider: &TestProvider<'_>, result: &EngineResult<String, Dep, Pkg>) -> Result<(), String> {
    let by_name: HashMap<&String, &Pkg> = result.mapping.iter().collect();

    for (identifier, candidate) in result.mapping.iter() {
        let criterion = result
            .criteria
            .get(identifier)
            .ok_or_else(|| format!("{identifier} pinned but has no criterion"))?;
        for requirement in criterion.iter_requirement() {
            if !provider.is_satisfied_by(requirement, candidate) {
                return Err(format!(
                    "{identifier}@{} fails requirement {requirement:?}",
                    candidate.version
                ));
            }
        }
        for dependency in provider.get_dependencies(candidate) {
            if !by_name.contains_key(&dependency.name) {
                return Err(format!("{identifier}@{} depends on unpinned {}", candidate.version, dependency.name));
            }
        }
    }
    Ok(())
}
