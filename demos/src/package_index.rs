//! A miniature stand-in for resolving against a package index: a fixed
//! in-memory catalogue of name/version/dependency triples, queried the
//! way a real index client would (`find_matches` filters and sorts by
//! version, newest first), but without any actual network traffic.

use resolver_core::provider::{IncompatibilitiesView, PreferenceContext, Provider, RequirementsView};
use resolver_core::{Identified, IterableView, Resolution, ResolutionOptions};

#[derive(Debug, Clone, PartialEq, Eq)]
struct Requirement {
    name: &'static str,
    min_version: u32,
    max_version: u32,
}

fn req(name: &'static str, min_version: u32, max_version: u32) -> Requirement {
    Requirement { name, min_version, max_version }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Release {
    name: &'static str,
    version: u32,
    requires: Vec<Requirement>,
}

fn release(name: &'static str, version: u32, requires: Vec<Requirement>) -> Release {
    Release { name, version, requires }
}

struct Index {
    releases: Vec<Release>,
}

impl Index {
    fn releases_of(&self, name: &str) -> impl Iterator<Item = &Release> {
        self.releases.iter().filter(move |r| r.name == name)
    }
}

struct IndexProvider<'a> {
    index: &'a Index,
}

impl<'a> Provider<String, Requirement, Release> for IndexProvider<'a> {
    type Preference = usize;

    fn identify(&self, item: Identified<'_, Requirement, Release>) -> String {
        match item {
            Identified::Requirement(r) => r.name.to_string(),
            Identified::Candidate(c) => c.name.to_string(),
        }
    }

    fn get_preference(&self, identifier: &String, context: PreferenceContext<'_, String, Requirement, Release>) -> usize {
        context.candidates(identifier).count()
    }

    fn find_matches(
        &self,
        identifier: &String,
        requirements: RequirementsView<'_, String, Requirement, Release>,
        incompatibilities: IncompatibilitiesView<'_, String, Requirement, Release>,
    ) -> IterableView<Release> {
        let excluded: Vec<u32> = incompatibilities.incompatibilities_for(identifier).map(|c| c.version).collect();
        let mut matches: Vec<Release> = self
            .index
            .releases_of(identifier)
            .filter(|release| {
                requirements
                    .requirements_for(identifier)
                    .all(|r| release.version >= r.min_version && release.version <= r.max_version)
            })
            .filter(|release| !excluded.contains(&release.version))
            .cloned()
            .collect();
        matches.sort_unstable_by(|a, b| b.version.cmp(&a.version));
        IterableView::from_candidates(matches)
    }

    fn is_satisfied_by(&self, requirement: &Requirement, candidate: &Release) -> bool {
        requirement.name == candidate.name
            && candidate.version >= requirement.min_version
            && candidate.version <= requirement.max_version
    }

    fn get_dependencies(&self, candidate: &Release) -> Vec<Requirement> {
        candidate.requires.clone()
    }
}

fn main() {
    let index = Index {
        releases: vec![
            release("web", 3, vec![req("http", 2, 3), req("json", 1, 2)]),
            release("web", 2, vec![req("http", 1, 2)]),
            release("http", 3, vec![]),
            release("http", 2, vec![]),
            release("http", 1, vec![]),
            release("json", 2, vec![]),
            release("json", 1, vec![]),
        ],
    };

    let provider = IndexProvider { index: &index };
    let resolution = Resolution::new(provider);
    let result = resolution
        .resolve(vec![req("web", 1, 3)], ResolutionOptions::new())
        .expect("this tiny catalogue is satisfiable");

    println!("Pinned:");
    for (name, candidate) in result.mapping.iter() {
        println!("  {name} {}", candidate.version);
    }

    println!("\nDependency graph:");
    for vertex in result.graph.vertices() {
        if let Some(name) = vertex.id() {
            let children: Vec<String> = result
                .graph
                .children(vertex)
                .filter_map(|child| child.id())
                .map(|id| id.clone())
                .collect();
            println!("  {name} -> {}", children.join(", "));
        }
    }
}
