//! Result construction: walk the final state's parent links back to the
//! sentinel `⊥`, discard anything that cannot reach it (orphans left
//! behind by discarded branches), and emit the mapping, graph, and
//! criteria restricted to what is actually reachable.

use std::collections::HashSet;
use std::hash::Hash;

use indexmap::IndexMap;

use crate::criterion::CriteriaMap;
use crate::graph::{DirectedGraph, Vertex};
use crate::provider::{Identified, Provider};
use crate::state::State;

/// The product of a successful `resolve` call.
pub struct Result<K, R, C> {
    pub mapping: IndexMap<K, C>,
    pub graph: DirectedGraph<K>,
    pub criteria: CriteriaMap<K, R, C>,
}

pub(crate) fn build_result<K, R, C, P>(provider: &P, state: &State<K, R, C>) -> Result<K, R, C>
where
    K: Clone + Eq + Hash,
    R: Clone,
    C: Clone,
    P: Provider<K, R, C>,
{
    let mut connected: HashSet<Vertex<K>> = HashSet::new();
    connected.insert(Vertex::Root);

    let keys: Vec<K> = state.criteria().keys().cloned().collect();
    for k in &keys {
        let mut visiting = HashSet::new();
        reaches_root(k, state, provider, &mut connected, &mut visiting);
    }

    let mut graph = DirectedGraph::new();
    for k in &keys {
        let vertex = Vertex::Id(k.clone());
        if connected.contains(&vertex) {
            graph.add(vertex);
        }
    }
    for k in &keys {
        let vertex = Vertex::Id(k.clone());
        if !connected.contains(&vertex) {
            continue;
        }
        if let Some(criterion) = state.criteria().get(k) {
            for parent in criterion.iter_parent() {
                let parent_vertex = match parent {
                    None => Vertex::Root,
                    Some(p) => Vertex::Id(provider.identify(Identified::Candidate(p))),
                };
                if parent_vertex == Vertex::Root || connected.contains(&parent_vertex) {
                    graph.connect(parent_vertex, vertex.clone());
                }
            }
        }
    }

    let mapping: IndexMap<K, C> = state
        .mapping()
        .iter()
        .filter(|(k, _)| connected.contains(&Vertex::Id((*k).clone())))
        .map(|(k, c)| (k.clone(), c.clone()))
        .collect();

    Result {
        mapping,
        graph,
        criteria: state.criteria().clone(),
    }
}

/// Depth-first walk from `k` through its criterion's parent links to the
/// sentinel root, memoised in `connected`. `visiting` guards against
/// dependency cycles the engine tolerates elsewhere: a cycle with no
/// independent path to `⊥` simply fails to reach it, rather than
/// recursing forever.
fn reaches_root<K, R, C, P>(
    k: &K,
    state: &State<K, R, C>,
    provider: &P,
    connected: &mut HashSet<Vertex<K>>,
    visiting: &mut HashSet<K>,
) -> bool
where
    K: Clone + Eq + Hash,
    R: Clone,
    C: Clone,
    P: Provider<K, R, C>,
{
    let vertex = Vertex::Id(k.clone());
    if connected.contains(&vertex) {
        return true;
    }
    if visiting.contains(k) {
        return false;
    }
    visiting.insert(k.clone());

    let reaches = match state.criteria().get(k) {
        None => false,
        Some(criterion) => criterion.iter_parent().any(|parent| match parent {
            None => true,
            Some(p) => {
                let parent_id = provider.identify(Identified::Candidate(p));
                reaches_root(&parent_id, state, provider, connected, visiting)
            }
        }),
    };

    visiting.remove(k);
    if reaches {
        connected.insert(vertex);
    }
    reaches
}
