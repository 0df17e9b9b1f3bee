//! A mutable directed multigraph over identifiers plus the sentinel `⊥`
//! (the virtual parent of every root requirement), used to build the
//! final dependency graph in the result.

use std::hash::Hash;

use indexmap::{IndexMap, IndexSet};

/// A vertex in the result graph: either a resolved identifier, or the
/// sentinel root representing "parent of a root requirement".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Vertex<K> {
    Root,
    Id(K),
}

impl<K> Vertex<K> {
    pub fn id(&self) -> Option<&K> {
        match self {
            Vertex::Root => None,
            Vertex::Id(k) => Some(k),
        }
    }
}

#[derive(Clone)]
pub struct DirectedGraph<K: Eq + Hash + Clone> {
    forward: IndexMap<Vertex<K>, IndexSet<Vertex<K>>>,
    backward: IndexMap<Vertex<K>, IndexSet<Vertex<K>>>,
}

impl<K: Eq + Hash + Clone> DirectedGraph<K> {
    /// A graph containing only the sentinel root vertex.
    pub fn new() -> Self {
        let mut graph = DirectedGraph {
            forward: IndexMap::new(),
            backward: IndexMap::new(),
        };
        graph.add(Vertex::Root);
        graph
    }

    pub fn contains(&self, v: &Vertex<K>) -> bool {
        self.forward.contains_key(v)
    }

    /// Insert a new vertex. A no-op if the vertex is already present.
    pub fn add(&mut self, v: Vertex<K>) {
        self.forward.entry(v.clone()).or_insert_with(IndexSet::new);
        self.backward.entry(v).or_insert_with(IndexSet::new);
    }

    /// Connect two vertices already present in the graph.
    pub fn connect(&mut self, from: Vertex<K>, to: Vertex<K>) {
        debug_assert!(self.contains(&from), "connect from a vertex not yet in the graph");
        debug_assert!(self.contains(&to), "connect to a vertex not yet in the graph");
        self.forward.entry(from.clone()).or_insert_with(IndexSet::new).insert(to.clone());
        self.backward.entry(to).or_insert_with(IndexSet::new).insert(from);
    }

    pub fn vertices(&self) -> impl Iterator<Item = &Vertex<K>> {
        self.forward.keys()
    }

    pub fn len(&self) -> usize {
        self.forward.len()
    }

    pub fn is_empty(&self) -> bool {
        self.forward.is_empty()
    }

    /// Vertices with an edge `v -> child`.
    pub fn children(&self, v: &Vertex<K>) -> impl Iterator<Item = &Vertex<K>> {
        self.forward.get(v).into_iter().flat_map(|s| s.iter())
    }

    /// Vertices with an edge `parent -> v`.
    pub fn parents(&self, v: &Vertex<K>) -> impl Iterator<Item = &Vertex<K>> {
        self.backward.get(v).into_iter().flat_map(|s| s.iter())
    }
}

impl<K: Eq + Hash + Clone> Default for DirectedGraph<K> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_graph_has_only_root() {
        let graph: DirectedGraph<&str> = DirectedGraph::new();
        assert_eq!(graph.len(), 1);
        assert!(graph.contains(&Vertex::Root));
    }

    #[test]
    fn connect_builds_forward_and_backward_adjacency() {
        let mut graph = DirectedGraph::new();
        graph.add(Vertex::Id("a"));
        graph.connect(Vertex::Root, Vertex::Id("a"));
        assert_eq!(graph.children(&Vertex::Root).collect::<Vec<_>>(), vec![&Vertex::Id("a")]);
        assert_eq!(graph.parents(&Vertex::Id("a")).collect::<Vec<_>>(), vec![&Vertex::Root]);
    }
}
