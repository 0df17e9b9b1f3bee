//! A re-iterable, lazily materialised view over a candidate sequence.
//!
//! Providers may back a requirement's candidate list with a network or
//! index lookup. `IterableView` lets the engine ask "is this empty?" by
//! peeking, then iterate the same sequence again from the start, without
//! forcing the provider to either eagerly collect or re-run expensive work
//! on every peek.

use std::rc::Rc;

enum Source<C> {
    /// A factory that produces a fresh iterator on every call. Peeking
    /// drives one throwaway iterator to its first element; iterating
    /// properly asks the factory again, so nothing is consumed twice.
    Lazy(Rc<dyn Fn() -> Box<dyn Iterator<Item = C>>>),
    Materialized(Rc<Vec<C>>),
}

impl<C> Clone for Source<C> {
    fn clone(&self) -> Self {
        match self {
            Source::Lazy(f) => Source::Lazy(Rc::clone(f)),
            Source::Materialized(v) => Source::Materialized(Rc::clone(v)),
        }
    }
}

#[derive(Clone)]
pub struct IterableView<C> {
    source: Source<C>,
}

impl<C> IterableView<C> {
    /// Wrap a factory that can be called repeatedly to produce independent
    /// iterators over the same logical sequence.
    pub fn from_factory<F, I>(factory: F) -> Self
    where
        F: Fn() -> I + 'static,
        I: Iterator<Item = C> + 'static,
    {
        IterableView {
            source: Source::Lazy(Rc::new(move || Box::new(factory()) as Box<dyn Iterator<Item = C>>)),
        }
    }

    /// Wrap an already-materialised sequence of candidates.
    pub fn from_candidates<I>(items: I) -> Self
    where
        I: IntoIterator<Item = C>,
    {
        IterableView {
            source: Source::Materialized(Rc::new(items.into_iter().collect())),
        }
    }

    pub fn empty() -> Self {
        IterableView {
            source: Source::Materialized(Rc::new(Vec::new())),
        }
    }

    /// Test for emptiness without disturbing subsequent full iteration.
    pub fn is_empty(&self) -> bool {
        match &self.source {
            Source::Materialized(v) => v.is_empty(),
            Source::Lazy(factory) => factory().next().is_none(),
        }
    }
}

impl<C: Clone> IterableView<C> {
    /// Produce a fresh, independent pass over the candidates, most
    /// preferred first (order is whatever the provider returned).
    pub fn iter(&self) -> Box<dyn Iterator<Item = C> + '_> {
        match &self.source {
            Source::Materialized(v) => Box::new(v.iter().cloned()),
            Source::Lazy(factory) => factory(),
        }
    }
}
