//! A generic, provider-driven backtracking dependency resolver.
//!
//! The engine knows nothing about packages, versions, or any other
//! domain concept: it operates purely on the opaque identifier (`K`),
//! requirement (`R`), and candidate (`C`) types supplied by a
//! [`Provider`] implementation, and reports progress through an
//! optional [`Reporter`]. Everything the engine needs to do its job —
//! ranking candidates, checking satisfaction, walking dependencies — is
//! delegated back to the provider.
//!
//! ```ignore
//! use resolver_core::{Resolution, ResolutionOptions};
//!
//! let resolution = Resolution::new(my_provider);
//! let result = resolution.resolve(root_requirements, ResolutionOptions::new())?;
//! for (identifier, candidate) in result.mapping.iter() {
//!     // ...
//! }
//! ```

pub mod criterion;
pub mod error;
pub mod graph;
pub mod provider;
pub mod reporter;
pub mod resolve;
pub mod result;
pub mod state;
pub mod view;

pub use criterion::{Criterion, RequirementInformation};
pub use error::ResolutionError;
pub use graph::{DirectedGraph, Vertex};
pub use provider::{Identified, IncompatibilitiesView, PreferenceContext, Provider, RequirementsView};
pub use reporter::{NoopReporter, Reporter};
pub use resolve::{Resolution, ResolutionOptions};
pub use result::Result;
pub use state::State;
pub use view::IterableView;
