//! The error types that may escape `resolve`. The internal
//! `RequirementsConflicted` (see `crate::criterion`) is strictly local and
//! must never be named here.

use crate::criterion::{Criterion, RequirementInformation};

/// Errors surfaced at the `resolve` boundary. All three share this common
/// base so callers can match broadly or drill into a specific cause.
#[derive(Debug, thiserror::Error)]
pub enum ResolutionError<R, C>
where
    R: std::fmt::Debug,
    C: std::fmt::Debug,
{
    /// The provider returned a candidate from `find_matches` that fails
    /// `is_satisfied_by` against one of its own generating requirements.
    /// Always a provider bug.
    #[error("provider returned a candidate inconsistent with its generating requirement")]
    InconsistentCandidate {
        candidate: C,
        criterion: Criterion<R, C>,
    },

    /// Either the root requirements are jointly unsatisfiable, or
    /// backjumping exhausted the state stack. Carries the requirements
    /// most recently blamed for the failure.
    #[error("no resolution satisfies {} contributing requirement(s)", .causes.len())]
    Impossible {
        causes: Vec<RequirementInformation<R, C>>,
    },

    /// The round counter reached `max_rounds` without the search
    /// terminating.
    #[error("resolution did not converge within {max_rounds} rounds")]
    TooDeep { max_rounds: usize },

    /// `resolve` was called a second time on the same `Resolution`. A
    /// single engine instance is one-shot.
    #[error("this Resolution has already been resolved once")]
    AlreadyResolved,
}
