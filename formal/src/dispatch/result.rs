//! Dispatch errors.

use std::fmt;

use thiserror::Error;

use super::types::{MethodCandidate, TieBreak};

/// Why a call could not be resolved to a single method.
#[derive(Debug, Clone, Error)]
pub enum DispatchError<H> {
    #[error("no generic named `{0}`")]
    UnknownGeneric(String),

    #[error("generic `{generic}` dispatches on {expected} argument(s), call supplied {found}")]
    ArityMismatch {
        generic: String,
        expected: usize,
        found: usize,
    },

    #[error("{0}")]
    NoApplicableMethod(NoMatchError),

    #[error("{0}")]
    AmbiguousMethod(AmbiguityError<H>),
}

impl<H> DispatchError<H> {
    pub fn is_ambiguous(&self) -> bool {
        matches!(self, DispatchError::AmbiguousMethod(_))
    }

    pub fn is_no_match(&self) -> bool {
        matches!(self, DispatchError::NoApplicableMethod(_))
    }
}

/// No registered signature matches the call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoMatchError {
    /// The generic that was called.
    pub generic: String,
    /// Class names of the call's arguments.
    pub call: Vec<String>,
    /// Number of methods registered for the generic.
    pub registered: usize,
}

impl fmt::Display for NoMatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unable to find an inherited method for `{}` for signature ({})",
            self.generic,
            self.call.join(", ")
        )
    }
}

/// Several signatures tie at the minimum distance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AmbiguityError<H> {
    /// The generic that was called.
    pub generic: String,
    /// Class names of the call's arguments.
    pub call: Vec<String>,
    /// Tied candidates, in registration order.
    pub candidates: Vec<MethodCandidate<H>>,
}

impl<H> AmbiguityError<H> {
    /// The distance every candidate shares.
    pub fn distance(&self) -> u32 {
        self.candidates.first().map_or(0, |c| c.distance)
    }

    /// Applies a tie-break policy. `TieBreak::Error` picks nothing.
    pub fn pick(&self, policy: TieBreak) -> Option<&MethodCandidate<H>> {
        match policy {
            TieBreak::Error => None,
            TieBreak::FirstRegistered => self.candidates.first(),
            TieBreak::Lexicographic => self.candidates.iter().min_by(|a, b| a.classes.cmp(&b.classes)),
        }
    }
}

impl<H> fmt::Display for AmbiguityError<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ambiguous method for `{}` with signature ({}): ",
            self.generic,
            self.call.join(", ")
        )?;
        for (i, candidate) in self.candidates.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "({})", candidate.classes.join(", "))?;
        }
        write!(f, " all at distance {}", self.distance())
    }
}
