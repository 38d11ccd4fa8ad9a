//! Core type definitions for dispatch resolution.

use serde::{Deserialize, Serialize};

use crate::signature::Signature;

/// A registered method that applies to a call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodCandidate<H> {
    /// The signature the method was registered for.
    pub signature: Signature,
    /// Class names of the signature, position by position.
    pub classes: Vec<String>,
    /// The caller's handle for the method.
    pub handle: H,
    /// Sum of per-position ancestor distances for the call.
    pub distance: u32,
}

/// How to settle a tie between equally close methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TieBreak {
    /// Report the ambiguity to the caller.
    #[default]
    Error,
    /// Pick the earliest registered of the tied methods.
    FirstRegistered,
    /// Pick the tied method whose class names sort first, position by position.
    Lexicographic,
}
