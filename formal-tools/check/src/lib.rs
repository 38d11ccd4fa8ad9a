//! Dispatch checker for formal class manifests.
//!
//! Loads a TOML manifest of classes, generics, methods and calls, resolves
//! every call and reports which method each one selects.

pub mod manifest;
pub mod report;

use std::path::PathBuf;

use formal::{GraphError, RegistrationError};
use thiserror::Error;

pub use manifest::{CallDecl, ClassDecl, GenericDecl, Manifest, MethodDecl};
pub use report::{check, CallReport, Outcome, Report};

/// Errors loading or applying a manifest.
#[derive(Debug, Error)]
pub enum CheckError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid manifest: {0}")]
    Parse(#[from] toml::de::Error),

    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error(transparent)]
    Registration(#[from] RegistrationError),

    #[error("failed to render report: {0}")]
    Render(#[from] serde_json::Error),
}

/// Result type for manifest checks.
pub type CheckResult<T> = Result<T, CheckError>;
