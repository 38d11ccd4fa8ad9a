//! Manifest Format
//!
//! A manifest declares classes, generics and methods, and lists the calls
//! to check:
//!
//! ```toml
//! [[class]]
//! name = "Shape"
//!
//! [[class]]
//! name = "Circle"
//! contains = ["Shape"]
//!
//! [[generic]]
//! name = "area"
//! params = ["shape"]
//!
//! [[method]]
//! generic = "area"
//! signature = ["Shape"]
//! label = "area_shape"
//!
//! [[call]]
//! generic = "area"
//! args = ["Circle"]
//! ```
//!
//! Classes are declared in file order, so parents must come first.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{CheckError, CheckResult};

/// A parsed manifest.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Manifest {
    #[serde(rename = "class")]
    pub classes: Vec<ClassDecl>,

    #[serde(rename = "generic")]
    pub generics: Vec<GenericDecl>,

    #[serde(rename = "method")]
    pub methods: Vec<MethodDecl>,

    #[serde(rename = "call")]
    pub calls: Vec<CallDecl>,
}

/// `[[class]]`: a class and its ordered parents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassDecl {
    pub name: String,
    #[serde(default)]
    pub contains: Vec<String>,
}

/// `[[generic]]`: a generic and its dispatched parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenericDecl {
    pub name: String,
    pub params: Vec<String>,
}

/// `[[method]]`: a method registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodDecl {
    pub generic: String,
    pub signature: Vec<String>,
    /// Name reported when the method is selected.
    #[serde(default)]
    pub label: Option<String>,
}

impl MethodDecl {
    /// The label, or `generic(A, B)` when none was given.
    pub fn label(&self) -> String {
        self.label
            .clone()
            .unwrap_or_else(|| format!("{}({})", self.generic, self.signature.join(", ")))
    }
}

/// `[[call]]`: a call to resolve. `"MISSING"` marks an absent argument.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallDecl {
    pub generic: String,
    pub args: Vec<String>,
}

impl Manifest {
    /// Parses a manifest from TOML source.
    pub fn parse(source: &str) -> CheckResult<Self> {
        Ok(toml::from_str(source)?)
    }

    /// Reads and parses a manifest file.
    pub fn load(path: impl AsRef<Path>) -> CheckResult<Self> {
        let path = path.as_ref();
        let source = fs::read_to_string(path).map_err(|source| CheckError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&source)
    }
}
