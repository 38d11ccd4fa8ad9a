//! Dispatch Reports
//!
//! Runs every call of a manifest through a registry and renders the
//! outcomes as text or JSON.

use std::fmt;

use formal::{DispatchError, Registry, ResolverConfig};
use serde::Serialize;
use tracing::debug;

use crate::manifest::Manifest;
use crate::CheckResult;

/// Outcome of one call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "kebab-case")]
pub enum Outcome {
    Resolved {
        method: String,
        signature: Vec<String>,
        distance: u32,
    },
    Ambiguous {
        candidates: Vec<String>,
        distance: u32,
    },
    NoMethod,
    Error {
        message: String,
    },
}

impl Outcome {
    pub fn is_resolved(&self) -> bool {
        matches!(self, Outcome::Resolved { .. })
    }
}

/// A checked call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CallReport {
    pub generic: String,
    pub args: Vec<String>,
    #[serde(flatten)]
    pub outcome: Outcome,
}

/// Outcomes for every call of a manifest, in manifest order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Report {
    pub calls: Vec<CallReport>,
}

impl Report {
    /// Number of calls that did not resolve to a single method.
    pub fn failures(&self) -> usize {
        self.calls.iter().filter(|c| !c.outcome.is_resolved()).count()
    }

    /// Renders one line per call.
    pub fn to_text(&self) -> String {
        self.to_string()
    }

    pub fn to_json(&self) -> CheckResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for call in &self.calls {
            write!(f, "{}({}) -> ", call.generic, call.args.join(", "))?;
            match &call.outcome {
                Outcome::Resolved { method, signature, distance } => {
                    writeln!(f, "{} [{}] distance {}", method, signature.join(", "), distance)?
                }
                Outcome::Ambiguous { candidates, distance } => {
                    writeln!(f, "ambiguous at distance {}: {}", distance, candidates.join(", "))?
                }
                Outcome::NoMethod => writeln!(f, "no applicable method")?,
                Outcome::Error { message } => writeln!(f, "error: {}", message)?,
            }
        }
        writeln!(f, "{} call(s), {} unresolved", self.calls.len(), self.failures())
    }
}

/// Builds a registry from `manifest` and checks each of its calls.
///
/// Declaration errors abort the check; call failures are reported.
pub fn check(manifest: &Manifest, config: ResolverConfig) -> CheckResult<Report> {
    let mut registry: Registry<String> = Registry::with_config(config);

    for class in &manifest.classes {
        registry.declare_class(&class.name, &class.contains)?;
    }
    for generic in &manifest.generics {
        registry.declare_generic(&generic.name, &generic.params);
    }
    for method in &manifest.methods {
        registry.register_method(&method.generic, &method.signature, method.label())?;
    }

    let mut report = Report::default();
    for call in &manifest.calls {
        let args: Vec<&str> = call.args.iter().map(String::as_str).collect();
        let resolved_args = registry.call(&args);
        debug!("Checking {}({})", call.generic, call.args.join(", "));

        let outcome = match registry.dispatch(&call.generic, &resolved_args) {
            Ok(method) => Outcome::Resolved {
                method: method.handle,
                signature: method.classes,
                distance: method.distance,
            },
            Err(DispatchError::AmbiguousMethod(err)) => Outcome::Ambiguous {
                distance: err.distance(),
                candidates: err.candidates.into_iter().map(|c| c.handle).collect(),
            },
            Err(DispatchError::NoApplicableMethod(_)) => Outcome::NoMethod,
            Err(err) => Outcome::Error {
                message: err.to_string(),
            },
        };
        report.calls.push(CallReport {
            generic: call.generic.clone(),
            args: call.args.clone(),
            outcome,
        });
    }
    Ok(report)
}
