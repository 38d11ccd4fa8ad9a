//! Formal classes and multiple dispatch.
//!
//! This crate resolves generic calls to methods registered against
//! signatures of classes, where classes form a DAG with multiple
//! inheritance:
//!
//! - Class graph with cycle-checked declarations
//! - Method tables per generic, keyed by signature
//! - Closest-match resolution summing ancestor distances across arguments
//! - `ANY` and `MISSING` pseudo-classes
//! - Explicit ambiguity errors and an opt-in tie-break policy
//! - Next-method lookup
//! - A per-generic dispatch cache
//!
//! # Example
//!
//! ```
//! use formal::Registry;
//!
//! let mut registry: Registry<&str> = Registry::new();
//! registry.declare_class("Shape", &[] as &[&str]).unwrap();
//! registry.declare_class("Circle", &["Shape"]).unwrap();
//! registry.declare_generic("area", &["shape"]);
//! registry.register_method("area", &["Shape"], "area_shape").unwrap();
//!
//! let call = registry.call(&["Circle"]);
//! let method = registry.resolve("area", &call).unwrap();
//! assert_eq!(method.handle, "area_shape");
//! assert_eq!(method.distance, 1);
//! ```

pub mod cache;
pub mod class;
pub mod config;
pub mod dispatch;
pub mod method_table;
pub mod registry;
pub mod signature;

pub use class::{AncestorChain, ClassGraph, ClassId, GraphError, ANY, MISSING};
pub use config::{ConfigError, ResolverConfig};
pub use dispatch::{
    AmbiguityError, DispatchError, DispatchResolver, MethodCandidate, NoMatchError, TieBreak,
};
pub use method_table::MethodTable;
pub use registry::{
    DispatchOutcome, RegistrationError, RegistrationResult, Registry, SharedRegistry,
};
pub use signature::{display_call, Arg, Signature};
