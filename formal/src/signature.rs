//! Method signatures and call argument lists.

use crate::class::{ClassGraph, ClassId, UNSEEN};

/// The ordered classes a method was registered for, one per dispatched
/// parameter.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Signature(Vec<ClassId>);

impl Signature {
    pub fn new(classes: Vec<ClassId>) -> Self {
        Self(classes)
    }

    pub fn classes(&self) -> &[ClassId] {
        &self.0
    }

    pub fn arity(&self) -> usize {
        self.0.len()
    }

    /// Class names of each position.
    pub fn names(&self, graph: &ClassGraph) -> Vec<String> {
        self.0.iter().map(|&id| graph.name(id).to_string()).collect()
    }

    /// Renders the signature as `A, B, ANY`.
    pub fn display(&self, graph: &ClassGraph) -> String {
        self.names(graph).join(", ")
    }

    /// The call whose arguments have exactly these classes.
    ///
    /// `MISSING` positions become absent arguments.
    pub fn as_call(&self) -> Vec<Arg> {
        self.0.iter().map(|&id| Arg::from(id)).collect()
    }
}

/// One actual argument of a generic call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Arg {
    /// An argument whose runtime class is known.
    Class(ClassId),
    /// The argument was not supplied.
    Missing,
    /// A class the registry has never seen. No signature can name it, so it
    /// dispatches as an undeclared root.
    Unknown,
}

impl Arg {
    /// The class this argument dispatches as, if it has an id.
    pub fn class(self) -> Option<ClassId> {
        match self {
            Arg::Class(id) => Some(id),
            Arg::Missing => Some(ClassId::MISSING),
            Arg::Unknown => None,
        }
    }

    /// Display name of the argument's class.
    pub fn name(self, graph: &ClassGraph) -> &str {
        match self.class() {
            Some(id) => graph.name(id),
            None => UNSEEN,
        }
    }
}

impl From<ClassId> for Arg {
    fn from(id: ClassId) -> Self {
        if id == ClassId::MISSING {
            Arg::Missing
        } else {
            Arg::Class(id)
        }
    }
}

/// Renders a call as `A, MISSING, B`.
pub fn display_call(graph: &ClassGraph, call: &[Arg]) -> String {
    call.iter()
        .map(|arg| arg.name(graph))
        .collect::<Vec<_>>()
        .join(", ")
}
