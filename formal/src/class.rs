//! Class hierarchy for dispatch.
//!
//! Classes live in an arena indexed by [`ClassId`]. Each declared class keeps
//! an ordered set of direct parents; the graph is a DAG and every declaration
//! is checked for cycles before it is applied.
//!
//! `ANY` and `MISSING` are pseudo-classes with fixed ids. `ANY` is never an
//! explicit edge: it is appended to every ancestor chain after all concrete
//! ancestors.

use std::collections::VecDeque;
use std::fmt;

use indexmap::{IndexMap, IndexSet};
use string_interner::{DefaultStringInterner, DefaultSymbol, Symbol};
use thiserror::Error;
use tracing::trace;

/// Name of the pseudo-class matching any argument.
pub const ANY: &str = "ANY";

/// Name of the pseudo-class matching an absent argument.
pub const MISSING: &str = "MISSING";

/// Display name for ids and arguments with no interned name.
pub(crate) const UNSEEN: &str = "<unknown>";

/// Number of ids reserved ahead of interned class names.
const RESERVED: usize = 2;

/// Dense index of a class in the [`ClassGraph`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClassId(u32);

impl ClassId {
    /// The `ANY` pseudo-class.
    pub const ANY: ClassId = ClassId(0);
    /// The `MISSING` pseudo-class.
    pub const MISSING: ClassId = ClassId(1);

    /// Returns the arena index of this class.
    pub fn index(self) -> usize {
        self.0 as usize
    }

    /// Whether this is `ANY` or `MISSING`.
    pub fn is_pseudo(self) -> bool {
        self == ClassId::ANY || self == ClassId::MISSING
    }
}

/// Errors raised while declaring classes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    #[error("declaring `{class}` with parent `{parent}` would create a cycle")]
    CycleDetected { class: String, parent: String },

    #[error("`{0}` is a reserved pseudo-class and cannot be declared")]
    ReservedClass(String),

    #[error("class `{class}` cannot list pseudo-class `{parent}` as a parent")]
    ReservedParent { class: String, parent: String },

    #[error("parent `{parent}` of class `{class}` is not declared")]
    UndefinedParent { class: String, parent: String },
}

#[derive(Debug, Clone, Default)]
struct ClassNode {
    parents: IndexSet<ClassId>,
}

/// Arena-backed DAG of "is-a" edges between classes.
#[derive(Debug)]
pub struct ClassGraph {
    names: DefaultStringInterner,
    /// Declared classes; `None` for names that were only interned.
    nodes: Vec<Option<ClassNode>>,
}

impl Default for ClassGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl ClassGraph {
    /// Creates an empty graph containing only the pseudo-classes.
    pub fn new() -> Self {
        Self {
            names: DefaultStringInterner::new(),
            nodes: vec![None; RESERVED],
        }
    }

    /// Interns a class name without declaring it.
    pub fn intern(&mut self, name: &str) -> ClassId {
        match name {
            ANY => ClassId::ANY,
            MISSING => ClassId::MISSING,
            _ => {
                let sym = self.names.get_or_intern(name);
                let id = ClassId((sym.to_usize() + RESERVED) as u32);
                if self.nodes.len() <= id.index() {
                    self.nodes.resize(id.index() + 1, None);
                }
                id
            }
        }
    }

    /// Looks up an already interned class name.
    pub fn lookup(&self, name: &str) -> Option<ClassId> {
        match name {
            ANY => Some(ClassId::ANY),
            MISSING => Some(ClassId::MISSING),
            _ => self
                .names
                .get(name)
                .map(|sym| ClassId((sym.to_usize() + RESERVED) as u32)),
        }
    }

    /// Returns the name of a class.
    pub fn name(&self, id: ClassId) -> &str {
        match id {
            ClassId::ANY => ANY,
            ClassId::MISSING => MISSING,
            _ => id
                .index()
                .checked_sub(RESERVED)
                .and_then(DefaultSymbol::try_from_usize)
                .and_then(|sym| self.names.resolve(sym))
                .unwrap_or(UNSEEN),
        }
    }

    /// Whether `id` has been declared with [`ClassGraph::declare`].
    pub fn is_declared(&self, id: ClassId) -> bool {
        matches!(self.nodes.get(id.index()), Some(Some(_)))
    }

    /// Number of declared classes.
    pub fn len(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Direct parents of a class, in declaration order.
    pub fn parents(&self, id: ClassId) -> impl Iterator<Item = ClassId> + '_ {
        self.node(id).into_iter().flat_map(|n| n.parents.iter().copied())
    }

    /// Declares (or redeclares) a class with the given ordered parents.
    ///
    /// Redeclaration replaces the previous parent list. On error the graph
    /// is left exactly as it was.
    pub fn declare<S: AsRef<str>>(&mut self, name: &str, parents: &[S]) -> Result<ClassId, GraphError> {
        if name == ANY || name == MISSING {
            return Err(GraphError::ReservedClass(name.to_string()));
        }

        let existing = self.lookup(name);
        let mut resolved = IndexSet::with_capacity(parents.len());
        for parent in parents {
            let parent = parent.as_ref();
            if parent == ANY || parent == MISSING {
                return Err(GraphError::ReservedParent {
                    class: name.to_string(),
                    parent: parent.to_string(),
                });
            }
            if parent == name {
                return Err(GraphError::CycleDetected {
                    class: name.to_string(),
                    parent: parent.to_string(),
                });
            }
            let parent_id = match self.lookup(parent) {
                Some(id) if self.is_declared(id) => id,
                _ => {
                    return Err(GraphError::UndefinedParent {
                        class: name.to_string(),
                        parent: parent.to_string(),
                    })
                }
            };
            // An undeclared name has no descendants, so only a redeclaration can close a cycle.
            if let Some(id) = existing {
                if self.reaches(parent_id, id) {
                    return Err(GraphError::CycleDetected {
                        class: name.to_string(),
                        parent: parent.to_string(),
                    });
                }
            }
            resolved.insert(parent_id);
        }

        let id = self.intern(name);
        self.nodes[id.index()] = Some(ClassNode { parents: resolved });
        Ok(id)
    }

    /// Computes the ancestor chain of a class.
    ///
    /// Breadth-first over the parent edges, so a class reachable by several
    /// paths keeps its shortest distance. `ANY` follows at one past the
    /// deepest concrete ancestor.
    pub fn ancestors(&self, id: ClassId) -> AncestorChain {
        let mut entries = IndexMap::new();

        if id == ClassId::ANY {
            entries.insert(ClassId::ANY, 0);
            return AncestorChain { entries };
        }

        let mut queue = VecDeque::new();
        entries.insert(id, 0);
        queue.push_back((id, 0u32));
        let mut deepest = 0;

        while let Some((current, distance)) = queue.pop_front() {
            deepest = deepest.max(distance);
            for parent in self.parents(current) {
                if !entries.contains_key(&parent) {
                    entries.insert(parent, distance + 1);
                    queue.push_back((parent, distance + 1));
                }
            }
        }

        entries.insert(ClassId::ANY, deepest + 1);
        trace!("ancestors of {}: {} entries", self.name(id), entries.len());
        AncestorChain { entries }
    }

    /// Whether `ancestor` is `class` itself or one of its ancestors.
    pub fn extends(&self, class: ClassId, ancestor: ClassId) -> bool {
        if ancestor == ClassId::ANY || class == ancestor {
            return true;
        }
        self.reaches(class, ancestor)
    }

    fn node(&self, id: ClassId) -> Option<&ClassNode> {
        self.nodes.get(id.index()).and_then(Option::as_ref)
    }

    /// Whether `target` is reachable from `from` along parent edges.
    fn reaches(&self, from: ClassId, target: ClassId) -> bool {
        let mut visited = vec![false; self.nodes.len()];
        let mut stack = vec![from];
        while let Some(current) = stack.pop() {
            if current == target {
                return true;
            }
            match visited.get_mut(current.index()) {
                Some(seen) if !*seen => *seen = true,
                _ => continue,
            }
            stack.extend(self.parents(current));
        }
        false
    }
}

/// Classes reachable from a starting class, with their minimum distance.
///
/// Entries are in breadth-first order and always end with `ANY`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AncestorChain {
    entries: IndexMap<ClassId, u32>,
}

impl AncestorChain {
    /// Chain for an absent argument: `MISSING` then `ANY`.
    pub fn missing() -> Self {
        let mut entries = IndexMap::new();
        entries.insert(ClassId::MISSING, 0);
        entries.insert(ClassId::ANY, 1);
        Self { entries }
    }

    /// Chain for a class the graph has never seen: only `ANY`, one step up.
    pub fn unseen() -> Self {
        let mut entries = IndexMap::new();
        entries.insert(ClassId::ANY, 1);
        Self { entries }
    }

    /// Distance of `class` in this chain, if it appears.
    pub fn distance(&self, class: ClassId) -> Option<u32> {
        self.entries.get(&class).copied()
    }

    /// Iterates `(class, distance)` pairs in breadth-first order.
    pub fn iter(&self) -> impl Iterator<Item = (ClassId, u32)> + '_ {
        self.entries.iter().map(|(&id, &d)| (id, d))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Display for ClassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}
