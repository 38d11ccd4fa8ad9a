//! Class and method registration.
//!
//! A [`Registry`] owns the class graph and one method table per generic.
//! Registration takes `&mut self` and resolution takes `&self`, so exclusive
//! and shared access follow from ordinary borrowing. [`SharedRegistry`] puts
//! a registry behind a read-write lock for use across threads.

use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use rustc_hash::FxBuildHasher;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::cache::DispatchCache;
use crate::class::{AncestorChain, ClassGraph, ClassId, GraphError};
use crate::config::ResolverConfig;
use crate::dispatch::{DispatchError, DispatchResolver, MethodCandidate, TieBreak};
use crate::method_table::MethodTable;
use crate::signature::{Arg, Signature};

/// Errors raised while registering classes or methods.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistrationError {
    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error("signature for `{generic}` has {found} classes but the generic dispatches on {expected}")]
    SignatureTooLong {
        generic: String,
        expected: usize,
        found: usize,
    },
}

/// Result type for registration.
pub type RegistrationResult<T> = Result<T, RegistrationError>;

/// Result type for dispatch.
pub type DispatchOutcome<H> = Result<MethodCandidate<H>, DispatchError<H>>;

#[derive(Debug)]
struct Generic<H> {
    table: MethodTable<H>,
    cache: DispatchCache<H>,
}

/// Classes, generics and their methods.
#[derive(Debug)]
pub struct Registry<H> {
    config: ResolverConfig,
    classes: ClassGraph,
    generics: IndexMap<String, Generic<H>, FxBuildHasher>,
}

impl<H: Clone> Default for Registry<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H: Clone> Registry<H> {
    /// Creates an empty registry with the default configuration.
    pub fn new() -> Self {
        Self::with_config(ResolverConfig::default())
    }

    /// Creates an empty registry.
    pub fn with_config(config: ResolverConfig) -> Self {
        Self {
            config,
            classes: ClassGraph::new(),
            generics: IndexMap::default(),
        }
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Changes the tie-break policy used by [`Registry::dispatch`].
    pub fn set_tie_break(&mut self, policy: TieBreak) {
        self.config.tie_break = policy;
    }

    /// The class graph.
    pub fn classes(&self) -> &ClassGraph {
        &self.classes
    }

    // ---- Classes ----

    /// Declares a class with ordered parents, replacing any prior
    /// declaration of the same name.
    pub fn declare_class<S: AsRef<str>>(&mut self, name: &str, parents: &[S]) -> Result<ClassId, GraphError> {
        let redeclared = self
            .classes
            .lookup(name)
            .is_some_and(|id| self.classes.is_declared(id));
        let id = self.classes.declare(name, parents)?;
        if redeclared {
            info!("Redefining class `{}`", name);
        }
        for generic in self.generics.values_mut() {
            generic.cache.clear();
        }
        Ok(id)
    }

    /// The id of `name`, interning it if needed. Does not declare the class.
    pub fn class_id(&mut self, name: &str) -> ClassId {
        self.classes.intern(name)
    }

    /// The id of `name` if it has been seen.
    pub fn lookup_class(&self, name: &str) -> Option<ClassId> {
        self.classes.lookup(name)
    }

    pub fn class_name(&self, id: ClassId) -> &str {
        self.classes.name(id)
    }

    /// The ancestor chain of `class`, ending in `ANY`.
    pub fn ancestors(&self, class: ClassId) -> AncestorChain {
        if class == ClassId::MISSING {
            return AncestorChain::missing();
        }
        self.classes.ancestors(class)
    }

    /// Whether `class` is `ancestor` or inherits from it.
    pub fn extends(&self, class: ClassId, ancestor: ClassId) -> bool {
        self.classes.extends(class, ancestor)
    }

    /// Builds a call from class names. `"MISSING"` is an absent argument.
    ///
    /// Names are looked up, never interned; a name not seen by now becomes
    /// [`Arg::Unknown`], so build calls after the methods they target are
    /// registered.
    pub fn call(&self, names: &[&str]) -> Vec<Arg> {
        names
            .iter()
            .map(|name| self.classes.lookup(name).map_or(Arg::Unknown, Arg::from))
            .collect()
    }

    // ---- Generics and methods ----

    /// Declares a generic dispatching on `params`.
    ///
    /// Redeclaring with the same arity renames the parameters and keeps the
    /// methods; a different arity starts an empty table.
    pub fn declare_generic<S: AsRef<str>>(&mut self, name: &str, params: &[S]) {
        let params: Vec<String> = params.iter().map(|p| p.as_ref().to_string()).collect();
        if let Some(generic) = self.generics.get_mut(name) {
            if generic.table.arity() == params.len() {
                generic.table.set_params(params);
                return;
            }
            warn!(
                "Redefining generic `{}` with {} parameter(s); dropping {} method(s)",
                name,
                params.len(),
                generic.table.len()
            );
        }
        let generic = self.new_generic(name, params);
        self.generics.insert(name.to_string(), generic);
    }

    /// Registers `handle` for `generic` at `signature`.
    ///
    /// Signatures shorter than the generic's arity are padded with `ANY`.
    /// An unknown generic is declared with the signature's arity. A method
    /// already registered at the same signature is replaced.
    pub fn register_method<S: AsRef<str>>(
        &mut self,
        generic: &str,
        signature: &[S],
        handle: H,
    ) -> RegistrationResult<Signature> {
        let signature = self.signature(generic, signature)?;
        for &class in signature.classes() {
            if !class.is_pseudo() && !self.classes.is_declared(class) {
                warn!(
                    "No definition for class `{}` in a method signature for `{}`",
                    self.classes.name(class),
                    generic
                );
            }
        }

        if !self.generics.contains_key(generic) {
            let params = (1..=signature.arity()).map(|i| format!("arg{}", i)).collect();
            let entry = self.new_generic(generic, params);
            self.generics.insert(generic.to_string(), entry);
        }
        if let Some(entry) = self.generics.get_mut(generic) {
            if entry.table.insert(signature.clone(), handle).is_some() {
                debug!("Replaced method for `{}` at ({})", generic, signature.display(&self.classes));
            }
            entry.cache.clear();
        }
        Ok(signature)
    }

    /// Removes the method registered at exactly `signature`.
    pub fn remove_method<S: AsRef<str>>(&mut self, generic: &str, signature: &[S]) -> bool {
        let Some(signature) = self.lookup_signature(generic, signature) else {
            return false;
        };
        let Some(entry) = self.generics.get_mut(generic) else {
            return false;
        };
        let removed = entry.table.remove(&signature).is_some();
        if removed {
            entry.cache.clear();
        }
        removed
    }

    /// Whether a method is registered at exactly `signature`.
    pub fn exists_method<S: AsRef<str>>(&self, generic: &str, signature: &[S]) -> bool {
        self.lookup_signature(generic, signature)
            .zip(self.generics.get(generic))
            .is_some_and(|(signature, entry)| entry.table.contains(&signature))
    }

    /// Whether some method, possibly inherited, applies to `call`.
    pub fn has_method(&self, generic: &str, call: &[Arg]) -> bool {
        match self.resolve(generic, call) {
            Ok(_) => true,
            Err(err) => err.is_ambiguous(),
        }
    }

    /// The method table of `generic`.
    pub fn method_table(&self, generic: &str) -> Option<&MethodTable<H>> {
        self.generics.get(generic).map(|g| &g.table)
    }

    /// Signatures registered for `generic`, in registration order.
    pub fn methods(&self, generic: &str) -> impl Iterator<Item = &Signature> {
        self.generics
            .get(generic)
            .into_iter()
            .flat_map(|g| g.table.signatures())
    }

    /// Declared generic names, in declaration order.
    pub fn generics(&self) -> impl Iterator<Item = &str> {
        self.generics.keys().map(String::as_str)
    }

    // ---- Dispatch ----

    /// Resolves `call` to the closest method of `generic`.
    ///
    /// Ties are always reported as [`DispatchError::AmbiguousMethod`].
    pub fn resolve(&self, generic: &str, call: &[Arg]) -> DispatchOutcome<H> {
        let entry = self
            .generics
            .get(generic)
            .ok_or_else(|| DispatchError::UnknownGeneric(generic.to_string()))?;
        entry
            .cache
            .get_or_resolve(call, || DispatchResolver::new(&self.classes).resolve(&entry.table, call))
    }

    /// Resolves `call`, settling ties with the configured policy.
    pub fn dispatch(&self, generic: &str, call: &[Arg]) -> DispatchOutcome<H> {
        match self.resolve(generic, call) {
            Err(DispatchError::AmbiguousMethod(ambiguity)) => match ambiguity.pick(self.config.tie_break).cloned() {
                Some(chosen) => {
                    let others: Vec<_> = ambiguity
                        .candidates
                        .iter()
                        .filter(|c| c.signature != chosen.signature)
                        .map(|c| format!("({})", c.classes.join(", ")))
                        .collect();
                    warn!(
                        "Method with signature ({}) chosen for `{}`, target signature ({}): {} would also be valid",
                        chosen.classes.join(", "),
                        generic,
                        ambiguity.call.join(", "),
                        others.join(", ")
                    );
                    Ok(chosen)
                }
                None => Err(DispatchError::AmbiguousMethod(ambiguity)),
            },
            outcome => outcome,
        }
    }

    /// The method that `signature`'s own method would defer to.
    ///
    /// Resolves a call whose classes are those of `signature` with the method
    /// registered at `signature` left out.
    pub fn next_method(&self, generic: &str, signature: &Signature) -> DispatchOutcome<H> {
        let entry = self
            .generics
            .get(generic)
            .ok_or_else(|| DispatchError::UnknownGeneric(generic.to_string()))?;
        DispatchResolver::new(&self.classes).resolve_excluding(
            &entry.table,
            &signature.as_call(),
            Some(signature),
        )
    }

    // ---- Helpers ----

    fn new_generic(&self, name: &str, params: Vec<String>) -> Generic<H> {
        debug!("Declaring generic `{}` over ({})", name, params.join(", "));
        Generic {
            table: MethodTable::new(name, params),
            cache: DispatchCache::new(self.config.cache, self.config.cache_capacity),
        }
    }

    /// Interns and pads a signature to the generic's arity.
    fn signature<S: AsRef<str>>(&mut self, generic: &str, names: &[S]) -> RegistrationResult<Signature> {
        let arity = self.generics.get(generic).map_or(names.len(), |g| g.table.arity());
        if names.len() > arity {
            return Err(RegistrationError::SignatureTooLong {
                generic: generic.to_string(),
                expected: arity,
                found: names.len(),
            });
        }
        let mut classes: Vec<_> = names.iter().map(|n| self.classes.intern(n.as_ref())).collect();
        classes.resize(arity, ClassId::ANY);
        Ok(Signature::new(classes))
    }

    /// Like `signature` but without interning; `None` if any name is unknown.
    fn lookup_signature<S: AsRef<str>>(&self, generic: &str, names: &[S]) -> Option<Signature> {
        let arity = self.generics.get(generic)?.table.arity();
        if names.len() > arity {
            return None;
        }
        let mut classes = names
            .iter()
            .map(|n| self.classes.lookup(n.as_ref()))
            .collect::<Option<Vec<_>>>()?;
        classes.resize(arity, ClassId::ANY);
        Some(Signature::new(classes))
    }
}

/// A [`Registry`] shared between threads.
///
/// Registration takes the write lock; resolution takes the read lock, so
/// resolves run in parallel with each other but never overlap a
/// registration.
#[derive(Debug)]
pub struct SharedRegistry<H> {
    inner: Arc<RwLock<Registry<H>>>,
}

impl<H> Clone for SharedRegistry<H> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<H: Clone> SharedRegistry<H> {
    pub fn new(registry: Registry<H>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(registry)),
        }
    }

    pub fn declare_class<S: AsRef<str>>(&self, name: &str, parents: &[S]) -> Result<ClassId, GraphError> {
        self.inner.write().declare_class(name, parents)
    }

    pub fn declare_generic<S: AsRef<str>>(&self, name: &str, params: &[S]) {
        self.inner.write().declare_generic(name, params)
    }

    pub fn register_method<S: AsRef<str>>(
        &self,
        generic: &str,
        signature: &[S],
        handle: H,
    ) -> RegistrationResult<Signature> {
        self.inner.write().register_method(generic, signature, handle)
    }

    pub fn remove_method<S: AsRef<str>>(&self, generic: &str, signature: &[S]) -> bool {
        self.inner.write().remove_method(generic, signature)
    }

    /// Builds a call from class names under the read lock.
    pub fn call(&self, names: &[&str]) -> Vec<Arg> {
        self.inner.read().call(names)
    }

    pub fn resolve(&self, generic: &str, call: &[Arg]) -> DispatchOutcome<H> {
        self.inner.read().resolve(generic, call)
    }

    pub fn dispatch(&self, generic: &str, call: &[Arg]) -> DispatchOutcome<H> {
        self.inner.read().dispatch(generic, call)
    }

    /// Shared access for several queries under one lock.
    pub fn read(&self) -> RwLockReadGuard<'_, Registry<H>> {
        self.inner.read()
    }

    /// Exclusive access for several registrations under one lock.
    pub fn write(&self) -> RwLockWriteGuard<'_, Registry<H>> {
        self.inner.write()
    }
}
