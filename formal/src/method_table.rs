//! Per-generic method tables.

use indexmap::IndexMap;

use crate::signature::Signature;

/// The methods registered for one generic.
///
/// Entries keep registration order. Re-registering a signature replaces its
/// handle in place.
#[derive(Debug, Clone)]
pub struct MethodTable<H> {
    name: String,
    params: Vec<String>,
    methods: IndexMap<Signature, H>,
}

impl<H> MethodTable<H> {
    /// Creates an empty table for a generic with the given parameters.
    pub fn new(name: impl Into<String>, params: Vec<String>) -> Self {
        Self {
            name: name.into(),
            params,
            methods: IndexMap::new(),
        }
    }

    /// The generic's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The generic's dispatched parameter names.
    pub fn params(&self) -> &[String] {
        &self.params
    }

    pub fn arity(&self) -> usize {
        self.params.len()
    }

    pub(crate) fn set_params(&mut self, params: Vec<String>) {
        self.params = params;
    }

    /// Inserts or replaces the method for `signature`.
    ///
    /// Returns the previous handle, if any.
    pub fn insert(&mut self, signature: Signature, handle: H) -> Option<H> {
        debug_assert_eq!(signature.arity(), self.arity());
        self.methods.insert(signature, handle)
    }

    /// Removes the method for `signature`, keeping the order of the rest.
    pub fn remove(&mut self, signature: &Signature) -> Option<H> {
        self.methods.shift_remove(signature)
    }

    /// The handle registered for exactly `signature`.
    pub fn get(&self, signature: &Signature) -> Option<&H> {
        self.methods.get(signature)
    }

    pub fn contains(&self, signature: &Signature) -> bool {
        self.methods.contains_key(signature)
    }

    /// Registered methods in registration order.
    pub fn iter(&self) -> impl Iterator<Item = (&Signature, &H)> {
        self.methods.iter()
    }

    /// Registered signatures in registration order.
    pub fn signatures(&self) -> impl Iterator<Item = &Signature> {
        self.methods.keys()
    }

    pub fn len(&self) -> usize {
        self.methods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }
}
