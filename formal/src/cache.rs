//! Memoized dispatch outcomes.

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use tracing::trace;

use crate::dispatch::{DispatchError, MethodCandidate};
use crate::signature::Arg;

type Outcome<H> = Result<MethodCandidate<H>, DispatchError<H>>;

/// Per-generic memo from call classes to the resolution outcome.
///
/// Reads go through a mutex so that resolution can stay `&self`; any
/// mutation of the generic or of the class graph must call [`clear`].
///
/// [`clear`]: DispatchCache::clear
#[derive(Debug)]
pub struct DispatchCache<H> {
    enabled: bool,
    capacity: usize,
    entries: Mutex<FxHashMap<Vec<Arg>, Outcome<H>>>,
}

impl<H: Clone> DispatchCache<H> {
    pub fn new(enabled: bool, capacity: usize) -> Self {
        Self {
            enabled,
            capacity,
            entries: Mutex::new(FxHashMap::default()),
        }
    }

    /// Returns the cached outcome for `call`, computing it on a miss.
    pub fn get_or_resolve(&self, call: &[Arg], resolve: impl FnOnce() -> Outcome<H>) -> Outcome<H> {
        if !self.enabled {
            return resolve();
        }
        if let Some(hit) = self.entries.lock().get(call) {
            trace!("dispatch cache hit");
            return hit.clone();
        }

        // Resolve without holding the lock.
        let outcome = resolve();
        let mut entries = self.entries.lock();
        if entries.len() >= self.capacity {
            entries.clear();
        }
        entries.insert(call.to_vec(), outcome.clone());
        outcome
    }

    pub fn clear(&mut self) {
        self.entries.get_mut().clear();
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
