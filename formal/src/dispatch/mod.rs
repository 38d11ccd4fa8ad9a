//! Multiple dispatch resolution.
//!
//! Selects the method to run for a generic call from the runtime classes of
//! all dispatched arguments.
//!
//! # Algorithm Overview
//!
//! 1. **Ancestor chains**: per argument, BFS distances to every ancestor,
//!    with `ANY` past the deepest concrete ancestor (`MISSING`, then `ANY`,
//!    for an absent argument)
//! 2. **Match distance**: per signature, the sum of the distance of each
//!    declared class in the matching chain; a class absent from its chain
//!    rules the signature out
//! 3. **Select closest**: candidates rank by total distance, then by how
//!    many positions they match only through `ANY` or `MISSING`, so a
//!    fallback never ties with an all-real match; the unique minimum wins,
//!    several minima are reported as ambiguous, none as no applicable method
//!
//! # Module Structure
//!
//! - [`types`] - Candidates and the tie-break policy
//! - [`result`] - Dispatch errors

mod result;
mod types;


pub use result::{AmbiguityError, DispatchError, NoMatchError};
pub use types::{MethodCandidate, TieBreak};

use tracing::{debug, trace};

use crate::class::{AncestorChain, ClassGraph};
use crate::method_table::MethodTable;
use crate::signature::{display_call, Arg, Signature};

/// Dispatch resolution over a snapshot of the class graph.
pub struct DispatchResolver<'a> {
    graph: &'a ClassGraph,
}

impl<'a> DispatchResolver<'a> {
    /// Create a new dispatch resolver.
    pub fn new(graph: &'a ClassGraph) -> Self {
        Self { graph }
    }

    /// Resolve dispatch for a call.
    ///
    /// Finds the unique closest applicable method or returns an error
    /// describing why there is none.
    pub fn resolve<H: Clone>(
        &self,
        table: &MethodTable<H>,
        call: &[Arg],
    ) -> Result<MethodCandidate<H>, DispatchError<H>> {
        self.resolve_excluding(table, call, None)
    }

    /// Resolve dispatch, ignoring the method registered for `excluded`.
    pub fn resolve_excluding<H: Clone>(
        &self,
        table: &MethodTable<H>,
        call: &[Arg],
        excluded: Option<&Signature>,
    ) -> Result<MethodCandidate<H>, DispatchError<H>> {
        if call.len() != table.arity() {
            return Err(DispatchError::ArityMismatch {
                generic: table.name().to_string(),
                expected: table.arity(),
                found: call.len(),
            });
        }

        // Step 1: Ancestor chain per argument
        let chains = self.call_chains(call);

        // Step 2: Keep the applicable methods with the smallest rank
        let mut best: Vec<MethodCandidate<H>> = Vec::new();
        let mut best_rank = None;
        for (signature, handle) in table.iter() {
            if excluded == Some(signature) {
                continue;
            }
            let Some(distance) = Self::match_distance(signature, &chains) else {
                continue;
            };
            let rank = (distance, Self::fallback_positions(signature));
            trace!(
                "`{}` applicable at distance {} with {} fallback position(s)",
                signature.display(self.graph),
                rank.0,
                rank.1
            );

            match best_rank {
                Some(current) if rank > current => continue,
                Some(current) if rank < current => best.clear(),
                _ => {}
            }
            best_rank = Some(rank);
            best.push(MethodCandidate {
                signature: signature.clone(),
                classes: signature.names(self.graph),
                handle: handle.clone(),
                distance,
            });
        }

        // Step 3: Unique winner, ambiguity, or nothing
        let call_names = || -> Vec<String> {
            call.iter().map(|a| a.name(self.graph).to_string()).collect()
        };
        match best.len() {
            0 => {
                debug!(
                    "no applicable method for `{}` with ({})",
                    table.name(),
                    display_call(self.graph, call)
                );
                Err(DispatchError::NoApplicableMethod(NoMatchError {
                    generic: table.name().to_string(),
                    call: call_names(),
                    registered: table.len(),
                }))
            }
            1 => {
                let winner = best.remove(0);
                debug!(
                    "resolved `{}` to ({}) at distance {}",
                    table.name(),
                    winner.classes.join(", "),
                    winner.distance
                );
                Ok(winner)
            }
            n => {
                debug!("{} methods tie for `{}`", n, table.name());
                Err(DispatchError::AmbiguousMethod(AmbiguityError {
                    generic: table.name().to_string(),
                    call: call_names(),
                    candidates: best,
                }))
            }
        }
    }

    /// Ancestor chains for every argument of a call.
    pub fn call_chains(&self, call: &[Arg]) -> Vec<AncestorChain> {
        call.iter()
            .map(|arg| match arg {
                Arg::Class(id) => self.graph.ancestors(*id),
                Arg::Missing => AncestorChain::missing(),
                Arg::Unknown => AncestorChain::unseen(),
            })
            .collect()
    }

    /// Total distance of `signature` against per-argument chains, or `None`
    /// if some declared class is not among the argument's ancestors.
    pub fn match_distance(signature: &Signature, chains: &[AncestorChain]) -> Option<u32> {
        if signature.arity() != chains.len() {
            return None;
        }
        signature
            .classes()
            .iter()
            .zip(chains)
            .map(|(&class, chain)| chain.distance(class))
            .sum()
    }

    /// Positions of `signature` that name `ANY` or `MISSING`.
    ///
    /// For a given call every applicable signature has a pseudo-class at an
    /// absent argument, so this only separates `ANY` at supplied arguments.
    pub fn fallback_positions(signature: &Signature) -> usize {
        signature.classes().iter().filter(|c| c.is_pseudo()).count()
    }
}
