//! Full-queue policies.
//!
//! A policy is consulted by [`TaskQueue::push`](crate::TaskQueue::push) only
//! when the queue already holds `max_size` live items. It receives mutable
//! access to the queue state and decides what happens to the incoming item:
//!
//! - [`Reject`]: fail the push with [`QueueError::QueueOverflow`]
//! - [`DropIncoming`]: silently drop the incoming item (the default)
//! - [`EvictRandom`]: discard a random live item to make room
//!
//! Any `FnMut(&mut QueueState<T, P>) -> Result<Signal>` closure is a policy too.

use std::hash::Hash;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, RngCore, SeedableRng};
use tracing::{debug, warn};

use crate::entry::CategoryHeap;
use crate::error::{QueueError, Result};
use crate::queue::QueueState;

/// What a push should do after the policy ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    /// Insert the incoming item.
    Continue,
    /// Drop the incoming item; the push succeeds without inserting.
    Stop,
}

/// Strategy invoked when a push finds the queue at capacity.
pub trait FullPolicy<T, P> {
    /// Decides how to proceed. Returning an error aborts the push with it.
    fn on_full(&mut self, queue: &mut QueueState<T, P>) -> Result<Signal>;
}

impl<T, P, F> FullPolicy<T, P> for F
where
    F: FnMut(&mut QueueState<T, P>) -> Result<Signal>,
{
    fn on_full(&mut self, queue: &mut QueueState<T, P>) -> Result<Signal> {
        self(queue)
    }
}

/// Fails the push so the caller has to handle the overflow.
#[derive(Debug, Clone, Copy, Default)]
pub struct Reject;

impl<T, P> FullPolicy<T, P> for Reject {
    fn on_full(&mut self, queue: &mut QueueState<T, P>) -> Result<Signal> {
        let max_size = queue.max_size();
        warn!(max_size, "queue full, rejecting push");
        Err(QueueError::QueueOverflow { max_size })
    }
}

/// Drops the incoming item, leaving the queue unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct DropIncoming;

impl<T, P> FullPolicy<T, P> for DropIncoming {
    fn on_full(&mut self, queue: &mut QueueState<T, P>) -> Result<Signal> {
        debug!(max_size = queue.max_size(), "queue full, dropping incoming item");
        Ok(Signal::Stop)
    }
}

/// Discards a random live item so the incoming one can be inserted.
///
/// Useful when the queue feeds optional work and an even sample of the
/// pushed items is wanted. Sampling is two-stage: a uniformly random
/// non-empty category, then a uniformly random slot of that category's heap,
/// retried until the slot holds a live entry. Items in small categories are
/// therefore more likely to be evicted than items in large ones.
#[derive(Debug, Clone)]
pub struct EvictRandom<R = StdRng> {
    rng: R,
}

impl EvictRandom<StdRng> {
    /// Creates the policy with an entropy-seeded generator.
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Creates the policy with a fixed seed, for reproducible eviction.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for EvictRandom<StdRng> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: RngCore> EvictRandom<R> {
    /// Creates the policy with a caller-supplied generator.
    pub fn with_rng(rng: R) -> Self {
        Self { rng }
    }
}

impl<T, P, R> FullPolicy<T, P> for EvictRandom<R>
where
    T: Eq + Hash + Clone,
    P: Ord,
    R: RngCore,
{
    fn on_full(&mut self, queue: &mut QueueState<T, P>) -> Result<Signal> {
        // No live item means no tombstone-only loop either: nothing to evict.
        if queue.is_empty() {
            return Ok(Signal::Continue);
        }

        let (victim, category, sequence) = {
            let heaps: Vec<&CategoryHeap<T, P>> =
                queue.non_empty_heaps().map(|(_, heap)| heap).collect();

            loop {
                let Some(heap) = heaps.choose(&mut self.rng) else {
                    return Ok(Signal::Continue);
                };
                let slot = self.rng.gen_range(0..heap.len());
                if let Some(entry) = heap.get(slot).filter(|e| queue.is_live(e)) {
                    break (
                        entry.payload().clone(),
                        entry.category().to_string(),
                        entry.sequence(),
                    );
                }
            }
        };

        queue.discard(&victim)?;
        debug!(%category, sequence, "queue full, evicted random item");
        Ok(Signal::Continue)
    }
}
