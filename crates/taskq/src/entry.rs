//! Heap entries and per-category heaps.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;
use std::sync::Arc;

/// A queued item together with its ordering metadata.
///
/// # Ordering Rules
///
/// 1. Lower priority value comes first
/// 2. For same priority, lower sequence (earlier push) comes first
///
/// The payload never takes part in ordering, so `T` needs no `Ord`.
#[derive(Debug, Clone)]
pub struct Entry<T, P> {
    priority: P,
    sequence: u64,
    category: Arc<str>,
    payload: T,
}

impl<T, P> Entry<T, P> {
    pub(crate) fn new(priority: P, sequence: u64, category: Arc<str>, payload: T) -> Self {
        Self {
            priority,
            sequence,
            category,
            payload,
        }
    }

    /// Priority the item was pushed with.
    pub fn priority(&self) -> &P {
        &self.priority
    }

    /// Tie-breaker assigned at push time.
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Category the item was pushed into.
    pub fn category(&self) -> &str {
        &self.category
    }

    /// The queued item. For a tombstone this is the value that was discarded.
    pub fn payload(&self) -> &T {
        &self.payload
    }

    pub(crate) fn into_payload(self) -> T {
        self.payload
    }
}

impl<T, P: Ord> PartialEq for Entry<T, P> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl<T, P: Ord> Eq for Entry<T, P> {}

impl<T, P: Ord> PartialOrd for Entry<T, P> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T, P: Ord> Ord for Entry<T, P> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.priority
            .cmp(&other.priority)
            .then_with(|| self.sequence.cmp(&other.sequence))
    }
}

/// Binary min-heap holding the entries of one category.
///
/// Wraps entries in `Reverse` because `BinaryHeap` is a max-heap. Entries
/// stay in the heap after they are discarded; liveness is decided by the
/// queue's lookup index, not by the heap.
#[derive(Debug, Clone)]
pub struct CategoryHeap<T, P> {
    entries: BinaryHeap<Reverse<Entry<T, P>>>,
}

impl<T, P: Ord> Default for CategoryHeap<T, P> {
    fn default() -> Self {
        Self {
            entries: BinaryHeap::new(),
        }
    }
}

impl<T, P: Ord> CategoryHeap<T, P> {
    pub(crate) fn push(&mut self, entry: Entry<T, P>) {
        self.entries.push(Reverse(entry));
    }

    pub(crate) fn pop(&mut self) -> Option<Entry<T, P>> {
        self.entries.pop().map(|Reverse(entry)| entry)
    }

    /// Returns the smallest entry, live or not.
    pub fn peek(&self) -> Option<&Entry<T, P>> {
        self.entries.peek().map(|Reverse(entry)| entry)
    }

    /// Keeps only entries matching `keep`, restoring heap order.
    ///
    /// Returns the number of entries removed.
    pub(crate) fn retain(&mut self, mut keep: impl FnMut(&Entry<T, P>) -> bool) -> usize {
        let before = self.entries.len();
        self.entries.retain(|Reverse(entry)| keep(entry));
        before - self.entries.len()
    }
}

impl<T, P> CategoryHeap<T, P> {
    /// Number of physical entries, tombstones included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the heap holds no entries at all.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the entry stored at `slot` of the backing array.
    ///
    /// Slots follow heap layout, not priority order.
    pub fn get(&self, slot: usize) -> Option<&Entry<T, P>> {
        self.entries.as_slice().get(slot).map(|Reverse(entry)| entry)
    }

    /// Iterates over all entries in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = &Entry<T, P>> {
        self.entries.iter().map(|Reverse(entry)| entry)
    }
}
