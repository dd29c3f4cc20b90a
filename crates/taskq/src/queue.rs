//! TaskQueue - categorised priority queue with cheap cancellation.
//!
//! Layout:
//! - One `CategoryHeap` (binary min-heap) per category, created on first push
//! - A lookup index from item to `Handle { sequence, category }` for O(1)
//!   membership and discard
//! - Lazy deletion: discard only drops the lookup entry; the heap entry
//!   becomes a tombstone that is skipped when it surfaces during pop, or
//!   reclaimed by `compact`
//!
//! An entry is live exactly when the lookup index maps its payload to its own
//! sequence number. Re-pushing a discarded item therefore never revives the
//! old entry.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::hash::Hash;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::config::{QueueConfig, DEFAULT_PRIORITY};
use crate::entry::{CategoryHeap, Entry};
use crate::error::{QueueError, Result};
use crate::policy::{DropIncoming, FullPolicy, Signal};
use crate::request::{PopRequest, Popped};

/// Where a live item sits.
#[derive(Debug, Clone)]
struct Handle {
    sequence: u64,
    category: Arc<str>,
}

fn is_live_in<T, P>(lookup: &HashMap<T, Handle>, entry: &Entry<T, P>) -> bool
where
    T: Eq + Hash,
{
    lookup
        .get(entry.payload())
        .is_some_and(|handle| handle.sequence == entry.sequence())
}

/// Point-in-time counters of a queue.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueStats {
    /// Live items.
    pub size: usize,
    /// Physical entries, live and tombstoned.
    pub truesize: usize,
    /// Tombstoned entries awaiting removal.
    pub tombstones: usize,
    /// Category heaps, including empty ones.
    pub categories: usize,
}

/// Heaps, lookup index and counters of a [`TaskQueue`].
///
/// Kept apart from the full-queue policy so a policy can be handed mutable
/// access to the queue while the queue owns the policy.
#[derive(Debug, Clone)]
pub struct QueueState<T, P> {
    config: QueueConfig,
    heaps: BTreeMap<Arc<str>, CategoryHeap<T, P>>,
    lookup: HashMap<T, Handle>,
    size: usize,
    truesize: usize,
    next_sequence: u64,
}

impl<T, P> QueueState<T, P> {
    fn new(config: QueueConfig) -> Self {
        Self {
            config,
            heaps: BTreeMap::new(),
            lookup: HashMap::new(),
            size: 0,
            truesize: 0,
            next_sequence: 0,
        }
    }

    /// Returns the configuration.
    pub fn config(&self) -> &QueueConfig {
        &self.config
    }

    /// Configured capacity, `0` when unbounded.
    pub fn max_size(&self) -> usize {
        self.config.max_size
    }

    /// Number of live items.
    pub fn len(&self) -> usize {
        self.size
    }

    /// Returns true if no item is live.
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Number of physical entries, tombstones included.
    pub fn truesize(&self) -> usize {
        self.truesize
    }

    /// Number of tombstoned entries still held by the heaps.
    pub fn tombstones(&self) -> usize {
        self.truesize - self.size
    }

    /// Iterates over all category heaps, in category order.
    pub fn heaps(&self) -> impl Iterator<Item = (&str, &CategoryHeap<T, P>)> {
        self.heaps.iter().map(|(category, heap)| (&**category, heap))
    }

    /// Iterates over category heaps holding at least one entry.
    pub fn non_empty_heaps(&self) -> impl Iterator<Item = (&str, &CategoryHeap<T, P>)> {
        self.heaps().filter(|(_, heap)| !heap.is_empty())
    }

    /// Returns the heap of one category.
    pub fn heap(&self, category: &str) -> Option<&CategoryHeap<T, P>> {
        self.heaps.get(category)
    }

    /// Category labels currently in the mapping.
    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.heaps.keys().map(|category| &**category)
    }

    pub fn stats(&self) -> QueueStats {
        QueueStats {
            size: self.size,
            truesize: self.truesize,
            tombstones: self.tombstones(),
            categories: self.heaps.len(),
        }
    }
}

impl<T, P> QueueState<T, P>
where
    T: Eq + Hash + Clone,
    P: Ord,
{
    /// Returns true if `item` is live.
    pub fn exists(&self, item: &T) -> bool {
        self.lookup.contains_key(item)
    }

    /// Returns true if `entry` has not been discarded or superseded.
    pub fn is_live(&self, entry: &Entry<T, P>) -> bool {
        is_live_in(&self.lookup, entry)
    }

    /// Cancels a live item, leaving its entry in place as a tombstone.
    pub fn discard(&mut self, item: &T) -> Result<()> {
        let handle = self.lookup.remove(item).ok_or(QueueError::NotFound)?;
        self.size -= 1;
        debug!(
            category = %handle.category,
            sequence = handle.sequence,
            "discarded item"
        );
        Ok(())
    }

    /// Category of a live item.
    pub fn category_of(&self, item: &T) -> Option<&str> {
        self.lookup.get(item).map(|handle| &*handle.category)
    }

    /// Priority of a live item. Scans the item's category heap.
    pub fn priority_of(&self, item: &T) -> Option<&P> {
        let handle = self.lookup.get(item)?;
        self.heaps
            .get(&handle.category)?
            .iter()
            .find(|entry| entry.sequence() == handle.sequence)
            .map(Entry::priority)
    }

    /// Number of live items in one category. Scans the category heap.
    pub fn category_len(&self, category: &str) -> usize {
        self.heaps
            .get(category)
            .map(|heap| heap.iter().filter(|entry| self.is_live(entry)).count())
            .unwrap_or(0)
    }

    fn insert(&mut self, item: T, priority: P, category: &str) {
        let category = match self.heaps.get_key_value(category) {
            Some((existing, _)) => Arc::clone(existing),
            None => Arc::from(category),
        };
        let sequence = self.next_sequence;
        self.next_sequence += 1;

        self.lookup.insert(
            item.clone(),
            Handle {
                sequence,
                category: Arc::clone(&category),
            },
        );
        self.heaps
            .entry(Arc::clone(&category))
            .or_default()
            .push(Entry::new(priority, sequence, Arc::clone(&category), item));
        self.size += 1;
        self.truesize += 1;

        trace!(%category, sequence, "pushed item");
    }

    fn compact(&mut self) {
        let lookup = &self.lookup;
        let reclaimed: usize = self
            .heaps
            .values_mut()
            .map(|heap| heap.retain(|entry| is_live_in(lookup, entry)))
            .sum();
        self.truesize -= reclaimed;
        debug_assert_eq!(self.truesize, self.size);

        debug!(reclaimed, size = self.size, "compacted queue");
    }

    fn purge(&mut self) {
        let dropped = self.truesize;
        self.heaps.clear();
        self.lookup.clear();
        self.size = 0;
        self.truesize = 0;
        self.next_sequence = 0;

        debug!(dropped, "purged queue");
    }

    /// Resolves the heaps a pop may draw from.
    fn considered<S: AsRef<str>>(&self, categories: Option<&[S]>) -> Vec<Arc<str>> {
        match categories {
            None => self.heaps.keys().cloned().collect(),
            Some(names) => names
                .iter()
                .filter_map(|name| self.heaps.get_key_value(name.as_ref()))
                .map(|(category, _)| Arc::clone(category))
                .collect(),
        }
    }

    /// Category whose head entry is the global minimum among `considered`.
    fn min_category(&self, considered: &[Arc<str>]) -> Option<Arc<str>> {
        considered
            .iter()
            .filter_map(|category| {
                self.heaps
                    .get(category)
                    .and_then(CategoryHeap::peek)
                    .map(|head| (category, head))
            })
            .min_by(|(_, a), (_, b)| a.cmp(b))
            .map(|(category, _)| Arc::clone(category))
    }

    /// Physically removes the global minimum entry, live or not.
    fn take_min(&mut self, considered: &[Arc<str>]) -> Option<Entry<T, P>> {
        let category = self.min_category(considered)?;
        let entry = self.heaps.get_mut(&category)?.pop()?;
        self.truesize -= 1;
        Some(entry)
    }

    /// Pops live items until their summed weight reaches `threshold` or the
    /// considered heaps run dry.
    fn drain(
        &mut self,
        considered: &[Arc<str>],
        threshold: f64,
        weights: &HashMap<&str, f64>,
    ) -> Vec<T> {
        let mut items = Vec::new();
        let mut value = 0.0;

        while value < threshold {
            let Some(entry) = self.take_min(considered) else {
                break;
            };

            if !self.is_live(&entry) {
                trace!(
                    category = entry.category(),
                    sequence = entry.sequence(),
                    "skipped tombstone"
                );
                continue;
            }

            value += weights.get(entry.category()).copied().unwrap_or(1.0);
            let item = entry.into_payload();
            self.lookup.remove(&item);
            self.size -= 1;
            items.push(item);
        }

        items
    }

    /// Drops tombstones sitting at the heads of `considered` heaps until the
    /// global minimum is live, returning its category.
    fn live_min_category(&mut self, considered: &[Arc<str>]) -> Option<Arc<str>> {
        loop {
            let category = self.min_category(considered)?;
            let heap = self.heaps.get(&category)?;
            if heap.peek().is_some_and(|head| self.is_live(head)) {
                return Some(category);
            }
            if let Some(tombstone) = self.heaps.get_mut(&category).and_then(CategoryHeap::pop) {
                self.truesize -= 1;
                trace!(
                    category = tombstone.category(),
                    sequence = tombstone.sequence(),
                    "dropped tombstone while peeking"
                );
            }
        }
    }
}

/// Priority queue with task categorisation support.
///
/// # Priority Ordering
///
/// Lower priority values are retrieved first. Equal priorities are retrieved
/// in push order, across categories as well as within one.
///
/// # Capacity
///
/// When `max_size` is non-zero and that many items are live, each push first
/// consults the [`FullPolicy`], then checks for duplicates.
///
/// # Concurrency
///
/// Not synchronised. Every mutating call takes `&mut self`; share the queue
/// between threads behind a `Mutex`.
///
/// # Example
///
/// ```
/// use taskq::TaskQueue;
///
/// let mut queue = TaskQueue::new();
/// queue.push("render", 2, "gpu").unwrap();
/// queue.push("resize", 1, "cpu").unwrap();
/// queue.push("encode", 1, "gpu").unwrap();
///
/// queue.discard(&"encode").unwrap();
/// assert_eq!(queue.pop(), Some("resize"));
/// assert_eq!(queue.pop_from(&["gpu"]), Some("render"));
/// assert!(queue.is_empty());
/// ```
pub struct TaskQueue<T, P> {
    state: QueueState<T, P>,
    policy: Box<dyn FullPolicy<T, P> + Send>,
}

impl<T, P> fmt::Debug for TaskQueue<T, P>
where
    T: fmt::Debug,
    P: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskQueue")
            .field("state", &self.state)
            .field("policy", &"<policy>")
            .finish()
    }
}

impl<T, P> Default for TaskQueue<T, P>
where
    T: Eq + Hash + Clone,
    P: Ord,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T, P> TaskQueue<T, P>
where
    T: Eq + Hash + Clone,
    P: Ord,
{
    /// Creates an unbounded queue.
    pub fn new() -> Self {
        Self::with_config(QueueConfig::default())
    }

    /// Creates a queue from a config, dropping incoming items when full.
    pub fn with_config(config: QueueConfig) -> Self {
        Self::with_policy(config, DropIncoming)
    }

    /// Creates a queue from a config and a full-queue policy.
    pub fn with_policy<F>(config: QueueConfig, policy: F) -> Self
    where
        F: FullPolicy<T, P> + Send + 'static,
    {
        Self {
            state: QueueState::new(config),
            policy: Box::new(policy),
        }
    }

    /// Creates a queue holding at most `max_size` live items.
    pub fn bounded<F>(max_size: usize, policy: F) -> Self
    where
        F: FullPolicy<T, P> + Send + 'static,
    {
        Self::with_policy(QueueConfig::new().with_max_size(max_size), policy)
    }

    /// Replaces the full-queue policy.
    pub fn set_policy<F>(&mut self, policy: F)
    where
        F: FullPolicy<T, P> + Send + 'static,
    {
        self.policy = Box::new(policy);
    }

    /// Returns the configuration.
    pub fn config(&self) -> &QueueConfig {
        self.state.config()
    }

    /// Read-only view of the queue internals.
    pub fn state(&self) -> &QueueState<T, P> {
        &self.state
    }

    /// Adds an item to a category.
    ///
    /// # Errors
    ///
    /// - Whatever the full-queue policy returns when the queue is at capacity
    ///   (`QueueOverflow` for [`Reject`](crate::Reject))
    /// - `DuplicateItem` if `item` is already live
    ///
    /// The capacity check runs first: a policy may evict the very item that
    /// would otherwise be reported as a duplicate.
    pub fn push(&mut self, item: T, priority: P, category: impl AsRef<str>) -> Result<()> {
        if self.state.config.is_bounded() && self.state.size >= self.state.config.max_size {
            match self.policy.on_full(&mut self.state)? {
                Signal::Continue => {}
                Signal::Stop => return Ok(()),
            }
        }

        if self.state.exists(&item) {
            return Err(QueueError::DuplicateItem);
        }

        self.state.insert(item, priority, category.as_ref());
        Ok(())
    }

    /// Adds an item to the default category.
    pub fn push_with_priority(&mut self, item: T, priority: P) -> Result<()> {
        let category = self.state.config.default_category.clone();
        self.push(item, priority, category)
    }

    /// Returns true if `item` is live.
    pub fn exists(&self, item: &T) -> bool {
        self.state.exists(item)
    }

    /// Cancels a live item.
    ///
    /// The item's heap entry stays behind as a tombstone until it is popped
    /// through or [`compact`](Self::compact) runs, so `truesize` is unchanged.
    pub fn discard(&mut self, item: &T) -> Result<()> {
        self.state.discard(item)
    }

    /// Rebuilds every heap without its tombstones.
    ///
    /// Afterwards `truesize() == len()`. Worth calling when discards greatly
    /// outnumber pops.
    pub fn compact(&mut self) {
        self.state.compact();
    }

    /// Removes everything.
    pub fn purge(&mut self) {
        self.state.purge();
    }

    /// Pops according to a [`PopRequest`].
    ///
    /// Returns [`Popped::One`] when the request has no count, otherwise
    /// [`Popped::Many`], which may hold fewer items than asked for.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` if ratios are given without a count, do not line up
    /// with the categories, or are negative or non-finite. Nothing is popped
    /// in that case.
    pub fn pop_with(&mut self, request: &PopRequest) -> Result<Popped<T>> {
        request.validate()?;

        let considered = self.state.considered(request.categories.as_deref());
        let items = self
            .state
            .drain(&considered, request.threshold(), &request.weights());

        Ok(match request.count {
            None => Popped::One(items.into_iter().next()),
            Some(_) => Popped::Many(items),
        })
    }

    /// Pops the highest-precedence item from any category.
    pub fn pop(&mut self) -> Option<T> {
        self.pop_one(None::<&[&str]>)
    }

    /// Pops the highest-precedence item among `categories`.
    pub fn pop_from<S: AsRef<str>>(&mut self, categories: &[S]) -> Option<T> {
        self.pop_one(Some(categories))
    }

    /// Pops up to `count` items from any category.
    pub fn pop_many(&mut self, count: usize) -> Vec<T> {
        let considered = self.state.considered(None::<&[&str]>);
        self.state
            .drain(&considered, count as f64, &HashMap::new())
    }

    /// Pops up to `count` items among `categories`.
    pub fn pop_many_from<S: AsRef<str>>(&mut self, count: usize, categories: &[S]) -> Vec<T> {
        let considered = self.state.considered(Some(categories));
        self.state
            .drain(&considered, count as f64, &HashMap::new())
    }

    /// Pops items among `categories` until their summed ratios reach `count`.
    ///
    /// Each item counts for the ratio at the same position as its category.
    pub fn pop_weighted<S: AsRef<str>>(
        &mut self,
        count: usize,
        categories: &[S],
        ratios: &[f64],
    ) -> Result<Vec<T>> {
        let request = PopRequest::new()
            .with_count(count)
            .with_categories(categories.iter().map(|c| c.as_ref().to_string()))
            .with_ratios(ratios.iter().copied());
        self.pop_with(&request).map(Popped::into_vec)
    }

    fn pop_one<S: AsRef<str>>(&mut self, categories: Option<&[S]>) -> Option<T> {
        let considered = self.state.considered(categories);
        self.state
            .drain(&considered, 1.0, &HashMap::new())
            .into_iter()
            .next()
    }

    /// Returns the item [`pop`](Self::pop) would return, without removing it.
    ///
    /// Tombstones found at the top of the heaps are dropped on the way.
    pub fn peek(&mut self) -> Option<&T> {
        self.peek_among(None::<&[&str]>)
    }

    /// Returns the item [`pop_from`](Self::pop_from) would return.
    pub fn peek_from<S: AsRef<str>>(&mut self, categories: &[S]) -> Option<&T> {
        self.peek_among(Some(categories))
    }

    fn peek_among<S: AsRef<str>>(&mut self, categories: Option<&[S]>) -> Option<&T> {
        let considered = self.state.considered(categories);
        let category = self.state.live_min_category(&considered)?;
        self.state
            .heaps
            .get(&category)
            .and_then(CategoryHeap::peek)
            .map(Entry::payload)
    }

    /// Number of live items.
    pub fn len(&self) -> usize {
        self.state.len()
    }

    /// Returns true if no item is live.
    pub fn is_empty(&self) -> bool {
        self.state.is_empty()
    }

    /// Number of physical entries, tombstones included.
    pub fn truesize(&self) -> usize {
        self.state.truesize()
    }

    /// Number of tombstoned entries awaiting removal.
    pub fn tombstones(&self) -> usize {
        self.state.tombstones()
    }

    /// Configured capacity, `0` when unbounded.
    pub fn max_size(&self) -> usize {
        self.state.max_size()
    }

    /// Number of live items in one category.
    pub fn category_len(&self, category: &str) -> usize {
        self.state.category_len(category)
    }

    /// Category labels that have been pushed to since the last purge.
    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.state.categories()
    }

    /// Category of a live item.
    pub fn category_of(&self, item: &T) -> Option<&str> {
        self.state.category_of(item)
    }

    /// Priority of a live item.
    pub fn priority_of(&self, item: &T) -> Option<&P> {
        self.state.priority_of(item)
    }

    pub fn stats(&self) -> QueueStats {
        self.state.stats()
    }
}

impl<T, P> TaskQueue<T, P>
where
    T: Eq + Hash + Clone,
    P: Ord + From<u8>,
{
    /// Adds an item with priority [`DEFAULT_PRIORITY`] to the default category.
    ///
    /// An explicit priority of `0` therefore runs ahead of items pushed here.
    pub fn push_item(&mut self, item: T) -> Result<()> {
        self.push_with_priority(item, P::from(DEFAULT_PRIORITY))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::{EvictRandom, Reject};

    fn make_queue() -> TaskQueue<&'static str, i32> {
        TaskQueue::new()
    }

    #[test]
    fn test_push_and_pop() {
        let mut queue = make_queue();
        queue.push("a", 1, "default").unwrap();

        assert_eq!(queue.len(), 1);
        assert!(queue.exists(&"a"));
        assert_eq!(queue.pop(), Some("a"));
        assert!(!queue.exists(&"a"));
        assert!(queue.is_empty());
    }

    #[test]
    fn test_pop_empty() {
        let mut queue = make_queue();
        assert_eq!(queue.pop(), None);
        assert!(queue.pop_many(3).is_empty());
    }

    #[test]
    fn test_discard_leaves_tombstone() {
        let mut queue = make_queue();
        queue.push("a", 1, "foo").unwrap();
        queue.push("b", 2, "foo").unwrap();

        queue.discard(&"a").unwrap();
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.truesize(), 2);
        assert_eq!(queue.tombstones(), 1);

        assert_eq!(queue.pop(), Some("b"));
        assert_eq!(queue.truesize(), 0);
    }

    #[test]
    fn test_discard_not_found() {
        let mut queue = make_queue();
        assert_eq!(queue.discard(&"missing"), Err(QueueError::NotFound));

        queue.push("a", 1, "foo").unwrap();
        queue.discard(&"a").unwrap();
        assert_eq!(queue.discard(&"a"), Err(QueueError::NotFound));
    }

    #[test]
    fn test_repush_does_not_revive_tombstone() {
        let mut queue = make_queue();
        queue.push("x", 1, "foo").unwrap();
        queue.push("y", 2, "foo").unwrap();
        queue.discard(&"x").unwrap();
        queue.push("x", 3, "foo").unwrap();

        assert_eq!(queue.len(), 2);
        assert_eq!(queue.truesize(), 3);
        assert_eq!(queue.priority_of(&"x"), Some(&3));
        assert_eq!(queue.pop_many(2), vec!["y", "x"]);
        assert_eq!(queue.truesize(), 0);
    }

    #[test]
    fn test_compact_reclaims_tombstones() {
        let mut queue = make_queue();
        for (i, item) in ["a", "b", "c", "d"].into_iter().enumerate() {
            let category = if i % 2 == 0 { "even" } else { "odd" };
            queue.push(item, i as i32, category).unwrap();
        }
        queue.discard(&"a").unwrap();
        queue.discard(&"d").unwrap();

        queue.compact();
        assert_eq!(queue.truesize(), queue.len());
        assert_eq!(queue.tombstones(), 0);

        queue.compact();
        assert_eq!(queue.truesize(), 2);
        assert_eq!(queue.pop_many(2), vec!["b", "c"]);
    }

    #[test]
    fn test_purge_resets_everything() {
        let mut queue = make_queue();
        queue.push("a", 1, "foo").unwrap();
        queue.push("b", 1, "bar").unwrap();
        queue.discard(&"b").unwrap();

        queue.purge();
        assert_eq!(queue.stats(), QueueStats::default());
        assert!(!queue.exists(&"a"));
        assert_eq!(queue.pop(), None);

        queue.push("a", 1, "foo").unwrap();
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn test_cross_category_fifo() {
        let mut queue = make_queue();
        queue.push("first", 1, "foo").unwrap();
        queue.push("second", 1, "bar").unwrap();
        queue.push("third", 1, "foo").unwrap();

        assert_eq!(queue.pop_many(3), vec!["first", "second", "third"]);
    }

    #[test]
    fn test_pop_with_single_and_many() {
        let mut queue = make_queue();
        queue.push("a", 1, "foo").unwrap();
        queue.push("b", 2, "foo").unwrap();

        assert_eq!(
            queue.pop_with(&PopRequest::new()).unwrap(),
            Popped::One(Some("a"))
        );
        assert_eq!(
            queue.pop_with(&PopRequest::new().with_count(5)).unwrap(),
            Popped::Many(vec!["b"])
        );
        assert_eq!(
            queue.pop_with(&PopRequest::new()).unwrap(),
            Popped::One(None)
        );
    }

    #[test]
    fn test_pop_with_zero_count_pops_nothing() {
        let mut queue = make_queue();
        queue.push("a", 1, "foo").unwrap();

        assert_eq!(
            queue.pop_with(&PopRequest::new().with_count(0)).unwrap(),
            Popped::Many(vec![])
        );
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn test_invalid_request_leaves_queue_untouched() {
        let mut queue = make_queue();
        queue.push("a", 1, "foo").unwrap();

        let request = PopRequest::new().with_categories(["foo"]).with_ratios([1.0]);
        assert!(matches!(
            queue.pop_with(&request),
            Err(QueueError::InvalidArgument(_))
        ));
        assert!(matches!(
            queue.pop_weighted(1, &["foo", "bar"], &[1.0]),
            Err(QueueError::InvalidArgument(_))
        ));
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn test_tombstones_do_not_count_toward_threshold() {
        let mut queue = make_queue();
        queue.push("a", 1, "foo").unwrap();
        queue.push("b", 2, "foo").unwrap();
        queue.push("c", 3, "foo").unwrap();
        queue.discard(&"a").unwrap();

        assert_eq!(queue.pop_many(2), vec!["b", "c"]);
        assert_eq!(queue.truesize(), 0);
    }

    #[test]
    fn test_peek_matches_pop() {
        let mut queue = make_queue();
        queue.push("a", 1, "foo").unwrap();
        queue.push("b", 2, "bar").unwrap();
        queue.push("c", 0, "bar").unwrap();
        queue.discard(&"c").unwrap();

        assert_eq!(queue.peek(), Some(&"a"));
        // The discarded head of "bar" was dropped on the way.
        assert_eq!(queue.truesize(), 2);
        assert_eq!(queue.len(), 2);

        assert_eq!(queue.peek_from(&["bar"]), Some(&"b"));
        assert_eq!(queue.peek_from(&["missing"]), None);
        assert_eq!(queue.pop(), Some("a"));
    }

    #[test]
    fn test_category_queries() {
        let mut queue = make_queue();
        queue.push("a", 5, "foo").unwrap();
        queue.push("b", 1, "foo").unwrap();
        queue.push("c", 1, "bar").unwrap();
        queue.discard(&"a").unwrap();

        assert_eq!(queue.category_len("foo"), 1);
        assert_eq!(queue.category_len("bar"), 1);
        assert_eq!(queue.category_len("nope"), 0);
        assert_eq!(queue.category_of(&"c"), Some("bar"));
        assert_eq!(queue.category_of(&"a"), None);
        assert_eq!(queue.priority_of(&"b"), Some(&1));
        assert_eq!(queue.categories().collect::<Vec<_>>(), vec!["bar", "foo"]);
    }

    #[test]
    fn test_empty_category_heap_remains() {
        let mut queue = make_queue();
        queue.push("a", 1, "foo").unwrap();
        queue.pop();

        assert_eq!(queue.stats().categories, 1);
        assert_eq!(queue.pop_from(&["foo"]), None);
    }

    #[test]
    fn test_default_category_and_priority() {
        let mut queue: TaskQueue<&str, i32> =
            TaskQueue::with_config(QueueConfig::new().with_default_category("misc"));
        queue.push_item("a").unwrap();
        queue.push_with_priority("b", -1).unwrap();

        assert_eq!(queue.category_of(&"a"), Some("misc"));
        assert_eq!(queue.priority_of(&"a"), Some(&1));
        assert_eq!(queue.pop_from(&["misc"]), Some("b"));
    }

    #[test]
    fn test_zero_priority_runs_before_default() {
        let mut queue = make_queue();
        queue.push_item("default").unwrap();
        queue.push_with_priority("urgent", 0).unwrap();
        queue.push_with_priority("later", 1).unwrap();

        assert_eq!(queue.pop(), Some("urgent"));
        assert_eq!(queue.pop(), Some("default"));
        assert_eq!(queue.pop(), Some("later"));
    }

    #[test]
    fn test_overflow_checked_before_duplicate() {
        let mut queue = TaskQueue::bounded(1, Reject);
        queue.push("a", 1, "foo").unwrap();

        assert_eq!(
            queue.push("a", 1, "foo"),
            Err(QueueError::QueueOverflow { max_size: 1 })
        );
    }

    #[test]
    fn test_eviction_can_clear_duplicate() {
        let mut queue = TaskQueue::bounded(1, EvictRandom::seeded(3));
        queue.push("a", 1, "foo").unwrap();

        // The only live item is evicted before the duplicate check runs.
        queue.push("a", 2, "foo").unwrap();
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.priority_of(&"a"), Some(&2));
    }

    #[test]
    fn test_set_policy() {
        let mut queue = TaskQueue::bounded(1, DropIncoming);
        queue.push("a", 1, "foo").unwrap();
        queue.push("b", 1, "foo").unwrap();
        assert_eq!(queue.len(), 1);

        queue.set_policy(Reject);
        assert!(queue.push("b", 1, "foo").is_err());
    }

    #[test]
    fn test_stats() {
        let mut queue = make_queue();
        queue.push("a", 1, "foo").unwrap();
        queue.push("b", 1, "bar").unwrap();
        queue.discard(&"a").unwrap();

        let stats = queue.stats();
        assert_eq!(stats.size, 1);
        assert_eq!(stats.truesize, 2);
        assert_eq!(stats.tombstones, 1);
        assert_eq!(stats.categories, 2);
    }

    #[test]
    fn test_queue_is_send() {
        fn assert_send<S: Send>() {}
        assert_send::<TaskQueue<String, u64>>();
    }
}
