//! Priority queue with task categorisation support.
//!
//! This crate provides the `TaskQueue` for ordering units of work with:
//! - Priority ordering using per-category `BinaryHeap`s, FIFO within a priority
//! - Cheap cancellation: `discard` marks an item dead in O(1), its heap entry is
//!   skipped when it surfaces (lazy deletion) or reclaimed by `compact`
//! - Category filters and weighted multi-pop for fair sampling across work classes
//! - Pluggable full-queue policies (`Reject`, `DropIncoming`, `EvictRandom`)
//!
//! The queue is not synchronised. Wrap it in a `Mutex` to share it.
//!
//! # Example
//!
//! ```
//! use taskq::{EvictRandom, PopRequest, QueueConfig, TaskQueue};
//!
//! let config = QueueConfig::new().with_max_size(100);
//! let mut queue = TaskQueue::with_policy(config, EvictRandom::new());
//!
//! queue.push("thumbnail-1", 2, "images").unwrap();
//! queue.push("thumbnail-2", 2, "images").unwrap();
//! queue.push("transcode-1", 1, "video").unwrap();
//!
//! // Video items count double toward the requested weight.
//! let batch = queue
//!     .pop_weighted(2, &["images", "video"], &[1.0, 2.0])
//!     .unwrap();
//! assert_eq!(batch, vec!["transcode-1"]);
//!
//! let request = PopRequest::new().with_count(5).with_categories(["images"]);
//! let rest = queue.pop_with(&request).unwrap().into_vec();
//! assert_eq!(rest, vec!["thumbnail-1", "thumbnail-2"]);
//! ```

pub mod config;
pub mod entry;
pub mod error;
pub mod policy;
pub mod queue;
pub mod request;

pub use config::{QueueConfig, DEFAULT_CATEGORY, DEFAULT_PRIORITY};
pub use entry::{CategoryHeap, Entry};
pub use error::{QueueError, Result};
pub use policy::{DropIncoming, EvictRandom, FullPolicy, Reject, Signal};
pub use queue::{QueueState, QueueStats, TaskQueue};
pub use request::{PopRequest, Popped};
