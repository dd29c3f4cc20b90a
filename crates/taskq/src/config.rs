//! Queue configuration.

use serde::{Deserialize, Serialize};

/// Category used when a push does not name one.
pub const DEFAULT_CATEGORY: &str = "default";

/// Priority used when a push does not name one.
pub const DEFAULT_PRIORITY: u8 = 1;

/// Configuration for a [`TaskQueue`](crate::TaskQueue).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueConfig {
    /// Maximum number of live items. `0` means unbounded.
    pub max_size: usize,
    /// Category assigned by the convenience push methods.
    pub default_category: String,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            max_size: 0,
            default_category: DEFAULT_CATEGORY.to_string(),
        }
    }
}

impl QueueConfig {
    /// Creates a new config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the maximum number of live items (`0` for unbounded).
    pub fn with_max_size(mut self, max_size: usize) -> Self {
        self.max_size = max_size;
        self
    }

    /// Sets the default category.
    pub fn with_default_category(mut self, category: impl Into<String>) -> Self {
        self.default_category = category.into();
        self
    }

    /// Returns true if a capacity limit is configured.
    pub fn is_bounded(&self) -> bool {
        self.max_size > 0
    }
}
