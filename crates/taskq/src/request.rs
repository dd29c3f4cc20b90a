//! Pop requests and their results.

use std::collections::HashMap;

use crate::error::{QueueError, Result};

/// Arguments for [`TaskQueue::pop_with`](crate::TaskQueue::pop_with).
///
/// - `count`: weight threshold to reach. `None` pops a single item.
/// - `categories`: restricts selection to these categories. Unknown
///   categories are treated as empty.
/// - `ratios`: per-category weight of one popped item, parallel to
///   `categories`. Requires `count`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PopRequest {
    pub count: Option<usize>,
    pub categories: Option<Vec<String>>,
    pub ratios: Option<Vec<f64>>,
}

impl PopRequest {
    /// Creates a request for a single item from any category.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the weight threshold.
    pub fn with_count(mut self, count: usize) -> Self {
        self.count = Some(count);
        self
    }

    /// Restricts the request to the given categories.
    pub fn with_categories<I, S>(mut self, categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.categories = Some(categories.into_iter().map(Into::into).collect());
        self
    }

    /// Sets per-category ratios, parallel to the categories.
    pub fn with_ratios(mut self, ratios: impl IntoIterator<Item = f64>) -> Self {
        self.ratios = Some(ratios.into_iter().collect());
        self
    }

    /// Checks that ratios come with a count and line up with the categories.
    pub fn validate(&self) -> Result<()> {
        let Some(ratios) = &self.ratios else {
            return Ok(());
        };

        if self.count.is_none() {
            return Err(QueueError::InvalidArgument(
                "ratios require a count threshold".to_string(),
            ));
        }

        let categories = self.categories.as_ref().map(Vec::len).unwrap_or(0);
        if ratios.len() != categories {
            return Err(QueueError::InvalidArgument(format!(
                "got {} ratios for {} categories",
                ratios.len(),
                categories
            )));
        }

        if let Some(bad) = ratios.iter().find(|r| !r.is_finite() || **r < 0.0) {
            return Err(QueueError::InvalidArgument(format!(
                "ratio {bad} is not a finite non-negative number"
            )));
        }

        Ok(())
    }

    /// Weight that must be accumulated before the pop stops.
    pub(crate) fn threshold(&self) -> f64 {
        self.count.map(|c| c as f64).unwrap_or(1.0)
    }

    /// Per-category weights. The first ratio given for a category wins.
    pub(crate) fn weights(&self) -> HashMap<&str, f64> {
        let mut weights = HashMap::new();
        if let (Some(categories), Some(ratios)) = (&self.categories, &self.ratios) {
            for (category, ratio) in categories.iter().zip(ratios) {
                weights.entry(category.as_str()).or_insert(*ratio);
            }
        }
        weights
    }
}

/// Result of a pop: one optional item, or a list when a count was given.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Popped<T> {
    One(Option<T>),
    Many(Vec<T>),
}

impl<T> Popped<T> {
    /// Returns the single item, or the first of many.
    pub fn into_one(self) -> Option<T> {
        match self {
            Popped::One(item) => item,
            Popped::Many(items) => items.into_iter().next(),
        }
    }

    /// Returns all popped items.
    pub fn into_vec(self) -> Vec<T> {
        match self {
            Popped::One(item) => item.into_iter().collect(),
            Popped::Many(items) => items,
        }
    }

    /// Returns true if nothing was popped.
    pub fn is_empty(&self) -> bool {
        match self {
            Popped::One(item) => item.is_none(),
            Popped::Many(items) => items.is_empty(),
        }
    }
}
