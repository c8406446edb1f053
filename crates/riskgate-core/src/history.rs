//! Bounded, insertion-ordered history stores.
//!
//! Both the risk history and the event memory are fixed-capacity FIFO windows:
//! once full, each push evicts the oldest entry. Length never exceeds capacity.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

/// Fixed-capacity FIFO window.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundedHistory<T> {
    entries: VecDeque<T>,
    capacity: usize,
    /// Total pushes over the lifetime of the window (evicted ones included).
    pushed: u64,
}

impl<T> BoundedHistory<T> {
    /// Create an empty window. A zero capacity is bumped to one; controller
    /// configs reject zero before they get here.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
            pushed: 0,
        }
    }

    /// Append `value`, returning the evicted oldest entry if the window was full.
    pub fn push(&mut self, value: T) -> Option<T> {
        let evicted = if self.entries.len() >= self.capacity {
            self.entries.pop_front()
        } else {
            None
        };
        self.entries.push_back(value);
        self.pushed += 1;
        evicted
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[must_use]
    pub fn total_pushed(&self) -> u64 {
        self.pushed
    }

    /// Oldest-first iteration.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = &T> + '_ {
        self.entries.iter()
    }

    #[must_use]
    pub fn oldest(&self) -> Option<&T> {
        self.entries.front()
    }

    #[must_use]
    pub fn newest(&self) -> Option<&T> {
        self.entries.back()
    }

    /// Copy of the window, oldest first.
    #[must_use]
    pub fn to_vec(&self) -> Vec<T>
    where
        T: Clone,
    {
        self.entries.iter().cloned().collect()
    }
}

/// A consequential event kept in event memory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightedEvent {
    pub category: String,
    /// `event_weight(category) * risk`.
    pub weighted_risk: f64,
}

/// Window of past evaluated risks.
pub type RiskHistory = BoundedHistory<f64>;

/// Window of past weighted events.
pub type EventMemory = BoundedHistory<WeightedEvent>;

impl BoundedHistory<f64> {
    /// Mean of the stored risks, 0 when empty.
    #[must_use]
    pub fn mean(&self) -> f64 {
        if self.entries.is_empty() {
            return 0.0;
        }
        self.entries.iter().sum::<f64>() / self.entries.len() as f64
    }
}

impl BoundedHistory<WeightedEvent> {
    /// Sum of the weighted risks currently held; drives the threshold.
    #[must_use]
    pub fn memory_bias(&self) -> f64 {
        self.entries.iter().map(|e| e.weighted_risk).sum()
    }
}
