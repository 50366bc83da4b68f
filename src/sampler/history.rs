//! Bounded pointer history
//!
//! Ring-buffer of position samples, oldest first. The newest entry always has
//! the largest timestamp; equal timestamps coalesce into one entry.

use std::collections::VecDeque;
use std::sync::Arc;

use crate::intent::PositionSample;

/// Immutable view of the history handed to listeners
pub type HistorySnapshot = Arc<[PositionSample]>;

/// Result of recording one sample
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordOutcome {
    /// Appended as the newest entry
    Appended,
    /// Replaced the newest entry (same timestamp)
    Coalesced,
    /// Dropped because it is older than the newest entry or not finite
    Rejected,
}

/// Fixed-capacity history of position samples
#[derive(Debug, Clone)]
pub struct HistoryBuffer {
    samples: VecDeque<PositionSample>,
    capacity: usize,
}

impl HistoryBuffer {
    /// Create an empty buffer
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Maximum number of entries kept
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Current number of entries
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// True if no samples have been recorded
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Newest sample, if any
    pub fn latest(&self) -> Option<&PositionSample> {
        self.samples.back()
    }

    /// Record a sample, evicting the oldest entry once full
    pub fn push(&mut self, sample: PositionSample) -> RecordOutcome {
        // A non-finite timestamp would order after every later sample
        if !(sample.t.is_finite() && sample.x.is_finite() && sample.y.is_finite()) {
            return RecordOutcome::Rejected;
        }

        if let Some(last) = self.samples.back_mut() {
            if sample.t < last.t {
                return RecordOutcome::Rejected;
            }
            if sample.t == last.t {
                *last = sample;
                return RecordOutcome::Coalesced;
            }
        }

        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(sample);
        RecordOutcome::Appended
    }

    /// Drop all samples
    pub fn clear(&mut self) {
        self.samples.clear();
    }

    /// Copy the current contents into a shareable snapshot
    pub fn snapshot(&self) -> HistorySnapshot {
        self.samples.iter().copied().collect()
    }
}
