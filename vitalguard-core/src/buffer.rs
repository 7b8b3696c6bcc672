//! Bounded Store-and-Forward Buffer for Undelivered Events
//!
//! ## Overview
//!
//! While the collector is unreachable, anomaly events wait here in detection
//! order. When the link recovers the agent replays them front to back.
//!
//! ```text
//!        push (delivery failed)                 pop (delivery confirmed)
//!               ↓                                        ↑
//! ┌─────┬─────┬─────┬─────┬─────┐               ┌─────┬──┴──┬─────┐
//! │ e5  │ e4  │ e3  │ e2  │ e1  │  ...flush...  │ e5  │ e4  │ e3  │
//! └─────┴─────┴─────┴─────┴─────┘               └─────┴─────┴─────┘
//!  newest                 oldest
//! ```
//!
//! ## Overflow Policy
//!
//! The buffer never grows beyond its capacity. When full, `push` refuses the
//! *new* event and hands it back to the caller: the oldest events are kept,
//! the newest are sacrificed. [`WindowStats`](crate::WindowStats) evicts the
//! other way round because only recent values describe the baseline; here
//! the events already waiting are the ones the collector has been missing
//! the longest.
//!
//! ## Removal Rules
//!
//! - Events leave only from the front
//! - Only after the sink confirmed delivery (`front` then `pop_front`)
//! - Contents are process-local and never persisted
//!
//! ## Thread Safety
//!
//! Not thread-safe. The buffer is owned by exactly one
//! [`EdgeAgent`](crate::EdgeAgent).

use std::collections::VecDeque;

use crate::events::AnomalyEvent;

/// Default buffer capacity (events)
pub const DEFAULT_BUFFER_CAPACITY: usize = 1000;

/// Buffer statistics
///
/// Track buffer health across an outage
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BufferStats {
    /// Total events accepted
    pub pushed: u64,
    /// Total events removed after delivery
    pub popped: u64,
    /// Events refused because the buffer was full
    pub dropped: u64,
    /// Maximum buffer depth seen
    pub max_depth: usize,
}

/// Capacity-bounded FIFO of undelivered anomaly events
#[derive(Debug, Clone)]
pub struct OfflineBuffer {
    events: VecDeque<AnomalyEvent>,
    capacity: usize,
    stats: BufferStats,
}

impl Default for OfflineBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_BUFFER_CAPACITY)
    }
}

impl OfflineBuffer {
    /// Create an empty buffer holding at most `capacity` events
    pub fn new(capacity: usize) -> Self {
        Self {
            events: VecDeque::new(),
            capacity,
            stats: BufferStats::default(),
        }
    }

    /// Append an event to the back
    ///
    /// Returns the event back as `Err` if the buffer is full.
    pub fn push(&mut self, event: AnomalyEvent) -> Result<(), AnomalyEvent> {
        if self.is_full() {
            self.stats.dropped += 1;
            return Err(event);
        }

        self.events.push_back(event);
        self.stats.pushed += 1;
        self.stats.max_depth = self.stats.max_depth.max(self.events.len());
        Ok(())
    }

    /// Oldest waiting event, without removing it
    pub fn front(&self) -> Option<&AnomalyEvent> {
        self.events.front()
    }

    /// Remove the oldest event once its delivery is confirmed
    pub fn pop_front(&mut self) -> Option<AnomalyEvent> {
        let event = self.events.pop_front()?;
        self.stats.popped += 1;
        Some(event)
    }

    /// Number of waiting events
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Check if nothing is waiting
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Check if the next push would be refused
    pub fn is_full(&self) -> bool {
        self.events.len() >= self.capacity
    }

    /// Maximum number of waiting events
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Iterate from oldest to newest
    pub fn iter(&self) -> impl Iterator<Item = &AnomalyEvent> + '_ {
        self.events.iter()
    }

    /// Get buffer statistics
    pub fn stats(&self) -> &BufferStats {
        &self.stats
    }
}
