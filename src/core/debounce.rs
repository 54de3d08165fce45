//! Shared rate-limiting and bounded-history primitives.
//!
//! Every classifier re-evaluates on its own wall-clock cadence and keeps a
//! small rolling history of recent results. Both patterns live here once
//! instead of being duplicated per classifier.

use chrono::{DateTime, Duration, Utc};
use std::collections::VecDeque;

/// Whether enough time has passed since the last evaluation to process again.
///
/// Pure function: a `None` last-processed time always permits processing.
pub fn should_process(
    now: DateTime<Utc>,
    last_processed: Option<DateTime<Utc>>,
    min_interval: Duration,
) -> bool {
    match last_processed {
        Some(last) => now - last > min_interval,
        None => true,
    }
}

/// A per-classifier evaluation gate owning its last-processed timestamp.
#[derive(Debug, Clone)]
pub struct Throttle {
    min_interval: Duration,
    last_processed: Option<DateTime<Utc>>,
}

impl Throttle {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_processed: None,
        }
    }

    /// Check the gate and, if open, record `now` as the evaluation time.
    pub fn permit(&mut self, now: DateTime<Utc>) -> bool {
        if should_process(now, self.last_processed, self.min_interval) {
            self.last_processed = Some(now);
            true
        } else {
            false
        }
    }

    /// Time elapsed since the last permitted evaluation, if any.
    pub fn elapsed_since_last(&self, now: DateTime<Utc>) -> Option<Duration> {
        self.last_processed.map(|last| now - last)
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }
}

/// Bounded rolling history with ring-buffer semantics.
///
/// Pushing beyond capacity evicts the oldest entry first.
#[derive(Debug, Clone)]
pub struct History<T> {
    buf: VecDeque<T>,
    capacity: usize,
}

impl<T> History<T> {
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "history capacity must be non-zero");
        Self {
            buf: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, value: T) {
        if self.buf.len() == self.capacity {
            self.buf.pop_front();
        }
        self.buf.push_back(value);
    }

    pub fn clear(&mut self) {
        self.buf.clear();
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.buf.len() == self.capacity
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.buf.iter()
    }

    /// The most recent `n` entries, oldest first.
    pub fn last_n(&self, n: usize) -> impl Iterator<Item = &T> {
        self.buf.iter().skip(self.buf.len().saturating_sub(n))
    }
}

impl History<bool> {
    /// Fraction of `true` entries; 0 for an empty history.
    pub fn true_fraction(&self) -> f64 {
        if self.buf.is_empty() {
            return 0.0;
        }
        let trues = self.buf.iter().filter(|&&v| v).count();
        trues as f64 / self.buf.len() as f64
    }
}
