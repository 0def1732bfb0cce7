//! Rolling outcome window.
//!
//! # Responsibilities
//! - Keep per-interval success/failure tallies for the trailing
//!   `capacity * bucket_length` span
//! - Report the error rate over everything still retained
//!
//! # Design Decisions
//! - Bucket boundaries come from a fixed origin captured at construction, so two
//!   recordings inside the same interval always share a bucket
//! - Buckets are only ever appended at the newest end; late timestamps are folded into
//!   the nearest older bucket instead of creating history
//! - Empty intervals are not materialized; gaps are implied by bucket indices

use std::collections::VecDeque;
use std::time::Duration;

use serde::Serialize;
use tokio::time::Instant;

/// Classification of a completed call attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Success,
    Failure,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Success => "success",
            Outcome::Failure => "failure",
        }
    }
}

/// Tallies for one bucket-length interval.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bucket {
    /// Interval number counted from the window origin.
    index: u64,
    /// Start of the interval this bucket covers.
    pub start: Instant,
    pub successes: u64,
    pub failures: u64,
}

impl Bucket {
    fn new(index: u64, start: Instant) -> Self {
        Self {
            index,
            start,
            successes: 0,
            failures: 0,
        }
    }

    fn count(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Success => self.successes += 1,
            Outcome::Failure => self.failures += 1,
        }
    }

    pub fn total(&self) -> u64 {
        self.successes + self.failures
    }
}

/// Fixed-capacity rolling sequence of buckets, oldest first.
#[derive(Debug, Clone)]
pub struct OutcomeWindow {
    buckets: VecDeque<Bucket>,
    capacity: usize,
    bucket_length: Duration,
    origin: Instant,
}

impl OutcomeWindow {
    /// Create an empty window whose bucket grid starts at `origin`.
    ///
    /// Zero capacity or bucket length are clamped to the smallest usable value;
    /// configuration validation rejects them long before this point. Storage grows
    /// one bucket at a time, so `capacity` only bounds it.
    pub fn new(capacity: usize, bucket_length: Duration, origin: Instant) -> Self {
        let capacity = capacity.max(1);
        Self {
            buckets: VecDeque::new(),
            capacity,
            bucket_length: bucket_length.max(Duration::from_nanos(1)),
            origin,
        }
    }

    /// Record an outcome observed at `now`.
    pub fn record(&mut self, outcome: Outcome, now: Instant) {
        let index = self.index_of(now);

        match self.buckets.back() {
            Some(newest) if index <= newest.index => {
                // Late or same-interval timestamp: newest bucket at or before `index`,
                // falling back to the oldest one.
                let pos = self
                    .buckets
                    .iter()
                    .rposition(|b| b.index <= index)
                    .unwrap_or(0);
                self.buckets[pos].count(outcome);
            }
            _ => {
                self.evict_before(index);
                let mut bucket = Bucket::new(index, self.bucket_start(index));
                bucket.count(outcome);
                self.buckets.push_back(bucket);
                while self.buckets.len() > self.capacity {
                    self.buckets.pop_front();
                }
            }
        }
    }

    /// Drop buckets that fell out of the trailing span ending at `now`.
    pub fn expire(&mut self, now: Instant) {
        let index = self.index_of(now);
        self.evict_before(index);
    }

    /// Failures over total outcomes; zero when nothing has been recorded.
    pub fn error_rate(&self) -> f64 {
        let (successes, failures) = self.totals();
        let total = successes + failures;
        if total == 0 {
            return 0.0;
        }
        failures as f64 / total as f64
    }

    /// `(successes, failures)` summed across retained buckets.
    pub fn totals(&self) -> (u64, u64) {
        self.buckets
            .iter()
            .fold((0, 0), |(s, f), b| (s + b.successes, f + b.failures))
    }

    /// Total outcomes currently retained.
    pub fn total(&self) -> u64 {
        let (successes, failures) = self.totals();
        successes + failures
    }

    pub fn clear(&mut self) {
        self.buckets.clear();
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn buckets(&self) -> impl Iterator<Item = &Bucket> {
        self.buckets.iter()
    }

    fn index_of(&self, now: Instant) -> u64 {
        let elapsed = now.saturating_duration_since(self.origin);
        let index = elapsed.as_nanos() / self.bucket_length.as_nanos();
        u64::try_from(index).unwrap_or(u64::MAX)
    }

    fn bucket_start(&self, index: u64) -> Instant {
        let offset = self.bucket_length.as_nanos().saturating_mul(u128::from(index));
        self.origin + Duration::from_nanos(u64::try_from(offset).unwrap_or(u64::MAX))
    }

    /// Remove buckets whose interval ends before the span of `capacity` intervals
    /// ending at interval `index`.
    fn evict_before(&mut self, index: u64) {
        let capacity = self.capacity as u64;
        while let Some(oldest) = self.buckets.front() {
            if oldest.index.saturating_add(capacity) <= index {
                self.buckets.pop_front();
            } else {
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    fn window(origin: Instant) -> OutcomeWindow {
        OutcomeWindow::new(10, ms(1000), origin)
    }

    #[test]
    fn test_empty_window_is_healthy() {
        let w = window(Instant::now());
        assert_eq!(w.error_rate(), 0.0);
        assert!(w.is_empty());
    }

    #[test]
    fn test_single_bucket_rate() {
        let origin = Instant::now();
        let mut w = window(origin);
        for i in 0..7 {
            w.record(Outcome::Success, origin + ms(100 + i * 50));
        }
        for i in 0..3 {
            w.record(Outcome::Failure, origin + ms(200 + i * 100));
        }

        assert_eq!(w.len(), 1);
        assert_eq!(w.totals(), (7, 3));
        assert!((w.error_rate() - 0.3).abs() < f64::EPSILON);
    }

    #[test]
    fn test_same_interval_shares_bucket() {
        let origin = Instant::now();
        let mut w = window(origin);
        w.record(Outcome::Success, origin + ms(1000));
        w.record(Outcome::Failure, origin + ms(1999));
        assert_eq!(w.len(), 1);

        w.record(Outcome::Failure, origin + ms(2000));
        assert_eq!(w.len(), 2);
        let starts: Vec<_> = w.buckets().map(|b| b.start).collect();
        assert_eq!(starts, vec![origin + ms(1000), origin + ms(2000)]);
    }

    #[test]
    fn test_capacity_evicts_oldest() {
        let origin = Instant::now();
        let mut w = OutcomeWindow::new(3, ms(100), origin);
        w.record(Outcome::Failure, origin);
        w.record(Outcome::Success, origin + ms(100));
        w.record(Outcome::Success, origin + ms(200));
        assert_eq!(w.totals(), (2, 1));

        w.record(Outcome::Success, origin + ms(300));
        assert_eq!(w.len(), 3);
        assert_eq!(w.totals(), (3, 0));
    }

    #[test]
    fn test_outcomes_expire_after_full_span() {
        let origin = Instant::now();
        let mut w = window(origin);
        w.record(Outcome::Failure, origin + ms(500));
        w.record(Outcome::Failure, origin + ms(600));

        // More than window_length * bucket_length later.
        w.record(Outcome::Success, origin + ms(500 + 10_001));
        assert_eq!(w.len(), 1);
        assert_eq!(w.totals(), (1, 0));
        assert_eq!(w.error_rate(), 0.0);
    }

    #[test]
    fn test_outcomes_within_span_are_kept() {
        let origin = Instant::now();
        let mut w = window(origin);
        w.record(Outcome::Failure, origin);
        w.record(Outcome::Success, origin + ms(9_999));
        assert_eq!(w.totals(), (1, 1));
    }

    #[test]
    fn test_expire_without_recording() {
        let origin = Instant::now();
        let mut w = window(origin);
        w.record(Outcome::Failure, origin);
        w.expire(origin + ms(5_000));
        assert_eq!(w.total(), 1);
        w.expire(origin + ms(10_000));
        assert!(w.is_empty());
    }

    #[test]
    fn test_late_timestamp_goes_to_oldest_bucket() {
        let origin = Instant::now();
        let mut w = window(origin + ms(5_000));
        w.record(Outcome::Success, origin + ms(7_000));
        w.record(Outcome::Success, origin + ms(8_000));

        // Earlier than anything retained, and even earlier than the origin.
        w.record(Outcome::Failure, origin + ms(6_000));
        w.record(Outcome::Failure, origin);

        assert_eq!(w.len(), 2);
        let oldest = w.buckets().next().unwrap();
        assert_eq!(oldest.failures, 2);
        assert_eq!(oldest.successes, 1);
    }

    #[test]
    fn test_gap_timestamp_goes_to_nearest_older_bucket() {
        let origin = Instant::now();
        let mut w = window(origin);
        w.record(Outcome::Success, origin);
        w.record(Outcome::Success, origin + ms(5_000));

        w.record(Outcome::Failure, origin + ms(3_000));
        assert_eq!(w.len(), 2);
        let first = w.buckets().next().unwrap();
        assert_eq!((first.successes, first.failures), (1, 1));
    }

    #[test]
    fn test_clear() {
        let origin = Instant::now();
        let mut w = window(origin);
        w.record(Outcome::Failure, origin);
        w.clear();
        assert!(w.is_empty());
        assert_eq!(w.error_rate(), 0.0);
    }

    #[test]
    fn test_huge_capacity_allocates_lazily() {
        let origin = Instant::now();
        let mut w = OutcomeWindow::new(1 << 40, ms(1000), origin);
        assert_eq!(w.capacity(), 1 << 40);

        w.record(Outcome::Failure, origin);
        w.record(Outcome::Success, origin + ms(3_000));
        assert_eq!(w.len(), 2);
        assert_eq!(w.total(), 2);
    }

    #[test]
    fn test_bucket_total() {
        let origin = Instant::now();
        let mut w = window(origin);
        w.record(Outcome::Success, origin);
        w.record(Outcome::Failure, origin + ms(10));
        w.record(Outcome::Failure, origin + ms(20));

        let bucket = w.buckets().next().unwrap();
        assert_eq!(bucket.total(), 3);
    }
}
