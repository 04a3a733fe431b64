// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::classified::ClassificationKind;
use core::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Live counters of one merge.
///
/// Cloning yields another handle to the same counters, so a caller can keep
/// one while the merge runs elsewhere. Classification counters include
/// classifications the policy filtered out; `emitted` counts only values
/// delivered downstream.
#[derive(Debug, Clone, Default)]
pub struct MergeStatistics {
    counters: Arc<Counters>,
}

#[derive(Debug, Default)]
struct Counters {
    added_only: AtomicU64,
    matched: AtomicU64,
    removed_only: AtomicU64,
    emitted: AtomicU64,
    filtered: AtomicU64,
}

/// Point-in-time copy of [`MergeStatistics`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatisticsSnapshot {
    pub added_only: u64,
    pub matched: u64,
    pub removed_only: u64,
    pub emitted: u64,
    pub filtered: u64,
}

impl MergeStatistics {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn added_only(&self) -> u64 {
        self.counters.added_only.load(Ordering::Relaxed)
    }

    pub fn matched(&self) -> u64 {
        self.counters.matched.load(Ordering::Relaxed)
    }

    pub fn removed_only(&self) -> u64 {
        self.counters.removed_only.load(Ordering::Relaxed)
    }

    pub fn emitted(&self) -> u64 {
        self.counters.emitted.load(Ordering::Relaxed)
    }

    pub fn filtered(&self) -> u64 {
        self.counters.filtered.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn snapshot(&self) -> StatisticsSnapshot {
        StatisticsSnapshot {
            added_only: self.added_only(),
            matched: self.matched(),
            removed_only: self.removed_only(),
            emitted: self.emitted(),
            filtered: self.filtered(),
        }
    }

    pub(crate) fn record_classification(&self, kind: ClassificationKind) {
        let counter = match kind {
            ClassificationKind::AddedOnly => &self.counters.added_only,
            ClassificationKind::Matched => &self.counters.matched,
            ClassificationKind::RemovedOnly => &self.counters.removed_only,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_emitted(&self) {
        self.counters.emitted.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_filtered(&self) {
        self.counters.filtered.fetch_add(1, Ordering::Relaxed);
    }
}

impl StatisticsSnapshot {
    /// Left items consumed so far.
    #[must_use]
    pub const fn left_consumed(&self) -> u64 {
        self.added_only + self.matched
    }

    /// Right items consumed so far.
    #[must_use]
    pub const fn right_consumed(&self) -> u64 {
        self.removed_only + self.matched
    }
}

impl fmt::Display for StatisticsSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "added-only={} matched={} removed-only={} emitted={} filtered={}",
            self.added_only, self.matched, self.removed_only, self.emitted, self.filtered
        )
    }
}
