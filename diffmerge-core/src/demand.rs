// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Credit counter for pull-based flow control.

use core::fmt;

/// Outstanding downstream demand ("credits").
///
/// Each `request(n)` adds `n` credits; each delivered item consumes one.
/// The counter saturates at [`DemandTracker::UNBOUNDED`] instead of
/// overflowing, and once unbounded it stays unbounded: consuming from an
/// unbounded tracker is free.
///
/// The tracker is plain state; callers guard it with whatever lock protects
/// the rest of their state.
///
/// # Example
///
/// ```
/// use diffmerge_core::DemandTracker;
///
/// let mut demand = DemandTracker::new();
/// assert!(!demand.has_demand());
///
/// demand.add(2);
/// assert!(demand.try_consume());
/// assert!(demand.try_consume());
/// assert!(!demand.try_consume());
///
/// demand.add(u64::MAX);
/// assert!(demand.is_unbounded());
/// assert!(demand.try_consume());
/// assert!(demand.is_unbounded());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DemandTracker {
    outstanding: u64,
}

impl DemandTracker {
    /// Sentinel meaning "no limit"; `request(u64::MAX)` requests an unbounded stream.
    pub const UNBOUNDED: u64 = u64::MAX;

    /// A tracker with no outstanding demand.
    #[must_use]
    pub const fn new() -> Self {
        Self { outstanding: 0 }
    }

    /// A tracker that never runs out of demand.
    #[must_use]
    pub const fn unbounded() -> Self {
        Self {
            outstanding: Self::UNBOUNDED,
        }
    }

    /// Adds `n` credits, saturating at [`Self::UNBOUNDED`].
    ///
    /// Returns the outstanding demand after the addition.
    pub fn add(&mut self, n: u64) -> u64 {
        self.outstanding = self.outstanding.saturating_add(n);
        self.outstanding
    }

    /// Consumes one credit.
    ///
    /// Returns `false` (and changes nothing) when no demand is outstanding.
    /// Unbounded demand is never decremented.
    pub fn try_consume(&mut self) -> bool {
        match self.outstanding {
            0 => false,
            Self::UNBOUNDED => true,
            _ => {
                self.outstanding -= 1;
                true
            }
        }
    }

    /// `true` while at least one credit is outstanding.
    #[must_use]
    pub const fn has_demand(&self) -> bool {
        self.outstanding > 0
    }

    #[must_use]
    pub const fn is_unbounded(&self) -> bool {
        self.outstanding == Self::UNBOUNDED
    }

    /// Remaining credits, or `None` when unbounded.
    #[must_use]
    pub const fn outstanding(&self) -> Option<u64> {
        if self.is_unbounded() {
            None
        } else {
            Some(self.outstanding)
        }
    }
}

impl fmt::Display for DemandTracker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.outstanding() {
            Some(n) => write!(f, "{n}"),
            None => write!(f, "unbounded"),
        }
    }
}
