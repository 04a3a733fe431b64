// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use core::fmt::{self, Display};

/// Outcome of comparing the heads of the two sources.
///
/// `A` is the left ("current") item type, `B` the right ("desired") one.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Classified<A, B> {
    /// Present only in the left source.
    AddedOnly(A),
    /// Present in both sources under the comparator.
    Matched(A, B),
    /// Present only in the right source.
    RemovedOnly(B),
}

/// Payload-free tag of a [`Classified`] value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ClassificationKind {
    AddedOnly,
    Matched,
    RemovedOnly,
}

impl<A, B> Classified<A, B> {
    #[must_use]
    pub const fn kind(&self) -> ClassificationKind {
        match self {
            Self::AddedOnly(_) => ClassificationKind::AddedOnly,
            Self::Matched(_, _) => ClassificationKind::Matched,
            Self::RemovedOnly(_) => ClassificationKind::RemovedOnly,
        }
    }

    #[must_use]
    pub const fn is_added_only(&self) -> bool {
        matches!(self, Self::AddedOnly(_))
    }

    #[must_use]
    pub const fn is_matched(&self) -> bool {
        matches!(self, Self::Matched(_, _))
    }

    #[must_use]
    pub const fn is_removed_only(&self) -> bool {
        matches!(self, Self::RemovedOnly(_))
    }

    /// The left item, if this classification carries one.
    pub const fn left(&self) -> Option<&A> {
        match self {
            Self::AddedOnly(a) | Self::Matched(a, _) => Some(a),
            Self::RemovedOnly(_) => None,
        }
    }

    /// The right item, if this classification carries one.
    pub const fn right(&self) -> Option<&B> {
        match self {
            Self::Matched(_, b) | Self::RemovedOnly(b) => Some(b),
            Self::AddedOnly(_) => None,
        }
    }

    /// Maps the left item, keeping the classification.
    pub fn map_left<C, F>(self, f: F) -> Classified<C, B>
    where
        F: FnOnce(A) -> C,
    {
        match self {
            Self::AddedOnly(a) => Classified::AddedOnly(f(a)),
            Self::Matched(a, b) => Classified::Matched(f(a), b),
            Self::RemovedOnly(b) => Classified::RemovedOnly(b),
        }
    }

    /// Maps the right item, keeping the classification.
    pub fn map_right<C, F>(self, f: F) -> Classified<A, C>
    where
        F: FnOnce(B) -> C,
    {
        match self {
            Self::AddedOnly(a) => Classified::AddedOnly(a),
            Self::Matched(a, b) => Classified::Matched(a, f(b)),
            Self::RemovedOnly(b) => Classified::RemovedOnly(f(b)),
        }
    }
}

impl Display for ClassificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AddedOnly => write!(f, "added-only"),
            Self::Matched => write!(f, "matched"),
            Self::RemovedOnly => write!(f, "removed-only"),
        }
    }
}

impl<A: Display, B: Display> Display for Classified<A, B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AddedOnly(a) => write!(f, "+ {a}"),
            Self::Matched(a, b) => write!(f, "= {a} | {b}"),
            Self::RemovedOnly(b) => write!(f, "- {b}"),
        }
    }
}
