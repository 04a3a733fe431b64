// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Sorted dual-source merge/diff with pull-based backpressure.
//!
//! Given two sources that each deliver an already-ordered sequence, the
//! operator walks both in lockstep and classifies every item as present only
//! on the left ([`Classified::AddedOnly`]), present on both sides
//! ([`Classified::Matched`]) or present only on the right
//! ([`Classified::RemovedOnly`]). Typical uses are diffing two snapshots of a
//! keyed dataset, or "current" against "desired" state.
//!
//! # Architecture
//!
//! - **[`SourceCursor`]**: one-slot lookahead over one source, with an explicit
//!   lifecycle ([`CursorState`]) and at most one request in flight
//! - **[`ClassificationPolicy`]**: three caller-supplied functions turning each
//!   classification into zero or one output value
//! - **Coordinator**: the single mutual-exclusion point; runs the comparison
//!   whenever data or demand arrives and never calls out while holding its lock
//! - **[`SortedMerge`]**: the operator as a [`Publisher`](diffmerge_core::Publisher)
//! - **Adapters**: [`IterPublisher`] and [`StreamPublisher`] feed the operator,
//!   [`PublisherStream`] drains it as a `futures::Stream`
//!
//! # Example
//!
//! ```
//! use diffmerge::{Classified, SortedDiffExt};
//! use diffmerge_core::StreamItem;
//! use futures::{stream, StreamExt};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let current = stream::iter([1, 3, 5].map(StreamItem::Value));
//! let desired = stream::iter([3, 4].map(StreamItem::Value));
//!
//! let diff: Vec<_> = current
//!     .sorted_diff(desired, |a: &i32, b: &i32| a.cmp(b))
//!     .map(StreamItem::unwrap)
//!     .collect()
//!     .await;
//!
//! assert_eq!(
//!     diff,
//!     vec![
//!         Classified::AddedOnly(1),
//!         Classified::Matched(3, 3),
//!         Classified::RemovedOnly(4),
//!         Classified::AddedOnly(5),
//!     ]
//! );
//! # }
//! ```
//!
//! # Ordering precondition
//!
//! Each source must already be ascending under the comparator. This is not
//! checked; unsorted input produces an unspecified (but still conserving)
//! classification.

#![allow(clippy::multiple_crate_versions)]
mod classified;
mod comparator;
mod config;
mod coordinator;
mod cursor;
mod iter_publisher;
mod policy;
mod publisher_stream;
mod sorted_diff;
mod sorted_merge;
mod statistics;
mod stream_publisher;

pub use classified::{ClassificationKind, Classified};
pub use comparator::{by_key, natural_order, Comparator};
pub use config::MergeConfig;
pub use cursor::{CursorState, Peek, Side, SourceCursor};
pub use iter_publisher::IterPublisher;
pub use policy::ClassificationPolicy;
pub use publisher_stream::PublisherStream;
pub use sorted_diff::SortedDiffExt;
pub use sorted_merge::{merge, SortedMerge};
pub use statistics::{MergeStatistics, StatisticsSnapshot};
pub use stream_publisher::StreamPublisher;
