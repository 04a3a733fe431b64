// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Core vocabulary for pull-based sorted merge/diff streams.
//!
//! This crate holds the pieces every other `diffmerge` crate builds on:
//!
//! - **[`MergeError`]**: the error taxonomy (protocol violations, upstream
//!   failures, classification callback failures, cancellation failures)
//! - **[`StreamItem`]**: value-or-error items for `futures::Stream` surfaces
//! - **[`Publisher`] / [`Subscriber`] / [`Subscription`]**: the credit-based
//!   producer/consumer protocol spoken on both sides of the merge operator
//! - **[`DemandTracker`]**: a saturating counter of outstanding demand
//! - **[`CancellationToken`] / [`MergeTask`]**: cooperative cancellation for
//!   background pump tasks

#![allow(clippy::multiple_crate_versions, clippy::doc_markdown)]
pub mod cancellation_token;
pub mod demand;
pub mod error;
pub mod logging;
pub mod protocol;
pub mod stream_item;
pub mod task;

pub use self::cancellation_token::CancellationToken;
pub use self::demand::DemandTracker;
pub use self::error::{IntoMergeError, MergeError, Result, ResultExt};
pub use self::protocol::{Publisher, Subscriber, Subscription};
pub use self::stream_item::StreamItem;
pub use self::task::MergeTask;
