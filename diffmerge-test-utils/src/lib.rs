// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Test utilities and fixtures for the diffmerge workspace.
//!
//! This crate is for development and testing only, not for production code.
//!
//! # Key Types
//!
//! - [`TestPublisher`]: a hand-driven upstream. Tests push values, completion
//!   and errors into it, and inspect what the operator requested and whether
//!   it cancelled.
//! - [`RecordingSubscriber`]: a downstream that records every signal and lets
//!   the test decide when to request or cancel.
//! - [`Record`]: a keyed fixture for diffing "current" against "desired" rows.
//!
//! # Channels
//!
//! For stream-based tests, [`test_channel`] and [`test_channel_with_errors`]
//! give an unbounded sender and the matching `StreamItem` stream:
//!
//! ```rust
//! use diffmerge_test_utils::test_channel;
//! use futures::StreamExt;
//!
//! # async fn example() {
//! let (tx, mut stream) = test_channel();
//! tx.send(42).unwrap();
//! assert_eq!(stream.next().await.unwrap().unwrap(), 42);
//! # }
//! ```

#![allow(clippy::multiple_crate_versions, clippy::doc_markdown)]
pub mod error_injection;
pub mod helpers;
pub mod record;
pub mod recording_subscriber;
pub mod test_publisher;

use diffmerge_core::StreamItem;
use futures::{Stream, StreamExt};
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;

pub use error_injection::ErrorInjectingStream;
pub use helpers::{assert_no_element_emitted, assert_stream_ended, unwrap_stream, unwrap_value};
pub use record::Record;
pub use recording_subscriber::RecordingSubscriber;
pub use test_publisher::TestPublisher;

/// Creates a test channel that wraps sent values in `StreamItem::Value`.
pub fn test_channel<T: Send + 'static>() -> (
    mpsc::UnboundedSender<T>,
    impl Stream<Item = StreamItem<T>> + Send + Unpin,
) {
    let (tx, rx) = mpsc::unbounded_channel();
    let stream = UnboundedReceiverStream::new(rx).map(StreamItem::Value);
    (tx, stream)
}

/// Creates a test channel that accepts `StreamItem<T>`, for error propagation tests.
///
/// ```rust
/// use diffmerge_core::{MergeError, StreamItem};
/// use diffmerge_test_utils::test_channel_with_errors;
/// use futures::StreamExt;
///
/// # async fn example() {
/// let (tx, mut stream) = test_channel_with_errors::<i32>();
/// tx.send(StreamItem::Error(MergeError::stream_error("boom"))).unwrap();
/// assert!(stream.next().await.unwrap().is_error());
/// # }
/// ```
pub fn test_channel_with_errors<T: Send + 'static>() -> (
    mpsc::UnboundedSender<StreamItem<T>>,
    impl Stream<Item = StreamItem<T>> + Send + Unpin,
) {
    let (tx, rx) = mpsc::unbounded_channel();
    let stream = UnboundedReceiverStream::new(rx);
    (tx, stream)
}
