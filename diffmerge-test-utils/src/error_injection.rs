// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Stream wrapper that injects a `StreamItem::Error` at a fixed position.

use diffmerge_core::{MergeError, StreamItem};
use futures::Stream;
use std::pin::Pin;
use std::task::{Context, Poll};

/// Wraps a stream of plain values in `StreamItem::Value`, emitting one
/// injected error at position `inject_error_at` (0-indexed).
///
/// ```rust
/// use diffmerge_core::StreamItem;
/// use diffmerge_test_utils::ErrorInjectingStream;
/// use futures::{stream, StreamExt};
///
/// # async fn example() {
/// let mut stream = ErrorInjectingStream::new(stream::iter([1, 2]), 1);
///
/// assert!(matches!(stream.next().await, Some(StreamItem::Value(1))));
/// assert!(matches!(stream.next().await, Some(StreamItem::Error(_))));
/// assert!(matches!(stream.next().await, Some(StreamItem::Value(2))));
/// # }
/// ```
pub struct ErrorInjectingStream<S> {
    inner: S,
    inject_error_at: Option<usize>,
    count: usize,
}

impl<S> ErrorInjectingStream<S> {
    pub fn new(inner: S, inject_error_at: usize) -> Self {
        Self {
            inner,
            inject_error_at: Some(inject_error_at),
            count: 0,
        }
    }
}

impl<S> Stream for ErrorInjectingStream<S>
where
    S: Stream + Unpin,
{
    type Item = StreamItem<S::Item>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        if self.inject_error_at == Some(self.count) {
            self.inject_error_at = None;
            self.count += 1;
            return Poll::Ready(Some(StreamItem::Error(MergeError::stream_error(
                "Injected test error",
            ))));
        }

        match Pin::new(&mut self.inner).poll_next(cx) {
            Poll::Ready(Some(item)) => {
                self.count += 1;
                Poll::Ready(Some(StreamItem::Value(item)))
            }
            Poll::Ready(None) => Poll::Ready(None),
            Poll::Pending => Poll::Pending,
        }
    }
}
