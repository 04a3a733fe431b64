// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use diffmerge::{IterPublisher, PublisherStream};
use diffmerge_core::{MergeError, StreamItem};
use diffmerge_test_utils::{assert_stream_ended, unwrap_stream, TestPublisher};
use futures::{FutureExt, StreamExt};

#[tokio::test]
async fn test_nothing_requested_before_first_poll() {
    // Arrange
    let publisher = TestPublisher::<i32>::new();

    // Act
    let _stream = PublisherStream::new(publisher.clone(), 4);

    // Assert
    assert!(publisher.is_subscribed());
    assert!(publisher.requests().is_empty());
}

#[tokio::test]
async fn test_requests_prefetch_once_per_batch() {
    // Arrange
    let publisher = TestPublisher::<i32>::new();
    let mut stream = PublisherStream::new(publisher.clone(), 4);

    // Act
    let first_poll = stream.next().now_or_never();
    let second_poll = stream.next().now_or_never();

    // Assert
    assert!(first_poll.is_none());
    assert!(second_poll.is_none());
    assert_eq!(publisher.requests(), vec![4]);
}

#[tokio::test]
async fn test_requests_again_only_after_batch_delivered() {
    // Arrange
    let publisher = TestPublisher::<i32>::new();
    let mut stream = PublisherStream::new(publisher.clone(), 2);
    assert!(stream.next().now_or_never().is_none());

    // Act
    publisher.next(1);
    let first = unwrap_stream(&mut stream, 500).await.unwrap();
    let pending_while_in_flight = stream.next().now_or_never().is_none();
    publisher.next(2);
    let second = unwrap_stream(&mut stream, 500).await.unwrap();
    let pending_after_batch = stream.next().now_or_never().is_none();

    // Assert
    assert_eq!((first, second), (1, 2));
    assert!(pending_while_in_flight);
    assert!(pending_after_batch);
    assert_eq!(publisher.requests(), vec![2, 2]);
}

#[tokio::test]
async fn test_completion_ends_stream_after_buffer() {
    // Arrange
    let publisher = TestPublisher::<i32>::new();
    let mut stream = PublisherStream::new(publisher.clone(), u64::MAX);
    assert!(stream.next().now_or_never().is_none());

    // Act
    publisher.next(7);
    publisher.next(8);
    publisher.complete();

    // Assert
    assert_eq!(unwrap_stream(&mut stream, 500).await.unwrap(), 7);
    assert_eq!(unwrap_stream(&mut stream, 500).await.unwrap(), 8);
    assert_stream_ended(&mut stream, 500).await;
}

#[tokio::test]
async fn test_error_is_the_last_item() {
    // Arrange
    let publisher = TestPublisher::<i32>::new();
    let mut stream = PublisherStream::new(publisher.clone(), 1);
    assert!(stream.next().now_or_never().is_none());

    // Act
    publisher.error(MergeError::stream_error("source lost"));

    // Assert
    assert!(matches!(
        unwrap_stream(&mut stream, 500).await,
        StreamItem::Error(MergeError::StreamProcessingError { ref context }) if context == "source lost"
    ));
    assert_stream_ended(&mut stream, 500).await;
    assert_eq!(publisher.cancel_count(), 0);
}

#[tokio::test]
async fn test_drop_cancels_subscription_once() {
    // Arrange
    let publisher = TestPublisher::<i32>::new();
    let mut stream = PublisherStream::new(publisher.clone(), 1);
    assert!(stream.next().now_or_never().is_none());

    // Act
    drop(stream);

    // Assert
    assert_eq!(publisher.cancel_count(), 1);
}

#[tokio::test]
async fn test_drop_after_end_does_not_cancel() {
    // Arrange
    let publisher = TestPublisher::<i32>::new();
    let mut stream = PublisherStream::new(publisher.clone(), 1);
    assert!(stream.next().now_or_never().is_none());
    publisher.complete();
    assert_stream_ended(&mut stream, 500).await;

    // Act
    drop(stream);

    // Assert
    assert_eq!(publisher.cancel_count(), 0);
}

#[tokio::test]
async fn test_synchronous_publisher_is_drained() {
    // Arrange
    let stream = PublisherStream::new(IterPublisher::new(1..=5_i32), 2);

    // Act
    let values: Vec<i32> = stream.map(StreamItem::unwrap).collect().await;

    // Assert
    assert_eq!(values, vec![1, 2, 3, 4, 5]);
}
