// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use diffmerge::StreamPublisher;
use diffmerge_core::{MergeError, Publisher, StreamItem};
use diffmerge_test_utils::{test_channel, test_channel_with_errors, RecordingSubscriber};
use futures::{stream, StreamExt};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;

const SETTLE: Duration = Duration::from_millis(50);

#[tokio::test]
async fn test_pulls_only_what_was_requested() {
    // Arrange
    let pulled = Arc::new(AtomicUsize::new(0));
    let counter = pulled.clone();
    let values = stream::iter(0..100_u32).inspect(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
    });
    let publisher = StreamPublisher::from_values(values);
    let subscriber = RecordingSubscriber::<u32>::new();
    publisher.subscribe(subscriber.clone());

    // Act
    sleep(SETTLE).await;
    let pulled_without_demand = pulled.load(Ordering::SeqCst);
    subscriber.request(3);
    sleep(SETTLE).await;

    // Assert
    assert_eq!(pulled_without_demand, 0);
    assert_eq!(subscriber.values(), vec![0, 1, 2]);
    assert_eq!(pulled.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_end_of_stream_completes() {
    // Arrange
    let publisher = StreamPublisher::from_values(stream::iter(vec![1_i32, 2]));
    let subscriber = RecordingSubscriber::<i32>::with_initial_request(10);

    // Act
    publisher.subscribe(subscriber.clone());
    sleep(SETTLE).await;

    // Assert
    assert_eq!(subscriber.values(), vec![1, 2]);
    assert!(subscriber.is_completed());
}

#[tokio::test]
async fn test_error_item_becomes_on_error() {
    // Arrange
    let (tx, items) = test_channel_with_errors::<i32>();
    let publisher = StreamPublisher::new(items);
    let subscriber = RecordingSubscriber::<i32>::with_initial_request(10);
    publisher.subscribe(subscriber.clone());

    // Act
    tx.send(StreamItem::Value(1)).unwrap();
    tx.send(StreamItem::Error(MergeError::stream_error("disk gone"))).unwrap();
    tx.send(StreamItem::Value(2)).unwrap();
    sleep(SETTLE).await;

    // Assert
    assert_eq!(subscriber.values(), vec![1]);
    assert!(matches!(
        subscriber.error(),
        Some(MergeError::StreamProcessingError { ref context }) if context == "disk gone"
    ));
    assert_eq!(subscriber.late_signals(), 0);
}

#[tokio::test]
async fn test_cancel_stops_the_pump() -> anyhow::Result<()> {
    // Arrange
    let (tx, items) = test_channel::<i32>();
    let publisher = StreamPublisher::new(items);
    let subscriber = RecordingSubscriber::<i32>::with_initial_request(10);
    publisher.subscribe(subscriber.clone());
    tx.send(1)?;
    sleep(SETTLE).await;

    // Act
    subscriber.cancel()?;
    sleep(SETTLE).await;
    let send_after_cancel = tx.send(2);

    // Assert
    assert_eq!(subscriber.values(), vec![1]);
    assert!(!subscriber.is_terminated());
    assert!(send_after_cancel.is_err(), "receiver dropped with the pump");
    Ok(())
}

#[tokio::test]
async fn test_request_zero_is_a_protocol_violation() {
    // Arrange
    let (_tx, items) = test_channel::<i32>();
    let publisher = StreamPublisher::new(items);
    let subscriber = RecordingSubscriber::<i32>::new();
    publisher.subscribe(subscriber.clone());

    // Act
    subscriber.request(0);
    sleep(SETTLE).await;

    // Assert
    assert!(subscriber.error().is_some_and(|e| e.is_protocol_violation()));
}

#[tokio::test]
async fn test_second_subscriber_is_rejected() {
    // Arrange
    let publisher = StreamPublisher::from_values(stream::iter(vec![1_i32]));
    let first = RecordingSubscriber::<i32>::with_initial_request(5);
    let second = RecordingSubscriber::<i32>::with_initial_request(5);
    publisher.subscribe(first.clone());

    // Act
    publisher.subscribe(second.clone());
    sleep(SETTLE).await;

    // Assert
    assert!(second.error().is_some_and(|e| e.is_protocol_violation()));
    assert_eq!(first.values(), vec![1]);
    assert!(first.is_completed());
}

#[tokio::test]
async fn test_failed_result_becomes_stream_processing_error() {
    // Arrange
    let results = stream::iter(vec![
        Ok(1_i32),
        Err(std::io::Error::other("disk gone")),
        Ok(2),
    ]);
    let publisher = StreamPublisher::from_results(results);
    let subscriber = RecordingSubscriber::<i32>::with_initial_request(10);

    // Act
    publisher.subscribe(subscriber.clone());
    sleep(SETTLE).await;

    // Assert
    assert_eq!(subscriber.values(), vec![1]);
    let error = subscriber.error();
    assert!(matches!(
        error,
        Some(MergeError::StreamProcessingError { ref context })
            if context == "stream source failed: disk gone"
    ));
    assert!(error.is_some_and(|e| !e.is_permanent()));
}
