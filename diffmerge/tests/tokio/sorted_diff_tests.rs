// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use diffmerge::{
    natural_order, ClassificationPolicy, Classified, MergeConfig, SortedDiffExt,
};
use diffmerge_core::{MergeError, StreamItem};
use diffmerge_test_utils::record::{record_alice, record_charlie, records};
use diffmerge_test_utils::{
    assert_no_element_emitted, assert_stream_ended, test_channel, unwrap_stream, unwrap_value,
    ErrorInjectingStream, Record,
};
use futures::{stream, StreamExt};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::yield_now;
use tokio::time::sleep;

#[tokio::test]
async fn test_sorted_diff_waits_for_both_sides() -> anyhow::Result<()> {
    // Arrange
    let (tx_current, current) = test_channel::<i32>();
    let (tx_desired, desired) = test_channel::<i32>();
    let mut diff = current.sorted_diff(desired, natural_order::<i32>());

    // Act & Assert
    tx_current.send(1)?;
    assert_no_element_emitted(&mut diff, 100).await;

    tx_desired.send(3)?;
    assert_eq!(
        unwrap_stream(&mut diff, 500).await.unwrap(),
        Classified::AddedOnly(1)
    );

    tx_current.send(3)?;
    assert_eq!(
        unwrap_stream(&mut diff, 500).await.unwrap(),
        Classified::Matched(3, 3)
    );

    drop(tx_current);
    tx_desired.send(4)?;
    assert_eq!(
        unwrap_stream(&mut diff, 500).await.unwrap(),
        Classified::RemovedOnly(4)
    );

    drop(tx_desired);
    assert_stream_ended(&mut diff, 500).await;
    Ok(())
}

#[tokio::test]
async fn test_sorted_diff_pulls_lazily() {
    // Arrange
    let pulled_current = Arc::new(AtomicUsize::new(0));
    let pulled_desired = Arc::new(AtomicUsize::new(0));
    let (counter_current, counter_desired) = (pulled_current.clone(), pulled_desired.clone());
    let current = stream::iter(vec![1, 2, 3]).map(move |v: i32| {
        counter_current.fetch_add(1, Ordering::SeqCst);
        StreamItem::Value(v)
    });
    let desired = stream::iter(vec![2, 3]).map(move |v: i32| {
        counter_desired.fetch_add(1, Ordering::SeqCst);
        StreamItem::Value(v)
    });
    let mut diff = current.sorted_diff(desired, natural_order::<i32>());

    // Act
    let first = unwrap_value(diff.next().await);
    sleep(Duration::from_millis(50)).await;

    // Assert
    assert_eq!(first, Classified::AddedOnly(1));
    assert_eq!(pulled_current.load(Ordering::SeqCst), 1);
    assert_eq!(pulled_desired.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_sorted_diff_of_records_reports_changes_only() {
    // Arrange
    let current = stream::iter(records(&[(1, "Alice"), (2, "Bob")])).map(StreamItem::Value);
    let desired = stream::iter(records(&[(2, "Bob"), (3, "Charlie")])).map(StreamItem::Value);

    // Act
    let changes: Vec<Classified<Record, Record>> = current
        .sorted_diff_with(
            desired,
            Record::by_id,
            ClassificationPolicy::changes_only(),
            MergeConfig::new().with_label("records").with_prefetch(8),
        )
        .map(StreamItem::unwrap)
        .collect()
        .await;

    // Assert
    assert_eq!(
        changes,
        vec![
            Classified::AddedOnly(record_alice()),
            Classified::RemovedOnly(record_charlie()),
        ]
    );
}

#[tokio::test]
async fn test_sorted_diff_ends_with_upstream_error() {
    // Arrange
    let current = ErrorInjectingStream::new(stream::iter(vec![1, 2, 3]), 1);
    let desired = stream::iter(vec![1, 2, 3]).map(StreamItem::Value);
    let mut diff = current.sorted_diff(desired, natural_order::<i32>());

    // Act
    let first = unwrap_stream(&mut diff, 500).await;
    let second = unwrap_stream(&mut diff, 500).await;

    // Assert
    assert_eq!(first.unwrap(), Classified::Matched(1, 1));
    assert!(matches!(
        second,
        StreamItem::Error(MergeError::StreamProcessingError { ref context })
            if context == "Injected test error"
    ));
    assert_stream_ended(&mut diff, 500).await;
}

#[tokio::test]
async fn test_dropping_diff_stops_both_inputs() -> anyhow::Result<()> {
    // Arrange
    let (tx_current, current) = test_channel::<i32>();
    let (tx_desired, desired) = test_channel::<i32>();
    let mut diff = current.sorted_diff(desired, natural_order::<i32>());
    tx_current.send(1)?;
    tx_desired.send(2)?;
    assert_eq!(
        unwrap_stream(&mut diff, 500).await.unwrap(),
        Classified::AddedOnly(1)
    );

    // Act
    drop(diff);
    sleep(Duration::from_millis(50)).await;

    // Assert
    assert!(tx_current.is_closed());
    assert!(tx_desired.is_closed());
    Ok(())
}

#[tokio::test]
async fn test_sorted_diff_of_heterogeneous_streams() {
    // Arrange
    let current = stream::iter(records(&[(1, "Alice"), (4, "Diane")])).map(StreamItem::Value);
    let desired = stream::iter(vec![1_u32, 2]).map(StreamItem::Value);

    // Act
    let diff: Vec<String> = current
        .sorted_diff(desired, |record: &Record, id: &u32| record.id.cmp(id))
        .map(|item| item.unwrap().to_string())
        .collect()
        .await;

    // Assert
    assert_eq!(
        diff,
        vec![
            "= Record[id=1, name=Alice] | 1",
            "- 2",
            "+ Record[id=4, name=Diane]",
        ]
    );
}

fn reference(left: &[u32], right: &[u32]) -> Vec<Classified<u32, u32>> {
    let mut sides: BTreeMap<u32, (bool, bool)> = BTreeMap::new();
    for key in left {
        sides.entry(*key).or_default().0 = true;
    }
    for key in right {
        sides.entry(*key).or_default().1 = true;
    }
    sides
        .into_iter()
        .map(|(key, present)| match present {
            (true, true) => Classified::Matched(key, key),
            (true, false) => Classified::AddedOnly(key),
            (false, _) => Classified::RemovedOnly(key),
        })
        .collect()
}

fn yielding(keys: Vec<u32>) -> impl futures::Stream<Item = StreamItem<u32>> + Send {
    stream::iter(keys).then(|key| async move {
        yield_now().await;
        StreamItem::Value(key)
    })
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_sorted_diff_on_worker_threads_matches_reference_model() {
    for seed in 0..60_u64 {
        // Arrange
        let mut rng = fastrand::Rng::with_seed(20_000 + seed);
        let keys = |rng: &mut fastrand::Rng| {
            let mut keys: Vec<u32> = (0..rng.usize(0..=60)).map(|_| rng.u32(0..128)).collect();
            keys.sort_unstable();
            keys.dedup();
            keys
        };
        let (current, desired) = (keys(&mut rng), keys(&mut rng));
        let prefetch = [1, 3, u64::MAX][(seed % 3) as usize];
        let expected = reference(&current, &desired);

        // Act
        let diff: Vec<Classified<u32, u32>> = yielding(current.clone())
            .sorted_diff_with(
                yielding(desired.clone()),
                natural_order::<u32>(),
                ClassificationPolicy::classify(),
                MergeConfig::new().with_prefetch(prefetch),
            )
            .map(StreamItem::unwrap)
            .collect()
            .await;

        // Assert
        assert_eq!(diff, expected, "seed {seed}, prefetch {prefetch}");
    }
}
