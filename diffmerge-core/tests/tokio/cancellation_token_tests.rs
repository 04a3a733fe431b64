// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use diffmerge_core::CancellationToken;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

#[test]
fn test_new_token_not_cancelled() {
    let token = CancellationToken::new();
    assert!(!token.is_cancelled());
}

#[test]
fn test_only_first_cancel_reports_true() {
    let token = CancellationToken::new();
    let clone = token.clone();

    assert!(token.cancel());
    assert!(!clone.cancel());
    assert!(!token.cancel());
    assert!(clone.is_cancelled());
}

#[test]
fn test_cancelled_ready_when_already_cancelled() {
    let token = CancellationToken::new();
    token.cancel();

    let mut future = Box::pin(token.cancelled());
    let waker = futures::task::noop_waker();
    let mut cx = Context::from_waker(&waker);

    assert!(matches!(future.as_mut().poll(&mut cx), Poll::Ready(())));
}

#[tokio::test]
async fn test_cancelled_waits_until_cancel() {
    let token = CancellationToken::new();
    let waiter = token.clone();

    let handle = tokio::spawn(async move {
        waiter.cancelled().await;
        true
    });

    tokio::time::sleep(Duration::from_millis(10)).await;
    token.cancel();

    let result = tokio::time::timeout(Duration::from_millis(100), handle).await;
    assert!(result.expect("waiter timed out").expect("waiter panicked"));
}

#[tokio::test]
async fn test_all_waiters_notified() {
    let token = CancellationToken::new();
    let count = Arc::new(AtomicUsize::new(0));

    let mut handles = vec![];
    for _ in 0..20 {
        let waiter = token.clone();
        let count = count.clone();
        handles.push(tokio::spawn(async move {
            waiter.cancelled().await;
            count.fetch_add(1, Ordering::SeqCst);
        }));
    }

    tokio::time::sleep(Duration::from_millis(20)).await;
    token.cancel();

    for handle in handles {
        tokio::time::timeout(Duration::from_millis(100), handle)
            .await
            .expect("waiter timed out")
            .expect("waiter panicked");
    }
    assert_eq!(count.load(Ordering::SeqCst), 20);
}

#[tokio::test]
async fn test_cancel_racing_listener_registration() {
    for _ in 0..100 {
        let token = CancellationToken::new();
        let canceller = token.clone();

        let handle = tokio::spawn(async move {
            token.cancelled().await;
        });
        canceller.cancel();

        let result = tokio::time::timeout(Duration::from_millis(100), handle).await;
        assert!(result.is_ok(), "Task didn't complete after cancel");
    }
}

#[tokio::test]
async fn test_run_until_cancelled_returns_output() {
    let token = CancellationToken::new();

    let output = token.run_until_cancelled(async { 7 }).await;

    assert_eq!(output, Some(7));
}

#[tokio::test]
async fn test_run_until_cancelled_interrupted() {
    let token = CancellationToken::new();
    let canceller = token.clone();

    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(10)).await;
        canceller.cancel();
    });

    let output = token
        .run_until_cancelled(futures::future::pending::<i32>())
        .await;

    assert_eq!(output, None);
}
