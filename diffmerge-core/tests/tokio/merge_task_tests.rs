// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use diffmerge_core::{CancellationToken, MergeTask};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

#[tokio::test]
async fn test_task_runs_to_completion() {
    let done = Arc::new(AtomicBool::new(false));
    let flag = done.clone();

    let _task = MergeTask::spawn(|_cancel| async move {
        flag.store(true, Ordering::SeqCst);
    });

    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(done.load(Ordering::SeqCst));
}

#[tokio::test]
async fn test_drop_cancels_task() {
    let stopped = Arc::new(AtomicBool::new(false));
    let flag = stopped.clone();

    let task = MergeTask::spawn(|cancel| async move {
        cancel.cancelled().await;
        flag.store(true, Ordering::SeqCst);
    });

    drop(task);
    tokio::time::sleep(Duration::from_millis(20)).await;

    assert!(stopped.load(Ordering::SeqCst));
}

#[tokio::test]
async fn test_external_token_cancels_task() {
    let token = CancellationToken::new();
    let stopped = Arc::new(AtomicBool::new(false));
    let flag = stopped.clone();

    let task = MergeTask::spawn_with_token(token.clone(), |cancel| async move {
        cancel.cancelled().await;
        flag.store(true, Ordering::SeqCst);
    });

    token.cancel();
    tokio::time::sleep(Duration::from_millis(20)).await;

    assert!(task.is_cancelled());
    assert!(stopped.load(Ordering::SeqCst));
}
