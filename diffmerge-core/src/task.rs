// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Runtime-agnostic task spawning with cooperative cancellation.

use crate::CancellationToken;
use std::future::Future;

/// Handle to a detached background task, cancelled on drop.
///
/// The spawned closure receives a [`CancellationToken`] it is expected to
/// watch; cancelling the handle (or dropping it) signals the token and the
/// task stops at its next await point.
///
/// The executor is chosen by feature flag:
///
/// - `runtime-tokio` (default): `tokio::spawn`
/// - `runtime-smol`: `smol::spawn(..).detach()`
///
/// # Example
///
/// ```rust
/// use diffmerge_core::MergeTask;
///
/// # #[tokio::main]
/// # async fn main() {
/// let task = MergeTask::spawn(|cancel| async move {
///     cancel.cancelled().await;
/// });
///
/// assert!(!task.is_cancelled());
/// drop(task);
/// # }
/// ```
#[derive(Debug)]
pub struct MergeTask {
    cancel: CancellationToken,
}

impl MergeTask {
    /// Spawn `f(token)` on the configured runtime.
    ///
    /// # Panics
    ///
    /// With `runtime-tokio`, panics when called outside a Tokio runtime.
    pub fn spawn<F, Fut>(f: F) -> Self
    where
        F: FnOnce(CancellationToken) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        Self::spawn_with_token(CancellationToken::new(), f)
    }

    /// Like [`spawn`](Self::spawn), but with a caller-owned token so the
    /// caller can cancel the task without holding the handle.
    pub fn spawn_with_token<F, Fut>(cancel: CancellationToken, f: F) -> Self
    where
        F: FnOnce(CancellationToken) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let future = f(cancel.clone());

        #[cfg(feature = "runtime-tokio")]
        tokio::spawn(future);

        #[cfg(all(feature = "runtime-smol", not(feature = "runtime-tokio")))]
        smol::spawn(future).detach();

        #[cfg(not(any(feature = "runtime-tokio", feature = "runtime-smol")))]
        compile_error!("diffmerge-core needs `runtime-tokio` or `runtime-smol` to spawn tasks");

        Self { cancel }
    }

    /// Signal the task to stop. Does not wait for it.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// `true` once `cancel()` was called or the handle was dropped.
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

impl Drop for MergeTask {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
