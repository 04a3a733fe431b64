// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! A downstream that records every signal it receives.

use diffmerge_core::{MergeError, Result, Subscriber, Subscription};
use parking_lot::Mutex;
use std::sync::Arc;

/// Records values and terminal signals; requests only when told to.
///
/// Signals that arrive after a terminal one are counted in
/// [`late_signals`](Self::late_signals) so tests can assert there were none.
pub struct RecordingSubscriber<T> {
    state: Mutex<Recorded<T>>,
    initial_request: u64,
    replenish: u64,
}

struct Recorded<T> {
    subscription: Option<Arc<dyn Subscription>>,
    subscribe_calls: usize,
    values: Vec<T>,
    error: Option<MergeError>,
    completed: bool,
    late_signals: usize,
}

impl<T> RecordingSubscriber<T> {
    /// A subscriber that never requests by itself.
    #[must_use]
    pub fn new() -> Arc<Self> {
        Self::build(0, 0)
    }

    /// Requests `n` as soon as it is subscribed.
    #[must_use]
    pub fn with_initial_request(n: u64) -> Arc<Self> {
        Self::build(n, 0)
    }

    /// Requests `n` once subscribed, then `n` more from inside every `on_next`.
    #[must_use]
    pub fn replenishing(n: u64) -> Arc<Self> {
        Self::build(n, n)
    }

    fn build(initial_request: u64, replenish: u64) -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(Recorded {
                subscription: None,
                subscribe_calls: 0,
                values: Vec::new(),
                error: None,
                completed: false,
                late_signals: 0,
            }),
            initial_request,
            replenish,
        })
    }

    /// Forwards `request(n)` to the subscription, if any.
    pub fn request(&self, n: u64) {
        let subscription = self.state.lock().subscription.clone();
        if let Some(subscription) = subscription {
            subscription.request(n);
        }
    }

    /// Forwards `cancel()` to the subscription, if any.
    ///
    /// # Errors
    ///
    /// Whatever the subscription's `cancel` returned.
    pub fn cancel(&self) -> Result<()> {
        let subscription = self.state.lock().subscription.clone();
        subscription.map_or(Ok(()), |subscription| subscription.cancel())
    }

    pub fn is_subscribed(&self) -> bool {
        self.state.lock().subscription.is_some()
    }

    pub fn subscribe_calls(&self) -> usize {
        self.state.lock().subscribe_calls
    }

    pub fn value_count(&self) -> usize {
        self.state.lock().values.len()
    }

    /// Removes and returns the values received so far.
    pub fn take_values(&self) -> Vec<T> {
        std::mem::take(&mut self.state.lock().values)
    }

    pub fn error(&self) -> Option<MergeError> {
        self.state.lock().error.clone()
    }

    pub fn is_completed(&self) -> bool {
        self.state.lock().completed
    }

    pub fn is_terminated(&self) -> bool {
        let state = self.state.lock();
        state.completed || state.error.is_some()
    }

    pub fn late_signals(&self) -> usize {
        self.state.lock().late_signals
    }
}

impl<T: Clone> RecordingSubscriber<T> {
    pub fn values(&self) -> Vec<T> {
        self.state.lock().values.clone()
    }
}

impl<T> Recorded<T> {
    fn is_terminated(&self) -> bool {
        self.completed || self.error.is_some()
    }
}

impl<T: Send> Subscriber<T> for RecordingSubscriber<T> {
    fn on_subscribe(&self, subscription: Arc<dyn Subscription>) {
        {
            let mut state = self.state.lock();
            state.subscribe_calls += 1;
            state.subscription = Some(subscription.clone());
        }
        if self.initial_request > 0 {
            subscription.request(self.initial_request);
        }
    }

    fn on_next(&self, value: T) {
        let replenish = {
            let mut state = self.state.lock();
            if state.is_terminated() {
                state.late_signals += 1;
                return;
            }
            state.values.push(value);
            if self.replenish > 0 {
                state.subscription.clone()
            } else {
                None
            }
        };
        if let Some(subscription) = replenish {
            subscription.request(self.replenish);
        }
    }

    fn on_error(&self, error: MergeError) {
        let mut state = self.state.lock();
        if state.is_terminated() {
            state.late_signals += 1;
            return;
        }
        state.error = Some(error);
    }

    fn on_complete(&self) {
        let mut state = self.state.lock();
        if state.is_terminated() {
            state.late_signals += 1;
            return;
        }
        state.completed = true;
    }
}
