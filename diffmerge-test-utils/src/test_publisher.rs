// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! A hand-driven upstream.

use diffmerge_core::{MergeError, Publisher, Result, Subscriber, Subscription};
use parking_lot::Mutex;
use std::sync::Arc;

/// Upstream whose signals are pushed by the test.
///
/// Clones share state: hand one clone to the operator and keep another to
/// drive it. [`next`](Self::next) delivers regardless of outstanding demand,
/// so tests can provoke protocol violations on purpose.
///
/// ```rust
/// use diffmerge_core::Publisher;
/// use diffmerge_test_utils::{RecordingSubscriber, TestPublisher};
///
/// let publisher = TestPublisher::<i32>::new();
/// let subscriber = RecordingSubscriber::<i32>::new();
/// publisher.subscribe(subscriber.clone());
///
/// subscriber.request(2);
/// assert_eq!(publisher.requested(), 2);
///
/// publisher.next(7);
/// publisher.complete();
/// assert_eq!(subscriber.values(), vec![7]);
/// assert!(subscriber.is_completed());
/// ```
pub struct TestPublisher<T> {
    shared: Arc<Shared<T>>,
}

struct Shared<T> {
    state: Mutex<State<T>>,
}

struct State<T> {
    subscriber: Option<Arc<dyn Subscriber<T>>>,
    subscriptions: usize,
    requests: Vec<u64>,
    requested: u64,
    delivered: u64,
    cancels: usize,
    cancel_failure: Option<MergeError>,
}

struct TestSubscription<T> {
    shared: Arc<Shared<T>>,
}

impl<T> TestPublisher<T> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(State {
                    subscriber: None,
                    subscriptions: 0,
                    requests: Vec::new(),
                    requested: 0,
                    delivered: 0,
                    cancels: 0,
                    cancel_failure: None,
                }),
            }),
        }
    }

    /// A publisher whose subscription fails every `cancel` with `failure`.
    #[must_use]
    pub fn failing_cancel(failure: MergeError) -> Self {
        let publisher = Self::new();
        publisher.shared.state.lock().cancel_failure = Some(failure);
        publisher
    }

    pub fn is_subscribed(&self) -> bool {
        self.shared.state.lock().subscriber.is_some()
    }

    /// How many subscribers were accepted.
    pub fn subscriptions(&self) -> usize {
        self.shared.state.lock().subscriptions
    }

    /// Every `request(n)` argument, in call order.
    pub fn requests(&self) -> Vec<u64> {
        self.shared.state.lock().requests.clone()
    }

    /// Sum of all requests, saturating.
    pub fn requested(&self) -> u64 {
        self.shared.state.lock().requested
    }

    /// Requested but not yet delivered.
    pub fn outstanding(&self) -> u64 {
        let state = self.shared.state.lock();
        state.requested.saturating_sub(state.delivered)
    }

    pub fn cancel_count(&self) -> usize {
        self.shared.state.lock().cancels
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel_count() > 0
    }

    /// Delivers `value` to the subscriber, if any.
    pub fn next(&self, value: T) {
        let subscriber = {
            let mut state = self.shared.state.lock();
            state.delivered += 1;
            state.subscriber.clone()
        };
        if let Some(subscriber) = subscriber {
            subscriber.on_next(value);
        }
    }

    pub fn complete(&self) {
        let subscriber = self.shared.state.lock().subscriber.clone();
        if let Some(subscriber) = subscriber {
            subscriber.on_complete();
        }
    }

    pub fn error(&self, failure: MergeError) {
        let subscriber = self.shared.state.lock().subscriber.clone();
        if let Some(subscriber) = subscriber {
            subscriber.on_error(failure);
        }
    }
}

impl<T> Clone for TestPublisher<T> {
    fn clone(&self) -> Self {
        Self {
            shared: self.shared.clone(),
        }
    }
}

impl<T> Default for TestPublisher<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Send + 'static> Publisher<T> for TestPublisher<T> {
    fn subscribe(&self, subscriber: Arc<dyn Subscriber<T>>) {
        {
            let mut state = self.shared.state.lock();
            state.subscriptions += 1;
            state.subscriber = Some(subscriber.clone());
        }
        subscriber.on_subscribe(Arc::new(TestSubscription {
            shared: self.shared.clone(),
        }));
    }
}

impl<T: Send> Subscription for TestSubscription<T> {
    fn request(&self, n: u64) {
        let mut state = self.shared.state.lock();
        state.requests.push(n);
        state.requested = state.requested.saturating_add(n);
    }

    fn cancel(&self) -> Result<()> {
        let mut state = self.shared.state.lock();
        state.cancels += 1;
        match &state.cancel_failure {
            Some(failure) => Err(failure.clone()),
            None => Ok(()),
        }
    }
}
