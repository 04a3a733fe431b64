// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use diffmerge_core::protocol::reject;
use diffmerge_core::{DemandTracker, MergeError, Publisher, Result, Subscriber, Subscription};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Synchronous, subscribe-once publisher over an iterator.
///
/// Items are emitted from inside `request`, on the caller's thread.
/// Requests made from within `on_next` are queued rather than recursed into,
/// so arbitrarily long sequences never grow the stack.
///
/// ```
/// use diffmerge::{IterPublisher, PublisherStream};
/// use diffmerge_core::StreamItem;
/// use futures::StreamExt;
///
/// # #[tokio::main]
/// # async fn main() {
/// let stream = PublisherStream::new(IterPublisher::new(1..=3), 1);
/// let values: Vec<i32> = stream.map(StreamItem::unwrap).collect().await;
/// assert_eq!(values, vec![1, 2, 3]);
/// # }
/// ```
#[derive(Debug)]
pub struct IterPublisher<I> {
    items: Mutex<Option<I>>,
}

impl<I> IterPublisher<I>
where
    I: IntoIterator,
{
    pub fn new(items: I) -> Self {
        Self {
            items: Mutex::new(Some(items)),
        }
    }
}

impl<I> Publisher<I::Item> for IterPublisher<I>
where
    I: IntoIterator,
    I::IntoIter: Send + 'static,
    I::Item: Send + 'static,
{
    fn subscribe(&self, subscriber: Arc<dyn Subscriber<I::Item>>) {
        let Some(items) = self.items.lock().take() else {
            reject(
                subscriber.as_ref(),
                MergeError::protocol_violation("iterator publisher already has a subscriber"),
            );
            return;
        };

        let subscription = Arc::new(IterSubscription {
            state: Mutex::new(IterState {
                iter: Some(items.into_iter()),
                subscriber: Some(subscriber.clone()),
                demand: DemandTracker::new(),
                zero_request: false,
            }),
            wip: AtomicUsize::new(0),
        });
        subscriber.on_subscribe(subscription);
    }
}

struct IterSubscription<It: Iterator> {
    state: Mutex<IterState<It>>,
    wip: AtomicUsize,
}

struct IterState<It: Iterator> {
    iter: Option<It>,
    /// `None` once terminated or cancelled.
    subscriber: Option<Arc<dyn Subscriber<It::Item>>>,
    demand: DemandTracker,
    zero_request: bool,
}

enum Signal<T> {
    Next(Arc<dyn Subscriber<T>>, T),
    Error(Arc<dyn Subscriber<T>>, MergeError),
    Complete(Arc<dyn Subscriber<T>>),
    Idle,
}

impl<It: Iterator> IterState<It> {
    fn next_signal(&mut self) -> Signal<It::Item> {
        let Some(subscriber) = self.subscriber.clone() else {
            return Signal::Idle;
        };

        if self.zero_request {
            self.terminate();
            return Signal::Error(
                subscriber,
                MergeError::protocol_violation("iterator publisher received request(0)"),
            );
        }

        if !self.demand.has_demand() {
            return Signal::Idle;
        }

        match self.iter.as_mut().and_then(Iterator::next) {
            Some(value) => {
                self.demand.try_consume();
                Signal::Next(subscriber, value)
            }
            None => {
                self.terminate();
                Signal::Complete(subscriber)
            }
        }
    }

    fn terminate(&mut self) {
        self.subscriber = None;
        self.iter = None;
    }
}

impl<It> IterSubscription<It>
where
    It: Iterator,
{
    fn drain(&self) {
        if self.wip.fetch_add(1, Ordering::AcqRel) != 0 {
            return;
        }
        let mut missed = 1;
        loop {
            loop {
                let signal = self.state.lock().next_signal();
                match signal {
                    Signal::Next(subscriber, value) => subscriber.on_next(value),
                    Signal::Error(subscriber, failure) => subscriber.on_error(failure),
                    Signal::Complete(subscriber) => subscriber.on_complete(),
                    Signal::Idle => break,
                }
            }
            missed = self.wip.fetch_sub(missed, Ordering::AcqRel) - missed;
            if missed == 0 {
                break;
            }
        }
    }
}

impl<It> Subscription for IterSubscription<It>
where
    It: Iterator + Send,
    It::Item: Send,
{
    fn request(&self, n: u64) {
        {
            let mut state = self.state.lock();
            if state.subscriber.is_none() {
                return;
            }
            if n == 0 {
                state.zero_request = true;
            } else {
                state.demand.add(n);
            }
        }
        self.drain();
    }

    fn cancel(&self) -> Result<()> {
        self.state.lock().terminate();
        Ok(())
    }
}
