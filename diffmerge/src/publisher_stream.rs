// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use diffmerge_core::logging::{error, trace};
use diffmerge_core::{DemandTracker, MergeError, Publisher, StreamItem, Subscriber, Subscription};
use futures::task::AtomicWaker;
use futures::Stream;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

/// Drains a [`Publisher`] as a `futures::Stream`.
///
/// Demand follows the consumer: `prefetch` items are requested only once the
/// local buffer is empty, the previous batch has been delivered, and the
/// stream is polled. A `prefetch` of `u64::MAX` requests everything at once.
///
/// A terminal error is yielded as a final [`StreamItem::Error`]; the stream
/// ends after it. Dropping the stream before it ends cancels the
/// subscription.
pub struct PublisherStream<O> {
    shared: Arc<Shared<O>>,
    prefetch: u64,
}

struct Shared<O> {
    state: Mutex<SinkState<O>>,
    waker: AtomicWaker,
}

struct SinkState<O> {
    subscription: Option<Arc<dyn Subscription>>,
    buffer: VecDeque<O>,
    terminal: Option<Terminal>,
    in_flight: u64,
    finished: bool,
}

enum Terminal {
    Complete,
    Error(MergeError),
}

struct Sink<O>(Arc<Shared<O>>);

impl<O: Send + 'static> PublisherStream<O> {
    /// Subscribes to `publisher`. Nothing is requested until the first poll.
    pub fn new<P>(publisher: P, prefetch: u64) -> Self
    where
        P: Publisher<O>,
    {
        let shared = Arc::new(Shared {
            state: Mutex::new(SinkState {
                subscription: None,
                buffer: VecDeque::new(),
                terminal: None,
                in_flight: 0,
                finished: false,
            }),
            waker: AtomicWaker::new(),
        });
        publisher.subscribe(Arc::new(Sink(shared.clone())));
        Self {
            shared,
            prefetch: prefetch.max(1),
        }
    }
}

impl<O> Stream for PublisherStream<O> {
    type Item = StreamItem<O>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        this.shared.waker.register(cx.waker());

        loop {
            let subscription = {
                let mut state = this.shared.state.lock();
                if let Some(value) = state.buffer.pop_front() {
                    return Poll::Ready(Some(StreamItem::Value(value)));
                }
                match state.terminal.take() {
                    Some(Terminal::Complete) => {
                        state.finish();
                        return Poll::Ready(None);
                    }
                    Some(Terminal::Error(failure)) => {
                        state.finish();
                        return Poll::Ready(Some(StreamItem::Error(failure)));
                    }
                    None if state.finished => return Poll::Ready(None),
                    None => {}
                }
                if state.in_flight > 0 {
                    return Poll::Pending;
                }
                let Some(subscription) = state.subscription.clone() else {
                    return Poll::Pending;
                };
                state.in_flight = this.prefetch;
                subscription
            };

            trace!("publisher stream requesting {}", this.prefetch);
            // A synchronous publisher may deliver from inside `request`.
            subscription.request(this.prefetch);
        }
    }
}

impl<O> Drop for PublisherStream<O> {
    fn drop(&mut self) {
        let subscription = {
            let mut state = self.shared.state.lock();
            if state.finished {
                return;
            }
            state.finished = true;
            state.buffer.clear();
            state.subscription.take()
        };
        if let Some(subscription) = subscription {
            if let Err(failure) = subscription.cancel() {
                error!("cancelling on drop: {}", failure);
            }
        }
    }
}

impl<O> SinkState<O> {
    fn finish(&mut self) {
        self.finished = true;
        self.subscription = None;
    }
}

impl<O: Send> Subscriber<O> for Sink<O> {
    fn on_subscribe(&self, subscription: Arc<dyn Subscription>) {
        let refused = {
            let mut state = self.0.state.lock();
            if state.finished || state.subscription.is_some() {
                Some(subscription)
            } else {
                state.subscription = Some(subscription);
                None
            }
        };
        if let Some(subscription) = refused {
            if let Err(failure) = subscription.cancel() {
                error!("cancelling refused subscription: {}", failure);
            }
        }
        self.0.waker.wake();
    }

    fn on_next(&self, value: O) {
        {
            let mut state = self.0.state.lock();
            if state.finished {
                return;
            }
            if state.in_flight != DemandTracker::UNBOUNDED {
                state.in_flight = state.in_flight.saturating_sub(1);
            }
            state.buffer.push_back(value);
        }
        self.0.waker.wake();
    }

    fn on_error(&self, failure: MergeError) {
        self.terminate(Terminal::Error(failure));
    }

    fn on_complete(&self) {
        self.terminate(Terminal::Complete);
    }
}

impl<O> Sink<O> {
    fn terminate(&self, terminal: Terminal) {
        {
            let mut state = self.0.state.lock();
            if state.finished || state.terminal.is_some() {
                return;
            }
            state.terminal = Some(terminal);
            state.subscription = None;
        }
        self.0.waker.wake();
    }
}
