// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use diffmerge_core::logging::{debug, trace};
use diffmerge_core::protocol::reject;
use diffmerge_core::{
    CancellationToken, DemandTracker, IntoMergeError, MergeError, MergeTask, Publisher, Result,
    StreamItem, Subscriber, Subscription,
};
use event_listener::Event;
use futures::stream::Map;
use futures::{Stream, StreamExt};
use parking_lot::Mutex;
use std::pin::pin;
use std::sync::Arc;

/// Subscribe-once publisher over a `futures::Stream` of [`StreamItem`]s.
///
/// On subscribe, a pump task is spawned on the configured runtime. It pulls
/// exactly one item from the stream per credit requested by the subscriber,
/// so an unread stream is never polled ahead. `StreamItem::Error` becomes
/// `on_error`, the end of the stream becomes `on_complete`. Cancelling the
/// subscription stops the pump at its next await point and drops the stream.
///
/// # Panics
///
/// With `runtime-tokio`, subscribing outside a Tokio runtime panics.
pub struct StreamPublisher<S> {
    stream: Mutex<Option<S>>,
}

impl<S> StreamPublisher<S> {
    pub fn new(stream: S) -> Self {
        Self {
            stream: Mutex::new(Some(stream)),
        }
    }
}

impl<T, V> StreamPublisher<Map<V, fn(T) -> StreamItem<T>>>
where
    V: Stream<Item = T>,
{
    /// Publisher over a stream of plain values that never fails.
    pub fn from_values(values: V) -> Self {
        Self::new(values.map(StreamItem::Value as fn(T) -> StreamItem<T>))
    }
}

type SourceResult<T, E> = std::result::Result<T, E>;

impl<T, E, V> StreamPublisher<Map<V, fn(SourceResult<T, E>) -> StreamItem<T>>>
where
    V: Stream<Item = SourceResult<T, E>>,
    E: std::error::Error + Send + Sync + 'static,
{
    /// Publisher over a fallible stream. The first `Err` fails the subscriber
    /// with [`MergeError::StreamProcessingError`] and ends delivery.
    pub fn from_results(results: V) -> Self {
        Self::new(results.map(source_item::<T, E> as fn(SourceResult<T, E>) -> StreamItem<T>))
    }
}

fn source_item<T, E>(result: SourceResult<T, E>) -> StreamItem<T>
where
    E: std::error::Error + Send + Sync + 'static,
{
    result
        .map_err(|failure| failure.into_merge_error("stream source failed"))
        .into()
}

impl<T, S> Publisher<T> for StreamPublisher<S>
where
    S: Stream<Item = StreamItem<T>> + Send + 'static,
    T: Send + 'static,
{
    fn subscribe(&self, subscriber: Arc<dyn Subscriber<T>>) {
        let Some(stream) = self.stream.lock().take() else {
            reject(
                subscriber.as_ref(),
                MergeError::protocol_violation("stream publisher already has a subscriber"),
            );
            return;
        };

        let subscription = Arc::new(PumpSubscription {
            credits: Mutex::new(Credits::default()),
            granted: Event::new(),
            cancel: CancellationToken::new(),
            task: Mutex::new(None),
        });
        subscriber.on_subscribe(subscription.clone());
        if subscription.cancel.is_cancelled() {
            return;
        }

        let credits = subscription.clone();
        let task = MergeTask::spawn_with_token(subscription.cancel.clone(), move |cancel| {
            pump(stream, subscriber, credits, cancel)
        });
        *subscription.task.lock() = Some(task);
    }
}

#[derive(Default)]
struct Credits {
    demand: DemandTracker,
    zero_request: bool,
}

struct PumpSubscription {
    credits: Mutex<Credits>,
    granted: Event,
    cancel: CancellationToken,
    task: Mutex<Option<MergeTask>>,
}

impl PumpSubscription {
    /// Waits for one credit and consumes it.
    async fn acquire(&self) -> Result<()> {
        loop {
            let listener = self.granted.listen();
            {
                let mut credits = self.credits.lock();
                if credits.zero_request {
                    return Err(MergeError::protocol_violation(
                        "stream publisher received request(0)",
                    ));
                }
                if credits.demand.try_consume() {
                    return Ok(());
                }
            }
            listener.await;
        }
    }
}

impl Subscription for PumpSubscription {
    fn request(&self, n: u64) {
        if self.cancel.is_cancelled() {
            return;
        }
        {
            let mut credits = self.credits.lock();
            if n == 0 {
                credits.zero_request = true;
            } else {
                credits.demand.add(n);
            }
        }
        self.granted.notify(1);
    }

    fn cancel(&self) -> Result<()> {
        if self.cancel.cancel() {
            trace!("stream publisher cancelled");
        }
        if let Some(task) = self.task.lock().take() {
            task.cancel();
        }
        Ok(())
    }
}

async fn pump<T, S>(
    stream: S,
    subscriber: Arc<dyn Subscriber<T>>,
    credits: Arc<PumpSubscription>,
    cancel: CancellationToken,
) where
    S: Stream<Item = StreamItem<T>> + Send,
{
    let mut stream = pin!(stream);
    loop {
        let Some(granted) = cancel.run_until_cancelled(credits.acquire()).await else {
            return;
        };
        if let Err(violation) = granted {
            cancel.cancel();
            subscriber.on_error(violation);
            return;
        }

        let Some(item) = cancel.run_until_cancelled(stream.next()).await else {
            return;
        };
        match item {
            Some(StreamItem::Value(value)) => subscriber.on_next(value),
            Some(StreamItem::Error(failure)) => {
                cancel.cancel();
                subscriber.on_error(failure);
                return;
            }
            None => {
                debug!("stream publisher exhausted");
                cancel.cancel();
                subscriber.on_complete();
                return;
            }
        }
    }
}
