// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::comparator::Comparator;
use crate::config::MergeConfig;
use crate::coordinator::{Coordinator, LeftSource, RightSource};
use crate::policy::ClassificationPolicy;
use crate::publisher_stream::PublisherStream;
use crate::statistics::MergeStatistics;
use core::cmp::Ordering;
use core::fmt;
use diffmerge_core::logging::debug;
use diffmerge_core::protocol::reject;
use diffmerge_core::{MergeError, Publisher, Subscriber};
use parking_lot::Mutex;
use std::sync::Arc;

type BoxedPublisher<T> = Box<dyn Publisher<T> + Send + Sync>;

struct Parts<A, B, O> {
    left: BoxedPublisher<A>,
    right: BoxedPublisher<B>,
    comparator: Comparator<A, B>,
    policy: ClassificationPolicy<A, B, O>,
}

/// Sorted merge of two ordered publishers, itself a [`Publisher`].
///
/// Cold and subscribe-once: nothing is pulled from either source until a
/// downstream subscribes, and a second subscriber is refused with
/// [`MergeError::ProtocolViolation`].
///
/// Output is delivered strictly under downstream demand. Each source has at
/// most one item requested or buffered at any time.
///
/// # Example
///
/// ```
/// use diffmerge::{merge, IterPublisher, MergeConfig};
/// use diffmerge_core::StreamItem;
/// use futures::StreamExt;
///
/// # #[tokio::main]
/// # async fn main() {
/// let merged = merge(
///     IterPublisher::new(vec![1, 2, 4]),
///     IterPublisher::new(vec![2, 3]),
///     |a: &i32, b: &i32| a.cmp(b),
///     |a| Some(format!("+{a}")),
///     |_, _| None,
///     |b| Some(format!("-{b}")),
/// )
/// .with_config(MergeConfig::new().with_label("example"));
///
/// let changes: Vec<String> = merged.into_stream().map(StreamItem::unwrap).collect().await;
/// assert_eq!(changes, ["+1", "-3", "+4"]);
/// # }
/// ```
pub struct SortedMerge<A, B, O> {
    parts: Mutex<Option<Parts<A, B, O>>>,
    config: MergeConfig,
    statistics: MergeStatistics,
}

/// Builds a [`SortedMerge`] from a comparator and three classification
/// functions.
///
/// `on_added_only` sees items only in `left`, `on_matched` pairs that compare
/// equal, `on_removed_only` items only in `right`. Each may return `None` to
/// emit nothing for that item.
pub fn merge<A, B, O, PA, PB, C, FA, FM, FR>(
    left: PA,
    right: PB,
    comparator: C,
    on_added_only: FA,
    on_matched: FM,
    on_removed_only: FR,
) -> SortedMerge<A, B, O>
where
    A: Send + 'static,
    B: Send + 'static,
    O: Send + 'static,
    PA: Publisher<A> + Send + Sync + 'static,
    PB: Publisher<B> + Send + Sync + 'static,
    C: Fn(&A, &B) -> Ordering + Send + Sync + 'static,
    FA: Fn(A) -> Option<O> + Send + Sync + 'static,
    FM: Fn(A, B) -> Option<O> + Send + Sync + 'static,
    FR: Fn(B) -> Option<O> + Send + Sync + 'static,
{
    SortedMerge::with_policy(
        left,
        right,
        comparator,
        ClassificationPolicy::new(on_added_only, on_matched, on_removed_only),
    )
}

impl<A, B, O> SortedMerge<A, B, O>
where
    A: Send + 'static,
    B: Send + 'static,
    O: Send + 'static,
{
    pub fn with_policy<PA, PB, C>(
        left: PA,
        right: PB,
        comparator: C,
        policy: ClassificationPolicy<A, B, O>,
    ) -> Self
    where
        PA: Publisher<A> + Send + Sync + 'static,
        PB: Publisher<B> + Send + Sync + 'static,
        C: Fn(&A, &B) -> Ordering + Send + Sync + 'static,
    {
        Self {
            parts: Mutex::new(Some(Parts {
                left: Box::new(left),
                right: Box::new(right),
                comparator: Arc::new(comparator),
                policy,
            })),
            config: MergeConfig::default(),
            statistics: MergeStatistics::new(),
        }
    }

    #[must_use]
    pub fn with_config(mut self, config: MergeConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &MergeConfig {
        &self.config
    }

    /// Live counters of this merge. The handle stays valid after the merge
    /// is consumed.
    pub fn statistics(&self) -> MergeStatistics {
        self.statistics.clone()
    }

    /// Subscribes a [`PublisherStream`] using the configured prefetch.
    pub fn into_stream(self) -> PublisherStream<O> {
        let prefetch = self.config.prefetch();
        PublisherStream::new(self, prefetch)
    }
}

impl<A, B, O> Publisher<O> for SortedMerge<A, B, O>
where
    A: Send + 'static,
    B: Send + 'static,
    O: Send + 'static,
{
    fn subscribe(&self, subscriber: Arc<dyn Subscriber<O>>) {
        let Some(parts) = self.parts.lock().take() else {
            reject(
                subscriber.as_ref(),
                MergeError::protocol_violation(format!(
                    "[{}] merge already has a subscriber",
                    self.config.label()
                )),
            );
            return;
        };

        debug!("[{}] subscribing to both sources", self.config.label());
        let coordinator = Arc::new(Coordinator::new(
            parts.comparator,
            parts.policy,
            subscriber.clone(),
            self.statistics.clone(),
            self.config.label(),
        ));

        subscriber.on_subscribe(coordinator.clone());
        parts.left.subscribe(Arc::new(LeftSource(coordinator.clone())));
        parts.right.subscribe(Arc::new(RightSource(coordinator)));
    }
}

impl<A, B, O> fmt::Debug for SortedMerge<A, B, O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SortedMerge")
            .field("config", &self.config)
            .field("subscribed", &self.parts.lock().is_none())
            .finish_non_exhaustive()
    }
}
