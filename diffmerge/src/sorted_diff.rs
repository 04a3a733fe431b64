// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::classified::Classified;
use crate::config::MergeConfig;
use crate::policy::ClassificationPolicy;
use crate::publisher_stream::PublisherStream;
use crate::sorted_merge::SortedMerge;
use crate::stream_publisher::StreamPublisher;
use core::cmp::Ordering;
use diffmerge_core::StreamItem;
use futures::Stream;

/// Extension trait providing the `sorted_diff` operator for streams.
///
/// The receiver is the left ("current") source, `other` the right
/// ("desired") one. Both must already be ascending under the comparator.
pub trait SortedDiffExt<A>: Stream<Item = StreamItem<A>> + Sized
where
    A: Send + 'static,
{
    /// Classifies every item of both streams.
    ///
    /// Items are pulled from each input only as the result is consumed, one
    /// at a time. An error item on either input ends the result with that
    /// error and stops the other input.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use diffmerge::{Classified, SortedDiffExt};
    /// use diffmerge_core::StreamItem;
    /// use futures::{stream, StreamExt};
    ///
    /// # #[tokio::main]
    /// # async fn main() {
    /// let current = stream::iter(["a", "b"].map(StreamItem::Value));
    /// let desired = stream::iter(["b", "c"].map(StreamItem::Value));
    ///
    /// let mut diff = current.sorted_diff(desired, |a: &&str, b: &&str| a.cmp(b));
    ///
    /// assert_eq!(diff.next().await.unwrap().unwrap(), Classified::AddedOnly("a"));
    /// assert_eq!(diff.next().await.unwrap().unwrap(), Classified::Matched("b", "b"));
    /// assert_eq!(diff.next().await.unwrap().unwrap(), Classified::RemovedOnly("c"));
    /// assert!(diff.next().await.is_none());
    /// # }
    /// ```
    fn sorted_diff<B, S, C>(self, other: S, comparator: C) -> PublisherStream<Classified<A, B>>
    where
        B: Send + 'static,
        S: Stream<Item = StreamItem<B>> + Send + 'static,
        C: Fn(&A, &B) -> Ordering + Send + Sync + 'static;

    /// Like [`sorted_diff`](Self::sorted_diff), with a custom classification
    /// policy and configuration.
    fn sorted_diff_with<B, O, S, C>(
        self,
        other: S,
        comparator: C,
        policy: ClassificationPolicy<A, B, O>,
        config: MergeConfig,
    ) -> PublisherStream<O>
    where
        B: Send + 'static,
        O: Send + 'static,
        S: Stream<Item = StreamItem<B>> + Send + 'static,
        C: Fn(&A, &B) -> Ordering + Send + Sync + 'static;
}

impl<A, L> SortedDiffExt<A> for L
where
    L: Stream<Item = StreamItem<A>> + Send + 'static,
    A: Send + 'static,
{
    fn sorted_diff<B, S, C>(self, other: S, comparator: C) -> PublisherStream<Classified<A, B>>
    where
        B: Send + 'static,
        S: Stream<Item = StreamItem<B>> + Send + 'static,
        C: Fn(&A, &B) -> Ordering + Send + Sync + 'static,
    {
        self.sorted_diff_with(
            other,
            comparator,
            ClassificationPolicy::classify(),
            MergeConfig::default(),
        )
    }

    fn sorted_diff_with<B, O, S, C>(
        self,
        other: S,
        comparator: C,
        policy: ClassificationPolicy<A, B, O>,
        config: MergeConfig,
    ) -> PublisherStream<O>
    where
        B: Send + 'static,
        O: Send + 'static,
        S: Stream<Item = StreamItem<B>> + Send + 'static,
        C: Fn(&A, &B) -> Ordering + Send + Sync + 'static,
    {
        SortedMerge::with_policy(
            StreamPublisher::new(self),
            StreamPublisher::new(other),
            comparator,
            policy,
        )
        .with_config(config)
        .into_stream()
    }
}
