// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::classified::Classified;
use core::fmt;
use diffmerge_core::{IntoMergeError, MergeError, Result};
use std::panic::{catch_unwind, AssertUnwindSafe};

type LeftFn<A, O> = Box<dyn Fn(A) -> Result<Option<O>> + Send + Sync>;
type BothFn<A, B, O> = Box<dyn Fn(A, B) -> Result<Option<O>> + Send + Sync>;
type RightFn<B, O> = Box<dyn Fn(B) -> Result<Option<O>> + Send + Sync>;

/// The three functions that turn a classification into downstream output.
///
/// Each function yields zero or one value. `None` means "nothing to emit for
/// this item": the merge moves on without consuming downstream demand.
///
/// # Example
///
/// ```
/// use diffmerge::{ClassificationPolicy, Classified};
///
/// // Only report keys that need to be deleted.
/// let policy: ClassificationPolicy<u32, u32, u32> =
///     ClassificationPolicy::new(|_| None, |_, _| None, |b| Some(b));
///
/// assert_eq!(policy.apply(Classified::RemovedOnly(7)).unwrap(), Some(7));
/// assert_eq!(policy.apply(Classified::Matched(3, 3)).unwrap(), None);
/// ```
pub struct ClassificationPolicy<A, B, O> {
    on_added_only: LeftFn<A, O>,
    on_matched: BothFn<A, B, O>,
    on_removed_only: RightFn<B, O>,
}

impl<A, B, O> ClassificationPolicy<A, B, O>
where
    A: 'static,
    B: 'static,
    O: 'static,
{
    /// Builds a policy from infallible functions.
    pub fn new<FA, FM, FR>(on_added_only: FA, on_matched: FM, on_removed_only: FR) -> Self
    where
        FA: Fn(A) -> Option<O> + Send + Sync + 'static,
        FM: Fn(A, B) -> Option<O> + Send + Sync + 'static,
        FR: Fn(B) -> Option<O> + Send + Sync + 'static,
    {
        Self {
            on_added_only: Box::new(move |a| Ok(on_added_only(a))),
            on_matched: Box::new(move |a, b| Ok(on_matched(a, b))),
            on_removed_only: Box::new(move |b| Ok(on_removed_only(b))),
        }
    }

    /// Builds a policy from fallible functions.
    ///
    /// An `Err` terminates the merge: it reaches the downstream as
    /// [`MergeError::UserError`] and both sources are cancelled.
    pub fn try_new<FA, FM, FR, E>(on_added_only: FA, on_matched: FM, on_removed_only: FR) -> Self
    where
        FA: Fn(A) -> std::result::Result<Option<O>, E> + Send + Sync + 'static,
        FM: Fn(A, B) -> std::result::Result<Option<O>, E> + Send + Sync + 'static,
        FR: Fn(B) -> std::result::Result<Option<O>, E> + Send + Sync + 'static,
        E: std::error::Error + Send + Sync + 'static,
    {
        Self {
            on_added_only: Box::new(move |a| on_added_only(a).map_err(IntoMergeError::into_merge)),
            on_matched: Box::new(move |a, b| on_matched(a, b).map_err(IntoMergeError::into_merge)),
            on_removed_only: Box::new(move |b| {
                on_removed_only(b).map_err(IntoMergeError::into_merge)
            }),
        }
    }
}

impl<A, B, O> ClassificationPolicy<A, B, O> {
    /// Runs the function matching `classified`.
    ///
    /// A panic inside the function is caught and returned as
    /// [`MergeError::CallbackPanic`].
    ///
    /// # Errors
    ///
    /// Whatever the function returned, or the caught panic.
    pub fn apply(&self, classified: Classified<A, B>) -> Result<Option<O>> {
        catch_unwind(AssertUnwindSafe(|| match classified {
            Classified::AddedOnly(a) => (self.on_added_only)(a),
            Classified::Matched(a, b) => (self.on_matched)(a, b),
            Classified::RemovedOnly(b) => (self.on_removed_only)(b),
        }))
        .unwrap_or_else(|payload| Err(MergeError::from_panic(payload.as_ref())))
    }
}

impl<A: 'static, B: 'static> ClassificationPolicy<A, B, Classified<A, B>> {
    /// Emits every classification as is.
    #[must_use]
    pub fn classify() -> Self {
        Self::new(
            |a| Some(Classified::AddedOnly(a)),
            |a, b| Some(Classified::Matched(a, b)),
            |b| Some(Classified::RemovedOnly(b)),
        )
    }

    /// Emits only the difference: matched pairs are dropped.
    #[must_use]
    pub fn changes_only() -> Self {
        Self::new(
            |a| Some(Classified::AddedOnly(a)),
            |_, _| None,
            |b| Some(Classified::RemovedOnly(b)),
        )
    }
}

impl<A: 'static, B: 'static> Default for ClassificationPolicy<A, B, Classified<A, B>> {
    fn default() -> Self {
        Self::classify()
    }
}

impl<A, B, O> fmt::Debug for ClassificationPolicy<A, B, O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassificationPolicy").finish_non_exhaustive()
    }
}
