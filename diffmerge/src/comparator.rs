// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use core::cmp::Ordering;
use std::sync::Arc;

/// Total order between a left item and a right item.
///
/// `Less` means the left item sorts first, so it is classified before the
/// right one is looked at again.
pub type Comparator<A, B> = Arc<dyn Fn(&A, &B) -> Ordering + Send + Sync>;

/// Comparator for two sources of the same `Ord` type.
pub fn natural_order<T: Ord>() -> impl Fn(&T, &T) -> Ordering + Clone + Send + Sync + 'static {
    |a: &T, b: &T| a.cmp(b)
}

/// Comparator that orders both sides by an extracted key.
///
/// ```
/// use diffmerge::by_key;
/// use std::cmp::Ordering;
///
/// struct Row { id: u32 }
///
/// let cmp = by_key(|row: &Row| row.id, |id: &u32| *id);
/// assert_eq!(cmp(&Row { id: 3 }, &7), Ordering::Less);
/// ```
pub fn by_key<A, B, K, FA, FB>(
    left_key: FA,
    right_key: FB,
) -> impl Fn(&A, &B) -> Ordering + Send + Sync + 'static
where
    K: Ord,
    FA: Fn(&A) -> K + Send + Sync + 'static,
    FB: Fn(&B) -> K + Send + Sync + 'static,
{
    move |a: &A, b: &B| left_key(a).cmp(&right_key(b))
}
