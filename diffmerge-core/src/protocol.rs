// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! The credit-based producer/consumer protocol.
//!
//! Both sides of a merge speak the same shape:
//!
//! 1. A [`Publisher`] is handed a [`Subscriber`] and calls
//!    [`Subscriber::on_subscribe`] exactly once with a [`Subscription`].
//! 2. The subscriber pulls with [`Subscription::request`]; the publisher
//!    delivers at most that many [`Subscriber::on_next`] calls.
//! 3. The sequence ends with exactly one of [`Subscriber::on_complete`] or
//!    [`Subscriber::on_error`], or is abandoned by [`Subscription::cancel`].
//!    Nothing is delivered after a terminal signal or a cancel.
//!
//! Signals to one subscriber are never concurrent with each other, but may
//! arrive on any thread. `request` and `cancel` may be called from any thread
//! and from within `on_next`.

use crate::error::{MergeError, Result};
use std::sync::Arc;

/// Handle a subscriber uses to pull items from, or abandon, a publisher.
pub trait Subscription: Send + Sync {
    /// Adds `n` to the outstanding demand.
    ///
    /// `u64::MAX` means unbounded. `n == 0` is a protocol violation that the
    /// publisher reports through `on_error`.
    fn request(&self, n: u64);

    /// Stops delivery and releases the publisher's resources.
    ///
    /// Idempotent: only the first call has an effect.
    ///
    /// Called from the subscriber's own `on_next`, no further signal follows.
    /// Called from another thread, an `on_next` already under way on the
    /// publisher's thread may still complete after `cancel` returns; nothing
    /// is delivered once that call is over.
    ///
    /// # Errors
    ///
    /// Returns an error if the publisher failed to tear down. Delivery has
    /// stopped regardless.
    fn cancel(&self) -> Result<()>;
}

/// Receiver of the signals of a single subscription.
pub trait Subscriber<T>: Send + Sync {
    /// Called once, before any other signal.
    fn on_subscribe(&self, subscription: Arc<dyn Subscription>);

    /// Called at most once per requested credit.
    fn on_next(&self, value: T);

    /// Terminal failure. No further signals follow.
    fn on_error(&self, error: MergeError);

    /// Terminal success. No further signals follow.
    fn on_complete(&self);
}

/// Producer of an ordered sequence, consumed under explicit demand.
pub trait Publisher<T> {
    /// Binds `subscriber` to this publisher.
    ///
    /// Subscribe-once publishers reject a second subscriber by handing it a
    /// [`CancelledSubscription`] followed by `on_error`.
    fn subscribe(&self, subscriber: Arc<dyn Subscriber<T>>);
}

impl<T, P> Publisher<T> for Arc<P>
where
    P: Publisher<T> + ?Sized,
{
    fn subscribe(&self, subscriber: Arc<dyn Subscriber<T>>) {
        (**self).subscribe(subscriber);
    }
}

impl<T, P> Publisher<T> for Box<P>
where
    P: Publisher<T> + ?Sized,
{
    fn subscribe(&self, subscriber: Arc<dyn Subscriber<T>>) {
        (**self).subscribe(subscriber);
    }
}

/// A subscription that is already over: requests and cancels do nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct CancelledSubscription;

impl Subscription for CancelledSubscription {
    fn request(&self, _n: u64) {}

    fn cancel(&self) -> Result<()> {
        Ok(())
    }
}

/// Refuses `subscriber`: hands it a [`CancelledSubscription`], then `error`.
pub fn reject<T>(subscriber: &dyn Subscriber<T>, error: MergeError) {
    subscriber.on_subscribe(Arc::new(CancelledSubscription));
    subscriber.on_error(error);
}
