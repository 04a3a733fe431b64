// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! One-slot lookahead over a single ordered source.
//!
//! A [`SourceCursor`] is plain state: it never calls its upstream itself.
//! Operations that need to reach the upstream (`request_next`, `cancel`)
//! hand back the [`Subscription`] so the caller can invoke it after
//! releasing whatever lock guards the cursor.
//!
//! ```text
//! Created -> Subscribed -> Idle <-> Requested -> Ready <-> Examining -> Idle | Completed
//! ```
//!
//! `Completed` is also reached from any state through upstream completion,
//! an upstream error, or cancellation.

use core::fmt;
use diffmerge_core::logging::trace;
use diffmerge_core::{MergeError, Result, Subscription};
use std::sync::Arc;

/// Which input a cursor reads from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    /// The first ("current") source.
    Left,
    /// The second ("desired") source.
    Right,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Left => write!(f, "left"),
            Self::Right => write!(f, "right"),
        }
    }
}

/// Lifecycle of a [`SourceCursor`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CursorState {
    Created,
    Subscribed,
    /// Bound, slot empty, nothing requested.
    Idle,
    /// One item requested, not yet delivered.
    Requested,
    /// One item buffered.
    Ready,
    /// The buffered item is being compared.
    Examining,
    Completed,
}

impl fmt::Display for CursorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Created => "created",
            Self::Subscribed => "subscribed",
            Self::Idle => "idle",
            Self::Requested => "requested",
            Self::Ready => "ready",
            Self::Examining => "examining",
            Self::Completed => "completed",
        };
        f.write_str(name)
    }
}

/// Result of [`SourceCursor::peek`].
#[derive(Debug, PartialEq, Eq)]
pub enum Peek<'a, T> {
    /// The buffered head; the cursor is now `Examining`.
    Value(&'a T),
    /// The source ended and nothing is buffered.
    Exhausted,
    /// Nothing buffered yet.
    Pending,
}

pub struct SourceCursor<T> {
    side: Side,
    label: Arc<str>,
    state: CursorState,
    slot: Option<T>,
    exhausted: bool,
    subscription: Option<Arc<dyn Subscription>>,
}

impl<T> SourceCursor<T> {
    pub fn new(side: Side) -> Self {
        Self {
            side,
            label: Arc::from(crate::MergeConfig::DEFAULT_LABEL),
            state: CursorState::Created,
            slot: None,
            exhausted: false,
            subscription: None,
        }
    }

    /// Sets the merge label carried by this cursor's log lines.
    #[must_use]
    pub fn with_label(mut self, label: impl Into<Arc<str>>) -> Self {
        self.label = label.into();
        self
    }

    pub const fn side(&self) -> Side {
        self.side
    }

    pub const fn state(&self) -> CursorState {
        self.state
    }

    pub const fn is_completed(&self) -> bool {
        matches!(self.state, CursorState::Completed)
    }

    /// `true` once the upstream signalled completion (or failed, or was cancelled).
    pub const fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    pub const fn has_value(&self) -> bool {
        self.slot.is_some()
    }

    /// Binds the upstream subscription.
    ///
    /// # Errors
    ///
    /// [`MergeError::ProtocolViolation`] if the cursor was already bound.
    pub fn subscribe(&mut self, subscription: Arc<dyn Subscription>) -> Result<()> {
        if self.state != CursorState::Created {
            return Err(self.violation("subscribed twice"));
        }
        self.subscription = Some(subscription);
        self.transition(CursorState::Subscribed);
        self.transition(CursorState::Idle);
        Ok(())
    }

    /// Moves `Idle -> Requested` and returns the subscription to call
    /// `request(1)` on. In any other state this does nothing and returns `None`,
    /// so at most one request is ever in flight.
    pub fn request_next(&mut self) -> Option<Arc<dyn Subscription>> {
        if self.state != CursorState::Idle {
            return None;
        }
        let subscription = self.subscription.clone()?;
        self.transition(CursorState::Requested);
        Some(subscription)
    }

    /// Buffers a delivered item.
    ///
    /// # Errors
    ///
    /// [`MergeError::ProtocolViolation`] unless a request was outstanding.
    pub fn on_next(&mut self, value: T) -> Result<()> {
        if self.state != CursorState::Requested {
            return Err(self.violation("delivered a value without an outstanding request"));
        }
        self.slot = Some(value);
        self.transition(CursorState::Ready);
        Ok(())
    }

    /// Marks the source exhausted. A buffered item is still handed out; the
    /// cursor completes once it is popped.
    pub fn on_complete(&mut self) {
        self.exhausted = true;
        match self.state {
            CursorState::Ready | CursorState::Examining | CursorState::Completed => {}
            _ => self.settle(),
        }
    }

    /// Terminates the cursor after an upstream failure. The upstream is gone,
    /// so its subscription is dropped without a cancel.
    pub fn on_error(&mut self) {
        self.exhausted = true;
        self.slot = None;
        self.settle();
    }

    /// Looks at the buffered head without consuming it.
    pub fn peek(&mut self) -> Peek<'_, T> {
        match self.state {
            CursorState::Ready | CursorState::Examining => match self.slot.as_ref() {
                Some(value) => {
                    if self.state == CursorState::Ready {
                        trace!(
                            "[{}] {} cursor: {} -> {}",
                            self.label,
                            self.side,
                            self.state,
                            CursorState::Examining
                        );
                        self.state = CursorState::Examining;
                    }
                    Peek::Value(value)
                }
                None => Peek::Pending,
            },
            CursorState::Completed => Peek::Exhausted,
            _ => Peek::Pending,
        }
    }

    /// Consumes the item under examination.
    ///
    /// # Errors
    ///
    /// [`MergeError::ProtocolViolation`] unless the cursor is `Examining`.
    pub fn pop(&mut self) -> Result<T> {
        if self.state != CursorState::Examining {
            return Err(self.violation("pop outside of examination"));
        }
        let value = self
            .slot
            .take()
            .ok_or_else(|| self.violation("examining an empty slot"))?;
        if self.exhausted {
            self.settle();
        } else {
            self.transition(CursorState::Idle);
        }
        Ok(value)
    }

    /// Puts the item under examination back for the next round.
    ///
    /// # Errors
    ///
    /// [`MergeError::ProtocolViolation`] unless the cursor is `Examining`.
    pub fn unpeek(&mut self) -> Result<()> {
        if self.state != CursorState::Examining {
            return Err(self.violation("unpeek outside of examination"));
        }
        self.transition(CursorState::Ready);
        Ok(())
    }

    /// Completes the cursor and hands back the subscription to cancel.
    ///
    /// Idempotent: later calls return `None`.
    pub fn cancel(&mut self) -> Option<Arc<dyn Subscription>> {
        self.exhausted = true;
        self.slot = None;
        let subscription = self.subscription.take();
        if self.state != CursorState::Completed {
            self.transition(CursorState::Completed);
        }
        subscription
    }

    /// Drops the subscription without cancelling it.
    pub fn release(&mut self) {
        self.subscription = None;
    }

    fn settle(&mut self) {
        self.subscription = None;
        if self.state != CursorState::Completed {
            self.transition(CursorState::Completed);
        }
    }

    fn transition(&mut self, next: CursorState) {
        trace!(
            "[{}] {} cursor: {} -> {}",
            self.label,
            self.side,
            self.state,
            next
        );
        self.state = next;
    }

    fn violation(&self, what: &str) -> MergeError {
        MergeError::protocol_violation(format!(
            "[{}] {} source {what} (state {})",
            self.label, self.side, self.state
        ))
    }
}

impl<T> fmt::Debug for SourceCursor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceCursor")
            .field("side", &self.side)
            .field("label", &self.label)
            .field("state", &self.state)
            .field("buffered", &self.slot.is_some())
            .field("exhausted", &self.exhausted)
            .field("bound", &self.subscription.is_some())
            .finish()
    }
}
