// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! The merge engine.
//!
//! All state (both cursors, the downstream demand and the lifecycle phase)
//! sits behind one mutex. Every signal, from either upstream or from the
//! downstream, mutates that state and then runs the drain loop. The drain
//! loop has a single owner at a time (work-in-progress counter): it takes the
//! lock, computes one step, releases the lock and only then calls out to the
//! downstream or the upstreams. Signals that arrive while another thread (or
//! the same thread, re-entrantly) is draining only bump the counter, and the
//! owner loops again before it lets go.

use crate::classified::{ClassificationKind, Classified};
use crate::comparator::Comparator;
use crate::cursor::{CursorState, Peek, Side, SourceCursor};
use crate::policy::ClassificationPolicy;
use crate::statistics::MergeStatistics;
use core::cmp::Ordering as CmpOrdering;
use diffmerge_core::logging::{debug, error, trace, warn};
use diffmerge_core::{DemandTracker, MergeError, Result, ResultExt, Subscriber, Subscription};
use parking_lot::Mutex;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

enum Phase {
    Running,
    /// Failed but not yet reported downstream.
    Failed(MergeError),
    Cancelled,
    Finished,
}

struct MergeState<A, B> {
    left: SourceCursor<A>,
    right: SourceCursor<B>,
    demand: DemandTracker,
    phase: Phase,
}

impl<A, B> MergeState<A, B> {
    /// Puts back whichever head was looked at but not consumed.
    fn restore(&mut self) -> Result<()> {
        self.restore_left()?;
        self.restore_right()
    }

    fn restore_left(&mut self) -> Result<()> {
        if self.left.state() == CursorState::Examining {
            self.left.unpeek()?;
        }
        Ok(())
    }

    fn restore_right(&mut self) -> Result<()> {
        if self.right.state() == CursorState::Examining {
            self.right.unpeek()?;
        }
        Ok(())
    }
}

/// Upstream requests decided under the lock, issued after it is released.
#[derive(Default)]
struct Requests {
    left: Option<Arc<dyn Subscription>>,
    right: Option<Arc<dyn Subscription>>,
}

impl Requests {
    fn collect<A, B>(state: &mut MergeState<A, B>) -> Self {
        Self {
            left: state.left.request_next(),
            right: state.right.request_next(),
        }
    }

    fn issue(self) {
        for subscription in [self.left, self.right].into_iter().flatten() {
            subscription.request(1);
        }
    }
}

enum Step<O> {
    /// Deliver a value, then keep going.
    Emit(O, Requests),
    /// A classification produced nothing; keep going.
    Continue(Requests),
    /// Nothing to do until the next signal.
    Wait(Requests),
    Complete,
    Fail(MergeError, [(Side, Option<Arc<dyn Subscription>>); 2]),
    /// Terminal already signalled.
    Halt,
}

pub(crate) struct Coordinator<A, B, O> {
    state: Mutex<MergeState<A, B>>,
    wip: AtomicUsize,
    comparator: Comparator<A, B>,
    policy: ClassificationPolicy<A, B, O>,
    downstream: Arc<dyn Subscriber<O>>,
    statistics: MergeStatistics,
    label: Arc<str>,
}

impl<A, B, O> Coordinator<A, B, O>
where
    A: Send + 'static,
    B: Send + 'static,
    O: Send + 'static,
{
    pub(crate) fn new(
        comparator: Comparator<A, B>,
        policy: ClassificationPolicy<A, B, O>,
        downstream: Arc<dyn Subscriber<O>>,
        statistics: MergeStatistics,
        label: &str,
    ) -> Self {
        let label: Arc<str> = Arc::from(label);
        Self {
            state: Mutex::new(MergeState {
                left: SourceCursor::new(Side::Left).with_label(label.clone()),
                right: SourceCursor::new(Side::Right).with_label(label.clone()),
                demand: DemandTracker::new(),
                phase: Phase::Running,
            }),
            wip: AtomicUsize::new(0),
            comparator,
            policy,
            downstream,
            statistics,
            label,
        }
    }

    fn drain(&self) {
        if self.wip.fetch_add(1, Ordering::AcqRel) != 0 {
            return;
        }
        let mut missed = 1;
        loop {
            while self.pump() {}
            missed = self.wip.fetch_sub(missed, Ordering::AcqRel) - missed;
            if missed == 0 {
                break;
            }
        }
    }

    /// Runs one step and performs its side effects. Returns `true` while
    /// there may be more work without a new signal.
    fn pump(&self) -> bool {
        let step = {
            let mut state = self.state.lock();
            self.step(&mut state)
        };

        match step {
            Step::Emit(value, requests) => {
                // A cancel or failure from another thread may have landed
                // since the step was computed; the next step reports it.
                if !self.is_running() {
                    return true;
                }
                self.downstream.on_next(value);
                self.issue(requests);
                true
            }
            Step::Continue(requests) => {
                self.issue(requests);
                true
            }
            Step::Wait(requests) => {
                self.issue(requests);
                false
            }
            Step::Complete => {
                debug!(
                    "[{}] merge completed ({})",
                    self.label,
                    self.statistics.snapshot()
                );
                self.downstream.on_complete();
                false
            }
            Step::Fail(failure, subscriptions) => {
                if failure.is_permanent() {
                    error!("[{}] merge failed: {}", self.label, failure);
                } else {
                    warn!("[{}] merge failed: {}", self.label, failure);
                }
                // The first cancel error is already logged; the downstream
                // gets the failure that ended the merge.
                let _ = self.cancel_all(subscriptions);
                self.downstream.on_error(failure);
                false
            }
            Step::Halt => false,
        }
    }

    fn is_running(&self) -> bool {
        matches!(self.state.lock().phase, Phase::Running)
    }

    /// Sends the upstream requests unless the merge has stopped meanwhile,
    /// e.g. because the downstream cancelled from inside `on_next`.
    fn issue(&self, requests: Requests) {
        if self.is_running() {
            requests.issue();
        }
    }

    fn step(&self, state: &mut MergeState<A, B>) -> Step<O> {
        match core::mem::replace(&mut state.phase, Phase::Finished) {
            Phase::Running => state.phase = Phase::Running,
            Phase::Failed(failure) => return Self::fail(state, failure),
            terminal => {
                state.phase = terminal;
                return Step::Halt;
            }
        }

        match self.advance(state) {
            Ok(step) => step,
            Err(failure) => Self::fail(state, failure),
        }
    }

    fn advance(&self, state: &mut MergeState<A, B>) -> Result<Step<O>> {
        if state.left.is_completed() && state.right.is_completed() {
            state.phase = Phase::Finished;
            state.left.release();
            state.right.release();
            return Ok(Step::Complete);
        }

        if !state.demand.has_demand() {
            return Ok(Step::Wait(Requests::default()));
        }

        let requests = Requests::collect(state);
        let Some(classified) = self.take_heads(state)? else {
            state.restore()?;
            return Ok(Step::Wait(requests));
        };

        let kind = classified.kind();
        self.statistics.record_classification(kind);

        match self.policy.apply(classified)? {
            Some(value) => {
                state.demand.try_consume();
                self.statistics.record_emitted();
                trace!(
                    "[{}] emit {} (demand left: {})",
                    self.label,
                    kind,
                    state.demand
                );
                let requests = if state.demand.has_demand() {
                    Requests::collect(state)
                } else {
                    Requests::default()
                };
                Ok(Step::Emit(value, requests))
            }
            None => {
                self.statistics.record_filtered();
                trace!("[{}] {} filtered by policy", self.label, kind);
                Ok(Step::Continue(Requests::collect(state)))
            }
        }
    }

    /// Compares the two heads and consumes the one(s) that sort first.
    /// `None` when either side has nothing to look at yet.
    fn take_heads(&self, state: &mut MergeState<A, B>) -> Result<Option<Classified<A, B>>> {
        let kind = match (state.left.peek(), state.right.peek()) {
            (Peek::Pending, _) | (_, Peek::Pending) | (Peek::Exhausted, Peek::Exhausted) => {
                return Ok(None);
            }
            (Peek::Exhausted, Peek::Value(_)) => ClassificationKind::RemovedOnly,
            (Peek::Value(_), Peek::Exhausted) => ClassificationKind::AddedOnly,
            (Peek::Value(a), Peek::Value(b)) => {
                match catch_unwind(AssertUnwindSafe(|| (self.comparator)(a, b))) {
                    Ok(CmpOrdering::Less) => ClassificationKind::AddedOnly,
                    Ok(CmpOrdering::Equal) => ClassificationKind::Matched,
                    Ok(CmpOrdering::Greater) => ClassificationKind::RemovedOnly,
                    Err(payload) => return Err(MergeError::from_panic(payload.as_ref())),
                }
            }
        };

        let classified = match kind {
            ClassificationKind::AddedOnly => {
                state.restore_right()?;
                Classified::AddedOnly(state.left.pop()?)
            }
            ClassificationKind::Matched => {
                Classified::Matched(state.left.pop()?, state.right.pop()?)
            }
            ClassificationKind::RemovedOnly => {
                state.restore_left()?;
                Classified::RemovedOnly(state.right.pop()?)
            }
        };
        Ok(Some(classified))
    }

    fn fail(state: &mut MergeState<A, B>, failure: MergeError) -> Step<O> {
        state.phase = Phase::Finished;
        Step::Fail(
            failure,
            [
                (Side::Left, state.left.cancel()),
                (Side::Right, state.right.cancel()),
            ],
        )
    }

    /// Cancels every given subscription, even if an earlier one fails.
    /// Returns the first failure.
    fn cancel_all(&self, subscriptions: [(Side, Option<Arc<dyn Subscription>>); 2]) -> Result<()> {
        let mut first_failure = None;
        for (side, subscription) in subscriptions {
            let Some(subscription) = subscription else {
                continue;
            };
            let outcome = subscription
                .cancel()
                .with_context(|| format!("[{}] cancelling {side} source", self.label));
            if let Err(failure) = outcome {
                error!("{}", failure);
                first_failure.get_or_insert(failure);
            }
        }
        first_failure.map_or(Ok(()), Err)
    }

    fn bind(
        &self,
        side: Side,
        subscription: Arc<dyn Subscription>,
        attach: impl FnOnce(&mut MergeState<A, B>, Arc<dyn Subscription>) -> Result<()>,
    ) {
        let rejected = {
            let mut state = self.state.lock();
            if !matches!(state.phase, Phase::Running) {
                Some(subscription)
            } else if let Err(violation) = attach(&mut state, subscription.clone()) {
                state.phase = Phase::Failed(violation);
                Some(subscription)
            } else {
                None
            }
        };

        if let Some(subscription) = rejected {
            debug!("[{}] rejecting {} subscription", self.label, side);
            if let Err(failure) = subscription.cancel() {
                error!("[{}] cancelling {} source: {}", self.label, side, failure);
            }
        }
        self.drain();
    }

    fn signal(&self, apply: impl FnOnce(&mut MergeState<A, B>) -> Result<()>) {
        {
            let mut state = self.state.lock();
            if matches!(state.phase, Phase::Running) {
                if let Err(failure) = apply(&mut state) {
                    state.phase = Phase::Failed(failure);
                }
            }
        }
        self.drain();
    }
}

impl<A, B, O> Subscription for Coordinator<A, B, O>
where
    A: Send + 'static,
    B: Send + 'static,
    O: Send + 'static,
{
    fn request(&self, n: u64) {
        {
            let mut state = self.state.lock();
            if matches!(state.phase, Phase::Running) {
                if n == 0 {
                    let violation = MergeError::protocol_violation(format!(
                        "[{}] downstream requested 0 items",
                        self.label
                    ));
                    state.phase = Phase::Failed(violation);
                } else {
                    state.demand.add(n);
                    trace!("[{}] demand +{} -> {}", self.label, n, state.demand);
                }
            }
        }
        self.drain();
    }

    fn cancel(&self) -> Result<()> {
        let subscriptions = {
            let mut state = self.state.lock();
            if matches!(state.phase, Phase::Running | Phase::Failed(_)) {
                debug!("[{}] cancelled by downstream", self.label);
                state.phase = Phase::Cancelled;
            }
            [
                (Side::Left, state.left.cancel()),
                (Side::Right, state.right.cancel()),
            ]
        };
        self.cancel_all(subscriptions)
    }
}

/// Binds the coordinator to the left source.
pub(crate) struct LeftSource<A, B, O>(pub(crate) Arc<Coordinator<A, B, O>>);

/// Binds the coordinator to the right source.
pub(crate) struct RightSource<A, B, O>(pub(crate) Arc<Coordinator<A, B, O>>);

impl<A, B, O> Subscriber<A> for LeftSource<A, B, O>
where
    A: Send + 'static,
    B: Send + 'static,
    O: Send + 'static,
{
    fn on_subscribe(&self, subscription: Arc<dyn Subscription>) {
        self.0
            .bind(Side::Left, subscription, |state, s| state.left.subscribe(s));
    }

    fn on_next(&self, value: A) {
        self.0.signal(|state| state.left.on_next(value));
    }

    fn on_error(&self, failure: MergeError) {
        self.0.signal(|state| {
            state.left.on_error();
            Err(failure)
        });
    }

    fn on_complete(&self) {
        self.0.signal(|state| {
            state.left.on_complete();
            Ok(())
        });
    }
}

impl<A, B, O> Subscriber<B> for RightSource<A, B, O>
where
    A: Send + 'static,
    B: Send + 'static,
    O: Send + 'static,
{
    fn on_subscribe(&self, subscription: Arc<dyn Subscription>) {
        self.0
            .bind(Side::Right, subscription, |state, s| state.right.subscribe(s));
    }

    fn on_next(&self, value: B) {
        self.0.signal(|state| state.right.on_next(value));
    }

    fn on_error(&self, failure: MergeError) {
        self.0.signal(|state| {
            state.right.on_error();
            Err(failure)
        });
    }

    fn on_complete(&self) {
        self.0.signal(|state| {
            state.right.on_complete();
            Ok(())
        });
    }
}
