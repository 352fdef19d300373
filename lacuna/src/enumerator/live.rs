use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use lacuna_core::{
    DataPoint, Dequeue, FeedConsumer, FillForwardResolution, GraceTimeouts, LacunaError, TimeProvider,
};
use lacuna_core::timeseries::grid::ceil_to_boundary;

use super::{EnumeratorState, Gap, LivePoll, LiveSource, Setup, Synthesizer};

/// Fill-forward over a live feed, driven by an injected clock.
///
/// Every [`advance`](Self::advance) returns promptly with one of: a real
/// point that has become due, a synthesized bar whose slot is older than
/// the grace timeout, [`LivePoll::Empty`] when there is nothing to report
/// yet, or [`LivePoll::Ended`] once the feed is stopped, the subscription
/// end has passed, or a final delisting was emitted.
///
/// While the market is closed no bars are synthesized; after a reopen the
/// next slot is computed from the open, so a long idle stretch does not
/// produce a burst of stale bars.
///
/// Auxiliary events wait until the slots before them are settled, by real
/// data or by an expired grace period, so they never force early fills.
pub struct LiveFillForward {
    feed: FeedConsumer<DataPoint>,
    clock: Arc<dyn TimeProvider>,
    grace: GraceTimeouts,
    synth: Synthesizer,
    /// Dequeued, unreleased points: auxiliary events, then at most one bar.
    pending: VecDeque<DataPoint>,
    gap: Option<Gap>,
    state: EnumeratorState,
}

impl std::fmt::Debug for LiveFillForward {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LiveFillForward")
            .field("state", &self.state)
            .field("last_end", &self.synth.last_end())
            .field("pending", &self.pending.len())
            .finish_non_exhaustive()
    }
}

impl LiveFillForward {
    pub(crate) fn new(
        feed: FeedConsumer<DataPoint>,
        clock: Arc<dyn TimeProvider>,
        grace: GraceTimeouts,
        setup: Setup,
    ) -> Self {
        Self {
            feed,
            clock,
            grace,
            synth: Synthesizer::new(setup),
            pending: VecDeque::new(),
            gap: None,
            state: EnumeratorState::Initial,
        }
    }

    /// Current lifecycle state.
    #[must_use]
    pub const fn state(&self) -> EnumeratorState {
        self.state
    }

    /// End time of the last emitted tradable bar, real or synthesized.
    #[must_use]
    pub const fn last_end(&self) -> Option<DateTime<Utc>> {
        self.synth.last_end()
    }

    /// Handle to the shared fill-forward cadence.
    #[must_use]
    pub const fn fill_forward_resolution(&self) -> &FillForwardResolution {
        &self.synth.setup.fill_forward
    }

    /// Lateness tolerated before a bar expected from the feed is synthesized.
    ///
    /// Interior sub-steps of a data bar, produced when the cadence is finer
    /// than the data, are not delayed; see [`grace_for`](Self::grace_for).
    #[must_use]
    pub const fn grace_period(&self) -> Duration {
        self.grace.maximum_data_timeout(
            self.synth.setup.data_resolution,
            self.synth.setup.context.strict_daily_sessions,
        )
    }

    /// Grace applied to the slot ending at `end`.
    ///
    /// A real bar can only end on the data-resolution grid, so a sub-step
    /// ending between two grid points is synthesized as soon as it closes.
    #[must_use]
    pub fn grace_for(&self, end: DateTime<Utc>) -> Duration {
        let setup = &self.synth.setup;
        let data = setup.data_resolution;
        let interior = setup.fill_forward.get() < data
            && ceil_to_boundary(end, data, setup.context.data_time_zone) != Some(end);
        if interior { Duration::ZERO } else { self.grace_period() }
    }

    fn grace_expired(&self, end: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        let grace = TimeDelta::from_std(self.grace_for(end)).unwrap_or(TimeDelta::MAX);
        now.checked_sub_signed(grace).is_some_and(|due_by| end <= due_by)
    }

    /// Stop the feed and end the stream. Idempotent.
    pub fn stop(&mut self) {
        self.feed.stop();
        self.finish();
    }

    fn finish(&mut self) {
        self.state = EnumeratorState::Exhausted;
        self.pending.clear();
        self.gap = None;
    }

    fn release(&mut self, point: DataPoint) -> Option<DataPoint> {
        if point.is_tradable() && self.synth.last_end().is_some_and(|l| point.end_time < l) {
            // its slot was already synthesized
            #[cfg(feature = "tracing")]
            tracing::warn!(
                target = "lacuna::live",
                symbol = %point.symbol,
                end = %point.end_time,
                last_end = ?self.synth.last_end(),
                "dropping stale live point"
            );
            return None;
        }
        self.synth.record(&point);
        if point.is_terminal() {
            #[cfg(feature = "tracing")]
            tracing::info!(
                target = "lacuna::live",
                symbol = %point.symbol,
                "delisted; ending live stream"
            );
            self.finish();
        }
        Some(point)
    }

    /// Synthesize the next slot once its grace period has run out.
    fn synthesize_due(&mut self, now: DateTime<Utc>) -> Result<Option<DataPoint>, LacunaError> {
        let limit = self.synth.setup.subscription_end.map_or(now, |end| end.min(now));
        let Some(steps) = self.synth.steps_through(limit) else {
            return Ok(None);
        };
        let Some(step) = steps.peek_step(self.synth.calendar())? else {
            return Ok(None);
        };
        if !self.grace_expired(step.end, now) {
            return Ok(None);
        }
        // a queued bar owns its own slot; a queued event caps the fill
        let claimed = self.pending.iter().any(|p| {
            if p.is_tradable() {
                step.end >= p.end_time
            } else {
                step.end > p.end_time
            }
        });
        if claimed {
            return Ok(None);
        }
        Ok(self.synth.synthesize(step))
    }

    /// Dequeue until a bar is held or the feed runs dry; `true` once it has ended.
    fn fill_pending(&mut self) -> bool {
        while self.pending.back().is_none_or(|p| !p.is_tradable()) {
            match self.feed.try_dequeue() {
                Dequeue::Ready(p) => self.pending.push_back(p),
                Dequeue::Empty => return false,
                Dequeue::Ended => return true,
            }
        }
        false
    }

    /// Next held point that may be released at `now`.
    fn take_due(&mut self, now: DateTime<Utc>) -> Result<Option<DataPoint>, LacunaError> {
        let Some(front) = self.pending.front() else {
            return Ok(None);
        };
        let (at, tradable) = (front.end_time, front.is_tradable());
        if tradable {
            return Ok(if at <= now { self.pending.pop_front() } else { None });
        }
        // a bar queued behind the event that ends no later goes first
        if self
            .pending
            .back()
            .is_some_and(|p| p.is_tradable() && p.end_time <= at && p.end_time <= now)
        {
            return Ok(self.pending.pop_back());
        }
        if at > now {
            return Ok(None);
        }
        let until = self.synth.setup.subscription_end.map_or(at, |end| end.min(at));
        if let Some(steps) = self.synth.steps_through(until)
            && steps.peek_step(self.synth.calendar())?.is_some()
        {
            // slots before the event are still open to real data
            return Ok(None);
        }
        Ok(self.pending.pop_front())
    }

    fn subscription_over(&self, now: DateTime<Utc>) -> bool {
        let Some(end) = self.synth.setup.subscription_end else {
            return false;
        };
        let grace = TimeDelta::from_std(self.grace_period()).unwrap_or(TimeDelta::MAX);
        now.checked_sub_signed(grace).is_some_and(|due_by| due_by >= end)
    }

    fn poll(&mut self) -> Result<LivePoll, LacunaError> {
        loop {
            match self.state {
                EnumeratorState::Exhausted => return Ok(LivePoll::Ended),
                EnumeratorState::Initial => self.state = EnumeratorState::Streaming,
                EnumeratorState::Streaming => {}
            }
            if self.feed.is_stopped() {
                self.finish();
                return Ok(LivePoll::Ended);
            }

            // catch-up fills owed before a point that just became due
            if let Some(gap) = self.gap.as_mut() {
                if let Some(step) = gap.next_step(self.synth.calendar())? {
                    if let Some(bar) = self.synth.synthesize(step) {
                        return Ok(LivePoll::Data(bar));
                    }
                    continue;
                }
                let Some(point) = self.gap.take().and_then(|g| g.deferred) else {
                    continue;
                };
                return Ok(self.release(point).map_or(LivePoll::Empty, LivePoll::Data));
            }

            let feed_ended = self.fill_pending();
            let now = self.clock.now();
            if let Some(point) = self.take_due(now)? {
                point.validate()?;
                if self
                    .synth
                    .setup
                    .subscription_end
                    .is_some_and(|end| point.end_time > end)
                {
                    // beyond the subscription; only the trailing fill remains
                    continue;
                }
                match self.synth.steps_for(&point) {
                    Some(steps) => {
                        self.gap = Some(Gap::new(steps, Some(point)));
                        continue;
                    }
                    None => return Ok(self.release(point).map_or(LivePoll::Empty, LivePoll::Data)),
                }
            }

            if let Some(bar) = self.synthesize_due(now)? {
                return Ok(LivePoll::Data(bar));
            }
            if feed_ended && self.pending.is_empty() && self.synth.setup.subscription_end.is_none() {
                self.finish();
                return Ok(LivePoll::Ended);
            }
            if self.subscription_over(now) {
                #[cfg(feature = "tracing")]
                tracing::info!(
                    target = "lacuna::live",
                    last_end = ?self.synth.last_end(),
                    "subscription end reached"
                );
                self.finish();
                return Ok(LivePoll::Ended);
            }
            return Ok(LivePoll::Empty);
        }
    }
}

impl LiveSource for LiveFillForward {
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "lacuna::live::advance",
            level = "trace",
            skip(self),
            fields(last_end = ?self.synth.last_end()),
        )
    )]
    fn advance(&mut self) -> Result<LivePoll, LacunaError> {
        let polled = self.poll();
        if polled.is_err() {
            #[cfg(feature = "tracing")]
            tracing::error!(target = "lacuna::live", "live enumeration failed; ending stream");
            self.finish();
        }
        polled
    }
}
