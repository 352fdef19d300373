//! Fill-forward enumerators and the synthesis state they share.

pub(crate) mod bounded;
pub(crate) mod live;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use lacuna_core::{
    DataPoint, ExchangeCalendar, FillForwardResolution, FillStep, LacunaError, MarketContext,
    ReferenceIntervals, Resolution,
};

/// Lifecycle of an enumerator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EnumeratorState {
    /// Nothing requested yet.
    Initial,
    /// Producing data.
    Streaming,
    /// Finished: underlying released, every further call reports the end.
    Exhausted,
}

/// Result of one live poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LivePoll {
    /// A real or synthesized point.
    Data(DataPoint),
    /// Nothing new yet; poll again later.
    Empty,
    /// The stream is over.
    Ended,
}

impl LivePoll {
    /// The carried point, if any.
    #[must_use]
    pub fn into_data(self) -> Option<DataPoint> {
        match self {
            Self::Data(p) => Some(p),
            Self::Empty | Self::Ended => None,
        }
    }
}

/// A non-blocking source of live points, driven by repeated polling.
pub trait LiveSource: Send {
    /// Return promptly with new data, nothing, or end-of-stream.
    ///
    /// # Errors
    /// Calendar exhaustion or malformed input; the source is finished afterwards.
    fn advance(&mut self) -> Result<LivePoll, LacunaError>;
}

/// Settings fixed when an enumerator is built.
#[derive(Clone)]
pub(crate) struct Setup {
    pub(crate) calendar: Arc<dyn ExchangeCalendar>,
    pub(crate) context: MarketContext,
    pub(crate) data_resolution: Resolution,
    pub(crate) fill_forward: FillForwardResolution,
    pub(crate) subscription_end: Option<DateTime<Utc>>,
}

/// Baseline tracking and step construction common to both enumerators.
pub(crate) struct Synthesizer {
    pub(crate) setup: Setup,
    baseline: Option<DataPoint>,
    last_end: Option<DateTime<Utc>>,
}

impl Synthesizer {
    pub(crate) const fn new(setup: Setup) -> Self {
        Self {
            setup,
            baseline: None,
            last_end: None,
        }
    }

    pub(crate) const fn last_end(&self) -> Option<DateTime<Utc>> {
        self.last_end
    }

    pub(crate) fn calendar(&self) -> &dyn ExchangeCalendar {
        self.setup.calendar.as_ref()
    }

    /// Steps between the last emitted bar and a real bar ending at `next_end`.
    pub(crate) fn steps_before(&self, next_end: DateTime<Utc>) -> Option<ReferenceIntervals> {
        self.baseline.as_ref()?;
        let prev = self.last_end?;
        Some(ReferenceIntervals::before(
            prev,
            next_end,
            self.setup.data_resolution,
            self.setup.fill_forward.clone(),
            self.setup.context,
        ))
    }

    /// Steps between the last emitted bar and `until`, inclusive.
    pub(crate) fn steps_through(&self, until: DateTime<Utc>) -> Option<ReferenceIntervals> {
        self.baseline.as_ref()?;
        let prev = self.last_end?;
        Some(ReferenceIntervals::through(
            prev,
            until,
            self.setup.data_resolution,
            self.setup.fill_forward.clone(),
            self.setup.context,
        ))
    }

    /// Build the synthetic bar for `step` from the baseline.
    pub(crate) fn synthesize(&mut self, step: FillStep) -> Option<DataPoint> {
        let bar = self.baseline.as_ref()?.fill_forward(step.start, step.end);
        self.last_end = Some(self.last_end.map_or(step.end, |l| l.max(step.end)));
        #[cfg(feature = "tracing")]
        tracing::trace!(
            target = "lacuna::fill_forward",
            symbol = %bar.symbol,
            start = %step.start,
            end = %step.end,
            "synthesized bar"
        );
        Some(bar)
    }

    /// Make a real tradable point the new baseline.
    pub(crate) fn record(&mut self, point: &DataPoint) {
        if point.is_tradable() {
            self.last_end = Some(self.last_end.map_or(point.end_time, |l| l.max(point.end_time)));
            self.baseline = Some(point.clone());
        }
    }

    /// Steps to fill before `point` is emitted, or `None` to emit it directly.
    pub(crate) fn steps_for(&self, point: &DataPoint) -> Option<ReferenceIntervals> {
        if point.is_tradable() {
            if self.last_end.is_some_and(|prev| point.end_time < prev) {
                #[cfg(feature = "tracing")]
                tracing::warn!(
                    target = "lacuna::fill_forward",
                    symbol = %point.symbol,
                    end = %point.end_time,
                    "point ends before the previous one; emitting without fill"
                );
                return None;
            }
            self.steps_before(point.end_time)
        } else {
            self.steps_through(point.time)
        }
    }
}

/// Fills pending before an optional deferred point.
pub(crate) struct Gap {
    pub(crate) steps: ReferenceIntervals,
    pub(crate) deferred: Option<DataPoint>,
    pub(crate) filled: u32,
}

impl Gap {
    pub(crate) const fn new(steps: ReferenceIntervals, deferred: Option<DataPoint>) -> Self {
        Self {
            steps,
            deferred,
            filled: 0,
        }
    }

    /// Next step of the gap, logging the gap once it proves non-empty.
    pub(crate) fn next_step(&mut self, calendar: &dyn ExchangeCalendar) -> Result<Option<FillStep>, LacunaError> {
        let step = self.steps.next_step(calendar)?;
        if step.is_some() {
            #[cfg(feature = "tracing")]
            {
                if let (0, Some(first)) = (self.filled, step) {
                    tracing::debug!(
                        target = "lacuna::fill_forward",
                        first_end = %first.end,
                        before = ?self.deferred.as_ref().map(|p| p.end_time),
                        "gap detected; synthesizing"
                    );
                }
            }
            self.filled = self.filled.saturating_add(1);
        }
        Ok(step)
    }
}
