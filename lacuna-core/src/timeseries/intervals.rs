//! Reference intervals: the candidate synthesis steps between two real data
//! points, or between a real point and a moving upper bound.
//!
//! The computation is lazy. Each step re-reads the fill-forward cadence cell,
//! so a cadence change made by the owning subscription takes effect on the
//! very next step. Every step is bounded by a probe budget and the calendar's
//! own lookahead, so no query can loop forever.

use chrono::{DateTime, Utc};

use crate::calendar::ExchangeCalendar;
use crate::timeseries::grid::{next_boundary, previous_boundary};
use crate::{FillForwardResolution, LacunaError, MarketContext, Resolution};

/// Candidates inspected per step before the search gives up.
pub const MAX_PROBES: u32 = 4096;

/// One synthesis step: the half-open span `[start, end)` a filled bar covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FillStep {
    /// Start of the synthesized bar.
    pub start: DateTime<Utc>,
    /// End of the synthesized bar.
    pub end: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Limit {
    /// Steps must end strictly before this instant.
    Before(DateTime<Utc>),
    /// Steps may end at this instant.
    Through(DateTime<Utc>),
}

impl Limit {
    fn admits(self, end: DateTime<Utc>) -> bool {
        match self {
            Self::Before(t) => end < t,
            Self::Through(t) => end <= t,
        }
    }
}

/// Lazy sequence of synthesis steps starting after a cursor.
///
/// The cursor is the end of the last emitted bar. Steps come out strictly
/// increasing by `end`, never cross closed market time, and never pass the
/// configured limit.
#[derive(Debug, Clone)]
pub struct ReferenceIntervals {
    cursor: DateTime<Utc>,
    limit: Limit,
    data_resolution: Resolution,
    fill_forward: FillForwardResolution,
    context: MarketContext,
}

impl ReferenceIntervals {
    /// Steps after `previous_end` ending strictly before `next_end`.
    ///
    /// Used between two real points: the real point at `next_end` occupies
    /// the final slot itself.
    #[must_use]
    pub fn before(
        previous_end: DateTime<Utc>,
        next_end: DateTime<Utc>,
        data_resolution: Resolution,
        fill_forward: FillForwardResolution,
        context: MarketContext,
    ) -> Self {
        Self {
            cursor: previous_end,
            limit: Limit::Before(next_end),
            data_resolution,
            fill_forward,
            context,
        }
    }

    /// Steps after `previous_end` ending at or before `until`.
    ///
    /// Used toward the subscription end and toward the live clock.
    #[must_use]
    pub fn through(
        previous_end: DateTime<Utc>,
        until: DateTime<Utc>,
        data_resolution: Resolution,
        fill_forward: FillForwardResolution,
        context: MarketContext,
    ) -> Self {
        Self {
            cursor: previous_end,
            limit: Limit::Through(until),
            data_resolution,
            fill_forward,
            context,
        }
    }

    /// End of the last committed step (initially the previous bar's end).
    #[must_use]
    pub const fn cursor(&self) -> DateTime<Utc> {
        self.cursor
    }

    /// Compute the next step without consuming it.
    ///
    /// # Errors
    /// `CalendarExhausted` if the calendar has no open market within its
    /// lookahead, `SearchExhausted` if no tradable boundary is found within
    /// [`MAX_PROBES`] candidates.
    pub fn peek_step(&self, calendar: &dyn ExchangeCalendar) -> Result<Option<FillStep>, LacunaError> {
        let cadence = self.fill_forward.get();
        if !cadence.supports_fill_forward() || !self.data_resolution.supports_fill_forward() {
            return Ok(None);
        }
        let period = cadence.min(self.data_resolution);
        if period == Resolution::Daily && self.context.strict_daily_sessions {
            return self.session_step(calendar);
        }
        self.grid_step(calendar, cadence, period)
    }

    /// Advance the cursor past `step`.
    pub fn commit(&mut self, step: FillStep) {
        if step.end > self.cursor {
            self.cursor = step.end;
        }
    }

    /// Compute and consume the next step.
    ///
    /// # Errors
    /// See [`peek_step`](Self::peek_step).
    pub fn next_step(&mut self, calendar: &dyn ExchangeCalendar) -> Result<Option<FillStep>, LacunaError> {
        let step = self.peek_step(calendar)?;
        if let Some(s) = step {
            self.commit(s);
        }
        Ok(step)
    }

    /// Iterate the remaining steps against `calendar`.
    pub fn iter(self, calendar: &dyn ExchangeCalendar) -> Steps<'_> {
        Steps {
            inner: self,
            calendar,
            done: false,
        }
    }

    fn session_step(&self, calendar: &dyn ExchangeCalendar) -> Result<Option<FillStep>, LacunaError> {
        let Some(session) = calendar.next_session(self.cursor) else {
            return Err(exhausted(calendar, self.cursor));
        };
        if !self.limit.admits(session.close) {
            return Ok(None);
        }
        Ok(Some(FillStep {
            start: session.open,
            end: session.close,
        }))
    }

    fn grid_step(
        &self,
        calendar: &dyn ExchangeCalendar,
        cadence: Resolution,
        period: Resolution,
    ) -> Result<Option<FillStep>, LacunaError> {
        let tz = self.context.data_time_zone;
        let extended = self.context.extended_market_hours;
        let coarse = cadence > self.data_resolution;
        // after a coarse cadence skips closed time, the first candidate is the
        // first data-resolution bar after the reopen
        let mut realign = false;
        let mut cursor = self.cursor;

        for _ in 0..MAX_PROBES {
            let grid = if realign { self.data_resolution } else { cadence };
            let Some(end) = next_boundary(cursor, grid, tz) else {
                return Ok(None);
            };
            if !self.limit.admits(end) {
                return Ok(None);
            }
            let start = period_start(end, period, tz)?;
            let tradable = if period == Resolution::Daily {
                calendar.is_open_during(start, end, extended)
            } else {
                calendar.is_open_for_entire(start, end, extended)
            };
            if tradable {
                return Ok(Some(FillStep { start, end }));
            }

            let Some(open) = calendar.next_open(start, extended) else {
                return Err(exhausted(calendar, start));
            };
            if coarse && open >= end {
                realign = true;
                cursor = open;
            } else {
                cursor = open.max(end);
            }
        }

        #[cfg(feature = "tracing")]
        tracing::error!(
            target = "lacuna::intervals",
            after = %self.cursor,
            probes = MAX_PROBES,
            "no tradable fill-forward boundary found"
        );
        Err(LacunaError::search_exhausted(self.cursor, MAX_PROBES))
    }
}

fn period_start(end: DateTime<Utc>, period: Resolution, tz: chrono_tz::Tz) -> Result<DateTime<Utc>, LacunaError> {
    let start = if period == Resolution::Daily {
        previous_boundary(end, period, tz)
    } else {
        period.span().and_then(|span| end.checked_sub_signed(span))
    };
    start.ok_or_else(|| LacunaError::invalid_arg(format!("no {period} bar ends at {end}")))
}

fn exhausted(calendar: &dyn ExchangeCalendar, after: DateTime<Utc>) -> LacunaError {
    #[cfg(feature = "tracing")]
    tracing::error!(
        target = "lacuna::intervals",
        after = %after,
        lookahead_days = calendar.lookahead_days(),
        "calendar has no open market within its lookahead"
    );
    LacunaError::calendar_exhausted(after, calendar.lookahead_days())
}

/// Iterator over the steps of a [`ReferenceIntervals`].
///
/// Yields at most one error, then ends.
pub struct Steps<'a> {
    inner: ReferenceIntervals,
    calendar: &'a dyn ExchangeCalendar,
    done: bool,
}

impl std::fmt::Debug for Steps<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Steps")
            .field("inner", &self.inner)
            .field("done", &self.done)
            .finish_non_exhaustive()
    }
}

impl Iterator for Steps<'_> {
    type Item = Result<FillStep, LacunaError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.inner.next_step(self.calendar) {
            Ok(Some(step)) => Some(Ok(step)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

impl std::iter::FusedIterator for Steps<'_> {}

/// Steps strictly between a bar ending at `previous_end` and the next real
/// bar ending at `next_end`.
///
/// Empty when `previous_end >= next_end`.
pub fn reference_intervals(
    calendar: &dyn ExchangeCalendar,
    previous_end: DateTime<Utc>,
    next_end: DateTime<Utc>,
    data_resolution: Resolution,
    fill_forward: FillForwardResolution,
    context: MarketContext,
) -> Steps<'_> {
    ReferenceIntervals::before(previous_end, next_end, data_resolution, fill_forward, context).iter(calendar)
}
