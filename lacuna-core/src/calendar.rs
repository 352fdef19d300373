use chrono::{DateTime, TimeDelta, Utc};
use chrono_tz::Tz;

/// Horizon (days) past which a calendar stops answering `next_*` queries.
pub const DEFAULT_LOOKAHEAD_DAYS: u32 = 370;

/// One regular trading session, already adjusted for early closes and late
/// opens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Session {
    /// First open instant of the session.
    pub open: DateTime<Utc>,
    /// Close instant (exclusive).
    pub close: DateTime<Utc>,
}

impl Session {
    /// Length of the session.
    #[must_use]
    pub fn duration(&self) -> TimeDelta {
        self.close - self.open
    }
}

/// Exchange hours provider consulted by the fill-forward algorithms.
///
/// Implementations answer in absolute instants; the exchange time zone is
/// exposed so callers can check it matches their configuration. Adjacent
/// open segments (for example pre-market followed by the regular session)
/// are treated as one merged open interval by the `next_*` queries.
///
/// `next_*` queries return `None` when nothing is found within
/// [`lookahead_days`](ExchangeCalendar::lookahead_days) of the query instant.
pub trait ExchangeCalendar: Send + Sync {
    /// Time zone the exchange hours are defined in.
    fn time_zone(&self) -> Tz;

    /// Search horizon of the `next_*` queries.
    fn lookahead_days(&self) -> u32 {
        DEFAULT_LOOKAHEAD_DAYS
    }

    /// Whether the market is open at `at`.
    fn is_open(&self, at: DateTime<Utc>, extended_hours: bool) -> bool;

    /// Start of the first open interval beginning at or after `after`.
    ///
    /// If the market is open at `after`, this is the start of the next
    /// interval following the current one.
    fn next_open(&self, after: DateTime<Utc>, extended_hours: bool) -> Option<DateTime<Utc>>;

    /// End of the first open interval ending strictly after `after`.
    fn next_close(&self, after: DateTime<Utc>, extended_hours: bool) -> Option<DateTime<Utc>>;

    /// First regular session whose open is at or after `after`.
    fn next_session(&self, after: DateTime<Utc>) -> Option<Session>;

    /// Whether the market is open at any instant of `[start, end)`.
    fn is_open_during(&self, start: DateTime<Utc>, end: DateTime<Utc>, extended_hours: bool) -> bool {
        if start >= end {
            return false;
        }
        self.is_open(start, extended_hours)
            || self
                .next_open(start, extended_hours)
                .is_some_and(|open| open < end)
    }

    /// Whether every instant of `[start, end)` lies in one open interval.
    fn is_open_for_entire(&self, start: DateTime<Utc>, end: DateTime<Utc>, extended_hours: bool) -> bool {
        if start >= end {
            return false;
        }
        self.is_open(start, extended_hours)
            && self
                .next_close(start, extended_hours)
                .is_some_and(|close| close >= end)
    }
}

impl<C: ExchangeCalendar + ?Sized> ExchangeCalendar for std::sync::Arc<C> {
    fn time_zone(&self) -> Tz {
        (**self).time_zone()
    }
    fn lookahead_days(&self) -> u32 {
        (**self).lookahead_days()
    }
    fn is_open(&self, at: DateTime<Utc>, extended_hours: bool) -> bool {
        (**self).is_open(at, extended_hours)
    }
    fn next_open(&self, after: DateTime<Utc>, extended_hours: bool) -> Option<DateTime<Utc>> {
        (**self).next_open(after, extended_hours)
    }
    fn next_close(&self, after: DateTime<Utc>, extended_hours: bool) -> Option<DateTime<Utc>> {
        (**self).next_close(after, extended_hours)
    }
    fn next_session(&self, after: DateTime<Utc>) -> Option<Session> {
        (**self).next_session(after)
    }
}
