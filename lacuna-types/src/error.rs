use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Unified error type for the lacuna workspace.
///
/// Delisting and end-of-subscription are not errors; they end a stream
/// gracefully. The variants here cover calendars that cannot answer within
/// their lookahead, invalid construction parameters, and malformed points.
#[derive(Debug, Error, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum LacunaError {
    /// The exchange calendar reported no open market within its lookahead window.
    #[error("calendar exhausted: no market open after {after} within {lookahead_days} days")]
    CalendarExhausted {
        /// Instant (UTC) the failed query started from.
        after: DateTime<Utc>,
        /// Lookahead horizon of the calendar, in days.
        lookahead_days: u32,
    },

    /// The reference-interval search gave up after inspecting its probe budget.
    #[error("no fill-forward boundary after {after} within {probes} probes")]
    SearchExhausted {
        /// Cursor (UTC) the search started from.
        after: DateTime<Utc>,
        /// Number of candidates inspected before giving up.
        probes: u32,
    },

    /// Invalid input argument.
    #[error("invalid argument: {0}")]
    InvalidArg(String),

    /// Issues with a data point (e.g. an end time before its start time).
    #[error("data issue: {0}")]
    Data(String),

    /// The feed queue was stopped; no further items are accepted.
    #[error("feed queue closed")]
    QueueClosed,
}

impl LacunaError {
    /// Helper: build a `CalendarExhausted` error.
    #[must_use]
    pub const fn calendar_exhausted(after: DateTime<Utc>, lookahead_days: u32) -> Self {
        Self::CalendarExhausted {
            after,
            lookahead_days,
        }
    }

    /// Helper: build a `SearchExhausted` error.
    #[must_use]
    pub const fn search_exhausted(after: DateTime<Utc>, probes: u32) -> Self {
        Self::SearchExhausted { after, probes }
    }

    /// Helper: build an `InvalidArg` error.
    pub fn invalid_arg(msg: impl Into<String>) -> Self {
        Self::InvalidArg(msg.into())
    }

    /// Helper: build a `Data` error.
    pub fn data(msg: impl Into<String>) -> Self {
        Self::Data(msg.into())
    }

    /// Whether the error came from the calendar side rather than from the caller.
    #[must_use]
    pub const fn is_calendar(&self) -> bool {
        matches!(
            self,
            Self::CalendarExhausted { .. } | Self::SearchExhausted { .. }
        )
    }
}
