//! Static fixtures for tests and demos. Helpers panic on malformed input.

pub mod bars;
pub mod calendars;

use chrono::{DateTime, NaiveDateTime, Utc};
use chrono_tz::Tz;
use lacuna_core::timeseries::grid::local_to_utc;

/// Parse `YYYY-MM-DD HH:MM[:SS]` as wall-clock time in `tz`.
///
/// Ambiguous fall-back times resolve to the earlier instant.
#[must_use]
pub fn local(tz: Tz, s: &str) -> DateTime<Utc> {
    let naive = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M"))
        .expect("YYYY-MM-DD HH:MM[:SS]");
    local_to_utc(tz, naive).expect("representable local time")
}

/// Parse an RFC 3339 instant.
#[must_use]
pub fn utc(s: &str) -> DateTime<Utc> {
    s.parse().expect("RFC 3339 instant")
}
