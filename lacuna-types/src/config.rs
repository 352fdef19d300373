//! Configuration types shared by the enumerators and the live pump.

use std::time::Duration;

use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::Resolution;

/// Calendar query context of one enumerator instance.
///
/// Immutable for the lifetime of the enumerator it configures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketContext {
    /// Time zone the exchange calendar is expressed in.
    pub exchange_time_zone: Tz,
    /// Time zone bars are aligned to (daily bars start at local midnight here).
    pub data_time_zone: Tz,
    /// Whether pre-market and after-hours segments count as open.
    pub extended_market_hours: bool,
    /// Daily bars span exactly one regular session instead of a calendar day.
    pub strict_daily_sessions: bool,
}

impl MarketContext {
    /// Context with regular hours only and calendar-day daily bars.
    #[must_use]
    pub const fn new(exchange_time_zone: Tz, data_time_zone: Tz) -> Self {
        Self {
            exchange_time_zone,
            data_time_zone,
            extended_market_hours: false,
            strict_daily_sessions: false,
        }
    }

    /// Count extended-hours segments as open.
    #[must_use]
    pub const fn with_extended_market_hours(mut self, yes: bool) -> Self {
        self.extended_market_hours = yes;
        self
    }

    /// Make daily bars span exactly one session.
    #[must_use]
    pub const fn with_strict_daily_sessions(mut self, yes: bool) -> Self {
        self.strict_daily_sessions = yes;
        self
    }
}

impl Default for MarketContext {
    fn default() -> Self {
        Self::new(Tz::UTC, Tz::UTC)
    }
}

/// Maximum lateness tolerated per resolution before the live enumerator
/// synthesizes a bar instead of waiting for real data.
///
/// Coarser resolutions tolerate longer absolute lateness. The values are
/// policy constants, kept as a table rather than derived from a formula.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraceTimeouts {
    /// Grace for tick subscriptions (ticks are never synthesized).
    pub tick: Duration,
    /// Grace for second bars.
    pub second: Duration,
    /// Grace for minute bars.
    pub minute: Duration,
    /// Grace for hour bars.
    pub hour: Duration,
    /// Grace for calendar-day daily bars.
    pub daily: Duration,
    /// Grace for session-bound daily bars.
    pub daily_strict: Duration,
}

impl Default for GraceTimeouts {
    fn default() -> Self {
        Self {
            tick: Duration::ZERO,
            second: Duration::from_millis(900),
            minute: Duration::from_secs(5),
            hour: Duration::from_secs(30),
            daily: Duration::from_secs(60),
            daily_strict: Duration::from_secs(120),
        }
    }
}

impl GraceTimeouts {
    /// Look up the grace period for `resolution`.
    ///
    /// `strict_daily` only matters for [`Resolution::Daily`].
    #[must_use]
    pub const fn maximum_data_timeout(&self, resolution: Resolution, strict_daily: bool) -> Duration {
        match resolution {
            Resolution::Tick => self.tick,
            Resolution::Second => self.second,
            Resolution::Minute => self.minute,
            Resolution::Hour => self.hour,
            Resolution::Daily if strict_daily => self.daily_strict,
            Resolution::Daily => self.daily,
        }
    }
}

/// Settings for the live enumerator and the task that polls it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiveConfig {
    /// Per-resolution grace table.
    pub grace: GraceTimeouts,
    /// How often the live pump calls `advance()` when idle.
    pub poll_interval: Duration,
}

impl Default for LiveConfig {
    fn default() -> Self {
        Self {
            grace: GraceTimeouts::default(),
            poll_interval: Duration::from_millis(100),
        }
    }
}
