//! Bar resolutions and the shared fill-forward cadence cell.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};

use chrono::TimeDelta;
use serde::{Deserialize, Serialize};

use crate::LacunaError;

/// Native cadence of a data subscription.
///
/// Ordered from finest to coarsest so `Ord` comparisons read naturally
/// (`Resolution::Minute < Resolution::Hour`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum Resolution {
    /// Individual ticks; no fixed span and never filled forward.
    Tick = 0,
    /// One-second bars.
    Second = 1,
    /// One-minute bars.
    Minute = 2,
    /// One-hour bars.
    Hour = 3,
    /// Daily bars (midnight-to-midnight, or one session in strict mode).
    Daily = 4,
}

impl Resolution {
    /// Every resolution, finest first.
    pub const ALL: [Self; 5] = [
        Self::Tick,
        Self::Second,
        Self::Minute,
        Self::Hour,
        Self::Daily,
    ];

    /// Fixed span of one bar, or `None` for ticks.
    #[must_use]
    pub fn span(self) -> Option<TimeDelta> {
        match self {
            Self::Tick => None,
            Self::Second => Some(TimeDelta::seconds(1)),
            Self::Minute => Some(TimeDelta::minutes(1)),
            Self::Hour => Some(TimeDelta::hours(1)),
            Self::Daily => Some(TimeDelta::days(1)),
        }
    }

    /// Whether bars of this resolution can be synthesized at all.
    #[must_use]
    pub const fn supports_fill_forward(self) -> bool {
        !matches!(self, Self::Tick)
    }

    /// Short label used in logs and configuration files.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Tick => "tick",
            Self::Second => "second",
            Self::Minute => "minute",
            Self::Hour => "hour",
            Self::Daily => "daily",
        }
    }

    const fn from_repr(v: u8) -> Self {
        match v {
            1 => Self::Second,
            2 => Self::Minute,
            3 => Self::Hour,
            4 => Self::Daily,
            // only values written through `FillForwardResolution::set` reach here
            _ => Self::Tick,
        }
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Resolution {
    type Err = LacunaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|r| r.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| LacunaError::invalid_arg(format!("unknown resolution '{s}'")))
    }
}

/// Shared, externally owned fill-forward cadence.
///
/// The owning subscription may change the cadence at any time; enumerators
/// hold a clone of the handle and read it on every synthesis step.
#[derive(Debug, Clone)]
pub struct FillForwardResolution {
    inner: Arc<AtomicU8>,
}

impl FillForwardResolution {
    /// Create a new cell holding `resolution`.
    #[must_use]
    pub fn new(resolution: Resolution) -> Self {
        Self {
            inner: Arc::new(AtomicU8::new(resolution as u8)),
        }
    }

    /// Current cadence.
    #[must_use]
    pub fn get(&self) -> Resolution {
        Resolution::from_repr(self.inner.load(Ordering::Acquire))
    }

    /// Replace the cadence; visible to every holder of the handle.
    pub fn set(&self, resolution: Resolution) {
        self.inner.store(resolution as u8, Ordering::Release);
    }
}

impl From<Resolution> for FillForwardResolution {
    fn from(resolution: Resolution) -> Self {
        Self::new(resolution)
    }
}
