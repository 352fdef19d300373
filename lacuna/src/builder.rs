use std::sync::Arc;

use chrono::{DateTime, Utc};
use lacuna_core::{DataPoint, ExchangeCalendar, FeedConsumer, RealTimeProvider, TimeProvider};
use lacuna_types::{FillForwardResolution, GraceTimeouts, LacunaError, MarketContext, Resolution};

use crate::enumerator::Setup;
use crate::{FillForward, LiveFillForward};

/// Builder for the bounded and live fill-forward enumerators.
///
/// Only the data resolution and a calendar are required. Unless a
/// [`MarketContext`] is given, both the exchange and data time zones follow
/// the calendar's. The cadence defaults to the data resolution.
#[must_use]
pub struct FillForwardBuilder {
    data_resolution: Resolution,
    calendar: Option<Arc<dyn ExchangeCalendar>>,
    context: Option<MarketContext>,
    extended_market_hours: Option<bool>,
    strict_daily_sessions: Option<bool>,
    fill_forward: Option<FillForwardResolution>,
    subscription_end: Option<DateTime<Utc>>,
    grace: GraceTimeouts,
    clock: Option<Arc<dyn TimeProvider>>,
}

impl FillForwardBuilder {
    /// Start a builder for data arriving at `data_resolution`.
    pub fn new(data_resolution: Resolution) -> Self {
        Self {
            data_resolution,
            calendar: None,
            context: None,
            extended_market_hours: None,
            strict_daily_sessions: None,
            fill_forward: None,
            subscription_end: None,
            grace: GraceTimeouts::default(),
            clock: None,
        }
    }

    /// Exchange calendar to consult for open and closed time. Required.
    pub fn calendar(mut self, calendar: Arc<dyn ExchangeCalendar>) -> Self {
        self.calendar = Some(calendar);
        self
    }

    /// Explicit time zones and flags.
    ///
    /// The exchange time zone must match the calendar's.
    pub const fn context(mut self, context: MarketContext) -> Self {
        self.context = Some(context);
        self
    }

    /// Count pre-market and after-hours segments as open.
    pub const fn extended_market_hours(mut self, yes: bool) -> Self {
        self.extended_market_hours = Some(yes);
        self
    }

    /// Make daily bars span exactly one session. Daily data only.
    pub const fn strict_daily_sessions(mut self, yes: bool) -> Self {
        self.strict_daily_sessions = Some(yes);
        self
    }

    /// Share a cadence cell with the owning subscription.
    pub fn fill_forward(mut self, cadence: FillForwardResolution) -> Self {
        self.fill_forward = Some(cadence);
        self
    }

    /// Last instant a bar may end at. Without it the bounded enumerator
    /// stops with its input and the live one runs until stopped.
    pub const fn subscription_end(mut self, end: DateTime<Utc>) -> Self {
        self.subscription_end = Some(end);
        self
    }

    /// Grace table for the live enumerator.
    pub const fn grace(mut self, grace: GraceTimeouts) -> Self {
        self.grace = grace;
        self
    }

    /// Clock for the live enumerator; the system clock by default.
    pub fn clock(mut self, clock: Arc<dyn TimeProvider>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Wrap a time-ordered sequence of points.
    ///
    /// # Errors
    /// Returns `InvalidArg` when the configuration is inconsistent; see
    /// [`FillForwardBuilder`].
    pub fn build_bounded<I>(self, underlying: I) -> Result<FillForward<I::IntoIter>, LacunaError>
    where
        I: IntoIterator<Item = DataPoint>,
    {
        let (setup, _, _) = self.validate()?;
        Ok(FillForward::new(underlying.into_iter(), setup))
    }

    /// Poll `feed` against the configured clock.
    ///
    /// # Errors
    /// Returns `InvalidArg` when the configuration is inconsistent.
    pub fn build_live(self, feed: FeedConsumer<DataPoint>) -> Result<LiveFillForward, LacunaError> {
        let (setup, grace, clock) = self.validate()?;
        Ok(LiveFillForward::new(feed, clock, grace, setup))
    }

    fn validate(self) -> Result<(Setup, GraceTimeouts, Arc<dyn TimeProvider>), LacunaError> {
        let Some(calendar) = self.calendar else {
            return Err(LacunaError::invalid_arg(
                "no exchange calendar; set one via calendar(...)",
            ));
        };
        let tz = calendar.time_zone();
        let mut context = match self.context {
            Some(ctx) if ctx.exchange_time_zone != tz => {
                return Err(LacunaError::invalid_arg(format!(
                    "context exchange time zone {} does not match calendar time zone {tz}",
                    ctx.exchange_time_zone
                )));
            }
            Some(ctx) => ctx,
            None => MarketContext::new(tz, tz),
        };
        if let Some(yes) = self.extended_market_hours {
            context.extended_market_hours = yes;
        }
        if let Some(yes) = self.strict_daily_sessions {
            context.strict_daily_sessions = yes;
        }
        if context.strict_daily_sessions && self.data_resolution != Resolution::Daily {
            return Err(LacunaError::invalid_arg(format!(
                "strict daily sessions need daily data, got {}",
                self.data_resolution
            )));
        }

        let fill_forward = self
            .fill_forward
            .unwrap_or_else(|| FillForwardResolution::new(self.data_resolution));
        let cadence = fill_forward.get();
        if cadence == Resolution::Tick && self.data_resolution != Resolution::Tick {
            return Err(LacunaError::invalid_arg(format!(
                "tick cadence cannot fill {} bars",
                self.data_resolution
            )));
        }

        let clock = self
            .clock
            .unwrap_or_else(|| Arc::new(RealTimeProvider) as Arc<dyn TimeProvider>);
        let setup = Setup {
            calendar,
            context,
            data_resolution: self.data_resolution,
            fill_forward,
            subscription_end: self.subscription_end,
        };
        Ok((setup, self.grace, clock))
    }
}
