use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, TimeDelta, Utc};
use chrono_tz::Tz;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::LacunaError;

/// Ticker or security identifier carried by every data point.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Symbol(String);

impl Symbol {
    /// Wrap a symbol string.
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Borrow the symbol as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Symbol {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Open/high/low/close prices of one bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ohlc {
    /// First price of the period.
    pub open: Decimal,
    /// Highest price of the period.
    pub high: Decimal,
    /// Lowest price of the period.
    pub low: Decimal,
    /// Last price of the period.
    pub close: Decimal,
}

impl Ohlc {
    /// Construct from four prices.
    #[must_use]
    pub const fn new(open: Decimal, high: Decimal, low: Decimal, close: Decimal) -> Self {
        Self {
            open,
            high,
            low,
            close,
        }
    }

    /// A bar whose four prices are all `price`.
    #[must_use]
    pub const fn flat(price: Decimal) -> Self {
        Self::new(price, price, price, price)
    }
}

/// Trade bar: prices plus traded volume.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeBar {
    /// Traded prices.
    pub ohlc: Ohlc,
    /// Traded volume; zero on synthesized bars.
    pub volume: Decimal,
}

/// Two-sided quote bar.
///
/// Sides are reference counted so a decorator can carry the previous side
/// object forward without copying it. Treat a shared side as immutable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuoteBar {
    /// Bid side, if quoted during the period.
    pub bid: Option<Arc<Ohlc>>,
    /// Ask side, if quoted during the period.
    pub ask: Option<Arc<Ohlc>>,
    /// Size of the last bid; zero on synthesized bars.
    pub last_bid_size: Decimal,
    /// Size of the last ask; zero on synthesized bars.
    pub last_ask_size: Decimal,
}

impl QuoteBar {
    /// Mid of the closing prices, or the close of whichever side is present.
    #[must_use]
    pub fn mid_close(&self) -> Decimal {
        match (self.bid.as_deref(), self.ask.as_deref()) {
            (Some(b), Some(a)) => b
                .close
                .checked_add(a.close)
                .map_or(b.close, |sum| sum / Decimal::TWO),
            (Some(side), None) | (None, Some(side)) => side.close,
            (None, None) => Decimal::ZERO,
        }
    }
}

/// Sub-kind of a delisting notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DelistingKind {
    /// Advance notice; the stream continues.
    Warning,
    /// The security is gone; nothing follows this event.
    Delisted,
}

/// Non-tradable business events carried in the same stream as bars.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum AuxiliaryEvent {
    /// Cash distribution per share.
    Dividend {
        /// Amount paid per share.
        distribution: Decimal,
    },
    /// Share split.
    Split {
        /// New shares per old share.
        factor: Decimal,
    },
    /// Delisting notice or final delisting.
    Delisting {
        /// Warning or terminal delisting.
        kind: DelistingKind,
    },
    /// Ticker rename.
    SymbolChanged {
        /// Symbol before the change.
        old: Symbol,
        /// Symbol after the change.
        new: Symbol,
    },
}

/// Coarse discriminator observed by downstream consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataKind {
    /// Price bar; participates in fill-forward.
    Tradable,
    /// Business event; passes through untouched.
    Auxiliary,
}

/// Body of a data point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum Payload {
    /// Trade bar.
    Trade(TradeBar),
    /// Quote bar.
    Quote(QuoteBar),
    /// Auxiliary event.
    Auxiliary(AuxiliaryEvent),
}

/// One element of a fill-forward stream: the half-open interval
/// `[time, end_time)` plus its payload.
///
/// Instants are stored in UTC; use [`DataPoint::local_time`] to view them in
/// the data time zone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataPoint {
    /// Security the point belongs to.
    pub symbol: Symbol,
    /// Start of the bar (inclusive).
    pub time: DateTime<Utc>,
    /// End of the bar (exclusive). Equal to `time` for events and ticks.
    pub end_time: DateTime<Utc>,
    /// Representative price (close for trades, mid close for quotes).
    pub value: Decimal,
    /// `true` only on synthesized bars.
    pub is_fill_forward: bool,
    /// Bar or event body.
    pub payload: Payload,
}

impl DataPoint {
    /// Real trade bar covering `[time, end_time)`.
    #[must_use]
    pub fn trade(symbol: Symbol, time: DateTime<Utc>, end_time: DateTime<Utc>, bar: TradeBar) -> Self {
        Self {
            symbol,
            time,
            end_time,
            value: bar.ohlc.close,
            is_fill_forward: false,
            payload: Payload::Trade(bar),
        }
    }

    /// Real quote bar covering `[time, end_time)`.
    #[must_use]
    pub fn quote(symbol: Symbol, time: DateTime<Utc>, end_time: DateTime<Utc>, bar: QuoteBar) -> Self {
        Self {
            symbol,
            time,
            end_time,
            value: bar.mid_close(),
            is_fill_forward: false,
            payload: Payload::Quote(bar),
        }
    }

    /// Auxiliary event stamped at `time`.
    #[must_use]
    pub fn auxiliary(symbol: Symbol, time: DateTime<Utc>, event: AuxiliaryEvent) -> Self {
        let value = match &event {
            AuxiliaryEvent::Dividend { distribution } => *distribution,
            AuxiliaryEvent::Split { factor } => *factor,
            AuxiliaryEvent::Delisting { .. } | AuxiliaryEvent::SymbolChanged { .. } => Decimal::ZERO,
        };
        Self {
            symbol,
            time,
            end_time: time,
            value,
            is_fill_forward: false,
            payload: Payload::Auxiliary(event),
        }
    }

    /// Tradable or auxiliary.
    #[must_use]
    pub const fn kind(&self) -> DataKind {
        match self.payload {
            Payload::Trade(_) | Payload::Quote(_) => DataKind::Tradable,
            Payload::Auxiliary(_) => DataKind::Auxiliary,
        }
    }

    /// Whether this is a price bar.
    #[must_use]
    pub const fn is_tradable(&self) -> bool {
        matches!(self.kind(), DataKind::Tradable)
    }

    /// Whether nothing may follow this point in a stream.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(
            self.payload,
            Payload::Auxiliary(AuxiliaryEvent::Delisting {
                kind: DelistingKind::Delisted
            })
        )
    }

    /// `end_time - time`.
    #[must_use]
    pub fn period(&self) -> TimeDelta {
        self.end_time - self.time
    }

    /// Start of the bar in `tz`.
    #[must_use]
    pub fn local_time(&self, tz: Tz) -> DateTime<Tz> {
        self.time.with_timezone(&tz)
    }

    /// Reject points whose interval runs backwards.
    ///
    /// # Errors
    /// Returns `LacunaError::Data` when `end_time < time`.
    pub fn validate(&self) -> Result<(), LacunaError> {
        if self.end_time < self.time {
            return Err(LacunaError::data(format!(
                "{} point ends at {} before it starts at {}",
                self.symbol, self.end_time, self.time
            )));
        }
        Ok(())
    }

    /// Copy of this point re-stamped to `[start, end)`, flagged as
    /// fill-forward, with volume and sizes zeroed. Prices are untouched.
    #[must_use]
    pub fn fill_forward(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        let payload = match &self.payload {
            Payload::Trade(bar) => Payload::Trade(TradeBar {
                ohlc: bar.ohlc,
                volume: Decimal::ZERO,
            }),
            Payload::Quote(bar) => Payload::Quote(QuoteBar {
                bid: bar.bid.clone(),
                ask: bar.ask.clone(),
                last_bid_size: Decimal::ZERO,
                last_ask_size: Decimal::ZERO,
            }),
            Payload::Auxiliary(ev) => Payload::Auxiliary(ev.clone()),
        };
        Self {
            symbol: self.symbol.clone(),
            time: start,
            end_time: end,
            value: self.value,
            is_fill_forward: true,
            payload,
        }
    }
}
