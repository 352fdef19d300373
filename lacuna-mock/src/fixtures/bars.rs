use std::sync::Arc;

use chrono::{DateTime, Utc};
use lacuna_core::{AuxiliaryEvent, DataPoint, DelistingKind, Ohlc, QuoteBar, Symbol, TradeBar};
use rust_decimal::Decimal;

/// Trade bar over `[start, end)` with flat prices at `close`.
#[must_use]
pub fn trade_bar(symbol: &str, start: DateTime<Utc>, end: DateTime<Utc>, close: Decimal, volume: u32) -> DataPoint {
    DataPoint::trade(
        Symbol::new(symbol),
        start,
        end,
        TradeBar {
            ohlc: Ohlc::flat(close),
            volume: Decimal::from(volume),
        },
    )
}

/// Quote bar over `[start, end)`; each present side is flat at its price.
#[must_use]
pub fn quote_bar(
    symbol: &str,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    bid: Option<Decimal>,
    ask: Option<Decimal>,
) -> DataPoint {
    DataPoint::quote(
        Symbol::new(symbol),
        start,
        end,
        QuoteBar {
            bid: bid.map(|p| Arc::new(Ohlc::flat(p))),
            ask: ask.map(|p| Arc::new(Ohlc::flat(p))),
            last_bid_size: if bid.is_some() { Decimal::ONE_HUNDRED } else { Decimal::ZERO },
            last_ask_size: if ask.is_some() { Decimal::ONE_HUNDRED } else { Decimal::ZERO },
        },
    )
}

/// Delisting notice (`Warning`) or final delisting (`Delisted`).
#[must_use]
pub fn delisting(symbol: &str, at: DateTime<Utc>, kind: DelistingKind) -> DataPoint {
    DataPoint::auxiliary(Symbol::new(symbol), at, AuxiliaryEvent::Delisting { kind })
}

/// Cash dividend.
#[must_use]
pub fn dividend(symbol: &str, at: DateTime<Utc>, distribution: Decimal) -> DataPoint {
    DataPoint::auxiliary(Symbol::new(symbol), at, AuxiliaryEvent::Dividend { distribution })
}

/// Ticker rename from `symbol` to `new`.
#[must_use]
pub fn symbol_changed(symbol: &str, at: DateTime<Utc>, new: &str) -> DataPoint {
    DataPoint::auxiliary(
        Symbol::new(symbol),
        at,
        AuxiliaryEvent::SymbolChanged {
            old: Symbol::new(symbol),
            new: Symbol::new(new),
        },
    )
}
