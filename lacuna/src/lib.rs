//! Lacuna fills the gaps in sparse market-data streams.
//!
//! Overview
//! - Wraps a time-ordered stream of bars and events and inserts synthetic
//!   bars where a source produced nothing, so downstream consumers see a
//!   regular cadence.
//! - A synthetic bar repeats the previous real bar's prices with zero volume
//!   and is flagged `is_fill_forward`.
//! - Bars are only synthesized for open market time as reported by an
//!   [`ExchangeCalendar`], aligned to a DST-aware grid in the data time zone.
//! - Auxiliary events (dividends, splits, symbol changes, delisting notices)
//!   pass through untouched; a final delisting ends the stream.
//!
//! Key behaviors and trade-offs
//! - Bounded replay ([`FillForward`]): a plain `Iterator` over finite input.
//!   The input must be sorted; it is never re-sorted.
//! - Live polling ([`LiveFillForward`]): never blocks. Each
//!   [`advance`](LiveSource::advance) returns data, [`LivePoll::Empty`], or
//!   [`LivePoll::Ended`]. Missing bars are synthesized only once a per-resolution
//!   grace timeout has passed, trading a little latency for fewer synthetic
//!   bars that real data would have replaced.
//! - Cadence: the fill-forward resolution is a shared cell
//!   ([`FillForwardResolution`]); changing it mid-stream takes effect on the
//!   next step.
//! - Calendar queries are bounded; a calendar that cannot answer surfaces as
//!   [`LacunaError::CalendarExhausted`] instead of looping.
//!
//! Examples
//! Replaying a sequence:
//! ```rust,ignore
//! use std::sync::Arc;
//! use lacuna::{FillForwardBuilder, Resolution};
//!
//! let filled = FillForwardBuilder::new(Resolution::Minute)
//!     .calendar(Arc::new(calendar))
//!     .build_bounded(bars)?;
//! for point in filled {
//!     let point = point?;
//!     println!("{} {} ff={}", point.end_time, point.value, point.is_fill_forward);
//! }
//! ```
//!
//! Polling a live feed from a Tokio task:
//! ```rust,ignore
//! use lacuna::{FillForwardBuilder, LiveConfig, Resolution, feed_queue, spawn_live_pump};
//!
//! let (producer, consumer) = feed_queue();
//! let live = FillForwardBuilder::new(Resolution::Minute)
//!     .calendar(calendar)
//!     .build_live(consumer)?;
//! let (tx, mut rx) = tokio::sync::mpsc::channel(64);
//! let handle = spawn_live_pump(live, LiveConfig::default(), tx);
//! // producer.enqueue(bar)? from the data callback ...
//! while let Some(point) = rx.recv().await { /* ... */ }
//! handle.stop().await;
//! ```
//!
//! See `lacuna/examples/` for runnable demonstrations.
#![warn(missing_docs)]

mod builder;
mod enumerator;
mod pump;
mod quote_sides;

pub use builder::FillForwardBuilder;
pub use enumerator::bounded::FillForward;
pub use enumerator::live::LiveFillForward;
pub use enumerator::{EnumeratorState, LivePoll, LiveSource};
pub use pump::{bridge_into_queue, spawn_live_pump};
pub use quote_sides::QuoteSideCarry;

pub use chrono_tz::Tz;
pub use lacuna_core::stream::PumpHandle;

// Re-export core types for convenience
pub use lacuna_core::{
    AuxiliaryEvent,
    DataKind,
    DataPoint,
    Decimal,
    DelistingKind,
    Dequeue,
    ExchangeCalendar,
    FeedConsumer,
    FeedProducer,
    FillForwardResolution,
    FillStep,
    GraceTimeouts,
    LacunaError,
    LiveConfig,
    MarketContext,
    Ohlc,
    Payload,
    QuoteBar,
    RealTimeProvider,
    ReferenceIntervals,
    Resolution,
    Session,
    Symbol,
    TimeProvider,
    TradeBar,
    feed_queue,
    reference_intervals,
};
