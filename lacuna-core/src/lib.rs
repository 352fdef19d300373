//! lacuna-core
//!
//! Core types, contracts, and pure time-series algorithms shared across the
//! lacuna workspace.
//!
//! - `data`: the data points that flow through a fill-forward stream.
//! - `calendar`: the `ExchangeCalendar` contract the algorithms consult.
//! - `clock`: the injected `TimeProvider` used by live enumeration.
//! - `queue`: the single-producer/single-consumer feed bridging a data source
//!   to the live enumerator.
//! - `timeseries`: the DST-aware alignment grid and the reference-interval
//!   algorithm both enumerators share.
//!
//! Async runtime (Tokio)
//! ---------------------
//! Everything except `stream` is synchronous and runtime-agnostic.
//! `stream::PumpHandle` wraps `tokio::task::JoinHandle<()>` and a
//! `tokio::sync::oneshot::Sender<()>` for cooperative shutdown, so code that
//! spawns pumps must run under a Tokio 1.x runtime.
//!
#![warn(missing_docs)]

/// Exchange calendar contract.
pub mod calendar;
/// Injected wall clock.
pub mod clock;
/// Data points, bars, and auxiliary events.
pub mod data;
/// Single-producer/single-consumer feed queue.
pub mod queue;
/// Pump handle utilities used by the live driver and tests.
pub mod stream;
mod sync;
/// Alignment grid and reference-interval computation.
pub mod timeseries;
pub mod types;

pub use calendar::{DEFAULT_LOOKAHEAD_DAYS, ExchangeCalendar, Session};
pub use clock::{RealTimeProvider, TimeProvider};
pub use data::{AuxiliaryEvent, DataKind, DataPoint, DelistingKind, Ohlc, Payload, QuoteBar, Symbol, TradeBar};
pub use queue::{Dequeue, FeedConsumer, FeedProducer, feed_queue};
pub use timeseries::intervals::{FillStep, ReferenceIntervals, Steps, reference_intervals};
pub use types::*;
