//! Deterministic collaborators for exercising lacuna enumerators.
//!
//! - [`SessionCalendar`]: weekly exchange hours with holidays, early closes,
//!   late opens, extended hours, and a bounded lookahead.
//! - [`ManualClock`]: a `TimeProvider` that moves only when told to.
//! - [`ScheduledFeed`] and [`scripted_source`]: data sources with controlled
//!   arrival times.
//! - [`fixtures`]: calendar presets and bar builders.

mod calendar;
mod clock;
mod feed;
pub mod fixtures;

pub use calendar::{Segment, SessionCalendar};
pub use clock::ManualClock;
pub use feed::{ScheduledFeed, scripted_source};
