//! Time-series algorithms shared by the bounded and live enumerators.
//!
//! Modules include:
//! - `grid`: DST-aware alignment of instants to a resolution grid in the data time zone
//! - `intervals`: the reference-interval search between real data points
/// Resolution grid alignment helpers.
pub mod grid;
/// Reference-interval computation.
pub mod intervals;
