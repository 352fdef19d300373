//! Lacuna-specific vocabulary shared by the core algorithms and the enumerators.
#![warn(missing_docs)]

mod config;
mod error;
mod resolution;

pub use config::{GraceTimeouts, LiveConfig, MarketContext};
pub use error::LacunaError;
pub use resolution::{FillForwardResolution, Resolution};
