//! Re-export of foundational types from `lacuna-types`.
// Consolidated re-exports so downstream crates can depend on `lacuna-core` only

pub use lacuna_types::{FillForwardResolution, Resolution};
pub use lacuna_types::{GraceTimeouts, LiveConfig, MarketContext};
pub use lacuna_types::LacunaError;

pub use rust_decimal::Decimal;
