//! Analysis over the ordered summary sequence.
//!
//! - `metrics` - cumulative and windowed performance series
//! - `bankroll` - Monte-Carlo bankroll survival estimates

pub mod bankroll;
pub mod metrics;
