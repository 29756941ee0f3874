//! Position sizing
//!
//! - `kelly` - fractional Kelly fraction from a forecast edge
//! - `payout` - contract payout and annualized return for a fixed bet

pub mod kelly;
pub mod payout;

pub use kelly::{
    calculate_edge, calculate_kelly, kelly_fraction, Confidence, Direction, KellyResult,
    KellySizing, TimeHorizon, MAX_POSITION,
};
pub use payout::{calculate_payout, Payout, TimeAnalysis, Verdict, DEFAULT_RISK_FREE_RATE};
