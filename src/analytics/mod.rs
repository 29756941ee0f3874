//! Read-only views over predictions and outcomes
//!
//! Windowed views take a `Clock` so the cutoff (`now - days`) is deterministic
//! in tests. Empty result sets come back as empty collections or zeroed stats.

pub mod calibration;
pub mod performance;
pub mod report;

pub use calibration::{bucket_calibration, bucket_index, calibration_report, CalibrationBucket};
pub use performance::{
    agent_performance, category_performance, recent_predictions, unresolved_markets,
    AgentStats, CategoryStats, RecentPrediction, UnresolvedMarket, UNCATEGORIZED,
};
pub use report::{format_agent_stats, format_calibration_report, weighted_calibration_error};
