pub mod adapters;
pub mod analytics;
pub mod cli;
pub mod config;
pub mod domain;
pub mod error;
pub mod strategy;
pub mod validation;

pub use adapters::{MarketFeed, MarketSource, SqliteStore};
pub use analytics::{
    agent_performance, calibration_report, category_performance, recent_predictions,
    unresolved_markets,
};
pub use config::AppConfig;
pub use error::{MaverickError, Result};
pub use strategy::{calculate_kelly, calculate_payout};
