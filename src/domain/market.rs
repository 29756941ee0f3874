use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::{Clock, IdGenerator};
use super::state::{MarketResult, MarketStatus};
use crate::error::Result;
use crate::validation::{validate_non_empty, validate_unit_interval};

/// Market metadata, keyed by ticker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Market {
    pub ticker: String,
    pub title: String,
    pub category: Option<String>,
    pub subcategory: Option<String>,
    pub close_time: Option<DateTime<Utc>>,
    pub resolution_time: Option<DateTime<Utc>>,
    pub status: MarketStatus,
    /// Only set once status is `Resolved`
    pub result: Option<MarketResult>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Market {
    /// New open market stamped with the current time
    pub fn new(ticker: impl Into<String>, title: impl Into<String>, clock: &dyn Clock) -> Self {
        let now = clock.now();
        Self {
            ticker: ticker.into(),
            title: title.into(),
            category: None,
            subcategory: None,
            close_time: None,
            resolution_time: None,
            status: MarketStatus::Open,
            result: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_subcategory(mut self, subcategory: impl Into<String>) -> Self {
        self.subcategory = Some(subcategory.into());
        self
    }

    pub fn with_close_time(mut self, close_time: DateTime<Utc>) -> Self {
        self.close_time = Some(close_time);
        self
    }

    pub fn is_resolved(&self) -> bool {
        self.status == MarketStatus::Resolved
    }

    /// Days until close, if a close time is known
    pub fn days_to_close(&self, now: DateTime<Utc>) -> Option<i64> {
        self.close_time.map(|t| (t - now).num_days())
    }
}

/// Point-in-time market pricing data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketSnapshot {
    pub id: String,
    pub ticker: String,
    /// YES price (0-1)
    pub yes_price: f64,
    /// NO price (0-1)
    pub no_price: f64,
    pub volume: i64,
    pub open_interest: i64,
    pub timestamp: DateTime<Utc>,
}

impl MarketSnapshot {
    pub fn create(
        ticker: impl Into<String>,
        yes_price: f64,
        no_price: f64,
        volume: i64,
        open_interest: i64,
        ids: &dyn IdGenerator,
        clock: &dyn Clock,
    ) -> Result<Self> {
        let ticker = ticker.into();
        validate_non_empty(&ticker, "ticker")?;
        validate_unit_interval(yes_price, "yes_price")?;
        validate_unit_interval(no_price, "no_price")?;

        Ok(Self {
            id: ids.next_id("snap"),
            ticker,
            yes_price,
            no_price,
            volume,
            open_interest,
            timestamp: clock.now(),
        })
    }

    /// YES + NO - 1; positive when the book is overround
    pub fn overround(&self) -> f64 {
        self.yes_price + self.no_price - 1.0
    }
}
