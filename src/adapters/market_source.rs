//! Market data seam
//!
//! `MarketSource` is implemented by whatever talks to the exchange; the rest of
//! the crate only sees `MarketSummary` records. `MarketFeed` wraps a source with
//! a per-session cache keyed by ticker.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

use crate::domain::{Clock, IdGenerator, Market, MarketSnapshot};
use crate::error::Result;

/// Ticker prefixes that are never screened: parlays, sports and crypto prices
pub const EXCLUDE_PREFIXES: &[&str] = &[
    "KXMV",
    "KXNBA", "KXNFL", "KXMLB", "KXNHL",
    "KXSOCCER", "KXTENNIS", "KXGOLF", "KXUFC", "KXMMA",
    "KXESPORTS", "KXNCAA", "KXCBB", "KXCFB",
    "KXBTC", "KXETH", "KXSOL", "KXXRP",
];

/// Market record as returned by the exchange.
///
/// Prices may be in cents (0-100) or already on the 0-1 scale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketSummary {
    pub ticker: String,
    pub title: String,
    pub yes_bid: Option<f64>,
    pub yes_ask: Option<f64>,
    pub no_ask: Option<f64>,
    pub last_price: Option<f64>,
    #[serde(default)]
    pub volume: i64,
    #[serde(default)]
    pub open_interest: i64,
    pub close_time: Option<DateTime<Utc>>,
    pub category: Option<String>,
}

impl MarketSummary {
    pub fn has_quote(&self) -> bool {
        self.yes_bid.map_or(false, |p| p > 0.0) || self.yes_ask.map_or(false, |p| p > 0.0)
    }

    pub fn days_to_close(&self, now: DateTime<Utc>) -> Option<i64> {
        self.close_time.map(|t| (t - now).num_days())
    }
}

/// List query parameters passed through to the source
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarketFilters {
    pub status: Option<String>,
    pub series_ticker: Option<String>,
    pub event_ticker: Option<String>,
    #[serde(default)]
    pub tickers: Vec<String>,
    pub limit: Option<u32>,
}

impl MarketFilters {
    pub fn open() -> Self {
        Self {
            status: Some("open".to_string()),
            ..Default::default()
        }
    }

    pub fn with_series(mut self, series_ticker: impl Into<String>) -> Self {
        self.series_ticker = Some(series_ticker.into());
        self
    }
}

/// Read-only access to exchange market data
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MarketSource: Send + Sync {
    async fn fetch_markets(&self, filters: &MarketFilters) -> Result<Vec<MarketSummary>>;

    async fn fetch_single_market(&self, ticker: &str) -> Result<Option<MarketSummary>>;
}

/// Market source wrapper that caches summaries for the life of a session
pub struct MarketFeed<S: MarketSource> {
    source: S,
    cache: HashMap<String, MarketSummary>,
}

impl<S: MarketSource> MarketFeed<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            cache: HashMap::new(),
        }
    }

    /// Run a list query and refresh the cache with every returned market
    pub async fn fetch_markets(&mut self, filters: &MarketFilters) -> Result<Vec<MarketSummary>> {
        let markets = self.source.fetch_markets(filters).await?;
        for m in &markets {
            self.cache.insert(m.ticker.clone(), m.clone());
        }
        debug!("Fetched {} markets, cache size {}", markets.len(), self.cache.len());
        Ok(markets)
    }

    /// Single-market lookup, served from cache when possible
    pub async fn get_market(&mut self, ticker: &str) -> Result<Option<MarketSummary>> {
        if let Some(m) = self.cache.get(ticker) {
            return Ok(Some(m.clone()));
        }

        let fetched = self.source.fetch_single_market(ticker).await?;
        if let Some(m) = &fetched {
            self.cache.insert(m.ticker.clone(), m.clone());
        }
        Ok(fetched)
    }

    pub fn cached(&self, ticker: &str) -> Option<&MarketSummary> {
        self.cache.get(ticker)
    }

    pub fn cache_len(&self) -> usize {
        self.cache.len()
    }

    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }

    pub fn source(&self) -> &S {
        &self.source
    }
}

/// Normalize a price that may be quoted in cents
pub fn normalize_price(price: f64) -> f64 {
    if price > 1.0 {
        price / 100.0
    } else {
        price
    }
}

/// Build a snapshot from a market summary.
///
/// YES uses the ask, falling back to the last trade; NO falls back to 1 - YES.
/// Returns `None` when the market has no usable YES price.
/// A zero quote means no resting order on that side
fn quoted(price: Option<f64>) -> Option<f64> {
    price.filter(|p| *p > 0.0)
}

pub fn snapshot_from_summary(
    summary: &MarketSummary,
    ids: &dyn IdGenerator,
    clock: &dyn Clock,
) -> Result<Option<MarketSnapshot>> {
    let yes_price = match quoted(summary.yes_ask).or(summary.last_price) {
        Some(p) => normalize_price(p),
        None => return Ok(None),
    };
    let no_price = summary
        .no_ask
        .map(normalize_price)
        .unwrap_or(1.0 - yes_price);

    MarketSnapshot::create(
        summary.ticker.clone(),
        yes_price,
        no_price,
        summary.volume,
        summary.open_interest,
        ids,
        clock,
    )
    .map(Some)
}

/// Market metadata for `SqliteStore::store_market`
pub fn market_from_summary(summary: &MarketSummary, clock: &dyn Clock) -> Market {
    let mut market = Market::new(summary.ticker.clone(), summary.title.clone(), clock);
    market.category = summary.category.clone();
    market.close_time = summary.close_time;
    market
}

/// Opportunity screen thresholds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScreenCriteria {
    pub max_days: i64,
    pub min_volume: i64,
    pub max_volume: Option<i64>,
    pub limit: usize,
}

impl Default for ScreenCriteria {
    fn default() -> Self {
        Self {
            max_days: 30,
            min_volume: 100,
            max_volume: None,
            limit: 30,
        }
    }
}

/// Market that passed the screen
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Opportunity {
    pub ticker: String,
    pub title: String,
    /// Best available YES quote in the source's units
    pub price: Option<f64>,
    pub volume: i64,
    pub days_to_close: Option<i64>,
    pub category: Option<String>,
}

pub fn is_excluded(ticker: &str) -> bool {
    EXCLUDE_PREFIXES.iter().any(|p| ticker.starts_with(p))
}

/// Filter markets worth reasoning about, highest volume first
pub fn screen_opportunities(
    markets: &[MarketSummary],
    criteria: &ScreenCriteria,
    now: DateTime<Utc>,
) -> Vec<Opportunity> {
    let mut candidates: Vec<Opportunity> = markets
        .iter()
        .filter(|m| !is_excluded(&m.ticker))
        .filter(|m| m.volume >= criteria.min_volume)
        .filter(|m| criteria.max_volume.map_or(true, |max| m.volume <= max))
        .filter(|m| m.has_quote())
        .filter_map(|m| {
            let days = m.days_to_close(now);
            if let Some(d) = days {
                if d < 0 || d > criteria.max_days {
                    return None;
                }
            }
            Some(Opportunity {
                ticker: m.ticker.clone(),
                title: m.title.chars().take(70).collect(),
                price: quoted(m.yes_ask).or(quoted(m.yes_bid)).or(m.last_price),
                volume: m.volume,
                days_to_close: days,
                category: m.category.clone(),
            })
        })
        .collect();

    candidates.sort_by(|a, b| b.volume.cmp(&a.volume));
    candidates.truncate(criteria.limit);
    candidates
}
