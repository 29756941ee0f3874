use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::{Clock, IdGenerator};
use crate::error::{MaverickError, Result};
use crate::validation::{validate_non_empty, validate_unit_interval};

/// Contract side bought by a trade
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeSide {
    Yes,
    No,
}

impl TradeSide {
    pub fn as_str(&self) -> &'static str {
        match self {
            TradeSide::Yes => "yes",
            TradeSide::No => "no",
        }
    }
}

impl std::fmt::Display for TradeSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl TryFrom<&str> for TradeSide {
    type Error = String;

    fn try_from(s: &str) -> std::result::Result<Self, Self::Error> {
        match s.to_lowercase().as_str() {
            "yes" => Ok(TradeSide::Yes),
            "no" => Ok(TradeSide::No),
            _ => Err(format!("Unknown trade side: {}", s)),
        }
    }
}

/// Trade status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeStatus {
    /// Recorded, not yet filled
    Pending,
    /// Filled on the exchange
    Filled,
    /// Cancelled before fill
    Cancelled,
}

impl TradeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TradeStatus::Pending => "pending",
            TradeStatus::Filled => "filled",
            TradeStatus::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, TradeStatus::Filled | TradeStatus::Cancelled)
    }
}

impl std::fmt::Display for TradeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl TryFrom<&str> for TradeStatus {
    type Error = String;

    fn try_from(s: &str) -> std::result::Result<Self, Self::Error> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(TradeStatus::Pending),
            "filled" => Ok(TradeStatus::Filled),
            "cancelled" => Ok(TradeStatus::Cancelled),
            _ => Err(format!("Unknown trade status: {}", s)),
        }
    }
}

/// Execution record tied to a prediction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub id: String,
    pub prediction_id: String,
    pub ticker: String,
    pub side: TradeSide,
    pub contracts: i64,
    /// Price per contract (0-1)
    pub price: f64,
    pub filled_at: Option<DateTime<Utc>>,
    pub status: TradeStatus,
    pub created_at: DateTime<Utc>,
}

impl Trade {
    pub fn create(
        prediction_id: impl Into<String>,
        ticker: impl Into<String>,
        side: TradeSide,
        contracts: i64,
        price: f64,
        ids: &dyn IdGenerator,
        clock: &dyn Clock,
    ) -> Result<Self> {
        let prediction_id = prediction_id.into();
        let ticker = ticker.into();
        validate_non_empty(&prediction_id, "prediction_id")?;
        validate_non_empty(&ticker, "ticker")?;
        validate_unit_interval(price, "price")?;
        if contracts <= 0 {
            return Err(MaverickError::Validation(format!(
                "Contracts must be positive: {}",
                contracts
            )));
        }

        Ok(Self {
            id: ids.next_id("trade"),
            prediction_id,
            ticker,
            side,
            contracts,
            price,
            filled_at: None,
            status: TradeStatus::Pending,
            created_at: clock.now(),
        })
    }

    /// Dollar cost of the position
    pub fn cost(&self) -> f64 {
        self.price * self.contracts as f64
    }

    /// Payout if the chosen side wins (each contract pays 1)
    pub fn payout_if_win(&self) -> f64 {
        self.contracts as f64
    }

    pub fn mark_filled(&mut self, at: DateTime<Utc>) -> Result<()> {
        self.transition(TradeStatus::Filled)?;
        self.filled_at = Some(at);
        Ok(())
    }

    pub fn cancel(&mut self) -> Result<()> {
        self.transition(TradeStatus::Cancelled)
    }

    fn transition(&mut self, to: TradeStatus) -> Result<()> {
        if self.status.is_terminal() {
            return Err(MaverickError::InvalidStateTransition {
                from: self.status.to_string(),
                to: to.to_string(),
            });
        }
        self.status = to;
        Ok(())
    }
}
