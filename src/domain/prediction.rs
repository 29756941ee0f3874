use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::{Clock, IdGenerator};
use crate::error::{MaverickError, Result};
use crate::validation::{validate_non_empty, validate_unit_interval};

/// Inputs for a new prediction, before an id, timestamp and edge are assigned
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewPrediction {
    pub ticker: String,
    pub agent_name: String,
    /// Estimated probability of YES (0-1)
    pub probability: f64,
    /// Meta-confidence in the estimate (0-1)
    pub confidence: f64,
    /// Market YES price when the estimate was made (0-1)
    pub market_price: f64,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub subcategory: Option<String>,
}

impl NewPrediction {
    pub fn new(
        ticker: impl Into<String>,
        agent_name: impl Into<String>,
        probability: f64,
        confidence: f64,
        market_price: f64,
    ) -> Self {
        Self {
            ticker: ticker.into(),
            agent_name: agent_name.into(),
            probability,
            confidence,
            market_price,
            category: None,
            subcategory: None,
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
}

/// A probability estimate for a market outcome.
///
/// Fields are read-only: `edge` is fixed to `probability - market_price` when the
/// prediction is created and nothing can change it afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct Prediction {
    id: String,
    ticker: String,
    agent_name: String,
    probability: f64,
    confidence: f64,
    market_price: f64,
    edge: f64,
    category: Option<String>,
    subcategory: Option<String>,
    timestamp: DateTime<Utc>,
}

impl Prediction {
    /// Create a prediction with a generated id, the current time and a frozen edge
    pub fn create(new: NewPrediction, ids: &dyn IdGenerator, clock: &dyn Clock) -> Result<Self> {
        validate_non_empty(&new.ticker, "ticker")?;
        validate_non_empty(&new.agent_name, "agent_name")?;
        validate_unit_interval(new.probability, "probability")?;
        validate_unit_interval(new.confidence, "confidence")?;
        validate_unit_interval(new.market_price, "market_price")?;

        Ok(Self {
            id: ids.next_id("pred"),
            edge: new.probability - new.market_price,
            ticker: new.ticker,
            agent_name: new.agent_name,
            probability: new.probability,
            confidence: new.confidence,
            market_price: new.market_price,
            category: new.category,
            subcategory: new.subcategory,
            timestamp: clock.now(),
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn ticker(&self) -> &str {
        &self.ticker
    }

    pub fn agent_name(&self) -> &str {
        &self.agent_name
    }

    pub fn probability(&self) -> f64 {
        self.probability
    }

    pub fn confidence(&self) -> f64 {
        self.confidence
    }

    pub fn market_price(&self) -> f64 {
        self.market_price
    }

    /// probability - market_price, as computed at creation
    pub fn edge(&self) -> f64 {
        self.edge
    }

    pub fn category(&self) -> Option<&str> {
        self.category.as_deref()
    }

    pub fn subcategory(&self) -> Option<&str> {
        self.subcategory.as_deref()
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn has_positive_edge(&self) -> bool {
        self.edge > 0.0
    }

    /// Trade direction implied by the sign of the edge
    pub fn direction(&self) -> &'static str {
        if self.has_positive_edge() {
            "BUY_YES"
        } else {
            "BUY_NO"
        }
    }
}

/// Inputs for the reasoning trace stored alongside a prediction
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewReasoning {
    pub reasoning_text: String,
    #[serde(default)]
    pub key_factors: Vec<String>,
    #[serde(default)]
    pub unknowns: Vec<String>,
    #[serde(default)]
    pub base_rate_used: Option<f64>,
}

impl NewReasoning {
    pub fn new(reasoning_text: impl Into<String>) -> Self {
        Self {
            reasoning_text: reasoning_text.into(),
            ..Default::default()
        }
    }
}

/// Full reasoning behind a prediction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReasoningTrace {
    pub id: String,
    pub prediction_id: String,
    pub reasoning_text: String,
    pub key_factors: Vec<String>,
    pub unknowns: Vec<String>,
    pub base_rate_used: Option<f64>,
    pub timestamp: DateTime<Utc>,
}

impl ReasoningTrace {
    /// Create a trace bound to `prediction`
    pub fn create(
        prediction: &Prediction,
        new: NewReasoning,
        ids: &dyn IdGenerator,
        clock: &dyn Clock,
    ) -> Result<Self> {
        validate_non_empty(&new.reasoning_text, "reasoning_text")?;
        if let Some(base_rate) = new.base_rate_used {
            validate_unit_interval(base_rate, "base_rate_used")?;
        }

        Ok(Self {
            id: ids.next_id("trace"),
            prediction_id: prediction.id().to_string(),
            reasoning_text: new.reasoning_text,
            key_factors: new.key_factors,
            unknowns: new.unknowns,
            base_rate_used: new.base_rate_used,
            timestamp: clock.now(),
        })
    }

    /// Fails unless this trace belongs to `prediction`
    pub fn ensure_belongs_to(&self, prediction: &Prediction) -> Result<()> {
        if self.prediction_id != prediction.id() {
            return Err(MaverickError::Validation(format!(
                "reasoning trace {} belongs to {}, not {}",
                self.id,
                self.prediction_id,
                prediction.id()
            )));
        }
        Ok(())
    }
}
