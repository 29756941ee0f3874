use chrono::{DateTime, Utc};
use serde::Serialize;

use super::ids::{Clock, IdGenerator};
use super::prediction::Prediction;
use super::state::MarketResult;
use crate::error::Result;
use crate::validation::validate_binary_outcome;

/// Squared error between a stated probability and a binary outcome.
///
/// 0.0 is a perfect call, 0.25 is a coin flip at 50%, 1.0 is maximally wrong.
pub fn brier_score(predicted_probability: f64, actual_outcome: i64) -> f64 {
    (predicted_probability - actual_outcome as f64).powi(2)
}

/// Resolution of one prediction, scored with the Brier rule.
///
/// Read-only once created; `predicted_probability` is copied from the resolved
/// prediction, never supplied by the caller.
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct Outcome {
    id: String,
    ticker: String,
    prediction_id: String,
    actual_outcome: i64,
    predicted_probability: f64,
    brier_score: f64,
    resolved_at: DateTime<Utc>,
}

impl Outcome {
    /// Score `prediction` against the realized outcome (1 = YES, 0 = NO)
    pub fn resolve(
        prediction: &Prediction,
        actual_outcome: i64,
        ids: &dyn IdGenerator,
        clock: &dyn Clock,
    ) -> Result<Self> {
        validate_binary_outcome(actual_outcome)?;

        let predicted_probability = prediction.probability();
        Ok(Self {
            id: ids.next_id("out"),
            ticker: prediction.ticker().to_string(),
            prediction_id: prediction.id().to_string(),
            actual_outcome,
            predicted_probability,
            brier_score: brier_score(predicted_probability, actual_outcome),
            resolved_at: clock.now(),
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn ticker(&self) -> &str {
        &self.ticker
    }

    pub fn prediction_id(&self) -> &str {
        &self.prediction_id
    }

    pub fn actual_outcome(&self) -> i64 {
        self.actual_outcome
    }

    pub fn predicted_probability(&self) -> f64 {
        self.predicted_probability
    }

    pub fn brier_score(&self) -> f64 {
        self.brier_score
    }

    pub fn resolved_at(&self) -> DateTime<Utc> {
        self.resolved_at
    }

    pub fn result(&self) -> MarketResult {
        MarketResult::from_outcome(self.actual_outcome)
    }

    /// Whether the prediction leaned the right way (ties at 0.5 never count)
    pub fn called_direction(&self) -> bool {
        (self.predicted_probability > 0.5 && self.actual_outcome == 1)
            || (self.predicted_probability < 0.5 && self.actual_outcome == 0)
    }
}
