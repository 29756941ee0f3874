use chrono::Duration;
use serde::Serialize;
use sqlx::Row;
use tracing::debug;

use crate::adapters::SqliteStore;
use crate::domain::Clock;
use crate::error::Result;

pub const BUCKET_COUNT: usize = 10;

/// Calibration data for one probability range
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CalibrationBucket {
    pub range_low: f64,
    pub range_high: f64,
    pub prediction_count: i64,
    /// Fraction that resolved YES
    pub actual_rate: f64,
    pub avg_predicted: f64,
    /// |actual_rate - avg_predicted|
    pub calibration_error: f64,
}

/// Bucket index for a probability; 1.0 falls into the top bucket
pub fn bucket_index(probability: f64) -> usize {
    ((probability * BUCKET_COUNT as f64) as usize).min(BUCKET_COUNT - 1)
}

/// Group resolved (probability, outcome) pairs into 10% buckets.
///
/// Empty buckets are omitted; the rest come back in ascending order.
pub fn bucket_calibration<I>(resolved: I) -> Vec<CalibrationBucket>
where
    I: IntoIterator<Item = (f64, i64)>,
{
    // (count, sum of probabilities, sum of outcomes)
    let mut acc = [(0i64, 0.0f64, 0i64); BUCKET_COUNT];
    for (probability, outcome) in resolved {
        let slot = &mut acc[bucket_index(probability)];
        slot.0 += 1;
        slot.1 += probability;
        slot.2 += outcome;
    }

    acc.iter()
        .enumerate()
        .filter(|(_, (count, _, _))| *count > 0)
        .map(|(idx, &(count, prob_sum, yes_count))| {
            let avg_predicted = prob_sum / count as f64;
            let actual_rate = yes_count as f64 / count as f64;
            CalibrationBucket {
                range_low: idx as f64 / BUCKET_COUNT as f64,
                range_high: (idx + 1) as f64 / BUCKET_COUNT as f64,
                prediction_count: count,
                actual_rate,
                avg_predicted,
                calibration_error: (actual_rate - avg_predicted).abs(),
            }
        })
        .collect()
}

/// Calibration of resolved predictions made in the last `days` days
pub async fn calibration_report(
    store: &SqliteStore,
    clock: &dyn Clock,
    agent_name: Option<&str>,
    category: Option<&str>,
    days: i64,
) -> Result<Vec<CalibrationBucket>> {
    let cutoff = clock.now() - Duration::days(days);

    let rows = sqlx::query(
        r#"
        SELECT p.probability, o.actual_outcome
        FROM predictions p
        JOIN outcomes o ON p.id = o.prediction_id
        WHERE p.timestamp >= ?1
          AND (?2 IS NULL OR p.agent_name = ?2)
          AND (?3 IS NULL OR p.category = ?3)
        "#,
    )
    .bind(cutoff)
    .bind(agent_name)
    .bind(category)
    .fetch_all(store.pool())
    .await?;

    debug!("Calibration over {} resolved predictions", rows.len());

    Ok(bucket_calibration(rows.iter().map(|r| {
        (
            r.get::<f64, _>("probability"),
            r.get::<i64, _>("actual_outcome"),
        )
    })))
}
