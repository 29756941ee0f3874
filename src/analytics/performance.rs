use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use sqlx::Row;

use crate::adapters::SqliteStore;
use crate::domain::Clock;
use crate::error::Result;

/// Performance statistics for one agent
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgentStats {
    pub agent_name: String,
    pub total_predictions: i64,
    pub resolved_predictions: i64,
    pub avg_brier_score: f64,
    pub avg_edge: f64,
    /// Share of resolved positive-edge predictions that called the direction
    pub win_rate: f64,
}

/// A prediction with its resolution, if any
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecentPrediction {
    pub id: String,
    pub ticker: String,
    pub agent_name: String,
    pub probability: f64,
    pub market_price: f64,
    pub edge: f64,
    pub timestamp: DateTime<Utc>,
    pub resolved: bool,
    pub actual_outcome: Option<i64>,
    pub brier_score: Option<f64>,
}

/// Market with predictions still waiting on an outcome
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnresolvedMarket {
    pub ticker: String,
    pub title: Option<String>,
    pub category: Option<String>,
    pub close_time: Option<DateTime<Utc>>,
    pub prediction_count: i64,
    pub avg_probability: f64,
    pub latest_prediction: DateTime<Utc>,
}

/// Performance breakdown for one category
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryStats {
    pub category: String,
    pub prediction_count: i64,
    pub resolved_count: i64,
    /// None when nothing in the category has resolved
    pub avg_brier_score: Option<f64>,
    pub avg_edge: f64,
}

pub const UNCATEGORIZED: &str = "uncategorized";

/// Summary statistics for `agent_name` over the last `days` days
pub async fn agent_performance(
    store: &SqliteStore,
    clock: &dyn Clock,
    agent_name: &str,
    days: i64,
) -> Result<AgentStats> {
    let cutoff = clock.now() - Duration::days(days);

    let total: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM predictions WHERE agent_name = ? AND timestamp >= ?",
    )
    .bind(agent_name)
    .bind(cutoff)
    .fetch_one(store.pool())
    .await?;

    let resolved = sqlx::query(
        r#"
        SELECT COUNT(*) AS count,
               AVG(o.brier_score) AS avg_brier,
               AVG(p.edge) AS avg_edge
        FROM predictions p
        JOIN outcomes o ON p.id = o.prediction_id
        WHERE p.agent_name = ? AND p.timestamp >= ?
        "#,
    )
    .bind(agent_name)
    .bind(cutoff)
    .fetch_one(store.pool())
    .await?;

    let wins = sqlx::query(
        r#"
        SELECT COUNT(*) AS total,
               SUM(CASE
                   WHEN (p.probability > 0.5 AND o.actual_outcome = 1)
                     OR (p.probability < 0.5 AND o.actual_outcome = 0)
                   THEN 1 ELSE 0
               END) AS wins
        FROM predictions p
        JOIN outcomes o ON p.id = o.prediction_id
        WHERE p.agent_name = ? AND p.timestamp >= ? AND p.edge > 0
        "#,
    )
    .bind(agent_name)
    .bind(cutoff)
    .fetch_one(store.pool())
    .await?;

    let win_total: i64 = wins.get("total");
    let win_count: Option<i64> = wins.get("wins");
    let win_rate = if win_total > 0 {
        win_count.unwrap_or(0) as f64 / win_total as f64
    } else {
        0.0
    };

    Ok(AgentStats {
        agent_name: agent_name.to_string(),
        total_predictions: total,
        resolved_predictions: resolved.get("count"),
        avg_brier_score: resolved.get::<Option<f64>, _>("avg_brier").unwrap_or(0.0),
        avg_edge: resolved.get::<Option<f64>, _>("avg_edge").unwrap_or(0.0),
        win_rate,
    })
}

/// Most recent predictions, newest first, with resolution status
pub async fn recent_predictions(
    store: &SqliteStore,
    limit: i64,
    agent_name: Option<&str>,
) -> Result<Vec<RecentPrediction>> {
    let rows = sqlx::query(
        r#"
        SELECT p.id, p.ticker, p.agent_name, p.probability, p.market_price,
               p.edge, p.timestamp, o.actual_outcome, o.brier_score
        FROM predictions p
        LEFT JOIN outcomes o ON p.id = o.prediction_id
        WHERE (?1 IS NULL OR p.agent_name = ?1)
        ORDER BY p.timestamp DESC
        LIMIT ?2
        "#,
    )
    .bind(agent_name)
    .bind(limit)
    .fetch_all(store.pool())
    .await?;

    Ok(rows
        .iter()
        .map(|r| {
            let actual_outcome: Option<i64> = r.get("actual_outcome");
            RecentPrediction {
                id: r.get("id"),
                ticker: r.get("ticker"),
                agent_name: r.get("agent_name"),
                probability: r.get("probability"),
                market_price: r.get("market_price"),
                edge: r.get("edge"),
                timestamp: r.get("timestamp"),
                resolved: actual_outcome.is_some(),
                actual_outcome,
                brier_score: r.get("brier_score"),
            }
        })
        .collect())
}

/// Markets with at least one unresolved prediction, most recently predicted first
pub async fn unresolved_markets(store: &SqliteStore) -> Result<Vec<UnresolvedMarket>> {
    let rows = sqlx::query(
        r#"
        SELECT p.ticker,
               m.title,
               m.category,
               m.close_time,
               COUNT(p.id) AS prediction_count,
               AVG(p.probability) AS avg_probability,
               MAX(p.timestamp) AS latest_prediction
        FROM predictions p
        LEFT JOIN markets m ON p.ticker = m.ticker
        LEFT JOIN outcomes o ON p.id = o.prediction_id
        WHERE o.id IS NULL
        GROUP BY p.ticker
        ORDER BY latest_prediction DESC
        "#,
    )
    .fetch_all(store.pool())
    .await?;

    Ok(rows
        .iter()
        .map(|r| UnresolvedMarket {
            ticker: r.get("ticker"),
            title: r.get("title"),
            category: r.get("category"),
            close_time: r.get("close_time"),
            prediction_count: r.get("prediction_count"),
            avg_probability: r.get("avg_probability"),
            latest_prediction: r.get("latest_prediction"),
        })
        .collect())
}

/// Per-category breakdown over the last `days` days, busiest category first
pub async fn category_performance(
    store: &SqliteStore,
    clock: &dyn Clock,
    days: i64,
) -> Result<Vec<CategoryStats>> {
    let cutoff = clock.now() - Duration::days(days);

    let rows = sqlx::query(
        r#"
        SELECT p.category,
               COUNT(*) AS prediction_count,
               COUNT(o.id) AS resolved_count,
               AVG(o.brier_score) AS avg_brier,
               AVG(p.edge) AS avg_edge
        FROM predictions p
        LEFT JOIN outcomes o ON p.id = o.prediction_id
        WHERE p.timestamp >= ?
        GROUP BY p.category
        ORDER BY prediction_count DESC, p.category ASC
        "#,
    )
    .bind(cutoff)
    .fetch_all(store.pool())
    .await?;

    Ok(rows
        .iter()
        .map(|r| CategoryStats {
            category: r
                .get::<Option<String>, _>("category")
                .unwrap_or_else(|| UNCATEGORIZED.to_string()),
            prediction_count: r.get("prediction_count"),
            resolved_count: r.get("resolved_count"),
            avg_brier_score: r.get("avg_brier"),
            avg_edge: r.get::<Option<f64>, _>("avg_edge").unwrap_or(0.0),
        })
        .collect())
}
