use crate::adapters::transaction_manager::{ManagedTransaction, TransactionManager, TransactionScope};
use crate::domain::{
    Clock, IdGenerator, Market, MarketResult, MarketSnapshot, MarketStatus, Outcome, Prediction,
    ReasoningTrace, SystemClock, Trade, TradeSide, TradeStatus, UuidIdGenerator,
};
use crate::error::{MaverickError, Result};
use crate::validation::validate_binary_outcome;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

const PREDICTION_COLUMNS: &str = "id, ticker, agent_name, probability, confidence, market_price, \
     edge, category, subcategory, timestamp";

const OUTCOME_COLUMNS: &str =
    "id, ticker, prediction_id, actual_outcome, predicted_probability, brier_score, resolved_at";

/// SQLite storage adapter for the prediction lifecycle
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
    transactions: TransactionManager,
    ids: Arc<dyn IdGenerator>,
    clock: Arc<dyn Clock>,
}

impl SqliteStore {
    /// Open (creating if missing) a SQLite database
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await?;

        info!("Connected to SQLite at {}", database_url);
        Ok(Self::from_pool(pool))
    }

    /// Migrated in-memory store backed by a single long-lived connection
    pub async fn in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        let store = Self::from_pool(pool);
        store.migrate().await?;
        Ok(store)
    }

    /// Create a store from an existing connection pool
    pub fn from_pool(pool: SqlitePool) -> Self {
        Self {
            transactions: TransactionManager::new(pool.clone()),
            pool,
            ids: Arc::new(UuidIdGenerator),
            clock: Arc::new(SystemClock),
        }
    }

    /// Replace the id generator and clock used for records the store creates
    pub fn with_sources(mut self, ids: Arc<dyn IdGenerator>, clock: Arc<dyn Clock>) -> Self {
        self.ids = ids;
        self.clock = clock;
        self
    }

    /// Run migrations
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        info!("Database migrations completed");
        Ok(())
    }

    /// Get the connection pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn ids(&self) -> &dyn IdGenerator {
        self.ids.as_ref()
    }

    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    // ==================== Predictions ====================

    /// Insert a prediction and, if given, its reasoning trace in one transaction
    #[instrument(skip(self, prediction, reasoning), fields(prediction_id = %prediction.id()))]
    pub async fn store_prediction(
        &self,
        prediction: &Prediction,
        reasoning: Option<&ReasoningTrace>,
    ) -> Result<String> {
        if let Some(trace) = reasoning {
            trace.ensure_belongs_to(prediction)?;
        }

        let mut tx = self
            .transactions
            .begin(TransactionScope::PredictionWithReasoning)
            .await?;
        let written = Self::insert_prediction_tx(&mut tx, prediction, reasoning).await;
        tx.finish(written).await?;

        info!(
            "Stored prediction {} for {} by {} (p={:.3}, edge={:+.3})",
            prediction.id(),
            prediction.ticker(),
            prediction.agent_name(),
            prediction.probability(),
            prediction.edge()
        );
        Ok(prediction.id().to_string())
    }

    async fn insert_prediction_tx(
        tx: &mut ManagedTransaction,
        prediction: &Prediction,
        reasoning: Option<&ReasoningTrace>,
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO predictions
                (id, ticker, agent_name, probability, confidence, market_price,
                 edge, category, subcategory, timestamp)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(prediction.id())
        .bind(prediction.ticker())
        .bind(prediction.agent_name())
        .bind(prediction.probability())
        .bind(prediction.confidence())
        .bind(prediction.market_price())
        .bind(prediction.edge())
        .bind(prediction.category())
        .bind(prediction.subcategory())
        .bind(prediction.timestamp())
        .execute(tx.executor()?)
        .await?;

        if let Some(trace) = reasoning {
            sqlx::query(
                r#"
                INSERT INTO reasoning_traces
                    (id, prediction_id, reasoning_text, key_factors, unknowns,
                     base_rate_used, timestamp)
                VALUES (?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&trace.id)
            .bind(&trace.prediction_id)
            .bind(&trace.reasoning_text)
            .bind(serde_json::to_string(&trace.key_factors)?)
            .bind(serde_json::to_string(&trace.unknowns)?)
            .bind(trace.base_rate_used)
            .bind(trace.timestamp)
            .execute(tx.executor()?)
            .await?;
        }

        Ok(())
    }

    /// Get a prediction by id
    pub async fn get_prediction(&self, prediction_id: &str) -> Result<Option<Prediction>> {
        let sql = format!("SELECT {} FROM predictions WHERE id = ?", PREDICTION_COLUMNS);
        let prediction = sqlx::query_as::<_, Prediction>(&sql)
            .bind(prediction_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(prediction)
    }

    /// Get all predictions for a market, newest first
    pub async fn get_predictions_for_ticker(&self, ticker: &str) -> Result<Vec<Prediction>> {
        let sql = format!(
            "SELECT {} FROM predictions WHERE ticker = ? ORDER BY timestamp DESC",
            PREDICTION_COLUMNS
        );
        let predictions = sqlx::query_as::<_, Prediction>(&sql)
            .bind(ticker)
            .fetch_all(&self.pool)
            .await?;
        Ok(predictions)
    }

    /// Get the reasoning trace for a prediction
    pub async fn get_reasoning(&self, prediction_id: &str) -> Result<Option<ReasoningTrace>> {
        let row = sqlx::query(
            r#"
            SELECT id, prediction_id, reasoning_text, key_factors, unknowns,
                   base_rate_used, timestamp
            FROM reasoning_traces WHERE prediction_id = ?
            "#,
        )
        .bind(prediction_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| {
            Ok(ReasoningTrace {
                id: r.get("id"),
                prediction_id: r.get("prediction_id"),
                reasoning_text: r.get("reasoning_text"),
                key_factors: decode_json_list(r.get("key_factors"))?,
                unknowns: decode_json_list(r.get("unknowns"))?,
                base_rate_used: r.get("base_rate_used"),
                timestamp: r.get("timestamp"),
            })
        })
        .transpose()
    }

    // ==================== Markets ====================

    /// Insert a market or merge it over the stored row.
    ///
    /// Merge rules: title is overwritten; optional metadata is overwritten only
    /// when present; status is kept once resolved; result is never touched;
    /// created_at keeps the stored value.
    #[instrument(skip(self, market), fields(ticker = %market.ticker))]
    pub async fn store_market(&self, market: &Market) -> Result<String> {
        if market.status == MarketStatus::Resolved || market.result.is_some() {
            return Err(MaverickError::Validation(format!(
                "market {} cannot be stored as resolved; record an outcome instead",
                market.ticker
            )));
        }

        sqlx::query(
            r#"
            INSERT INTO markets
                (ticker, title, category, subcategory, close_time, resolution_time,
                 status, result, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, NULL, ?, ?)
            ON CONFLICT (ticker) DO UPDATE SET
                title = excluded.title,
                category = COALESCE(excluded.category, markets.category),
                subcategory = COALESCE(excluded.subcategory, markets.subcategory),
                close_time = COALESCE(excluded.close_time, markets.close_time),
                resolution_time = COALESCE(excluded.resolution_time, markets.resolution_time),
                status = CASE
                    WHEN markets.status = 'resolved' THEN markets.status
                    ELSE excluded.status
                END,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&market.ticker)
        .bind(&market.title)
        .bind(&market.category)
        .bind(&market.subcategory)
        .bind(market.close_time)
        .bind(market.resolution_time)
        .bind(market.status.as_str())
        .bind(market.created_at)
        .bind(market.updated_at)
        .execute(&self.pool)
        .await?;

        debug!("Stored market {}", market.ticker);
        Ok(market.ticker.clone())
    }

    /// Get a market by ticker
    pub async fn get_market(&self, ticker: &str) -> Result<Option<Market>> {
        let row = sqlx::query(
            r#"
            SELECT ticker, title, category, subcategory, close_time, resolution_time,
                   status, result, created_at, updated_at
            FROM markets WHERE ticker = ?
            "#,
        )
        .bind(ticker)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(market_from_row).transpose()
    }

    // ==================== Snapshots ====================

    /// Append a price snapshot
    pub async fn store_market_snapshot(&self, snapshot: &MarketSnapshot) -> Result<String> {
        sqlx::query(
            r#"
            INSERT INTO market_snapshots
                (id, ticker, yes_price, no_price, volume, open_interest, timestamp)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&snapshot.id)
        .bind(&snapshot.ticker)
        .bind(snapshot.yes_price)
        .bind(snapshot.no_price)
        .bind(snapshot.volume)
        .bind(snapshot.open_interest)
        .bind(snapshot.timestamp)
        .execute(&self.pool)
        .await?;

        Ok(snapshot.id.clone())
    }

    /// Most recent snapshots for a market, newest first
    pub async fn get_snapshots(&self, ticker: &str, limit: i64) -> Result<Vec<MarketSnapshot>> {
        let rows = sqlx::query(
            r#"
            SELECT id, ticker, yes_price, no_price, volume, open_interest, timestamp
            FROM market_snapshots
            WHERE ticker = ?
            ORDER BY timestamp DESC
            LIMIT ?
            "#,
        )
        .bind(ticker)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(|r| MarketSnapshot {
                id: r.get("id"),
                ticker: r.get("ticker"),
                yes_price: r.get("yes_price"),
                no_price: r.get("no_price"),
                volume: r.get("volume"),
                open_interest: r.get("open_interest"),
                timestamp: r.get("timestamp"),
            })
            .collect())
    }

    // ==================== Outcomes ====================

    /// Resolve a prediction and score it.
    ///
    /// The Brier score uses the probability stored on the named prediction.
    /// The market is marked resolved in the same transaction. A prediction can
    /// only be resolved once, and a resolved market keeps its first result.
    #[instrument(skip(self))]
    pub async fn store_outcome(
        &self,
        ticker: &str,
        actual_outcome: i64,
        prediction_id: &str,
    ) -> Result<(String, f64)> {
        validate_binary_outcome(actual_outcome)?;

        let mut tx = self.transactions.begin(TransactionScope::Resolution).await?;
        let resolved = self
            .resolve_tx(&mut tx, ticker, actual_outcome, prediction_id)
            .await;
        let outcome = tx.finish(resolved).await?;

        info!(
            "Resolved prediction {} on {} as {} (brier={:.4})",
            prediction_id,
            ticker,
            outcome.result(),
            outcome.brier_score()
        );
        Ok((outcome.id().to_string(), outcome.brier_score()))
    }

    async fn resolve_tx(
        &self,
        tx: &mut ManagedTransaction,
        ticker: &str,
        actual_outcome: i64,
        prediction_id: &str,
    ) -> Result<Outcome> {
        let sql = format!("SELECT {} FROM predictions WHERE id = ?", PREDICTION_COLUMNS);
        let prediction = sqlx::query_as::<_, Prediction>(&sql)
            .bind(prediction_id)
            .fetch_optional(tx.executor()?)
            .await?
            .ok_or_else(|| MaverickError::NotFound(format!("Prediction {} not found", prediction_id)))?;

        if prediction.ticker() != ticker {
            return Err(MaverickError::Validation(format!(
                "prediction {} belongs to {}, not {}",
                prediction_id,
                prediction.ticker(),
                ticker
            )));
        }

        let already: Option<String> =
            sqlx::query_scalar("SELECT id FROM outcomes WHERE prediction_id = ?")
                .bind(prediction_id)
                .fetch_optional(tx.executor()?)
                .await?;
        if already.is_some() {
            warn!("Rejected repeat resolution of prediction {}", prediction_id);
            return Err(MaverickError::AlreadyResolved {
                prediction_id: prediction_id.to_string(),
            });
        }

        // Predictions may arrive before any market metadata
        let now = self.clock().now();
        let placeholder = sqlx::query(
            r#"
            INSERT INTO markets (ticker, title, status, created_at, updated_at)
            VALUES (?, ?, 'open', ?, ?)
            ON CONFLICT (ticker) DO NOTHING
            "#,
        )
        .bind(ticker)
        .bind(ticker)
        .bind(now)
        .bind(now)
        .execute(tx.executor()?)
        .await?;
        if placeholder.rows_affected() > 0 {
            debug!("Created placeholder market {} for resolution", ticker);
        }

        let market = sqlx::query("SELECT status, result FROM markets WHERE ticker = ?")
            .bind(ticker)
            .fetch_one(tx.executor()?)
            .await?;
        let status = parse_status(market.get("status"))?;
        let stored_result = market
            .get::<Option<String>, _>("result")
            .map(|s| parse_result(&s))
            .transpose()?;

        let result = MarketResult::from_outcome(actual_outcome);
        match stored_result {
            Some(existing) if existing != result => {
                return Err(MaverickError::Validation(format!(
                    "market {} already resolved as {}",
                    ticker, existing
                )));
            }
            Some(_) => {}
            None if !status.can_transition_to(MarketStatus::Resolved) => {
                return Err(MaverickError::InvalidStateTransition {
                    from: status.to_string(),
                    to: MarketStatus::Resolved.to_string(),
                });
            }
            None => {}
        }

        let outcome = Outcome::resolve(&prediction, actual_outcome, self.ids(), self.clock())?;

        let sql = format!("INSERT INTO outcomes ({}) VALUES (?, ?, ?, ?, ?, ?, ?)", OUTCOME_COLUMNS);
        sqlx::query(&sql)
            .bind(outcome.id())
            .bind(outcome.ticker())
            .bind(outcome.prediction_id())
            .bind(outcome.actual_outcome())
            .bind(outcome.predicted_probability())
            .bind(outcome.brier_score())
            .bind(outcome.resolved_at())
            .execute(tx.executor()?)
            .await?;

        sqlx::query(
            r#"
            UPDATE markets SET
                status = 'resolved',
                result = ?,
                resolution_time = COALESCE(resolution_time, ?),
                updated_at = ?
            WHERE ticker = ?
            "#,
        )
        .bind(result.as_str())
        .bind(outcome.resolved_at())
        .bind(outcome.resolved_at())
        .bind(ticker)
        .execute(tx.executor()?)
        .await?;

        Ok(outcome)
    }

    /// Query outcomes with optional filters, most recent resolution first
    pub async fn get_outcomes(
        &self,
        ticker: Option<&str>,
        agent_name: Option<&str>,
        limit: i64,
    ) -> Result<Vec<Outcome>> {
        let outcomes = sqlx::query_as::<_, Outcome>(
            r#"
            SELECT o.id, o.ticker, o.prediction_id, o.actual_outcome,
                   o.predicted_probability, o.brier_score, o.resolved_at
            FROM outcomes o
            JOIN predictions p ON o.prediction_id = p.id
            WHERE (?1 IS NULL OR o.ticker = ?1)
              AND (?2 IS NULL OR p.agent_name = ?2)
            ORDER BY o.resolved_at DESC
            LIMIT ?3
            "#,
        )
        .bind(ticker)
        .bind(agent_name)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(outcomes)
    }

    // ==================== Trades ====================

    /// Store a trade record
    pub async fn store_trade(&self, trade: &Trade) -> Result<String> {
        sqlx::query(
            r#"
            INSERT INTO trades
                (id, prediction_id, ticker, side, contracts, price, filled_at,
                 status, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&trade.id)
        .bind(&trade.prediction_id)
        .bind(&trade.ticker)
        .bind(trade.side.as_str())
        .bind(trade.contracts)
        .bind(trade.price)
        .bind(trade.filled_at)
        .bind(trade.status.as_str())
        .bind(trade.created_at)
        .execute(&self.pool)
        .await?;

        debug!("Stored trade {} for prediction {}", trade.id, trade.prediction_id);
        Ok(trade.id.clone())
    }

    /// Trades placed on a prediction, oldest first
    pub async fn get_trades_for_prediction(&self, prediction_id: &str) -> Result<Vec<Trade>> {
        let rows = sqlx::query(
            r#"
            SELECT id, prediction_id, ticker, side, contracts, price, filled_at,
                   status, created_at
            FROM trades
            WHERE prediction_id = ?
            ORDER BY created_at ASC
            "#,
        )
        .bind(prediction_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|r| {
                let side: String = r.get("side");
                let status: String = r.get("status");
                Ok(Trade {
                    id: r.get("id"),
                    prediction_id: r.get("prediction_id"),
                    ticker: r.get("ticker"),
                    side: TradeSide::try_from(side.as_str()).map_err(MaverickError::Internal)?,
                    contracts: r.get("contracts"),
                    price: r.get("price"),
                    filled_at: r.get("filled_at"),
                    status: TradeStatus::try_from(status.as_str())
                        .map_err(MaverickError::Internal)?,
                    created_at: r.get("created_at"),
                })
            })
            .collect()
    }
}

fn market_from_row(r: &SqliteRow) -> Result<Market> {
    let result: Option<String> = r.get("result");
    Ok(Market {
        ticker: r.get("ticker"),
        title: r.get("title"),
        category: r.get("category"),
        subcategory: r.get("subcategory"),
        close_time: r.get::<Option<DateTime<Utc>>, _>("close_time"),
        resolution_time: r.get::<Option<DateTime<Utc>>, _>("resolution_time"),
        status: parse_status(r.get("status"))?,
        result: result.as_deref().map(parse_result).transpose()?,
        created_at: r.get("created_at"),
        updated_at: r.get("updated_at"),
    })
}

fn parse_status(raw: String) -> Result<MarketStatus> {
    MarketStatus::try_from(raw.as_str()).map_err(MaverickError::Internal)
}

fn parse_result(raw: &str) -> Result<MarketResult> {
    MarketResult::try_from(raw).map_err(MaverickError::Internal)
}

/// JSON array column; NULL decodes to an empty list
fn decode_json_list(raw: Option<String>) -> Result<Vec<String>> {
    match raw {
        Some(text) if !text.is_empty() => Ok(serde_json::from_str(&text)?),
        _ => Ok(Vec::new()),
    }
}
