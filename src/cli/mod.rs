//! Maverick CLI - store and query predictions, size positions
//!
//! Commands:
//! - `maverick store-prediction` / `resolve` / `get` - prediction lifecycle
//! - `maverick calibration` / `agent-stats` / `recent` / `unresolved` / `category-stats`
//! - `maverick kelly` / `payout` - sizing math, no database needed

pub mod output;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand, ValueEnum};
use rust_decimal::Decimal;
use serde::Serialize;
use std::path::Path;
use tabled::Tabled;

use crate::adapters::SqliteStore;
use crate::analytics::{self, CategoryStats, RecentPrediction, UnresolvedMarket};
use crate::config::AppConfig;
use crate::domain::{MarketResult, NewPrediction, NewReasoning, Prediction, ReasoningTrace, TradeSide};
use crate::strategy::{calculate_kelly, calculate_payout, Confidence, TimeHorizon};
use output::OutputMode;

/// Maverick prediction tracker CLI
#[derive(Parser, Debug)]
#[command(name = "maverick")]
#[command(author, version, about = "Forecast tracking, calibration scoring and Kelly sizing")]
pub struct Cli {
    /// Output as JSON instead of human-readable tables.
    #[arg(long, global = true)]
    pub json: bool,

    /// Database URL (overrides config).
    #[arg(long, global = true)]
    pub database: Option<String>,

    /// Config directory.
    #[arg(long, global = true, default_value = "config")]
    pub config_dir: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Initialize the database
    Init,

    /// Store a new prediction
    StorePrediction {
        #[arg(long)]
        ticker: String,
        #[arg(long)]
        agent: String,
        /// Predicted probability (0-1)
        #[arg(long)]
        probability: f64,
        /// Confidence level (0-1)
        #[arg(long)]
        confidence: f64,
        /// Current market price (0-1)
        #[arg(long)]
        market_price: f64,
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        subcategory: Option<String>,
        /// Full reasoning text
        #[arg(long)]
        reasoning: Option<String>,
        /// Key factors (comma-separated)
        #[arg(long)]
        factors: Option<String>,
        /// Key unknowns (comma-separated)
        #[arg(long)]
        unknowns: Option<String>,
        #[arg(long)]
        base_rate: Option<f64>,
    },

    /// Resolve a prediction with the actual outcome
    Resolve {
        #[arg(long)]
        ticker: String,
        #[arg(long)]
        prediction_id: String,
        #[arg(long, value_enum, ignore_case = true)]
        outcome: OutcomeArg,
    },

    /// Get a specific prediction
    Get {
        #[arg(long)]
        prediction_id: String,
    },

    /// Show calibration report
    Calibration {
        #[arg(long)]
        agent: Option<String>,
        #[arg(long)]
        category: Option<String>,
        /// Lookback period in days
        #[arg(long)]
        days: Option<i64>,
    },

    /// Show agent performance
    AgentStats {
        #[arg(long)]
        agent: String,
        #[arg(long)]
        days: Option<i64>,
    },

    /// Show recent predictions
    Recent {
        #[arg(long)]
        limit: Option<i64>,
        #[arg(long)]
        agent: Option<String>,
    },

    /// Show markets with unresolved predictions
    Unresolved,

    /// Show performance by category
    CategoryStats {
        #[arg(long)]
        days: Option<i64>,
    },

    /// Kelly criterion position sizing
    Kelly {
        /// Your probability estimate (0-1)
        #[arg(long)]
        our_prob: f64,
        /// Current market price for YES (0-1)
        #[arg(long)]
        market_prob: f64,
        #[arg(long, value_enum)]
        confidence: Option<ConfidenceArg>,
        #[arg(long, value_enum)]
        time_horizon: Option<HorizonArg>,
        /// Total bankroll for dollar amounts
        #[arg(long)]
        bankroll: Option<f64>,
    },

    /// Payout for a specific bet
    Payout {
        #[arg(long)]
        bet: Decimal,
        /// Current market price for YES (0-1)
        #[arg(long)]
        market_prob: Decimal,
        #[arg(long, value_enum, ignore_case = true)]
        direction: OutcomeArg,
        /// Days until resolution (for annualized return)
        #[arg(long)]
        days: Option<u32>,
        /// Annual risk-free rate
        #[arg(long)]
        risk_free: Option<Decimal>,
    },
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutcomeArg {
    Yes,
    No,
}

impl From<OutcomeArg> for MarketResult {
    fn from(arg: OutcomeArg) -> Self {
        match arg {
            OutcomeArg::Yes => MarketResult::Yes,
            OutcomeArg::No => MarketResult::No,
        }
    }
}

impl From<OutcomeArg> for TradeSide {
    fn from(arg: OutcomeArg) -> Self {
        match arg {
            OutcomeArg::Yes => TradeSide::Yes,
            OutcomeArg::No => TradeSide::No,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfidenceArg {
    Low,
    Medium,
    High,
}

impl From<ConfidenceArg> for Confidence {
    fn from(arg: ConfidenceArg) -> Self {
        match arg {
            ConfidenceArg::Low => Confidence::Low,
            ConfidenceArg::Medium => Confidence::Medium,
            ConfidenceArg::High => Confidence::High,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum HorizonArg {
    Days,
    Weeks,
    Months,
    Quarters,
    Years,
}

impl From<HorizonArg> for TimeHorizon {
    fn from(arg: HorizonArg) -> Self {
        match arg {
            HorizonArg::Days => TimeHorizon::Days,
            HorizonArg::Weeks => TimeHorizon::Weeks,
            HorizonArg::Months => TimeHorizon::Months,
            HorizonArg::Quarters => TimeHorizon::Quarters,
            HorizonArg::Years => TimeHorizon::Years,
        }
    }
}

impl Commands {
    /// Whether the command needs a database connection
    pub fn uses_database(&self) -> bool {
        !matches!(self, Commands::Kelly { .. } | Commands::Payout { .. })
    }
}

#[derive(Debug, Serialize, Tabled)]
pub struct RecentRow {
    pub ticker: String,
    pub agent: String,
    pub prob: String,
    pub market: String,
    pub edge: String,
    pub resolved: String,
}

impl From<&RecentPrediction> for RecentRow {
    fn from(p: &RecentPrediction) -> Self {
        Self {
            ticker: p.ticker.clone(),
            agent: p.agent_name.clone(),
            prob: output::pct(p.probability, 0),
            market: output::pct(p.market_price, 0),
            edge: output::signed_pct(p.edge, 0),
            resolved: match p.actual_outcome {
                Some(1) => "YES".to_string(),
                Some(_) => "NO".to_string(),
                None => "-".to_string(),
            },
        }
    }
}

#[derive(Debug, Serialize, Tabled)]
pub struct UnresolvedRow {
    pub ticker: String,
    pub title: String,
    pub predictions: i64,
    pub avg_prob: String,
    pub closes: String,
}

impl From<&UnresolvedMarket> for UnresolvedRow {
    fn from(m: &UnresolvedMarket) -> Self {
        Self {
            ticker: m.ticker.clone(),
            title: m.title.clone().unwrap_or_default(),
            predictions: m.prediction_count,
            avg_prob: output::pct(m.avg_probability, 0),
            closes: m
                .close_time
                .map(|t| t.format("%Y-%m-%d").to_string())
                .unwrap_or_else(|| "-".to_string()),
        }
    }
}

#[derive(Debug, Serialize, Tabled)]
pub struct CategoryRow {
    pub category: String,
    pub predictions: i64,
    pub resolved: i64,
    pub avg_brier: String,
    pub avg_edge: String,
}

impl From<&CategoryStats> for CategoryRow {
    fn from(s: &CategoryStats) -> Self {
        Self {
            category: s.category.clone(),
            predictions: s.prediction_count,
            resolved: s.resolved_count,
            avg_brier: s
                .avg_brier_score
                .map(|b| format!("{:.4}", b))
                .unwrap_or_else(|| "-".to_string()),
            avg_edge: output::signed_pct(s.avg_edge, 1),
        }
    }
}

#[derive(Debug, Serialize)]
struct StoredPrediction<'a> {
    prediction_id: &'a str,
    ticker: &'a str,
    agent: &'a str,
    probability: f64,
    market_price: f64,
    edge: f64,
    direction: &'static str,
}

#[derive(Debug, Serialize)]
struct ResolvedPrediction<'a> {
    outcome_id: String,
    prediction_id: &'a str,
    actual_outcome: String,
    brier_score: f64,
}

#[derive(Debug, Serialize)]
struct PredictionDetail<'a> {
    #[serde(flatten)]
    prediction: &'a Prediction,
    direction: &'static str,
    reasoning: Option<ReasoningTrace>,
}

fn split_list(raw: Option<&str>) -> Vec<String> {
    raw.map(|s| {
        s.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    })
    .unwrap_or_default()
}

/// Create the parent directory of a file-backed SQLite URL
pub fn ensure_database_dir(url: &str) -> anyhow::Result<()> {
    let path = url
        .trim_start_matches("sqlite://")
        .trim_start_matches("sqlite:");
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() || path.starts_with(":memory:") {
        return Ok(());
    }
    if let Some(parent) = Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating database directory {}", parent.display()))?;
        }
    }
    Ok(())
}

/// Run a command that does not touch the database
pub fn run_offline(command: &Commands, config: &AppConfig, mode: OutputMode) -> anyhow::Result<()> {
    match command {
        Commands::Kelly {
            our_prob,
            market_prob,
            confidence,
            time_horizon,
            bankroll,
        } => {
            let confidence = confidence
                .map(Confidence::from)
                .unwrap_or(config.sizing.default_confidence);
            let result = calculate_kelly(
                *our_prob,
                *market_prob,
                confidence,
                time_horizon.map(TimeHorizon::from),
            );
            let bankroll = bankroll.or(config.sizing.bankroll);

            match mode {
                OutputMode::Json => {
                    #[derive(Serialize)]
                    struct KellyOutput<'a> {
                        #[serde(flatten)]
                        result: &'a crate::strategy::KellyResult,
                        sizing: Option<crate::strategy::KellySizing>,
                    }
                    output::print_json(&KellyOutput {
                        result: &result,
                        sizing: bankroll.map(|b| result.with_bankroll(b)),
                    })?;
                }
                OutputMode::Table => {
                    println!("{result}");
                    if let Some(b) = bankroll {
                        if result.is_trade() {
                            println!("\n{}", result.with_bankroll(b));
                        }
                    }
                }
            }
            Ok(())
        }
        Commands::Payout {
            bet,
            market_prob,
            direction,
            days,
            risk_free,
        } => {
            let payout = calculate_payout(
                *bet,
                *market_prob,
                TradeSide::from(*direction),
                *days,
                risk_free.unwrap_or(config.sizing.risk_free_rate),
            )?;
            output::print_item(&payout, &payout.to_string(), mode)
        }
        other => bail!("{:?} needs a database", other),
    }
}

/// Run a command against the store
pub async fn run(
    command: Commands,
    store: &SqliteStore,
    config: &AppConfig,
    mode: OutputMode,
) -> anyhow::Result<()> {
    let window = |days: Option<i64>| days.unwrap_or(config.analytics.window_days);

    match command {
        Commands::Init => {
            store.migrate().await?;
            println!("Database initialized at: {}", config.database.url);
        }
        Commands::StorePrediction {
            ticker,
            agent,
            probability,
            confidence,
            market_price,
            category,
            subcategory,
            reasoning,
            factors,
            unknowns,
            base_rate,
        } => {
            let mut new = NewPrediction::new(ticker, agent, probability, confidence, market_price);
            new.category = category;
            new.subcategory = subcategory;
            let prediction = Prediction::create(new, store.ids(), store.clock())?;

            let trace = reasoning
                .map(|text| {
                    let new = NewReasoning {
                        reasoning_text: text,
                        key_factors: split_list(factors.as_deref()),
                        unknowns: split_list(unknowns.as_deref()),
                        base_rate_used: base_rate,
                    };
                    ReasoningTrace::create(&prediction, new, store.ids(), store.clock())
                })
                .transpose()?;

            let id = store.store_prediction(&prediction, trace.as_ref()).await?;
            output::print_json(&StoredPrediction {
                prediction_id: &id,
                ticker: prediction.ticker(),
                agent: prediction.agent_name(),
                probability: prediction.probability(),
                market_price: prediction.market_price(),
                edge: prediction.edge(),
                direction: prediction.direction(),
            })?;
        }
        Commands::Resolve {
            ticker,
            prediction_id,
            outcome,
        } => {
            let result = MarketResult::from(outcome);
            let (outcome_id, brier) = store
                .store_outcome(&ticker, result.as_outcome(), &prediction_id)
                .await?;
            output::print_json(&ResolvedPrediction {
                outcome_id,
                prediction_id: &prediction_id,
                actual_outcome: result.as_str().to_uppercase(),
                brier_score: (brier * 10_000.0).round() / 10_000.0,
            })?;
        }
        Commands::Get { prediction_id } => {
            let Some(prediction) = store.get_prediction(&prediction_id).await? else {
                bail!("Prediction {} not found.", prediction_id);
            };
            let reasoning = store.get_reasoning(&prediction_id).await?;
            output::print_json(&PredictionDetail {
                prediction: &prediction,
                direction: prediction.direction(),
                reasoning,
            })?;
        }
        Commands::Calibration {
            agent,
            category,
            days,
        } => {
            let buckets = analytics::calibration_report(
                store,
                store.clock(),
                agent.as_deref(),
                category.as_deref(),
                window(days),
            )
            .await?;
            output::print_item(&buckets, &analytics::format_calibration_report(&buckets), mode)?;
        }
        Commands::AgentStats { agent, days } => {
            let stats =
                analytics::agent_performance(store, store.clock(), &agent, window(days)).await?;
            output::print_item(&stats, &analytics::format_agent_stats(&stats), mode)?;
        }
        Commands::Recent { limit, agent } => {
            let limit = limit.unwrap_or(config.analytics.recent_limit);
            let preds = analytics::recent_predictions(store, limit, agent.as_deref()).await?;
            output::print_rows(
                &preds,
                |p| p.iter().map(RecentRow::from).collect(),
                "No predictions found.",
                mode,
            )?;
        }
        Commands::Unresolved => {
            let markets = analytics::unresolved_markets(store).await?;
            output::print_rows(
                &markets,
                |m| m.iter().map(UnresolvedRow::from).collect(),
                "No unresolved predictions.",
                mode,
            )?;
        }
        Commands::CategoryStats { days } => {
            let stats =
                analytics::category_performance(store, store.clock(), window(days)).await?;
            output::print_rows(
                &stats,
                |s| s.iter().map(CategoryRow::from).collect(),
                "No predictions found.",
                mode,
            )?;
        }
        offline @ (Commands::Kelly { .. } | Commands::Payout { .. }) => {
            run_offline(&offline, config, mode)?;
        }
    }
    Ok(())
}
