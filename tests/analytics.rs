use chrono::{DateTime, Duration, TimeZone, Utc};
use maverick::adapters::SqliteStore;
use maverick::analytics::{
    agent_performance, calibration_report, category_performance, format_calibration_report,
    recent_predictions, unresolved_markets, UNCATEGORIZED,
};
use maverick::domain::{FixedClock, Market, NewPrediction, Prediction, SequentialIds};
use std::sync::Arc;

struct Fixture {
    store: SqliteStore,
    clock: Arc<FixedClock>,
}

fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 4, 1, 0, 0, 0).unwrap()
}

async fn fixture() -> Fixture {
    let clock = Arc::new(FixedClock::new(start()));
    let store = SqliteStore::in_memory()
        .await
        .unwrap()
        .with_sources(Arc::new(SequentialIds::new()), clock.clone());
    Fixture { store, clock }
}

impl Fixture {
    async fn predict(
        &self,
        ticker: &str,
        agent: &str,
        category: Option<&str>,
        probability: f64,
        price: f64,
    ) -> Prediction {
        let mut new = NewPrediction::new(ticker, agent, probability, 0.6, price);
        new.category = category.map(str::to_string);
        let p = Prediction::create(new, self.store.ids(), self.store.clock()).unwrap();
        self.store.store_prediction(&p, None).await.unwrap();
        p
    }

    /// Create the market if needed and resolve `p`
    async fn resolve(&self, p: &Prediction, outcome: i64) {
        if self.store.get_market(p.ticker()).await.unwrap().is_none() {
            let m = Market::new(p.ticker(), format!("{}?", p.ticker()), self.store.clock());
            self.store.store_market(&m).await.unwrap();
        }
        self.store
            .store_outcome(p.ticker(), outcome, p.id())
            .await
            .unwrap();
    }
}

#[tokio::test]
async fn calibration_well_calibrated_bucket() {
    let f = fixture().await;

    // Outside the window once the clock moves forward
    let stale = f.predict("KXOLD", "macro", None, 0.15, 0.5).await;
    f.resolve(&stale, 1).await;
    f.clock.advance(Duration::days(60));

    for (i, (p, y)) in [(0.72, 1), (0.78, 1), (0.74, 0), (0.76, 1)].into_iter().enumerate() {
        let pred = f.predict(&format!("KXA-{i}"), "macro", Some("Economics"), p, 0.5).await;
        f.resolve(&pred, y).await;
    }
    // Unresolved predictions never count
    f.predict("KXB", "macro", Some("Economics"), 0.25, 0.5).await;

    let buckets = calibration_report(&f.store, f.store.clock(), None, None, 30)
        .await
        .unwrap();
    assert_eq!(buckets.len(), 1);
    let b = &buckets[0];
    assert!((b.range_low - 0.7).abs() < 1e-12);
    assert_eq!(b.prediction_count, 4);
    assert!((b.avg_predicted - 0.75).abs() < 1e-9);
    assert!((b.actual_rate - 0.75).abs() < 1e-12);
    assert!(b.calibration_error < 1e-9);

    // A wider window picks up the stale prediction in its own bucket
    let buckets = calibration_report(&f.store, f.store.clock(), None, None, 90)
        .await
        .unwrap();
    assert_eq!(buckets.len(), 2);
    assert!((buckets[0].range_low - 0.1).abs() < 1e-12);
    assert!(format_calibration_report(&buckets).contains("Weighted avg calibration error"));
}

#[tokio::test]
async fn calibration_filters_by_agent_and_category() {
    let f = fixture().await;
    let a = f.predict("KXA", "macro", Some("Economics"), 0.35, 0.5).await;
    let b = f.predict("KXB", "politics", Some("Politics"), 0.65, 0.5).await;
    f.resolve(&a, 0).await;
    f.resolve(&b, 1).await;

    let clock = f.store.clock();
    let by_agent = calibration_report(&f.store, clock, Some("politics"), None, 30).await.unwrap();
    assert_eq!(by_agent.len(), 1);
    assert!((by_agent[0].range_low - 0.6).abs() < 1e-12);

    let by_category = calibration_report(&f.store, clock, None, Some("Economics"), 30).await.unwrap();
    assert_eq!(by_category.len(), 1);
    assert!((by_category[0].range_low - 0.3).abs() < 1e-12);

    let none = calibration_report(&f.store, clock, Some("nobody"), None, 30).await.unwrap();
    assert!(none.is_empty());
    assert!(!format_calibration_report(&none).contains("Weighted avg"));
}

#[tokio::test]
async fn agent_win_rate_ignores_non_positive_edge() {
    let f = fixture().await;

    let win = f.predict("KXA", "macro", None, 0.7, 0.5).await; // edge +0.2, YES
    let loss = f.predict("KXB", "macro", None, 0.6, 0.4).await; // edge +0.2, NO
    let negative = f.predict("KXC", "macro", None, 0.3, 0.5).await; // edge -0.2, NO
    let flat = f.predict("KXG", "macro", None, 0.6, 0.6).await; // edge 0, YES
    f.predict("KXD", "macro", None, 0.55, 0.5).await; // unresolved
    f.predict("KXE", "other", None, 0.9, 0.1).await;

    f.resolve(&win, 1).await;
    f.resolve(&loss, 0).await;
    f.resolve(&negative, 0).await;
    f.resolve(&flat, 1).await;
    assert_eq!(flat.edge(), 0.0);

    let stats = agent_performance(&f.store, f.store.clock(), "macro", 90).await.unwrap();
    assert_eq!(stats.agent_name, "macro");
    assert_eq!(stats.total_predictions, 5);
    assert_eq!(stats.resolved_predictions, 4);
    // (0.09 + 0.36 + 0.09 + 0.16) / 4
    assert!((stats.avg_brier_score - 0.175).abs() < 1e-9);
    assert!((stats.avg_edge - 0.05).abs() < 1e-9);
    // Called-right negative and zero edge predictions are both excluded
    assert!((stats.win_rate - 0.5).abs() < 1e-12);
}

#[tokio::test]
async fn agent_without_history_has_zeroed_stats() {
    let f = fixture().await;
    let stats = agent_performance(&f.store, f.store.clock(), "ghost", 30).await.unwrap();
    assert_eq!(stats.total_predictions, 0);
    assert_eq!(stats.resolved_predictions, 0);
    assert_eq!(stats.avg_brier_score, 0.0);
    assert_eq!(stats.avg_edge, 0.0);
    assert_eq!(stats.win_rate, 0.0);
}

#[tokio::test]
async fn recent_predictions_report_resolution() {
    let f = fixture().await;
    let first = f.predict("KXA", "macro", None, 0.8, 0.6).await;
    f.clock.advance(Duration::minutes(1));
    let second = f.predict("KXB", "politics", None, 0.4, 0.5).await;
    f.clock.advance(Duration::minutes(1));
    let third = f.predict("KXC", "macro", None, 0.5, 0.5).await;
    f.resolve(&first, 1).await;

    let recent = recent_predictions(&f.store, 10, None).await.unwrap();
    let ids: Vec<&str> = recent.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec![third.id(), second.id(), first.id()]);

    let resolved = &recent[2];
    assert!(resolved.resolved);
    assert_eq!(resolved.actual_outcome, Some(1));
    assert!((resolved.brier_score.unwrap() - 0.04).abs() < 1e-12);
    assert!(!recent[0].resolved);
    assert_eq!(recent[0].brier_score, None);

    let limited = recent_predictions(&f.store, 1, Some("macro")).await.unwrap();
    assert_eq!(limited.len(), 1);
    assert_eq!(limited[0].id, third.id());
}

#[tokio::test]
async fn unresolved_markets_group_open_predictions() {
    let f = fixture().await;
    let close = start() + Duration::days(14);
    let market = Market::new("KXFED-25MAY", "Fed cut in May?", f.store.clock())
        .with_category("Economics")
        .with_close_time(close);
    f.store.store_market(&market).await.unwrap();

    f.predict("KXFED-25MAY", "macro", None, 0.2, 0.3).await;
    f.clock.advance(Duration::hours(1));
    f.predict("KXFED-25MAY", "politics", None, 0.4, 0.3).await;
    let done = f.predict("KXCPI-25APR", "macro", None, 0.6, 0.5).await;
    f.resolve(&done, 1).await;
    f.clock.advance(Duration::hours(1));
    f.predict("KXNEW", "macro", None, 0.5, 0.5).await;

    let markets = unresolved_markets(&f.store).await.unwrap();
    let tickers: Vec<&str> = markets.iter().map(|m| m.ticker.as_str()).collect();
    assert_eq!(tickers, vec!["KXNEW", "KXFED-25MAY"]);

    let fed = &markets[1];
    assert_eq!(fed.title.as_deref(), Some("Fed cut in May?"));
    assert_eq!(fed.category.as_deref(), Some("Economics"));
    assert_eq!(fed.close_time, Some(close));
    assert_eq!(fed.prediction_count, 2);
    assert!((fed.avg_probability - 0.3).abs() < 1e-9);
    assert_eq!(fed.latest_prediction, start() + Duration::hours(1));

    assert_eq!(markets[0].title, None);
}

#[tokio::test]
async fn category_performance_breakdown() {
    let f = fixture().await;
    let e1 = f.predict("KXA", "macro", Some("Economics"), 0.7, 0.5).await;
    f.predict("KXB", "macro", Some("Economics"), 0.4, 0.5).await;
    f.predict("KXC", "macro", Some("Economics"), 0.6, 0.5).await;
    f.predict("KXD", "politics", None, 0.5, 0.4).await;
    f.predict("KXE", "politics", None, 0.5, 0.4).await;
    f.predict("KXF", "politics", Some("Politics"), 0.5, 0.4).await;
    f.resolve(&e1, 1).await;

    let stats = category_performance(&f.store, f.store.clock(), 30).await.unwrap();
    let names: Vec<&str> = stats.iter().map(|s| s.category.as_str()).collect();
    assert_eq!(names, vec!["Economics", UNCATEGORIZED, "Politics"]);

    let econ = &stats[0];
    assert_eq!(econ.prediction_count, 3);
    assert_eq!(econ.resolved_count, 1);
    assert!((econ.avg_brier_score.unwrap() - 0.09).abs() < 1e-9);

    let uncategorized = &stats[1];
    assert_eq!(uncategorized.prediction_count, 2);
    assert_eq!(uncategorized.resolved_count, 0);
    assert_eq!(uncategorized.avg_brier_score, None);
    assert!((uncategorized.avg_edge - 0.1).abs() < 1e-9);
}
