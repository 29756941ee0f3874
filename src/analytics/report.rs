use super::calibration::CalibrationBucket;
use super::performance::AgentStats;

/// Prediction-weighted mean calibration error; None when there is no data
pub fn weighted_calibration_error(buckets: &[CalibrationBucket]) -> Option<f64> {
    let total: i64 = buckets.iter().map(|b| b.prediction_count).sum();
    if total == 0 {
        return None;
    }
    let weighted: f64 = buckets
        .iter()
        .map(|b| b.calibration_error * b.prediction_count as f64)
        .sum();
    Some(weighted / total as f64)
}

/// Calibration buckets as a plain-text table
pub fn format_calibration_report(buckets: &[CalibrationBucket]) -> String {
    let mut lines = vec![
        "Calibration Report".to_string(),
        "=".repeat(60),
        format!(
            "{:<12} {:>8} {:>10} {:>10} {:>10}",
            "Range", "Count", "Predicted", "Actual", "Error"
        ),
        "-".repeat(60),
    ];

    for b in buckets {
        let range = format!("{:.0}%-{:.0}%", b.range_low * 100.0, b.range_high * 100.0);
        lines.push(format!(
            "{:<12} {:>8} {:>9.1}% {:>9.1}% {:>9.1}%",
            range,
            b.prediction_count,
            b.avg_predicted * 100.0,
            b.actual_rate * 100.0,
            b.calibration_error * 100.0
        ));
    }

    if let Some(avg) = weighted_calibration_error(buckets) {
        lines.push("-".repeat(60));
        lines.push(format!("Weighted avg calibration error: {:.1}%", avg * 100.0));
    }

    lines.join("\n")
}

/// Agent statistics with a Brier score guide
pub fn format_agent_stats(stats: &AgentStats) -> String {
    format!(
        "Agent: {}\n\
         {}\n\
         Total Predictions:    {}\n\
         Resolved:             {}\n\
         Average Brier Score:  {:.4}\n\
         Average Edge:         {:+.1}%\n\
         Win Rate (edge > 0):  {:.1}%\n\
         \n\
         Brier Score Guide:\n\
         \x20 0.00 = Perfect prediction\n\
         \x20 0.25 = Random guessing\n\
         \x20 1.00 = Always wrong",
        stats.agent_name,
        "=".repeat(40),
        stats.total_predictions,
        stats.resolved_predictions,
        stats.avg_brier_score,
        stats.avg_edge * 100.0,
        stats.win_rate * 100.0
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::calibration::bucket_calibration;

    #[test]
    fn test_empty_report_has_no_average() {
        let text = format_calibration_report(&[]);
        assert!(text.starts_with("Calibration Report"));
        assert!(!text.contains("Weighted avg"));
        assert_eq!(weighted_calibration_error(&[]), None);
    }

    #[test]
    fn test_weighted_error() {
        // Bucket 0.2: three predictions at 0.2, none YES -> error 0.2
        // Bucket 0.8: one prediction at 0.8, YES -> error 0.2
        let buckets = bucket_calibration(vec![(0.2, 0), (0.2, 0), (0.2, 0), (0.8, 1)]);
        let avg = weighted_calibration_error(&buckets).unwrap();
        assert!((avg - 0.2).abs() < 1e-9);

        let text = format_calibration_report(&buckets);
        assert!(text.contains("20%-30%"));
        assert!(text.contains("Weighted avg calibration error: 20.0%"));
    }

    #[test]
    fn test_format_agent_stats() {
        let stats = AgentStats {
            agent_name: "macro".to_string(),
            total_predictions: 12,
            resolved_predictions: 5,
            avg_brier_score: 0.1834,
            avg_edge: 0.062,
            win_rate: 0.6,
        };
        let text = format_agent_stats(&stats);
        assert!(text.starts_with("Agent: macro"));
        assert!(text.contains("Average Brier Score:  0.1834"));
        assert!(text.contains("Average Edge:         +6.2%"));
        assert!(text.contains("Win Rate (edge > 0):  60.0%"));
        assert!(text.contains("  0.25 = Random guessing"));
    }
}
