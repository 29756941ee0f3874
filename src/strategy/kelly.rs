//! Fractional Kelly position sizing
//!
//! Maps (our probability, market price, confidence, horizon) to a capped
//! fraction of bankroll. Pure functions; inputs are clamped, never rejected.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{MaverickError, Result};

/// Probabilities are clamped into this band before any odds are computed
pub const MIN_PROB: f64 = 0.001;
pub const MAX_PROB: f64 = 0.999;

/// Edges smaller than this are treated as noise
pub const MIN_EDGE: f64 = 0.01;

/// Never recommend more than this fraction of bankroll on a single trade
pub const MAX_POSITION: f64 = 0.10;

/// Trade direction implied by an edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Direction {
    BuyYes,
    BuyNo,
    NoTrade,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::BuyYes => "BUY_YES",
            Direction::BuyNo => "BUY_NO",
            Direction::NoTrade => "NO_TRADE",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How much of full Kelly we are willing to bet
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    Low,
    #[default]
    Medium,
    High,
}

impl Confidence {
    pub fn multiplier(&self) -> f64 {
        match self {
            Confidence::Low => 0.25,
            Confidence::Medium => 0.40,
            // Still only half Kelly
            Confidence::High => 0.50,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Confidence::Low => "low",
            Confidence::Medium => "medium",
            Confidence::High => "high",
        }
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl TryFrom<&str> for Confidence {
    type Error = MaverickError;

    fn try_from(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "low" => Ok(Confidence::Low),
            "medium" => Ok(Confidence::Medium),
            "high" => Ok(Confidence::High),
            _ => Err(MaverickError::Validation(format!("Unknown confidence: {}", s))),
        }
    }
}

/// Time until resolution, used to discount for capital lock-up
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeHorizon {
    /// Under a week
    Days,
    /// 1-4 weeks
    Weeks,
    /// 1-3 months
    Months,
    /// 3-6 months
    Quarters,
    /// 6+ months
    Years,
}

impl TimeHorizon {
    pub fn multiplier(&self) -> f64 {
        match self {
            TimeHorizon::Days => 1.0,
            TimeHorizon::Weeks => 0.7,
            TimeHorizon::Months => 0.5,
            TimeHorizon::Quarters => 0.3,
            TimeHorizon::Years => 0.2,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TimeHorizon::Days => "days",
            TimeHorizon::Weeks => "weeks",
            TimeHorizon::Months => "months",
            TimeHorizon::Quarters => "quarters",
            TimeHorizon::Years => "years",
        }
    }
}

impl TryFrom<&str> for TimeHorizon {
    type Error = MaverickError;

    fn try_from(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "days" => Ok(TimeHorizon::Days),
            "weeks" => Ok(TimeHorizon::Weeks),
            "months" => Ok(TimeHorizon::Months),
            "quarters" => Ok(TimeHorizon::Quarters),
            "years" => Ok(TimeHorizon::Years),
            _ => Err(MaverickError::Validation(format!("Unknown time horizon: {}", s))),
        }
    }
}

/// Result of a Kelly calculation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KellyResult {
    pub direction: Direction,
    /// Absolute edge; 0 when there is no trade
    pub edge: f64,
    /// Full Kelly fraction in [0, 1]
    pub full_kelly: f64,
    /// After confidence/horizon adjustment and the position cap
    pub recommended: f64,
    pub our_prob: f64,
    pub market_prob: f64,
    pub confidence: Confidence,
}

/// Dollar amounts for a Kelly result at a given bankroll
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct KellySizing {
    pub bankroll: f64,
    pub full_amount: f64,
    pub recommended_amount: f64,
}

impl KellyResult {
    pub fn is_trade(&self) -> bool {
        self.direction != Direction::NoTrade
    }

    pub fn with_bankroll(&self, bankroll: f64) -> KellySizing {
        KellySizing {
            bankroll,
            full_amount: bankroll * self.full_kelly,
            recommended_amount: bankroll * self.recommended,
        }
    }
}

impl fmt::Display for KellyResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.is_trade() {
            return write!(f, "NO_TRADE: No edge detected");
        }

        writeln!(f, "Kelly Calculation")?;
        writeln!(f, "=====================================")?;
        writeln!(f, "Direction:    {}", self.direction)?;
        writeln!(
            f,
            "Edge:         {:.1}% ({:.1} points)",
            self.edge * 100.0,
            self.edge * 100.0
        )?;
        writeln!(f)?;
        writeln!(f, "Our estimate: {:.1}%", self.our_prob * 100.0)?;
        writeln!(f, "Market price: {:.1}%", self.market_prob * 100.0)?;
        writeln!(f, "Confidence:   {}", self.confidence)?;
        writeln!(f)?;
        writeln!(f, "Full Kelly:   {:.2}% of bankroll", self.full_kelly * 100.0)?;
        writeln!(
            f,
            "Recommended:  {:.2}% of bankroll (fractional)",
            self.recommended * 100.0
        )?;
        write!(f, "=====================================")
    }
}

impl fmt::Display for KellySizing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Position Sizing (${:.0} bankroll)", self.bankroll)?;
        writeln!(f, "=====================================")?;
        writeln!(f, "Full Kelly:   ${:.2}", self.full_amount)?;
        writeln!(f, "Recommended:  ${:.2}", self.recommended_amount)?;
        write!(f, "=====================================")
    }
}

/// Full Kelly fraction for a binary bet: f* = (p*b - q) / b, clamped to [0, 1]
///
/// `win_probability` is the chance the side we buy wins; `odds` is win/risk.
pub fn kelly_fraction(win_probability: f64, odds: f64) -> f64 {
    if win_probability.is_nan() || odds.is_nan() || odds <= 0.0 {
        return 0.0;
    }
    let q = 1.0 - win_probability;
    ((win_probability * odds - q) / odds).clamp(0.0, 1.0)
}

/// Calculate the recommended position size for a forecast against a market price
pub fn calculate_kelly(
    our_prob: f64,
    market_prob: f64,
    confidence: Confidence,
    time_horizon: Option<TimeHorizon>,
) -> KellyResult {
    let our_prob = our_prob.clamp(MIN_PROB, MAX_PROB);
    let market_prob = market_prob.clamp(MIN_PROB, MAX_PROB);

    // NaN survives clamping; no estimate means no trade
    if our_prob.is_nan() || market_prob.is_nan() || (our_prob - market_prob).abs() < MIN_EDGE {
        return KellyResult {
            direction: Direction::NoTrade,
            edge: 0.0,
            full_kelly: 0.0,
            recommended: 0.0,
            our_prob,
            market_prob,
            confidence,
        };
    }

    let (direction, p, b) = if our_prob > market_prob {
        // YES underpriced
        (Direction::BuyYes, our_prob, (1.0 - market_prob) / market_prob)
    } else {
        (Direction::BuyNo, 1.0 - our_prob, market_prob / (1.0 - market_prob))
    };

    let full_kelly = kelly_fraction(p, b);

    let mut recommended = full_kelly * confidence.multiplier();
    if let Some(horizon) = time_horizon {
        recommended *= horizon.multiplier();
    }
    let recommended = recommended.min(MAX_POSITION);

    KellyResult {
        direction,
        edge: (our_prob - market_prob).abs(),
        full_kelly,
        recommended,
        our_prob,
        market_prob,
        confidence,
    }
}

/// Edge magnitude and direction, with the same dead zone as `calculate_kelly`
pub fn calculate_edge(our_prob: f64, market_prob: f64) -> (f64, Direction) {
    let edge = our_prob - market_prob;
    if edge > MIN_EDGE {
        (edge, Direction::BuyYes)
    } else if edge < -MIN_EDGE {
        (edge.abs(), Direction::BuyNo)
    } else {
        (0.0, Direction::NoTrade)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kelly_fraction() {
        // 60% at even odds -> 20%
        assert!((kelly_fraction(0.6, 1.0) - 0.2).abs() < 1e-9);

        // No edge
        assert!(kelly_fraction(0.5, 1.0).abs() < 1e-9);

        // Negative edge is floored
        assert_eq!(kelly_fraction(0.3, 1.0), 0.0);
        assert_eq!(kelly_fraction(0.9, 0.0), 0.0);
    }

    #[test]
    fn test_buy_no_medium_confidence() {
        let r = calculate_kelly(0.30, 0.50, Confidence::Medium, None);

        assert_eq!(r.direction, Direction::BuyNo);
        assert!((r.edge - 0.20).abs() < 1e-9);
        // p = 0.7, b = 1 -> f* = 0.4
        assert!((r.full_kelly - 0.4).abs() < 1e-9);
        assert!((r.recommended - (r.full_kelly * 0.40).min(MAX_POSITION)).abs() < 1e-12);
        assert_eq!(r.recommended, MAX_POSITION);
    }

    #[test]
    fn test_dead_zone_is_no_trade() {
        let r = calculate_kelly(0.50, 0.505, Confidence::High, None);
        assert_eq!(r.direction, Direction::NoTrade);
        assert_eq!(r.full_kelly, 0.0);
        assert_eq!(r.recommended, 0.0);
        assert_eq!(r.to_string(), "NO_TRADE: No edge detected");
    }

    #[test]
    fn test_buy_yes_with_horizon() {
        // p = 0.60, m = 0.45 -> b = 0.55/0.45
        let r = calculate_kelly(0.60, 0.45, Confidence::Low, Some(TimeHorizon::Months));
        let b = 0.55 / 0.45;
        let expected_full = (0.60 * b - 0.40) / b;

        assert_eq!(r.direction, Direction::BuyYes);
        assert!((r.full_kelly - expected_full).abs() < 1e-9);
        assert!((r.recommended - expected_full * 0.25 * 0.5).abs() < 1e-9);
        assert!(r.recommended <= MAX_POSITION);
    }

    #[test]
    fn test_inputs_are_clamped() {
        let r = calculate_kelly(1.5, -0.2, Confidence::High, None);
        assert_eq!(r.our_prob, MAX_PROB);
        assert_eq!(r.market_prob, MIN_PROB);
        assert_eq!(r.direction, Direction::BuyYes);
        assert!(r.recommended <= MAX_POSITION);
    }

    #[test]
    fn test_nan_inputs_never_size_a_position() {
        let r = calculate_kelly(f64::NAN, 0.5, Confidence::High, None);
        assert_eq!(r.direction, Direction::NoTrade);
        assert_eq!(r.recommended, 0.0);
        assert!(!r.is_trade());

        let r = calculate_kelly(0.5, f64::NAN, Confidence::High, Some(TimeHorizon::Days));
        assert_eq!(r.direction, Direction::NoTrade);
        assert_eq!(r.recommended, 0.0);

        assert_eq!(kelly_fraction(f64::NAN, 1.0), 0.0);
        assert_eq!(kelly_fraction(0.6, f64::NAN), 0.0);
    }

    #[test]
    fn test_with_bankroll() {
        let r = calculate_kelly(0.05, 0.13, Confidence::High, None);
        let sizing = r.with_bankroll(10_000.0);
        assert!((sizing.full_amount - 10_000.0 * r.full_kelly).abs() < 1e-6);
        assert!((sizing.recommended_amount - 10_000.0 * r.recommended).abs() < 1e-6);
    }

    #[test]
    fn test_calculate_edge() {
        let (edge, dir) = calculate_edge(0.60, 0.45);
        assert!((edge - 0.15).abs() < 1e-9);
        assert_eq!(dir, Direction::BuyYes);

        let (edge, dir) = calculate_edge(0.30, 0.50);
        assert!((edge - 0.20).abs() < 1e-9);
        assert_eq!(dir, Direction::BuyNo);

        assert_eq!(calculate_edge(0.50, 0.505), (0.0, Direction::NoTrade));
    }

    #[test]
    fn test_parse_confidence_and_horizon() {
        assert_eq!(Confidence::try_from("HIGH").unwrap(), Confidence::High);
        assert!(Confidence::try_from("extreme").is_err());
        assert_eq!(TimeHorizon::try_from("quarters").unwrap(), TimeHorizon::Quarters);
        assert!(TimeHorizon::try_from("decades").is_err());
    }
}
