//! Payout and time-value analysis for a single binary contract bet

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;
use std::fmt;

use crate::domain::TradeSide;
use crate::error::{MaverickError, Result};
use crate::validation::validate_bet_amount;

/// Default annual risk-free rate (T-bills)
pub const DEFAULT_RISK_FREE_RATE: Decimal = dec!(0.05);

const DAYS_PER_YEAR: Decimal = dec!(365);
const GOOD_ANNUALIZED: Decimal = dec!(0.25);
const MEH_ANNUALIZED: Decimal = dec!(0.15);

/// Rough judgement of an annualized return
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Verdict {
    Good,
    Meh,
    Bad,
}

impl Verdict {
    pub fn from_annualized(annualized_return: Decimal) -> Self {
        if annualized_return > GOOD_ANNUALIZED {
            Verdict::Good
        } else if annualized_return > MEH_ANNUALIZED {
            Verdict::Meh
        } else {
            Verdict::Bad
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Verdict::Good => "GOOD - high annualized return",
            Verdict::Meh => "MEH - consider shorter bets",
            Verdict::Bad => "BAD - capital locked too long",
        }
    }
}

/// Return on the bet relative to its holding period
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeAnalysis {
    pub days: u32,
    pub annual_multiplier: Decimal,
    /// Simple, not compounded
    pub annualized_return: Decimal,
    pub risk_free_for_period: Decimal,
    pub risk_free_profit: Decimal,
    pub risk_premium: Decimal,
    pub verdict: Verdict,
}

/// Outcome of a bet if it wins or loses
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Payout {
    pub direction: TradeSide,
    pub bet_amount: Decimal,
    /// Price paid per contract (0-1)
    pub price: Decimal,
    pub contracts: Decimal,
    /// Each contract pays $1 if it wins
    pub payout_if_win: Decimal,
    pub profit_if_win: Decimal,
    pub return_pct: Decimal,
    pub loss_if_lose: Decimal,
    pub time: Option<TimeAnalysis>,
}

/// Calculate the payout of buying `bet_amount` worth of contracts on one side.
///
/// `market_prob` is the YES price; a NO bet pays `1 - market_prob` per contract.
pub fn calculate_payout(
    bet_amount: Decimal,
    market_prob: Decimal,
    direction: TradeSide,
    days_to_resolution: Option<u32>,
    risk_free_rate: Decimal,
) -> Result<Payout> {
    validate_bet_amount(bet_amount)?;
    if market_prob < Decimal::ZERO || market_prob > Decimal::ONE {
        return Err(MaverickError::Validation(format!(
            "market_prob must be between 0 and 1, got {}",
            market_prob
        )));
    }

    let price = match direction {
        TradeSide::Yes => market_prob,
        TradeSide::No => Decimal::ONE - market_prob,
    };
    if price.is_zero() {
        return Err(MaverickError::Validation(format!(
            "{} contracts have zero price at market_prob {}",
            direction, market_prob
        )));
    }

    let contracts = checked(bet_amount.checked_div(price), "contract count")?;
    let payout_if_win = contracts;
    let profit_if_win = payout_if_win - bet_amount;
    let return_pct = checked(profit_if_win.checked_div(bet_amount), "return")?;

    let time = match days_to_resolution.filter(|d| *d > 0) {
        Some(days) => {
            let days_dec = Decimal::from(days);
            let annual_multiplier = DAYS_PER_YEAR / days_dec;
            let annualized_return =
                checked(return_pct.checked_mul(annual_multiplier), "annualized return")?;
            let risk_free_for_period = checked(
                risk_free_rate
                    .checked_mul(days_dec)
                    .and_then(|v| v.checked_div(DAYS_PER_YEAR)),
                "risk-free return",
            )?;
            let risk_free_profit =
                checked(bet_amount.checked_mul(risk_free_for_period), "risk-free profit")?;

            Some(TimeAnalysis {
                days,
                annual_multiplier,
                annualized_return,
                risk_free_for_period,
                risk_free_profit,
                risk_premium: checked(return_pct.checked_sub(risk_free_for_period), "risk premium")?,
                verdict: Verdict::from_annualized(annualized_return),
            })
        }
        None => None,
    };

    Ok(Payout {
        direction,
        bet_amount,
        price,
        contracts,
        payout_if_win,
        profit_if_win,
        return_pct,
        loss_if_lose: bet_amount,
        time,
    })
}

fn checked(value: Option<Decimal>, what: &str) -> Result<Decimal> {
    value.ok_or_else(|| MaverickError::Validation(format!("{} is out of range", what)))
}

fn pct(value: Decimal, dp: u32) -> Decimal {
    match value.checked_mul(dec!(100)) {
        Some(scaled) => scaled.round_dp(dp),
        None if value.is_sign_negative() => Decimal::MIN,
        None => Decimal::MAX,
    }
}

impl fmt::Display for Payout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let side = self.direction.as_str().to_uppercase();

        writeln!(f, "Payout Calculator")?;
        writeln!(f, "=====================================")?;
        writeln!(f, "Bet:          ${:.2} on {}", self.bet_amount, side)?;
        writeln!(f, "Price:        {}% ({} cents)", pct(self.price, 0), pct(self.price, 0))?;
        writeln!(f, "Contracts:    {:.0}", self.contracts)?;
        writeln!(f)?;
        writeln!(f, "If {} wins:", side)?;
        writeln!(f, "  Payout:     ${:.2}", self.payout_if_win)?;
        writeln!(
            f,
            "  Profit:     ${:.2} ({}% return)",
            self.profit_if_win,
            pct(self.return_pct, 1)
        )?;
        writeln!(f)?;
        writeln!(f, "If {} loses:", side)?;
        writeln!(f, "  Loss:       ${:.2} (100% of bet)", self.loss_if_lose)?;

        if let Some(t) = &self.time {
            writeln!(f)?;
            writeln!(f, "Time Analysis ({} days to resolution)", t.days)?;
            writeln!(f, "=====================================")?;
            writeln!(
                f,
                "Annualized:   {}% (if you could repeat this)",
                pct(t.annualized_return, 1)
            )?;
            writeln!(
                f,
                "Risk-free:    {}% for same period (${:.2})",
                pct(t.risk_free_for_period, 2),
                t.risk_free_profit
            )?;
            writeln!(f, "Risk premium: {}% extra vs risk-free", pct(t.risk_premium, 2))?;
            writeln!(f)?;
            writeln!(f, "Verdict:      {}", t.verdict.description())?;
        }
        write!(f, "=====================================")
    }
}
