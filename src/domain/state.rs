use serde::{Deserialize, Serialize};
use std::fmt;

/// Market lifecycle states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarketStatus {
    /// Trading, outcome unknown
    Open,
    /// No longer trading, outcome not yet recorded
    Closed,
    /// Outcome recorded (terminal)
    Resolved,
}

impl MarketStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MarketStatus::Open => "open",
            MarketStatus::Closed => "closed",
            MarketStatus::Resolved => "resolved",
        }
    }

    /// Check if this state can transition to another state
    pub fn can_transition_to(&self, target: MarketStatus) -> bool {
        use MarketStatus::*;

        match (self, target) {
            (Open, Closed) => true,
            (Open, Resolved) => true,
            (Closed, Resolved) => true,

            // Metadata refreshes may restate the current status
            (Open, Open) | (Closed, Closed) => true,

            // Resolved is terminal
            _ => false,
        }
    }

    /// Get valid next states from current state
    pub fn valid_transitions(&self) -> Vec<MarketStatus> {
        use MarketStatus::*;

        match self {
            Open => vec![Closed, Resolved],
            Closed => vec![Resolved],
            Resolved => vec![],
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, MarketStatus::Resolved)
    }
}

impl fmt::Display for MarketStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl TryFrom<&str> for MarketStatus {
    type Error = String;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        match s.to_lowercase().as_str() {
            "open" => Ok(MarketStatus::Open),
            "closed" => Ok(MarketStatus::Closed),
            "resolved" => Ok(MarketStatus::Resolved),
            _ => Err(format!("Unknown market status: {}", s)),
        }
    }
}

/// Resolved result of a binary market
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarketResult {
    Yes,
    No,
}

impl MarketResult {
    pub fn as_str(&self) -> &'static str {
        match self {
            MarketResult::Yes => "yes",
            MarketResult::No => "no",
        }
    }

    /// Map a binary outcome (1 = YES, anything else = NO)
    pub fn from_outcome(actual_outcome: i64) -> Self {
        if actual_outcome == 1 {
            MarketResult::Yes
        } else {
            MarketResult::No
        }
    }

    pub fn as_outcome(&self) -> i64 {
        match self {
            MarketResult::Yes => 1,
            MarketResult::No => 0,
        }
    }
}

impl fmt::Display for MarketResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl TryFrom<&str> for MarketResult {
    type Error = String;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        match s.to_lowercase().as_str() {
            "yes" | "1" => Ok(MarketResult::Yes),
            "no" | "0" => Ok(MarketResult::No),
            _ => Err(format!("Unknown market result: {}", s)),
        }
    }
}
