use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::JournalError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    #[serde(alias = "LONG", alias = "long", alias = "Buy")]
    Long,
    #[serde(alias = "SHORT", alias = "short", alias = "Sell")]
    Short,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Long => "Long",
            Direction::Short => "Short",
        }
    }

    pub fn all() -> [Direction; 2] {
        [Direction::Long, Direction::Short]
    }

    /// Price move in the trade's favour, per unit.
    pub fn favorable_move(&self, entry: Decimal, exit: Decimal) -> Decimal {
        match self {
            Direction::Long => exit - entry,
            Direction::Short => entry - exit,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Direction {
    type Err = JournalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "long" | "buy" => Ok(Direction::Long),
            "short" | "sell" => Ok(Direction::Short),
            _ => Err(JournalError::UnknownVariant {
                kind: "direction",
                value: s.to_string(),
            }),
        }
    }
}

/// User-assigned classification of a trade. Independent of the computed P&L sign.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TradeStatus {
    #[serde(alias = "WIN", alias = "win")]
    Win,
    #[serde(alias = "SMALL_WIN", alias = "small_win")]
    SmallWin,
    #[default]
    #[serde(alias = "BREAK_EVEN", alias = "break_even", alias = "Breakeven")]
    BreakEven,
    #[serde(alias = "SMALL_LOSS", alias = "small_loss")]
    SmallLoss,
    #[serde(alias = "LOSS", alias = "loss")]
    Loss,
}

impl TradeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TradeStatus::Win => "Win",
            TradeStatus::SmallWin => "SmallWin",
            TradeStatus::BreakEven => "BreakEven",
            TradeStatus::SmallLoss => "SmallLoss",
            TradeStatus::Loss => "Loss",
        }
    }

    pub fn outcome(&self) -> Outcome {
        match self {
            TradeStatus::Win | TradeStatus::SmallWin => Outcome::Win,
            TradeStatus::BreakEven => Outcome::BreakEven,
            TradeStatus::SmallLoss | TradeStatus::Loss => Outcome::Loss,
        }
    }
}

impl fmt::Display for TradeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for TradeStatus {
    type Err = JournalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| !matches!(c, '_' | '-' | ' '))
            .collect::<String>()
            .to_lowercase();
        match normalized.as_str() {
            "win" => Ok(TradeStatus::Win),
            "smallwin" => Ok(TradeStatus::SmallWin),
            "breakeven" => Ok(TradeStatus::BreakEven),
            "smallloss" => Ok(TradeStatus::SmallLoss),
            "loss" => Ok(TradeStatus::Loss),
            _ => Err(JournalError::UnknownVariant {
                kind: "status",
                value: s.to_string(),
            }),
        }
    }
}

/// Coarse status class used as a cross-tabulation column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Outcome {
    Win,
    Loss,
    BreakEven,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Win => "Win",
            Outcome::Loss => "Loss",
            Outcome::BreakEven => "BreakEven",
        }
    }

    pub fn all() -> [Outcome; 3] {
        [Outcome::Win, Outcome::Loss, Outcome::BreakEven]
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
