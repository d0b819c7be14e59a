use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::timestamp::wall_clock;
use super::trading::{Direction, TradeStatus};
use crate::error::JournalError;

/// A journaled trade as held by the trade store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trade {
    #[serde(default = "new_trade_id")]
    pub id: String,
    pub symbol: String,
    pub direction: Direction,
    pub quantity: Decimal,
    pub entry_price: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exit_price: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial_stop_loss: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub highest_price_reached: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lowest_price_reached: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub best_exit_price: Option<Decimal>,
    #[serde(with = "wall_clock")]
    pub entry_date: NaiveDateTime,
    #[serde(default, with = "wall_clock::option", skip_serializing_if = "Option::is_none")]
    pub exit_date: Option<NaiveDateTime>,
    #[serde(default)]
    pub commission: Decimal,
    #[serde(default)]
    pub status: TradeStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub playbook_id: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

pub fn new_trade_id() -> String {
    Uuid::new_v4().to_string()
}

impl Trade {
    /// Minimal open trade; the remaining fields are set directly.
    pub fn new(
        symbol: impl Into<String>,
        direction: Direction,
        quantity: Decimal,
        entry_price: Decimal,
        entry_date: NaiveDateTime,
    ) -> Self {
        Self {
            id: new_trade_id(),
            symbol: symbol.into(),
            direction,
            quantity,
            entry_price,
            exit_price: None,
            initial_stop_loss: None,
            highest_price_reached: None,
            lowest_price_reached: None,
            best_exit_price: None,
            entry_date,
            exit_date: None,
            commission: Decimal::ZERO,
            status: TradeStatus::default(),
            playbook_id: None,
            tags: Vec::new(),
            notes: None,
        }
    }

    pub fn is_closed(&self) -> bool {
        self.exit_price.is_some()
    }

    /// Ordering key for equity walks: exit time, falling back to entry time.
    pub fn closed_at(&self) -> NaiveDateTime {
        self.exit_date.unwrap_or(self.entry_date)
    }

    pub fn holding_seconds(&self) -> Option<i64> {
        self.exit_date
            .map(|exit| exit.signed_duration_since(self.entry_date).num_seconds())
    }

    pub fn has_tag(&self, tag_id: &str) -> bool {
        self.tags.iter().any(|t| t == tag_id)
    }

    /// Checks the record before it is written to a store.
    pub fn validate(&self) -> Result<(), JournalError> {
        let invalid = |reason: &str| JournalError::InvalidTrade {
            id: self.id.clone(),
            reason: reason.to_string(),
        };

        if self.id.trim().is_empty() {
            return Err(invalid("id must not be empty"));
        }
        if self.symbol.trim().is_empty() {
            return Err(invalid("symbol must not be empty"));
        }
        if self.quantity <= Decimal::ZERO {
            return Err(invalid("quantity must be > 0"));
        }
        if let Some(exit_date) = self.exit_date {
            if exit_date < self.entry_date {
                return Err(invalid("exit date is before entry date"));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Strategy {
    pub id: String,
    pub name: String,
}

impl Strategy {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: String,
    pub name: String,
}

impl Tag {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}
