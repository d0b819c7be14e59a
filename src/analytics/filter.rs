use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::types::{Direction, Trade, TradeStatus};

/// Selection criteria applied before aggregation. Every set criterion must hold.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TradeFilter {
    /// First entry day included.
    pub from: Option<NaiveDate>,
    /// Last entry day included.
    pub to: Option<NaiveDate>,
    pub symbols: Vec<String>,
    pub directions: Vec<Direction>,
    pub statuses: Vec<TradeStatus>,
    pub playbook_id: Option<String>,
    /// Matches trades carrying any of these tag ids.
    pub tags: Vec<String>,
}

impl TradeFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn matches(&self, trade: &Trade) -> bool {
        let day = trade.entry_date.date();

        if self.from.is_some_and(|from| day < from) {
            return false;
        }
        if self.to.is_some_and(|to| day > to) {
            return false;
        }
        if !self.symbols.is_empty() && !self.symbols.iter().any(|s| s.eq_ignore_ascii_case(&trade.symbol)) {
            return false;
        }
        if !self.directions.is_empty() && !self.directions.contains(&trade.direction) {
            return false;
        }
        if !self.statuses.is_empty() && !self.statuses.contains(&trade.status) {
            return false;
        }
        if let Some(playbook_id) = &self.playbook_id {
            if trade.playbook_id.as_ref() != Some(playbook_id) {
                return false;
            }
        }
        if !self.tags.is_empty() && !self.tags.iter().any(|tag| trade.has_tag(tag)) {
            return false;
        }
        true
    }

    /// Matching trades, in input order.
    pub fn apply(&self, trades: Vec<Trade>) -> Vec<Trade> {
        trades.into_iter().filter(|t| self.matches(t)).collect()
    }
}
