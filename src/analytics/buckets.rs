use chrono::{Datelike, Timelike, Weekday};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use tracing::debug;

use super::aggregate::{
    avg_actual_risk_pct, avg_losing_run, avg_win_loss_of, closed_pnls, max_drawdown, profit_factor_of, r_totals,
    win_rate_of,
};
use crate::error::JournalError;
use crate::types::Trade;

pub const DAY_LABELS: [&str; 5] = ["Monday", "Tuesday", "Wednesday", "Thursday", "Friday"];

pub const MONTH_LABELS: [&str; 12] = [
    "January", "February", "March", "April", "May", "June",
    "July", "August", "September", "October", "November", "December",
];

/// Hours 04:00 through 07:59 share one pre-market bucket.
pub const TIME_LABELS: [&str; 21] = [
    "00:00", "01:00", "02:00", "03:00", "04:00 - 08:00", "08:00", "09:00", "10:00", "11:00",
    "12:00", "13:00", "14:00", "15:00", "16:00", "17:00", "18:00", "19:00", "20:00", "21:00",
    "22:00", "23:00",
];

pub const DURATION_LABELS: [&str; 9] = [
    "< 1m", "1-2m", "2-5m", "5-10m", "10-30m", "30m-1h", "1-2h", "2-4h", "> 4h",
];

/// Upper bounds in seconds for every duration bucket but the last.
const DURATION_BOUNDS: [i64; 8] = [60, 120, 300, 600, 1_800, 3_600, 7_200, 14_400];

/// Trades whose duration cannot be determined. Never part of padded output.
pub const UNKNOWN_BUCKET: &str = "Unknown";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BucketType {
    Day,
    Month,
    Time,
    Duration,
}

impl BucketType {
    pub fn as_str(&self) -> &'static str {
        match self {
            BucketType::Day => "day",
            BucketType::Month => "month",
            BucketType::Time => "time",
            BucketType::Duration => "duration",
        }
    }

    /// Every label of this bucket type, in display order.
    pub fn labels(&self) -> &'static [&'static str] {
        match self {
            BucketType::Day => &DAY_LABELS,
            BucketType::Month => &MONTH_LABELS,
            BucketType::Time => &TIME_LABELS,
            BucketType::Duration => &DURATION_LABELS,
        }
    }

    /// Bucket label for `trade`, read from its wall-clock entry time.
    ///
    /// `None` when the trade has no place in this grouping: weekend entries for
    /// `Day`, and trades of unknown duration for `Duration`.
    pub fn bucket_key(&self, trade: &Trade) -> Option<&'static str> {
        let entry = trade.entry_date;
        match self {
            BucketType::Day => match entry.weekday() {
                Weekday::Sat | Weekday::Sun => None,
                weekday => Some(DAY_LABELS[weekday.num_days_from_monday() as usize]),
            },
            BucketType::Month => Some(MONTH_LABELS[entry.month0() as usize]),
            BucketType::Time => {
                let hour = entry.hour() as usize;
                let idx = match hour {
                    0..=3 => hour,
                    4..=7 => 4,
                    _ => hour - 3,
                };
                Some(TIME_LABELS[idx])
            }
            BucketType::Duration => match duration_label(trade) {
                UNKNOWN_BUCKET => None,
                label => Some(label),
            },
        }
    }
}

impl fmt::Display for BucketType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for BucketType {
    type Err = JournalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "day" | "weekday" => Ok(BucketType::Day),
            "month" => Ok(BucketType::Month),
            "time" | "hour" => Ok(BucketType::Time),
            "duration" => Ok(BucketType::Duration),
            _ => Err(JournalError::UnknownVariant {
                kind: "bucket type",
                value: s.to_string(),
            }),
        }
    }
}

/// Holding-time bucket of a trade; `Unknown` without an exit timestamp.
pub fn duration_label(trade: &Trade) -> &'static str {
    let Some(seconds) = trade.holding_seconds() else {
        return UNKNOWN_BUCKET;
    };
    if seconds < 0 {
        return UNKNOWN_BUCKET;
    }

    DURATION_BOUNDS
        .iter()
        .position(|bound| seconds < *bound)
        .map(|idx| DURATION_LABELS[idx])
        .unwrap_or(DURATION_LABELS[DURATION_LABELS.len() - 1])
}

/// Aggregate statistics of the trades in one bucket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateRow {
    pub label: String,
    pub count: u64,
    pub net_pnl: Decimal,
    pub win_rate: Decimal,
    pub profit_factor: Decimal,
    pub avg_win: Decimal,
    pub avg_loss: Decimal,
    pub total_r: Decimal,
    pub avg_r: Decimal,
    pub max_drawdown: Decimal,
    pub avg_drawdown: Decimal,
    pub avg_win_loss_rr: Decimal,
    pub avg_actual_risk_pct: Decimal,
}

impl AggregateRow {
    pub fn empty(label: &str) -> Self {
        Self {
            label: label.to_string(),
            count: 0,
            net_pnl: Decimal::ZERO,
            win_rate: Decimal::ZERO,
            profit_factor: Decimal::ZERO,
            avg_win: Decimal::ZERO,
            avg_loss: Decimal::ZERO,
            total_r: Decimal::ZERO,
            avg_r: Decimal::ZERO,
            max_drawdown: Decimal::ZERO,
            avg_drawdown: Decimal::ZERO,
            avg_win_loss_rr: Decimal::ZERO,
            avg_actual_risk_pct: Decimal::ZERO,
        }
    }

    /// Statistics over the closed trades among `trades`.
    pub fn from_trades(label: &str, trades: &[&Trade], commission_per_unit: Decimal) -> Self {
        let closed: Vec<&Trade> = trades.iter().copied().filter(|t| t.is_closed()).collect();
        if closed.is_empty() {
            return Self::empty(label);
        }

        let pnls = closed_pnls(closed.iter().copied(), commission_per_unit);
        let averages = avg_win_loss_of(&pnls);
        let (total_r, avg_r) = r_totals(closed.iter().copied(), commission_per_unit);

        let avg_win_loss_rr = if averages.avg_loss.is_zero() {
            Decimal::ZERO
        } else {
            (averages.avg_win / averages.avg_loss).abs()
        };

        Self {
            label: label.to_string(),
            count: closed.len() as u64,
            net_pnl: pnls.iter().sum(),
            win_rate: win_rate_of(&pnls),
            profit_factor: profit_factor_of(&pnls),
            avg_win: averages.avg_win,
            avg_loss: averages.avg_loss,
            total_r,
            avg_r,
            max_drawdown: max_drawdown(closed.iter().copied(), commission_per_unit),
            avg_drawdown: avg_losing_run(closed.iter().copied(), commission_per_unit),
            avg_win_loss_rr,
            avg_actual_risk_pct: avg_actual_risk_pct(closed.iter().copied(), commission_per_unit),
        }
    }
}

/// One row per label of `bucket_type`, in canonical order, zero-padded.
pub fn aggregate_by_bucket(trades: &[Trade], bucket_type: BucketType, commission_per_unit: Decimal) -> Vec<AggregateRow> {
    let mut groups: HashMap<&'static str, Vec<&Trade>> = HashMap::new();
    let mut dropped = 0usize;

    for trade in trades.iter().filter(|t| t.is_closed()) {
        match bucket_type.bucket_key(trade) {
            Some(key) => groups.entry(key).or_default().push(trade),
            None => dropped += 1,
        }
    }

    debug!(
        "Aggregating {} closed trades by {} ({} outside the grouping)",
        groups.values().map(Vec::len).sum::<usize>(),
        bucket_type,
        dropped
    );

    bucket_type
        .labels()
        .iter()
        .map(|label| match groups.get(label) {
            Some(members) => AggregateRow::from_trades(label, members, commission_per_unit),
            None => AggregateRow::empty(label),
        })
        .collect()
}
