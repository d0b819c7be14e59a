use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::aggregate::chronological;
use super::trade_metrics::calculate_pnl;
use crate::types::timestamp::wall_clock;
use crate::types::Trade;

/// Point on the cumulative P&L curve, one per closed trade.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquityPoint {
    pub trade_id: String,
    #[serde(with = "wall_clock")]
    pub time: NaiveDateTime,
    pub pnl: Decimal,
    pub cumulative_pnl: Decimal,
    /// Distance below the running peak, <= 0.
    pub drawdown: Decimal,
}

/// Net result of one calendar day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyPnl {
    pub date: NaiveDate,
    pub pnl: Decimal,
    pub trades: u64,
    pub wins: u64,
    pub losses: u64,
}

pub fn equity_curve<'a>(trades: impl IntoIterator<Item = &'a Trade>, commission_per_unit: Decimal) -> Vec<EquityPoint> {
    let mut cumulative = Decimal::ZERO;
    let mut peak = Decimal::ZERO;

    chronological(trades)
        .into_iter()
        .map(|trade| {
            let pnl = calculate_pnl(trade, commission_per_unit);
            cumulative += pnl;
            peak = peak.max(cumulative);
            EquityPoint {
                trade_id: trade.id.clone(),
                time: trade.closed_at(),
                pnl,
                cumulative_pnl: cumulative,
                drawdown: cumulative - peak,
            }
        })
        .collect()
}

/// Closed trades grouped by the calendar day they closed on, ascending.
pub fn daily_pnl<'a>(trades: impl IntoIterator<Item = &'a Trade>, commission_per_unit: Decimal) -> Vec<DailyPnl> {
    let mut days: BTreeMap<NaiveDate, DailyPnl> = BTreeMap::new();

    for trade in trades.into_iter().filter(|t| t.is_closed()) {
        let date = trade.closed_at().date();
        let pnl = calculate_pnl(trade, commission_per_unit);
        let day = days.entry(date).or_insert_with(|| DailyPnl {
            date,
            pnl: Decimal::ZERO,
            trades: 0,
            wins: 0,
            losses: 0,
        });

        day.pnl += pnl;
        day.trades += 1;
        if pnl > Decimal::ZERO {
            day.wins += 1;
        } else if pnl < Decimal::ZERO {
            day.losses += 1;
        }
    }

    days.into_values().collect()
}
