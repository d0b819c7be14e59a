use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::multiplier::resolve_multiplier;
use crate::types::{Direction, Trade};

/// Risk and excursion figures for a single trade.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TradeMetrics {
    pub initial_risk_amount: Decimal,
    pub actual_risk_amount: Decimal,
    pub actual_risk_percent: Decimal,
    pub best_pnl: Decimal,
    pub best_rr: Decimal,
}

/// Commission charged against a trade. A positive per-unit rate replaces the
/// recorded commission entirely.
pub fn commission_for(trade: &Trade, commission_per_unit: Decimal) -> Decimal {
    if commission_per_unit > Decimal::ZERO {
        trade.quantity * commission_per_unit
    } else {
        trade.commission
    }
}

/// Realized net P&L. Open trades and non-positive quantities contribute nothing.
pub fn calculate_pnl(trade: &Trade, commission_per_unit: Decimal) -> Decimal {
    let Some(exit_price) = trade.exit_price else {
        return Decimal::ZERO;
    };
    if trade.quantity <= Decimal::ZERO {
        return Decimal::ZERO;
    }

    let multiplier = resolve_multiplier(&trade.symbol);
    let gross = trade.direction.favorable_move(trade.entry_price, exit_price) * trade.quantity * multiplier;

    gross - commission_for(trade, commission_per_unit)
}

/// Dollar risk between entry and the initial stop, commission included.
///
/// `None` without a stop loss or when the stop sits on the entry price.
pub fn initial_risk_amount(trade: &Trade, commission_per_unit: Decimal) -> Option<Decimal> {
    let stop = trade.initial_stop_loss?;
    let distance = (trade.entry_price - stop).abs();
    if distance.is_zero() || trade.quantity <= Decimal::ZERO {
        return None;
    }

    let multiplier = resolve_multiplier(&trade.symbol);
    Some(distance * trade.quantity * multiplier + commission_for(trade, commission_per_unit))
}

/// P&L as a multiple of initial risk, rounded to 2 decimals.
pub fn calculate_r_multiple(trade: &Trade, commission_per_unit: Decimal) -> Option<Decimal> {
    let risk = initial_risk_amount(trade, commission_per_unit)?;
    if risk <= Decimal::ZERO {
        return None;
    }

    Some((calculate_pnl(trade, commission_per_unit) / risk).round_dp(2))
}

pub fn get_trade_metrics(trade: &Trade, commission_per_unit: Decimal) -> TradeMetrics {
    let initial_risk_amount = initial_risk_amount(trade, commission_per_unit).unwrap_or(Decimal::ZERO);

    if trade.quantity <= Decimal::ZERO {
        return TradeMetrics {
            initial_risk_amount,
            actual_risk_amount: Decimal::ZERO,
            actual_risk_percent: Decimal::ZERO,
            best_pnl: Decimal::ZERO,
            best_rr: Decimal::ZERO,
        };
    }

    let size = trade.quantity * resolve_multiplier(&trade.symbol);
    let entry = trade.entry_price;

    // Adverse excursion: the extreme against the position, clamped at entry
    let adverse_move = match trade.direction {
        Direction::Long => entry - trade.lowest_price_reached.unwrap_or(entry),
        Direction::Short => trade.highest_price_reached.unwrap_or(entry) - entry,
    };
    let actual_risk_amount = (adverse_move * size).max(Decimal::ZERO);

    let favorable_extreme = match trade.direction {
        Direction::Long => trade.highest_price_reached,
        Direction::Short => trade.lowest_price_reached,
    };
    let best_exit = trade.best_exit_price.or(favorable_extreme).unwrap_or(entry);
    let best_pnl = trade.direction.favorable_move(entry, best_exit) * size;

    let (actual_risk_percent, best_rr) = if initial_risk_amount > Decimal::ZERO {
        (
            actual_risk_amount / initial_risk_amount * dec!(100),
            best_pnl / initial_risk_amount,
        )
    } else {
        (Decimal::ZERO, Decimal::ZERO)
    };

    TradeMetrics {
        initial_risk_amount,
        actual_risk_amount,
        actual_risk_percent,
        best_pnl,
        best_rr,
    }
}
