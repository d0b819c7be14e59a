use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::equity::daily_pnl;
use super::trade_metrics::{calculate_pnl, calculate_r_multiple, get_trade_metrics, initial_risk_amount};
use crate::types::Trade;

/// Reported instead of an infinite profit factor when there are no losses.
pub const PROFIT_FACTOR_CAP: Decimal = dec!(100);

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct GrossStats {
    pub gross_profit: Decimal,
    /// Magnitude of the summed losses.
    pub gross_loss: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct AvgWinLoss {
    pub avg_win: Decimal,
    /// Mean of the losing P&Ls, negative.
    pub avg_loss: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Extremes {
    pub largest_win: Decimal,
    pub largest_loss: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Streaks {
    pub current_trade_streak: i32, // Positive for wins, negative for losses
    pub max_trade_win_streak: u32,
    pub max_trade_loss_streak: u32,
    pub current_day_streak: i32,
    pub max_day_win_streak: u32,
    pub max_day_loss_streak: u32,
}

/// Closed trades ordered by exit time, falling back to entry time.
pub fn chronological<'a>(trades: impl IntoIterator<Item = &'a Trade>) -> Vec<&'a Trade> {
    let mut closed: Vec<&Trade> = trades.into_iter().filter(|t| t.is_closed()).collect();
    closed.sort_by_key(|t| t.closed_at());
    closed
}

pub(crate) fn closed_pnls<'a>(
    trades: impl IntoIterator<Item = &'a Trade>,
    commission_per_unit: Decimal,
) -> Vec<Decimal> {
    trades
        .into_iter()
        .filter(|t| t.is_closed())
        .map(|t| calculate_pnl(t, commission_per_unit))
        .collect()
}

fn mean(values: &[Decimal]) -> Decimal {
    if values.is_empty() {
        Decimal::ZERO
    } else {
        values.iter().sum::<Decimal>() / Decimal::from(values.len())
    }
}

pub(crate) fn win_rate_of(pnls: &[Decimal]) -> Decimal {
    let decisive = pnls.iter().filter(|p| !p.is_zero()).count();
    if decisive == 0 {
        return Decimal::ZERO;
    }
    let wins = pnls.iter().filter(|p| **p > Decimal::ZERO).count();
    Decimal::from(wins) / Decimal::from(decisive) * dec!(100)
}

pub(crate) fn gross_of(pnls: &[Decimal]) -> GrossStats {
    GrossStats {
        gross_profit: pnls.iter().filter(|p| **p > Decimal::ZERO).sum(),
        gross_loss: pnls.iter().filter(|p| **p < Decimal::ZERO).sum::<Decimal>().abs(),
    }
}

pub(crate) fn profit_factor_of(pnls: &[Decimal]) -> Decimal {
    let GrossStats { gross_profit, gross_loss } = gross_of(pnls);
    if gross_loss > Decimal::ZERO {
        gross_profit / gross_loss
    } else if gross_profit > Decimal::ZERO {
        PROFIT_FACTOR_CAP
    } else {
        Decimal::ZERO
    }
}

pub(crate) fn avg_win_loss_of(pnls: &[Decimal]) -> AvgWinLoss {
    let wins: Vec<Decimal> = pnls.iter().copied().filter(|p| *p > Decimal::ZERO).collect();
    let losses: Vec<Decimal> = pnls.iter().copied().filter(|p| *p < Decimal::ZERO).collect();
    AvgWinLoss {
        avg_win: mean(&wins),
        avg_loss: mean(&losses),
    }
}

pub(crate) fn extremes_of(pnls: &[Decimal]) -> Extremes {
    Extremes {
        largest_win: pnls.iter().copied().filter(|p| *p > Decimal::ZERO).max().unwrap_or(Decimal::ZERO),
        largest_loss: pnls.iter().copied().filter(|p| *p < Decimal::ZERO).min().unwrap_or(Decimal::ZERO),
    }
}

/// Percentage of winners among trades that did not break even.
pub fn win_rate<'a>(trades: impl IntoIterator<Item = &'a Trade>, commission_per_unit: Decimal) -> Decimal {
    win_rate_of(&closed_pnls(trades, commission_per_unit))
}

pub fn profit_factor<'a>(trades: impl IntoIterator<Item = &'a Trade>, commission_per_unit: Decimal) -> Decimal {
    profit_factor_of(&closed_pnls(trades, commission_per_unit))
}

pub fn avg_win_loss<'a>(trades: impl IntoIterator<Item = &'a Trade>, commission_per_unit: Decimal) -> AvgWinLoss {
    avg_win_loss_of(&closed_pnls(trades, commission_per_unit))
}

pub fn gross_stats<'a>(trades: impl IntoIterator<Item = &'a Trade>, commission_per_unit: Decimal) -> GrossStats {
    gross_of(&closed_pnls(trades, commission_per_unit))
}

pub fn extremes<'a>(trades: impl IntoIterator<Item = &'a Trade>, commission_per_unit: Decimal) -> Extremes {
    extremes_of(&closed_pnls(trades, commission_per_unit))
}

/// Deepest peak-to-trough decline of cumulative P&L, as a value <= 0.
pub fn max_drawdown<'a>(trades: impl IntoIterator<Item = &'a Trade>, commission_per_unit: Decimal) -> Decimal {
    let mut equity = Decimal::ZERO;
    let mut peak = Decimal::ZERO;
    let mut max_dd = Decimal::ZERO;

    for trade in chronological(trades) {
        equity += calculate_pnl(trade, commission_per_unit);
        peak = peak.max(equity);
        max_dd = max_dd.min(equity - peak);
    }

    max_dd
}

/// Mean magnitude of the summed loss of each run of consecutive losing trades.
pub fn avg_losing_run<'a>(trades: impl IntoIterator<Item = &'a Trade>, commission_per_unit: Decimal) -> Decimal {
    let mut runs = Vec::new();
    let mut run = Decimal::ZERO;

    for trade in chronological(trades) {
        let pnl = calculate_pnl(trade, commission_per_unit);
        if pnl < Decimal::ZERO {
            run += pnl;
        } else if run < Decimal::ZERO {
            runs.push(run.abs());
            run = Decimal::ZERO;
        }
    }
    if run < Decimal::ZERO {
        runs.push(run.abs());
    }

    mean(&runs)
}

#[derive(Debug, Default)]
struct StreakTracker {
    current: i32,
    max_win: u32,
    max_loss: u32,
}

impl StreakTracker {
    fn push(&mut self, pnl: Decimal) {
        if pnl > Decimal::ZERO {
            self.current = if self.current > 0 { self.current + 1 } else { 1 };
            self.max_win = self.max_win.max(self.current.unsigned_abs());
        } else if pnl < Decimal::ZERO {
            self.current = if self.current < 0 { self.current - 1 } else { -1 };
            self.max_loss = self.max_loss.max(self.current.unsigned_abs());
        } else {
            // Breakeven ends the run without starting a new one
            self.current = 0;
        }
    }
}

pub fn streaks<'a>(trades: impl IntoIterator<Item = &'a Trade>, commission_per_unit: Decimal) -> Streaks {
    let ordered = chronological(trades);

    let mut by_trade = StreakTracker::default();
    for trade in &ordered {
        by_trade.push(calculate_pnl(trade, commission_per_unit));
    }

    let mut by_day = StreakTracker::default();
    for day in daily_pnl(ordered.iter().copied(), commission_per_unit) {
        by_day.push(day.pnl);
    }

    Streaks {
        current_trade_streak: by_trade.current,
        max_trade_win_streak: by_trade.max_win,
        max_trade_loss_streak: by_trade.max_loss,
        current_day_streak: by_day.current,
        max_day_win_streak: by_day.max_win,
        max_day_loss_streak: by_day.max_loss,
    }
}

/// Mean actual-risk percentage over trades that had a stop loss.
pub fn avg_actual_risk_pct<'a>(trades: impl IntoIterator<Item = &'a Trade>, commission_per_unit: Decimal) -> Decimal {
    let samples: Vec<Decimal> = trades
        .into_iter()
        .filter(|t| t.is_closed())
        .filter(|t| initial_risk_amount(t, commission_per_unit).is_some_and(|r| r > Decimal::ZERO))
        .map(|t| get_trade_metrics(t, commission_per_unit).actual_risk_percent)
        .collect();

    mean(&samples)
}

/// Sum of defined R-multiples and their mean.
pub fn r_totals<'a>(trades: impl IntoIterator<Item = &'a Trade>, commission_per_unit: Decimal) -> (Decimal, Decimal) {
    let rs: Vec<Decimal> = trades
        .into_iter()
        .filter(|t| t.is_closed())
        .filter_map(|t| calculate_r_multiple(t, commission_per_unit))
        .collect();

    (rs.iter().sum(), mean(&rs))
}
