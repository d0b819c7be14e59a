use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::aggregate::{
    avg_actual_risk_pct, avg_win_loss_of, closed_pnls, extremes_of, gross_of, max_drawdown, profit_factor_of,
    r_totals, streaks, win_rate_of, Streaks,
};
use crate::types::Trade;

/// Headline statistics of a whole journal or a filtered slice of it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceSummary {
    // Counts
    pub total_trades: u64,
    pub closed_trades: u64,
    pub open_trades: u64,

    // Profit/Loss
    pub net_pnl: Decimal,
    pub win_rate: Decimal,
    pub profit_factor: Decimal,
    pub avg_win: Decimal,
    pub avg_loss: Decimal,
    pub gross_profit: Decimal,
    pub gross_loss: Decimal,
    pub largest_win: Decimal,
    pub largest_loss: Decimal,

    // Risk
    pub max_drawdown: Decimal,
    pub total_r: Decimal,
    pub avg_r: Decimal,
    pub avg_actual_risk_pct: Decimal,

    pub streaks: Streaks,
    /// Set when a drawdown goal is configured and the max drawdown exceeds it.
    pub drawdown_goal_breached: bool,
}

impl PerformanceSummary {
    pub fn from_trades(trades: &[Trade], commission_per_unit: Decimal, max_drawdown_goal: Decimal) -> Self {
        let pnls = closed_pnls(trades, commission_per_unit);
        let gross = gross_of(&pnls);
        let averages = avg_win_loss_of(&pnls);
        let ext = extremes_of(&pnls);
        let (total_r, avg_r) = r_totals(trades, commission_per_unit);
        let max_dd = max_drawdown(trades, commission_per_unit);

        let closed_trades = pnls.len() as u64;

        Self {
            total_trades: trades.len() as u64,
            closed_trades,
            open_trades: trades.len() as u64 - closed_trades,
            net_pnl: pnls.iter().sum(),
            win_rate: win_rate_of(&pnls),
            profit_factor: profit_factor_of(&pnls),
            avg_win: averages.avg_win,
            avg_loss: averages.avg_loss,
            gross_profit: gross.gross_profit,
            gross_loss: gross.gross_loss,
            largest_win: ext.largest_win,
            largest_loss: ext.largest_loss,
            max_drawdown: max_dd,
            total_r,
            avg_r,
            avg_actual_risk_pct: avg_actual_risk_pct(trades, commission_per_unit),
            streaks: streaks(trades, commission_per_unit),
            drawdown_goal_breached: max_drawdown_goal > Decimal::ZERO && max_dd.abs() > max_drawdown_goal,
        }
    }

    /// Pretty print the summary to console
    pub fn print_summary(&self) {
        println!("\n{}", "=".repeat(60));
        println!("                  PERFORMANCE SUMMARY");
        println!("{}", "=".repeat(60));
        println!("TRADES");
        println!("  Total Trades:       {}", self.total_trades);
        println!("  Closed / Open:      {} / {}", self.closed_trades, self.open_trades);
        println!("  Win Rate:           {:.1}%", self.win_rate);
        println!("{}", "-".repeat(60));
        println!("PROFIT/LOSS");
        println!("  Net P&L:            ${:.2}", self.net_pnl);
        println!("  Gross Profit:       ${:.2}", self.gross_profit);
        println!("  Gross Loss:         ${:.2}", self.gross_loss);
        println!("  Profit Factor:      {:.2}", self.profit_factor);
        println!("  Average Win:        ${:.2}", self.avg_win);
        println!("  Average Loss:       ${:.2}", self.avg_loss);
        println!("  Largest Win:        ${:.2}", self.largest_win);
        println!("  Largest Loss:       ${:.2}", self.largest_loss);
        println!("{}", "-".repeat(60));
        println!("RISK");
        println!("  Max Drawdown:       ${:.2}", self.max_drawdown);
        if self.drawdown_goal_breached {
            println!("  !! Max drawdown goal exceeded");
        }
        println!("  Total R:            {:.2}R", self.total_r);
        println!("  Average R:          {:.2}R", self.avg_r);
        println!("  Avg Actual Risk:    {:.1}%", self.avg_actual_risk_pct);
        println!("{}", "-".repeat(60));
        println!("STREAKS");
        println!("  Current (trades):   {}", self.streaks.current_trade_streak);
        println!(
            "  Max Win / Loss:     {} / {}",
            self.streaks.max_trade_win_streak, self.streaks.max_trade_loss_streak
        );
        println!("  Current (days):     {}", self.streaks.current_day_streak);
        println!(
            "  Max Win / Loss Day: {} / {}",
            self.streaks.max_day_win_streak, self.streaks.max_day_loss_streak
        );
        println!("{}", "=".repeat(60));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::fixtures::{sequence, with_pnl};
    use rust_decimal_macros::dec;

    #[test]
    fn test_summary_of_mixed_journal() {
        let mut trades = sequence(&[dec!(100), dec!(-40), dec!(0), dec!(60), dec!(-20)]);
        let mut open = with_pnl(dec!(0), "2024-03-04T12:00:00Z");
        open.exit_price = None;
        open.exit_date = None;
        trades.push(open);

        let summary = PerformanceSummary::from_trades(&trades, Decimal::ZERO, Decimal::ZERO);

        assert_eq!(summary.total_trades, 6);
        assert_eq!(summary.closed_trades, 5);
        assert_eq!(summary.open_trades, 1);
        assert_eq!(summary.net_pnl, dec!(100));
        assert_eq!(summary.win_rate, dec!(50));
        assert_eq!(summary.profit_factor, dec!(160) / dec!(60));
        assert_eq!(summary.avg_win, dec!(80));
        assert_eq!(summary.avg_loss, dec!(-30));
        assert_eq!(summary.largest_loss, dec!(-40));
        assert_eq!(summary.max_drawdown, dec!(-40));
        assert_eq!(summary.streaks.current_trade_streak, -1);
        assert!(!summary.drawdown_goal_breached);
    }

    #[test]
    fn test_drawdown_goal() {
        let trades = sequence(&[dec!(100), dec!(-150)]);

        let breached = PerformanceSummary::from_trades(&trades, Decimal::ZERO, dec!(120));
        assert!(breached.drawdown_goal_breached);

        let within = PerformanceSummary::from_trades(&trades, Decimal::ZERO, dec!(150));
        assert!(!within.drawdown_goal_breached);
    }

    #[test]
    fn test_empty_journal() {
        let summary = PerformanceSummary::from_trades(&[], Decimal::ZERO, dec!(500));
        assert_eq!(summary.total_trades, 0);
        assert_eq!(summary.net_pnl, Decimal::ZERO);
        assert_eq!(summary.profit_factor, Decimal::ZERO);
        assert_eq!(summary.streaks, Streaks::default());
        assert!(!summary.drawdown_goal_breached);
    }

    #[test]
    fn test_commission_flows_into_summary() {
        let trades = sequence(&[dec!(10), dec!(10)]);
        // Per-unit rate replaces the recorded commission
        let summary = PerformanceSummary::from_trades(&trades, dec!(0.5), Decimal::ZERO);
        assert_eq!(summary.net_pnl, dec!(19));
    }
}
