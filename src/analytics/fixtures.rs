use chrono::{Duration, NaiveDateTime};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::types::{parse_wall_clock, Direction, Trade, TradeStatus};

pub fn at(raw: &str) -> NaiveDateTime {
    parse_wall_clock(raw).unwrap()
}

/// Closed trade entered and exited five minutes apart on a Monday morning.
pub fn closed(symbol: &str, direction: Direction, quantity: Decimal, entry: Decimal, exit: Decimal) -> Trade {
    let entry_date = at("2024-03-04T09:30:00Z");
    let mut trade = Trade::new(symbol, direction, quantity, entry, entry_date);
    trade.exit_price = Some(exit);
    trade.exit_date = Some(entry_date + Duration::minutes(5));
    trade
}

/// Single-unit stock trade realizing exactly `pnl`, closed at `exit_date`.
pub fn with_pnl(pnl: Decimal, exit_date: &str) -> Trade {
    let exit_date = at(exit_date);
    let mut trade = Trade::new(
        "AAPL",
        Direction::Long,
        Decimal::ONE,
        dec!(1000),
        exit_date - Duration::minutes(5),
    );
    trade.exit_price = Some(dec!(1000) + pnl);
    trade.exit_date = Some(exit_date);
    trade.status = if pnl > Decimal::ZERO {
        TradeStatus::Win
    } else if pnl < Decimal::ZERO {
        TradeStatus::Loss
    } else {
        TradeStatus::BreakEven
    };
    trade
}

/// Trades realizing `pnls` in order, one per minute from 09:30 on 2024-03-04.
pub fn sequence(pnls: &[Decimal]) -> Vec<Trade> {
    let start = at("2024-03-04T09:30:00Z");
    pnls.iter()
        .enumerate()
        .map(|(i, pnl)| {
            let exit = start + Duration::minutes(i as i64);
            with_pnl(*pnl, &exit.format("%Y-%m-%dT%H:%M:%S").to_string())
        })
        .collect()
}
