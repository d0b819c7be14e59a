pub mod aggregate;
pub mod buckets;
pub mod cross_tab;
pub mod equity;
pub mod filter;
pub mod multiplier;
pub mod summary;
pub mod trade_metrics;

#[cfg(test)]
mod fixtures;

pub use aggregate::*;
pub use buckets::{aggregate_by_bucket, duration_label, AggregateRow, BucketType};
pub use cross_tab::{cross_tabulate, CrossCell, CrossRow, CrossTab, Dimension, Lookups};
pub use equity::{daily_pnl, equity_curve, DailyPnl, EquityPoint};
pub use filter::TradeFilter;
pub use multiplier::resolve_multiplier;
pub use summary::PerformanceSummary;
pub use trade_metrics::*;
