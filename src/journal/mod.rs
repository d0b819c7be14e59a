use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::analytics::{
    aggregate_by_bucket, calculate_pnl, calculate_r_multiple, cross_tabulate, daily_pnl, equity_curve,
    get_trade_metrics, AggregateRow, BucketType, CrossTab, DailyPnl, Dimension, EquityPoint, Lookups,
    PerformanceSummary, TradeFilter, TradeMetrics,
};
use crate::config::Settings;
use crate::error::{JournalError, Result};
use crate::store::TradeStore;
use crate::types::{Strategy, Tag, Trade};

/// Contents of an import file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImportBatch {
    pub trades: Vec<Trade>,
    #[serde(default)]
    pub strategies: Vec<Strategy>,
    #[serde(default)]
    pub tags: Vec<Tag>,
}

impl ImportBatch {
    /// Parses either a bare trade array or a full batch object.
    pub fn from_json(json: &str) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        if value.is_array() {
            let trades: Vec<Trade> = serde_json::from_value(value)?;
            return Ok(ImportBatch {
                trades,
                ..Default::default()
            });
        }
        Ok(serde_json::from_value(value)?)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportReport {
    pub imported: usize,
    pub skipped: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BucketReport {
    pub bucket_type: BucketType,
    pub rows: Vec<AggregateRow>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cross: Option<CrossTab>,
}

/// One line of the trade log: the trade and its computed figures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeLogEntry {
    pub trade: Trade,
    pub pnl: Decimal,
    pub r_multiple: Option<Decimal>,
    pub metrics: TradeMetrics,
}

/// Read side of the journal: every call takes a fresh snapshot from the
/// store and recomputes from scratch.
pub struct Journal<S: TradeStore> {
    store: S,
    settings: Settings,
}

impl<S: TradeStore> Journal<S> {
    pub fn new(store: S, settings: Settings) -> Self {
        Self { store, settings }
    }

    fn commission(&self) -> Decimal {
        self.settings.commission_per_unit
    }

    pub async fn trades(&self, filter: &TradeFilter) -> Result<Vec<Trade>> {
        let trades = self.store.list_trades().await?;
        let total = trades.len();
        let selected = filter.apply(trades);
        debug!("Selected {} of {} trades", selected.len(), total);
        Ok(selected)
    }

    pub async fn summary(&self, filter: &TradeFilter) -> Result<PerformanceSummary> {
        let trades = self.trades(filter).await?;
        Ok(PerformanceSummary::from_trades(
            &trades,
            self.commission(),
            self.settings.max_drawdown_goal,
        ))
    }

    pub async fn report(
        &self,
        filter: &TradeFilter,
        bucket_type: BucketType,
        cross: Option<Dimension>,
    ) -> Result<BucketReport> {
        let trades = self.trades(filter).await?;
        let rows = aggregate_by_bucket(&trades, bucket_type, self.commission());

        let cross = match cross {
            Some(dimension) => {
                let lookups = Lookups {
                    strategies: self.store.list_strategies().await?,
                    tags: self.store.list_tags().await?,
                };
                Some(cross_tabulate(&rows, &trades, bucket_type, dimension, &lookups, self.commission()))
            }
            None => None,
        };

        Ok(BucketReport { bucket_type, rows, cross })
    }

    pub async fn equity(&self, filter: &TradeFilter) -> Result<Vec<EquityPoint>> {
        let trades = self.trades(filter).await?;
        Ok(equity_curve(&trades, self.commission()))
    }

    pub async fn daily(&self, filter: &TradeFilter) -> Result<Vec<DailyPnl>> {
        let trades = self.trades(filter).await?;
        Ok(daily_pnl(&trades, self.commission()))
    }

    pub async fn trade_log(&self, filter: &TradeFilter) -> Result<Vec<TradeLogEntry>> {
        let commission = self.commission();
        Ok(self
            .trades(filter)
            .await?
            .into_iter()
            .map(|trade| TradeLogEntry {
                pnl: calculate_pnl(&trade, commission),
                r_multiple: calculate_r_multiple(&trade, commission),
                metrics: get_trade_metrics(&trade, commission),
                trade,
            })
            .collect())
    }

    /// Writes lookups first, then trades. Invalid and duplicate trades are
    /// skipped; storage failures abort the import.
    pub async fn import(&self, batch: ImportBatch) -> Result<ImportReport> {
        for strategy in batch.strategies {
            self.store.add_strategy(strategy).await?;
        }
        for tag in batch.tags {
            self.store.add_tag(tag).await?;
        }

        let mut report = ImportReport::default();
        for trade in batch.trades {
            let id = trade.id.clone();
            match self.store.add_trade(trade).await {
                Ok(()) => report.imported += 1,
                Err(e @ (JournalError::InvalidTrade { .. } | JournalError::DuplicateTrade(_))) => {
                    warn!("Skipping trade {}: {}", id, e);
                    report.skipped += 1;
                }
                Err(e) => return Err(e),
            }
        }

        info!("Imported {} trades ({} skipped)", report.imported, report.skipped);
        Ok(report)
    }

    pub async fn delete(&self, id: &str) -> Result<()> {
        self.store.delete_trade(id).await?;
        info!("Deleted trade {}", id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{InMemoryTradeStore, MockTradeStore};
    use crate::types::{parse_wall_clock, Direction};
    use rust_decimal_macros::dec;

    fn closed(id: &str, symbol: &str, entry: Decimal, exit: Decimal, day: &str) -> Trade {
        let mut trade = Trade::new(
            symbol,
            Direction::Long,
            dec!(1),
            entry,
            parse_wall_clock(&format!("{}T10:00:00", day)).unwrap(),
        );
        trade.id = id.to_string();
        trade.exit_price = Some(exit);
        trade.exit_date = Some(parse_wall_clock(&format!("{}T10:15:00", day)).unwrap());
        trade
    }

    fn mock_with(trades: Vec<Trade>) -> MockTradeStore {
        let mut store = MockTradeStore::new();
        store.expect_list_trades().returning(move || Ok(trades.clone()));
        store
    }

    #[tokio::test]
    async fn test_summary_applies_settings_and_filter() {
        let store = mock_with(vec![
            closed("a", "ES", dec!(100), dec!(110), "2024-03-04"),
            closed("b", "AAPL", dec!(50), dec!(40), "2024-03-05"),
        ]);
        let settings = Settings {
            commission_per_unit: dec!(2),
            ..Default::default()
        };
        let journal = Journal::new(store, settings);

        let filter = TradeFilter {
            symbols: vec!["es".to_string()],
            ..Default::default()
        };
        let summary = journal.summary(&filter).await.unwrap();

        assert_eq!(summary.total_trades, 1);
        assert_eq!(summary.net_pnl, dec!(498));
    }

    #[tokio::test]
    async fn test_report_loads_lookups_only_for_cross_tab() {
        let mut store = mock_with(vec![closed("a", "ES", dec!(100), dec!(101), "2024-03-04")]);
        store.expect_list_strategies().times(1).returning(|| Ok(vec![Strategy::new("s1", "ORB")]));
        store.expect_list_tags().times(1).returning(|| Ok(Vec::new()));
        let journal = Journal::new(store, Settings::default());

        let plain = journal.report(&TradeFilter::new(), BucketType::Day, None).await.unwrap();
        assert_eq!(plain.rows.len(), 5);
        assert!(plain.cross.is_none());

        let crossed = journal
            .report(&TradeFilter::new(), BucketType::Day, Some(Dimension::Strategy))
            .await
            .unwrap();
        let cross = crossed.cross.unwrap();
        assert_eq!(cross.cols, vec!["ORB"]);
        assert_eq!(cross.matrix[0].cells, vec![None]);
    }

    #[tokio::test]
    async fn test_import_skips_rejected_trades() {
        let mut store = MockTradeStore::new();
        store.expect_add_tag().times(1).returning(|_| Ok(()));
        store.expect_add_trade().times(3).returning(|trade: Trade| {
            if trade.id == "dup" {
                Err(JournalError::DuplicateTrade(trade.id))
            } else {
                Ok(())
            }
        });
        let journal = Journal::new(store, Settings::default());

        let batch = ImportBatch {
            trades: vec![
                closed("a", "ES", dec!(1), dec!(2), "2024-03-04"),
                closed("dup", "ES", dec!(1), dec!(2), "2024-03-04"),
                closed("b", "ES", dec!(1), dec!(2), "2024-03-04"),
            ],
            tags: vec![Tag::new("t1", "FOMO")],
            ..Default::default()
        };
        let report = journal.import(batch).await.unwrap();
        assert_eq!(report, ImportReport { imported: 2, skipped: 1 });
    }

    #[tokio::test]
    async fn test_import_aborts_on_storage_failure() {
        let mut store = MockTradeStore::new();
        store
            .expect_add_trade()
            .times(1)
            .returning(|_| Err(JournalError::Storage(sqlx::Error::PoolClosed)));
        let journal = Journal::new(store, Settings::default());

        let batch = ImportBatch {
            trades: vec![
                closed("a", "ES", dec!(1), dec!(2), "2024-03-04"),
                closed("b", "ES", dec!(1), dec!(2), "2024-03-04"),
            ],
            ..Default::default()
        };
        assert!(matches!(journal.import(batch).await, Err(JournalError::Storage(_))));
    }

    #[tokio::test]
    async fn test_trade_log_and_equity_against_memory_store() {
        let journal = Journal::new(InMemoryTradeStore::new(), Settings::default());
        let mut with_stop = closed("a", "MES", dec!(100), dec!(90), "2024-03-04");
        with_stop.quantity = dec!(2);
        with_stop.initial_stop_loss = Some(dec!(95));
        let batch = ImportBatch {
            trades: vec![with_stop, closed("b", "AAPL", dec!(10), dec!(30), "2024-03-05")],
            ..Default::default()
        };
        journal.import(batch).await.unwrap();

        let log = journal.trade_log(&TradeFilter::new()).await.unwrap();
        assert_eq!(log[0].pnl, dec!(-100));
        assert_eq!(log[0].r_multiple, Some(dec!(-2)));
        assert_eq!(log[0].metrics.initial_risk_amount, dec!(50));
        assert_eq!(log[1].r_multiple, None);

        let curve = journal.equity(&TradeFilter::new()).await.unwrap();
        assert_eq!(curve.last().map(|p| p.cumulative_pnl), Some(dec!(-80)));

        let days = journal.daily(&TradeFilter::new()).await.unwrap();
        assert_eq!(days.len(), 2);

        journal.delete("a").await.unwrap();
        assert_eq!(journal.trades(&TradeFilter::new()).await.unwrap().len(), 1);
    }

    #[test]
    fn test_import_file_formats() {
        let bare = r#"[{"symbol":"ES","direction":"long","quantity":"1","entryPrice":"5000","entryDate":"2024-03-04T09:30:00Z"}]"#;
        let batch = ImportBatch::from_json(bare).unwrap();
        assert_eq!(batch.trades.len(), 1);
        assert!(batch.strategies.is_empty());

        let envelope = r#"{
            "trades": [],
            "strategies": [{"id": "s1", "name": "ORB"}],
            "tags": [{"id": "t1", "name": "FOMO"}]
        }"#;
        let batch = ImportBatch::from_json(envelope).unwrap();
        assert_eq!(batch.strategies, vec![Strategy::new("s1", "ORB")]);
        assert_eq!(batch.tags.len(), 1);

        assert!(ImportBatch::from_json("{\"nope\": 1}").is_err());
    }

    #[test]
    fn test_import_error_names_the_bad_value() {
        let bare = r#"[{"symbol":"ES","direction":"long","quantity":"1","entryPrice":"5000","entryDate":"last tuesday"}]"#;
        let err = ImportBatch::from_json(bare).unwrap_err();
        assert!(matches!(err, JournalError::Serialization(_)));
        assert!(err.to_string().contains("last tuesday"), "{}", err);

        let envelope = r#"{"trades": [{"symbol":"ES","direction":"long","quantity":"1","entryPrice":"5000","entryDate":"2024-03-04T09:30:00","exitDate":"soon"}]}"#;
        let err = ImportBatch::from_json(envelope).unwrap_err();
        assert!(err.to_string().contains("soon"), "{}", err);
    }
}
