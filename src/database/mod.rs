use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;
use std::str::FromStr;
use tracing::{debug, info};

use crate::error::{JournalError, Result};
use crate::store::TradeStore;
use crate::types::{format_wall_clock, parse_wall_clock, Direction, Strategy, Tag, Trade, TradeStatus};

const TRADE_COLUMNS: &str = "id, symbol, direction, quantity, entry_price, exit_price, initial_stop_loss, \
     highest_price_reached, lowest_price_reached, best_exit_price, entry_date, exit_date, \
     commission, status, playbook_id, tags, notes";

/// SQLite-backed trade store. Decimals are kept as TEXT to stay exact.
pub struct SqliteTradeStore {
    pool: SqlitePool,
}

impl SqliteTradeStore {
    /// Open (or create) the database and its schema
    pub async fn new(database_url: &str) -> Result<Self> {
        info!("Initializing SQLite trade store at: {}", database_url);

        let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);

        // Every connection to an in-memory database sees its own empty database
        let max_connections = if database_url.contains(":memory:") { 1 } else { 5 };

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await?;

        let store = Self { pool };
        store.create_schema().await?;

        info!("Trade store initialized successfully");
        Ok(store)
    }

    async fn create_schema(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS trades (
                id TEXT PRIMARY KEY,
                symbol TEXT NOT NULL,
                direction TEXT NOT NULL,
                quantity TEXT NOT NULL,
                entry_price TEXT NOT NULL,
                exit_price TEXT,
                initial_stop_loss TEXT,
                highest_price_reached TEXT,
                lowest_price_reached TEXT,
                best_exit_price TEXT,
                entry_date TEXT NOT NULL,
                exit_date TEXT,
                commission TEXT NOT NULL DEFAULT '0',
                status TEXT NOT NULL,
                playbook_id TEXT,
                tags TEXT NOT NULL DEFAULT '[]',
                notes TEXT
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_trades_entry_date ON trades(entry_date)
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_trades_symbol ON trades(symbol)
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS strategies (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS tags (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn trade_count(&self) -> Result<i64> {
        let row = sqlx::query("SELECT COUNT(*) as count FROM trades")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.get("count"))
    }

    async fn write_trade(&self, sql: &str, trade: &Trade) -> Result<u64> {
        let tags = serde_json::to_string(&trade.tags)?;

        let result = sqlx::query(sql)
            .bind(trade.symbol.as_str())
            .bind(trade.direction.as_str())
            .bind(trade.quantity.to_string())
            .bind(trade.entry_price.to_string())
            .bind(trade.exit_price.map(|p| p.to_string()))
            .bind(trade.initial_stop_loss.map(|p| p.to_string()))
            .bind(trade.highest_price_reached.map(|p| p.to_string()))
            .bind(trade.lowest_price_reached.map(|p| p.to_string()))
            .bind(trade.best_exit_price.map(|p| p.to_string()))
            .bind(format_wall_clock(&trade.entry_date))
            .bind(trade.exit_date.as_ref().map(format_wall_clock))
            .bind(trade.commission.to_string())
            .bind(trade.status.as_str())
            .bind(trade.playbook_id.as_deref())
            .bind(tags)
            .bind(trade.notes.as_deref())
            .bind(trade.id.as_str())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}

fn optional_decimal(row: &SqliteRow, column: &str) -> Result<Option<Decimal>> {
    row.get::<Option<String>, _>(column)
        .map(|s| Decimal::from_str(&s))
        .transpose()
        .map_err(JournalError::from)
}

fn trade_from_row(row: &SqliteRow) -> Result<Trade> {
    let exit_date = row
        .get::<Option<String>, _>("exit_date")
        .map(|s| parse_wall_clock(&s))
        .transpose()?;

    Ok(Trade {
        id: row.get("id"),
        symbol: row.get("symbol"),
        direction: Direction::from_str(row.get("direction"))?,
        quantity: Decimal::from_str(row.get("quantity"))?,
        entry_price: Decimal::from_str(row.get("entry_price"))?,
        exit_price: optional_decimal(row, "exit_price")?,
        initial_stop_loss: optional_decimal(row, "initial_stop_loss")?,
        highest_price_reached: optional_decimal(row, "highest_price_reached")?,
        lowest_price_reached: optional_decimal(row, "lowest_price_reached")?,
        best_exit_price: optional_decimal(row, "best_exit_price")?,
        entry_date: parse_wall_clock(row.get("entry_date"))?,
        exit_date,
        commission: Decimal::from_str(row.get("commission"))?,
        status: TradeStatus::from_str(row.get("status"))?,
        playbook_id: row.get("playbook_id"),
        tags: serde_json::from_str(row.get("tags"))?,
        notes: row.get("notes"),
    })
}

#[async_trait]
impl TradeStore for SqliteTradeStore {
    async fn list_trades(&self) -> Result<Vec<Trade>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM trades ORDER BY entry_date ASC, id ASC",
            TRADE_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        let mut trades = Vec::with_capacity(rows.len());
        for row in &rows {
            trades.push(trade_from_row(row)?);
        }

        debug!("Loaded {} trades", trades.len());
        Ok(trades)
    }

    async fn add_trade(&self, trade: Trade) -> Result<()> {
        trade.validate()?;

        // id is bound last so inserts and updates share one bind order
        let inserted = self
            .write_trade(
                r#"
                INSERT INTO trades (symbol, direction, quantity, entry_price, exit_price, initial_stop_loss,
                                    highest_price_reached, lowest_price_reached, best_exit_price, entry_date,
                                    exit_date, commission, status, playbook_id, tags, notes, id)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                ON CONFLICT(id) DO NOTHING
                "#,
                &trade,
            )
            .await?;

        if inserted == 0 {
            return Err(JournalError::DuplicateTrade(trade.id));
        }

        debug!("Inserted trade {} ({})", trade.id, trade.symbol);
        Ok(())
    }

    async fn update_trade(&self, trade: Trade) -> Result<()> {
        trade.validate()?;

        let affected = self
            .write_trade(
                r#"
                UPDATE trades
                SET symbol = ?, direction = ?, quantity = ?, entry_price = ?, exit_price = ?,
                    initial_stop_loss = ?, highest_price_reached = ?, lowest_price_reached = ?,
                    best_exit_price = ?, entry_date = ?, exit_date = ?, commission = ?, status = ?,
                    playbook_id = ?, tags = ?, notes = ?
                WHERE id = ?
                "#,
                &trade,
            )
            .await?;

        if affected == 0 {
            return Err(JournalError::NotFound { kind: "trade", id: trade.id });
        }
        Ok(())
    }

    async fn delete_trade(&self, id: &str) -> Result<()> {
        let result = sqlx::query("DELETE FROM trades WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(JournalError::NotFound {
                kind: "trade",
                id: id.to_string(),
            });
        }
        Ok(())
    }

    async fn list_strategies(&self) -> Result<Vec<Strategy>> {
        let rows = sqlx::query("SELECT id, name FROM strategies ORDER BY name ASC")
            .fetch_all(&self.pool)
            .await?;

        Ok(rows
            .iter()
            .map(|row| Strategy::new(row.get::<String, _>("id"), row.get::<String, _>("name")))
            .collect())
    }

    async fn add_strategy(&self, strategy: Strategy) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO strategies (id, name) VALUES (?, ?)
            ON CONFLICT(id) DO UPDATE SET name = excluded.name
            "#,
        )
        .bind(strategy.id.as_str())
        .bind(strategy.name.as_str())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn list_tags(&self) -> Result<Vec<Tag>> {
        let rows = sqlx::query("SELECT id, name FROM tags ORDER BY name ASC")
            .fetch_all(&self.pool)
            .await?;

        Ok(rows
            .iter()
            .map(|row| Tag::new(row.get::<String, _>("id"), row.get::<String, _>("name")))
            .collect())
    }

    async fn add_tag(&self, tag: Tag) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO tags (id, name) VALUES (?, ?)
            ON CONFLICT(id) DO UPDATE SET name = excluded.name
            "#,
        )
        .bind(tag.id.as_str())
        .bind(tag.name.as_str())
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    async fn store() -> SqliteTradeStore {
        SqliteTradeStore::new("sqlite::memory:").await.unwrap()
    }

    fn sample(id: &str, entry: &str) -> Trade {
        let mut trade = Trade::new("MES", Direction::Short, dec!(2), dec!(5012.25), parse_wall_clock(entry).unwrap());
        trade.id = id.to_string();
        trade
    }

    #[tokio::test]
    async fn test_round_trip_preserves_every_field() {
        let store = store().await;

        let mut trade = sample("t1", "2024-03-04T09:30:15.250");
        trade.exit_price = Some(dec!(5001.50));
        trade.exit_date = Some(parse_wall_clock("2024-03-04T10:02:00").unwrap());
        trade.initial_stop_loss = Some(dec!(5020));
        trade.highest_price_reached = Some(dec!(5015.75));
        trade.lowest_price_reached = Some(dec!(4998));
        trade.commission = dec!(1.24);
        trade.status = TradeStatus::SmallWin;
        trade.playbook_id = Some("orb".to_string());
        trade.tags = vec!["a".to_string(), "b".to_string()];
        trade.notes = Some("faded the open".to_string());

        store.add_trade(trade.clone()).await.unwrap();
        let loaded = store.list_trades().await.unwrap();
        assert_eq!(loaded, vec![trade]);
    }

    #[tokio::test]
    async fn test_listing_is_ordered_by_entry_date() {
        let store = store().await;
        store.add_trade(sample("late", "2024-03-05T09:30:00")).await.unwrap();
        store.add_trade(sample("early", "2024-03-04T15:00:00")).await.unwrap();

        let ids: Vec<String> = store.list_trades().await.unwrap().into_iter().map(|t| t.id).collect();
        assert_eq!(ids, vec!["early", "late"]);
        assert_eq!(store.trade_count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_duplicate_and_missing_ids() {
        let store = store().await;
        store.add_trade(sample("t1", "2024-03-04T09:30:00")).await.unwrap();

        assert!(matches!(
            store.add_trade(sample("t1", "2024-03-04T09:30:00")).await,
            Err(JournalError::DuplicateTrade(_))
        ));
        assert!(matches!(
            store.update_trade(sample("nope", "2024-03-04T09:30:00")).await,
            Err(JournalError::NotFound { .. })
        ));
        assert!(matches!(store.delete_trade("nope").await, Err(JournalError::NotFound { .. })));

        let mut closed = sample("t1", "2024-03-04T09:30:00");
        closed.exit_price = Some(dec!(5000));
        store.update_trade(closed).await.unwrap();
        assert_eq!(store.list_trades().await.unwrap()[0].exit_price, Some(dec!(5000)));

        store.delete_trade("t1").await.unwrap();
        assert_eq!(store.trade_count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_concurrent_adds_with_same_id_insert_once() {
        let store = store().await;

        let (first, second) = tokio::join!(
            store.add_trade(sample("t1", "2024-03-04T09:30:00")),
            store.add_trade(sample("t1", "2024-03-04T09:45:00")),
        );

        let results = [first, second];
        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        assert_eq!(
            results
                .iter()
                .filter(|r| matches!(r, Err(JournalError::DuplicateTrade(id)) if id == "t1"))
                .count(),
            1
        );
        assert_eq!(store.trade_count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_rejects_exit_before_entry() {
        let store = store().await;
        let mut trade = sample("t1", "2024-03-04T09:30:00");
        trade.exit_date = Some(parse_wall_clock("2024-03-04T09:00:00").unwrap());
        assert!(matches!(store.add_trade(trade).await, Err(JournalError::InvalidTrade { .. })));
    }

    #[tokio::test]
    async fn test_lookup_tables() {
        let store = store().await;
        store.add_strategy(Strategy::new("s2", "VWAP Fade")).await.unwrap();
        store.add_strategy(Strategy::new("s1", "Breakout")).await.unwrap();
        store.add_strategy(Strategy::new("s1", "Opening Range")).await.unwrap();
        store.add_tag(Tag::new("t1", "FOMO")).await.unwrap();

        let names: Vec<String> = store.list_strategies().await.unwrap().into_iter().map(|s| s.name).collect();
        assert_eq!(names, vec!["Opening Range", "VWAP Fade"]);
        assert_eq!(store.list_tags().await.unwrap(), vec![Tag::new("t1", "FOMO")]);
    }
}
