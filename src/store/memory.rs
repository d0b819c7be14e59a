use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

use super::TradeStore;
use crate::error::{JournalError, Result};
use crate::types::{Strategy, Tag, Trade};

#[derive(Debug, Default)]
struct StoreData {
    trades: Vec<Trade>,
    strategies: Vec<Strategy>,
    tags: Vec<Tag>,
}

/// Process-local store. Listing order is insertion order.
#[derive(Debug, Clone, Default)]
pub struct InMemoryTradeStore {
    data: Arc<RwLock<StoreData>>,
}

impl InMemoryTradeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store seeded with `trades`, validated like `add_trade`.
    pub async fn with_trades(trades: Vec<Trade>) -> Result<Self> {
        let store = Self::new();
        for trade in trades {
            store.add_trade(trade).await?;
        }
        Ok(store)
    }
}

fn upsert_by_id<T, F>(items: &mut Vec<T>, item: T, id_of: F)
where
    F: Fn(&T) -> &str,
{
    match items.iter_mut().find(|existing| id_of(existing) == id_of(&item)) {
        Some(existing) => *existing = item,
        None => items.push(item),
    }
}

#[async_trait]
impl TradeStore for InMemoryTradeStore {
    async fn list_trades(&self) -> Result<Vec<Trade>> {
        Ok(self.data.read().await.trades.clone())
    }

    async fn add_trade(&self, trade: Trade) -> Result<()> {
        trade.validate()?;
        let mut data = self.data.write().await;
        if data.trades.iter().any(|t| t.id == trade.id) {
            return Err(JournalError::DuplicateTrade(trade.id));
        }
        debug!("Adding trade {} ({})", trade.id, trade.symbol);
        data.trades.push(trade);
        Ok(())
    }

    async fn update_trade(&self, trade: Trade) -> Result<()> {
        trade.validate()?;
        let mut data = self.data.write().await;
        let existing = data
            .trades
            .iter_mut()
            .find(|t| t.id == trade.id)
            .ok_or_else(|| JournalError::NotFound {
                kind: "trade",
                id: trade.id.clone(),
            })?;
        *existing = trade;
        Ok(())
    }

    async fn delete_trade(&self, id: &str) -> Result<()> {
        let mut data = self.data.write().await;
        let before = data.trades.len();
        data.trades.retain(|t| t.id != id);
        if data.trades.len() == before {
            return Err(JournalError::NotFound {
                kind: "trade",
                id: id.to_string(),
            });
        }
        Ok(())
    }

    async fn list_strategies(&self) -> Result<Vec<Strategy>> {
        Ok(self.data.read().await.strategies.clone())
    }

    async fn add_strategy(&self, strategy: Strategy) -> Result<()> {
        let mut data = self.data.write().await;
        upsert_by_id(&mut data.strategies, strategy, |s| s.id.as_str());
        Ok(())
    }

    async fn list_tags(&self) -> Result<Vec<Tag>> {
        Ok(self.data.read().await.tags.clone())
    }

    async fn add_tag(&self, tag: Tag) -> Result<()> {
        let mut data = self.data.write().await;
        upsert_by_id(&mut data.tags, tag, |t| t.id.as_str());
        Ok(())
    }
}
