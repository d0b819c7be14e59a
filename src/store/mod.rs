pub mod memory;

pub use memory::InMemoryTradeStore;

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{Strategy, Tag, Trade};

/// Persistence for journaled trades and their lookup tables.
///
/// The analytics engine only ever sees the snapshot returned by
/// `list_trades`, so implementations need no coordination with it.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TradeStore: Send + Sync {
    async fn list_trades(&self) -> Result<Vec<Trade>>;
    /// Fails on invalid records and on an id that is already stored.
    async fn add_trade(&self, trade: Trade) -> Result<()>;
    async fn update_trade(&self, trade: Trade) -> Result<()>;
    async fn delete_trade(&self, id: &str) -> Result<()>;

    async fn list_strategies(&self) -> Result<Vec<Strategy>>;
    /// Inserts or renames by id.
    async fn add_strategy(&self, strategy: Strategy) -> Result<()>;
    async fn list_tags(&self) -> Result<Vec<Tag>>;
    /// Inserts or renames by id.
    async fn add_tag(&self, tag: Tag) -> Result<()>;
}
