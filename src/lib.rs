pub mod analytics;
pub mod config;
pub mod database;
pub mod error;
pub mod journal;
pub mod store;
pub mod types;

pub use error::{JournalError, Result};
