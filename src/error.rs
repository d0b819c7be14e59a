use thiserror::Error;

/// Errors raised around the metrics engine: record validation, parsing and storage.
///
/// The engine itself never fails; every formula has a fallback for missing data.
#[derive(Debug, Error)]
pub enum JournalError {
    #[error("invalid trade {id}: {reason}")]
    InvalidTrade { id: String, reason: String },

    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(String),

    #[error("unknown {kind}: {value}")]
    UnknownVariant { kind: &'static str, value: String },

    #[error("trade {0} already exists")]
    DuplicateTrade(String),

    #[error("{kind} {id} not found")]
    NotFound { kind: &'static str, id: String },

    #[error("storage error: {0}")]
    Storage(#[from] sqlx::Error),

    #[error("stored value is not a decimal: {0}")]
    Decimal(#[from] rust_decimal::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, JournalError>;
