use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

use super::aggregate::{closed_pnls, win_rate_of};
use super::buckets::{AggregateRow, BucketType};
use crate::error::JournalError;
use crate::types::{Direction, Outcome, Strategy, Tag, Trade};

/// Secondary dimension crossed against the bucket rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dimension {
    Strategy,
    Tag,
    Status,
    Side,
}

impl Dimension {
    pub fn as_str(&self) -> &'static str {
        match self {
            Dimension::Strategy => "strategy",
            Dimension::Tag => "tag",
            Dimension::Status => "status",
            Dimension::Side => "side",
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Dimension {
    type Err = JournalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "strategy" | "playbook" => Ok(Dimension::Strategy),
            "tag" | "tags" => Ok(Dimension::Tag),
            "status" => Ok(Dimension::Status),
            "side" | "direction" => Ok(Dimension::Side),
            _ => Err(JournalError::UnknownVariant {
                kind: "dimension",
                value: s.to_string(),
            }),
        }
    }
}

/// Strategy and tag names the matrix columns are built from.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Lookups {
    pub strategies: Vec<Strategy>,
    pub tags: Vec<Tag>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CrossCell {
    pub pnl: Decimal,
    pub win_rate: Decimal,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrossRow {
    pub label: String,
    /// One entry per column; `None` where no trade matches both keys.
    pub cells: Vec<Option<CrossCell>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrossTab {
    pub cols: Vec<String>,
    pub matrix: Vec<CrossRow>,
}

enum Column<'a> {
    Strategy(&'a Strategy),
    Tag(&'a Tag),
    Outcome(Outcome),
    Side(Direction),
}

impl Column<'_> {
    fn label(&self) -> String {
        match self {
            Column::Strategy(strategy) => strategy.name.clone(),
            Column::Tag(tag) => tag.name.clone(),
            Column::Outcome(outcome) => outcome.to_string(),
            Column::Side(direction) => direction.to_string(),
        }
    }

    fn matches(&self, trade: &Trade) -> bool {
        match self {
            Column::Strategy(strategy) => trade.playbook_id.as_deref() == Some(strategy.id.as_str()),
            Column::Tag(tag) => trade.has_tag(&tag.id),
            Column::Outcome(outcome) => trade.status.outcome() == *outcome,
            Column::Side(direction) => trade.direction == *direction,
        }
    }
}

fn columns(dimension: Dimension, lookups: &Lookups) -> Vec<Column<'_>> {
    match dimension {
        Dimension::Strategy => lookups.strategies.iter().map(Column::Strategy).collect(),
        Dimension::Tag => lookups.tags.iter().map(Column::Tag).collect(),
        Dimension::Status => Outcome::all().into_iter().map(Column::Outcome).collect(),
        Dimension::Side => Direction::all().into_iter().map(Column::Side).collect(),
    }
}

/// Builds the (bucket row × dimension column) matrix.
///
/// Each cell re-filters the full trade list, so the cost is
/// rows × cols × trades. Row and column counts are small.
pub fn cross_tabulate(
    rows: &[AggregateRow],
    trades: &[Trade],
    bucket_type: BucketType,
    dimension: Dimension,
    lookups: &Lookups,
    commission_per_unit: Decimal,
) -> CrossTab {
    let columns = columns(dimension, lookups);
    debug!(
        "Cross-tabulating {} {} rows against {} {} columns",
        rows.len(),
        bucket_type,
        columns.len(),
        dimension
    );

    let matrix = rows
        .iter()
        .map(|row| CrossRow {
            label: row.label.clone(),
            cells: columns
                .iter()
                .map(|column| {
                    let matching: Vec<&Trade> = trades
                        .iter()
                        .filter(|t| t.is_closed())
                        .filter(|t| bucket_type.bucket_key(t) == Some(row.label.as_str()))
                        .filter(|t| column.matches(t))
                        .collect();

                    if matching.is_empty() {
                        return None;
                    }

                    let pnls = closed_pnls(matching.iter().copied(), commission_per_unit);
                    Some(CrossCell {
                        pnl: pnls.iter().sum(),
                        win_rate: win_rate_of(&pnls),
                        count: matching.len() as u64,
                    })
                })
                .collect(),
        })
        .collect();

    CrossTab {
        cols: columns.iter().map(Column::label).collect(),
        matrix,
    }
}
