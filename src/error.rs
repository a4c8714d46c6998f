//! Error types for request compilation.
//!
//! Every variant is a client-input rejection raised before any SQL is
//! handed out. Failures while *executing* a plan belong to the caller's
//! database layer and are not represented here.

use std::fmt;

/// Result type for compiling a request.
pub type QueryResult<T> = Result<T, QueryError>;

/// Which request slot an allow-list check was made for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnRole {
    Metric,
    Grouping,
    Filter,
}

impl fmt::Display for ColumnRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnRole::Metric => write!(f, "metric"),
            ColumnRole::Grouping => write!(f, "grouping"),
            ColumnRole::Filter => write!(f, "filter"),
        }
    }
}

/// Errors that can occur while compiling an analytics request.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum QueryError {
    #[error("Invalid {kind} entry: {entry}")]
    InvalidInputShape { kind: &'static str, entry: String },

    #[error("Aggregate function not allowed: {0}")]
    DisallowedFunction(String),

    #[error("{role} column not allowed: {column}")]
    DisallowedColumn { role: ColumnRole, column: String },

    #[error("Column is not mapped to any table: {0}")]
    UnmappedColumn(String),

    #[error("Operator not allowed: {0}")]
    InvalidOperator(String),

    #[error("Operator {operator} on '{column}' expects {expected}, got {actual}")]
    InvalidOperatorArity {
        operator: String,
        column: String,
        expected: &'static str,
        actual: String,
    },

    #[error("Granularity not allowed: {0}")]
    InvalidGranularity(String),

    #[error("Granularity '{granularity}' is only allowed on '{temporal}', not '{column}'")]
    InvalidGranularityColumn {
        column: String,
        granularity: String,
        temporal: String,
    },

    #[error("Invalid order_by syntax: '{0}'")]
    InvalidOrderBySyntax(String),

    #[error("order_by column not allowed: {column} (allowed: {})", allowed.join(", "))]
    InvalidOrderByColumn {
        column: String,
        allowed: Vec<String>,
    },

    #[error("Invalid order_by direction: {0}")]
    InvalidOrderByDirection(String),

    #[error("Limit out of range: {0} (must fit in a signed 64-bit integer)")]
    LimitOutOfRange(u64),
}
