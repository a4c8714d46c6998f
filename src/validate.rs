//! Allow-list validation.
//!
//! Runs before any join or SQL work. Every check here is a pure lookup
//! against the registry.

use std::fmt;

use crate::error::{ColumnRole, QueryError, QueryResult};
use crate::request::{AnalyticsRequest, MetricSpec};
use crate::schema::SchemaRegistry;
use crate::sql::expr::{avg, count, count_distinct, max, min, sum, Expr};

/// Aggregates a metric may use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AggregateFunction {
    Sum,
    Count,
    Avg,
    Min,
    Max,
    CountDistinct,
}

impl AggregateFunction {
    pub const ALL: [AggregateFunction; 6] = [
        AggregateFunction::Sum,
        AggregateFunction::Count,
        AggregateFunction::Avg,
        AggregateFunction::Min,
        AggregateFunction::Max,
        AggregateFunction::CountDistinct,
    ];

    /// Case-insensitive; runs of inner whitespace count as one space.
    pub fn parse(name: &str) -> Option<Self> {
        let normalized = collapse_upper(name);
        Self::ALL
            .into_iter()
            .find(|f| f.as_str() == normalized)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AggregateFunction::Sum => "SUM",
            AggregateFunction::Count => "COUNT",
            AggregateFunction::Avg => "AVG",
            AggregateFunction::Min => "MIN",
            AggregateFunction::Max => "MAX",
            AggregateFunction::CountDistinct => "COUNT DISTINCT",
        }
    }

    /// Apply this aggregate to `arg`.
    pub fn to_expr(self, arg: Expr) -> Expr {
        match self {
            AggregateFunction::Sum => sum(arg),
            AggregateFunction::Count => count(arg),
            AggregateFunction::Avg => avg(arg),
            AggregateFunction::Min => min(arg),
            AggregateFunction::Max => max(arg),
            AggregateFunction::CountDistinct => count_distinct(arg),
        }
    }
}

impl fmt::Display for AggregateFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Upper-case and collapse whitespace: `" count   distinct "` becomes `"COUNT DISTINCT"`.
pub(crate) fn collapse_upper(s: &str) -> String {
    s.split_whitespace()
        .map(str::to_ascii_uppercase)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Check the function and column of a metric.
pub fn validate_metric(
    registry: &SchemaRegistry,
    metric: &MetricSpec,
) -> QueryResult<AggregateFunction> {
    let function = AggregateFunction::parse(&metric.func)
        .ok_or_else(|| QueryError::DisallowedFunction(metric.func.clone()))?;
    validate_column(registry, ColumnRole::Metric, &metric.column)?;
    Ok(function)
}

/// Check one column against the union of all tables' allow-lists for `role`.
pub fn validate_column(registry: &SchemaRegistry, role: ColumnRole, column: &str) -> QueryResult<()> {
    if registry.is_allowed(role, column) {
        Ok(())
    } else {
        Err(QueryError::DisallowedColumn {
            role,
            column: column.to_string(),
        })
    }
}

/// Validate every column slot of a request. Returns the parsed aggregate.
pub fn validate_request(
    registry: &SchemaRegistry,
    request: &AnalyticsRequest,
) -> QueryResult<AggregateFunction> {
    let function = validate_metric(registry, &request.metric)?;
    for item in &request.group_by {
        validate_column(registry, ColumnRole::Grouping, &item.column)?;
    }
    for item in &request.filters {
        validate_column(registry, ColumnRole::Filter, &item.column)?;
    }
    Ok(function)
}
