//! SELECT list and GROUP BY construction.

use std::fmt;

use super::{DATE_GROUP_ALIAS, METRIC_ALIAS};
use crate::error::{QueryError, QueryResult};
use crate::request::{GroupBySpec, MetricSpec};
use crate::schema::SchemaRegistry;
use crate::sql::expr::{date_trunc, extract, table_col, DatePart, Expr, ExprExt};
use crate::sql::query::SelectExpr;
use crate::validate::AggregateFunction;

/// Time buckets a grouping on the temporal column may use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Granularity {
    Second,
    Minute,
    Hour,
    Day,
    Week,
    Month,
    Quarter,
    Year,
    DayOfWeek,
}

impl Granularity {
    pub const ALL: [Granularity; 9] = [
        Granularity::Second,
        Granularity::Minute,
        Granularity::Hour,
        Granularity::Day,
        Granularity::Week,
        Granularity::Month,
        Granularity::Quarter,
        Granularity::Year,
        Granularity::DayOfWeek,
    ];

    /// Exact, lowercase match only.
    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|g| g.as_str() == name)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Granularity::Second => "second",
            Granularity::Minute => "minute",
            Granularity::Hour => "hour",
            Granularity::Day => "day",
            Granularity::Week => "week",
            Granularity::Month => "month",
            Granularity::Quarter => "quarter",
            Granularity::Year => "year",
            Granularity::DayOfWeek => "day_of_week",
        }
    }

    /// The bucketing expression over `column`.
    pub fn to_expr(self, column: Expr) -> Expr {
        match self {
            Granularity::DayOfWeek => extract(DatePart::Dow, column),
            Granularity::Hour => date_trunc("hour", column),
            other => date_trunc(other.as_str(), column),
        }
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Output of [`build_select`].
#[derive(Debug, Clone, PartialEq)]
pub struct SelectClause {
    /// Group-by items in request order, then the metric.
    pub items: Vec<SelectExpr>,
    /// Empty when the request has no grouping.
    pub group_by: Vec<Expr>,
    /// Grouping fields a request may order by, in request order.
    pub order_fields: Vec<String>,
    pub has_date_grouping: bool,
}

/// Build the SELECT and GROUP BY lists.
///
/// A plain grouping selects `alias.column` and makes the column name
/// orderable. A time-bucketed grouping is only legal on the temporal column,
/// is selected under [`DATE_GROUP_ALIAS`], and its column name is not orderable.
/// The metric comes last as `FUNC(alias.column) AS metric_result`.
pub fn build_select(
    registry: &SchemaRegistry,
    group_by: &[GroupBySpec],
    metric: &MetricSpec,
    function: AggregateFunction,
) -> QueryResult<SelectClause> {
    let mut clause = SelectClause {
        items: Vec::with_capacity(group_by.len() + 1),
        group_by: Vec::with_capacity(group_by.len()),
        order_fields: Vec::new(),
        has_date_grouping: false,
    };

    for item in group_by {
        let alias = registry.resolve_alias(&item.column)?;
        let column = table_col(alias, &item.column);

        match item.granularity.as_deref() {
            None => {
                clause.items.push(SelectExpr::new(column.clone()));
                clause.group_by.push(column);
                clause.order_fields.push(item.column.clone());
            }
            Some(raw) => {
                if item.column != registry.temporal_column() {
                    return Err(QueryError::InvalidGranularityColumn {
                        column: item.column.clone(),
                        granularity: raw.to_string(),
                        temporal: registry.temporal_column().to_string(),
                    });
                }
                let granularity = Granularity::parse(raw)
                    .ok_or_else(|| QueryError::InvalidGranularity(raw.to_string()))?;

                let bucket = granularity.to_expr(column);
                clause.items.push(bucket.clone().alias(DATE_GROUP_ALIAS));
                clause.group_by.push(bucket);
                if !clause.has_date_grouping {
                    clause.order_fields.push(DATE_GROUP_ALIAS.to_string());
                    clause.has_date_grouping = true;
                }
            }
        }
    }

    let metric_alias = registry.resolve_alias(&metric.column)?;
    clause
        .items
        .push(function.to_expr(table_col(metric_alias, &metric.column)).alias(METRIC_ALIAS));

    Ok(clause)
}
