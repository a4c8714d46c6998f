//! WHERE clause construction.

use std::fmt;

use crate::error::{QueryError, QueryResult};
use crate::request::{FilterSpec, FilterValue};
use crate::schema::SchemaRegistry;
use crate::sql::expr::{extract, lit_bool, table_col, BinaryOperator, DatePart, Expr, ExprExt};
use crate::sql::ParamValue;
use crate::validate::collapse_upper;

/// Operators a filter may use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterOperator {
    Eq,
    Gt,
    Lt,
    Gte,
    Lte,
    /// `!=`
    BangEq,
    /// `<>`
    Ne,
    Like,
    ILike,
    In,
    NotIn,
    Between,
    IsNull,
    IsNotNull,
    /// Hour-of-day range on the temporal column.
    PeriodoDia,
}

impl FilterOperator {
    pub const ALL: [FilterOperator; 15] = [
        FilterOperator::Eq,
        FilterOperator::Gt,
        FilterOperator::Lt,
        FilterOperator::Gte,
        FilterOperator::Lte,
        FilterOperator::BangEq,
        FilterOperator::Ne,
        FilterOperator::Like,
        FilterOperator::ILike,
        FilterOperator::In,
        FilterOperator::NotIn,
        FilterOperator::Between,
        FilterOperator::IsNull,
        FilterOperator::IsNotNull,
        FilterOperator::PeriodoDia,
    ];

    /// Case-insensitive, with runs of whitespace treated as one space.
    pub fn parse(op: &str) -> Option<Self> {
        let normalized = collapse_upper(op);
        Self::ALL.into_iter().find(|o| o.as_str() == normalized)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FilterOperator::Eq => "=",
            FilterOperator::Gt => ">",
            FilterOperator::Lt => "<",
            FilterOperator::Gte => ">=",
            FilterOperator::Lte => "<=",
            FilterOperator::BangEq => "!=",
            FilterOperator::Ne => "<>",
            FilterOperator::Like => "LIKE",
            FilterOperator::ILike => "ILIKE",
            FilterOperator::In => "IN",
            FilterOperator::NotIn => "NOT IN",
            FilterOperator::Between => "BETWEEN",
            FilterOperator::IsNull => "IS NULL",
            FilterOperator::IsNotNull => "IS NOT NULL",
            FilterOperator::PeriodoDia => "PERIODO_DIA",
        }
    }

    /// The binary operator for single-value comparisons.
    fn comparison(&self) -> Option<BinaryOperator> {
        Some(match self {
            FilterOperator::Eq => BinaryOperator::Eq,
            FilterOperator::Gt => BinaryOperator::Gt,
            FilterOperator::Lt => BinaryOperator::Lt,
            FilterOperator::Gte => BinaryOperator::Gte,
            FilterOperator::Lte => BinaryOperator::Lte,
            FilterOperator::BangEq => BinaryOperator::BangEq,
            FilterOperator::Ne => BinaryOperator::Ne,
            FilterOperator::Like => BinaryOperator::Like,
            FilterOperator::ILike => BinaryOperator::ILike,
            _ => return None,
        })
    }
}

impl fmt::Display for FilterOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Build one condition per filter, ANDed in request order.
///
/// With no filters the condition is the literal `true`, which binds nothing.
pub fn build_where(registry: &SchemaRegistry, filters: &[FilterSpec]) -> QueryResult<Expr> {
    let mut condition: Option<Expr> = None;
    for filter in filters {
        let next = build_condition(registry, filter)?;
        condition = Some(match condition {
            Some(existing) => existing.and(next),
            None => next,
        });
    }
    Ok(condition.unwrap_or_else(|| lit_bool(true)))
}

/// Build the condition for a single filter.
pub fn build_condition(registry: &SchemaRegistry, filter: &FilterSpec) -> QueryResult<Expr> {
    let op = FilterOperator::parse(&filter.op)
        .ok_or_else(|| QueryError::InvalidOperator(filter.op.clone()))?;
    let alias = registry.resolve_alias(&filter.column)?;
    let column = table_col(alias, &filter.column);

    let arity = |expected: &'static str| QueryError::InvalidOperatorArity {
        operator: op.to_string(),
        column: filter.column.clone(),
        expected,
        actual: filter.value.describe(),
    };

    let expr = match op {
        FilterOperator::IsNull => column.is_null(),
        FilterOperator::IsNotNull => column.is_not_null(),

        FilterOperator::Between => {
            let (low, high) = pair(&filter.value).ok_or_else(|| arity("exactly two values"))?;
            column.between(low, high)
        }

        FilterOperator::PeriodoDia => {
            if filter.column != registry.temporal_column() {
                return Err(QueryError::InvalidOperator(format!(
                    "{} on '{}' (only '{}')",
                    op,
                    filter.column,
                    registry.temporal_column()
                )));
            }
            let (low, high) =
                pair(&filter.value).ok_or_else(|| arity("exactly two hour values"))?;
            extract(DatePart::Hour, column).between(low, high)
        }

        FilterOperator::In | FilterOperator::NotIn => {
            let FilterValue::List(items) = &filter.value else {
                return Err(arity("a list of values"));
            };
            let values = items.iter().cloned().map(Expr::Param).collect();
            if op == FilterOperator::In {
                column.in_list(values)
            } else {
                column.not_in_list(values)
            }
        }

        comparison => {
            let FilterValue::Scalar(value) = &filter.value else {
                return Err(arity("a single value"));
            };
            // Every remaining operator has a binary form.
            match comparison.comparison() {
                Some(bin) => column.binary(bin, value.clone()),
                None => return Err(QueryError::InvalidOperator(filter.op.clone())),
            }
        }
    };

    Ok(expr)
}

fn pair(value: &FilterValue) -> Option<(ParamValue, ParamValue)> {
    match value {
        FilterValue::List(items) if items.len() == 2 => Some((items[0].clone(), items[1].clone())),
        _ => None,
    }
}
