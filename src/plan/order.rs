//! ORDER BY construction.

use super::select::SelectClause;
use super::{DATE_GROUP_ALIAS, METRIC_ALIAS};
use crate::error::{QueryError, QueryResult};
use crate::sql::expr::col;
use crate::sql::query::{OrderByExpr, SortDir};

/// Parse a direction keyword, case-insensitively.
pub fn parse_direction(raw: &str) -> QueryResult<SortDir> {
    match raw.to_ascii_uppercase().as_str() {
        "ASC" => Ok(SortDir::Asc),
        "DESC" => Ok(SortDir::Desc),
        _ => Err(QueryError::InvalidOrderByDirection(raw.to_string())),
    }
}

/// Build the single ORDER BY item.
///
/// Without an explicit `order_by` (or with an empty string), time series sort
/// chronologically by the date-group alias and everything else sorts by the
/// metric, largest first. An explicit `"<field> [ASC|DESC]"` may name the
/// date-group alias, the metric alias or any plain grouping column; the
/// direction defaults to descending.
pub fn build_order_by(order_by: Option<&str>, select: &SelectClause) -> QueryResult<OrderByExpr> {
    let Some(raw) = order_by.filter(|s| !s.is_empty()) else {
        return Ok(if select.has_date_grouping {
            OrderByExpr::asc(col(DATE_GROUP_ALIAS))
        } else {
            OrderByExpr::desc(col(METRIC_ALIAS))
        });
    };

    let parts: Vec<&str> = raw.split_whitespace().collect();
    let (field, direction) = match parts.as_slice() {
        [field] => (*field, SortDir::Desc),
        [field, dir] => (*field, parse_direction(dir)?),
        _ => return Err(QueryError::InvalidOrderBySyntax(raw.to_string())),
    };

    let allowed = orderable_fields(select);
    if !allowed.iter().any(|f| f == field) {
        return Err(QueryError::InvalidOrderByColumn {
            column: field.to_string(),
            allowed,
        });
    }

    Ok(match direction {
        SortDir::Asc => OrderByExpr::asc(col(field)),
        SortDir::Desc => OrderByExpr::desc(col(field)),
    })
}

/// The two reserved aliases, then plain grouping columns in request order.
fn orderable_fields(select: &SelectClause) -> Vec<String> {
    let mut fields = vec![DATE_GROUP_ALIAS.to_string(), METRIC_ALIAS.to_string()];
    fields.extend(
        select
            .order_fields
            .iter()
            .filter(|f| f.as_str() != DATE_GROUP_ALIAS)
            .cloned(),
    );
    fields
}
