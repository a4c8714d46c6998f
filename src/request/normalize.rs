//! Input adapters.
//!
//! Each concept accepts a closed set of representations. Typed specs pass
//! through untouched; JSON values must have exactly the documented keys.

use serde::Deserialize;
use serde_json::{Map, Value};

use super::types::{AnalyticsRequest, FilterSpec, FilterValue, GroupBySpec, MetricSpec};
use crate::error::{QueryError, QueryResult};
use crate::sql::ParamValue;

/// A metric entry as received.
#[derive(Debug, Clone, PartialEq)]
pub enum MetricInput {
    Spec(MetricSpec),
    Json(Value),
}

/// A group-by entry as received. A bare string names a column with no granularity.
#[derive(Debug, Clone, PartialEq)]
pub enum GroupByInput {
    Column(String),
    Spec(GroupBySpec),
    Json(Value),
}

/// A filter entry as received.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterInput {
    Spec(FilterSpec),
    Json(Value),
}

impl From<MetricSpec> for MetricInput {
    fn from(spec: MetricSpec) -> Self {
        MetricInput::Spec(spec)
    }
}

impl From<Value> for MetricInput {
    fn from(value: Value) -> Self {
        MetricInput::Json(value)
    }
}

impl From<&str> for GroupByInput {
    fn from(column: &str) -> Self {
        GroupByInput::Column(column.into())
    }
}

impl From<GroupBySpec> for GroupByInput {
    fn from(spec: GroupBySpec) -> Self {
        GroupByInput::Spec(spec)
    }
}

impl From<Value> for GroupByInput {
    fn from(value: Value) -> Self {
        GroupByInput::Json(value)
    }
}

impl From<FilterSpec> for FilterInput {
    fn from(spec: FilterSpec) -> Self {
        FilterInput::Spec(spec)
    }
}

impl From<Value> for FilterInput {
    fn from(value: Value) -> Self {
        FilterInput::Json(value)
    }
}

// ============================================================================
// Normalization
// ============================================================================

pub fn normalize_metric(input: MetricInput) -> QueryResult<MetricSpec> {
    match input {
        MetricInput::Spec(spec) => Ok(spec),
        MetricInput::Json(value) => {
            let shape = || invalid("metric", &value);
            let obj = value.as_object().ok_or_else(shape)?;
            only_keys(obj, &["func", "column"]).ok_or_else(shape)?;
            Ok(MetricSpec {
                func: required_str(obj, "func").ok_or_else(shape)?,
                column: required_str(obj, "column").ok_or_else(shape)?,
            })
        }
    }
}

pub fn normalize_group_by(input: GroupByInput) -> QueryResult<GroupBySpec> {
    match input {
        GroupByInput::Column(column) => Ok(GroupBySpec {
            column,
            granularity: None,
        }),
        GroupByInput::Spec(spec) => Ok(spec),
        GroupByInput::Json(Value::String(column)) => Ok(GroupBySpec {
            column,
            granularity: None,
        }),
        GroupByInput::Json(value) => {
            let shape = || invalid("group_by", &value);
            let obj = value.as_object().ok_or_else(shape)?;
            only_keys(obj, &["column", "granularity"]).ok_or_else(shape)?;
            let granularity = match obj.get("granularity") {
                None | Some(Value::Null) => None,
                Some(Value::String(g)) => Some(g.clone()),
                Some(_) => return Err(shape()),
            };
            Ok(GroupBySpec {
                column: required_str(obj, "column").ok_or_else(shape)?,
                granularity,
            })
        }
    }
}

pub fn normalize_filter(input: FilterInput) -> QueryResult<FilterSpec> {
    match input {
        FilterInput::Spec(spec) => Ok(spec),
        FilterInput::Json(value) => {
            let shape = || invalid("filter", &value);
            let obj = value.as_object().ok_or_else(shape)?;
            only_keys(obj, &["column", "op", "value"]).ok_or_else(shape)?;
            let filter_value = match obj.get("value") {
                None => FilterValue::default(),
                Some(v) => filter_value(v).ok_or_else(shape)?,
            };
            Ok(FilterSpec {
                column: required_str(obj, "column").ok_or_else(shape)?,
                op: required_str(obj, "op").ok_or_else(shape)?,
                value: filter_value,
            })
        }
    }
}

/// Scalars and flat arrays of scalars. Nested arrays and objects are rejected.
fn filter_value(value: &Value) -> Option<FilterValue> {
    match value {
        Value::Array(items) => items
            .iter()
            .map(ParamValue::from_json)
            .collect::<Option<Vec<_>>>()
            .map(FilterValue::List),
        other => ParamValue::from_json(other).map(FilterValue::Scalar),
    }
}

fn required_str(obj: &Map<String, Value>, key: &str) -> Option<String> {
    obj.get(key).and_then(Value::as_str).map(str::to_string)
}

fn only_keys(obj: &Map<String, Value>, allowed: &[&str]) -> Option<()> {
    obj.keys()
        .all(|k| allowed.contains(&k.as_str()))
        .then_some(())
}

fn invalid(kind: &'static str, entry: &Value) -> QueryError {
    QueryError::InvalidInputShape {
        kind,
        entry: entry.to_string(),
    }
}

// ============================================================================
// Whole requests
// ============================================================================

/// A request as it arrives over the wire, entries not yet normalized.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RawRequest {
    pub metric: Value,
    #[serde(default)]
    pub group_by: Vec<Value>,
    #[serde(default)]
    pub filters: Vec<Value>,
    #[serde(default)]
    pub order_by: Option<String>,
    #[serde(default)]
    pub limit: Option<u64>,
}

impl RawRequest {
    pub fn from_json_str(source: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(source)
    }

    /// Normalize every entry, failing on the first one with an unknown shape.
    pub fn normalize(self) -> QueryResult<AnalyticsRequest> {
        let metric = normalize_metric(MetricInput::Json(self.metric))?;
        let group_by = self
            .group_by
            .into_iter()
            .map(|v| normalize_group_by(GroupByInput::Json(v)))
            .collect::<QueryResult<Vec<_>>>()?;
        let filters = self
            .filters
            .into_iter()
            .map(|v| normalize_filter(FilterInput::Json(v)))
            .collect::<QueryResult<Vec<_>>>()?;

        Ok(AnalyticsRequest {
            metric,
            group_by,
            filters,
            order_by: self.order_by,
            limit: self.limit,
        })
    }
}
