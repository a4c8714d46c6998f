//! Canonical request types.
//!
//! Whatever shape a caller sends, the normalizer reduces it to these before
//! anything else looks at it.

use serde::{Deserialize, Serialize};

use crate::sql::ParamValue;

/// The single aggregate a query computes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricSpec {
    /// Aggregate function name as supplied, e.g. `"sum"` or `"COUNT DISTINCT"`.
    pub func: String,
    pub column: String,
}

impl MetricSpec {
    pub fn new(func: &str, column: &str) -> Self {
        Self {
            func: func.into(),
            column: column.into(),
        }
    }
}

/// One grouping key, optionally time-truncated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupBySpec {
    pub column: String,
    #[serde(default)]
    pub granularity: Option<String>,
}

impl GroupBySpec {
    pub fn column(column: &str) -> Self {
        Self {
            column: column.into(),
            granularity: None,
        }
    }

    pub fn truncated(column: &str, granularity: &str) -> Self {
        Self {
            column: column.into(),
            granularity: Some(granularity.into()),
        }
    }
}

/// Right-hand side of a filter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterValue {
    Scalar(ParamValue),
    List(Vec<ParamValue>),
}

impl FilterValue {
    /// Number of values carried, as reported in arity errors.
    pub fn describe(&self) -> String {
        match self {
            FilterValue::Scalar(v) => format!("a single {} value", v.kind()),
            FilterValue::List(items) => format!("a list of {}", items.len()),
        }
    }
}

impl Default for FilterValue {
    fn default() -> Self {
        FilterValue::Scalar(ParamValue::Null)
    }
}

impl From<ParamValue> for FilterValue {
    fn from(value: ParamValue) -> Self {
        FilterValue::Scalar(value)
    }
}

impl<T: Into<ParamValue>> From<Vec<T>> for FilterValue {
    fn from(values: Vec<T>) -> Self {
        FilterValue::List(values.into_iter().map(Into::into).collect())
    }
}

/// One predicate. Filters are ANDed in request order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterSpec {
    pub column: String,
    pub op: String,
    #[serde(default)]
    pub value: FilterValue,
}

impl FilterSpec {
    pub fn new(column: &str, op: &str, value: impl Into<FilterValue>) -> Self {
        Self {
            column: column.into(),
            op: op.into(),
            value: value.into(),
        }
    }

    /// A filter whose operator takes no value (`IS NULL`, `IS NOT NULL`).
    pub fn unary(column: &str, op: &str) -> Self {
        Self {
            column: column.into(),
            op: op.into(),
            value: FilterValue::default(),
        }
    }
}

/// A normalized analytics request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsRequest {
    pub metric: MetricSpec,
    #[serde(default)]
    pub group_by: Vec<GroupBySpec>,
    #[serde(default)]
    pub filters: Vec<FilterSpec>,
    #[serde(default)]
    pub order_by: Option<String>,
    /// Row limit. `None` takes the compiler's configured default.
    #[serde(default)]
    pub limit: Option<u64>,
}

impl AnalyticsRequest {
    pub fn new(metric: MetricSpec) -> Self {
        Self {
            metric,
            group_by: Vec::new(),
            filters: Vec::new(),
            order_by: None,
            limit: None,
        }
    }

    pub fn group_by(mut self, item: GroupBySpec) -> Self {
        self.group_by.push(item);
        self
    }

    pub fn filter(mut self, item: FilterSpec) -> Self {
        self.filters.push(item);
        self
    }

    pub fn order_by(mut self, order_by: &str) -> Self {
        self.order_by = Some(order_by.into());
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Distinct columns referenced anywhere in the request, in first-seen order.
    pub fn referenced_columns(&self) -> Vec<&str> {
        let mut seen = Vec::new();
        let all = std::iter::once(self.metric.column.as_str())
            .chain(self.group_by.iter().map(|g| g.column.as_str()))
            .chain(self.filters.iter().map(|f| f.column.as_str()));
        for column in all {
            if !seen.contains(&column) {
                seen.push(column);
            }
        }
        seen
    }
}
