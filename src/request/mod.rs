//! Request normalization.

mod normalize;
mod types;

pub use normalize::{
    normalize_filter, normalize_group_by, normalize_metric, FilterInput, GroupByInput,
    MetricInput, RawRequest,
};
pub use types::{AnalyticsRequest, FilterSpec, FilterValue, GroupBySpec, MetricSpec};
