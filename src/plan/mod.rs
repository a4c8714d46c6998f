//! Join resolution and clause builders.
//!
//! Each builder resolves columns through the registry and returns AST
//! fragments; nothing here produces SQL text directly.

pub mod filter;
pub mod joins;
pub mod order;
pub mod select;

pub use filter::{build_condition, build_where, FilterOperator};
pub use joins::{resolve_joins, JoinResolver};
pub use order::{build_order_by, parse_direction};
pub use select::{build_select, Granularity, SelectClause};

/// Alias of the time-bucketed grouping expression.
pub const DATE_GROUP_ALIAS: &str = "date_group_field";

/// Alias of the aggregate.
pub const METRIC_ALIAS: &str = "metric_result";
