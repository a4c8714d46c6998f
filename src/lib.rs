//! # salesql
//!
//! Compiles constrained analytics requests into parameterized SQL over a
//! fixed, allow-listed schema.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │          Request (metric, group_by, filters, ...)        │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [request]
//! ┌─────────────────────────────────────────────────────────┐
//! │          AnalyticsRequest (canonical specs)              │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [validate, against schema]
//! ┌─────────────────────────────────────────────────────────┐
//! │      Join resolution + SELECT / WHERE / ORDER BY         │
//! │                     [plan]                               │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [compile, sql]
//! ┌─────────────────────────────────────────────────────────┐
//! │           QueryPlan (SQL text + ordered params)          │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! User values never appear in SQL text. Every one of them is a placeholder
//! with a matching entry in [`QueryPlan::params`], and the row limit is
//! always the last one.

pub mod compile;
pub mod config;
pub mod error;
pub mod plan;
pub mod request;
pub mod schema;
pub mod sql;
pub mod validate;

// Re-export SQL submodules at crate level
pub use sql::dialect;
pub use sql::expr;
pub use sql::query;
pub use sql::token;

/// Re-exports for convenient usage.
pub mod prelude {
    pub use crate::compile::{CompileOptions, Compiler, QueryPlan};
    pub use crate::dialect::{Dialect, SqlDialect};
    pub use crate::error::{ColumnRole, QueryError, QueryResult};
    pub use crate::plan::{DATE_GROUP_ALIAS, METRIC_ALIAS};
    pub use crate::request::{
        AnalyticsRequest, FilterSpec, FilterValue, GroupBySpec, MetricSpec, RawRequest,
    };
    pub use crate::schema::{sales_registry, SchemaError, SchemaRegistry, TableDef};
    pub use crate::sql::ParamValue;
}

// Also export at crate root for convenience
pub use compile::{CompileOptions, Compiler, QueryPlan};
pub use dialect::Dialect;
pub use error::{QueryError, QueryResult};
