//! End-to-end compilation from an analytics request to parameterized SQL.
//!
//! ```text
//! RawRequest ─normalize─▶ AnalyticsRequest ─validate─▶ resolve joins
//!     ─▶ SELECT / GROUP BY ─▶ WHERE ─▶ ORDER BY ─▶ assemble ─▶ QueryPlan
//! ```
//!
//! # Example
//!
//! ```ignore
//! use salesql::compile::Compiler;
//! use salesql::request::{AnalyticsRequest, GroupBySpec, MetricSpec};
//! use salesql::schema::sales_registry;
//!
//! let compiler = Compiler::new(sales_registry()?);
//! let request = AnalyticsRequest::new(MetricSpec::new("SUM", "total_amount"))
//!     .group_by(GroupBySpec::truncated("created_at", "month"))
//!     .limit(10);
//!
//! let plan = compiler.compile(&request)?;
//! println!("{}", plan.sql);
//! ```

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::{QueryError, QueryResult};
use crate::plan::{build_order_by, build_select, build_where, resolve_joins};
use crate::request::{AnalyticsRequest, RawRequest};
use crate::schema::SchemaRegistry;
use crate::sql::query::{Query, TableRef};
use crate::sql::{Dialect, ParamValue};
use crate::validate::validate_request;

/// Limit applied when a request does not carry one.
pub const DEFAULT_LIMIT: u64 = 100;

// ============================================================================
// Options
// ============================================================================

/// Options for compilation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompileOptions {
    /// SQL dialect to generate.
    pub dialect: Dialect,
    /// Row limit for requests without one.
    pub default_limit: u64,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            dialect: Dialect::Postgres,
            default_limit: DEFAULT_LIMIT,
        }
    }
}

impl CompileOptions {
    /// Set the SQL dialect.
    pub fn with_dialect(mut self, dialect: Dialect) -> Self {
        self.dialect = dialect;
        self
    }

    pub fn with_default_limit(mut self, limit: u64) -> Self {
        self.default_limit = limit;
        self
    }
}

// ============================================================================
// Result Types
// ============================================================================

/// A compiled request: SQL text plus the values bound to its placeholders.
///
/// The limit is always the last parameter.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryPlan {
    pub sql: String,
    pub params: Vec<ParamValue>,
    pub dialect: Dialect,

    /// The query AST, for callers that want to inspect it.
    #[serde(skip)]
    pub query: Query,
}

impl QueryPlan {
    /// Number of placeholders the SQL text contains. Always equals `params.len()`.
    pub fn placeholder_count(&self) -> usize {
        self.query.to_tokens_for_dialect(self.dialect).param_count()
    }
}

// ============================================================================
// Compiler
// ============================================================================

/// Compiles requests against one schema. Cheap to clone and safe to share.
#[derive(Debug, Clone)]
pub struct Compiler {
    registry: Arc<SchemaRegistry>,
    options: CompileOptions,
}

impl Compiler {
    pub fn new(registry: Arc<SchemaRegistry>) -> Self {
        Self {
            registry,
            options: CompileOptions::default(),
        }
    }

    pub fn with_options(mut self, options: CompileOptions) -> Self {
        self.options = options;
        self
    }

    pub fn registry(&self) -> &SchemaRegistry {
        &self.registry
    }

    pub fn options(&self) -> CompileOptions {
        self.options
    }

    /// Normalize and compile a wire-format request.
    pub fn compile_raw(&self, raw: RawRequest) -> QueryResult<QueryPlan> {
        let request = raw.normalize().inspect_err(|e| warn!(error = %e, "rejected request"))?;
        self.compile(&request)
    }

    /// Compile a normalized request.
    pub fn compile(&self, request: &AnalyticsRequest) -> QueryResult<QueryPlan> {
        self.build_query(request)
            .inspect_err(|e| warn!(error = %e, "rejected request"))
            .map(|query| {
                let rendered = query.render(self.options.dialect);
                info!(
                    dialect = %self.options.dialect,
                    joins = query.joins.len(),
                    params = rendered.params.len(),
                    "built query plan"
                );
                QueryPlan {
                    sql: rendered.sql,
                    params: rendered.params,
                    dialect: self.options.dialect,
                    query,
                }
            })
    }

    /// Run every check without rendering SQL.
    pub fn check(&self, request: &AnalyticsRequest) -> QueryResult<()> {
        self.build_query(request).map(|_| ())
    }

    fn build_query(&self, request: &AnalyticsRequest) -> QueryResult<Query> {
        let registry = self.registry.as_ref();
        debug!(
            metric = %request.metric.func,
            column = %request.metric.column,
            group_by = request.group_by.len(),
            filters = request.filters.len(),
            "compiling request"
        );

        let function = validate_request(registry, request)?;

        let joins = resolve_joins(registry, &request.referenced_columns())?;
        debug!(
            joins = ?joins.iter().map(|t| t.name.as_str()).collect::<Vec<_>>(),
            "resolved joins"
        );

        let select = build_select(registry, &request.group_by, &request.metric, function)?;
        let condition = build_where(registry, &request.filters)?;
        let order = build_order_by(request.order_by.as_deref(), &select)?;
        let limit = request.limit.unwrap_or(self.options.default_limit);
        let limit = i64::try_from(limit).map_err(|_| QueryError::LimitOutOfRange(limit))?;

        let main = registry.main();
        let mut query = Query::new()
            .select(select.items)
            .from(TableRef::new(&main.name).with_alias(&main.alias));
        for join in joins {
            query = query.inner_join(
                TableRef::new(&join.name).with_alias(&join.alias),
                join.on.to_expr(),
            );
        }

        Ok(query
            .filter(condition)
            .group_by(select.group_by)
            .order_by(vec![order])
            .limit(ParamValue::Int(limit)))
    }
}
