//! SQL generation module.
//!
//! This module provides a type-safe SQL builder that renders parameterized
//! SQL. It includes:
//!
//! - [`query`] - SELECT query builder
//! - [`expr`] - Expression AST and builder DSL
//! - [`param`] - Values bound to placeholders
//! - [`token`] - Token types and the single renderer for SQL text + params
//! - [`dialect`] - SQL dialect implementations

pub mod dialect;
pub mod expr;
pub mod param;
pub mod query;
pub mod token;

#[cfg(test)]
pub mod test_utils;

// Re-export commonly used types at the sql module level
pub use dialect::{Dialect, SqlDialect};
pub use expr::{
    avg, col, count, count_distinct, date_trunc, extract, func, lit_bool, lit_str, max, min,
    param, sum, table_col, BinaryOperator, DatePart, Expr, ExprExt, Literal,
};
pub use param::ParamValue;
pub use query::{Join, OrderByExpr, Query, SelectExpr, SortDir, TableRef};
pub use token::{RenderedSql, Token, TokenStream};
