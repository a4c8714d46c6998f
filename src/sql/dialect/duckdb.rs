//! DuckDB SQL dialect.
//!
//! DuckDB is PostgreSQL-compatible for everything the compiler emits:
//! - ANSI identifier quoting (`"`)
//! - `DATE_TRUNC`, `EXTRACT(DOW FROM ...)`, `ILIKE`
//! - Anonymous `?` placeholders bound by position

use super::helpers;
use super::SqlDialect;

/// DuckDB SQL dialect.
#[derive(Debug, Clone, Copy)]
pub struct DuckDb;

impl SqlDialect for DuckDb {
    fn name(&self) -> &'static str {
        "duckdb"
    }

    fn quote_identifier(&self, ident: &str) -> String {
        helpers::quote_double(ident)
    }

    fn format_bool(&self, b: bool) -> &'static str {
        helpers::format_bool_literal(b)
    }

    fn placeholder(&self, position: usize) -> String {
        helpers::placeholder_question(position)
    }
}
