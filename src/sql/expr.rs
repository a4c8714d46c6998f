//! Expression AST - the core of SQL expression building.
//!
//! This module provides a strongly-typed AST for the expressions a compiled
//! analytics query can contain, with exhaustive pattern matching enforced by
//! the compiler. There is deliberately no raw-SQL variant: identifiers are
//! quoted by the dialect and caller values only appear as [`Expr::Param`].

use super::dialect::Dialect;
use super::param::ParamValue;
use super::query::SelectExpr;
use super::token::{Token, TokenStream};

// =============================================================================
// Expression AST
// =============================================================================

/// A SQL expression.
///
/// Every variant must be handled in `to_tokens()` - the compiler enforces this.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Column reference: optional_table.column
    Column {
        table: Option<String>,
        column: String,
    },

    /// Trusted literal value (never caller input)
    Literal(Literal),

    /// Bound parameter, rendered as a placeholder
    Param(ParamValue),

    /// Binary operation: left op right
    BinaryOp {
        left: Box<Expr>,
        op: BinaryOperator,
        right: Box<Expr>,
    },

    /// Function call: name(args...)
    Function {
        name: String,
        args: Vec<Expr>,
        distinct: bool,
    },

    /// EXTRACT(part FROM expr)
    Extract { part: DatePart, expr: Box<Expr> },

    /// IN: expr IN (values...)
    In {
        expr: Box<Expr>,
        values: Vec<Expr>,
        negated: bool,
    },

    /// BETWEEN: expr BETWEEN low AND high
    Between {
        expr: Box<Expr>,
        low: Box<Expr>,
        high: Box<Expr>,
        negated: bool,
    },

    /// IS NULL / IS NOT NULL
    IsNull { expr: Box<Expr>, negated: bool },
}

/// Trusted literal values.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    String(String),
    Bool(bool),
}

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    // Comparison
    Eq,
    /// `<>`
    Ne,
    /// `!=`
    BangEq,
    Lt,
    Gt,
    Lte,
    Gte,
    // Logical
    And,
    // String
    Like,
    ILike,
}

/// Fields accepted by `EXTRACT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatePart {
    /// Day of week, 0 = Sunday
    Dow,
    Hour,
}

impl DatePart {
    pub fn keyword(&self) -> &'static str {
        match self {
            DatePart::Dow => "DOW",
            DatePart::Hour => "HOUR",
        }
    }
}

// =============================================================================
// Expression to Tokens
// =============================================================================

impl Expr {
    /// Convert this expression to a token stream (dialect-agnostic).
    pub fn to_tokens(&self) -> TokenStream {
        self.to_tokens_for_dialect(Dialect::default())
    }

    /// Convert this expression to a token stream for a specific dialect.
    pub fn to_tokens_for_dialect(&self, dialect: Dialect) -> TokenStream {
        let mut ts = TokenStream::new();

        match self {
            Expr::Column { table, column } => {
                if let Some(t) = table {
                    ts.push(Token::Ident(t.clone()));
                    ts.push(Token::Dot);
                }
                ts.push(Token::Ident(column.clone()));
            }

            Expr::Literal(lit) => {
                ts.push(match lit {
                    Literal::String(s) => Token::LitString(s.clone()),
                    Literal::Bool(true) => Token::True,
                    Literal::Bool(false) => Token::False,
                });
            }

            Expr::Param(value) => {
                ts.push(Token::Param(value.clone()));
            }

            Expr::BinaryOp { left, op, right } => {
                ts.append(&left.to_tokens_for_dialect(dialect));
                ts.space();
                ts.push(binary_op_to_token(*op));
                ts.space();
                ts.append(&right.to_tokens_for_dialect(dialect));
            }

            Expr::Function {
                name,
                args,
                distinct,
            } => {
                ts.push(Token::FunctionName(name.clone()));
                ts.lparen();
                if *distinct {
                    ts.push(Token::Distinct).space();
                }
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        ts.comma().space();
                    }
                    ts.append(&arg.to_tokens_for_dialect(dialect));
                }
                ts.rparen();
            }

            Expr::Extract { part, expr } => {
                ts.push(Token::Extract)
                    .lparen()
                    .push(Token::DatePart(part.keyword()))
                    .space()
                    .push(Token::From)
                    .space();
                ts.append(&expr.to_tokens_for_dialect(dialect));
                ts.rparen();
            }

            Expr::In {
                expr,
                values,
                negated,
            } => {
                // Empty IN list: "x IN ()" is invalid SQL
                // "x IN ()" should be FALSE, "x NOT IN ()" should be TRUE
                if values.is_empty() {
                    ts.push(if *negated { Token::True } else { Token::False });
                } else {
                    ts.append(&expr.to_tokens_for_dialect(dialect));
                    if *negated {
                        ts.space().push(Token::Not);
                    }
                    ts.space().push(Token::In).space().lparen();
                    for (i, val) in values.iter().enumerate() {
                        if i > 0 {
                            ts.comma().space();
                        }
                        ts.append(&val.to_tokens_for_dialect(dialect));
                    }
                    ts.rparen();
                }
            }

            Expr::Between {
                expr,
                low,
                high,
                negated,
            } => {
                ts.append(&expr.to_tokens_for_dialect(dialect));
                if *negated {
                    ts.space().push(Token::Not);
                }
                ts.space().push(Token::Between).space();
                ts.append(&low.to_tokens_for_dialect(dialect));
                ts.space().push(Token::And).space();
                ts.append(&high.to_tokens_for_dialect(dialect));
            }

            Expr::IsNull { expr, negated } => {
                ts.append(&expr.to_tokens_for_dialect(dialect));
                ts.space();
                ts.push(if *negated {
                    Token::IsNotNull
                } else {
                    Token::IsNull
                });
            }
        }

        ts
    }
}

fn binary_op_to_token(op: BinaryOperator) -> Token {
    match op {
        BinaryOperator::Eq => Token::Eq,
        BinaryOperator::Ne => Token::Ne,
        BinaryOperator::BangEq => Token::BangEq,
        BinaryOperator::Lt => Token::Lt,
        BinaryOperator::Gt => Token::Gt,
        BinaryOperator::Lte => Token::Lte,
        BinaryOperator::Gte => Token::Gte,
        BinaryOperator::And => Token::And,
        BinaryOperator::Like => Token::Like,
        BinaryOperator::ILike => Token::ILike,
    }
}

// =============================================================================
// Expression Constructors
// =============================================================================

/// Create a column reference.
pub fn col(name: &str) -> Expr {
    Expr::Column {
        table: None,
        column: name.into(),
    }
}

/// Create a qualified column reference (table.column).
pub fn table_col(table: &str, column: &str) -> Expr {
    Expr::Column {
        table: Some(table.into()),
        column: column.into(),
    }
}

/// Create a string literal.
pub fn lit_str(s: &str) -> Expr {
    Expr::Literal(Literal::String(s.into()))
}

/// Create a boolean literal.
pub fn lit_bool(b: bool) -> Expr {
    Expr::Literal(Literal::Bool(b))
}

/// Create a bound parameter.
pub fn param(value: impl Into<ParamValue>) -> Expr {
    Expr::Param(value.into())
}

/// Generic function call.
pub fn func(name: &str, args: Vec<Expr>) -> Expr {
    Expr::Function {
        name: name.into(),
        args,
        distinct: false,
    }
}

/// `DATE_TRUNC('unit', expr)`
pub fn date_trunc(unit: &str, expr: Expr) -> Expr {
    func("DATE_TRUNC", vec![lit_str(unit), expr])
}

/// `EXTRACT(part FROM expr)`
pub fn extract(part: DatePart, expr: Expr) -> Expr {
    Expr::Extract {
        part,
        expr: Box::new(expr),
    }
}

// =============================================================================
// Aggregate Functions
// =============================================================================

/// COUNT(expr)
pub fn count(expr: Expr) -> Expr {
    func("COUNT", vec![expr])
}

/// COUNT(DISTINCT expr)
pub fn count_distinct(expr: Expr) -> Expr {
    Expr::Function {
        name: "COUNT".into(),
        args: vec![expr],
        distinct: true,
    }
}

/// SUM(expr)
pub fn sum(expr: Expr) -> Expr {
    func("SUM", vec![expr])
}

/// AVG(expr)
pub fn avg(expr: Expr) -> Expr {
    func("AVG", vec![expr])
}

/// MIN(expr)
pub fn min(expr: Expr) -> Expr {
    func("MIN", vec![expr])
}

/// MAX(expr)
pub fn max(expr: Expr) -> Expr {
    func("MAX", vec![expr])
}

// =============================================================================
// Fluent Builder Trait
// =============================================================================

/// Extension methods for building expressions fluently.
pub trait ExprExt: Sized {
    fn into_expr(self) -> Expr;

    fn binary(self, op: BinaryOperator, other: impl Into<Expr>) -> Expr {
        Expr::BinaryOp {
            left: Box::new(self.into_expr()),
            op,
            right: Box::new(other.into()),
        }
    }

    /// `self = other`
    fn eq(self, other: impl Into<Expr>) -> Expr {
        self.binary(BinaryOperator::Eq, other)
    }

    /// `self AND other`
    fn and(self, other: impl Into<Expr>) -> Expr {
        self.binary(BinaryOperator::And, other)
    }

    /// `self IS NULL`
    fn is_null(self) -> Expr {
        Expr::IsNull {
            expr: Box::new(self.into_expr()),
            negated: false,
        }
    }

    /// `self IS NOT NULL`
    fn is_not_null(self) -> Expr {
        Expr::IsNull {
            expr: Box::new(self.into_expr()),
            negated: true,
        }
    }

    /// `self IN (values...)`
    fn in_list(self, values: Vec<Expr>) -> Expr {
        Expr::In {
            expr: Box::new(self.into_expr()),
            values,
            negated: false,
        }
    }

    /// `self NOT IN (values...)`
    fn not_in_list(self, values: Vec<Expr>) -> Expr {
        Expr::In {
            expr: Box::new(self.into_expr()),
            values,
            negated: true,
        }
    }

    /// `self BETWEEN low AND high`
    fn between(self, low: impl Into<Expr>, high: impl Into<Expr>) -> Expr {
        Expr::Between {
            expr: Box::new(self.into_expr()),
            low: Box::new(low.into()),
            high: Box::new(high.into()),
            negated: false,
        }
    }

    /// Alias for SELECT: `expr AS name`
    fn alias(self, name: &str) -> SelectExpr {
        SelectExpr::new(self.into_expr()).with_alias(name)
    }
}

impl ExprExt for Expr {
    fn into_expr(self) -> Expr {
        self
    }
}

// Caller-supplied values always become parameters.
impl From<ParamValue> for Expr {
    fn from(value: ParamValue) -> Self {
        Expr::Param(value)
    }
}

impl From<i64> for Expr {
    fn from(n: i64) -> Self {
        Expr::Param(ParamValue::Int(n))
    }
}

impl From<&str> for Expr {
    fn from(s: &str) -> Self {
        Expr::Param(ParamValue::Text(s.into()))
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn sql(expr: &Expr) -> String {
        expr.to_tokens().serialize(Dialect::Postgres)
    }

    #[test]
    fn test_column() {
        assert_eq!(sql(&col("name")), "\"name\"");
    }

    #[test]
    fn test_table_column() {
        assert_eq!(sql(&table_col("s", "total_amount")), "\"s\".\"total_amount\"");
    }

    #[test]
    fn test_binary_op_binds_param() {
        let expr = table_col("s", "store_id").eq(param(7));
        let rendered = expr.to_tokens().render(Dialect::Postgres);
        assert_eq!(rendered.sql, "\"s\".\"store_id\" = $1");
        assert_eq!(rendered.params, vec![ParamValue::Int(7)]);
    }

    #[test]
    fn test_count_distinct() {
        assert_eq!(
            sql(&count_distinct(table_col("s", "customer_id"))),
            "COUNT(DISTINCT \"s\".\"customer_id\")"
        );
    }

    #[test]
    fn test_date_trunc_uses_literal_unit() {
        let expr = date_trunc("month", table_col("s", "created_at"));
        let rendered = expr.to_tokens().render(Dialect::Postgres);
        assert_eq!(rendered.sql, "DATE_TRUNC('month', \"s\".\"created_at\")");
        assert!(rendered.params.is_empty());
    }

    #[test]
    fn test_extract() {
        assert_eq!(
            sql(&extract(DatePart::Dow, table_col("s", "created_at"))),
            "EXTRACT(DOW FROM \"s\".\"created_at\")"
        );
    }

    #[test]
    fn test_between() {
        let expr = table_col("s", "total_amount").between(param(10), param(20));
        assert_eq!(sql(&expr), "\"s\".\"total_amount\" BETWEEN $1 AND $2");
    }

    #[test]
    fn test_in_list() {
        let expr = table_col("ps", "product_id").in_list(vec![param(1), param(2)]);
        assert_eq!(sql(&expr), "\"ps\".\"product_id\" IN ($1, $2)");

        let expr = table_col("ps", "product_id").not_in_list(vec![param(1)]);
        assert_eq!(sql(&expr), "\"ps\".\"product_id\" NOT IN ($1)");
    }

    #[test]
    fn test_empty_in_list() {
        assert_eq!(sql(&col("x").in_list(vec![])), "false");
        assert_eq!(sql(&col("x").not_in_list(vec![])), "true");
    }

    #[test]
    fn test_is_null() {
        assert_eq!(sql(&col("email").is_null()), "\"email\" IS NULL");
        assert_eq!(sql(&col("email").is_not_null()), "\"email\" IS NOT NULL");
    }

    #[test]
    fn test_chained_and_numbers_params_left_to_right() {
        let expr = col("a").eq(param(1)).and(col("b").binary(BinaryOperator::Gt, param(2)));
        let rendered = expr.to_tokens().render(Dialect::Postgres);
        assert_eq!(rendered.sql, "\"a\" = $1 AND \"b\" > $2");
        assert_eq!(rendered.params, vec![ParamValue::Int(1), ParamValue::Int(2)]);
    }
}
