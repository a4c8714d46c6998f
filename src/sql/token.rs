//! SQL Tokens - the atomic units of SQL output.
//!
//! Tokens are dialect-agnostic representations that serialize
//! to dialect-specific strings. Values supplied by callers only ever
//! enter a stream as [`Token::Param`], which renders as a positional
//! placeholder while the value itself is collected into a parallel list.

use super::dialect::{Dialect, SqlDialect};
use super::param::ParamValue;

/// SQL Token - every possible element in a compiled statement.
///
/// Adding a new variant here will cause compile errors everywhere
/// it needs to be handled (exhaustive matching).
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // === Keywords ===
    Select,
    From,
    Where,
    And,
    Not,
    As,
    On,
    Join,
    Inner,
    GroupBy,
    OrderBy,
    Asc,
    Desc,
    Limit,
    In,
    Between,
    Like,
    ILike,
    IsNull,
    IsNotNull,
    Distinct,
    Extract,
    True,
    False,

    // === Punctuation ===
    Comma,
    Dot,
    LParen,
    RParen,

    // === Operators ===
    Eq,
    Ne,
    /// `!=`, kept distinct from `<>` so the caller's spelling survives.
    BangEq,
    Lt,
    Gt,
    Lte,
    Gte,

    // === Whitespace / Formatting ===
    Space,
    Newline,
    Indent(usize),

    // === Dynamic Content ===
    /// Identifier (table, column, alias), always quoted by the dialect.
    Ident(String),
    /// String literal. Only for trusted constants such as truncation units.
    LitString(String),
    /// Bound parameter, rendered as a placeholder.
    Param(ParamValue),

    // === Function Names ===
    /// Function name, rendered upper-cased.
    FunctionName(String),
    /// Date part keyword inside `EXTRACT(... FROM ...)`.
    DatePart(&'static str),
}

impl Token {
    /// Serialize this token to a string for the given dialect.
    ///
    /// `position` is the 1-based ordinal used when this token is a placeholder.
    pub fn serialize(&self, dialect: Dialect, position: usize) -> String {
        match self {
            // Keywords
            Token::Select => "SELECT".into(),
            Token::From => "FROM".into(),
            Token::Where => "WHERE".into(),
            Token::And => "AND".into(),
            Token::Not => "NOT".into(),
            Token::As => "AS".into(),
            Token::On => "ON".into(),
            Token::Join => "JOIN".into(),
            Token::Inner => "INNER".into(),
            Token::GroupBy => "GROUP BY".into(),
            Token::OrderBy => "ORDER BY".into(),
            Token::Asc => "ASC".into(),
            Token::Desc => "DESC".into(),
            Token::Limit => "LIMIT".into(),
            Token::In => "IN".into(),
            Token::Between => "BETWEEN".into(),
            Token::Like => "LIKE".into(),
            Token::ILike => "ILIKE".into(),
            Token::IsNull => "IS NULL".into(),
            Token::IsNotNull => "IS NOT NULL".into(),
            Token::Distinct => "DISTINCT".into(),
            Token::Extract => "EXTRACT".into(),
            Token::True => dialect.format_bool(true).into(),
            Token::False => dialect.format_bool(false).into(),

            // Punctuation
            Token::Comma => ",".into(),
            Token::Dot => ".".into(),
            Token::LParen => "(".into(),
            Token::RParen => ")".into(),

            // Operators
            Token::Eq => "=".into(),
            Token::Ne => "<>".into(),
            Token::BangEq => "!=".into(),
            Token::Lt => "<".into(),
            Token::Gt => ">".into(),
            Token::Lte => "<=".into(),
            Token::Gte => ">=".into(),

            // Whitespace
            Token::Space => " ".into(),
            Token::Newline => "\n".into(),
            Token::Indent(n) => "  ".repeat(*n),

            // Dynamic - dialect-specific formatting
            Token::Ident(name) => dialect.quote_identifier(name),
            Token::LitString(s) => dialect.quote_string(s),
            Token::Param(_) => dialect.placeholder(position),

            Token::FunctionName(name) => name.to_uppercase(),
            Token::DatePart(part) => (*part).into(),
        }
    }
}

/// SQL text plus the values bound to its placeholders, in placeholder order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderedSql {
    pub sql: String,
    pub params: Vec<ParamValue>,
}

/// A stream of tokens that can be serialized to SQL.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TokenStream {
    tokens: Vec<Token>,
}

impl TokenStream {
    /// Create an empty token stream.
    pub fn new() -> Self {
        Self { tokens: vec![] }
    }

    /// Push a single token.
    pub fn push(&mut self, token: Token) -> &mut Self {
        self.tokens.push(token);
        self
    }

    /// Extend with multiple tokens.
    pub fn extend(&mut self, tokens: impl IntoIterator<Item = Token>) -> &mut Self {
        self.tokens.extend(tokens);
        self
    }

    /// Append another token stream.
    pub fn append(&mut self, other: &TokenStream) -> &mut Self {
        self.tokens.extend(other.tokens.iter().cloned());
        self
    }

    /// Render to SQL text and collect bound parameters in a single pass.
    ///
    /// Placeholders are numbered in the order they appear in the text, and
    /// the n-th placeholder always binds `params[n - 1]`.
    pub fn render(&self, dialect: Dialect) -> RenderedSql {
        let mut rendered = RenderedSql::default();
        for token in &self.tokens {
            if let Token::Param(value) = token {
                rendered.params.push(value.clone());
            }
            let position = rendered.params.len();
            rendered.sql.push_str(&token.serialize(dialect, position));
        }
        rendered
    }

    /// Serialize all tokens to a SQL string, discarding bound values.
    pub fn serialize(&self, dialect: Dialect) -> String {
        self.render(dialect).sql
    }

    /// Number of placeholder tokens in the stream.
    pub fn param_count(&self) -> usize {
        self.tokens
            .iter()
            .filter(|t| matches!(t, Token::Param(_)))
            .count()
    }

    // Convenience methods for common tokens
    pub fn space(&mut self) -> &mut Self {
        self.push(Token::Space)
    }
    pub fn newline(&mut self) -> &mut Self {
        self.push(Token::Newline)
    }
    pub fn indent(&mut self, n: usize) -> &mut Self {
        self.push(Token::Indent(n))
    }
    pub fn comma(&mut self) -> &mut Self {
        self.push(Token::Comma)
    }
    pub fn lparen(&mut self) -> &mut Self {
        self.push(Token::LParen)
    }
    pub fn rparen(&mut self) -> &mut Self {
        self.push(Token::RParen)
    }
}
