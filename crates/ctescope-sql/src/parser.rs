//! SQL parsing using datafusion-sqlparser-rs
//!
//! Parses query fragments into AST and provides error handling with
//! diagnostics.

use ctescope_core::{Diagnostic, DiagnosticCode, DialectConfig, Location, Severity};
use sqlparser::ast::{Query, Statement};
use sqlparser::dialect::{
    BigQueryDialect, Dialect, GenericDialect, MsSqlDialect, PostgreSqlDialect, SnowflakeDialect,
};
use sqlparser::parser::{Parser, ParserError};

/// SQL parser with configurable dialect
pub struct SqlParser {
    dialect: Box<dyn Dialect>,
}

impl SqlParser {
    /// Create a new SQL parser with the generic dialect
    pub fn new() -> Self {
        Self {
            dialect: Box::new(GenericDialect {}),
        }
    }

    /// Create a SQL parser for T-SQL
    pub fn mssql() -> Self {
        Self {
            dialect: Box::new(MsSqlDialect {}),
        }
    }

    /// Create a SQL parser for PostgreSQL
    pub fn postgres() -> Self {
        Self {
            dialect: Box::new(PostgreSqlDialect {}),
        }
    }

    /// Create a SQL parser for BigQuery
    pub fn bigquery() -> Self {
        Self {
            dialect: Box::new(BigQueryDialect {}),
        }
    }

    /// Create a SQL parser for Snowflake
    pub fn snowflake() -> Self {
        Self {
            dialect: Box::new(SnowflakeDialect {}),
        }
    }

    /// Create a parser from a dialect config
    pub fn from_dialect(dialect: DialectConfig) -> Self {
        match dialect {
            DialectConfig::Ansi => Self::new(),
            DialectConfig::MsSql => Self::mssql(),
            DialectConfig::Postgres => Self::postgres(),
            DialectConfig::BigQuery => Self::bigquery(),
            DialectConfig::Snowflake => Self::snowflake(),
        }
    }

    /// Parse one query fragment into AST
    ///
    /// `fragment` labels the source of the text (a CTE name or `main`) for
    /// error attribution.
    pub fn parse(&self, sql: &str, fragment: &str) -> Result<ParsedSql, ParseError> {
        match Parser::parse_sql(&*self.dialect, sql) {
            Ok(statements) => Ok(ParsedSql {
                sql: sql.to_string(),
                statements,
            }),
            Err(error) => Err(ParseError {
                fragment: fragment.to_string(),
                error,
            }),
        }
    }
}

impl Default for SqlParser {
    fn default() -> Self {
        Self::mssql()
    }
}

/// Successfully parsed fragment with AST
#[derive(Debug, Clone)]
pub struct ParsedSql {
    /// Original fragment text
    pub sql: String,

    /// Parsed statements
    pub statements: Vec<Statement>,
}

impl ParsedSql {
    /// Get the first statement (fragments are single statements)
    pub fn first_statement(&self) -> Option<&Statement> {
        self.statements.first()
    }

    /// Check if this is a SELECT-shaped statement
    pub fn is_select(&self) -> bool {
        matches!(self.first_statement(), Some(Statement::Query(_)))
    }

    /// Get the query if this is a SELECT-shaped statement
    pub fn as_query(&self) -> Option<&Query> {
        match self.first_statement() {
            Some(Statement::Query(query)) => Some(query.as_ref()),
            _ => None,
        }
    }

    /// Count the number of statements
    pub fn statement_count(&self) -> usize {
        self.statements.len()
    }
}

/// SQL parsing error with fragment attribution
#[derive(Debug)]
pub struct ParseError {
    /// Fragment the text came from (CTE name or `main`)
    pub fragment: String,

    /// Parser error from sqlparser
    pub error: ParserError,
}

impl ParseError {
    /// Convert to a diagnostic
    pub fn to_diagnostic(&self) -> Diagnostic {
        Diagnostic::new(
            DiagnosticCode::SqlParseError,
            Severity::Error,
            format!("Failed to parse SQL: {}", self.error),
        )
        .with_location(Location::new(self.fragment.clone()))
    }
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SQL parse error in {}: {}", self.fragment, self.error)
    }
}

impl std::error::Error for ParseError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ctescope_core::MAIN_QUERY;

    #[test]
    fn parse_simple_select() {
        let parser = SqlParser::default();
        let sql = "SELECT id, name FROM users WHERE active = 1";

        let parsed = parser.parse(sql, MAIN_QUERY).unwrap();
        assert_eq!(parsed.statement_count(), 1);
        assert!(parsed.is_select());
        assert!(parsed.as_query().is_some());
    }

    #[test]
    fn parse_three_part_names() {
        let parser = SqlParser::mssql();
        let sql = "SELECT * FROM db1.dbo.t1 t1 INNER JOIN dbo.t2 ON t2.id = t1.id";

        let parsed = parser.parse(sql, "c1").unwrap();
        assert!(parsed.is_select());
    }

    #[test]
    fn parse_union() {
        let parser = SqlParser::default();
        let sql = "SELECT id FROM a UNION SELECT id FROM b";

        let parsed = parser.parse(sql, MAIN_QUERY).unwrap();
        assert!(parsed.is_select());
    }

    #[test]
    fn parse_invalid_sql() {
        let parser = SqlParser::default();
        let err = parser.parse("SELECT FROM WHERE", "c2").unwrap_err();

        assert_eq!(err.fragment, "c2");

        let diag = err.to_diagnostic();
        assert_eq!(diag.code, DiagnosticCode::SqlParseError);
        assert_eq!(diag.severity, Severity::Error);
        assert_eq!(diag.location.unwrap().fragment, "c2");
    }

    #[test]
    fn different_dialects() {
        let sql = "SELECT id FROM users";

        for parser in [
            SqlParser::new(),
            SqlParser::mssql(),
            SqlParser::postgres(),
            SqlParser::bigquery(),
            SqlParser::snowflake(),
        ] {
            assert!(parser.parse(sql, MAIN_QUERY).is_ok());
        }
    }

    #[test]
    fn from_dialect_config() {
        let parser = SqlParser::from_dialect(DialectConfig::Postgres);
        assert!(parser.parse("SELECT 1", MAIN_QUERY).is_ok());
    }
}
