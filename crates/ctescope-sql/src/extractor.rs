//! Qualified table-reference extraction
//!
//! Recursively walks a parsed statement - joins, parenthesized table groups,
//! scalar subqueries, set operations - and collects every base-table
//! reference with its database, schema, table, and alias. Extraction is
//! best-effort over a richer grammar than is modeled: statement shapes
//! outside the capability set contribute no references, and table
//! expressions that cannot be resolved are surfaced as warn diagnostics
//! instead of errors.

use ctescope_core::{Diagnostic, DiagnosticCode, Location, Severity, TableReference};
use sqlparser::ast::{
    Expr, Query, Select, SelectItem, SetExpr, Statement, TableFactor, TableWithJoins,
};

/// Stateful walker collecting table references in traversal order
///
/// The output order is deterministic: a left-to-right depth-first walk of
/// the FROM clause (joins before post-join siblings, left before right in
/// each join and set operation), with FROM-clause references preceding
/// projection-subquery references inside each SELECT.
#[derive(Debug, Default)]
pub struct ReferenceExtractor {
    references: Vec<TableReference>,
    diagnostics: Vec<Diagnostic>,
    fragment: Option<String>,
}

impl ReferenceExtractor {
    /// Create an extractor with no fragment attribution
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an extractor whose diagnostics name the given fragment
    pub fn for_fragment(fragment: impl Into<String>) -> Self {
        Self {
            fragment: Some(fragment.into()),
            ..Self::default()
        }
    }

    /// Walk one parsed statement, appending to the collected references
    ///
    /// Statements that are not SELECT-shaped contribute no references.
    pub fn extract(&mut self, statement: &Statement) {
        match statement {
            Statement::Query(query) => self.extract_query(query),
            other => {
                tracing::debug!(statement = %other, "ignoring non-query statement");
            }
        }
    }

    /// References collected so far, in traversal order
    pub fn references(&self) -> &[TableReference] {
        &self.references
    }

    /// Diagnostics for table expressions that could not be resolved
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Number of table expressions skipped as unresolvable
    pub fn unresolved_count(&self) -> usize {
        self.diagnostics.len()
    }

    /// Consume the extractor, yielding references and diagnostics
    pub fn into_parts(self) -> (Vec<TableReference>, Vec<Diagnostic>) {
        (self.references, self.diagnostics)
    }

    fn extract_query(&mut self, query: &Query) {
        self.extract_set_expr(&query.body);
    }

    fn extract_set_expr(&mut self, set_expr: &SetExpr) {
        match set_expr {
            SetExpr::Select(select) => self.extract_select(select),
            SetExpr::Query(query) => self.extract_query(query),
            SetExpr::SetOperation { left, right, .. } => {
                // UNION and friends: left branch first, then right.
                self.extract_set_expr(left);
                self.extract_set_expr(right);
            }
            _ => {}
        }
    }

    fn extract_select(&mut self, select: &Select) {
        for table_with_joins in &select.from {
            self.extract_table_with_joins(table_with_joins);
        }

        // Scalar subqueries in the output list flatten into the same
        // sequence, after the FROM-clause references.
        for item in &select.projection {
            let expr = match item {
                SelectItem::UnnamedExpr(expr) => expr,
                SelectItem::ExprWithAlias { expr, .. } => expr,
                _ => continue,
            };

            if let Expr::Subquery(query) = expr {
                self.extract_query(query);
            }
        }
    }

    fn extract_table_with_joins(&mut self, table_with_joins: &TableWithJoins) {
        self.extract_table_factor(&table_with_joins.relation);

        // sqlparser flattens `a JOIN b JOIN c` into a base relation plus an
        // ordered join list; join kind never affects extraction.
        for join in &table_with_joins.joins {
            self.extract_table_factor(&join.relation);
        }
    }

    fn extract_table_factor(&mut self, factor: &TableFactor) {
        match factor {
            TableFactor::Table { name, alias, .. } => {
                let parts: Vec<String> =
                    name.0.iter().map(|ident| ident.value.clone()).collect();
                let alias = alias.as_ref().map(|a| a.name.value.as_str());

                match TableReference::from_parts(&parts, alias) {
                    Some(reference) => self.references.push(reference),
                    None => self.record_unresolved(&format!(
                        "table name with {} components",
                        parts.len()
                    )),
                }
            }
            TableFactor::NestedJoin {
                table_with_joins, ..
            } => {
                // Parenthesized table group: recurse, emit nothing for the
                // group itself.
                self.extract_table_with_joins(table_with_joins);
            }
            other => self.record_unresolved(table_factor_kind(other)),
        }
    }

    fn record_unresolved(&mut self, kind: &str) {
        tracing::warn!(kind, "skipping unresolvable table expression");

        let mut diagnostic = Diagnostic::new(
            DiagnosticCode::SqlUnresolvedTableExpr,
            Severity::Warn,
            format!("skipped {} in FROM clause", kind),
        );
        if let Some(fragment) = &self.fragment {
            diagnostic = diagnostic.with_location(Location::new(fragment.clone()));
        }

        self.diagnostics.push(diagnostic);
    }
}

/// Extract every table reference from one parsed statement
///
/// Convenience wrapper over [`ReferenceExtractor`] that discards the
/// unresolved-expression diagnostics.
pub fn extract_references(statement: &Statement) -> Vec<TableReference> {
    let mut extractor = ReferenceExtractor::new();
    extractor.extract(statement);
    extractor.into_parts().0
}

/// Human-readable name for a table-factor variant outside the modeled set
fn table_factor_kind(factor: &TableFactor) -> &'static str {
    match factor {
        TableFactor::Table { .. } => "table",
        TableFactor::Derived { .. } => "derived subquery",
        TableFactor::TableFunction { .. } => "table function",
        TableFactor::UNNEST { .. } => "UNNEST",
        TableFactor::JsonTable { .. } => "JSON_TABLE",
        TableFactor::NestedJoin { .. } => "nested join",
        TableFactor::Pivot { .. } => "PIVOT",
        TableFactor::Unpivot { .. } => "UNPIVOT",
        _ => "unrecognized table expression",
    }
}
