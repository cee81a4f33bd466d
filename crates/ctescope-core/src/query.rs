//! Domain model for segmented queries and table references

use serde::{Deserialize, Serialize};

/// Reserved fragment label for the residual main query
///
/// CTE names are ordinary SQL identifiers; the segmenter rejects inputs
/// whose main query is missing, so the label never collides with a CTE
/// in practice and is only used for reporting.
pub const MAIN_QUERY: &str = "main";

/// One named CTE definition produced by the segmenter
///
/// `body` is the text enclosed by the CTE's outermost matching parentheses,
/// trimmed, and is independently parseable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CteDefinition {
    /// Identifier preceding `AS`
    pub name: String,

    /// Query text between the outermost parentheses
    pub body: String,
}

impl CteDefinition {
    /// Create a new CTE definition
    pub fn new(name: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            body: body.into(),
        }
    }
}

/// Result of segmenting a `WITH` query
///
/// `ctes` preserves the left-to-right textual order of the definitions;
/// `main_query` is trimmed and non-empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentedQuery {
    /// CTE definitions in declaration order
    pub ctes: Vec<CteDefinition>,

    /// Text of the residual main query
    pub main_query: String,
}

impl SegmentedQuery {
    /// Create a segmented query from its parts
    pub fn new(ctes: Vec<CteDefinition>, main_query: impl Into<String>) -> Self {
        Self {
            ctes,
            main_query: main_query.into(),
        }
    }

    /// Look up a CTE body by name
    pub fn cte(&self, name: &str) -> Option<&CteDefinition> {
        self.ctes.iter().find(|c| c.name == name)
    }

    /// Iterate every fragment as `(label, sql)` pairs
    ///
    /// CTEs come first in declaration order, the main query last under the
    /// [`MAIN_QUERY`] label. This is the order the analyzer processes them in.
    pub fn fragments(&self) -> impl Iterator<Item = (&str, &str)> {
        self.ctes
            .iter()
            .map(|c| (c.name.as_str(), c.body.as_str()))
            .chain(std::iter::once((MAIN_QUERY, self.main_query.as_str())))
    }

    /// Number of fragments (CTEs plus the main query)
    pub fn fragment_count(&self) -> usize {
        self.ctes.len() + 1
    }
}

/// One base-table mention resolved to at most three name components
///
/// Invariant: `alias` is always populated - when no explicit alias exists it
/// equals the unqualified table name. `database` and `schema` are `None`
/// when the source name had fewer than three components; absence is never
/// encoded as a sentinel string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableReference {
    /// Database component of a three-part name
    pub database: Option<String>,

    /// Schema component of a two- or three-part name
    pub schema: Option<String>,

    /// Table name (always the last component)
    pub table: String,

    /// Explicit alias, or the table name when none was written
    pub alias: String,
}

impl TableReference {
    /// Resolve dot-separated name components and an optional alias
    ///
    /// 3 parts -> (database, schema, table); 2 parts -> (schema, table);
    /// 1 part -> (table). Component counts outside 1-3 are not resolvable
    /// and return `None`.
    pub fn from_parts(parts: &[String], alias: Option<&str>) -> Option<Self> {
        let (database, schema, table) = match parts {
            [table] => (None, None, table.clone()),
            [schema, table] => (None, Some(schema.clone()), table.clone()),
            [database, schema, table] => {
                (Some(database.clone()), Some(schema.clone()), table.clone())
            }
            _ => return None,
        };

        let alias = alias.map(str::to_string).unwrap_or_else(|| table.clone());

        Some(Self {
            database,
            schema,
            table,
            alias,
        })
    }

    /// Render the dotted qualified name as written
    pub fn qualified_name(&self) -> String {
        match (&self.database, &self.schema) {
            (Some(db), Some(schema)) => format!("{}.{}.{}", db, schema, self.table),
            (None, Some(schema)) => format!("{}.{}", schema, self.table),
            _ => self.table.clone(),
        }
    }

    /// Whether the reference carries an alias distinct from the table name
    pub fn has_explicit_alias(&self) -> bool {
        self.alias != self.table
    }
}

impl std::fmt::Display for TableReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} AS {}", self.qualified_name(), self.alias)
    }
}
