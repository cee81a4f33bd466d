//! CTE segmentation
//!
//! Splits `WITH c1 AS (...), c2 AS (...) SELECT ...` into independently
//! parseable CTE bodies and the residual main query. The boundary between
//! the CTE list and the main query is derived purely from parenthesis depth,
//! never from keyword matching: a CTE body may contain `SELECT`, `UNION`,
//! commas, and arbitrarily nested parentheses without confusing the scan.

use ctescope_core::{
    CteDefinition, Diagnostic, DiagnosticCode, Location, SegmentedQuery, Severity, MAIN_QUERY,
};
use regex::Regex;

/// Errors produced when input does not match the expected query shape
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SegmentationError {
    #[error("input contains no query text")]
    EmptyInput,

    #[error("WITH clause contains no CTE definition")]
    MissingCte,

    #[error("unbalanced parenthesis at offset {offset}")]
    UnbalancedParens { offset: usize },

    #[error("CTE definition does not match `name AS ( body )`: {text}")]
    MalformedCte { text: String },

    #[error("no main query follows the CTE list")]
    MissingMainQuery,
}

impl SegmentationError {
    /// Convert to a diagnostic attributed to the main query fragment
    pub fn to_diagnostic(&self) -> Diagnostic {
        let diag = Diagnostic::new(
            DiagnosticCode::CteSegmentationError,
            Severity::Error,
            self.to_string(),
        );

        match self {
            Self::UnbalancedParens { offset } => {
                diag.with_location(Location::with_offset(MAIN_QUERY, *offset))
            }
            _ => diag.with_location(Location::new(MAIN_QUERY)),
        }
    }
}

/// Collapse all whitespace runs (including newlines) to a single space
/// and trim the ends
///
/// Segmentation always operates on normalized text, so
/// `segment(sql) == segment(&normalize_whitespace(sql))` for any input.
pub fn normalize_whitespace(sql: &str) -> String {
    let ws = Regex::new(r"\s+").unwrap();
    ws.replace_all(sql.trim(), " ").into_owned()
}

/// Split raw SQL into CTE definitions and the main query
///
/// Input without a leading `WITH` keyword is treated as a plain query:
/// zero CTEs, the whole input as the main query.
pub fn segment(sql: &str) -> Result<SegmentedQuery, SegmentationError> {
    let normalized = normalize_whitespace(sql);
    if normalized.is_empty() {
        return Err(SegmentationError::EmptyInput);
    }

    let Some(list_offset) = with_keyword_end(&normalized) else {
        return Ok(SegmentedQuery::new(Vec::new(), normalized));
    };

    let region = &normalized[list_offset..];
    let bytes = region.as_bytes();

    let mut ctes = Vec::new();
    let mut depth = 0usize;
    let mut unit_start = 0usize;
    let mut main_start = None;

    // Parenthesis positions are ASCII, so byte indices are always valid
    // slice boundaries here.
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'(' => depth += 1,
            b')' => {
                if depth == 0 {
                    return Err(SegmentationError::UnbalancedParens {
                        offset: list_offset + i,
                    });
                }
                depth -= 1;
                if depth == 0 {
                    // One complete `name AS ( body )` unit, nested parens and all.
                    ctes.push(parse_cte_unit(&region[unit_start..=i])?);

                    // Depth is back to zero: the next non-space character decides
                    // between another list entry and the start of the main query.
                    let mut j = i + 1;
                    while j < bytes.len() && bytes[j] == b' ' {
                        j += 1;
                    }
                    if j < bytes.len() && bytes[j] == b',' {
                        unit_start = j + 1;
                        i = j;
                    } else if j < bytes.len() && bytes[j] == b')' {
                        return Err(SegmentationError::UnbalancedParens {
                            offset: list_offset + j,
                        });
                    } else {
                        main_start = Some(j);
                        break;
                    }
                }
            }
            _ => {}
        }
        i += 1;
    }

    let Some(main_start) = main_start else {
        if depth > 0 {
            return Err(SegmentationError::UnbalancedParens {
                offset: normalized.len(),
            });
        }
        if ctes.is_empty() {
            return Err(SegmentationError::MissingCte);
        }
        // A comma promised another list entry that never closed.
        return Err(SegmentationError::MalformedCte {
            text: region[unit_start..].trim().to_string(),
        });
    };

    let main_query = region[main_start..].trim();
    if main_query.is_empty() {
        return Err(SegmentationError::MissingMainQuery);
    }

    Ok(SegmentedQuery::new(ctes, main_query))
}

/// Offset just past the leading `WITH ` keyword, if present
fn with_keyword_end(normalized: &str) -> Option<usize> {
    let bytes = normalized.as_bytes();
    if bytes.len() > 5 && normalized[..4].eq_ignore_ascii_case("with") && bytes[4] == b' ' {
        Some(5)
    } else {
        None
    }
}

/// Extract the identifier before `AS` and the body between the outermost
/// parentheses from one depth-closed CTE unit
fn parse_cte_unit(unit: &str) -> Result<CteDefinition, SegmentationError> {
    // Greedy `.*` runs to the unit's own closing parenthesis, keeping any
    // nested pairs inside the body capture.
    let pattern = Regex::new(r"(?i)^\s*([A-Za-z0-9_]+)\s+AS\s*\((.*)\)\s*$").unwrap();

    let captures = pattern
        .captures(unit)
        .ok_or_else(|| SegmentationError::MalformedCte {
            text: unit.trim().to_string(),
        })?;

    Ok(CteDefinition::new(
        captures[1].trim(),
        captures[2].trim(),
    ))
}
