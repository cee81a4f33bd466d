//! Diagnostic codes and error reporting
//!
//! IMPORTANT: Diagnostic codes are versioned and stable.
//! NEVER rename or remove codes - they are part of the public API.
//! Add new codes with new names only.

use serde::{Deserialize, Serialize};

/// Diagnostic code registry (v1)
///
/// These codes are STABLE and VERSIONED.
/// Do NOT rename or remove codes - only add new ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DiagnosticCode {
    /// Input text could not be segmented into CTEs and a main query
    CteSegmentationError,

    /// A query fragment failed to parse
    SqlParseError,

    /// A table expression outside the modeled capability set was skipped
    SqlUnresolvedTableExpr,

    /// General informational message
    Info,

    /// General warning message
    Warning,
}

impl DiagnosticCode {
    /// Get the diagnostic code as a stable string identifier
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CteSegmentationError => "CTE_SEGMENTATION_ERROR",
            Self::SqlParseError => "SQL_PARSE_ERROR",
            Self::SqlUnresolvedTableExpr => "SQL_UNRESOLVED_TABLE_EXPR",
            Self::Info => "INFO",
            Self::Warning => "WARNING",
        }
    }
}

impl std::fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Diagnostic severity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Informational message
    Info,

    /// Warning - should be reviewed but not blocking
    Warn,

    /// Error - the affected fragment could not be processed
    Error,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Info => write!(f, "info"),
            Self::Warn => write!(f, "warn"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// Location of a diagnostic within an analyzed query
///
/// Fragments are the units the segmenter produces: each CTE by name, plus
/// the main query under the reserved `main` label. The offset, when present,
/// is a character offset into the whitespace-normalized input text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    /// Fragment the diagnostic belongs to (CTE name or `main`)
    pub fragment: String,

    /// Optional character offset in the normalized input
    pub offset: Option<usize>,
}

impl Location {
    /// Create a location naming just a fragment
    pub fn new(fragment: impl Into<String>) -> Self {
        Self {
            fragment: fragment.into(),
            offset: None,
        }
    }

    /// Create a location with a fragment and character offset
    pub fn with_offset(fragment: impl Into<String>, offset: usize) -> Self {
        Self {
            fragment: fragment.into(),
            offset: Some(offset),
        }
    }
}

/// A diagnostic message with structured metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Stable diagnostic code
    pub code: DiagnosticCode,

    /// Severity level
    pub severity: Severity,

    /// Human-readable message
    pub message: String,

    /// Location within the analyzed query (best-effort)
    pub location: Option<Location>,
}

impl Diagnostic {
    /// Create a new diagnostic with minimal fields
    pub fn new(code: DiagnosticCode, severity: Severity, message: impl Into<String>) -> Self {
        Self {
            code,
            severity,
            message: message.into(),
            location: None,
        }
    }

    /// Set the location
    pub fn with_location(mut self, location: Location) -> Self {
        self.location = Some(location);
        self
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.location {
            Some(loc) => write!(
                f,
                "[{}] {} ({}): {}",
                self.severity, self.code, loc.fragment, self.message
            ),
            None => write!(f, "[{}] {}: {}", self.severity, self.code, self.message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diagnostic_code_stability() {
        // Ensure codes are stable strings
        assert_eq!(
            DiagnosticCode::CteSegmentationError.as_str(),
            "CTE_SEGMENTATION_ERROR"
        );
        assert_eq!(
            DiagnosticCode::SqlUnresolvedTableExpr.as_str(),
            "SQL_UNRESOLVED_TABLE_EXPR"
        );
    }

    #[test]
    fn diagnostic_serialization() {
        let diag = Diagnostic::new(
            DiagnosticCode::SqlParseError,
            Severity::Error,
            "Failed to parse fragment",
        )
        .with_location(Location::new("c1"));

        let json = serde_json::to_string(&diag).unwrap();
        assert!(json.contains("SQL_PARSE_ERROR"));
        assert!(json.contains("error"));
        assert!(json.contains("c1"));
    }

    #[test]
    fn diagnostic_display() {
        let diag = Diagnostic::new(
            DiagnosticCode::SqlUnresolvedTableExpr,
            Severity::Warn,
            "skipped derived table",
        )
        .with_location(Location::new("main"));

        assert_eq!(
            diag.to_string(),
            "[warn] SQL_UNRESOLVED_TABLE_EXPR (main): skipped derived table"
        );
    }
}
