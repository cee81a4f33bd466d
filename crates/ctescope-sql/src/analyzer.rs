//! Query analysis orchestration
//!
//! Drives the whole flow: segment the input once, then parse and extract
//! each CTE body and the main query independently, collecting per-fragment
//! references and diagnostics into a report.

use crate::extractor::ReferenceExtractor;
use crate::parser::{ParseError, SqlParser};
use crate::segmenter::{segment, SegmentationError};
use ctescope_core::{Config, Diagnostic, Report, SegmentedQuery, TableReference};

/// Analysis errors
///
/// Segmentation failures always halt: a main query cannot be recovered
/// without a decomposition. Fragment parse failures halt by default; with
/// `keep_going` they become per-fragment diagnostics instead.
#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    #[error(transparent)]
    Segmentation(#[from] SegmentationError),

    #[error("failed to parse fragment `{fragment}`")]
    Parse {
        fragment: String,
        #[source]
        source: ParseError,
    },
}

/// Everything extracted from one query fragment
#[derive(Debug, Clone)]
pub struct FragmentAnalysis {
    /// Fragment label (CTE name or `main`)
    pub name: String,

    /// Fragment text as segmented
    pub sql: String,

    /// Table references in extraction order
    pub references: Vec<TableReference>,

    /// Parse and unresolved-expression diagnostics for this fragment
    pub diagnostics: Vec<Diagnostic>,
}

/// Result of analyzing one input query
#[derive(Debug, Clone)]
pub struct QueryAnalysis {
    /// The segmentation the analysis was driven by
    pub segmented: SegmentedQuery,

    /// Per-fragment results, CTEs in declaration order, main query last
    pub fragments: Vec<FragmentAnalysis>,
}

impl QueryAnalysis {
    /// The main-query fragment
    pub fn main_fragment(&self) -> &FragmentAnalysis {
        // fragments always ends with the main query
        self.fragments.last().expect("analysis has a main fragment")
    }

    /// Every reference across all fragments, in analysis order
    pub fn all_references(&self) -> impl Iterator<Item = &TableReference> {
        self.fragments.iter().flat_map(|f| f.references.iter())
    }

    /// Every diagnostic across all fragments, in analysis order
    pub fn all_diagnostics(&self) -> impl Iterator<Item = &Diagnostic> {
        self.fragments.iter().flat_map(|f| f.diagnostics.iter())
    }

    /// Build the versioned report
    pub fn to_report(&self) -> Report {
        let mut report = Report::new();

        for fragment in &self.fragments {
            report.add_fragment(fragment.name.clone(), fragment.references.clone());
            for diagnostic in &fragment.diagnostics {
                report.add_diagnostic(diagnostic.clone());
            }
        }

        report
    }
}

/// Configured analysis driver
pub struct QueryAnalyzer {
    parser: SqlParser,
    keep_going: bool,
}

impl QueryAnalyzer {
    /// Create an analyzer with the default (T-SQL) parser that halts on the
    /// first fragment parse failure
    pub fn new() -> Self {
        Self {
            parser: SqlParser::default(),
            keep_going: false,
        }
    }

    /// Create an analyzer from a config
    pub fn from_config(config: &Config) -> Self {
        Self {
            parser: SqlParser::from_dialect(config.dialect),
            keep_going: config.keep_going,
        }
    }

    /// Use a specific parser
    pub fn with_parser(mut self, parser: SqlParser) -> Self {
        self.parser = parser;
        self
    }

    /// Record fragment parse failures as diagnostics and continue instead
    /// of halting
    pub fn keep_going(mut self, keep_going: bool) -> Self {
        self.keep_going = keep_going;
        self
    }

    /// Analyze one SQL input: segment, then parse and extract each fragment
    pub fn analyze(&self, sql: &str) -> Result<QueryAnalysis, AnalysisError> {
        let segmented = segment(sql)?;
        tracing::debug!(
            ctes = segmented.ctes.len(),
            "segmented input into {} fragments",
            segmented.fragment_count()
        );

        let mut fragments = Vec::with_capacity(segmented.fragment_count());
        for (name, text) in segmented.fragments() {
            match self.analyze_fragment(name, text) {
                Ok(fragment) => fragments.push(fragment),
                Err(error) if self.keep_going => {
                    // Fragments are independent; one parse failure does not
                    // corrupt the siblings.
                    tracing::warn!(fragment = name, %error, "fragment failed to parse");
                    fragments.push(FragmentAnalysis {
                        name: name.to_string(),
                        sql: text.to_string(),
                        references: Vec::new(),
                        diagnostics: vec![error.to_diagnostic()],
                    });
                }
                Err(error) => {
                    return Err(AnalysisError::Parse {
                        fragment: name.to_string(),
                        source: error,
                    });
                }
            }
        }

        Ok(QueryAnalysis {
            segmented,
            fragments,
        })
    }

    fn analyze_fragment(&self, name: &str, sql: &str) -> Result<FragmentAnalysis, ParseError> {
        let parsed = self.parser.parse(sql, name)?;

        let mut extractor = ReferenceExtractor::for_fragment(name);
        for statement in &parsed.statements {
            extractor.extract(statement);
        }

        let (references, diagnostics) = extractor.into_parts();
        Ok(FragmentAnalysis {
            name: name.to_string(),
            sql: sql.to_string(),
            references,
            diagnostics,
        })
    }
}

impl Default for QueryAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}
