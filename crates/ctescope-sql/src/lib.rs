//! SQL segmentation and table-reference extraction
//!
//! This crate handles:
//! - Splitting a `WITH` query into named CTE bodies and the main query
//! - Parsing each fragment with datafusion-sqlparser-rs
//! - Walking parsed fragments to extract qualified table references
//! - Orchestrating the whole analysis and collecting diagnostics

pub mod analyzer;
pub mod extractor;
pub mod parser;
pub mod segmenter;

pub use analyzer::{AnalysisError, FragmentAnalysis, QueryAnalysis, QueryAnalyzer};
pub use extractor::{extract_references, ReferenceExtractor};
pub use parser::{ParseError, ParsedSql, SqlParser};
pub use segmenter::{normalize_whitespace, segment, SegmentationError};
