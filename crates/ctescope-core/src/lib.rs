//! CteScope Core
//!
//! Core domain model with stable, versioned types: segmented queries, table
//! references, diagnostics, reports, and configuration.
//! Never rename diagnostic codes - they are part of the public API.

pub mod config;
pub mod diagnostic;
pub mod query;
pub mod report;

pub use config::{Config, ConfigError, DialectConfig, SeverityThreshold};
pub use diagnostic::{Diagnostic, DiagnosticCode, Location, Severity};
pub use query::{CteDefinition, SegmentedQuery, TableReference, MAIN_QUERY};
pub use report::{FragmentReport, Report, ReportSummary, ReportVersion};
