//! Data models for legal document analysis.

mod document;
mod options;
mod payload;
mod result;
mod statistics;

pub use document::{Document, DocumentFormat, InvalidDocument, DEFAULT_MAX_FILE_SIZE};
pub use options::{AnalysisOptions, EntityExtractionType, SummaryType};
pub use payload::{
    Clause, ClauseImportance, ClauseReport, ClauseSummary, ComparisonReport, EntityReport,
    ExtractedText, ExtractionSummary, RelationshipReport, RiskReport, StagePayload, Summary,
};
pub use result::{
    AnalysisResult, AnalysisStatus, BatchResult, BatchStatus, ComparisonResult, ErrorClass,
    SkipReason, SkippedComparison, Stage, StageOutcome, StageRecord,
};
pub use statistics::{StageStatistics, Statistics};
