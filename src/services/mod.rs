//! Service layer for legal document analysis.
//!
//! This module contains domain logic separated from UI concerns.
//! Services can be used by the CLI or embedded in other programs.

pub mod analysis;
pub mod batch;
pub mod clients;
pub mod retry;
pub mod stats;

pub use analysis::{
    AnalysisEvent, AnalysisStage, DocumentOrchestrator, PipelineRunner, StageEventKind,
};
pub use batch::{BatchCoordinator, DEFAULT_CONCURRENCY};
pub use clients::{
    ClauseExtractor, DocumentComparer, EntityExtractor, QuestionSuggester, RelationshipExtractor,
    RiskAssessor, ServiceError, StageClients, Summarizer, TextExtractor,
};
pub use retry::{classify_service_error, Attempted, RetryPolicy, StageFailure};
pub use stats::{compute_statistics, document_statistics};
