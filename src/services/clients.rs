//! Contracts for the external analysis collaborators.
//!
//! Each collaborator returns a typed payload or a `ServiceError` carrying
//! enough detail (status code, rate-limit flag, retry hint) for the retry
//! policy to classify it.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{
    ClauseReport, ComparisonReport, Document, EntityExtractionType, EntityReport, ExtractedText,
    RelationshipReport, RiskReport, Summary, SummaryType,
};

/// Failure reported by a collaborator call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceError {
    #[error("Rate limited: {message}")]
    RateLimited {
        message: String,
        retry_after: Option<Duration>,
    },
    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },
    #[error("Connection error: {0}")]
    Connection(String),
    #[error("Timed out after {0:?}")]
    Timeout(Duration),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Unsupported content: {0}")]
    Unsupported(String),
    #[error("Malformed response: {0}")]
    Parse(String),
    #[error("{0}")]
    Other(String),
}

impl ServiceError {
    /// Build an error from an HTTP status, folding 429 into `RateLimited`.
    pub fn from_status(status: u16, message: impl Into<String>, retry_after: Option<Duration>) -> Self {
        if status == 429 {
            Self::RateLimited {
                message: message.into(),
                retry_after,
            }
        } else {
            Self::Http {
                status,
                message: message.into(),
            }
        }
    }

    /// Retry hint supplied by the service, if any.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::RateLimited { retry_after, .. } => *retry_after,
            _ => None,
        }
    }
}

/// Raw text extraction from document bytes.
#[async_trait]
pub trait TextExtractor: Send + Sync {
    async fn extract_text(&self, document: &Document) -> Result<ExtractedText, ServiceError>;
}

/// Summaries and bullet-point digests.
#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize(&self, text: &str, summary_type: SummaryType)
        -> Result<Summary, ServiceError>;

    async fn bullet_points(&self, text: &str) -> Result<Vec<String>, ServiceError>;
}

#[async_trait]
pub trait EntityExtractor: Send + Sync {
    async fn extract_entities(
        &self,
        text: &str,
        extraction_type: EntityExtractionType,
    ) -> Result<EntityReport, ServiceError>;
}

#[async_trait]
pub trait RiskAssessor: Send + Sync {
    async fn assess_risks(&self, text: &str) -> Result<RiskReport, ServiceError>;
}

#[async_trait]
pub trait RelationshipExtractor: Send + Sync {
    async fn extract_relationships(&self, text: &str) -> Result<RelationshipReport, ServiceError>;
}

/// Quotes and categorizes contract clauses.
#[async_trait]
pub trait ClauseExtractor: Send + Sync {
    /// `clause_types` empty means every type the extractor knows.
    async fn extract_clauses(
        &self,
        text: &str,
        clause_types: &[String],
    ) -> Result<ClauseReport, ServiceError>;
}

/// Suggests questions a reader may want answered about a document.
#[async_trait]
pub trait QuestionSuggester: Send + Sync {
    async fn suggest_questions(&self, text: &str) -> Result<Vec<String>, ServiceError>;
}

#[async_trait]
pub trait DocumentComparer: Send + Sync {
    async fn compare_documents(
        &self,
        left_text: &str,
        right_text: &str,
        left_name: &str,
        right_name: &str,
    ) -> Result<ComparisonReport, ServiceError>;
}

/// The set of collaborators the orchestrator invokes.
#[derive(Clone)]
pub struct StageClients {
    pub extractor: Arc<dyn TextExtractor>,
    pub summarizer: Arc<dyn Summarizer>,
    pub entities: Arc<dyn EntityExtractor>,
    pub risks: Arc<dyn RiskAssessor>,
    pub relationships: Arc<dyn RelationshipExtractor>,
    pub clauses: Arc<dyn ClauseExtractor>,
    pub questions: Arc<dyn QuestionSuggester>,
    pub comparer: Arc<dyn DocumentComparer>,
}

impl StageClients {
    /// Use one analyzer for every downstream capability.
    pub fn from_analyzer<A>(extractor: Arc<dyn TextExtractor>, analyzer: Arc<A>) -> Self
    where
        A: Summarizer
            + EntityExtractor
            + RiskAssessor
            + RelationshipExtractor
            + ClauseExtractor
            + QuestionSuggester
            + DocumentComparer
            + 'static,
    {
        Self {
            extractor,
            summarizer: analyzer.clone(),
            entities: analyzer.clone(),
            risks: analyzer.clone(),
            relationships: analyzer.clone(),
            clauses: analyzer.clone(),
            questions: analyzer.clone(),
            comparer: analyzer,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_status_folds_429() {
        let err = ServiceError::from_status(429, "slow down", Some(Duration::from_secs(3)));
        assert_eq!(err.retry_after(), Some(Duration::from_secs(3)));
        assert!(matches!(err, ServiceError::RateLimited { .. }));

        let err = ServiceError::from_status(503, "unavailable", None);
        assert_eq!(
            err,
            ServiceError::Http {
                status: 503,
                message: "unavailable".into()
            }
        );
        assert_eq!(err.retry_after(), None);
    }
}
