//! Analysis outcomes: per-stage records, per-document results, batch results.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::document::{DocumentFormat, InvalidDocument};
use super::options::AnalysisOptions;
use super::payload::{ComparisonReport, StagePayload};
use super::statistics::Statistics;

/// A discrete analysis step, in pipeline order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Extract,
    Summarize,
    BulletPoints,
    ExtractEntities,
    AssessRisks,
    ExtractRelationships,
    ExtractClauses,
    SuggestQuestions,
}

impl Stage {
    pub const ALL: [Stage; 8] = [
        Self::Extract,
        Self::Summarize,
        Self::BulletPoints,
        Self::ExtractEntities,
        Self::AssessRisks,
        Self::ExtractRelationships,
        Self::ExtractClauses,
        Self::SuggestQuestions,
    ];

    /// Stages that depend only on extracted text.
    pub const DOWNSTREAM: [Stage; 7] = [
        Self::Summarize,
        Self::BulletPoints,
        Self::ExtractEntities,
        Self::AssessRisks,
        Self::ExtractRelationships,
        Self::ExtractClauses,
        Self::SuggestQuestions,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Extract => "extract",
            Self::Summarize => "summarize",
            Self::BulletPoints => "bullet_points",
            Self::ExtractEntities => "extract_entities",
            Self::AssessRisks => "assess_risks",
            Self::ExtractRelationships => "extract_relationships",
            Self::ExtractClauses => "extract_clauses",
            Self::SuggestQuestions => "suggest_questions",
        }
    }

    /// Whether the options ask for this stage. Extraction is always requested.
    pub fn is_requested(&self, options: &AnalysisOptions) -> bool {
        match self {
            Self::Extract => true,
            Self::Summarize => options.generate_summary,
            Self::BulletPoints => options.generate_bullet_points,
            Self::ExtractEntities => options.extract_entities,
            Self::AssessRisks => options.analyze_risks,
            Self::ExtractRelationships => options.extract_relationships,
            Self::ExtractClauses => options.extract_clauses,
            Self::SuggestQuestions => options.generate_qa_suggestions,
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Retry classification of a collaborator failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorClass {
    Transient,
    Permanent,
    RateLimited,
}

impl ErrorClass {
    pub fn is_retryable(&self) -> bool {
        !matches!(self, Self::Permanent)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Transient => "transient",
            Self::Permanent => "permanent",
            Self::RateLimited => "rate_limited",
        }
    }
}

impl std::fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    NotRequested,
    ExtractionFailed,
    DocumentRejected,
}

impl SkipReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotRequested => "not requested",
            Self::ExtractionFailed => "extraction failed",
            Self::DocumentRejected => "document rejected",
        }
    }
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Outcome of one stage (or one comparison).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum StageOutcome<P = StagePayload> {
    Success { payload: P },
    Failed { kind: ErrorClass, message: String },
    Skipped { reason: SkipReason },
}

impl<P> StageOutcome<P> {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, Self::Skipped { .. })
    }

    pub fn payload(&self) -> Option<&P> {
        match self {
            Self::Success { payload } => Some(payload),
            _ => None,
        }
    }
}

/// One stage's outcome with its bookkeeping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageRecord {
    pub stage: Stage,
    pub outcome: StageOutcome,
    /// Calls made to the collaborator (0 when skipped).
    pub attempts: u32,
    pub elapsed: Duration,
}

impl StageRecord {
    pub fn skipped(stage: Stage, reason: SkipReason) -> Self {
        Self {
            stage,
            outcome: StageOutcome::Skipped { reason },
            attempts: 0,
            elapsed: Duration::ZERO,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisStatus {
    /// Every requested stage succeeded.
    Complete,
    /// Extraction succeeded but at least one requested stage failed.
    Partial,
    /// Extraction failed or the document was rejected.
    Failed,
}

impl AnalysisStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Complete => "complete",
            Self::Partial => "partial",
            Self::Failed => "failed",
        }
    }
}

impl std::fmt::Display for AnalysisStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Result of analyzing one document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub document_id: String,
    pub format: Option<DocumentFormat>,
    /// Extracted text, present only when extraction succeeded.
    pub text: Option<String>,
    /// One record per stage, in pipeline order.
    pub stages: Vec<StageRecord>,
    pub status: AnalysisStatus,
    /// Set when the document was rejected before entering the pipeline.
    pub rejection: Option<String>,
    pub started_at: DateTime<Utc>,
    pub elapsed: Duration,
}

impl AnalysisResult {
    /// Empty result at the start of a pipeline run.
    pub fn new(document_id: impl Into<String>, format: Option<DocumentFormat>) -> Self {
        Self {
            document_id: document_id.into(),
            format,
            text: None,
            stages: Vec::with_capacity(Stage::ALL.len()),
            status: AnalysisStatus::Failed,
            rejection: None,
            started_at: Utc::now(),
            elapsed: Duration::ZERO,
        }
    }

    /// Result for a document that failed validation. No stage is invoked.
    pub fn rejected(
        document_id: impl Into<String>,
        format: Option<DocumentFormat>,
        reason: &InvalidDocument,
    ) -> Self {
        let mut result = Self::new(document_id, format);
        for stage in Stage::ALL {
            result.push(StageRecord::skipped(stage, SkipReason::DocumentRejected));
        }
        result.rejection = Some(reason.to_string());
        result.status = AnalysisStatus::Failed;
        result
    }

    /// Result for a worker that died without producing one.
    pub fn aborted(document_id: impl Into<String>, message: impl Into<String>) -> Self {
        let mut result = Self::new(document_id, None);
        result.push(StageRecord {
            stage: Stage::Extract,
            outcome: StageOutcome::Failed {
                kind: ErrorClass::Permanent,
                message: message.into(),
            },
            attempts: 0,
            elapsed: Duration::ZERO,
        });
        for stage in Stage::DOWNSTREAM {
            result.push(StageRecord::skipped(stage, SkipReason::ExtractionFailed));
        }
        result.finish();
        result
    }

    pub(crate) fn push(&mut self, record: StageRecord) {
        self.stages.push(record);
    }

    /// Derive the overall status from the recorded stages.
    pub(crate) fn finish(&mut self) {
        self.status = if self.rejection.is_some() {
            AnalysisStatus::Failed
        } else {
            match self.stage(Stage::Extract) {
                Some(record) if record.outcome.is_success() => {
                    if self.stages.iter().any(|r| r.outcome.is_failed()) {
                        AnalysisStatus::Partial
                    } else {
                        AnalysisStatus::Complete
                    }
                }
                _ => AnalysisStatus::Failed,
            }
        };
        self.elapsed = self.stages.iter().map(|r| r.elapsed).sum();
    }

    pub fn stage(&self, stage: Stage) -> Option<&StageRecord> {
        self.stages.iter().find(|r| r.stage == stage)
    }

    /// Stages that failed, with their messages.
    pub fn failed_stages(&self) -> impl Iterator<Item = (Stage, ErrorClass, &str)> {
        self.stages.iter().filter_map(|r| match &r.outcome {
            StageOutcome::Failed { kind, message } => Some((r.stage, *kind, message.as_str())),
            _ => None,
        })
    }

    /// Text usable for comparison: present and non-blank.
    pub fn comparable_text(&self) -> Option<&str> {
        self.text.as_deref().filter(|t| !t.trim().is_empty())
    }
}

/// Outcome of comparing two documents of a batch, keyed by input indices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonResult {
    pub left: usize,
    pub right: usize,
    pub left_id: String,
    pub right_id: String,
    pub outcome: StageOutcome<ComparisonReport>,
    pub attempts: u32,
    pub elapsed: Duration,
}

impl ComparisonResult {
    pub fn key(&self) -> (usize, usize) {
        (self.left, self.right)
    }
}

/// A pair excluded from comparison because a member failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedComparison {
    pub left: usize,
    pub right: usize,
    /// Input indices of the failed members.
    pub failed: Vec<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchStatus {
    Completed,
    Cancelled,
}

/// Results of a batch run, in input order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchResult {
    pub status: BatchStatus,
    /// Completed document results, ordered by input position.
    pub results: Vec<AnalysisResult>,
    /// Documents without a result because the batch was cancelled.
    pub not_analyzed: Vec<String>,
    /// Attempted comparisons, ordered by `(left, right)`.
    pub comparisons: Vec<ComparisonResult>,
    pub skipped_comparisons: Vec<SkippedComparison>,
    pub statistics: Statistics,
}

impl BatchResult {
    pub fn is_cancelled(&self) -> bool {
        self.status == BatchStatus::Cancelled
    }

    pub fn comparison(&self, left: usize, right: usize) -> Option<&ComparisonResult> {
        self.comparisons.iter().find(|c| c.key() == (left, right))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::payload::ExtractionSummary;

    fn success(stage: Stage, payload: StagePayload) -> StageRecord {
        StageRecord {
            stage,
            outcome: StageOutcome::Success { payload },
            attempts: 1,
            elapsed: Duration::from_millis(5),
        }
    }

    fn extraction() -> StagePayload {
        StagePayload::Extraction(ExtractionSummary {
            characters: 4,
            words: 1,
            pages: None,
            confidence: None,
        })
    }

    #[test]
    fn test_status_complete() {
        let mut result = AnalysisResult::new("a", Some(DocumentFormat::Txt));
        result.push(success(Stage::Extract, extraction()));
        result.push(StageRecord::skipped(Stage::Summarize, SkipReason::NotRequested));
        result.finish();
        assert_eq!(result.status, AnalysisStatus::Complete);
        assert_eq!(result.elapsed, Duration::from_millis(5));
    }

    #[test]
    fn test_status_partial_lists_failures() {
        let mut result = AnalysisResult::new("a", Some(DocumentFormat::Txt));
        result.push(success(Stage::Extract, extraction()));
        result.push(StageRecord {
            stage: Stage::AssessRisks,
            outcome: StageOutcome::Failed {
                kind: ErrorClass::RateLimited,
                message: "quota".into(),
            },
            attempts: 3,
            elapsed: Duration::ZERO,
        });
        result.push(success(
            Stage::BulletPoints,
            StagePayload::BulletPoints { points: vec![] },
        ));
        result.finish();
        assert_eq!(result.status, AnalysisStatus::Partial);
        let failed: Vec<_> = result.failed_stages().collect();
        assert_eq!(failed, vec![(Stage::AssessRisks, ErrorClass::RateLimited, "quota")]);
    }

    #[test]
    fn test_rejected_has_no_attempts() {
        let result = AnalysisResult::rejected(
            "big.pdf",
            Some(DocumentFormat::Pdf),
            &InvalidDocument::TooLarge { size: 2, max: 1 },
        );
        assert_eq!(result.status, AnalysisStatus::Failed);
        assert_eq!(result.stages.len(), Stage::ALL.len());
        assert!(result.stages.iter().all(|r| r.attempts == 0));
        assert!(result.rejection.is_some());
    }

    #[test]
    fn test_outcome_serializes_tagged() {
        let outcome: StageOutcome = StageOutcome::Skipped {
            reason: SkipReason::NotRequested,
        };
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["outcome"], "skipped");
        assert_eq!(json["reason"], "not_requested");
    }
}
