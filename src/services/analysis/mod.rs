//! Document analysis service.
//!
//! Validates a document, runs it through the stage pipeline and returns an
//! `AnalysisResult`. Separated from UI concerns - emits events for progress
//! tracking.

mod pipeline;
pub mod stages;
mod types;

use std::sync::Arc;
use std::time::Instant;

use tokio::sync::mpsc;
use tracing::warn;

use crate::error::AnalysisError;
use crate::models::{
    AnalysisOptions, AnalysisResult, ComparisonReport, Document, StageOutcome,
    DEFAULT_MAX_FILE_SIZE,
};
use crate::services::clients::{DocumentComparer, StageClients};
use crate::services::retry::{Attempted, RetryPolicy};

pub use pipeline::{AnalysisStage, PipelineRunner, EMPTY_EXTRACTION_MESSAGE};
pub use stages::{
    BulletPointsStage, ClauseStage, EntityStage, QuestionStage, RelationshipStage, RiskStage,
    SummarizeStage,
};
pub(crate) use types::send_event;
pub use types::{AnalysisEvent, StageEventKind};

/// Analyzes single documents and compares extracted texts.
pub struct DocumentOrchestrator {
    runner: PipelineRunner,
    comparer: Arc<dyn DocumentComparer>,
    max_file_size: u64,
}

impl DocumentOrchestrator {
    /// Orchestrator with every stage and the default retry policy.
    pub fn new(clients: StageClients) -> Self {
        let runner = PipelineRunner::with_default_stages(&clients, RetryPolicy::default());
        Self::from_runner(runner, clients.comparer)
    }

    /// Orchestrator over a custom stage set.
    pub fn from_runner(runner: PipelineRunner, comparer: Arc<dyn DocumentComparer>) -> Self {
        Self {
            runner,
            comparer,
            max_file_size: DEFAULT_MAX_FILE_SIZE,
        }
    }

    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Result<Self, AnalysisError> {
        policy.validate()?;
        self.runner.set_policy(policy);
        Ok(self)
    }

    pub fn with_max_file_size(mut self, max_file_size: u64) -> Self {
        self.max_file_size = max_file_size;
        self
    }

    pub fn policy(&self) -> &RetryPolicy {
        self.runner.policy()
    }

    pub fn max_file_size(&self) -> u64 {
        self.max_file_size
    }

    /// Analyze one document. Failures are recorded in the result.
    pub async fn analyze_document(
        &self,
        document: &Document,
        options: &AnalysisOptions,
    ) -> AnalysisResult {
        self.analyze_with_events(document, options, None).await
    }

    pub(crate) async fn analyze_with_events(
        &self,
        document: &Document,
        options: &AnalysisOptions,
        events: Option<&mpsc::Sender<AnalysisEvent>>,
    ) -> AnalysisResult {
        match document.validate(self.max_file_size) {
            Ok(format) => self.runner.run(document, format, options, events).await,
            Err(reason) => {
                warn!("Rejected {}: {}", document.id, reason);
                AnalysisResult::rejected(document.id.clone(), document.format(), &reason)
            }
        }
    }

    /// Compare two extracted texts under the retry policy.
    pub async fn compare(
        &self,
        left_text: &str,
        right_text: &str,
        left_name: &str,
        right_name: &str,
    ) -> (StageOutcome<ComparisonReport>, u32, std::time::Duration) {
        let label = format!("compare [{} vs {}]", left_name, right_name);
        let started = Instant::now();
        let Attempted { result, attempts } = self
            .policy()
            .run(&label, || {
                self.comparer
                    .compare_documents(left_text, right_text, left_name, right_name)
            })
            .await;
        let outcome = match result {
            Ok(payload) => StageOutcome::Success { payload },
            Err(failure) => StageOutcome::Failed {
                kind: failure.kind,
                message: failure.message,
            },
        };
        (outcome, attempts, started.elapsed())
    }
}
