//! Per-document stage pipeline.
//!
//! Extraction runs first and gates everything else. The downstream stages
//! only read the extracted text, so one failing never affects another.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::stages::{
    BulletPointsStage, ClauseStage, EntityStage, QuestionStage, RelationshipStage, RiskStage,
    SummarizeStage,
};
use super::types::{send_event, AnalysisEvent, StageEventKind};
use crate::models::{
    AnalysisOptions, AnalysisResult, Document, DocumentFormat, ErrorClass, ExtractionSummary,
    SkipReason, Stage, StageOutcome, StagePayload, StageRecord,
};
use crate::services::clients::{ServiceError, StageClients, TextExtractor};
use crate::services::retry::{RetryPolicy, StageFailure};

pub const EMPTY_EXTRACTION_MESSAGE: &str = "no text could be extracted from document";

/// A stage that runs on extracted text.
///
/// The runner decides whether to call it and wraps every call in the
/// retry policy; implementations make exactly one collaborator call.
#[async_trait]
pub trait AnalysisStage: Send + Sync {
    fn stage(&self) -> Stage;

    fn is_requested(&self, options: &AnalysisOptions) -> bool {
        self.stage().is_requested(options)
    }

    async fn run(&self, text: &str, options: &AnalysisOptions)
        -> Result<StagePayload, ServiceError>;
}

/// Drives one document through extraction and the downstream stages.
pub struct PipelineRunner {
    extractor: Arc<dyn TextExtractor>,
    stages: Vec<Box<dyn AnalysisStage>>,
    policy: RetryPolicy,
}

impl PipelineRunner {
    pub fn new(extractor: Arc<dyn TextExtractor>, policy: RetryPolicy) -> Self {
        Self {
            extractor,
            stages: Vec::new(),
            policy,
        }
    }

    /// Runner with every downstream stage, in pipeline order.
    pub fn with_default_stages(clients: &StageClients, policy: RetryPolicy) -> Self {
        let mut runner = Self::new(clients.extractor.clone(), policy);
        runner.add_stage(Box::new(SummarizeStage::new(clients.summarizer.clone())));
        runner.add_stage(Box::new(BulletPointsStage::new(clients.summarizer.clone())));
        runner.add_stage(Box::new(EntityStage::new(clients.entities.clone())));
        runner.add_stage(Box::new(RiskStage::new(clients.risks.clone())));
        runner.add_stage(Box::new(RelationshipStage::new(
            clients.relationships.clone(),
        )));
        runner.add_stage(Box::new(ClauseStage::new(clients.clauses.clone())));
        runner.add_stage(Box::new(QuestionStage::new(clients.questions.clone())));
        runner
    }

    pub fn add_stage(&mut self, stage: Box<dyn AnalysisStage>) {
        self.stages.push(stage);
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub(crate) fn set_policy(&mut self, policy: RetryPolicy) {
        self.policy = policy;
    }

    /// Run the pipeline for an already validated document.
    pub async fn run(
        &self,
        document: &Document,
        format: DocumentFormat,
        options: &AnalysisOptions,
        events: Option<&mpsc::Sender<AnalysisEvent>>,
    ) -> AnalysisResult {
        let mut result = AnalysisResult::new(document.id.clone(), Some(format));

        let started = Instant::now();
        let label = format!("{} [{}]", Stage::Extract, document.id);
        let attempted = self
            .policy
            .run(&label, || self.extractor.extract_text(document))
            .await;
        let elapsed = started.elapsed();

        let extracted = attempted.result.and_then(|extracted| {
            if extracted.text.trim().is_empty() {
                Err(StageFailure {
                    kind: ErrorClass::Permanent,
                    message: EMPTY_EXTRACTION_MESSAGE.to_string(),
                })
            } else {
                Ok(extracted)
            }
        });

        let text = match extracted {
            Ok(extracted) => {
                debug!(
                    "Extracted {} chars from {} ({})",
                    extracted.text.len(),
                    document.id,
                    format
                );
                let record = StageRecord {
                    stage: Stage::Extract,
                    outcome: StageOutcome::Success {
                        payload: StagePayload::Extraction(ExtractionSummary::from_extracted(
                            &extracted,
                        )),
                    },
                    attempts: attempted.attempts,
                    elapsed,
                };
                record_stage(&mut result, record, events);
                extracted.text
            }
            Err(failure) => {
                warn!("Extraction failed for {}: {}", document.id, failure.message);
                let record = StageRecord {
                    stage: Stage::Extract,
                    outcome: StageOutcome::Failed {
                        kind: failure.kind,
                        message: failure.message,
                    },
                    attempts: attempted.attempts,
                    elapsed,
                };
                record_stage(&mut result, record, events);
                for stage in &self.stages {
                    let record = StageRecord::skipped(stage.stage(), SkipReason::ExtractionFailed);
                    record_stage(&mut result, record, events);
                }
                result.finish();
                return result;
            }
        };

        for stage in &self.stages {
            let record = if stage.is_requested(options) {
                self.run_stage(stage.as_ref(), &document.id, &text, options)
                    .await
            } else {
                StageRecord::skipped(stage.stage(), SkipReason::NotRequested)
            };
            record_stage(&mut result, record, events);
        }

        result.text = Some(text);
        result.finish();
        info!(
            "Analyzed {}: {} in {:?}",
            document.id, result.status, result.elapsed
        );
        result
    }

    async fn run_stage(
        &self,
        stage: &dyn AnalysisStage,
        document_id: &str,
        text: &str,
        options: &AnalysisOptions,
    ) -> StageRecord {
        let label = format!("{} [{}]", stage.stage(), document_id);
        let started = Instant::now();
        let attempted = self.policy.run(&label, || stage.run(text, options)).await;
        let outcome = match attempted.result {
            Ok(payload) => StageOutcome::Success { payload },
            Err(failure) => StageOutcome::Failed {
                kind: failure.kind,
                message: failure.message,
            },
        };
        StageRecord {
            stage: stage.stage(),
            outcome,
            attempts: attempted.attempts,
            elapsed: started.elapsed(),
        }
    }
}

fn record_stage(
    result: &mut AnalysisResult,
    record: StageRecord,
    events: Option<&mpsc::Sender<AnalysisEvent>>,
) {
    send_event(
        events,
        AnalysisEvent::StageFinished {
            document_id: result.document_id.clone(),
            stage: record.stage,
            kind: StageEventKind::from(&record.outcome),
            attempts: record.attempts,
        },
    );
    result.push(record);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AnalysisStatus, ExtractedText};
    use std::time::Duration;

    struct FixedExtractor(&'static str);

    #[async_trait]
    impl TextExtractor for FixedExtractor {
        async fn extract_text(&self, _document: &Document) -> Result<ExtractedText, ServiceError> {
            Ok(ExtractedText::new(self.0))
        }
    }

    struct EchoStage;

    #[async_trait]
    impl AnalysisStage for EchoStage {
        fn stage(&self) -> Stage {
            Stage::BulletPoints
        }

        async fn run(
            &self,
            text: &str,
            _options: &AnalysisOptions,
        ) -> Result<StagePayload, ServiceError> {
            Ok(StagePayload::BulletPoints {
                points: vec![text.to_string()],
            })
        }
    }

    fn runner(text: &'static str) -> PipelineRunner {
        let policy = RetryPolicy::default().with_base_delay(Duration::ZERO);
        let mut runner = PipelineRunner::new(Arc::new(FixedExtractor(text)), policy);
        runner.add_stage(Box::new(EchoStage));
        runner
    }

    #[tokio::test]
    async fn test_blank_extraction_is_permanent_failure() {
        let doc = Document::new("blank.txt", b"   ".to_vec(), "txt");
        let (tx, mut rx) = mpsc::channel(16);
        let result = runner("  \n\t ")
            .run(&doc, DocumentFormat::Txt, &AnalysisOptions::all(), Some(&tx))
            .await;

        assert_eq!(result.status, AnalysisStatus::Failed);
        assert!(result.text.is_none());
        let extract = result.stage(Stage::Extract).unwrap();
        assert_eq!(
            extract.outcome,
            StageOutcome::Failed {
                kind: ErrorClass::Permanent,
                message: EMPTY_EXTRACTION_MESSAGE.into(),
            }
        );
        assert_eq!(
            result.stage(Stage::BulletPoints).unwrap().outcome,
            StageOutcome::Skipped {
                reason: SkipReason::ExtractionFailed
            }
        );

        drop(tx);
        let mut finished = 0;
        while rx.recv().await.is_some() {
            finished += 1;
        }
        assert_eq!(finished, 2);
    }

    #[tokio::test]
    async fn test_unrequested_stage_is_skipped() {
        let doc = Document::new("a.txt", b"hello".to_vec(), "txt");
        let options = AnalysisOptions {
            generate_bullet_points: false,
            ..AnalysisOptions::all()
        };
        let result = runner("hello")
            .run(&doc, DocumentFormat::Txt, &options, None)
            .await;

        assert_eq!(result.status, AnalysisStatus::Complete);
        assert_eq!(result.text.as_deref(), Some("hello"));
        let record = result.stage(Stage::BulletPoints).unwrap();
        assert_eq!(record.attempts, 0);
        assert!(record.outcome.is_skipped());
    }
}
