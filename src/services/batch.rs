//! Concurrent batch analysis.
//!
//! Documents are analyzed by at most `concurrency` workers at a time, gated
//! by a semaphore the same way comparisons are. Results come back in input
//! order regardless of completion order. Cancellation stops scheduling,
//! aborts in-flight work and keeps whatever already finished.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tokio::sync::{mpsc, watch, OwnedSemaphorePermit, Semaphore};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use super::analysis::{send_event, AnalysisEvent, DocumentOrchestrator};
use super::stats::compute_statistics;
use crate::error::AnalysisError;
use crate::models::{
    AnalysisOptions, AnalysisResult, AnalysisStatus, BatchResult, BatchStatus, ComparisonResult,
    Document, ErrorClass, SkippedComparison, StageOutcome, Statistics,
};

pub const DEFAULT_CONCURRENCY: usize = 4;

/// Runs the orchestrator over many documents with bounded concurrency.
pub struct BatchCoordinator {
    orchestrator: Arc<DocumentOrchestrator>,
    event_tx: Option<mpsc::Sender<AnalysisEvent>>,
}

impl BatchCoordinator {
    pub fn new(orchestrator: Arc<DocumentOrchestrator>) -> Self {
        Self {
            orchestrator,
            event_tx: None,
        }
    }

    /// Emit progress events on `tx`.
    pub fn with_events(mut self, tx: mpsc::Sender<AnalysisEvent>) -> Self {
        self.event_tx = Some(tx);
        self
    }

    pub async fn analyze_batch(
        &self,
        documents: Vec<Document>,
        options: &AnalysisOptions,
        concurrency: usize,
    ) -> Result<BatchResult, AnalysisError> {
        let (_cancel_tx, cancel_rx) = watch::channel(false);
        self.analyze_batch_cancellable(documents, options, concurrency, cancel_rx)
            .await
    }

    /// Like `analyze_batch`, stopping early once `cancel` becomes `true`.
    pub async fn analyze_batch_cancellable(
        &self,
        documents: Vec<Document>,
        options: &AnalysisOptions,
        concurrency: usize,
        cancel: watch::Receiver<bool>,
    ) -> Result<BatchResult, AnalysisError> {
        if concurrency == 0 {
            return Err(AnalysisError::InvalidConcurrency);
        }
        self.orchestrator.policy().validate()?;

        let total = documents.len();
        info!(
            "Analyzing {} documents with concurrency {}",
            total, concurrency
        );

        let ids: Vec<String> = documents.iter().map(|d| d.id.clone()).collect();
        let semaphore = Arc::new(Semaphore::new(concurrency));
        let options = Arc::new(options.clone());
        let mut slots: Vec<Option<AnalysisResult>> = (0..total).map(|_| None).collect();
        let mut tasks: JoinSet<(usize, AnalysisResult)> = JoinSet::new();

        for (index, document) in documents.into_iter().enumerate() {
            let Some(permit) = acquire_or_cancel(&semaphore, &cancel).await else {
                debug!("Cancelled before scheduling {}", document.id);
                break;
            };
            let orchestrator = self.orchestrator.clone();
            let options = options.clone();
            let event_tx = self.event_tx.clone();
            tasks.spawn(analyze_one(
                orchestrator,
                index,
                document,
                options,
                event_tx,
                permit,
            ));
        }

        let mut cancelled = drain(&mut tasks, &cancel, |(index, result)| {
            slots[index] = Some(result);
        })
        .await;

        let mut comparisons = Vec::new();
        let mut skipped_comparisons = Vec::new();
        let all_analyzed = slots.iter().all(Option::is_some);
        if !cancelled && all_analyzed && options.compare_documents && total >= 2 {
            let results: Vec<&AnalysisResult> = slots.iter().flatten().collect();
            let (done, skipped, comparison_cancelled) = self
                .compare_all(&results, &semaphore, &cancel)
                .await;
            comparisons = done;
            skipped_comparisons = skipped;
            cancelled = comparison_cancelled;
        }

        let not_analyzed: Vec<String> = slots
            .iter()
            .zip(&ids)
            .filter(|(slot, _)| slot.is_none())
            .map(|(_, id)| id.clone())
            .collect();
        let results: Vec<AnalysisResult> = slots.into_iter().flatten().collect();
        let status = if cancelled {
            BatchStatus::Cancelled
        } else {
            BatchStatus::Completed
        };

        let mut batch = BatchResult {
            status,
            results,
            not_analyzed,
            comparisons,
            skipped_comparisons,
            statistics: Statistics::default(),
        };
        batch.statistics = compute_statistics(&batch);

        if cancelled {
            warn!(
                "Batch cancelled: {} analyzed, {} not analyzed",
                batch.results.len(),
                batch.not_analyzed.len()
            );
        } else {
            info!(
                "Batch complete: {} complete, {} partial, {} failed",
                batch.statistics.complete, batch.statistics.partial, batch.statistics.failed
            );
        }
        self.emit(AnalysisEvent::BatchCompleted {
            status,
            analyzed: batch.results.len(),
            not_analyzed: batch.not_analyzed.len(),
        });

        Ok(batch)
    }

    /// Compare every pair `i < j` whose members both have extracted text.
    /// `results` must hold one entry per input document, in input order.
    async fn compare_all(
        &self,
        results: &[&AnalysisResult],
        semaphore: &Arc<Semaphore>,
        cancel: &watch::Receiver<bool>,
    ) -> (Vec<ComparisonResult>, Vec<SkippedComparison>, bool) {
        let texts: Vec<Option<Arc<str>>> = results
            .iter()
            .map(|r| match r.status {
                AnalysisStatus::Failed => None,
                _ => r.comparable_text().map(Arc::from),
            })
            .collect();

        let mut skipped = Vec::new();
        let mut pairs = Vec::new();
        for left in 0..results.len() {
            for right in (left + 1)..results.len() {
                match (&texts[left], &texts[right]) {
                    (Some(l), Some(r)) => pairs.push((left, right, l.clone(), r.clone())),
                    _ => {
                        let failed = [left, right]
                            .into_iter()
                            .filter(|&i| texts[i].is_none())
                            .collect();
                        skipped.push(SkippedComparison {
                            left,
                            right,
                            failed,
                        });
                    }
                }
            }
        }
        if !skipped.is_empty() {
            debug!("Skipping {} comparisons with failed documents", skipped.len());
        }

        let mut tasks: JoinSet<ComparisonResult> = JoinSet::new();
        let mut cancelled = false;
        for (left, right, left_text, right_text) in pairs {
            let Some(permit) = acquire_or_cancel(semaphore, cancel).await else {
                cancelled = true;
                break;
            };
            let orchestrator = self.orchestrator.clone();
            let left_id = results[left].document_id.clone();
            let right_id = results[right].document_id.clone();
            let event_tx = self.event_tx.clone();
            tasks.spawn(async move {
                let _permit = permit;
                let compared = AssertUnwindSafe(orchestrator.compare(
                    &left_text,
                    &right_text,
                    &left_id,
                    &right_id,
                ))
                .catch_unwind()
                .await;
                let (outcome, attempts, elapsed) = match compared {
                    Ok(compared) => compared,
                    Err(_) => (
                        StageOutcome::Failed {
                            kind: ErrorClass::Permanent,
                            message: "comparison task panicked".to_string(),
                        },
                        0,
                        std::time::Duration::ZERO,
                    ),
                };
                send_event(
                    event_tx.as_ref(),
                    AnalysisEvent::ComparisonCompleted {
                        left,
                        right,
                        succeeded: outcome.is_success(),
                    },
                );
                ComparisonResult {
                    left,
                    right,
                    left_id,
                    right_id,
                    outcome,
                    attempts,
                    elapsed,
                }
            });
        }

        let mut comparisons = Vec::new();
        cancelled |= drain(&mut tasks, cancel, |comparison| comparisons.push(comparison)).await;
        comparisons.sort_by_key(ComparisonResult::key);
        (comparisons, skipped, cancelled)
    }

    fn emit(&self, event: AnalysisEvent) {
        send_event(self.event_tx.as_ref(), event);
    }
}

async fn analyze_one(
    orchestrator: Arc<DocumentOrchestrator>,
    index: usize,
    document: Document,
    options: Arc<AnalysisOptions>,
    event_tx: Option<mpsc::Sender<AnalysisEvent>>,
    _permit: OwnedSemaphorePermit,
) -> (usize, AnalysisResult) {
    send_event(
        event_tx.as_ref(),
        AnalysisEvent::DocumentStarted {
            index,
            document_id: document.id.clone(),
        },
    );

    let analyzed = AssertUnwindSafe(orchestrator.analyze_with_events(
        &document,
        &options,
        event_tx.as_ref(),
    ))
    .catch_unwind()
    .await;
    let result = match analyzed {
        Ok(result) => result,
        Err(_) => {
            warn!("Analysis of {} panicked", document.id);
            AnalysisResult::aborted(document.id.clone(), "analysis task panicked")
        }
    };

    send_event(
        event_tx.as_ref(),
        AnalysisEvent::DocumentCompleted {
            index,
            document_id: document.id.clone(),
            status: result.status,
        },
    );
    (index, result)
}

/// Resolves once `cancel` reads `true`; never resolves if the sender is gone.
async fn cancellation(mut cancel: watch::Receiver<bool>) {
    if cancel.wait_for(|cancelled| *cancelled).await.is_err() {
        std::future::pending::<()>().await;
    }
}

async fn acquire_or_cancel(
    semaphore: &Arc<Semaphore>,
    cancel: &watch::Receiver<bool>,
) -> Option<OwnedSemaphorePermit> {
    tokio::select! {
        biased;
        _ = cancellation(cancel.clone()) => None,
        permit = semaphore.clone().acquire_owned() => permit.ok(),
    }
}

/// Collect finished tasks until the set is empty. On cancellation the rest
/// are aborted; tasks that already finished are still collected. Returns
/// whether cancellation fired.
async fn drain<T: Send + 'static>(
    tasks: &mut JoinSet<T>,
    cancel: &watch::Receiver<bool>,
    mut on_done: impl FnMut(T),
) -> bool {
    let mut cancelled = false;
    loop {
        let joined = if cancelled {
            tasks.join_next().await
        } else {
            tokio::select! {
                biased;
                _ = cancellation(cancel.clone()) => {
                    cancelled = true;
                    tasks.abort_all();
                    continue;
                }
                joined = tasks.join_next() => joined,
            }
        };
        match joined {
            None => break,
            Some(Ok(value)) => on_done(value),
            Some(Err(e)) if e.is_cancelled() => {}
            Some(Err(e)) => warn!("Worker task failed: {}", e),
        }
    }
    cancelled
}
