//! Progress events emitted while documents are analyzed.

use tokio::sync::mpsc;
use tracing::debug;

use crate::models::{AnalysisStatus, BatchStatus, ErrorClass, SkipReason, Stage, StageOutcome};

/// How a stage ended, without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageEventKind {
    Succeeded,
    Failed(ErrorClass),
    Skipped(SkipReason),
}

impl<P> From<&StageOutcome<P>> for StageEventKind {
    fn from(outcome: &StageOutcome<P>) -> Self {
        match outcome {
            StageOutcome::Success { .. } => Self::Succeeded,
            StageOutcome::Failed { kind, .. } => Self::Failed(*kind),
            StageOutcome::Skipped { reason } => Self::Skipped(*reason),
        }
    }
}

/// Events emitted during analysis for progress tracking.
#[derive(Debug, Clone)]
pub enum AnalysisEvent {
    /// A worker picked up a document.
    DocumentStarted { index: usize, document_id: String },
    StageFinished {
        document_id: String,
        stage: Stage,
        kind: StageEventKind,
        attempts: u32,
    },
    DocumentCompleted {
        index: usize,
        document_id: String,
        status: AnalysisStatus,
    },
    ComparisonCompleted {
        left: usize,
        right: usize,
        succeeded: bool,
    },
    BatchCompleted {
        status: BatchStatus,
        analyzed: usize,
        not_analyzed: usize,
    },
}

/// Hand `event` to the listener without waiting. A full or closed channel
/// drops the event; analysis never stalls on a slow listener.
pub(crate) fn send_event(events: Option<&mpsc::Sender<AnalysisEvent>>, event: AnalysisEvent) {
    if let Some(tx) = events {
        if let Err(e) = tx.try_send(event) {
            debug!("Dropped progress event: {}", e);
        }
    }
}
