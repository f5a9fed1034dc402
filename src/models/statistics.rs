//! Summary metrics over a set of analysis results.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::result::Stage;

/// Outcome counts and timing for one stage across a batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageStatistics {
    pub succeeded: usize,
    pub failed: usize,
    pub skipped: usize,
    pub total_elapsed: Duration,
    /// Mean over invocations that ran (succeeded or failed).
    pub average_elapsed: Duration,
}

impl StageStatistics {
    pub fn invocations(&self) -> usize {
        self.succeeded + self.failed
    }

    pub fn failure_rate(&self) -> f64 {
        match self.invocations() {
            0 => 0.0,
            n => self.failed as f64 / n as f64,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Statistics {
    pub total_documents: usize,
    pub complete: usize,
    pub partial: usize,
    pub failed: usize,
    pub stages: BTreeMap<Stage, StageStatistics>,
    /// Sum of the entity totals reported by successful entity extractions.
    pub total_entities: usize,
    pub entities_by_category: BTreeMap<String, usize>,
    /// Clauses found by successful clause extractions.
    pub total_clauses: usize,
    pub high_importance_clauses: usize,
    pub total_characters: usize,
    pub total_words: usize,
    pub comparisons_attempted: usize,
    pub comparisons_failed: usize,
    pub comparisons_skipped: usize,
    pub total_elapsed: Duration,
}

impl Statistics {
    /// Fraction of documents whose status is `failed`.
    pub fn document_failure_rate(&self) -> f64 {
        match self.total_documents {
            0 => 0.0,
            n => self.failed as f64 / n as f64,
        }
    }
}
