//! Aggregate statistics over analysis results.
//!
//! Pure functions of their input: computing twice over the same results
//! gives equal values.

use std::time::Duration;

use crate::models::{
    AnalysisResult, AnalysisStatus, BatchResult, Stage, StageOutcome, StagePayload,
    StageStatistics, Statistics,
};

/// Statistics for a batch, including its comparisons.
pub fn compute_statistics(batch: &BatchResult) -> Statistics {
    let mut stats = document_statistics(&batch.results);
    stats.comparisons_attempted = batch.comparisons.len();
    stats.comparisons_failed = batch
        .comparisons
        .iter()
        .filter(|c| c.outcome.is_failed())
        .count();
    stats.comparisons_skipped = batch.skipped_comparisons.len();
    stats
}

/// Statistics over document results alone.
pub fn document_statistics(results: &[AnalysisResult]) -> Statistics {
    let mut stats = Statistics {
        total_documents: results.len(),
        ..Statistics::default()
    };
    for stage in Stage::ALL {
        stats.stages.insert(stage, StageStatistics::default());
    }

    for result in results {
        match result.status {
            AnalysisStatus::Complete => stats.complete += 1,
            AnalysisStatus::Partial => stats.partial += 1,
            AnalysisStatus::Failed => stats.failed += 1,
        }
        stats.total_elapsed += result.elapsed;

        for record in &result.stages {
            let entry = stats.stages.entry(record.stage).or_default();
            match &record.outcome {
                StageOutcome::Success { .. } => entry.succeeded += 1,
                StageOutcome::Failed { .. } => entry.failed += 1,
                StageOutcome::Skipped { .. } => entry.skipped += 1,
            }
            if !record.outcome.is_skipped() {
                entry.total_elapsed += record.elapsed;
            }
            if let Some(payload) = record.outcome.payload() {
                tally_payload(&mut stats, payload);
            }
        }
    }

    for entry in stats.stages.values_mut() {
        entry.average_elapsed = average(entry.total_elapsed, entry.invocations());
    }
    stats
}

fn tally_payload(stats: &mut Statistics, payload: &StagePayload) {
    match payload {
        StagePayload::Extraction(extraction) => {
            stats.total_characters += extraction.characters;
            stats.total_words += extraction.words;
        }
        StagePayload::Entities(report) => {
            stats.total_entities += report.total_entities;
            for (category, values) in &report.entities {
                *stats
                    .entities_by_category
                    .entry(category.clone())
                    .or_default() += values.len();
            }
        }
        StagePayload::Clauses(report) => {
            stats.total_clauses += report.summary.total_clauses;
            stats.high_importance_clauses += report.summary.high_importance;
        }
        _ => {}
    }
}

fn average(total: Duration, count: usize) -> Duration {
    match u32::try_from(count) {
        Ok(0) => Duration::ZERO,
        Ok(n) => total / n,
        Err(_) => Duration::from_secs_f64(total.as_secs_f64() / count as f64),
    }
}
