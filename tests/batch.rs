//! Batch coordination: ordering, concurrency bounds, comparisons, cancellation.

mod common;

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};

use legaldoc::models::{
    AnalysisOptions, AnalysisStatus, BatchStatus, ErrorClass, SkippedComparison, StageOutcome,
};
use legaldoc::services::{compute_statistics, AnalysisEvent, BatchCoordinator, ServiceError};
use legaldoc::AnalysisError;

use common::{txt, Harness, StubAnalyzer, StubExtractor, HANG, PANIC, UNREADABLE};

fn coordinator(harness: &Harness) -> BatchCoordinator {
    BatchCoordinator::new(Arc::new(harness.orchestrator()))
}

fn compare_options() -> AnalysisOptions {
    AnalysisOptions {
        compare_documents: true,
        ..AnalysisOptions::extraction_only()
    }
}

#[tokio::test]
async fn test_results_keep_input_order_under_random_latency() {
    let harness = Harness::new(
        StubExtractor {
            max_latency_ms: 15,
            ..Default::default()
        },
        StubAnalyzer {
            max_latency_ms: 15,
            ..Default::default()
        },
    );
    let documents: Vec<_> = (0..12)
        .map(|i| txt(&format!("doc-{i}.txt"), &format!("Agreement number {i}")))
        .collect();

    let batch = coordinator(&harness)
        .analyze_batch(documents, &AnalysisOptions::default(), 4)
        .await
        .unwrap();

    assert_eq!(batch.status, BatchStatus::Completed);
    let ids: Vec<&str> = batch.results.iter().map(|r| r.document_id.as_str()).collect();
    let expected: Vec<String> = (0..12).map(|i| format!("doc-{i}.txt")).collect();
    assert_eq!(ids, expected);
    assert!(batch
        .results
        .iter()
        .all(|r| r.status == AnalysisStatus::Complete));
}

#[tokio::test]
async fn test_concurrency_limit_is_respected() {
    let extractor = StubExtractor {
        max_latency_ms: 10,
        ..Default::default()
    };
    // One gauge across extraction and summarization counts documents in flight.
    let analyzer = StubAnalyzer {
        max_latency_ms: 10,
        gauge: extractor.gauge.clone(),
        ..Default::default()
    };
    let harness = Harness::new(extractor, analyzer);
    let documents: Vec<_> = (0..10)
        .map(|i| txt(&format!("doc-{i}.txt"), "The parties agree."))
        .collect();

    let batch = coordinator(&harness)
        .analyze_batch(documents, &AnalysisOptions::default(), 2)
        .await
        .unwrap();

    assert_eq!(batch.results.len(), 10);
    let max = harness.extractor.gauge.max();
    assert!(max <= 2, "saw {} concurrent calls", max);
    assert!(max >= 1);
}

#[tokio::test]
async fn test_zero_concurrency_is_rejected() {
    let harness = Harness::default();
    let err = coordinator(&harness)
        .analyze_batch(vec![txt("a.txt", "text")], &AnalysisOptions::default(), 0)
        .await
        .unwrap_err();
    assert_eq!(err, AnalysisError::InvalidConcurrency);
    assert_eq!(harness.extractor.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_empty_batch() {
    let harness = Harness::default();
    let batch = coordinator(&harness)
        .analyze_batch(Vec::new(), &compare_options(), 3)
        .await
        .unwrap();
    assert_eq!(batch.status, BatchStatus::Completed);
    assert!(batch.results.is_empty());
    assert!(batch.comparisons.is_empty());
    assert_eq!(batch.statistics.total_documents, 0);
}

#[tokio::test]
async fn test_comparisons_skip_failed_documents() {
    let harness = Harness::default();
    let documents = vec![
        txt("lease.txt", "Lease between A and B."),
        txt("scan.txt", UNREADABLE),
        txt("amendment.txt", "Amendment to the lease."),
    ];

    let batch = coordinator(&harness)
        .analyze_batch(documents, &compare_options(), 2)
        .await
        .unwrap();

    assert_eq!(batch.results[1].status, AnalysisStatus::Failed);
    assert_eq!(batch.comparisons.len(), 1);
    let comparison = &batch.comparisons[0];
    assert_eq!(comparison.key(), (0, 2));
    assert_eq!(comparison.left_id, "lease.txt");
    assert_eq!(comparison.right_id, "amendment.txt");
    assert!(comparison.outcome.is_success());
    assert_eq!(harness.analyzer.compare_calls.load(Ordering::SeqCst), 1);

    assert_eq!(
        batch.skipped_comparisons,
        vec![
            SkippedComparison {
                left: 0,
                right: 1,
                failed: vec![1]
            },
            SkippedComparison {
                left: 1,
                right: 2,
                failed: vec![1]
            },
        ]
    );
    assert_eq!(batch.statistics.comparisons_attempted, 1);
    assert_eq!(batch.statistics.comparisons_skipped, 2);
}

#[tokio::test]
async fn test_every_pair_compared_in_order() {
    let harness = Harness::default();
    let documents: Vec<_> = (0..4)
        .map(|i| txt(&format!("doc-{i}.txt"), &format!("Contract {i}")))
        .collect();

    let batch = coordinator(&harness)
        .analyze_batch(documents, &compare_options(), 3)
        .await
        .unwrap();

    let keys: Vec<(usize, usize)> = batch.comparisons.iter().map(|c| c.key()).collect();
    assert_eq!(keys, vec![(0, 1), (0, 2), (0, 3), (1, 2), (1, 3), (2, 3)]);
    assert!(batch.skipped_comparisons.is_empty());
}

#[tokio::test]
async fn test_failed_comparison_is_recorded() {
    let analyzer = StubAnalyzer::default();
    analyzer.compare_script.push(ServiceError::InvalidInput("too long".into()));
    let harness = Harness::new(StubExtractor::default(), analyzer);
    let documents = vec![txt("a.txt", "First."), txt("b.txt", "Second.")];

    let batch = coordinator(&harness)
        .analyze_batch(documents, &compare_options(), 2)
        .await
        .unwrap();

    let comparison = batch.comparison(0, 1).unwrap();
    assert_eq!(comparison.attempts, 1);
    assert!(matches!(
        comparison.outcome,
        StageOutcome::Failed {
            kind: ErrorClass::Permanent,
            ..
        }
    ));
    assert_eq!(batch.statistics.comparisons_failed, 1);
}

#[tokio::test]
async fn test_single_document_has_no_comparisons() {
    let harness = Harness::default();
    let batch = coordinator(&harness)
        .analyze_batch(vec![txt("a.txt", "Only one.")], &compare_options(), 2)
        .await
        .unwrap();
    assert!(batch.comparisons.is_empty());
    assert!(batch.skipped_comparisons.is_empty());
    assert_eq!(harness.analyzer.compare_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_cancellation_keeps_completed_results() {
    let harness = Harness::default();
    let documents = vec![
        txt("doc-0.txt", "Ready."),
        txt("doc-1.txt", "Ready."),
        txt("doc-2.txt", HANG),
        txt("doc-3.txt", HANG),
        txt("doc-4.txt", "Never scheduled."),
    ];

    let (event_tx, mut event_rx) = mpsc::channel(256);
    let (cancel_tx, cancel_rx) = watch::channel(false);
    let watcher = tokio::spawn(async move {
        let mut completed = 0;
        while let Some(event) = event_rx.recv().await {
            if let AnalysisEvent::DocumentCompleted { .. } = event {
                completed += 1;
                if completed == 2 {
                    let _ = cancel_tx.send(true);
                }
            }
            if let AnalysisEvent::BatchCompleted {
                status,
                analyzed,
                not_analyzed,
            } = event
            {
                return Some((status, analyzed, not_analyzed));
            }
        }
        None
    });

    let batch = {
        let coordinator = coordinator(&harness).with_events(event_tx);
        coordinator
            .analyze_batch_cancellable(documents, &compare_options(), 2, cancel_rx)
            .await
            .unwrap()
    };

    assert_eq!(batch.status, BatchStatus::Cancelled);
    let ids: Vec<&str> = batch.results.iter().map(|r| r.document_id.as_str()).collect();
    assert_eq!(ids, vec!["doc-0.txt", "doc-1.txt"]);
    assert_eq!(batch.not_analyzed, vec!["doc-2.txt", "doc-3.txt", "doc-4.txt"]);
    assert!(batch.comparisons.is_empty());
    assert_eq!(harness.analyzer.compare_calls.load(Ordering::SeqCst), 0);
    assert_eq!(batch.statistics.total_documents, 2);

    assert_eq!(
        watcher.await.unwrap(),
        Some((BatchStatus::Cancelled, 2, 3))
    );
}

#[tokio::test]
async fn test_unread_event_channel_does_not_stall_batch() {
    let harness = Harness::default();
    let documents = vec![
        txt("lease.txt", "The tenant pays rent."),
        txt("nda.txt", "The recipient keeps secrets."),
    ];

    // Capacity one and never drained: every send after the first finds it full.
    let (event_tx, _event_rx) = mpsc::channel(1);
    let coordinator = coordinator(&harness).with_events(event_tx);
    let batch = tokio::time::timeout(
        Duration::from_secs(3),
        coordinator.analyze_batch(documents, &AnalysisOptions::all(), 2),
    )
    .await
    .expect("batch finished despite a stalled listener")
    .unwrap();

    assert_eq!(batch.status, BatchStatus::Completed);
    assert_eq!(batch.results.len(), 2);
    assert!(batch
        .results
        .iter()
        .all(|r| r.status == AnalysisStatus::Complete));
    assert_eq!(batch.comparisons.len(), 1);
}

#[tokio::test]
async fn test_panicking_document_does_not_sink_the_batch() {
    let harness = Harness::default();
    let documents = vec![
        txt("good.txt", "Fine."),
        txt("bad.txt", PANIC),
        txt("also-good.txt", "Also fine."),
    ];

    let batch = coordinator(&harness)
        .analyze_batch(documents, &AnalysisOptions::default(), 3)
        .await
        .unwrap();

    assert_eq!(batch.status, BatchStatus::Completed);
    assert_eq!(batch.results.len(), 3);
    assert_eq!(batch.results[0].status, AnalysisStatus::Complete);
    assert_eq!(batch.results[1].status, AnalysisStatus::Failed);
    assert_eq!(batch.results[1].document_id, "bad.txt");
    assert_eq!(batch.results[2].status, AnalysisStatus::Complete);
}

#[tokio::test]
async fn test_statistics_are_consistent_and_idempotent() {
    let analyzer = StubAnalyzer::default();
    analyzer.risk_script.push(ServiceError::Http {
        status: 401,
        message: "unauthorized".into(),
    });
    let harness = Harness::new(StubExtractor::default(), analyzer);
    let documents = vec![
        txt("a.txt", "one two three"),
        txt("b.txt", UNREADABLE),
        txt("c.txt", "four five"),
    ];

    let batch = coordinator(&harness)
        .analyze_batch(documents, &AnalysisOptions::default(), 1)
        .await
        .unwrap();

    let stats = &batch.statistics;
    assert_eq!(stats.total_documents, 3);
    assert_eq!(stats.complete + stats.partial + stats.failed, 3);
    assert_eq!(stats.failed, 1);
    assert_eq!(stats.partial, 1);
    assert_eq!(stats.complete, 1);
    assert_eq!(stats.total_words, 5);
    // Two successful entity extractions of three entities each.
    assert_eq!(stats.total_entities, 6);
    assert_eq!(stats.entities_by_category["PERSONS"], 4);
    assert_eq!(stats.total_clauses, 2);
    assert_eq!(stats.high_importance_clauses, 2);

    assert_eq!(&compute_statistics(&batch), stats);
    assert_eq!(compute_statistics(&batch), compute_statistics(&batch));
}
