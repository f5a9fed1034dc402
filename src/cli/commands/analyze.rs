//! The `analyze` command: run a batch and report the outcome.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Context;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::{mpsc, watch};

use crate::cli::helpers::{error, format_duration, status_label, success, truncate, warning};
use crate::config::{resolve_path, Settings};
use crate::extract::LocalTextExtractor;
use crate::llm::LlmAnalyzer;
use crate::models::{AnalysisOptions, BatchResult, Document, Stage, StageOutcome, StagePayload};
use crate::services::{
    AnalysisEvent, BatchCoordinator, DocumentOrchestrator, StageClients, StageEventKind,
};

use super::AnalyzeArgs;

const EVENT_BUFFER: usize = 256;

pub async fn cmd_analyze(settings: &Settings, args: AnalyzeArgs) -> anyhow::Result<()> {
    let options = build_options(&args)?;
    let concurrency = args.concurrency.unwrap_or(settings.concurrency);
    let max_file_size = args
        .max_file_size_mb
        .map(|mb| mb.saturating_mul(1024 * 1024))
        .unwrap_or_else(|| settings.max_file_size());

    let mut documents = Vec::with_capacity(args.files.len());
    for path in &args.files {
        let path = resolve_path(path);
        let document = Document::from_path_limited(&path, max_file_size)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        documents.push(document);
    }
    if !args.json {
        for (first, second) in duplicate_inputs(&documents) {
            eprintln!(
                "{} {} has the same content as {}",
                warning(),
                second,
                first
            );
        }
    }

    let mut llm_config = settings.llm.clone();
    if let Some(endpoint) = &args.endpoint {
        llm_config = llm_config.with_endpoint(endpoint);
    }
    if let Some(model) = &args.model {
        llm_config = llm_config.with_model(model);
    }
    let analyzer = LlmAnalyzer::new(llm_config.clone()).context("Failed to build LLM client")?;
    if !analyzer.client().is_available().await {
        eprintln!(
            "{} LLM service not reachable at {}; LLM stages will fail",
            warning(),
            llm_config.endpoint
        );
    }

    let clients =
        StageClients::from_analyzer(Arc::new(LocalTextExtractor::new()), Arc::new(analyzer));
    let orchestrator = DocumentOrchestrator::new(clients)
        .with_retry_policy(settings.retry_policy())?
        .with_max_file_size(max_file_size);

    let total = documents.len();
    if !args.json {
        eprintln!(
            "{} Analyzing {} documents with {} (concurrency {})",
            style("→").cyan(),
            total,
            llm_config.model,
            concurrency
        );
    }

    let pb = if args.json {
        ProgressBar::hidden()
    } else {
        let pb = ProgressBar::new(total as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:30.cyan/blue}] {pos}/{len} {wide_msg}")?
                .progress_chars("#>-"),
        );
        pb
    };

    let (event_tx, event_rx) = mpsc::channel(EVENT_BUFFER);
    let progress = tokio::spawn(track_progress(event_rx, pb.clone()));

    let (cancel_tx, cancel_rx) = watch::channel(false);
    let interrupt_pb = pb.clone();
    let interrupt = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            interrupt_pb.println(format!(
                "{} Interrupted, finishing up (completed results are kept)",
                warning()
            ));
            let _ = cancel_tx.send(true);
        }
    });

    let batch = {
        let coordinator = BatchCoordinator::new(Arc::new(orchestrator)).with_events(event_tx);
        coordinator
            .analyze_batch_cancellable(documents, &options, concurrency, cancel_rx)
            .await?
    };
    interrupt.abort();
    let _ = progress.await;
    pb.finish_and_clear();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&batch)?);
    } else {
        print_report(&batch);
    }
    Ok(())
}

/// Turn the flags into option pairs so everything goes through one validator.
fn build_options(args: &AnalyzeArgs) -> anyhow::Result<AnalysisOptions> {
    let flag = |on: bool| on.to_string();
    let mut pairs: Vec<(String, String)> = vec![
        ("summary_type".into(), args.summary_type.as_str().into()),
        (
            "entity_extraction_type".into(),
            args.entity_type.as_str().into(),
        ),
        ("generate_summary".into(), flag(!args.no_summary)),
        ("generate_bullet_points".into(), flag(!args.no_bullet_points)),
        ("extract_entities".into(), flag(!args.no_entities)),
        ("analyze_risks".into(), flag(!args.no_risks)),
        ("extract_relationships".into(), flag(args.relationships)),
        ("extract_clauses".into(), flag(!args.no_clauses)),
        ("generate_qa_suggestions".into(), flag(!args.no_questions)),
        ("compare_documents".into(), flag(args.compare)),
    ];
    if !args.clause_types.is_empty() {
        pairs.push(("clause_types".into(), args.clause_types.join(",")));
    }
    pairs.extend(args.options.iter().cloned());
    Ok(AnalysisOptions::from_pairs(pairs)?)
}

/// Pairs of (first id, later id) whose contents are byte-identical.
fn duplicate_inputs(documents: &[Document]) -> Vec<(&str, &str)> {
    let mut seen: HashMap<String, &str> = HashMap::new();
    let mut duplicates = Vec::new();
    for document in documents.iter().filter(|d| !d.content.is_empty()) {
        match seen.entry(document.content_hash()) {
            Entry::Occupied(first) => duplicates.push((*first.get(), document.id.as_str())),
            Entry::Vacant(slot) => {
                slot.insert(document.id.as_str());
            }
        }
    }
    duplicates
}

async fn track_progress(mut rx: mpsc::Receiver<AnalysisEvent>, pb: ProgressBar) {
    while let Some(event) = rx.recv().await {
        match event {
            AnalysisEvent::DocumentStarted { document_id, .. } => {
                pb.set_message(truncate(&document_id, 40));
            }
            AnalysisEvent::StageFinished {
                document_id,
                stage,
                kind: StageEventKind::Failed(class),
                attempts,
            } => {
                pb.println(format!(
                    "  {} {} {} failed ({}, {} attempts)",
                    error(),
                    truncate(&document_id, 30),
                    stage,
                    class,
                    attempts
                ));
            }
            AnalysisEvent::StageFinished { .. } => {}
            AnalysisEvent::DocumentCompleted {
                document_id,
                status,
                ..
            } => {
                pb.set_message(format!("{} {}", truncate(&document_id, 40), status));
                pb.inc(1);
            }
            AnalysisEvent::ComparisonCompleted {
                left,
                right,
                succeeded,
            } => {
                let mark = if succeeded { success() } else { error() };
                pb.set_message(format!("{} compared #{} and #{}", mark, left + 1, right + 1));
            }
            AnalysisEvent::BatchCompleted { .. } => break,
        }
    }
}

fn print_report(batch: &BatchResult) {
    println!("\n{}", style("Analysis Results").bold());
    println!("{}", "-".repeat(60));

    for result in &batch.results {
        println!(
            "  {:<40} {:<9} {}",
            truncate(&result.document_id, 40),
            status_label(result.status),
            style(format_duration(result.elapsed)).dim()
        );
        if let Some(reason) = &result.rejection {
            println!("      {} {}", style("→").dim(), reason);
        }
        for (stage, class, message) in result.failed_stages() {
            println!(
                "      {} {} [{}]: {}",
                style("→").dim(),
                stage,
                class,
                truncate(message, 80)
            );
        }
        if let Some(StageOutcome::Success {
            payload: StagePayload::Summary(summary),
        }) = result.stage(Stage::Summarize).map(|r| &r.outcome)
        {
            println!("      {}", style(truncate(&summary.summary, 160)).dim());
        }
        if let Some(StageOutcome::Success {
            payload: StagePayload::Clauses(report),
        }) = result.stage(Stage::ExtractClauses).map(|r| &r.outcome)
        {
            println!(
                "      {} clauses ({} high importance)",
                report.summary.total_clauses, report.summary.high_importance
            );
        }
        if let Some(StageOutcome::Success {
            payload: StagePayload::SuggestedQuestions { questions },
        }) = result.stage(Stage::SuggestQuestions).map(|r| &r.outcome)
        {
            for question in questions.iter().take(3) {
                println!("      {} {}", style("?").cyan(), truncate(question, 100));
            }
        }
    }

    if !batch.not_analyzed.is_empty() {
        println!(
            "\n{} {} documents not analyzed (cancelled):",
            warning(),
            batch.not_analyzed.len()
        );
        for id in &batch.not_analyzed {
            println!("  - {}", id);
        }
    }

    if !batch.comparisons.is_empty() || !batch.skipped_comparisons.is_empty() {
        println!("\n{}", style("Comparisons").bold());
        for comparison in &batch.comparisons {
            match &comparison.outcome {
                StageOutcome::Failed { kind, message } => println!(
                    "  {} {} vs {} [{}]: {}",
                    error(),
                    comparison.left_id,
                    comparison.right_id,
                    kind,
                    truncate(message, 60)
                ),
                _ => println!(
                    "  {} {} vs {}",
                    success(),
                    comparison.left_id,
                    comparison.right_id
                ),
            }
        }
        if !batch.skipped_comparisons.is_empty() {
            println!(
                "  {} {} pairs skipped (failed documents)",
                style("○").dim(),
                batch.skipped_comparisons.len()
            );
        }
    }

    let stats = &batch.statistics;
    println!("\n{}", style("Statistics").bold());
    println!(
        "  Documents: {} ({} complete, {} partial, {} failed)",
        stats.total_documents, stats.complete, stats.partial, stats.failed
    );
    println!(
        "  Extracted: {} characters, {} words",
        stats.total_characters, stats.total_words
    );
    if stats.total_entities > 0 {
        println!("  Entities:  {}", stats.total_entities);
        for (category, count) in &stats.entities_by_category {
            println!("    {:<24} {}", category, count);
        }
    }
    if stats.total_clauses > 0 {
        println!(
            "  Clauses:   {} ({} high importance)",
            stats.total_clauses, stats.high_importance_clauses
        );
    }
    println!(
        "  {:<22} {:>9} {:>7} {:>8} {:>9}",
        "Stage", "succeeded", "failed", "skipped", "avg"
    );
    for (stage, stage_stats) in &stats.stages {
        println!(
            "  {:<22} {:>9} {:>7} {:>8} {:>9}",
            stage.as_str(),
            stage_stats.succeeded,
            stage_stats.failed,
            stage_stats.skipped,
            format_duration(stage_stats.average_elapsed)
        );
    }

    if batch.is_cancelled() {
        println!("\n{} Batch cancelled", warning());
    } else if stats.failed == 0 && stats.partial == 0 {
        println!("\n{} All documents analyzed", success());
    }
}
