//! In-memory collaborators for integration tests.

#![allow(dead_code)]

use std::collections::{BTreeMap, VecDeque};
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use rand::Rng;

use legaldoc::models::{
    Clause, ClauseImportance, ClauseReport, ComparisonReport, Document, EntityExtractionType,
    EntityReport, ExtractedText, RelationshipReport, RiskReport, Summary, SummaryType,
};
use legaldoc::services::{
    ClauseExtractor, DocumentComparer, EntityExtractor, QuestionSuggester, RelationshipExtractor,
    RetryPolicy, RiskAssessor, ServiceError, StageClients, Summarizer, TextExtractor,
};
use legaldoc::DocumentOrchestrator;

/// Content marker that makes the stub extractor fail permanently.
pub const UNREADABLE: &str = "%%unreadable%%";
/// Content marker that makes the stub extractor never return.
pub const HANG: &str = "%%hang%%";
/// Content marker that makes the stub extractor panic.
pub const PANIC: &str = "%%panic%%";

/// Tracks how many calls are in flight and the highest count seen.
#[derive(Default)]
pub struct Gauge {
    active: AtomicUsize,
    max: AtomicUsize,
}

pub struct GaugeGuard<'a>(&'a Gauge);

impl Gauge {
    pub fn enter(&self) -> GaugeGuard<'_> {
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.max.fetch_max(now, Ordering::SeqCst);
        GaugeGuard(self)
    }

    pub fn max(&self) -> usize {
        self.max.load(Ordering::SeqCst)
    }
}

impl Drop for GaugeGuard<'_> {
    fn drop(&mut self) {
        self.0.active.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Errors returned, in order, before a call starts succeeding.
#[derive(Default)]
pub struct Script(Mutex<VecDeque<ServiceError>>);

impl Script {
    pub fn push(&self, error: ServiceError) {
        self.0.lock().unwrap().push_back(error);
    }

    fn next(&self) -> Option<ServiceError> {
        self.0.lock().unwrap().pop_front()
    }
}

/// Random latency in `[0, max_ms)` milliseconds, if enabled.
async fn jitter(max_ms: u64) {
    if max_ms > 0 {
        let ms = rand::thread_rng().gen_range(0..max_ms);
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }
}

/// Decodes content as UTF-8 and honours the content markers.
#[derive(Default)]
pub struct StubExtractor {
    pub calls: AtomicU32,
    pub script: Script,
    pub gauge: Arc<Gauge>,
    pub max_latency_ms: u64,
}

#[async_trait]
impl TextExtractor for StubExtractor {
    async fn extract_text(&self, document: &Document) -> Result<ExtractedText, ServiceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let _active = self.gauge.enter();
        jitter(self.max_latency_ms).await;

        let text = String::from_utf8_lossy(&document.content).into_owned();
        if text.contains(HANG) {
            std::future::pending::<()>().await;
        }
        if text.contains(PANIC) {
            panic!("extractor blew up on {}", document.id);
        }
        if text.contains(UNREADABLE) {
            return Err(ServiceError::InvalidInput("unreadable".into()));
        }
        if let Some(error) = self.script.next() {
            return Err(error);
        }
        Ok(ExtractedText {
            text,
            pages: Some(1),
            confidence: Some(1.0),
        })
    }
}

/// Serves every downstream stage with canned payloads.
#[derive(Default)]
pub struct StubAnalyzer {
    pub summarize_calls: AtomicU32,
    pub bullet_calls: AtomicU32,
    pub entity_calls: AtomicU32,
    pub risk_calls: AtomicU32,
    pub relationship_calls: AtomicU32,
    pub clause_calls: AtomicU32,
    pub question_calls: AtomicU32,
    pub compare_calls: AtomicU32,
    pub summarize_script: Script,
    pub entity_script: Script,
    pub risk_script: Script,
    pub question_script: Script,
    pub compare_script: Script,
    pub compared: Mutex<Vec<(String, String)>>,
    /// Clause types passed to each clause extraction call.
    pub clause_types_seen: Mutex<Vec<Vec<String>>>,
    pub gauge: Arc<Gauge>,
    pub max_latency_ms: u64,
}

impl StubAnalyzer {
    pub fn total_calls(&self) -> u32 {
        [
            &self.summarize_calls,
            &self.bullet_calls,
            &self.entity_calls,
            &self.risk_calls,
            &self.relationship_calls,
            &self.clause_calls,
            &self.question_calls,
            &self.compare_calls,
        ]
        .iter()
        .map(|c| c.load(Ordering::SeqCst))
        .sum()
    }
}

#[async_trait]
impl Summarizer for StubAnalyzer {
    async fn summarize(
        &self,
        text: &str,
        summary_type: SummaryType,
    ) -> Result<Summary, ServiceError> {
        self.summarize_calls.fetch_add(1, Ordering::SeqCst);
        let _active = self.gauge.enter();
        jitter(self.max_latency_ms).await;
        if let Some(error) = self.summarize_script.next() {
            return Err(error);
        }
        let length = text.chars().count();
        Ok(Summary::new(
            format!("A {} summary", summary_type.as_str()),
            summary_type,
            length,
        ))
    }

    async fn bullet_points(&self, _text: &str) -> Result<Vec<String>, ServiceError> {
        self.bullet_calls.fetch_add(1, Ordering::SeqCst);
        Ok(vec!["1. Rent is due monthly".into()])
    }
}

#[async_trait]
impl EntityExtractor for StubAnalyzer {
    async fn extract_entities(
        &self,
        _text: &str,
        extraction_type: EntityExtractionType,
    ) -> Result<EntityReport, ServiceError> {
        self.entity_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(error) = self.entity_script.next() {
            return Err(error);
        }
        let mut entities = BTreeMap::new();
        entities.insert(
            "PERSONS".to_string(),
            vec!["Jane Roe".to_string(), "John Doe".to_string()],
        );
        entities.insert("DATES".to_string(), vec!["1 March 2024".to_string()]);
        Ok(EntityReport::new(entities, extraction_type))
    }
}

#[async_trait]
impl RiskAssessor for StubAnalyzer {
    async fn assess_risks(&self, _text: &str) -> Result<RiskReport, ServiceError> {
        self.risk_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(error) = self.risk_script.next() {
            return Err(error);
        }
        Ok(RiskReport {
            high_risks: vec!["Unlimited liability".into()],
            ..RiskReport::default()
        })
    }
}

#[async_trait]
impl RelationshipExtractor for StubAnalyzer {
    async fn extract_relationships(&self, _text: &str) -> Result<RelationshipReport, ServiceError> {
        self.relationship_calls.fetch_add(1, Ordering::SeqCst);
        let mut relationships = BTreeMap::new();
        relationships.insert(
            "FINANCIAL_RELATIONSHIPS".to_string(),
            vec!["Tenant pays Landlord".to_string()],
        );
        Ok(RelationshipReport::new(relationships))
    }
}

#[async_trait]
impl ClauseExtractor for StubAnalyzer {
    async fn extract_clauses(
        &self,
        text: &str,
        clause_types: &[String],
    ) -> Result<ClauseReport, ServiceError> {
        self.clause_calls.fetch_add(1, Ordering::SeqCst);
        self.clause_types_seen
            .lock()
            .unwrap()
            .push(clause_types.to_vec());
        let clause = Clause {
            clause_type: "PAYMENT".to_string(),
            clause_text: "Rent is payable on the first day of each month.".to_string(),
            context: "Monthly rent".to_string(),
            importance: ClauseImportance::High,
            section: "Section 2".to_string(),
        };
        Ok(ClauseReport::new(
            vec![clause],
            clause_types.to_vec(),
            text.chars().count(),
        ))
    }
}

#[async_trait]
impl QuestionSuggester for StubAnalyzer {
    async fn suggest_questions(&self, _text: &str) -> Result<Vec<String>, ServiceError> {
        self.question_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(error) = self.question_script.next() {
            return Err(error);
        }
        Ok(vec!["When is rent due?".to_string()])
    }
}

#[async_trait]
impl DocumentComparer for StubAnalyzer {
    async fn compare_documents(
        &self,
        _left_text: &str,
        _right_text: &str,
        left_name: &str,
        right_name: &str,
    ) -> Result<ComparisonReport, ServiceError> {
        self.compare_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(error) = self.compare_script.next() {
            return Err(error);
        }
        self.compared
            .lock()
            .unwrap()
            .push((left_name.to_string(), right_name.to_string()));
        Ok(ComparisonReport {
            comparison_text: format!("{} differs from {}", left_name, right_name),
            left_name: left_name.to_string(),
            right_name: right_name.to_string(),
            analyzed_at: Utc::now(),
        })
    }
}

/// Retry policy with near-zero delays.
pub fn fast_policy() -> RetryPolicy {
    RetryPolicy::default()
        .with_base_delay(Duration::from_millis(1))
        .with_rate_limit_delay(Duration::from_millis(2))
        .with_max_delay(Duration::from_millis(10))
}

pub struct Harness {
    pub extractor: Arc<StubExtractor>,
    pub analyzer: Arc<StubAnalyzer>,
}

impl Harness {
    pub fn new(extractor: StubExtractor, analyzer: StubAnalyzer) -> Self {
        Self {
            extractor: Arc::new(extractor),
            analyzer: Arc::new(analyzer),
        }
    }

    pub fn clients(&self) -> StageClients {
        StageClients::from_analyzer(self.extractor.clone(), self.analyzer.clone())
    }

    pub fn orchestrator(&self) -> DocumentOrchestrator {
        DocumentOrchestrator::new(self.clients())
            .with_retry_policy(fast_policy())
            .unwrap()
    }
}

impl Default for Harness {
    fn default() -> Self {
        Self::new(StubExtractor::default(), StubAnalyzer::default())
    }
}

pub fn txt(id: &str, body: &str) -> Document {
    Document::new(id, body.as_bytes().to_vec(), "txt")
}
