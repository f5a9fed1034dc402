//! Typed payloads returned by the analysis collaborators.
//!
//! Collaborators parse their raw responses into these once, at the boundary;
//! the orchestrator only moves them around and counts what they report.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::options::{EntityExtractionType, SummaryType};

/// Raw extraction output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedText {
    pub text: String,
    pub pages: Option<u32>,
    pub confidence: Option<f32>,
}

impl ExtractedText {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            pages: None,
            confidence: None,
        }
    }
}

/// Recorded on a successful extract stage; the text itself lives on the result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionSummary {
    pub characters: usize,
    pub words: usize,
    pub pages: Option<u32>,
    pub confidence: Option<f32>,
}

impl ExtractionSummary {
    pub fn from_extracted(extracted: &ExtractedText) -> Self {
        Self {
            characters: extracted.text.chars().count(),
            words: extracted.text.split_whitespace().count(),
            pages: extracted.pages,
            confidence: extracted.confidence,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub summary: String,
    pub summary_type: SummaryType,
    pub key_points: Vec<String>,
    pub original_length: usize,
    pub summary_length: usize,
    pub compression_ratio: f64,
}

impl Summary {
    pub fn new(summary: String, summary_type: SummaryType, original_length: usize) -> Self {
        let summary_length = summary.chars().count();
        let compression_ratio = if original_length > 0 {
            summary_length as f64 / original_length as f64
        } else {
            0.0
        };
        Self {
            summary,
            summary_type,
            key_points: Vec::new(),
            original_length,
            summary_length,
            compression_ratio,
        }
    }
}

/// Entities grouped by category, plus the count the extractor reports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityReport {
    pub entities: BTreeMap<String, Vec<String>>,
    pub extraction_type: EntityExtractionType,
    pub total_entities: usize,
}

impl EntityReport {
    pub fn new(
        entities: BTreeMap<String, Vec<String>>,
        extraction_type: EntityExtractionType,
    ) -> Self {
        let total_entities = entities.values().map(Vec::len).sum();
        Self {
            entities,
            extraction_type,
            total_entities,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RiskReport {
    pub high_risks: Vec<String>,
    pub medium_risks: Vec<String>,
    pub recommendations: Vec<String>,
    pub compliance_notes: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationshipReport {
    pub relationships: BTreeMap<String, Vec<String>>,
    pub total_relationships: usize,
}

impl RelationshipReport {
    pub fn new(relationships: BTreeMap<String, Vec<String>>) -> Self {
        let total_relationships = relationships.values().map(Vec::len).sum();
        Self {
            relationships,
            total_relationships,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonReport {
    pub comparison_text: String,
    pub left_name: String,
    pub right_name: String,
    pub analyzed_at: DateTime<Utc>,
}

/// How much attention a clause deserves.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum ClauseImportance {
    High,
    #[default]
    Medium,
    Low,
}

impl ClauseImportance {
    /// Lenient parse; anything unrecognized is `Medium`.
    pub fn parse(s: &str) -> Self {
        match s.trim().to_uppercase().as_str() {
            "HIGH" => Self::High,
            "LOW" => Self::Low,
            _ => Self::Medium,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::High => "HIGH",
            Self::Medium => "MEDIUM",
            Self::Low => "LOW",
        }
    }
}

/// One clause quoted from a document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Clause {
    pub clause_type: String,
    pub clause_text: String,
    /// Plain-language explanation of the clause.
    pub context: String,
    pub importance: ClauseImportance,
    /// Section or paragraph reference, `Unknown` when not identifiable.
    pub section: String,
}

/// Rule-based digest of the extracted clauses.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClauseSummary {
    pub total_clauses: usize,
    pub high_importance: usize,
    pub clause_distribution: BTreeMap<String, usize>,
    pub importance_distribution: BTreeMap<ClauseImportance, usize>,
    pub key_findings: Vec<String>,
    pub recommendations: Vec<String>,
}

impl ClauseSummary {
    pub fn from_clauses(clauses: &[Clause]) -> Self {
        if clauses.is_empty() {
            return Self::default();
        }

        let mut summary = Self {
            total_clauses: clauses.len(),
            ..Self::default()
        };
        for clause in clauses {
            *summary
                .clause_distribution
                .entry(clause.clause_type.clone())
                .or_default() += 1;
            *summary
                .importance_distribution
                .entry(clause.importance)
                .or_default() += 1;
        }
        summary.high_importance = summary
            .importance_distribution
            .get(&ClauseImportance::High)
            .copied()
            .unwrap_or(0);

        let has = |clause_type: &str| summary.clause_distribution.contains_key(clause_type);
        let mut findings = Vec::new();
        if summary.high_importance > 0 {
            findings.push(format!(
                "Found {} high-importance clauses requiring attention",
                summary.high_importance
            ));
        }
        if has("TERMINATION") {
            findings.push("Document contains termination provisions".to_string());
        }
        if has("PAYMENT") {
            findings.push("Payment terms are specified in the document".to_string());
        }

        let mut recommendations = Vec::new();
        if summary.high_importance > 0 {
            recommendations.push("Review all high-importance clauses carefully".to_string());
        }
        if !has("LIMITATION_LIABILITY") {
            recommendations.push("Consider adding liability limitation clauses".to_string());
        }
        if !has("GOVERNING_LAW") {
            recommendations.push("Ensure governing law and jurisdiction are specified".to_string());
        }

        summary.key_findings = findings;
        summary.recommendations = recommendations;
        summary
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClauseReport {
    pub clauses: Vec<Clause>,
    pub clause_types_searched: Vec<String>,
    /// Length of the analyzed text in characters.
    pub document_length: usize,
    pub summary: ClauseSummary,
}

impl ClauseReport {
    pub fn new(clauses: Vec<Clause>, clause_types_searched: Vec<String>, document_length: usize) -> Self {
        let summary = ClauseSummary::from_clauses(&clauses);
        Self {
            clauses,
            clause_types_searched,
            document_length,
            summary,
        }
    }
}

/// Payload of a successful pipeline stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StagePayload {
    Extraction(ExtractionSummary),
    Summary(Summary),
    BulletPoints { points: Vec<String> },
    Entities(EntityReport),
    Risks(RiskReport),
    Relationships(RelationshipReport),
    Clauses(ClauseReport),
    SuggestedQuestions { questions: Vec<String> },
}
