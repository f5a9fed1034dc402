//! LLM-backed analysis collaborators.
//!
//! `LlmAnalyzer` implements every downstream stage contract on top of a
//! single completion client. Supports Ollama for local inference and any
//! OpenAI-compatible API.

mod client;
mod config;
pub mod parse;
pub mod prompts;

use async_trait::async_trait;
use chrono::Utc;
use tracing::info;

use crate::models::{
    ClauseReport, ComparisonReport, EntityExtractionType, EntityReport, RelationshipReport,
    RiskReport, Summary, SummaryType,
};
use crate::services::{
    ClauseExtractor, DocumentComparer, EntityExtractor, QuestionSuggester, RelationshipExtractor,
    RiskAssessor, ServiceError, Summarizer,
};

use client::truncate_chars;
pub use client::{parse_retry_after, LlmClient, ModelTier};
pub use config::{LlmConfig, LlmProvider};

/// Every downstream analysis, plus comparisons, via an LLM.
pub struct LlmAnalyzer {
    client: LlmClient,
}

impl LlmAnalyzer {
    pub fn new(config: LlmConfig) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: LlmClient::new(config)?,
        })
    }

    pub fn client(&self) -> &LlmClient {
        &self.client
    }
}

#[async_trait]
impl Summarizer for LlmAnalyzer {
    async fn summarize(
        &self,
        text: &str,
        summary_type: SummaryType,
    ) -> Result<Summary, ServiceError> {
        let content = self.client.truncate_content(text);
        let tier = match summary_type {
            SummaryType::Brief => ModelTier::Fast,
            _ => ModelTier::Standard,
        };
        let response = self
            .client
            .complete(&prompts::summary_prompt(content, summary_type), tier)
            .await?;

        let summary_text = response.trim().to_string();
        let mut summary = Summary::new(summary_text, summary_type, text.chars().count());
        summary.key_points = parse::key_points(&summary.summary);
        info!("Generated {} summary", summary_type.as_str());
        Ok(summary)
    }

    async fn bullet_points(&self, text: &str) -> Result<Vec<String>, ServiceError> {
        let content = self.client.truncate_content(text);
        let response = self
            .client
            .complete(&prompts::bullet_points_prompt(content), ModelTier::Fast)
            .await?;
        Ok(parse::bullet_points(&response))
    }
}

#[async_trait]
impl EntityExtractor for LlmAnalyzer {
    async fn extract_entities(
        &self,
        text: &str,
        extraction_type: EntityExtractionType,
    ) -> Result<EntityReport, ServiceError> {
        let content = self.client.truncate_content(text);
        let tier = match extraction_type {
            EntityExtractionType::Basic => ModelTier::Fast,
            _ => ModelTier::Standard,
        };
        let response = self
            .client
            .complete(&prompts::entity_prompt(content, extraction_type), tier)
            .await?;

        let categories = prompts::entity_categories(extraction_type);
        let entities = parse::categorized_lists(&response, &categories)?;
        let report = EntityReport::new(entities, extraction_type);
        info!("Extracted {} entities", report.total_entities);
        Ok(report)
    }
}

#[async_trait]
impl RiskAssessor for LlmAnalyzer {
    async fn assess_risks(&self, text: &str) -> Result<RiskReport, ServiceError> {
        let content = self.client.truncate_content(text);
        let response = self
            .client
            .complete(&prompts::risk_prompt(content), ModelTier::Standard)
            .await?;
        Ok(parse::risk_report(&response))
    }
}

#[async_trait]
impl RelationshipExtractor for LlmAnalyzer {
    async fn extract_relationships(&self, text: &str) -> Result<RelationshipReport, ServiceError> {
        let content = self.client.truncate_content(text);
        let response = self
            .client
            .complete(&prompts::relationship_prompt(content), ModelTier::Standard)
            .await?;
        let relationships =
            parse::categorized_lists(&response, prompts::RELATIONSHIP_CATEGORIES)?;
        Ok(RelationshipReport::new(relationships))
    }
}

#[async_trait]
impl ClauseExtractor for LlmAnalyzer {
    async fn extract_clauses(
        &self,
        text: &str,
        clause_types: &[String],
    ) -> Result<ClauseReport, ServiceError> {
        let content = self.client.truncate_content(text);
        let searched = prompts::clause_types(clause_types);
        let response = self
            .client
            .complete(&prompts::clause_prompt(content, &searched), ModelTier::Standard)
            .await?;

        let clauses = parse::clauses(&response, &searched)?;
        let report = ClauseReport::new(clauses, searched, text.chars().count());
        info!("Extracted {} clauses", report.summary.total_clauses);
        Ok(report)
    }
}

#[async_trait]
impl QuestionSuggester for LlmAnalyzer {
    async fn suggest_questions(&self, text: &str) -> Result<Vec<String>, ServiceError> {
        let content = truncate_chars(text, prompts::QUESTION_CONTEXT_CHARS);
        let response = self
            .client
            .complete(&prompts::question_prompt(content), ModelTier::Fast)
            .await?;
        let fallback: Vec<&str> = prompts::CATEGORY_QUESTIONS
            .iter()
            .flat_map(|(_, questions)| questions.iter().copied())
            .collect();
        Ok(parse::suggested_questions(&response, &fallback))
    }
}

#[async_trait]
impl DocumentComparer for LlmAnalyzer {
    async fn compare_documents(
        &self,
        left_text: &str,
        right_text: &str,
        left_name: &str,
        right_name: &str,
    ) -> Result<ComparisonReport, ServiceError> {
        // Both texts share one request, so each gets half the budget.
        let half = self.client.config().max_content_chars / 2;
        let left = truncate_chars(left_text, half);
        let right = truncate_chars(right_text, half);
        let response = self
            .client
            .complete(
                &prompts::comparison_prompt(left, right, left_name, right_name),
                ModelTier::Standard,
            )
            .await?;

        Ok(ComparisonReport {
            comparison_text: response.trim().to_string(),
            left_name: left_name.to_string(),
            right_name: right_name.to_string(),
            analyzed_at: Utc::now(),
        })
    }
}
