//! Downstream analysis stages. Each one wraps a single collaborator call
//! and turns its output into a `StagePayload`.

use std::sync::Arc;

use async_trait::async_trait;

use super::pipeline::AnalysisStage;
use crate::models::{AnalysisOptions, Stage, StagePayload};
use crate::services::clients::{
    ClauseExtractor, EntityExtractor, QuestionSuggester, RelationshipExtractor, RiskAssessor,
    ServiceError, Summarizer,
};

pub struct SummarizeStage {
    summarizer: Arc<dyn Summarizer>,
}

impl SummarizeStage {
    pub fn new(summarizer: Arc<dyn Summarizer>) -> Self {
        Self { summarizer }
    }
}

#[async_trait]
impl AnalysisStage for SummarizeStage {
    fn stage(&self) -> Stage {
        Stage::Summarize
    }

    async fn run(
        &self,
        text: &str,
        options: &AnalysisOptions,
    ) -> Result<StagePayload, ServiceError> {
        self.summarizer
            .summarize(text, options.summary_type)
            .await
            .map(StagePayload::Summary)
    }
}

pub struct BulletPointsStage {
    summarizer: Arc<dyn Summarizer>,
}

impl BulletPointsStage {
    pub fn new(summarizer: Arc<dyn Summarizer>) -> Self {
        Self { summarizer }
    }
}

#[async_trait]
impl AnalysisStage for BulletPointsStage {
    fn stage(&self) -> Stage {
        Stage::BulletPoints
    }

    async fn run(
        &self,
        text: &str,
        _options: &AnalysisOptions,
    ) -> Result<StagePayload, ServiceError> {
        let points = self.summarizer.bullet_points(text).await?;
        Ok(StagePayload::BulletPoints { points })
    }
}

pub struct EntityStage {
    extractor: Arc<dyn EntityExtractor>,
}

impl EntityStage {
    pub fn new(extractor: Arc<dyn EntityExtractor>) -> Self {
        Self { extractor }
    }
}

#[async_trait]
impl AnalysisStage for EntityStage {
    fn stage(&self) -> Stage {
        Stage::ExtractEntities
    }

    async fn run(
        &self,
        text: &str,
        options: &AnalysisOptions,
    ) -> Result<StagePayload, ServiceError> {
        self.extractor
            .extract_entities(text, options.entity_extraction_type)
            .await
            .map(StagePayload::Entities)
    }
}

pub struct RiskStage {
    assessor: Arc<dyn RiskAssessor>,
}

impl RiskStage {
    pub fn new(assessor: Arc<dyn RiskAssessor>) -> Self {
        Self { assessor }
    }
}

#[async_trait]
impl AnalysisStage for RiskStage {
    fn stage(&self) -> Stage {
        Stage::AssessRisks
    }

    async fn run(
        &self,
        text: &str,
        _options: &AnalysisOptions,
    ) -> Result<StagePayload, ServiceError> {
        self.assessor
            .assess_risks(text)
            .await
            .map(StagePayload::Risks)
    }
}

pub struct RelationshipStage {
    extractor: Arc<dyn RelationshipExtractor>,
}

impl RelationshipStage {
    pub fn new(extractor: Arc<dyn RelationshipExtractor>) -> Self {
        Self { extractor }
    }
}

#[async_trait]
impl AnalysisStage for RelationshipStage {
    fn stage(&self) -> Stage {
        Stage::ExtractRelationships
    }

    async fn run(
        &self,
        text: &str,
        _options: &AnalysisOptions,
    ) -> Result<StagePayload, ServiceError> {
        self.extractor
            .extract_relationships(text)
            .await
            .map(StagePayload::Relationships)
    }
}

pub struct ClauseStage {
    extractor: Arc<dyn ClauseExtractor>,
}

impl ClauseStage {
    pub fn new(extractor: Arc<dyn ClauseExtractor>) -> Self {
        Self { extractor }
    }
}

#[async_trait]
impl AnalysisStage for ClauseStage {
    fn stage(&self) -> Stage {
        Stage::ExtractClauses
    }

    async fn run(
        &self,
        text: &str,
        options: &AnalysisOptions,
    ) -> Result<StagePayload, ServiceError> {
        self.extractor
            .extract_clauses(text, &options.clause_types)
            .await
            .map(StagePayload::Clauses)
    }
}

pub struct QuestionStage {
    suggester: Arc<dyn QuestionSuggester>,
}

impl QuestionStage {
    pub fn new(suggester: Arc<dyn QuestionSuggester>) -> Self {
        Self { suggester }
    }
}

#[async_trait]
impl AnalysisStage for QuestionStage {
    fn stage(&self) -> Stage {
        Stage::SuggestQuestions
    }

    async fn run(
        &self,
        text: &str,
        _options: &AnalysisOptions,
    ) -> Result<StagePayload, ServiceError> {
        let questions = self.suggester.suggest_questions(text).await?;
        Ok(StagePayload::SuggestedQuestions { questions })
    }
}
