//! legaldoc - legal document analysis orchestrator.
//!
//! Runs documents through text extraction and LLM-backed analysis stages
//! (summary, bullet points, entities, risks, relationships), compares
//! documents pairwise and aggregates batch statistics. Every collaborator
//! sits behind an async trait so the orchestrator can be embedded with
//! other implementations.

pub mod cli;
pub mod config;
pub mod error;
pub mod extract;
pub mod llm;
pub mod models;
pub mod services;

pub use error::AnalysisError;
pub use models::{AnalysisOptions, AnalysisResult, BatchResult, Document};
pub use services::{BatchCoordinator, DocumentOrchestrator, RetryPolicy, StageClients};
