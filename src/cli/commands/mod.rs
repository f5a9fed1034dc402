//! CLI commands implementation.
//!
//! This module contains the CLI parser and dispatches to command-specific modules.

mod analyze;
mod check;
mod config_cmd;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::config::Settings;
use crate::models::{EntityExtractionType, SummaryType};

use super::helpers::parse_key_value;

#[derive(Parser)]
#[command(name = "legaldoc")]
#[command(about = "Legal document analysis: summaries, entities, risks and comparisons")]
#[command(version)]
pub struct Cli {
    /// Config file path (defaults to the user config directory)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze one or more documents (pdf, docx, txt)
    Analyze(AnalyzeArgs),

    /// Check that pdftotext and the LLM endpoint are available
    Check,

    /// Show the effective configuration
    Config,
}

#[derive(Args, Debug)]
pub struct AnalyzeArgs {
    /// Documents to analyze
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Summary depth
    #[arg(long, value_enum, default_value_t = SummaryType::Comprehensive)]
    pub summary_type: SummaryType,

    /// Entity category set
    #[arg(long, value_enum, default_value_t = EntityExtractionType::Comprehensive)]
    pub entity_type: EntityExtractionType,

    /// Skip the summary
    #[arg(long)]
    pub no_summary: bool,

    /// Skip bullet points
    #[arg(long)]
    pub no_bullet_points: bool,

    /// Skip entity extraction
    #[arg(long)]
    pub no_entities: bool,

    /// Skip risk assessment
    #[arg(long)]
    pub no_risks: bool,

    /// Extract relationships between entities
    #[arg(long)]
    pub relationships: bool,

    /// Skip clause extraction
    #[arg(long)]
    pub no_clauses: bool,

    /// Clause types to look for, comma separated (default: all)
    #[arg(long, value_delimiter = ',')]
    pub clause_types: Vec<String>,

    /// Skip suggested questions
    #[arg(long)]
    pub no_questions: bool,

    /// Compare every pair of documents
    #[arg(long)]
    pub compare: bool,

    /// Extra analysis option as KEY=VALUE (repeatable, applied last)
    #[arg(short = 'o', long = "option", value_parser = parse_key_value)]
    pub options: Vec<(String, String)>,

    /// Documents analyzed at once (overrides config)
    #[arg(short = 'j', long)]
    pub concurrency: Option<usize>,

    /// Largest accepted document in MiB (overrides config)
    #[arg(long)]
    pub max_file_size_mb: Option<u64>,

    /// LLM model (overrides config)
    #[arg(long)]
    pub model: Option<String>,

    /// LLM endpoint URL (overrides config)
    #[arg(long)]
    pub endpoint: Option<String>,

    /// Print the batch result as JSON
    #[arg(long)]
    pub json: bool,
}

pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let settings = Settings::load(cli.config.as_deref()).await?;

    match cli.command {
        Commands::Analyze(args) => analyze::cmd_analyze(&settings, args).await,
        Commands::Check => check::cmd_check(&settings).await,
        Commands::Config => config_cmd::cmd_config_show(&settings),
    }
}
