//! Tool and service availability check.

use console::style;

use crate::cli::helpers::{error, success, warning};
use crate::config::Settings;
use crate::extract::pdftotext_available;
use crate::llm::{LlmClient, LlmProvider};

pub async fn cmd_check(settings: &Settings) -> anyhow::Result<()> {
    println!("\n{}", style("Analysis Tool Status").bold());
    println!("{}", "-".repeat(50));

    println!("\n{}", style("Text Extraction:").cyan());
    println!("  {:<15} {}", "txt", style("✓ built in").green());
    println!("  {:<15} {}", "docx", style("✓ built in").green());
    let pdf_ok = pdftotext_available();
    if pdf_ok {
        println!("  {:<15} {}", "pdf", style("✓ pdftotext found").green());
    } else {
        println!("  {:<15} {}", "pdf", style("✗ pdftotext not found").red());
        println!(
            "                  {}",
            style("Install poppler-utils for PDF support").dim()
        );
    }

    let llm = &settings.llm;
    println!("\n{}", style("LLM Service:").cyan());
    println!("  {:<15} {:?}", "provider", llm.provider);
    println!("  {:<15} {}", "endpoint", llm.endpoint);
    println!("  {:<15} {}", "model", llm.model);
    println!("  {:<15} {}", "fast model", llm.fast_model());

    let client = LlmClient::new(llm.clone())?;
    let llm_ok = client.is_available().await;
    if llm_ok {
        println!("  {:<15} {}", "status", style("✓ reachable").green());
    } else {
        println!("  {:<15} {}", "status", style("✗ not reachable").red());
        if llm.provider == LlmProvider::Ollama {
            println!(
                "                  {}",
                style("Make sure Ollama is running: ollama serve").dim()
            );
        }
    }

    println!();
    match (pdf_ok, llm_ok) {
        (true, true) => println!("{} Ready to analyze documents", success()),
        (_, false) => println!("{} LLM stages will fail until the service is reachable", error()),
        (false, true) => println!("{} PDF documents will fail extraction", warning()),
    }
    Ok(())
}
