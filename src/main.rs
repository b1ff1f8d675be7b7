use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::*;
use std::path::PathBuf;
use std::sync::Arc;

use cres_openai::OpenAiClient;
use cres_retrieval::{ExaClient, PageFetcher};
use cres_workflow::{
    AnswerMode, BatchDriver, BatchOutcome, EngineConfig, Generation, InMemorySessionStore,
    MetricsTable, SessionOutcome, WorkflowEngine,
};

#[derive(Parser)]
#[command(name = "cres")]
#[command(about = "AI-powered company research assistant", long_about = None)]
struct Cli {
    /// Maximum refinement cycles per session
    #[arg(long, default_value_t = 1)]
    max_retries: u32,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Answer a single company-research question
    Ask { question: String },
    /// Research metrics across companies and export an Excel table
    Table {
        /// Comma-separated company names
        #[arg(long, value_delimiter = ',', required = true)]
        companies: Vec<String>,
        /// Comma-separated metric names
        #[arg(long, value_delimiter = ',', required = true)]
        metrics: Vec<String>,
        /// Output workbook path
        #[arg(long, default_value = "metrics.xlsx")]
        output: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let llm = Arc::new(OpenAiClient::from_env()?);
    let search = Arc::new(ExaClient::from_env()?);
    let store = Arc::new(InMemorySessionStore::new());
    let engine = Arc::new(
        WorkflowEngine::new(search, llm, PageFetcher::new()?, store).with_config(EngineConfig {
            max_retries: cli.max_retries,
        }),
    );

    match cli.command {
        Commands::Ask { question } => {
            let thread_id = uuid::Uuid::new_v4().to_string();
            println!("{} {}", "🔎".blue(), question.bold());

            match engine
                .run(&thread_id, &question, AnswerMode::Narrative)
                .await
            {
                Ok(run) => {
                    if run.outcome == SessionOutcome::RetriesExhausted {
                        println!(
                            "{}",
                            "⚠️  Retry limit reached; showing the last draft.".yellow()
                        );
                    }
                    match &run.state.generation {
                        Generation::Empty => println!("{}", "No information found.".red()),
                        generation => println!("\n{}", generation.as_text()),
                    }

                    if !run.state.documents.is_empty() {
                        println!("\n{}", "Sources:".bold());
                        let mut seen = Vec::new();
                        for doc in &run.state.documents {
                            if !doc.url.is_empty() && !seen.contains(&doc.url) {
                                println!("  {} {}", "•".green(), doc.url);
                                seen.push(doc.url.clone());
                            }
                        }
                    }
                }
                Err(e) => {
                    eprintln!("{} {}", "Session failed:".red(), e);
                    println!("{}", "No information found.".red());
                }
            }
        }
        Commands::Table {
            companies,
            metrics,
            output,
        } => {
            println!(
                "{} Researching {} metrics across {} companies...",
                "📊".blue(),
                metrics.len(),
                companies.len()
            );

            let driver = BatchDriver::new(engine.clone());
            let rows = driver.run(&companies, &metrics).await;

            let failures = rows
                .iter()
                .filter(|row| matches!(row.outcome, BatchOutcome::Failed(_)))
                .count();
            if failures > 0 {
                println!(
                    "{} {} of {} pairs failed; the table will have gaps",
                    "⚠️".yellow(),
                    failures,
                    rows.len()
                );
            }

            let table = MetricsTable::from_rows(&rows);
            table.write_xlsx(&output)?;
            println!("{} Table written to {}", "✅".green(), output.display());
        }
    }

    Ok(())
}
