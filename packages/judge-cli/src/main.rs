//! Research judge CLI
//!
//! Judges a single question from the command line, or prompts for
//! questions until `exit` with `--interactive`.

mod config;
mod render;

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use colored::Colorize;
use dialoguer::{theme::ColorfulTheme, Input};
use research_judge::{
    ai::OpenAI,
    connectors::default_connectors,
    types::query::{DEFAULT_CONFIDENCE_THRESHOLD, DEFAULT_DOMAIN, DEFAULT_EVIDENCE_COUNT},
    Query, ResearchJudge,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;

#[derive(Parser)]
#[command(name = "research-judge")]
#[command(about = "Gather research evidence and judge a factual question")]
struct Cli {
    /// The question to judge
    question: Option<String>,

    /// Research domain (e.g. medical, physics)
    #[arg(long, default_value = DEFAULT_DOMAIN)]
    domain: String,

    /// Minimum relevance for evidence (0.0 to 1.0)
    #[arg(long, default_value_t = DEFAULT_CONFIDENCE_THRESHOLD)]
    confidence: f64,

    /// Number of evidence items to gather (1 to 20)
    #[arg(long, default_value_t = DEFAULT_EVIDENCE_COUNT)]
    evidence_count: usize,

    /// Prompt for questions until `exit`
    #[arg(long, short)]
    interactive: bool,

    /// Fail instead of using synthetic evidence when no source answers
    #[arg(long)]
    no_fallback: bool,

    /// Print the judgment as JSON
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,research_judge=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();

    let cli = Cli::parse();
    let config = Config::from_env()?;

    if !config.credentials.has_inference_key() {
        tracing::warn!("OPENAI_API_KEY is not set; judgment calls will fail");
    }

    let mut judge_config = config.judge;
    if cli.no_fallback {
        judge_config = judge_config.with_synthetic_fallback(false);
    }

    let connectors = default_connectors(&config.credentials, judge_config.connector_timeout());
    let ai = Arc::new(OpenAI::from_credentials(&config.credentials));
    let judge = ResearchJudge::with_capabilities(connectors, ai, judge_config);

    if cli.interactive {
        return interactive(&judge, cli.json).await;
    }

    let Some(question) = cli.question.as_deref() else {
        anyhow::bail!("a question is required unless --interactive is given");
    };

    let query = Query::new(question)?
        .with_domain(cli.domain.as_str())
        .with_confidence_threshold(cli.confidence)
        .with_evidence_count(cli.evidence_count);

    judge_and_print(&judge, &query, cli.json).await
}

async fn judge_and_print(judge: &ResearchJudge, query: &Query, json: bool) -> Result<()> {
    if !json {
        println!("\nResearching: '{}'", query.question().bright_white().bold());
    }

    let judgment = judge.judge(query).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&judgment)?);
    } else {
        render::print_judgment(&judgment);
    }
    Ok(())
}

async fn interactive(judge: &ResearchJudge, json: bool) -> Result<()> {
    let theme = ColorfulTheme::default();

    println!("{}", "===== Research Judge =====".bright_cyan().bold());
    println!("Researches questions and gives evidence-based judgments.");
    println!("Type 'exit' to quit.");

    loop {
        println!();
        let question: String = Input::with_theme(&theme)
            .with_prompt("Question")
            .interact_text()?;
        let question = question.trim();

        if question.eq_ignore_ascii_case("exit") {
            println!("{}", "Goodbye!".bright_blue());
            break;
        }

        let domain: String = Input::with_theme(&theme)
            .with_prompt("Domain")
            .default(DEFAULT_DOMAIN.to_string())
            .interact_text()?;
        let confidence: f64 = Input::with_theme(&theme)
            .with_prompt("Minimum relevance (0.0 to 1.0)")
            .default(DEFAULT_CONFIDENCE_THRESHOLD)
            .interact_text()?;
        let evidence_count: usize = Input::with_theme(&theme)
            .with_prompt("Evidence count (1 to 20)")
            .default(DEFAULT_EVIDENCE_COUNT)
            .interact_text()?;

        let query = match Query::new(question) {
            Ok(query) => query
                .with_domain(domain)
                .with_confidence_threshold(confidence)
                .with_evidence_count(evidence_count),
            Err(e) => {
                println!("{} {}", "✗".bright_red(), e);
                continue;
            }
        };

        if let Err(e) = judge_and_print(judge, &query, json).await {
            println!("{} {:#}", "✗ Judgment failed:".bright_red(), e);
        }

        println!("\n{}", "-".repeat(50));
    }

    Ok(())
}
