//! agent-cli
//!
//! Sends one message to an OpenAI-compatible model with the demo tools
//! attached and prints the final answer.
//!
//! ```text
//! agent-cli --append "Use brackets for times" "What time is it?"
//! ```

use agent_core::{Agent, CancellationToken, SendOptions};
use agent_runtime::{Model, OpenAiConfig, OpenAiProvider};
use anyhow::Context;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful assistant. Use the available tools when they help answer the question.";

#[derive(Debug, Parser)]
#[command(name = "agent-cli", version, about = "Ask a tool-calling agent one question")]
struct Cli {
    /// Model alias, overrides OPENAI_MODEL
    #[arg(long)]
    model: Option<Model>,

    /// Base system prompt
    #[arg(long, default_value = DEFAULT_SYSTEM_PROMPT)]
    system_prompt: String,

    /// Extra system prompt fragment for this message (repeatable)
    #[arg(long = "append")]
    append: Vec<String>,

    /// Log every transcript message at debug level
    #[arg(long)]
    debug: bool,

    /// Maximum model rounds
    #[arg(long, default_value_t = agent_core::reasoning::DEFAULT_MAX_ITERATIONS)]
    max_iterations: usize,

    /// The message to send
    message: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let default_filter = if cli.debug { "info,agent_core=debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| default_filter.into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let mut config = OpenAiConfig::from_env().context("loading OpenAI configuration")?;
    if let Some(model) = cli.model {
        config.model = model;
    }
    tracing::info!(model = %config.model, base_url = %config.base_url, "Using provider");

    let mut builder = Agent::builder()
        .provider(OpenAiProvider::new(config)?)
        .tools(agent_tools::all()?)
        .system_prompt(cli.system_prompt)
        .max_iterations(cli.max_iterations);
    if cli.debug {
        builder = builder.debug();
    }
    let agent = builder.build()?;
    tracing::info!(tools = ?agent.tools().names(), "Agent ready");

    let cancel = CancellationToken::new();
    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            ctrl_c.cancel();
        }
    });

    let options = cli
        .append
        .into_iter()
        .fold(SendOptions::new().cancel_token(cancel), |options, fragment| {
            options.append_system_prompt(fragment)
        });

    let answer = agent
        .send_message(&cli.message, options)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Run failed");
            anyhow::anyhow!(e.user_message())
        })?;
    println!("{answer}");

    Ok(())
}
