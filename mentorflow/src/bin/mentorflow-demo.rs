//! Runs one A/B test request from the command line and prints the response.

use anyhow::{Context, Result};
use clap::Parser;
use mentorflow::api::{AbTestRequest, AbTestService};
use mentorflow::completion::{StaticCompletion, TextCompletion};
use mentorflow::config::MentorflowConfig;
use mentorflow::events::LoggingEventSink;
use mentorflow::knowledge::KnowledgeStore;
use mentorflow::observability::init_tracing;
use mentorflow::pipeline::MentorshipWorkflow;
use std::sync::Arc;
use tracing::{info, warn};

const OFFLINE_REPLY: &str = "// offline mode: set OPENAI_API_KEY for a generated snippet\nconsole.log(\"Hello, world!\");";

/// Mentorship pipeline demo
#[derive(Parser, Debug)]
#[command(version, about = "Run the mentor-mode A/B pipeline once")]
struct CliArgs {
    /// The task to send as the user's message
    task: String,

    /// Conversation thread id
    #[arg(long, default_value = "demo-thread")]
    thread_id: String,

    /// Enable the mentor arm
    #[arg(long)]
    mentor: bool,

    /// Model name for the completion backend
    #[arg(long, env = "MENTORFLOW_MODEL")]
    model: Option<String>,

    /// Never call the network; reply with a fixed snippet
    #[arg(long)]
    offline: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    json_logs: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = CliArgs::parse();

    let mut config = MentorflowConfig::from_env();
    config.logging.json |= args.json_logs;
    if let Some(model) = args.model.clone() {
        config.completion.model = model;
    }
    init_tracing(&config.logging);

    let completion = completion_backend(&config, args.offline)?;
    let workflow = MentorshipWorkflow::new(Arc::new(KnowledgeStore::new()), completion)
        .context("failed to compile the mentorship pipeline")?
        .with_event_sink(Arc::new(LoggingEventSink::debug()));
    let service = AbTestService::new(workflow);

    let response = service
        .handle(AbTestRequest::new(args.task, args.thread_id, args.mentor))
        .await;
    info!(status = response.status, "request handled");

    println!("{}", serde_json::to_string_pretty(&response.body)?);
    if !response.is_success() {
        anyhow::bail!("request failed with status {}", response.status);
    }
    Ok(())
}

#[cfg(feature = "openai")]
fn completion_backend(config: &MentorflowConfig, offline: bool) -> Result<Arc<dyn TextCompletion>> {
    use mentorflow::completion::OpenAiCompletion;

    if offline {
        return Ok(Arc::new(StaticCompletion::new(OFFLINE_REPLY)));
    }
    if config.completion.api_key().is_none() {
        warn!(
            env = %config.completion.api_key_env,
            "no API key found, falling back to offline replies"
        );
        return Ok(Arc::new(StaticCompletion::new(OFFLINE_REPLY)));
    }
    let backend = OpenAiCompletion::from_config(config.completion.clone())
        .context("failed to build the OpenAI client")?;
    Ok(Arc::new(backend))
}

#[cfg(not(feature = "openai"))]
fn completion_backend(_config: &MentorflowConfig, offline: bool) -> Result<Arc<dyn TextCompletion>> {
    if !offline {
        warn!("built without the openai feature, using offline replies");
    }
    Ok(Arc::new(StaticCompletion::new(OFFLINE_REPLY)))
}
