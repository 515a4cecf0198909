pub mod ask;
pub mod chat;
pub mod config;
pub mod query;

use std::sync::Arc;

use roster_agent::{AgentRuntime, OpenAiClient};
use roster_core::config::AppConfig;
use roster_core::Dataset;
use serde::Serialize;
use tracing::info;

#[derive(Debug, Clone)]
pub struct CommandResult {
    pub exit_code: u8,
    pub output: String,
}

#[derive(Debug, Serialize)]
struct CommandOutcome {
    command: String,
    status: String,
    error_class: Option<String>,
    message: String,
}

impl CommandResult {
    pub fn text(exit_code: u8, output: impl Into<String>) -> Self {
        Self { exit_code, output: output.into() }
    }

    pub fn failure(
        command: &str,
        error_class: &str,
        message: impl Into<String>,
        exit_code: u8,
    ) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "error".to_string(),
            error_class: Some(error_class.to_string()),
            message: message.into(),
        };
        Self { exit_code, output: serialize_payload(payload) }
    }
}

fn serialize_payload(payload: CommandOutcome) -> String {
    serde_json::to_string(&payload).unwrap_or_else(|error| {
        format!(
            "{{\"command\":\"unknown\",\"status\":\"error\",\"error_class\":\"serialization\",\"message\":\"{}\"}}",
            error.to_string().replace('\\', "\\\\").replace('"', "\\\"")
        )
    })
}

pub(crate) fn load_dataset(command: &str, config: &AppConfig) -> Result<Arc<Dataset>, CommandResult> {
    let dataset = Dataset::load(&config.dataset.path)
        .map_err(|error| CommandResult::failure(command, "dataset", error.to_string(), 2))?;
    info!(
        event_name = "cli.dataset.loaded",
        path = %config.dataset.path.display(),
        records = dataset.len(),
        "dataset loaded"
    );
    Ok(Arc::new(dataset))
}

pub(crate) fn build_runtime(
    command: &str,
    config: &AppConfig,
) -> Result<AgentRuntime<OpenAiClient>, CommandResult> {
    config
        .llm
        .require_credentials()
        .map_err(|error| CommandResult::failure(command, "config_validation", error.to_string(), 2))?;
    let dataset = load_dataset(command, config)?;
    let client = OpenAiClient::from_config(&config.llm)
        .map_err(|error| CommandResult::failure(command, "model_client", error.to_string(), 1))?;

    Ok(AgentRuntime::new(client, dataset))
}
