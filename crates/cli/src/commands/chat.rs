use anyhow::Context;
use roster_agent::{AgentRuntime, LlmClient};
use roster_core::config::AppConfig;
use tokio::io::BufReader;
use tracing::info;

use super::{build_runtime, CommandResult};
use crate::session::{run_session, SessionSummary};

pub async fn run(config: &AppConfig) -> CommandResult {
    let runtime = match build_runtime("chat", config) {
        Ok(runtime) => runtime,
        Err(failure) => return failure,
    };

    tokio::select! {
        result = converse(&runtime, config) => match result {
            Ok(_) => CommandResult::text(0, ""),
            Err(error) => CommandResult::failure("chat", "io", format!("{error:#}"), 1),
        },
        _ = tokio::signal::ctrl_c() => {
            info!(event_name = "cli.session.interrupted", "received ctrl-c");
            CommandResult::text(0, "")
        }
    }
}

async fn converse<C: LlmClient>(
    runtime: &AgentRuntime<C>,
    config: &AppConfig,
) -> anyhow::Result<SessionSummary> {
    let input = BufReader::new(tokio::io::stdin());
    let output = tokio::io::stdout();
    run_session(runtime, &config.session, input, output)
        .await
        .context("interactive session lost its terminal")
}
