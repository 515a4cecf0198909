use roster_agent::{AgentRuntime, LlmClient};
use roster_core::config::AppConfig;

use super::{build_runtime, CommandResult};

pub async fn run(config: &AppConfig, question: &str) -> CommandResult {
    match build_runtime("ask", config) {
        Ok(runtime) => answer(&runtime, question).await,
        Err(failure) => failure,
    }
}

/// One orchestrated turn; the reply is printed as-is.
pub async fn answer<C: LlmClient>(runtime: &AgentRuntime<C>, question: &str) -> CommandResult {
    if question.trim().is_empty() {
        return CommandResult::failure("ask", "usage", "question must not be empty", 2);
    }

    match runtime.handle_utterance(question.trim()).await {
        Ok(outcome) => CommandResult::text(0, outcome.reply),
        Err(error) => CommandResult::failure("ask", "model_call", error.to_string(), 1),
    }
}
