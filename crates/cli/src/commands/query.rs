use roster_agent::{ToolDispatcher, ToolInvocation, SEARCH_DATASET};
use roster_core::config::AppConfig;

use super::{load_dataset, CommandResult};

/// Runs raw tool arguments through repair, validation and search without a model.
///
/// Exit code 2 when the payload is an error marker.
pub fn run(config: &AppConfig, tool: Option<&str>, arguments: &str) -> CommandResult {
    let dataset = match load_dataset("query", config) {
        Ok(dataset) => dataset,
        Err(failure) => return failure,
    };

    let invocation = ToolInvocation::new("cli", tool.unwrap_or(SEARCH_DATASET), arguments);
    let outcome = ToolDispatcher::new(dataset).dispatch_one(&invocation);
    let output = serde_json::to_string_pretty(&outcome.to_payload())
        .unwrap_or_else(|_| outcome.to_content());

    CommandResult::text(if outcome.is_error() { 2 } else { 0 }, output)
}
