use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use roster_agent::{AgentRuntime, ChatMessage, LlmClient, ModelCallError, ToolSchema};
use roster_cli::session::{run_session, SessionSummary};
use roster_core::config::SessionConfig;
use roster_core::{Dataset, Person};

/// Replies with the utterance echoed back, or fails when the user says "fail".
#[derive(Default)]
struct EchoClient {
    utterances: Mutex<VecDeque<String>>,
}

#[async_trait]
impl LlmClient for EchoClient {
    async fn complete(
        &self,
        transcript: &[ChatMessage],
        _tools: &[ToolSchema],
    ) -> Result<ChatMessage, ModelCallError> {
        let utterance = transcript
            .first()
            .and_then(|message| message.content.clone())
            .unwrap_or_default();
        self.utterances.lock().expect("utterances lock").push_back(utterance.clone());

        if utterance == "fail" {
            return Err(ModelCallError::Provider { status: 500, body: "boom".to_string() });
        }
        Ok(ChatMessage::assistant(format!("echo: {utterance}")))
    }
}

fn settings() -> SessionConfig {
    SessionConfig { exit_sentinel: "$exit".to_string(), prompt: "> ".to_string() }
}

fn runtime(client: Arc<EchoClient>) -> AgentRuntime<Arc<EchoClient>> {
    AgentRuntime::new(client, Arc::new(Dataset::new(vec![Person::new("Ann", 30, "ann@example.com")])))
}

async fn drive(client: Arc<EchoClient>, input: &str) -> (SessionSummary, String) {
    colored::control::set_override(false);

    let runtime = runtime(client);
    let mut output = Vec::new();
    let summary = run_session(&runtime, &settings(), input.as_bytes(), &mut output)
        .await
        .expect("in-memory session should not fail");
    (summary, String::from_utf8(output).expect("utf-8 output"))
}

#[tokio::test]
async fn answers_each_line_until_sentinel() {
    let client = Arc::new(EchoClient::default());
    let (summary, output) = drive(client.clone(), "hello\nwho is 30?\n$EXIT\nnever sent\n").await;

    assert_eq!(summary, SessionSummary { turns: 2, failed_turns: 0 });
    assert!(output.contains("echo: hello\n"));
    assert!(output.contains("echo: who is 30?\n"));
    assert!(!output.contains("never sent"));
    assert!(output.ends_with("Goodbye!\n"));

    let seen = client.utterances.lock().expect("utterances lock").clone();
    assert_eq!(seen, VecDeque::from(vec!["hello".to_string(), "who is 30?".to_string()]));
}

#[tokio::test]
async fn skips_blank_lines_and_stops_at_end_of_input() {
    let client = Arc::new(EchoClient::default());
    let (summary, output) = drive(client.clone(), "\n   \nhi").await;

    assert_eq!(summary.turns, 1);
    assert!(output.contains("echo: hi"));
    assert_eq!(output.matches("> ").count(), 4, "prompted once per read, including EOF");
    assert!(!output.contains("Goodbye!"), "end of input closes the session without a farewell");
}

#[tokio::test]
async fn failed_turn_is_reported_and_session_continues() {
    let client = Arc::new(EchoClient::default());
    let (summary, output) = drive(client, "fail\nstill here\n  $exit  \n").await;

    assert_eq!(summary, SessionSummary { turns: 1, failed_turns: 1 });
    assert!(output.contains("error: model provider returned HTTP 500: boom"));
    assert!(output.contains("echo: still here"));
}

#[tokio::test]
async fn opens_with_banner_naming_the_configured_sentinel() {
    colored::control::set_override(false);

    let runtime = runtime(Arc::new(EchoClient::default()));
    let settings = SessionConfig { exit_sentinel: "quit!".to_string(), prompt: ">> ".to_string() };
    let mut output = Vec::new();
    let summary = run_session(&runtime, &settings, "QUIT!\n".as_bytes(), &mut output)
        .await
        .expect("in-memory session should not fail");
    let output = String::from_utf8(output).expect("utf-8 output");

    assert_eq!(summary, SessionSummary::default());
    assert!(output.starts_with("Ask a question about the dataset, e.g. "));
    assert!(output.contains("Type 'quit!' to quit.\n"));
    assert!(!output.contains("$exit"));
    assert!(output.ends_with(">> Goodbye!\n"));
}
