use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use roster_core::Dataset;
use tracing::{debug, info, warn};

use crate::conversation::Transcript;
use crate::errors::ModelCallError;
use crate::llm::{ChatMessage, LlmClient, ToolSchema};
use crate::tools::{tool_schemas, ToolDispatcher};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TurnState {
    AwaitingModelTurn1,
    Dispatching,
    AwaitingModelTurn2,
    Done,
}

#[derive(Clone, Debug)]
pub struct TurnOutcome {
    pub reply: String,
    pub transcript: Transcript,
    pub state: TurnState,
    pub tool_calls: usize,
    pub model_calls: u8,
}

/// Turns one user utterance into at most one round of tool use and a final reply.
///
/// Tool requests in the second model response are logged and ignored; a turn never makes
/// more than two model calls.
pub struct AgentRuntime<C> {
    client: C,
    dispatcher: ToolDispatcher,
    tools: Vec<ToolSchema>,
    turn_counter: AtomicU64,
}

impl<C> AgentRuntime<C>
where
    C: LlmClient,
{
    pub fn new(client: C, dataset: Arc<Dataset>) -> Self {
        Self {
            client,
            dispatcher: ToolDispatcher::new(dataset),
            tools: tool_schemas(),
            turn_counter: AtomicU64::new(0),
        }
    }

    pub async fn handle_utterance(&self, text: &str) -> Result<TurnOutcome, ModelCallError> {
        let turn_id = self.turn_counter.fetch_add(1, Ordering::Relaxed) + 1;
        let mut transcript = Transcript::for_utterance(text);
        let mut state = TurnState::AwaitingModelTurn1;
        info!(event_name = "agent.turn.start", turn_id, "handling user utterance");

        let first = self.call_model(turn_id, state, &transcript).await?;
        if !first.has_tool_calls() {
            let reply = first.content.clone().unwrap_or_default();
            transcript.push(first);
            advance(turn_id, &mut state, TurnState::Done);
            return Ok(TurnOutcome { reply, transcript, state, tool_calls: 0, model_calls: 1 });
        }

        advance(turn_id, &mut state, TurnState::Dispatching);
        let invocations = first.tool_calls.clone();
        transcript.push(first);
        let outcomes = self.dispatcher.dispatch(&invocations);
        transcript.append_tool_results(&invocations, &outcomes);
        info!(
            event_name = "agent.turn.tools_dispatched",
            turn_id,
            tool_calls = invocations.len(),
            failed = outcomes.iter().filter(|outcome| outcome.is_error()).count(),
            "tool results appended to transcript"
        );

        advance(turn_id, &mut state, TurnState::AwaitingModelTurn2);
        let second = self.call_model(turn_id, state, &transcript).await?;
        if second.has_tool_calls() {
            warn!(
                event_name = "agent.turn.tool_depth_exceeded",
                turn_id,
                ignored_tool_calls = second.tool_calls.len(),
                "second model response requested tools; not dispatching"
            );
        }
        let reply = second.content.clone().unwrap_or_default();
        transcript.push(second);
        advance(turn_id, &mut state, TurnState::Done);

        Ok(TurnOutcome {
            reply,
            transcript,
            state,
            tool_calls: invocations.len(),
            model_calls: 2,
        })
    }

    async fn call_model(
        &self,
        turn_id: u64,
        state: TurnState,
        transcript: &Transcript,
    ) -> Result<ChatMessage, ModelCallError> {
        debug!(
            event_name = "agent.model.request",
            turn_id,
            state = ?state,
            messages = transcript.len(),
            transcript = %serde_json::to_string(transcript).unwrap_or_default(),
            "sending transcript to model"
        );

        match self.client.complete(transcript.messages(), &self.tools).await {
            Ok(message) => {
                debug!(
                    event_name = "agent.model.response",
                    turn_id,
                    tool_calls = message.tool_calls.len(),
                    has_content = message.content.is_some(),
                    "model responded"
                );
                Ok(message)
            }
            Err(error) => {
                warn!(
                    event_name = "agent.model.failed",
                    turn_id,
                    state = ?state,
                    error = %error,
                    "model call failed"
                );
                Err(error)
            }
        }
    }
}

fn advance(turn_id: u64, state: &mut TurnState, next: TurnState) {
    debug!(event_name = "agent.turn.transition", turn_id, from = ?*state, to = ?next);
    *state = next;
}
