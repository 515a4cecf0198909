use serde::Serialize;

use crate::llm::{ChatMessage, Role, ToolInvocation};
use crate::tools::ToolOutcome;

/// Append-only message history for one orchestrated turn.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Transcript {
    messages: Vec<ChatMessage>,
}

impl Transcript {
    /// A fresh transcript holding exactly the user's utterance.
    pub fn for_utterance(text: impl Into<String>) -> Self {
        Self { messages: vec![ChatMessage::user(text)] }
    }

    pub fn push(&mut self, message: ChatMessage) {
        self.messages.push(message);
    }

    /// Appends one tool message per invocation, pairing them positionally with outcomes.
    pub fn append_tool_results(&mut self, invocations: &[ToolInvocation], outcomes: &[ToolOutcome]) {
        debug_assert_eq!(invocations.len(), outcomes.len());
        for (invocation, outcome) in invocations.iter().zip(outcomes) {
            self.messages.push(ChatMessage::tool_result(
                invocation.id.as_str(),
                invocation.name.as_str(),
                outcome.to_content(),
            ));
        }
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn tool_messages(&self) -> impl Iterator<Item = &ChatMessage> {
        self.messages.iter().filter(|message| message.role == Role::Tool)
    }
}

#[cfg(test)]
mod tests {
    use roster_core::Person;

    use super::Transcript;
    use crate::errors::ToolError;
    use crate::llm::{ChatMessage, Role, ToolInvocation};
    use crate::tools::ToolOutcome;

    #[test]
    fn starts_with_only_the_user_utterance() {
        let transcript = Transcript::for_utterance("who is under 30");
        assert_eq!(transcript.len(), 1);
        assert_eq!(transcript.messages()[0], ChatMessage::user("who is under 30"));
    }

    #[test]
    fn tool_results_keep_invocation_order_and_ids() {
        let mut transcript = Transcript::for_utterance("q");
        let invocations = vec![
            ToolInvocation::new("a", "search_dataset", "{}"),
            ToolInvocation::new("b", "search_dataset", "{}"),
        ];
        transcript.push(ChatMessage::assistant_tool_calls(invocations.clone()));
        transcript.append_tool_results(
            &invocations,
            &[
                ToolOutcome::Records(vec![Person::new("Ann", 20, "ann@example.com")]),
                ToolOutcome::Failed(ToolError::Arguments("missing queryType".to_string())),
            ],
        );

        let tool_messages = transcript.tool_messages().collect::<Vec<_>>();
        assert_eq!(tool_messages.len(), 2);
        assert_eq!(tool_messages[0].tool_call_id.as_deref(), Some("a"));
        assert_eq!(tool_messages[1].tool_call_id.as_deref(), Some("b"));
        assert!(tool_messages.iter().all(|message| message.role == Role::Tool));
        assert!(tool_messages[1].content.as_deref().unwrap_or_default().contains("tool_argument"));
    }
}
