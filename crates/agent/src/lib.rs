//! Agent runtime for roster: turns a natural-language question into at most one round of
//! `search_dataset` tool calls and a final model reply.
//!
//! # Turn flow
//!
//! 1. The user utterance becomes a fresh [`Transcript`].
//! 2. The model sees the transcript and the tool schemas.
//! 3. Requested tool calls are repaired, validated and executed against the dataset
//!    (`tools`); every invocation gets exactly one result message, errors included.
//! 4. The model is called once more with the extended transcript and its text is the reply.
//!
//! The model never touches the dataset directly. Query semantics live in `roster-core`.

pub mod conversation;
pub mod errors;
pub mod llm;
pub mod openai;
pub mod runtime;
pub mod tools;

pub use conversation::Transcript;
pub use errors::{ModelCallError, ToolError};
pub use llm::{ChatMessage, LlmClient, Role, ToolInvocation, ToolSchema};
pub use openai::OpenAiClient;
pub use runtime::{AgentRuntime, TurnOutcome, TurnState};
pub use tools::{tool_schemas, ToolDispatcher, ToolKind, ToolOutcome, SEARCH_DATASET};
