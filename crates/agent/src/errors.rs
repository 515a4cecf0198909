use roster_core::errors::{QueryError, RepairError};
use thiserror::Error;

/// Failure of a single tool invocation. Isolated to that invocation's result slot.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ToolError {
    #[error("unknown tool `{0}`")]
    UnknownTool(String),
    #[error(transparent)]
    MalformedOutput(#[from] RepairError),
    #[error("invalid tool arguments: {0}")]
    Arguments(String),
    #[error("unknown age comparator `{0}` (expected at_most|at_least)")]
    UnknownComparator(String),
}

impl ToolError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::UnknownTool(_) => "unknown_tool",
            Self::MalformedOutput(_) => "malformed_output",
            Self::Arguments(_) => "tool_argument",
            Self::UnknownComparator(_) => "unknown_comparator",
        }
    }
}

impl From<QueryError> for ToolError {
    fn from(value: QueryError) -> Self {
        match value {
            QueryError::UnknownComparator(comparator) => Self::UnknownComparator(comparator),
            QueryError::InvalidArguments(message) => Self::Arguments(message),
        }
    }
}

/// Transport or provider failure talking to the model. Fatal for the current turn.
#[derive(Debug, Error)]
pub enum ModelCallError {
    #[error("model transport failure: {0}")]
    Transport(String),
    #[error("model provider returned HTTP {status}: {body}")]
    Provider { status: u16, body: String },
    #[error("invalid model response: {0}")]
    InvalidResponse(String),
}
