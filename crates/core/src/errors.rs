use thiserror::Error;

/// Raised when text claiming to be JSON cannot be coerced into a value.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum RepairError {
    #[error("malformed structured output: input is empty")]
    EmptyInput,
    #[error("malformed structured output: fenced block is empty")]
    EmptyFence,
    #[error("malformed structured output: {reason}")]
    Malformed { reason: String },
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum QueryError {
    #[error("unknown age comparator `{0}` (expected at_most|at_least)")]
    UnknownComparator(String),
    #[error("invalid query arguments: {0}")]
    InvalidArguments(String),
}

impl QueryError {
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidArguments(message.into())
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::UnknownComparator(_) => "unknown_comparator",
            Self::InvalidArguments(_) => "tool_argument",
        }
    }
}
