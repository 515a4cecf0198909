use std::sync::Arc;

use roster_core::query::{search, Query, QueryDimension};
use roster_core::repair::repair;
use roster_core::{Dataset, Person};
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::errors::ToolError;
use crate::llm::{ToolInvocation, ToolSchema};

pub const SEARCH_DATASET: &str = "search_dataset";

/// Closed set of tools the model may call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ToolKind {
    SearchDataset,
}

impl ToolKind {
    pub const ALL: &'static [ToolKind] = &[ToolKind::SearchDataset];

    pub fn parse(name: &str) -> Result<Self, ToolError> {
        match name {
            SEARCH_DATASET => Ok(Self::SearchDataset),
            other => Err(ToolError::UnknownTool(other.to_string())),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::SearchDataset => SEARCH_DATASET,
        }
    }

    pub fn schema(&self) -> ToolSchema {
        match self {
            Self::SearchDataset => ToolSchema {
                name: self.name().to_string(),
                description: "Query the people dataset by name and/or age, optionally limiting \
                              and sorting the results by name."
                    .to_string(),
                parameters: search_dataset_parameters(),
                strict: true,
            },
        }
    }
}

pub fn tool_schemas() -> Vec<ToolSchema> {
    ToolKind::ALL.iter().map(ToolKind::schema).collect()
}

/// Every top-level field is required (nullable where inapplicable) so the provider can
/// enforce the schema strictly.
fn search_dataset_parameters() -> Value {
    json!({
        "type": "object",
        "properties": {
            "queryType": {
                "type": "array",
                "description": "Which dimensions to filter the dataset by. Empty for no filtering.",
                "items": { "type": "string", "enum": ["name", "age"] }
            },
            "nameQuery": {
                "type": ["string", "null"],
                "description": "Case-insensitive substring to match against names. Null unless queryType includes name."
            },
            "ageQuery": {
                "type": ["object", "null"],
                "description": "Age filter. Null unless queryType includes age.",
                "properties": {
                    "comparator": {
                        "type": "string",
                        "enum": ["at_most", "at_least"],
                        "description": "at_most keeps ages <= value, at_least keeps ages >= value."
                    },
                    "value": { "type": "number", "description": "Age bound, inclusive." }
                },
                "required": ["comparator", "value"],
                "additionalProperties": false
            },
            "options": {
                "type": "object",
                "properties": {
                    "num_results": {
                        "type": ["integer", "null"],
                        "description": "Maximum number of results to return. Null if not specified."
                    },
                    "sort_by": {
                        "type": ["string", "null"],
                        "enum": ["alphabetical", "reverse_alphabetical", null],
                        "description": "How to sort results by name. Null if not needed."
                    }
                },
                "required": ["num_results", "sort_by"],
                "additionalProperties": false
            }
        },
        "required": ["queryType", "nameQuery", "ageQuery", "options"],
        "additionalProperties": false
    })
}

/// Result slot for one invocation.
#[derive(Clone, Debug, PartialEq)]
pub enum ToolOutcome {
    Records(Vec<Person>),
    Failed(ToolError),
}

impl ToolOutcome {
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Failed(_))
    }

    /// Records serialize as a JSON array; failures as an explicit `error` marker so the
    /// model can tell a failed search from an empty one.
    pub fn to_payload(&self) -> Value {
        match self {
            Self::Records(records) => Value::Array(records.iter().map(person_payload).collect()),
            Self::Failed(error) => json!({
                "error": { "kind": error.kind(), "message": error.to_string() }
            }),
        }
    }

    pub fn to_content(&self) -> String {
        self.to_payload().to_string()
    }
}

fn person_payload(person: &Person) -> Value {
    json!({ "name": person.name, "age": person.age, "email": person.email })
}

/// Executes tool invocations against the shared, read-only dataset.
#[derive(Clone, Debug)]
pub struct ToolDispatcher {
    dataset: Arc<Dataset>,
}

impl ToolDispatcher {
    pub fn new(dataset: Arc<Dataset>) -> Self {
        Self { dataset }
    }

    /// Returns one outcome per invocation, in invocation order. A failing invocation never
    /// affects its siblings.
    pub fn dispatch(&self, invocations: &[ToolInvocation]) -> Vec<ToolOutcome> {
        invocations.iter().map(|invocation| self.dispatch_one(invocation)).collect()
    }

    pub fn dispatch_one(&self, invocation: &ToolInvocation) -> ToolOutcome {
        match self.execute(invocation) {
            Ok(records) => {
                info!(
                    event_name = "agent.tool.dispatched",
                    tool_call_id = invocation.id.as_str(),
                    tool = invocation.name.as_str(),
                    result_count = records.len(),
                    "tool invocation succeeded"
                );
                ToolOutcome::Records(records)
            }
            Err(error) => {
                warn!(
                    event_name = "agent.tool.failed",
                    tool_call_id = invocation.id.as_str(),
                    tool = invocation.name.as_str(),
                    error_kind = error.kind(),
                    error = %error,
                    "tool invocation failed"
                );
                ToolOutcome::Failed(error)
            }
        }
    }

    fn execute(&self, invocation: &ToolInvocation) -> Result<Vec<Person>, ToolError> {
        let kind = ToolKind::parse(&invocation.name)?;
        match kind {
            ToolKind::SearchDataset => {
                let arguments = repair(&invocation.arguments)?;
                let query = Query::from_arguments(&arguments)?;
                let dimensions =
                    query.dimensions().into_iter().map(QueryDimension::as_str).collect::<Vec<_>>();
                debug!(
                    event_name = "agent.tool.query",
                    tool_call_id = invocation.id.as_str(),
                    tool = kind.name(),
                    dimensions = ?dimensions,
                    comparator = query.age.map(|filter| filter.comparator.as_str()),
                    sort_by = query.sort.map(|order| order.as_str()),
                    num_results = query.limit,
                    "search arguments validated"
                );
                Ok(search(&self.dataset, &query))
            }
        }
    }
}
