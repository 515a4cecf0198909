//! OpenAI-compatible chat-completions client.
//!
//! Works against api.openai.com and any server exposing the same `/chat/completions`
//! surface with function tools (Ollama's `/v1` endpoint included).

use std::time::Duration;

use async_trait::async_trait;
use roster_core::config::LlmConfig;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::errors::ModelCallError;
use crate::llm::{ChatMessage, LlmClient, Role, ToolInvocation, ToolSchema};

pub struct OpenAiClient {
    http: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: Option<SecretString>,
}

impl OpenAiClient {
    pub fn new(
        base_url: &str,
        model: impl Into<String>,
        api_key: Option<SecretString>,
        timeout: Duration,
    ) -> Result<Self, ModelCallError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|error| ModelCallError::Transport(error.to_string()))?;

        Ok(Self {
            http,
            endpoint: format!("{}/chat/completions", base_url.trim_end_matches('/')),
            model: model.into(),
            api_key,
        })
    }

    pub fn from_config(config: &LlmConfig) -> Result<Self, ModelCallError> {
        Self::new(
            config.effective_base_url(),
            config.model.clone(),
            config.api_key.clone(),
            Duration::from_secs(config.timeout_secs),
        )
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn build_request<'a>(
        &'a self,
        transcript: &'a [ChatMessage],
        tools: &'a [ToolSchema],
    ) -> WireRequest<'a> {
        WireRequest {
            model: &self.model,
            messages: transcript.iter().map(WireMessage::from).collect(),
            tools: tools.iter().map(WireTool::from).collect(),
        }
    }
}

#[async_trait]
impl LlmClient for OpenAiClient {
    async fn complete(
        &self,
        transcript: &[ChatMessage],
        tools: &[ToolSchema],
    ) -> Result<ChatMessage, ModelCallError> {
        let payload = self.build_request(transcript, tools);
        let mut request = self.http.post(&self.endpoint).json(&payload);
        if let Some(api_key) = &self.api_key {
            request = request.bearer_auth(api_key.expose_secret());
        }

        let response = request
            .send()
            .await
            .map_err(|error| ModelCallError::Transport(error.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ModelCallError::Provider { status: status.as_u16(), body });
        }

        let body = response
            .text()
            .await
            .map_err(|error| ModelCallError::Transport(error.to_string()))?;
        debug!(
            event_name = "agent.model.raw_response",
            model = self.model.as_str(),
            bytes = body.len(),
            "received chat completion"
        );

        parse_response(&body)
    }
}

fn parse_response(body: &str) -> Result<ChatMessage, ModelCallError> {
    let response: WireResponse = serde_json::from_str(body)
        .map_err(|error| ModelCallError::InvalidResponse(error.to_string()))?;
    let choice = response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| ModelCallError::InvalidResponse("response contained no choices".to_string()))?;

    let tool_calls = choice
        .message
        .tool_calls
        .into_iter()
        .map(|call| ToolInvocation::new(call.id, call.function.name, call.function.arguments))
        .collect();

    Ok(ChatMessage {
        role: Role::Assistant,
        content: choice.message.content,
        tool_calls,
        tool_call_id: None,
        name: None,
    })
}

#[derive(Serialize)]
struct WireRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage<'a>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<WireTool<'a>>,
}

#[derive(Serialize)]
struct WireMessage<'a> {
    role: Role,
    content: Option<&'a str>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tool_calls: Vec<WireToolCall<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
}

impl<'a> From<&'a ChatMessage> for WireMessage<'a> {
    fn from(message: &'a ChatMessage) -> Self {
        Self {
            role: message.role,
            content: message.content.as_deref(),
            tool_calls: message.tool_calls.iter().map(WireToolCall::from).collect(),
            tool_call_id: message.tool_call_id.as_deref(),
            name: message.name.as_deref(),
        }
    }
}

#[derive(Serialize)]
struct WireToolCall<'a> {
    id: &'a str,
    #[serde(rename = "type")]
    kind: &'static str,
    function: WireFunctionCall<'a>,
}

impl<'a> From<&'a ToolInvocation> for WireToolCall<'a> {
    fn from(invocation: &'a ToolInvocation) -> Self {
        Self {
            id: &invocation.id,
            kind: "function",
            function: WireFunctionCall { name: &invocation.name, arguments: &invocation.arguments },
        }
    }
}

#[derive(Serialize)]
struct WireFunctionCall<'a> {
    name: &'a str,
    arguments: &'a str,
}

#[derive(Serialize)]
struct WireTool<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    function: WireFunction<'a>,
}

impl<'a> From<&'a ToolSchema> for WireTool<'a> {
    fn from(schema: &'a ToolSchema) -> Self {
        Self {
            kind: "function",
            function: WireFunction {
                name: &schema.name,
                description: &schema.description,
                parameters: &schema.parameters,
                strict: schema.strict,
            },
        }
    }
}

#[derive(Serialize)]
struct WireFunction<'a> {
    name: &'a str,
    description: &'a str,
    parameters: &'a Value,
    strict: bool,
}

#[derive(Deserialize)]
struct WireResponse {
    #[serde(default)]
    choices: Vec<WireChoice>,
}

#[derive(Deserialize)]
struct WireChoice {
    message: WireResponseMessage,
}

#[derive(Deserialize)]
struct WireResponseMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tool_calls: Vec<WireResponseToolCall>,
}

#[derive(Deserialize)]
struct WireResponseToolCall {
    id: String,
    function: WireResponseFunction,
}

#[derive(Deserialize)]
struct WireResponseFunction {
    name: String,
    #[serde(default)]
    arguments: String,
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use roster_core::config::{AppConfig, LlmProvider};
    use serde_json::json;

    use super::{parse_response, OpenAiClient};
    use crate::errors::ModelCallError;
    use crate::llm::{ChatMessage, Role, ToolInvocation};
    use crate::tools::tool_schemas;

    fn client() -> OpenAiClient {
        OpenAiClient::new("http://localhost:9/v1/", "test-model", None, Duration::from_secs(1))
            .expect("client builds")
    }

    #[test]
    fn endpoint_joins_base_url_without_double_slash() {
        assert_eq!(client().endpoint(), "http://localhost:9/v1/chat/completions");
    }

    #[test]
    fn from_config_uses_provider_default_base_url() {
        let mut config = AppConfig::default();
        config.llm.provider = LlmProvider::Ollama;
        config.llm.model = "llama3.1".to_string();

        let client = OpenAiClient::from_config(&config.llm).expect("client builds");
        assert_eq!(client.endpoint(), "http://localhost:11434/v1/chat/completions");
        assert_eq!(client.model(), "llama3.1");
    }

    #[test]
    fn request_carries_tool_calls_and_tool_results() {
        let client = client();
        let transcript = vec![
            ChatMessage::user("who is under 30"),
            ChatMessage::assistant_tool_calls(vec![ToolInvocation::new(
                "call_1",
                "search_dataset",
                r#"{"queryType":[]}"#,
            )]),
            ChatMessage::tool_result("call_1", "search_dataset", "[]"),
        ];
        let tools = tool_schemas();

        let request = serde_json::to_value(client.build_request(&transcript, &tools))
            .expect("request serializes");

        assert_eq!(request["model"], "test-model");
        assert_eq!(request["messages"][0], json!({ "role": "user", "content": "who is under 30" }));
        assert_eq!(request["messages"][1]["content"], json!(null));
        assert_eq!(request["messages"][1]["tool_calls"][0]["type"], "function");
        assert_eq!(request["messages"][1]["tool_calls"][0]["function"]["name"], "search_dataset");
        assert_eq!(request["messages"][2]["role"], "tool");
        assert_eq!(request["messages"][2]["tool_call_id"], "call_1");
        assert_eq!(request["tools"][0]["function"]["name"], "search_dataset");
        assert_eq!(request["tools"][0]["function"]["strict"], true);
    }

    #[test]
    fn parses_tool_call_response() {
        let message = parse_response(
            &json!({
                "choices": [{
                    "message": {
                        "role": "assistant",
                        "content": null,
                        "tool_calls": [{
                            "id": "call_9",
                            "type": "function",
                            "function": { "name": "search_dataset", "arguments": "{\"queryType\":[]}" }
                        }]
                    }
                }]
            })
            .to_string(),
        )
        .expect("response parses");

        assert_eq!(message.role, Role::Assistant);
        assert_eq!(message.content, None);
        assert_eq!(
            message.tool_calls,
            vec![ToolInvocation::new("call_9", "search_dataset", "{\"queryType\":[]}")]
        );
    }

    #[test]
    fn parses_plain_text_response() {
        let message = parse_response(r#"{"choices":[{"message":{"role":"assistant","content":"Hi"}}]}"#)
            .expect("response parses");
        assert_eq!(message, ChatMessage::assistant("Hi"));
    }

    #[test]
    fn missing_choices_is_an_invalid_response() {
        assert!(matches!(
            parse_response(r#"{"choices":[]}"#),
            Err(ModelCallError::InvalidResponse(_))
        ));
        assert!(matches!(parse_response("not json"), Err(ModelCallError::InvalidResponse(_))));
    }
}
