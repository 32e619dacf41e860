use crate::traits::{ChatMessage, ChatRequest, ChatResponse, Provider, ToolCall, ToolSpec};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
struct OllamaRequest<'a> {
    model: &'a str,
    messages: Vec<OllamaMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<OllamaTool<'a>>>,
    options: OllamaOptions,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct OllamaMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct OllamaTool<'a> {
    r#type: &'a str,
    function: OllamaToolFunction<'a>,
}

#[derive(Debug, Serialize)]
struct OllamaToolFunction<'a> {
    name: &'a str,
    description: &'a str,
    parameters: &'a serde_json::Value,
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    temperature: f64,
}

#[derive(Debug, Deserialize)]
struct OllamaResponse {
    message: OllamaResponseMessage,
}

#[derive(Debug, Deserialize)]
struct OllamaResponseMessage {
    content: Option<String>,
    tool_calls: Option<Vec<OllamaToolCallResponse>>,
}

#[derive(Debug, Deserialize)]
struct OllamaToolCallResponse {
    function: OllamaFunctionResponse,
}

#[derive(Debug, Deserialize)]
struct OllamaFunctionResponse {
    name: String,
    arguments: serde_json::Value,
}

pub struct OllamaProvider {
    client: reqwest::Client,
    base_url: String,
    model: String,
}

impl Default for OllamaProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl OllamaProvider {
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(300))
            .connect_timeout(std::time::Duration::from_secs(30))
            .build()
            .unwrap_or_default();

        Self {
            client,
            base_url: "http://localhost:11434".to_string(),
            model: "llama3.2".to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        let url = base_url.into();
        self.base_url = url.trim_end_matches('/').to_string();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    fn convert_messages<'a>(
        system: &'a str,
        messages: &'a [ChatMessage],
    ) -> Vec<OllamaMessage<'a>> {
        std::iter::once(OllamaMessage {
            role: "system",
            content: system,
        })
        .chain(messages.iter().map(|m| OllamaMessage {
            role: &m.role,
            content: &m.content,
        }))
        .collect()
    }

    fn convert_tools(tools: &[ToolSpec]) -> Vec<OllamaTool<'_>> {
        tools
            .iter()
            .map(|t| OllamaTool {
                r#type: "function",
                function: OllamaToolFunction {
                    name: &t.name,
                    description: &t.description,
                    parameters: &t.parameters_schema,
                },
            })
            .collect()
    }
}

#[async_trait]
impl Provider for OllamaProvider {
    fn name(&self) -> &str {
        "ollama"
    }

    async fn chat(&self, request: ChatRequest<'_>) -> anyhow::Result<ChatResponse> {
        let ollama_request = OllamaRequest {
            model: &self.model,
            messages: Self::convert_messages(request.system, request.messages),
            tools: request.tools.map(Self::convert_tools),
            options: OllamaOptions {
                temperature: request.temperature,
            },
            stream: false,
        };

        let response = self
            .client
            .post(format!("{}/api/chat", self.base_url))
            .json(&ollama_request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(anyhow::anyhow!(
                "Ollama API error {}: {}",
                status,
                error_text
            ));
        }

        let ollama_response: OllamaResponse = response.json().await?;
        let message = ollama_response.message;

        let tool_calls = message
            .tool_calls
            .unwrap_or_default()
            .into_iter()
            .enumerate()
            .map(|(idx, c)| ToolCall {
                id: format!("call_{}", idx),
                name: c.function.name,
                arguments: c.function.arguments.to_string(),
            })
            .collect();

        Ok(ChatResponse {
            text: message.content.filter(|c| !c.trim().is_empty()),
            tool_calls,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn tool_call_arguments_are_serialized() -> anyhow::Result<()> {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .and(body_partial_json(json!({"model": "qwen3", "stream": false})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "message": {
                    "role": "assistant",
                    "content": "",
                    "tool_calls": [{"function": {"name": "query_database", "arguments": {"query": "SELECT 1"}}}]
                },
                "done": true
            })))
            .mount(&mock_server)
            .await;

        let provider = OllamaProvider::new()
            .with_base_url(mock_server.uri())
            .with_model("qwen3");
        let messages = [ChatMessage::user("run it")];
        let response = provider
            .chat(ChatRequest {
                system: "system",
                messages: &messages,
                tools: None,
                temperature: 0.0,
            })
            .await?;

        assert_eq!(response.text, None);
        assert_eq!(response.tool_calls[0].name, "query_database");
        assert_eq!(response.tool_calls[0].arguments, r#"{"query":"SELECT 1"}"#);
        Ok(())
    }
}
