use crate::traits::{ChatMessage, ChatRequest, ChatResponse, Provider, ToolCall, ToolSpec};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest<'a> {
    system_instruction: GeminiContent<'a>,
    contents: Vec<GeminiContent<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<GeminiTools<'a>>>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct GeminiContent<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'a str>,
    parts: Vec<GeminiTextPart<'a>>,
}

#[derive(Debug, Serialize)]
struct GeminiTextPart<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiTools<'a> {
    function_declarations: Vec<FunctionDeclaration<'a>>,
}

#[derive(Debug, Serialize)]
struct FunctionDeclaration<'a> {
    name: &'a str,
    description: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    parameters: Option<&'a Value>,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    temperature: f64,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiResponseContent>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponseContent {
    #[serde(default)]
    parts: Vec<GeminiResponsePart>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponsePart {
    text: Option<String>,
    function_call: Option<GeminiFunctionCall>,
}

#[derive(Debug, Deserialize)]
struct GeminiFunctionCall {
    name: String,
    #[serde(default)]
    args: Value,
}

/// Google Generative Language API client using `generateContent` with
/// function declarations.
pub struct GeminiProvider {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiProvider {
    pub fn new(api_key: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(120))
            .connect_timeout(std::time::Duration::from_secs(30))
            .build()
            .unwrap_or_default();

        Self {
            client,
            api_key: api_key.into(),
            model: "gemini-2.5-flash".to_string(),
            base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn convert_messages<'a>(&self, messages: &'a [ChatMessage]) -> Vec<GeminiContent<'a>> {
        messages
            .iter()
            .map(|m| GeminiContent {
                role: Some(if m.role == "assistant" { "model" } else { "user" }),
                parts: vec![GeminiTextPart { text: &m.content }],
            })
            .collect()
    }

    fn convert_tools<'a>(tools: &'a [ToolSpec]) -> Vec<GeminiTools<'a>> {
        let function_declarations = tools
            .iter()
            .map(|t| FunctionDeclaration {
                name: &t.name,
                description: &t.description,
                // The API refuses OBJECT schemas with no properties.
                parameters: has_properties(&t.parameters_schema).then_some(&t.parameters_schema),
            })
            .collect();
        vec![GeminiTools {
            function_declarations,
        }]
    }
}

fn has_properties(schema: &Value) -> bool {
    schema
        .get("properties")
        .and_then(Value::as_object)
        .is_some_and(|p| !p.is_empty())
}

#[async_trait]
impl Provider for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn chat(&self, request: ChatRequest<'_>) -> anyhow::Result<ChatResponse> {
        let gemini_request = GeminiRequest {
            system_instruction: GeminiContent {
                role: None,
                parts: vec![GeminiTextPart {
                    text: request.system,
                }],
            },
            contents: self.convert_messages(request.messages),
            tools: request.tools.map(Self::convert_tools),
            generation_config: GenerationConfig {
                temperature: request.temperature,
            },
        };

        let response = self
            .client
            .post(format!(
                "{}/models/{}:generateContent",
                self.base_url, self.model
            ))
            .header("x-goog-api-key", &self.api_key)
            .json(&gemini_request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(anyhow::anyhow!(
                "Gemini API error {}: {}",
                status,
                error_text
            ));
        }

        let gemini_response: GeminiResponse = response.json().await?;
        let parts = gemini_response
            .candidates
            .into_iter()
            .next()
            .ok_or_else(|| anyhow::anyhow!("No candidates in response"))?
            .content
            .map(|c| c.parts)
            .unwrap_or_default();

        let mut texts = Vec::new();
        let mut tool_calls = Vec::new();
        for part in parts {
            if let Some(call) = part.function_call {
                let arguments = match call.args {
                    Value::Null => "{}".to_string(),
                    args => args.to_string(),
                };
                tool_calls.push(ToolCall {
                    id: format!("call_{}", tool_calls.len()),
                    name: call.name,
                    arguments,
                });
            } else if let Some(text) = part.text {
                texts.push(text);
            }
        }

        Ok(ChatResponse {
            text: (!texts.is_empty()).then(|| texts.concat()),
            tool_calls,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn setup_mock_server(response_body: Value) -> (MockServer, GeminiProvider) {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/models/gemini-2.5-flash:generateContent"))
            .and(header("x-goog-api-key", "test_api_key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(response_body))
            .mount(&mock_server)
            .await;

        let provider = GeminiProvider::new("test_api_key").with_base_url(mock_server.uri());
        (mock_server, provider)
    }

    fn tools() -> Vec<ToolSpec> {
        vec![
            ToolSpec {
                name: "list_tables".into(),
                description: "Lists tables".into(),
                parameters_schema: json!({"type": "object", "properties": {}}),
            },
            ToolSpec {
                name: "describe_table".into(),
                description: "Describes a table".into(),
                parameters_schema: json!({
                    "type": "object",
                    "properties": {"table_name": {"type": "string"}},
                    "required": ["table_name"]
                }),
            },
        ]
    }

    #[tokio::test]
    async fn function_call_becomes_tool_call() -> anyhow::Result<()> {
        let (_server, provider) = setup_mock_server(json!({
            "candidates": [{
                "content": {
                    "role": "model",
                    "parts": [{"functionCall": {"name": "describe_table", "args": {"table_name": "books"}}}]
                }
            }]
        }))
        .await;

        let messages = [ChatMessage::user("Describe books")];
        let tools = tools();
        let response = provider
            .chat(ChatRequest {
                system: "system",
                messages: &messages,
                tools: Some(&tools[..]),
                temperature: 0.0,
            })
            .await?;

        assert_eq!(response.text, None);
        assert_eq!(response.tool_calls.len(), 1);
        assert_eq!(response.tool_calls[0].name, "describe_table");
        assert_eq!(
            serde_json::from_str::<Value>(&response.tool_calls[0].arguments)?,
            json!({"table_name": "books"})
        );
        Ok(())
    }

    #[tokio::test]
    async fn text_parts_are_joined() -> anyhow::Result<()> {
        let (_server, provider) = setup_mock_server(json!({
            "candidates": [{
                "content": {"parts": [{"text": "THOUGHT: done\n"}, {"text": "FINAL ANSWER: 4"}]}
            }]
        }))
        .await;

        let messages = [ChatMessage::user("How many tables?")];
        let response = provider
            .chat(ChatRequest {
                system: "system",
                messages: &messages,
                tools: None,
                temperature: 0.0,
            })
            .await?;

        assert_eq!(response.text.as_deref(), Some("THOUGHT: done\nFINAL ANSWER: 4"));
        assert!(!response.has_tool_calls());
        Ok(())
    }

    #[tokio::test]
    async fn request_carries_system_instruction_and_declarations() -> anyhow::Result<()> {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({
                "systemInstruction": {"parts": [{"text": "be careful"}]},
                "contents": [{"role": "user", "parts": [{"text": "hi"}]}],
                "tools": [{"functionDeclarations": [
                    {"name": "list_tables", "description": "Lists tables"},
                    {"name": "describe_table", "description": "Describes a table"}
                ]}]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{"content": {"parts": [{"text": "ok"}]}}]
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let provider = GeminiProvider::new("k").with_base_url(mock_server.uri());
        let messages = [ChatMessage::user("hi")];
        let tools = tools();
        let response = provider
            .chat(ChatRequest {
                system: "be careful",
                messages: &messages,
                tools: Some(&tools[..]),
                temperature: 0.0,
            })
            .await?;
        assert_eq!(response.text.as_deref(), Some("ok"));
        Ok(())
    }

    #[test]
    fn empty_schemas_are_not_declared() {
        assert!(!has_properties(&json!({"type": "object", "properties": {}})));
        assert!(has_properties(&json!({"properties": {"q": {"type": "string"}}})));
    }
}
