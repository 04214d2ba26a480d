//! Multi-provider LLM client.
//!
//! Supports the **Anthropic Messages API** and the **OpenAI Chat Completions
//! API** (including OpenAI-compatible proxies such as AI Proxy, Ollama and
//! vLLM) in non-streaming mode, plus the OpenAI embeddings endpoint.

use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde_json::{Value, json};

use crate::error::{AgentError, Result};
use crate::llm::types::{ChatRequest, LlmResponse, Message, Role, Usage};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Default Anthropic API base URL.
const ANTHROPIC_BASE_URL: &str = "https://api.anthropic.com";

/// Default OpenAI API base URL.
const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// Anthropic API version header value.
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Default embedding model for OpenAI-compatible providers.
pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-3-small";

/// Default HTTP timeout for a single model call.
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

// ---------------------------------------------------------------------------
// Provider enum
// ---------------------------------------------------------------------------

/// Identifies which LLM provider the client should target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LlmProvider {
    /// Anthropic Messages API.
    Anthropic,
    /// OpenAI Chat Completions API (also covers OpenAI-compatible endpoints).
    OpenAI,
}

impl LlmProvider {
    fn name(&self) -> &'static str {
        match self {
            Self::Anthropic => "anthropic",
            Self::OpenAI => "openai",
        }
    }
}

// ---------------------------------------------------------------------------
// Client configuration
// ---------------------------------------------------------------------------

/// Configuration for connecting to a single LLM provider endpoint.
#[derive(Debug, Clone)]
pub struct LlmClientConfig {
    /// Which provider this configuration targets.
    pub provider: LlmProvider,
    /// API key for authentication.
    pub api_key: String,
    /// Base URL for the API (e.g. `https://api.anthropic.com`).
    pub base_url: String,
    /// Default model identifier.
    pub default_model: String,
    /// Model used for `/embeddings` requests.
    pub embedding_model: String,
    /// Default maximum tokens per response.
    pub max_tokens: u32,
    /// Whole-request timeout in seconds.
    pub timeout_secs: u64,
}

impl LlmClientConfig {
    /// Create a configuration for the Anthropic Claude API.
    pub fn anthropic(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            provider: LlmProvider::Anthropic,
            api_key: api_key.into(),
            base_url: ANTHROPIC_BASE_URL.to_owned(),
            default_model: model.into(),
            embedding_model: String::new(),
            max_tokens: 1024,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    /// Create a configuration for the OpenAI API.
    pub fn openai(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self::openai_compatible(api_key, model, OPENAI_BASE_URL)
    }

    /// Create a configuration for any OpenAI-compatible API (e.g. AI Proxy,
    /// Ollama, vLLM).
    pub fn openai_compatible(
        api_key: impl Into<String>,
        model: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            provider: LlmProvider::OpenAI,
            api_key: api_key.into(),
            base_url: base_url.into(),
            default_model: model.into(),
            embedding_model: DEFAULT_EMBEDDING_MODEL.to_owned(),
            max_tokens: 1024,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// An LLM client that communicates with either the Anthropic Messages API or
/// an OpenAI-compatible Chat Completions API.
#[derive(Debug, Clone)]
pub struct LlmClient {
    config: Arc<LlmClientConfig>,
    http: reqwest::Client,
}

impl LlmClient {
    /// Create a new client with the given configuration.
    pub fn new(config: LlmClientConfig) -> Result<Self> {
        if config.api_key.is_empty() {
            return Err(AgentError::MissingApiKey {
                provider: config.provider.name().into(),
            });
        }

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AgentError::LlmRequestFailed {
                reason: format!("failed to build HTTP client: {e}"),
            })?;

        Ok(Self {
            config: Arc::new(config),
            http,
        })
    }

    // -----------------------------------------------------------------------
    // Public API
    // -----------------------------------------------------------------------

    /// Send a chat request and return the full response.
    pub async fn chat(&self, request: &ChatRequest) -> Result<LlmResponse> {
        let (url, body) = match self.config.provider {
            LlmProvider::Anthropic => (
                format!("{}/v1/messages", self.config.base_url),
                self.build_anthropic_request_body(request),
            ),
            LlmProvider::OpenAI => (
                format!("{}/chat/completions", self.config.base_url),
                self.build_openai_request_body(request),
            ),
        };

        let v = self.post_json(&url, &body).await?;

        match self.config.provider {
            LlmProvider::Anthropic => parse_anthropic_response(&v),
            LlmProvider::OpenAI => parse_openai_response(&v),
        }
    }

    /// Embed a batch of strings with the configured embedding model.
    ///
    /// Only OpenAI-compatible providers expose an embeddings endpoint.
    pub async fn embeddings(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>> {
        if self.config.provider != LlmProvider::OpenAI {
            return Err(AgentError::Unsupported {
                provider: self.config.provider.name().into(),
                capability: "embeddings",
            });
        }
        if inputs.is_empty() {
            return Ok(Vec::new());
        }

        let url = format!("{}/embeddings", self.config.base_url);
        let body = json!({
            "model": self.config.embedding_model,
            "input": inputs,
        });

        let v = self.post_json(&url, &body).await?;
        parse_embeddings_response(&v, inputs.len())
    }

    // -----------------------------------------------------------------------
    // HTTP
    // -----------------------------------------------------------------------

    fn headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        let api_key = &self.config.api_key;

        match self.config.provider {
            LlmProvider::Anthropic => {
                headers.insert(
                    "x-api-key",
                    HeaderValue::from_str(api_key).map_err(|e| AgentError::LlmRequestFailed {
                        reason: format!("invalid API key header: {e}"),
                    })?,
                );
                headers.insert(
                    "anthropic-version",
                    HeaderValue::from_static(ANTHROPIC_VERSION),
                );
            }
            LlmProvider::OpenAI => {
                headers.insert(
                    AUTHORIZATION,
                    HeaderValue::from_str(&format!("Bearer {api_key}")).map_err(|e| {
                        AgentError::LlmRequestFailed {
                            reason: format!("invalid authorization header: {e}"),
                        }
                    })?,
                );
            }
        }

        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(headers)
    }

    /// POST a JSON body and return the parsed JSON response, mapping non-2xx
    /// statuses to [`AgentError::LlmRequestFailed`].
    async fn post_json(&self, url: &str, body: &Value) -> Result<Value> {
        tracing::debug!(
            url = %url,
            model = %body["model"],
            provider = self.config.provider.name(),
            "sending LLM request"
        );

        let resp = self
            .http
            .post(url)
            .headers(self.headers()?)
            .json(body)
            .send()
            .await
            .map_err(|e| AgentError::LlmRequestFailed {
                reason: e.to_string(),
            })?;

        let status = resp.status();
        let text = resp
            .text()
            .await
            .map_err(|e| AgentError::LlmRequestFailed {
                reason: format!("failed to read response body: {e}"),
            })?;

        if !status.is_success() {
            return Err(AgentError::LlmRequestFailed {
                reason: format!("API returned {status}: {text}"),
            });
        }

        serde_json::from_str(&text).map_err(|e| AgentError::LlmParseFailed {
            reason: format!("invalid JSON response: {e}"),
        })
    }

    // -----------------------------------------------------------------------
    // Request building
    // -----------------------------------------------------------------------

    fn model_for<'a>(&'a self, request: &'a ChatRequest) -> &'a str {
        if request.model.is_empty() {
            &self.config.default_model
        } else {
            &request.model
        }
    }

    /// Build the JSON body for the Anthropic Messages API.
    fn build_anthropic_request_body(&self, request: &ChatRequest) -> Value {
        let (system_text, messages) = messages_to_anthropic(&request.messages);

        let mut body = json!({
            "model": self.model_for(request),
            "max_tokens": request.max_tokens.unwrap_or(self.config.max_tokens),
            "messages": messages,
        });

        if let Some(system) = system_text {
            body["system"] = json!(system);
        }

        if let Some(temp) = request.temperature {
            body["temperature"] = json!(temp);
        }

        body
    }

    /// Build the JSON body for the OpenAI Chat Completions API.
    fn build_openai_request_body(&self, request: &ChatRequest) -> Value {
        let mut body = json!({
            "model": self.model_for(request),
            "max_tokens": request.max_tokens.unwrap_or(self.config.max_tokens),
            "messages": messages_to_openai(&request.messages),
        });

        if let Some(temp) = request.temperature {
            body["temperature"] = json!(temp);
        }

        body
    }
}

// ===========================================================================
// Anthropic format conversion (free functions)
// ===========================================================================

/// Split the system message out (Anthropic expects it as a top-level field)
/// and convert the remaining messages to the Anthropic wire format.
fn messages_to_anthropic(messages: &[Message]) -> (Option<String>, Vec<Value>) {
    let mut system: Option<String> = None;
    let mut wire_messages: Vec<Value> = Vec::with_capacity(messages.len());

    for msg in messages {
        match msg.role {
            Role::System => match &mut system {
                Some(existing) => {
                    existing.push('\n');
                    existing.push_str(&msg.content);
                }
                None => system = Some(msg.content.clone()),
            },
            Role::User => {
                let content = match &msg.image {
                    Some(image) => json!([
                        {
                            "type": "image",
                            "source": {
                                "type": "base64",
                                "media_type": image.mime_type,
                                "data": image.base64,
                            }
                        },
                        { "type": "text", "text": msg.content },
                    ]),
                    None => json!(msg.content),
                };
                wire_messages.push(json!({ "role": "user", "content": content }));
            }
            Role::Assistant => {
                wire_messages.push(json!({ "role": "assistant", "content": msg.content }));
            }
        }
    }

    (system, wire_messages)
}

/// Parse a non-streaming Anthropic Messages API response.
fn parse_anthropic_response(v: &Value) -> Result<LlmResponse> {
    let content = v["content"]
        .as_array()
        .ok_or_else(|| AgentError::LlmParseFailed {
            reason: "missing `content` array in response".into(),
        })?;

    let text: String = content
        .iter()
        .filter(|block| block["type"] == "text")
        .filter_map(|block| block["text"].as_str())
        .collect();

    let usage = v["usage"].as_object().map(|u| Usage {
        input_tokens: u.get("input_tokens").and_then(Value::as_u64).unwrap_or(0) as u32,
        output_tokens: u.get("output_tokens").and_then(Value::as_u64).unwrap_or(0) as u32,
    });

    Ok(LlmResponse { text, usage })
}

// ===========================================================================
// OpenAI format conversion (free functions)
// ===========================================================================

/// Convert internal messages to the OpenAI Chat Completions wire format.
///
/// User messages with an image use the multi-part content form with an
/// `image_url` data URL.
pub fn messages_to_openai(messages: &[Message]) -> Vec<Value> {
    messages
        .iter()
        .map(|msg| {
            let role = match msg.role {
                Role::System => "system",
                Role::User => "user",
                Role::Assistant => "assistant",
            };
            match &msg.image {
                Some(image) if msg.role == Role::User => json!({
                    "role": role,
                    "content": [
                        { "type": "text", "text": msg.content },
                        { "type": "image_url", "image_url": { "url": image.data_url() } },
                    ],
                }),
                _ => json!({ "role": role, "content": msg.content }),
            }
        })
        .collect()
}

/// Parse a non-streaming OpenAI Chat Completions API response.
pub fn parse_openai_response(v: &Value) -> Result<LlmResponse> {
    let message = &v["choices"][0]["message"];

    if message.is_null() {
        return Err(AgentError::LlmParseFailed {
            reason: "missing `choices[0].message` in response".into(),
        });
    }

    if let Some(calls) = message["tool_calls"].as_array()
        && !calls.is_empty()
    {
        return Err(AgentError::LlmParseFailed {
            reason: "model answered with tool calls instead of text".into(),
        });
    }

    let text = message["content"]
        .as_str()
        .ok_or_else(|| AgentError::LlmParseFailed {
            reason: "missing `choices[0].message.content` in response".into(),
        })?
        .to_owned();

    let usage = v["usage"].as_object().map(|u| Usage {
        input_tokens: u.get("prompt_tokens").and_then(Value::as_u64).unwrap_or(0) as u32,
        output_tokens: u
            .get("completion_tokens")
            .and_then(Value::as_u64)
            .unwrap_or(0) as u32,
    });

    Ok(LlmResponse { text, usage })
}

/// Parse an OpenAI `/embeddings` response, ordering vectors by `index`.
pub fn parse_embeddings_response(v: &Value, expected: usize) -> Result<Vec<Vec<f32>>> {
    let data = v["data"]
        .as_array()
        .ok_or_else(|| AgentError::LlmParseFailed {
            reason: "missing `data` array in embeddings response".into(),
        })?;

    let mut indexed: Vec<(u64, Vec<f32>)> = Vec::with_capacity(data.len());
    for (position, item) in data.iter().enumerate() {
        let index = item["index"].as_u64().unwrap_or(position as u64);
        let vector = item["embedding"]
            .as_array()
            .ok_or_else(|| AgentError::LlmParseFailed {
                reason: format!("embedding {index} is not an array"),
            })?
            .iter()
            .map(|x| x.as_f64().map(|f| f as f32))
            .collect::<Option<Vec<f32>>>()
            .ok_or_else(|| AgentError::LlmParseFailed {
                reason: format!("embedding {index} contains a non-numeric value"),
            })?;
        indexed.push((index, vector));
    }

    if indexed.len() != expected {
        return Err(AgentError::LlmParseFailed {
            reason: format!(
                "expected {expected} embeddings, provider returned {}",
                indexed.len()
            ),
        });
    }

    indexed.sort_by_key(|(index, _)| *index);
    Ok(indexed.into_iter().map(|(_, vector)| vector).collect())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::types::ImageData;

    fn png() -> ImageData {
        ImageData {
            mime_type: "image/png".into(),
            base64: "iVBORw0KGgo=".into(),
        }
    }

    // -- Anthropic ------------------------------------------------------------

    #[test]
    fn build_anthropic_request_body_basic() {
        let config = LlmClientConfig::anthropic("test-key", "claude-sonnet-4-20250514");
        let client = LlmClient::new(config).unwrap();

        let request = ChatRequest {
            model: String::new(),
            messages: vec![Message::system("You are helpful."), Message::user("Hello")],
            temperature: Some(0.0),
            max_tokens: Some(16),
        };

        let body = client.build_anthropic_request_body(&request);

        assert_eq!(body["model"], "claude-sonnet-4-20250514");
        assert_eq!(body["system"], "You are helpful.");
        assert_eq!(body["max_tokens"], 16);
        assert_eq!(body["temperature"].as_f64().unwrap(), 0.0);

        let messages = body["messages"].as_array().unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0]["role"], "user");
        assert_eq!(messages[0]["content"], "Hello");
    }

    #[test]
    fn anthropic_image_becomes_base64_source_block() {
        let (_, wire) = messages_to_anthropic(&[Message::user_with_image("read it", png())]);
        let content = wire[0]["content"].as_array().unwrap();
        assert_eq!(content[0]["type"], "image");
        assert_eq!(content[0]["source"]["media_type"], "image/png");
        assert_eq!(content[1]["text"], "read it");
    }

    #[test]
    fn parse_anthropic_text_response() {
        let v = json!({
            "content": [
                {"type": "text", "text": "count_"},
                {"type": "text", "text": "weekdays"}
            ],
            "usage": {"input_tokens": 12, "output_tokens": 3}
        });
        let resp = parse_anthropic_response(&v).unwrap();
        assert_eq!(resp.text, "count_weekdays");
        assert_eq!(
            resp.usage,
            Some(Usage {
                input_tokens: 12,
                output_tokens: 3
            })
        );
    }

    #[test]
    fn empty_api_key_returns_error() {
        let config = LlmClientConfig::anthropic("", "claude-sonnet-4-20250514");
        assert!(matches!(
            LlmClient::new(config),
            Err(AgentError::MissingApiKey { .. })
        ));
    }

    #[tokio::test]
    async fn anthropic_has_no_embeddings() {
        let config = LlmClientConfig::anthropic("k", "claude-sonnet-4-20250514");
        let client = LlmClient::new(config).unwrap();
        let err = client.embeddings(&["a".to_owned()]).await.unwrap_err();
        assert!(matches!(err, AgentError::Unsupported { .. }));
    }

    // -- OpenAI ---------------------------------------------------------------

    #[test]
    fn openai_compatible_config_construction() {
        let config = LlmClientConfig::openai_compatible(
            "token",
            "gpt-4o-mini",
            "https://aiproxy.example/openai/v1",
        );
        assert_eq!(config.provider, LlmProvider::OpenAI);
        assert_eq!(config.base_url, "https://aiproxy.example/openai/v1");
        assert_eq!(config.embedding_model, DEFAULT_EMBEDDING_MODEL);
    }

    #[test]
    fn build_openai_request_body_basic() {
        let client = LlmClient::new(LlmClientConfig::openai("k", "gpt-4o-mini")).unwrap();
        let request = ChatRequest {
            model: String::new(),
            messages: vec![Message::system("Classify."), Message::user("sort contacts")],
            temperature: None,
            max_tokens: None,
        };

        let body = client.build_openai_request_body(&request);
        assert_eq!(body["model"], "gpt-4o-mini");
        assert_eq!(body["max_tokens"], 1024);
        assert!(body.get("temperature").is_none());
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["content"], "sort contacts");
    }

    #[test]
    fn openai_image_uses_multipart_content() {
        let wire = messages_to_openai(&[Message::user_with_image("digits?", png())]);
        let parts = wire[0]["content"].as_array().unwrap();
        assert_eq!(parts[0]["type"], "text");
        assert_eq!(parts[1]["type"], "image_url");
        assert_eq!(
            parts[1]["image_url"]["url"],
            "data:image/png;base64,iVBORw0KGgo="
        );
    }

    #[test]
    fn parse_openai_text_response() {
        let v = json!({
            "choices": [{
                "index": 0,
                "message": {"role": "assistant", "content": "sort_contacts"},
                "finish_reason": "stop"
            }],
            "usage": {"prompt_tokens": 10, "completion_tokens": 2}
        });
        let resp = parse_openai_response(&v).unwrap();
        assert_eq!(resp.text, "sort_contacts");
        assert_eq!(resp.usage.unwrap().output_tokens, 2);
    }

    #[test]
    fn parse_openai_rejects_tool_calls_and_missing_message() {
        let tool = json!({
            "choices": [{"message": {"tool_calls": [{"id": "c1"}]}}]
        });
        assert!(parse_openai_response(&tool).is_err());
        assert!(parse_openai_response(&json!({"choices": []})).is_err());
    }

    #[test]
    fn parse_embeddings_orders_by_index() {
        let v = json!({
            "data": [
                {"index": 1, "embedding": [0.0, 1.0]},
                {"index": 0, "embedding": [1.0, 0.0]}
            ]
        });
        let vectors = parse_embeddings_response(&v, 2).unwrap();
        assert_eq!(vectors[0], vec![1.0, 0.0]);
        assert_eq!(vectors[1], vec![0.0, 1.0]);
    }

    #[test]
    fn parse_embeddings_count_mismatch_is_error() {
        let v = json!({ "data": [{"index": 0, "embedding": [1.0]}] });
        assert!(parse_embeddings_response(&v, 2).is_err());
    }
}
