//! HTTP semantic translator
//!
//! Sends the query to an OpenAI-compatible chat-completions endpoint with
//! the feature schema in the system prompt and parses the reply as a raw
//! constraint payload. Never retries: one call per search.

use crate::translator::{TranslateError, Translator};
use async_trait::async_trait;
use reqwest::Client as HttpClient;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;
use wanderx_core::{FeatureSchema, RawConstraintPayload};

/// Default chat-completions endpoint
pub const DEFAULT_ENDPOINT: &str = "https://api.openai.com/v1/chat/completions";

/// Default model identifier
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

const SYSTEM_PROMPT: &str = "\
You translate travel wishes into numeric constraints over destination features.
Every feature is normalized; its domain is given in brackets.
Reply with a single JSON object and nothing else. Keys are feature names from the list below,
values are objects with an optional \"min\" and/or \"max\" number inside the feature's domain.
Only constrain features the wish actually talks about. Use {} when nothing applies.

Features:
";

/// Role of a chat message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: MessageRole,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

/// Request body for chat completions
#[derive(Debug, Clone, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<Message>,
    temperature: f32,
    response_format: ResponseFormat,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Translator backed by a chat-completions endpoint
#[derive(Clone)]
pub struct LlmTranslator {
    http_client: HttpClient,
    endpoint: String,
    model: String,
    api_key: Option<String>,
}

impl std::fmt::Debug for LlmTranslator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmTranslator")
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .field("api_key", &self.api_key.is_some())
            .finish()
    }
}

/// Builder for creating an LlmTranslator
#[derive(Default)]
pub struct LlmTranslatorBuilder {
    endpoint: Option<String>,
    model: Option<String>,
    api_key: Option<String>,
}

impl LlmTranslatorBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the endpoint URL (defaults to OpenAI chat completions)
    pub fn endpoint(mut self, url: impl Into<String>) -> Self {
        self.endpoint = Some(url.into());
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Set the bearer token; requests are sent unauthenticated without one
    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn build(self) -> Result<LlmTranslator, TranslateError> {
        let http_client = HttpClient::builder()
            .build()
            .map_err(|e| TranslateError::Unreachable(e.to_string()))?;

        Ok(LlmTranslator {
            http_client,
            endpoint: self.endpoint.unwrap_or_else(|| DEFAULT_ENDPOINT.to_string()),
            model: self.model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            api_key: self.api_key.filter(|k| !k.is_empty()),
        })
    }
}

impl LlmTranslator {
    pub fn builder() -> LlmTranslatorBuilder {
        LlmTranslatorBuilder::new()
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn build_request(&self, query: &str, schema: &FeatureSchema) -> ChatRequest {
        ChatRequest {
            model: self.model.clone(),
            messages: vec![
                Message::system(format!("{SYSTEM_PROMPT}{}", schema.describe())),
                Message::user(query),
            ],
            temperature: 0.0,
            response_format: ResponseFormat { kind: "json_object" },
        }
    }
}

fn classify(err: reqwest::Error) -> TranslateError {
    if err.is_timeout() {
        TranslateError::Timeout
    } else if err.is_decode() {
        TranslateError::MalformedOutput(err.to_string())
    } else {
        TranslateError::Unreachable(err.to_string())
    }
}

#[async_trait]
impl Translator for LlmTranslator {
    async fn translate(
        &self,
        query: &str,
        schema: &FeatureSchema,
        timeout: Duration,
    ) -> Result<RawConstraintPayload, TranslateError> {
        let body = self.build_request(query, schema);

        let mut request = self
            .http_client
            .post(&self.endpoint)
            .timeout(timeout)
            .json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await.map_err(classify)?;
        let status = response.status();
        if !status.is_success() {
            return Err(TranslateError::Unreachable(format!("HTTP {status}")));
        }

        let chat: ChatResponse = response.json().await.map_err(classify)?;
        let content = chat
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| TranslateError::MalformedOutput("response has no content".to_string()))?;

        debug!(model = %self.model, bytes = content.len(), "Translator replied");
        parse_constraint_content(&content)
    }
}

/// Parse a model reply into a raw payload.
///
/// Accepts an optional Markdown code fence and an optional top-level
/// `{"constraints": {...}}` wrapper. Anything that is not a JSON object is
/// malformed.
pub fn parse_constraint_content(content: &str) -> Result<RawConstraintPayload, TranslateError> {
    let body = strip_code_fence(content.trim());
    let value: Value = serde_json::from_str(body)
        .map_err(|e| TranslateError::MalformedOutput(e.to_string()))?;

    let value = match value {
        Value::Object(mut map) if map.len() == 1 && map.get("constraints").is_some_and(Value::is_object) => {
            map.remove("constraints").unwrap_or_default()
        }
        other => other,
    };

    let payload = RawConstraintPayload::from_value(value)
        .ok_or_else(|| TranslateError::MalformedOutput("expected a JSON object".to_string()))?;
    if !payload.has_constraint_shape() {
        return Err(TranslateError::MalformedOutput(
            "no entry is a {min, max} range".to_string(),
        ));
    }
    Ok(payload)
}

fn strip_code_fence(content: &str) -> &str {
    let Some(rest) = content.strip_prefix("```") else {
        return content;
    };
    // drop the info string ("json") on the opening fence line
    let rest = match rest.split_once('\n') {
        Some((_, body)) => body,
        None => rest.strip_prefix("json").unwrap_or(rest),
    };
    rest.trim_end().strip_suffix("```").unwrap_or(rest).trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_object() {
        let raw = parse_constraint_content(r#"{"avg_temp_c": {"min": 0.5}}"#).unwrap();
        assert_eq!(raw.len(), 1);
        assert!(raw.get("avg_temp_c").is_some());
    }

    #[test]
    fn test_parse_fenced_object() {
        let content = "```json\n{\"tourism_density\": {\"max\": 0.3}}\n```";
        let raw = parse_constraint_content(content).unwrap();
        assert!(raw.get("tourism_density").is_some());
    }

    #[test]
    fn test_parse_wrapped_object() {
        let raw = parse_constraint_content(r#"{"constraints": {"elevation": {"min": 0.6}}}"#).unwrap();
        assert!(raw.get("elevation").is_some());
        assert!(raw.get("constraints").is_none());
    }

    #[test]
    fn test_parse_empty_object() {
        assert!(parse_constraint_content("{}").unwrap().is_empty());
    }

    #[test]
    fn test_parse_single_line_fence() {
        let raw = parse_constraint_content("```{\"elevation\":{\"min\":0.6}}```").unwrap();
        assert!(raw.get("elevation").is_some());
    }

    #[test]
    fn test_entries_without_ranges_are_malformed() {
        assert!(matches!(
            parse_constraint_content(r#"{"avg_temp_c": "warm", "tourism_density": "low"}"#),
            Err(TranslateError::MalformedOutput(_))
        ));
    }

    #[test]
    fn test_malformed_output() {
        assert!(matches!(
            parse_constraint_content("Sure! Here are some warm places."),
            Err(TranslateError::MalformedOutput(_))
        ));
        assert!(matches!(
            parse_constraint_content("[1, 2, 3]"),
            Err(TranslateError::MalformedOutput(_))
        ));
    }

    #[test]
    fn test_request_carries_schema() {
        let translator = LlmTranslator::builder().model("test-model").build().unwrap();
        let schema = FeatureSchema::travel_default();
        let request = translator.build_request("chill beach", &schema);

        assert_eq!(request.model, "test-model");
        assert_eq!(request.messages.len(), 2);
        assert!(request.messages[0].content.contains("tourism_density [0, 1]"));
        assert_eq!(request.messages[1].content, "chill beach");

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["response_format"]["type"], "json_object");
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["role"], "user");
    }

    #[test]
    fn test_builder_defaults() {
        let translator = LlmTranslator::builder().api_key("").build().unwrap();
        assert_eq!(translator.endpoint(), DEFAULT_ENDPOINT);
        assert_eq!(translator.model(), DEFAULT_MODEL);
        assert!(translator.api_key.is_none());
    }

    #[tokio::test]
    async fn test_unreachable_endpoint() {
        let translator = LlmTranslator::builder()
            .endpoint("http://127.0.0.1:9/v1/chat/completions")
            .build()
            .unwrap();
        let schema = FeatureSchema::travel_default();
        let result = translator
            .translate("warm", &schema, Duration::from_millis(500))
            .await;
        assert!(matches!(
            result,
            Err(TranslateError::Unreachable(_)) | Err(TranslateError::Timeout)
        ));
    }
}
