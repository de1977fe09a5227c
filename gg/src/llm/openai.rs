//! OpenAI-compatible chat completions client
//!
//! Works against any endpoint speaking the `/v1/chat/completions` protocol
//! (OpenAI, Groq, local gateways). JSON mode maps to `response_format`.

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use super::http::{build_http, post_json};
use super::{CompletionRequest, CompletionResponse, LlmClient, LlmError, ResponseFormat, Role, StopReason, TokenUsage};
use crate::config::LlmConfig;

/// OpenAI-compatible API client
pub struct OpenAIClient {
    model: String,
    api_key: String,
    base_url: String,
    http: Client,
    max_tokens: u32,
    timeout: Duration,
}

impl OpenAIClient {
    /// Create a new client from configuration
    ///
    /// Reads the API key from the environment variable named in config.
    pub fn from_config(config: &LlmConfig) -> Result<Self, LlmError> {
        debug!(provider = %config.provider, model = %config.model, "OpenAIClient::from_config: called");
        let api_key = config.get_api_key()?;
        let timeout = Duration::from_millis(config.timeout_ms);

        Ok(Self {
            model: config.model.clone(),
            api_key,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            http: build_http(timeout)?,
            max_tokens: config.max_tokens,
            timeout,
        })
    }

    /// Build the request body for the chat completions API
    fn build_request_body(&self, request: &CompletionRequest) -> serde_json::Value {
        debug!(%self.model, %request.max_tokens, "build_request_body: called");

        let mut messages = vec![serde_json::json!({
            "role": "system",
            "content": request.system_prompt,
        })];

        messages.extend(request.messages.iter().map(|msg| {
            let role = match msg.role {
                Role::User => "user",
                Role::Assistant => "assistant",
            };
            serde_json::json!({ "role": role, "content": msg.content })
        }));

        let max_tokens = request.max_tokens.min(self.max_tokens);

        // GPT-5.x and o1/o3 models use max_completion_tokens instead of max_tokens
        let uses_completion_tokens =
            self.model.starts_with("gpt-5") || self.model.starts_with("o1") || self.model.starts_with("o3");

        let mut body = serde_json::json!({
            "model": self.model,
            "messages": messages,
        });

        if uses_completion_tokens {
            body["max_completion_tokens"] = serde_json::json!(max_tokens);
        } else {
            body["max_tokens"] = serde_json::json!(max_tokens);
        }

        if request.response_format == ResponseFormat::Json {
            debug!("build_request_body: json mode");
            body["response_format"] = serde_json::json!({ "type": "json_object" });
        }

        body
    }

    fn headers(&self) -> Result<HeaderMap, LlmError> {
        let mut headers = HeaderMap::new();
        let bearer = HeaderValue::from_str(&format!("Bearer {}", self.api_key))
            .map_err(|e| LlmError::InvalidResponse(format!("API key is not a valid header value: {}", e)))?;
        headers.insert(AUTHORIZATION, bearer);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(headers)
    }

    /// Parse the chat completions response
    fn parse_response(&self, api_response: OpenAIResponse) -> CompletionResponse {
        debug!(choice_count = %api_response.choices.len(), "parse_response: called");
        let (content, stop_reason) = match api_response.choices.into_iter().next() {
            Some(c) => (
                c.message.content,
                c.finish_reason
                    .as_deref()
                    .map(StopReason::from_openai)
                    .unwrap_or(StopReason::EndTurn),
            ),
            None => (None, StopReason::EndTurn),
        };

        let usage = api_response
            .usage
            .map(|u| TokenUsage {
                input_tokens: u.prompt_tokens,
                output_tokens: u.completion_tokens,
            })
            .unwrap_or_default();

        CompletionResponse {
            content,
            stop_reason,
            usage,
        }
    }
}

#[async_trait]
impl LlmClient for OpenAIClient {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        debug!(%self.model, %request.max_tokens, "complete: called");
        let url = format!("{}/v1/chat/completions", self.base_url);
        let body = self.build_request_body(&request);

        let raw = post_json(&self.http, &url, self.headers()?, &body, self.timeout).await?;
        let api_response: OpenAIResponse = serde_json::from_value(raw)?;
        Ok(self.parse_response(api_response))
    }
}

// Chat completions response types

#[derive(Debug, Deserialize)]
struct OpenAIResponse {
    choices: Vec<OpenAIChoice>,
    usage: Option<OpenAIUsage>,
}

#[derive(Debug, Deserialize)]
struct OpenAIChoice {
    message: OpenAIMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAIMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAIUsage {
    prompt_tokens: u64,
    completion_tokens: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::Message;

    fn client(model: &str, max_tokens: u32) -> OpenAIClient {
        OpenAIClient {
            model: model.to_string(),
            api_key: "test-key".to_string(),
            base_url: "https://api.groq.com/openai".to_string(),
            http: Client::new(),
            max_tokens,
            timeout: Duration::from_secs(60),
        }
    }

    #[test]
    fn test_build_request_body_basic() {
        let client = client("llama-3.3-70b-versatile", 8192);
        let request = CompletionRequest::text(
            "You are GlobeGuide",
            vec![Message::user("Hello"), Message::assistant("Hi!"), Message::user("Japan?")],
            1000,
        );

        let body = client.build_request_body(&request);

        assert_eq!(body["model"], "llama-3.3-70b-versatile");
        assert_eq!(body["max_tokens"], 1000);
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][0]["content"], "You are GlobeGuide");
        assert_eq!(body["messages"][1]["role"], "user");
        assert_eq!(body["messages"][2]["role"], "assistant");
        assert_eq!(body["messages"][3]["content"], "Japan?");
        assert!(body.get("response_format").is_none());
    }

    #[test]
    fn test_json_mode_sets_response_format() {
        let client = client("gpt-4o-mini", 8192);
        let request = CompletionRequest::json("Extract JSON", vec![Message::user("spring in Kyoto")], 256);

        let body = client.build_request_body(&request);
        assert_eq!(body["response_format"]["type"], "json_object");
    }

    #[test]
    fn test_max_tokens_capped_and_renamed_for_reasoning_models() {
        let body = client("gpt-4o", 1000).build_request_body(&CompletionRequest::text("Test", vec![], 5000));
        assert_eq!(body["max_tokens"], 1000);

        let body = client("o3-mini", 1000).build_request_body(&CompletionRequest::text("Test", vec![], 500));
        assert_eq!(body["max_completion_tokens"], 500);
        assert!(body.get("max_tokens").is_none());
    }

    #[test]
    fn test_parse_response() {
        let raw = serde_json::json!({
            "choices": [{
                "message": { "role": "assistant", "content": "Cherry blossoms peak in early April." },
                "finish_reason": "stop"
            }],
            "usage": { "prompt_tokens": 12, "completion_tokens": 9 }
        });
        let parsed: OpenAIResponse = serde_json::from_value(raw).unwrap();
        let response = client("m", 100).parse_response(parsed);

        assert_eq!(response.content.as_deref(), Some("Cherry blossoms peak in early April."));
        assert_eq!(response.stop_reason, StopReason::EndTurn);
        assert_eq!(response.usage.output_tokens, 9);
    }

    #[test]
    fn test_parse_response_without_choices_or_usage() {
        let parsed: OpenAIResponse = serde_json::from_value(serde_json::json!({ "choices": [] })).unwrap();
        let response = client("m", 100).parse_response(parsed);
        assert!(response.content.is_none());
        assert_eq!(response.usage, TokenUsage::default());
    }
}
