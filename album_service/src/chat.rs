//! Proxy that forwards a single prompt to the chat-completion API.
//!
//! One request per call: no retries, no streaming, transport-default
//! timeouts. Only the first choice's content survives; usage counters and
//! other response metadata are dropped.

use serde::{Deserialize, Serialize};
use tracing::{debug, error, instrument};

use crate::error::ChatError;

pub const CHAT_COMPLETIONS_URL: &str = "https://api.openai.com/v1/chat/completions";
pub const CHAT_MODEL: &str = "gpt-4o-mini";
pub const MAX_TOKENS: u32 = 100;
pub const TEMPERATURE: f64 = 0.7;

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 1],
    max_tokens: u32,
    temperature: f64,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ReplyMessage,
}

#[derive(Debug, Deserialize)]
struct ReplyMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Stateless client for the upstream chat endpoint.
#[derive(Debug, Clone)]
pub struct ChatProxy {
    client: reqwest::Client,
    api_key: String,
    endpoint: String,
}

impl ChatProxy {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            endpoint: CHAT_COMPLETIONS_URL.to_string(),
        }
    }

    /// Point the proxy at a different completion URL.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Send `prompt` as a single user message and return the trimmed reply.
    #[instrument(skip(self, prompt), fields(prompt_len = prompt.len()))]
    pub async fn complete(&self, prompt: &str) -> Result<String, ChatError> {
        let request = CompletionRequest {
            model: CHAT_MODEL,
            messages: [ChatMessage {
                role: "user",
                content: prompt,
            }],
            max_tokens: MAX_TOKENS,
            temperature: TEMPERATURE,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                error!("Error sending request to chat upstream: {}", e);
                ChatError::UpstreamRequest(e.to_string())
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            error!("Error reading chat upstream response body: {}", e);
            ChatError::UpstreamRequest(e.to_string())
        })?;

        if !status.is_success() {
            error!("Non-success response from chat upstream: {} - {}", status, body);
            return Err(ChatError::UpstreamStatus {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: CompletionResponse = serde_json::from_str(&body).map_err(|e| {
            error!("Error decoding chat upstream response: {}", e);
            ChatError::Decode(e.to_string())
        })?;

        let first = parsed.choices.into_iter().next().ok_or_else(|| {
            error!("Chat upstream returned no choices");
            ChatError::EmptyResponse
        })?;

        let reply = first.message.content.unwrap_or_default();
        debug!("Chat upstream replied with {} chars", reply.len());
        Ok(reply.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{bearer_token, body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn proxy_for(server: &MockServer) -> ChatProxy {
        ChatProxy::new("test-key").with_endpoint(format!("{}/v1/chat/completions", server.uri()))
    }

    fn completion(content: serde_json::Value) -> serde_json::Value {
        json!({
            "id": "chatcmpl-1",
            "object": "chat.completion",
            "created": 1_700_000_000,
            "model": "gpt-4o-mini",
            "choices": [{
                "index": 0,
                "message": { "role": "assistant", "content": content, "refusal": null },
                "logprobs": null,
                "finish_reason": "stop"
            }],
            "usage": { "prompt_tokens": 5, "completion_tokens": 1, "total_tokens": 6 },
            "system_fingerprint": "fp_1"
        })
    }

    #[test]
    fn test_request_shape() {
        let request = CompletionRequest {
            model: CHAT_MODEL,
            messages: [ChatMessage {
                role: "user",
                content: "hi",
            }],
            max_tokens: MAX_TOKENS,
            temperature: TEMPERATURE,
        };
        let value = serde_json::to_value(&request).unwrap();

        assert_eq!(value["model"], "gpt-4o-mini");
        assert_eq!(value["messages"], json!([{ "role": "user", "content": "hi" }]));
        assert_eq!(value["max_tokens"], 100);
        assert!((value["temperature"].as_f64().unwrap() - 0.7).abs() < 1e-6);
    }

    #[test]
    fn test_default_endpoint() {
        assert_eq!(ChatProxy::new("k").endpoint(), CHAT_COMPLETIONS_URL);
    }

    #[tokio::test]
    async fn test_complete_trims_first_choice() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(bearer_token("test-key"))
            .and(body_partial_json(json!({
                "model": "gpt-4o-mini",
                "max_tokens": 100,
                "messages": [{ "role": "user", "content": "say hello" }]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion(json!("  hello  "))))
            .expect(1)
            .mount(&server)
            .await;

        let reply = proxy_for(&server).complete("say hello").await.unwrap();
        assert_eq!(reply, "hello");
    }

    #[tokio::test]
    async fn test_null_content_is_empty_reply() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion(json!(null))))
            .mount(&server)
            .await;

        let reply = proxy_for(&server).complete("anything").await.unwrap();
        assert_eq!(reply, "");
    }

    #[tokio::test]
    async fn test_zero_choices_is_empty_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "choices": [] })))
            .mount(&server)
            .await;

        let result = proxy_for(&server).complete("hi").await;
        assert!(matches!(result, Err(ChatError::EmptyResponse)));
    }

    #[tokio::test]
    async fn test_non_success_status_carries_status_and_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_string("invalid api key"))
            .mount(&server)
            .await;

        let result = proxy_for(&server).complete("hi").await;
        match result {
            Err(ChatError::UpstreamStatus { status, body }) => {
                assert_eq!(status, 401);
                assert_eq!(body, "invalid api key");
            }
            other => panic!("expected UpstreamStatus, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_malformed_body_is_decode_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let result = proxy_for(&server).complete("hi").await;
        assert!(matches!(result, Err(ChatError::Decode(_))));
    }

    #[tokio::test]
    async fn test_unreachable_upstream_is_request_error() {
        // Nothing listens on port 9 of the loopback interface.
        let proxy = ChatProxy::new("k").with_endpoint("http://127.0.0.1:9/v1/chat/completions");

        let result = proxy.complete("hi").await;
        assert!(matches!(result, Err(ChatError::UpstreamRequest(_))));
    }
}
