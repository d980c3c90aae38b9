//! Anthropic messages API client.

use super::{agent, post_json, PromptError, TextGenerator};
use serde::{Deserialize, Serialize};
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://api.anthropic.com/v1/messages";
const API_VERSION: &str = "2023-06-01";

#[derive(Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    messages: Vec<Message<'a>>,
    max_tokens: u32,
}

#[derive(Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    text: String,
}

pub struct AnthropicClient {
    api_key: String,
    model: String,
    max_tokens: u32,
    base_url: String,
    agent: ureq::Agent,
}

impl AnthropicClient {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>, timeout: Duration) -> Self {
        Self {
            api_key: api_key.into(),
            model: model.into(),
            max_tokens: 2000,
            base_url: DEFAULT_BASE_URL.to_string(),
            agent: agent(timeout),
        }
    }

    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }
}

impl TextGenerator for AnthropicClient {
    fn prompt(&self, text: &str) -> Result<String, PromptError> {
        let body = MessagesRequest {
            model: &self.model,
            messages: vec![Message { role: "user", content: text }],
            max_tokens: self.max_tokens,
        };
        let request = self
            .agent
            .post(&self.base_url)
            .set("x-api-key", &self.api_key)
            .set("anthropic-version", API_VERSION);
        let response: MessagesResponse = post_json(request, &body)?;

        response
            .content
            .into_iter()
            .find(|block| block.kind == "text" || block.kind.is_empty())
            .map(|block| block.text)
            .ok_or_else(|| PromptError::Response("no content in response".to_string()))
    }

    fn model(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::testing::serve_once;

    fn client(url: &str) -> AnthropicClient {
        AnthropicClient::new("test-key", "claude-3-5-sonnet-latest", Duration::from_secs(5))
            .max_tokens(123)
            .base_url(url)
    }

    #[test]
    fn test_returns_first_text_block() {
        let (url, server) = serve_once(
            "200 OK",
            r#"{"content": [{"type": "text", "text": "looks fine"}, {"type": "text", "text": "extra"}]}"#,
        );

        let reply = client(&url).prompt("review this").expect("prompt");
        assert_eq!(reply, "looks fine");

        let request = server.join().expect("server");
        let lower = request.to_ascii_lowercase();
        assert!(lower.contains("x-api-key: test-key"));
        assert!(lower.contains("anthropic-version: 2023-06-01"));
        assert!(request.contains(r#""max_tokens":123"#));
        assert!(request.contains(r#""content":"review this""#));
    }

    #[test]
    fn test_too_many_requests_is_rate_limited() {
        let (url, server) = serve_once("429 Too Many Requests", "{}");
        let err = client(&url).prompt("hi").unwrap_err();
        assert!(matches!(err, PromptError::RateLimited));
        server.join().expect("server");
    }

    #[test]
    fn test_server_error_keeps_status_and_body() {
        let (url, server) = serve_once("500 Internal Server Error", r#"{"error":"overloaded"}"#);
        let err = client(&url).prompt("hi").unwrap_err();
        match err {
            PromptError::Status { status, body } => {
                assert_eq!(status, 500);
                assert!(body.contains("overloaded"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        server.join().expect("server");
    }

    #[test]
    fn test_empty_content_is_response_error() {
        let (url, server) = serve_once("200 OK", r#"{"content": []}"#);
        let err = client(&url).prompt("hi").unwrap_err();
        assert!(matches!(err, PromptError::Response(_)));
        server.join().expect("server");
    }
}
