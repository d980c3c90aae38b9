//! OpenAI chat completions client.

use super::{agent, post_json, PromptError, TextGenerator};
use serde::{Deserialize, Serialize};
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1/chat/completions";

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

pub struct OpenAiClient {
    api_key: String,
    model: String,
    base_url: String,
    agent: ureq::Agent,
}

impl OpenAiClient {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>, timeout: Duration) -> Self {
        Self {
            api_key: api_key.into(),
            model: model.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            agent: agent(timeout),
        }
    }

    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }
}

impl TextGenerator for OpenAiClient {
    fn prompt(&self, text: &str) -> Result<String, PromptError> {
        let body = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage { role: "user", content: text }],
        };
        let request = self
            .agent
            .post(&self.base_url)
            .set("Authorization", &format!("Bearer {}", self.api_key));
        let response: ChatResponse = post_json(request, &body)?;

        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| PromptError::Response("no choices in response".to_string()))?;
        Ok(choice.message.content.unwrap_or_default())
    }

    fn model(&self) -> &str {
        &self.model
    }
}
