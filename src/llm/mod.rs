//! Text-generation capability and the provider clients behind it

pub mod anthropic;
pub mod bucket;
pub mod openai;

pub use anthropic::AnthropicClient;
pub use bucket::TokenBucket;
pub use openai::OpenAiClient;

use crate::config::Config;
use crate::error::{Error, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;

/// Why a single model call failed.
#[derive(Error, Debug)]
pub enum PromptError {
    /// The provider asked us to slow down (HTTP 429). Retryable.
    #[error("rate limited by provider")]
    RateLimited,

    #[error("request failed: {0}")]
    Transport(String),

    #[error("provider returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("unexpected provider response: {0}")]
    Response(String),
}

/// Anything that turns a prompt into generated text.
pub trait TextGenerator {
    fn prompt(&self, text: &str) -> std::result::Result<String, PromptError>;

    /// Provider model identifier, for logs.
    fn model(&self) -> &str;
}

/// Model aliases accepted on the command line.
pub const MODEL_ALIASES: &[&str] = &["sonnet", "o1", "o1-mini", "4o"];

pub const ANTHROPIC_KEY_VAR: &str = "ANTHROPIC_API_KEY";
pub const OPENAI_KEY_VAR: &str = "OPENAI_API_KEY";

/// Resolve a model alias to a client, reading its API key from the environment.
pub fn build_generator(alias: &str, config: &Config) -> Result<Box<dyn TextGenerator>> {
    let timeout = Duration::from_secs(config.request_timeout_secs);
    match alias {
        "sonnet" => {
            let key = api_key(ANTHROPIC_KEY_VAR)?;
            Ok(Box::new(
                AnthropicClient::new(key, "claude-3-5-sonnet-latest", timeout)
                    .max_tokens(config.max_tokens),
            ))
        }
        "o1" | "o1-mini" | "4o" => {
            let model = match alias {
                "o1" => "o1-preview",
                "o1-mini" => "o1-mini",
                _ => "gpt-4o",
            };
            let key = api_key(OPENAI_KEY_VAR)?;
            Ok(Box::new(OpenAiClient::new(key, model, timeout)))
        }
        other => Err(Error::Invalid(format!(
            "Invalid model: {other} (expected one of {})",
            MODEL_ALIASES.join(", ")
        ))),
    }
}

fn api_key(var: &str) -> Result<String> {
    match std::env::var(var) {
        Ok(key) if !key.trim().is_empty() => Ok(key),
        _ => Err(Error::Unavailable(format!("{var} environment variable not set"))),
    }
}

/// Agent with both connect and overall deadlines set to `timeout`.
pub(crate) fn agent(timeout: Duration) -> ureq::Agent {
    ureq::AgentBuilder::new().timeout_connect(timeout).timeout(timeout).build()
}

/// POST a JSON body and decode a JSON reply, mapping HTTP failures to
/// [`PromptError`].
pub(crate) fn post_json<B, T>(
    request: ureq::Request,
    body: &B,
) -> std::result::Result<T, PromptError>
where
    B: Serialize,
    T: DeserializeOwned,
{
    let response = request.send_json(body).map_err(|err| match err {
        ureq::Error::Status(429, _) => PromptError::RateLimited,
        ureq::Error::Status(status, resp) => {
            let body = resp.into_string().unwrap_or_default();
            PromptError::Status { status, body: body.trim().to_string() }
        }
        ureq::Error::Transport(transport) => PromptError::Transport(transport.to_string()),
    })?;
    response
        .into_json()
        .map_err(|e| PromptError::Response(format!("failed to decode response body: {e}")))
}

#[cfg(test)]
pub(crate) mod testing {
    //! One-shot HTTP server for exercising the clients offline.

    use std::io::{BufRead, BufReader, Read, Write};
    use std::net::TcpListener;
    use std::thread::{self, JoinHandle};

    /// Serve one response and hand back the raw request text.
    pub fn serve_once(status: &str, body: &str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
        let url = format!("http://{}", listener.local_addr().expect("addr"));
        let response = format!(
            "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );

        let handle = thread::spawn(move || {
            let (stream, _) = listener.accept().expect("accept");
            let mut reader = BufReader::new(stream);
            let mut request = String::new();
            let mut content_length = 0usize;
            loop {
                let mut line = String::new();
                reader.read_line(&mut line).expect("read header");
                if let Some(value) = line.to_ascii_lowercase().strip_prefix("content-length:") {
                    content_length = value.trim().parse().unwrap_or(0);
                }
                request.push_str(&line);
                if line == "\r\n" || line.is_empty() {
                    break;
                }
            }
            let mut body = vec![0u8; content_length];
            reader.read_exact(&mut body).expect("read body");
            request.push_str(&String::from_utf8_lossy(&body));

            let mut stream = reader.into_inner();
            stream.write_all(response.as_bytes()).expect("write response");
            request
        });
        (url, handle)
    }
}
