use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::Value;

use crate::config::SummarizerConfig;

#[derive(Debug, Clone, thiserror::Error)]
#[error("{message}")]
pub struct SummarizationError {
    /// HTTP status reported by the completion service, if it answered at all
    pub status: Option<u16>,
    pub message: String,
}

impl SummarizationError {
    fn transport(e: &reqwest::Error) -> Self {
        Self {
            status: e.status().map(|s| s.as_u16()),
            message: e.to_string(),
        }
    }
}

/// A chat completion backend taking a single user prompt.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Returns `Ok(None)` when the reply carries no usable text.
    async fn complete(&self, prompt: &str) -> Result<Option<String>, SummarizationError>;
}

/// Message content as sent by OpenAI-compatible APIs: either a plain string
/// or a list of typed content parts.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
    Other(Value),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ContentPart {
    #[serde(default)]
    pub text: Option<Value>,
}

impl MessageContent {
    /// The plain string, or the first part whose `text` is a string.
    /// Empty text counts as no text.
    pub fn into_text(self) -> Option<String> {
        let text = match self {
            Self::Text(text) => Some(text),
            Self::Parts(parts) => parts.into_iter().find_map(|part| match part.text {
                Some(Value::String(text)) => Some(text),
                _ => None,
            }),
            Self::Other(_) => None,
        };
        text.filter(|text| !text.is_empty())
    }
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    #[serde(default)]
    message: Option<ChatMessage>,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    #[serde(default)]
    content: Option<MessageContent>,
}

pub struct OpenAiClient {
    client: reqwest::Client,
    api_base: String,
    api_key: String,
    model: String,
}

impl OpenAiClient {
    pub fn new(config: &SummarizerConfig) -> Result<Self, reqwest::Error> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone().unwrap_or_default(),
            model: config.model.clone(),
        })
    }

    fn completions_url(&self) -> String {
        format!("{}/v1/chat/completions", self.api_base)
    }
}

// Prefers the `error.message` field OpenAI puts in error bodies.
fn upstream_message(status: StatusCode, body: &[u8]) -> String {
    if let Ok(value) = serde_json::from_slice::<Value>(body) {
        if let Some(message) = value
            .get("error")
            .and_then(|e| e.get("message"))
            .and_then(Value::as_str)
        {
            return message.to_string();
        }
    }

    let text = String::from_utf8_lossy(body);
    let text = text.trim();
    if text.is_empty() {
        status.to_string()
    } else {
        text.to_string()
    }
}

#[async_trait]
impl CompletionClient for OpenAiClient {
    async fn complete(&self, prompt: &str) -> Result<Option<String>, SummarizationError> {
        let request = serde_json::json!({
            "model": self.model,
            "messages": [{ "role": "user", "content": prompt }],
        });

        let url = self.completions_url();
        tracing::debug!("Requesting completion from {} ({} chars)", url, prompt.len());

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Completion request to {} failed: {}", url, e);
                SummarizationError::transport(&e)
            })?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| SummarizationError::transport(&e))?;

        if !status.is_success() {
            let message = upstream_message(status, &body);
            tracing::error!("Completion service returned {}: {}", status, message);
            return Err(SummarizationError {
                status: Some(status.as_u16()),
                message,
            });
        }

        let parsed: ChatCompletionResponse =
            serde_json::from_slice(&body).map_err(|e| SummarizationError {
                status: None,
                message: format!("Invalid completion response: {e}"),
            })?;

        Ok(parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message)
            .and_then(|message| message.content)
            .and_then(MessageContent::into_text))
    }
}
