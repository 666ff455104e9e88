use crate::config::AiConfig;
use crate::types::{InsightError, Result};
use async_trait::async_trait;
use backoff::backoff::Backoff;
use backoff::ExponentialBackoff;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;
use tracing::{debug, warn};

const MAX_RETRIES: u32 = 3;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);
const INITIAL_BACKOFF: Duration = Duration::from_secs(1);

/// Role-tagged message sent to the text-generation service.
#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    pub role: &'static str,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system",
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user",
            content: content.into(),
        }
    }
}

/// Generation parameters for one completion call.
#[derive(Debug, Clone, Copy)]
pub struct CompletionOptions {
    pub temperature: f32,
    pub max_tokens: u32,
    /// Hint the service to emit a structured (JSON) response.
    pub json_mode: bool,
}

impl Default for CompletionOptions {
    fn default() -> Self {
        Self {
            temperature: 0.3,
            max_tokens: 4096,
            json_mode: false,
        }
    }
}

/// Seam between the enrichment stages and the remote text-generation
/// service; tests provide scripted implementations.
#[async_trait]
pub trait ChatCompletion: Send + Sync {
    async fn complete(&self, messages: &[ChatMessage], options: &CompletionOptions)
        -> Result<String>;
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Client for an OpenAI-compatible chat completion endpoint with bounded
/// retries and increasing backoff. A timeout, a non-2xx status, and an empty
/// completion all count as failed attempts.
pub struct AiClient {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl AiClient {
    pub fn new(config: &AiConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_default();

        // Model names may arrive as "provider/model"; the endpoint wants the
        // bare model name.
        let model = config
            .model
            .rsplit('/')
            .next()
            .unwrap_or(&config.model)
            .to_string();

        Self {
            client,
            api_key: config.api_key.clone(),
            model,
            base_url: config.api_base.trim_end_matches('/').to_string(),
        }
    }

    async fn attempt(
        &self,
        messages: &[ChatMessage],
        options: &CompletionOptions,
    ) -> Result<String> {
        let mut body = json!({
            "model": self.model,
            "messages": messages,
            "temperature": options.temperature,
            "max_tokens": options.max_tokens,
        });
        if options.json_mode {
            body["response_format"] = json!({ "type": "json_object" });
        }

        let response = self
            .client
            .post(format!("{}/v1/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(InsightError::General(format!(
                "AI API error {status}: {detail}"
            )));
        }

        let parsed: ChatResponse = response.json().await?;
        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.is_empty())
            .ok_or(InsightError::EmptyCompletion)
    }
}

#[async_trait]
impl ChatCompletion for AiClient {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        options: &CompletionOptions,
    ) -> Result<String> {
        let mut backoff = ExponentialBackoff {
            initial_interval: INITIAL_BACKOFF,
            multiplier: 2.0,
            max_elapsed_time: None,
            ..Default::default()
        };

        let mut last_error = String::new();
        for attempt in 1..=MAX_RETRIES {
            match self.attempt(messages, options).await {
                Ok(content) => {
                    debug!("AI completion succeeded on attempt {}", attempt);
                    return Ok(content);
                }
                Err(e) => {
                    warn!("AI call attempt {}/{} failed: {}", attempt, MAX_RETRIES, e);
                    last_error = e.to_string();
                    if attempt < MAX_RETRIES {
                        if let Some(delay) = backoff.next_backoff() {
                            tokio::time::sleep(delay).await;
                        }
                    }
                }
            }
        }

        Err(InsightError::AiExhausted {
            attempts: MAX_RETRIES,
            last_error,
        })
    }
}

static CODE_BLOCK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)```(?:json)?\s*(.*?)```").unwrap());
static JSON_ARRAY: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)(\[.*\])").unwrap());
static JSON_OBJECT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)(\{.*\})").unwrap());
static FENCE_MARKER: Lazy<Regex> = Lazy::new(|| Regex::new(r"```(?:json)?\s*").unwrap());
static TRAILING_COMMA: Lazy<Regex> = Lazy::new(|| Regex::new(r",\s*([}\]])").unwrap());

/// Tolerant parser for structured model output. Tries, in order: a fenced
/// code block, the whole text, the first top-level array or object, and
/// finally a cleaned-up rendition with fence markers and trailing commas
/// removed. Fails only when every strategy fails.
pub fn parse_json_response<T: DeserializeOwned>(text: &str) -> Result<T> {
    if let Some(caps) = CODE_BLOCK.captures(text) {
        if let Ok(value) = serde_json::from_str(caps[1].trim()) {
            return Ok(value);
        }
    }

    if let Ok(value) = serde_json::from_str(text.trim()) {
        return Ok(value);
    }

    let embedded = JSON_ARRAY
        .captures(text)
        .or_else(|| JSON_OBJECT.captures(text));
    if let Some(caps) = embedded {
        if let Ok(value) = serde_json::from_str(&caps[1]) {
            return Ok(value);
        }
    }

    let cleaned = FENCE_MARKER.replace_all(text, "");
    let cleaned = TRAILING_COMMA.replace_all(&cleaned, "$1");
    serde_json::from_str(cleaned.trim())
        .map_err(|e| InsightError::JsonParse(format!("{e}: {}", cleaned.trim())))
}
