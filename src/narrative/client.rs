//! Messages API client with extended thinking.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error, info};

use super::{Generation, NarrativeGenerator, TokenUsage};
use crate::config::ModelConfig;
use crate::error::PipelineError;

const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Messages API request.
#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    thinking: ThinkingConfig,
    messages: Vec<Message<'a>>,
}

#[derive(Debug, Serialize)]
struct ThinkingConfig {
    #[serde(rename = "type")]
    kind: &'static str,
    budget_tokens: u32,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

/// Messages API response.
#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    model: Option<String>,
    content: Vec<ContentBlock>,
    usage: Usage,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    thinking: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    input_tokens: u64,
    output_tokens: u64,
}

/// [`NarrativeGenerator`] backed by the Anthropic Messages API.
pub struct AnthropicClient {
    config: ModelConfig,
    api_key: String,
    http_client: reqwest::Client,
}

impl AnthropicClient {
    /// Build a client, reading the API key from the configured environment
    /// variable.
    pub fn from_env(config: &ModelConfig) -> Result<Self, PipelineError> {
        let api_key = std::env::var(&config.api_key_env).ok();
        Self::new(config, api_key)
    }

    /// Build a client. Fails before any request if the key is missing or the
    /// token limits are inconsistent.
    pub fn new(config: &ModelConfig, api_key: Option<String>) -> Result<Self, PipelineError> {
        let Some(api_key) = api_key.filter(|k| !k.trim().is_empty()) else {
            let msg = format!("{} environment variable not set", config.api_key_env);
            error!("{}", msg);
            return Err(PipelineError::ServiceConfiguration(msg));
        };

        if config.thinking_budget >= config.max_tokens {
            return Err(PipelineError::ServiceConfiguration(format!(
                "thinking budget ({}) must be below max_tokens ({})",
                config.thinking_budget, config.max_tokens
            )));
        }

        let mut builder = reqwest::Client::builder();
        if let Some(secs) = config.timeout_seconds {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let http_client = builder
            .build()
            .map_err(|e| PipelineError::ServiceConfiguration(e.to_string()))?;

        Ok(Self {
            config: config.clone(),
            api_key,
            http_client,
        })
    }

    fn request_body<'a>(&'a self, prompt: &'a str) -> MessagesRequest<'a> {
        MessagesRequest {
            model: &self.config.name,
            max_tokens: self.config.max_tokens,
            thinking: ThinkingConfig {
                kind: "enabled",
                budget_tokens: self.config.thinking_budget,
            },
            messages: vec![Message {
                role: "user",
                content: prompt,
            }],
        }
    }
}

/// Split response blocks into the narrative text and the thinking trace.
fn collect_blocks(blocks: &[ContentBlock]) -> (String, Option<String>) {
    let mut text = String::new();
    let mut thinking = String::new();

    for block in blocks {
        match block.kind.as_str() {
            "text" => text.push_str(block.text.as_deref().unwrap_or_default()),
            "thinking" => thinking.push_str(block.thinking.as_deref().unwrap_or_default()),
            other => debug!("Ignoring {} content block", other),
        }
    }

    let thinking = (!thinking.is_empty()).then_some(thinking);
    (text, thinking)
}

impl NarrativeGenerator for AnthropicClient {
    async fn generate(&self, prompt: &str) -> Result<Generation, PipelineError> {
        info!(
            "Using model {} with thinking budget {}",
            self.config.name, self.config.thinking_budget
        );

        let response = self
            .http_client
            .post(&self.config.api_url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&self.request_body(prompt))
            .send()
            .await
            .map_err(|e| {
                let msg = if e.is_timeout() {
                    "request timed out".to_string()
                } else if e.is_connect() {
                    format!("cannot connect to {}", self.config.api_url)
                } else {
                    format!("failed to send request: {}", e)
                };
                error!("Error calling narrative API: {}", msg);
                PipelineError::Generation(msg)
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!("Narrative API error {}: {}", status, body);
            return Err(PipelineError::Generation(format!(
                "API error {}: {}",
                status, body
            )));
        }

        let parsed: MessagesResponse = response.json().await.map_err(|e| {
            error!("Failed to parse narrative API response: {}", e);
            PipelineError::Generation(format!("unreadable response: {}", e))
        })?;

        let usage = TokenUsage {
            prompt_tokens: parsed.usage.input_tokens,
            completion_tokens: parsed.usage.output_tokens,
        };
        info!(
            "Token usage - Prompt: {}, Completion: {}, Total: {}",
            usage.prompt_tokens,
            usage.completion_tokens,
            usage.total()
        );

        let (text, thinking) = collect_blocks(&parsed.content);
        match &thinking {
            Some(trace) => info!("Thinking trace received ({} chars)", trace.len()),
            None => info!("No thinking output received"),
        }

        Ok(Generation {
            model: parsed.model.unwrap_or_else(|| self.config.name.clone()),
            text,
            thinking,
            usage,
        })
    }
}
