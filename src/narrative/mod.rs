//! Narrative generation through an external language model.
//!
//! The pipelines only need "prompt in, prose out"; [`NarrativeGenerator`] is
//! that seam, and [`AnthropicClient`] is the production implementation.

pub mod client;

pub use client::AnthropicClient;

use serde::Serialize;

use crate::error::PipelineError;

/// Token counters reported by the service.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TokenUsage {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
}

impl TokenUsage {
    pub fn total(&self) -> u64 {
        self.prompt_tokens + self.completion_tokens
    }
}

/// One completed generation.
#[derive(Debug, Clone, PartialEq)]
pub struct Generation {
    pub model: String,
    /// The narrative itself.
    pub text: String,
    /// Extended-thinking trace, when the model returned one.
    pub thinking: Option<String>,
    pub usage: TokenUsage,
}

/// A text-generation service.
#[allow(async_fn_in_trait)]
pub trait NarrativeGenerator {
    async fn generate(&self, prompt: &str) -> Result<Generation, PipelineError>;
}
