//! LLM integration layer.
//!
//! - [`types`] -- Core data types (messages, requests, responses).
//! - [`client`] -- HTTP client for Anthropic and OpenAI-compatible APIs.
//!
//! The [`LanguageModel`] trait is the seam the rest of the workspace depends
//! on, so handlers and the classifier never see HTTP details.

pub mod client;
pub mod types;

use async_trait::async_trait;

use crate::error::Result;

pub use client::{LlmClient, LlmClientConfig, LlmProvider};
pub use types::{ChatRequest, ImageData, LlmResponse, Message, Role, Usage};

/// A text-in / text-out model with an optional embeddings capability.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Run a single non-streaming chat completion.
    async fn complete(&self, request: &ChatRequest) -> Result<LlmResponse>;

    /// Embed each input string, returning one vector per input in order.
    async fn embed(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>>;
}

#[async_trait]
impl LanguageModel for LlmClient {
    async fn complete(&self, request: &ChatRequest) -> Result<LlmResponse> {
        self.chat(request).await
    }

    async fn embed(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>> {
        self.embeddings(inputs).await
    }
}
