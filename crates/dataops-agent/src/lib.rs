//! Language-model integration for DataOps.
//!
//! Every component that needs a model (the intent classifier, the OCR-backed
//! credit card handler, the embedding-backed comment similarity handler)
//! talks to it through the [`LanguageModel`] trait.  [`LlmClient`] is the
//! production implementation backed by HTTP; tests substitute their own.
//!
//! ## Modules
//!
//! - [`llm`] -- LLM client, wire types and the [`LanguageModel`] seam.
//! - [`error`] -- Agent error types.

pub mod error;
pub mod llm;

pub use error::{AgentError, Result};
pub use llm::{
    ChatRequest, ImageData, LanguageModel, LlmClient, LlmClientConfig, LlmProvider, LlmResponse,
    Message, Role, Usage,
};
