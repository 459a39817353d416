//! LLM client abstraction layer
//!
//! The analysis service is reached through the [`LLMClient`] trait so the pipeline can
//! run against a real provider ([`GenAIClient`]) or a scripted double
//! ([`MockLLMClient`]).

mod client;
mod genai;
mod mock;
mod selector;
mod types;

pub use ::genai::adapter::AdapterKind;
pub use client::LLMClient;
pub use genai::GenAIClient;
pub use mock::{MockLLMClient, MockResponse};
pub use selector::{select_llm_client, SelectedClient};
pub use types::{ChatMessage, LLMRequest, LLMResponse, MessageRole};
