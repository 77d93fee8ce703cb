//! LLM provider clients
//!
//! [`LLMClient`] is the seam between the answer synthesizer and a concrete
//! backend. [`Provider`] selects and builds one at startup.

/// Core LLM client trait, sampling parameters and provider selection.
pub mod client;
pub mod ollama;
pub mod openai;

pub use client::{LLMClient, ModelParams, Provider};
