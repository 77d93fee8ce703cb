//! Grounded answer generation.
//!
//! Retrieved chunks are packed into a question-answering prompt in rank order
//! until the context budget is spent, then the LLM is asked to answer from that
//! context only.

use crate::llm::{LLMClient, ModelParams};
use crate::rag::chunker::count_tokens;
use crate::types::{AppError, GenerationFailureReason, Result};
use playground_vector::{RetrievalResult, ScoredChunk};
use std::sync::Arc;
use std::time::Duration;

pub const DEFAULT_MAX_CONTEXT_TOKENS: usize = 3000;
pub const DEFAULT_GENERATION_TIMEOUT: Duration = Duration::from_secs(60);

/// Render the question-answering prompt for `chunks` (in the given order).
///
/// Chunk text and query are inserted verbatim; braces in either are not
/// treated as placeholders.
pub fn build_prompt(chunks: &[ScoredChunk], query: &str) -> String {
    let context = chunks
        .iter()
        .map(|hit| hit.chunk.text.as_str())
        .collect::<Vec<_>>()
        .join("\n\n");

    format!(
        "Context information is below.\n\
         ---------------------\n\
         {context}\n\
         ---------------------\n\
         Given the context information and not prior knowledge, answer the query.\n\
         Query: {query}\n\
         Answer: "
    )
}

/// Generated text plus the chunks it was grounded on.
#[derive(Debug, Clone)]
pub struct Answer {
    pub text: String,
    pub grounding: Vec<ScoredChunk>,
}

pub struct AnswerSynthesizer {
    llm: Arc<dyn LLMClient>,
    max_context_tokens: usize,
    timeout: Duration,
    system_prompt: Option<String>,
}

impl AnswerSynthesizer {
    pub fn new(llm: Arc<dyn LLMClient>) -> Self {
        Self {
            llm,
            max_context_tokens: DEFAULT_MAX_CONTEXT_TOKENS,
            timeout: DEFAULT_GENERATION_TIMEOUT,
            system_prompt: None,
        }
    }

    pub fn with_max_context_tokens(mut self, max_context_tokens: usize) -> Self {
        self.max_context_tokens = max_context_tokens;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_system_prompt(mut self, system_prompt: Option<String>) -> Self {
        self.system_prompt = system_prompt;
        self
    }

    pub fn model_name(&self) -> &str {
        self.llm.model_name()
    }

    pub fn validate_params(&self, params: &ModelParams) -> Result<()> {
        params.validate(self.llm.temperature_range())
    }

    /// Longest rank-order prefix of `retrieval` whose total token count fits
    /// the context budget. Lowest-ranked chunks are dropped first.
    pub fn select_grounding(&self, retrieval: &RetrievalResult) -> Vec<ScoredChunk> {
        let mut used = 0;
        let mut selected = Vec::with_capacity(retrieval.len());

        for hit in retrieval.iter() {
            let tokens = count_tokens(&hit.chunk.text);
            if used + tokens > self.max_context_tokens {
                break;
            }
            used += tokens;
            selected.push(hit.clone());
        }

        selected
    }

    /// Answer `query` from `retrieval`.
    ///
    /// An empty retrieval still produces a call; the model sees an empty
    /// context.
    #[tracing::instrument(skip_all, fields(model = self.llm.model_name(), hits = retrieval.len()))]
    pub async fn answer(
        &self,
        retrieval: &RetrievalResult,
        query: &str,
        params: &ModelParams,
    ) -> Result<Answer> {
        self.validate_params(params)?;

        let grounding = self.select_grounding(retrieval);
        if grounding.len() < retrieval.len() {
            tracing::debug!(
                kept = grounding.len(),
                dropped = retrieval.len() - grounding.len(),
                max_context_tokens = self.max_context_tokens,
                "Context budget exceeded, dropping lowest-ranked chunks"
            );
        }

        let prompt = build_prompt(&grounding, query);
        let generation =
            self.llm
                .generate_with_system(self.system_prompt.as_deref(), &prompt, params);

        let text = match tokio::time::timeout(self.timeout, generation).await {
            Ok(result) => result?,
            Err(_) => {
                return Err(AppError::generation(
                    GenerationFailureReason::Timeout,
                    format!("no response within {:?}", self.timeout),
                ))
            }
        };

        Ok(Answer { text, grounding })
    }
}
