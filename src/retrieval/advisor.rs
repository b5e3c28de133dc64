//! Retrieval-augmented question answering against the local model

use super::retriever::{Retriever, SearchHit};
use crate::kb::KnowledgeBaseError;
use crate::llm::{BackendError, ChatMessage, LLMClient, LLMRequest};
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

pub const ANSWER_TEMPERATURE: f32 = 0.2;

const SYSTEM_PROMPT: &str = "You are a local financial analyst working on a household ledger. \
Answer only from the numbered context blocks supplied with each question. \
Cite the blocks you used by their number, for example [2]. \
If the context does not contain the answer, say that the available context is insufficient \
instead of guessing. Keep figures exactly as written in the context.";

#[derive(Debug, Error)]
pub enum AdvisorError {
    #[error("Retrieval failed: {0}")]
    Retrieval(#[from] KnowledgeBaseError),

    #[error("Model request failed: {0}")]
    Llm(#[from] BackendError),
}

/// A model answer together with the chunks it was grounded on
#[derive(Debug, Clone, Serialize)]
pub struct Answer {
    pub question: String,
    pub text: String,
    pub sources: Vec<SearchHit>,
    pub model: String,
    pub response_time_ms: u64,
}

/// User prompt: numbered context blocks followed by the question
pub fn build_user_prompt(question: &str, hits: &[SearchHit]) -> String {
    let mut prompt = String::from("Context:\n\n");
    if hits.is_empty() {
        prompt.push_str("(no context retrieved)\n\n");
    }
    for (i, hit) in hits.iter().enumerate() {
        prompt.push_str(&format!("[{}] {}\n{}\n\n", i + 1, hit.citation(), hit.content));
    }
    prompt.push_str(&format!("Question: {}", question.trim()));
    prompt
}

pub struct Advisor {
    retriever: Retriever,
    llm: Arc<dyn LLMClient>,
}

impl Advisor {
    pub fn new(retriever: Retriever, llm: Arc<dyn LLMClient>) -> Self {
        Self { retriever, llm }
    }

    pub fn retriever(&self) -> &Retriever {
        &self.retriever
    }

    /// Retrieves `k` chunks for `question` and asks the model
    pub async fn ask(&self, question: &str, k: usize) -> Result<Answer, AdvisorError> {
        let hits = self.retriever.search(question, k)?;
        debug!("Retrieved {} chunks for question", hits.len());

        let request = LLMRequest::new(vec![
            ChatMessage::system(SYSTEM_PROMPT),
            ChatMessage::user(build_user_prompt(question, &hits)),
        ])
        .with_temperature(ANSWER_TEMPERATURE);

        let response = self.llm.chat(request).await?;
        let model = self
            .llm
            .model_info()
            .unwrap_or_else(|| self.llm.name().to_string());
        info!(
            "Answered with {} in {}ms",
            model,
            response.response_time.as_millis()
        );

        Ok(Answer {
            question: question.trim().to_string(),
            text: response.content,
            sources: hits,
            model,
            response_time_ms: response.response_time.as_millis() as u64,
        })
    }
}
