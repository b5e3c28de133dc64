//! Search and question answering over the knowledge-base index

mod advisor;
mod retriever;

pub use advisor::{build_user_prompt, Advisor, AdvisorError, Answer, ANSWER_TEMPERATURE};
pub use retriever::{Retriever, SearchHit};
