//! Agent-layer errors

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AgentError {
    /// The utterance was too ambiguous to act on
    #[error("intent confidence too low")]
    LowConfidence,

    #[error("llm: {0}")]
    Llm(#[from] blitsum_llm::LlmError),

    #[error("page: {0}")]
    Page(#[from] blitsum_page::PageError),
}
