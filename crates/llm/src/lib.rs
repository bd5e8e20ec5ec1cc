//! LLM backend and prompt assembly
//!
//! The runtime depends only on a one-shot request/response text API: a JSON
//! body `{model, messages, temperature, max_tokens}` answered with
//! `choices[0].message.content`. The backend trait keeps the HTTP client
//! swappable; tests use a scripted mock.

pub mod backend;
pub mod prompt;

pub use backend::{HttpLlmBackend, LlmBackend, LlmError, Message, MockLlmBackend, Role};
pub use prompt::{build_messages, PromptBuilder};
