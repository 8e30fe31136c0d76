//! Data models for the completion call and the answer contract.
//!
//! This module groups two submodules:
//! - `chat`: the subset of the OpenAI Chat Completions request model this service sends upstream.
//! - `answer`: the single-field `{"answer": "..."}` payload and its fallback sentinels.
//!
//! The completion response is deliberately not modelled here: it is untrusted input and is
//! walked as raw JSON by `crate::extract`.

pub mod answer;
pub mod chat;

pub use answer::{Answer, ExtractedAnswer, Fallback};
pub use chat::{ChatCompletionRequest, ChatMessage, FunctionDef, Role, ToolChoice, ToolDefinition};
