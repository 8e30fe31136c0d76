#![forbid(unsafe_code)]
#![doc = r#"
Question2Answer

Answer a natural-language question with a single `{"answer": "..."}` payload, either by
reading it from an uploaded CSV or by forwarding the question to a chat completions endpoint
with a forced `get_answer` tool call.

Crate highlights
- Library: `prompt::build` assembles the completion request, `extract::extract_answer` walks
  the untrusted response, `client::CompletionClient::ask` ties both to one HTTP call.
- HTTP server (in `server`): `POST /api/` (multipart `question` + optional `file`) and `/status`.
- Every failure degrades to a fixed `"Error: ..."` answer instead of an error status.

Modules
- `models`: Chat request types and the answer contract.
- `prompt`: System prompt, tool schema and request builder.
- `extract`: Answer extraction with fallback sentinels.
- `client`: Completion endpoint client.
- `upload`: CSV/ZIP upload resolution with per-request scratch directories.
- `server`: Axum router/handlers (the binary uses this).
- `config`, `util`: Environment configuration, tracing, CORS and error helpers.
"#]

pub mod client;
pub mod config;
pub mod extract;
pub mod models;
pub mod prompt;
pub mod server;
pub mod upload;
pub mod util;

pub use crate::client::{CompletionClient, CompletionError};
pub use crate::config::Config;
pub use crate::extract::extract_answer;
pub use crate::models::{Answer, ExtractedAnswer, Fallback};
pub use crate::prompt::build;
pub use crate::upload::{UploadResolver, UploadedFile};
