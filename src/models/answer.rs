use serde::{Deserialize, Serialize};
use std::fmt;

/// The only payload this service ever returns: `{"answer": "..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Answer {
    pub answer: String,
}

impl Answer {
    pub fn new(answer: impl Into<String>) -> Self {
        Self {
            answer: answer.into(),
        }
    }
}

/// Fixed placeholder answers used instead of failing the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fallback {
    /// `choices` or the tool-call structure beneath it is missing.
    InvalidResponseFormat,
    /// Network failure, non-2xx status, or an unreadable response body.
    RequestFailed,
    /// The tool-call `arguments` string is not valid JSON.
    InvalidJson,
}

impl Fallback {
    pub fn sentinel(self) -> &'static str {
        match self {
            Fallback::InvalidResponseFormat => "Error: Invalid response format.",
            Fallback::RequestFailed => "Error: Unable to process the request.",
            Fallback::InvalidJson => "Error: Invalid JSON response.",
        }
    }
}

impl fmt::Display for Fallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.sentinel())
    }
}

/// Result of walking a completion response: a model answer or a typed fallback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractedAnswer {
    Answer(String),
    Fallback(Fallback),
}

impl ExtractedAnswer {
    pub fn is_fallback(&self) -> bool {
        matches!(self, ExtractedAnswer::Fallback(_))
    }
}

impl From<Fallback> for ExtractedAnswer {
    fn from(f: Fallback) -> Self {
        ExtractedAnswer::Fallback(f)
    }
}

impl From<ExtractedAnswer> for Answer {
    fn from(e: ExtractedAnswer) -> Self {
        match e {
            ExtractedAnswer::Answer(s) => Answer::new(s),
            ExtractedAnswer::Fallback(f) => Answer::new(f.sentinel()),
        }
    }
}

impl From<Fallback> for Answer {
    fn from(f: Fallback) -> Self {
        Answer::new(f.sentinel())
    }
}
