//! Prompt and answer values exchanged with the answer service

use std::fmt;

/// Answer shown and spoken when the answer service can't be reached
pub const FALLBACK_ANSWER: &str =
    "Sorry, I couldn't get an answer. Please check the console for details.";

/// A user's question, guaranteed non-empty after trimming
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt(String);

impl Prompt {
    /// Build a prompt from raw input (typed text or a transcript)
    ///
    /// Returns `None` when the input is empty or whitespace-only.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }
        Some(Self(trimmed.to_string()))
    }

    /// Prompt text
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Prompt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Outcome of one request to the answer service
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Answer {
    /// Text returned by the service, passed through unvalidated
    Reply(String),
    /// The request failed; carries the fixed fallback text
    Fallback,
}

impl Answer {
    /// Text to display and speak
    #[must_use]
    pub fn text(&self) -> &str {
        match self {
            Self::Reply(text) => text,
            Self::Fallback => FALLBACK_ANSWER,
        }
    }

    /// Whether this answer came from a failed request
    #[must_use]
    pub const fn is_fallback(&self) -> bool {
        matches!(self, Self::Fallback)
    }
}
