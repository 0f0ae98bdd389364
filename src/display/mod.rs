//! Display surface
//!
//! Two read-only regions (question echo and answer) plus the state of the
//! input controls.

mod terminal;

pub use terminal::TerminalDisplay;

use crate::controller::Controls;

/// Prefix of the question region
pub const QUESTION_PREFIX: &str = "You: ";

/// Prefix of the answer region
pub const ANSWER_PREFIX: &str = "Gemini: ";

/// Shown when a question is typed while the previous one is unanswered
pub const BUSY_NOTICE: &str = "Still thinking about the last question, please wait.";

/// A surface that shows the latest exchange and the input controls
pub trait Display {
    /// Show `question` and `answer`, replacing whatever was shown before
    fn render(&mut self, question: &str, answer: &str);

    /// Reflect the current enablement and labels of the input controls
    fn set_controls(&mut self, controls: &Controls);

    /// Show a transient message outside the display regions
    fn notice(&mut self, message: &str) {
        tracing::info!(message, "notice");
    }
}

impl<D: Display + ?Sized> Display for Box<D> {
    fn render(&mut self, question: &str, answer: &str) {
        (**self).render(question, answer);
    }

    fn set_controls(&mut self, controls: &Controls) {
        (**self).set_controls(controls);
    }

    fn notice(&mut self, message: &str) {
        (**self).notice(message);
    }
}

/// Content of the display regions
///
/// Regions start hidden and become visible on the first render.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Panel {
    question: Option<String>,
    answer: Option<String>,
}

impl Panel {
    /// Create an empty panel with both regions hidden
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set both regions
    ///
    /// Returns true if the visible content changed.
    pub fn render(&mut self, question: &str, answer: &str) -> bool {
        let question = Some(format!("{QUESTION_PREFIX}{question}"));
        let answer = Some(format!("{ANSWER_PREFIX}{answer}"));

        if self.question == question && self.answer == answer {
            return false;
        }

        self.question = question;
        self.answer = answer;
        true
    }

    /// Question region text, if visible
    #[must_use]
    pub fn question(&self) -> Option<&str> {
        self.question.as_deref()
    }

    /// Answer region text, if visible
    #[must_use]
    pub fn answer(&self) -> Option<&str> {
        self.answer.as_deref()
    }
}
