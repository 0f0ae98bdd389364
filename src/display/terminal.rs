//! Line-oriented terminal rendering

use std::io::Write;

use super::{Display, Panel};
use crate::controller::Controls;

/// Draws the panel and control status to a writer (usually stdout)
///
/// Output is only written when something visible changed.
pub struct TerminalDisplay<W: Write> {
    out: W,
    panel: Panel,
    controls: Option<Controls>,
    show_controls: bool,
}

impl<W: Write> TerminalDisplay<W> {
    /// Create a display writing to `out`
    pub const fn new(out: W) -> Self {
        Self {
            out,
            panel: Panel {
                question: None,
                answer: None,
            },
            controls: None,
            show_controls: true,
        }
    }

    /// Don't print the control status line (one-shot questions)
    #[must_use]
    pub const fn without_controls(mut self) -> Self {
        self.show_controls = false;
        self
    }

    /// Current panel content
    #[must_use]
    pub const fn panel(&self) -> &Panel {
        &self.panel
    }

    /// Consume the display, returning the writer
    pub fn into_inner(self) -> W {
        self.out
    }

    fn write_lines(&mut self, lines: &[&str]) {
        let result = lines
            .iter()
            .try_for_each(|line| writeln!(self.out, "{line}"))
            .and_then(|()| self.out.flush());

        if let Err(e) = result {
            tracing::warn!(error = %e, "failed to write to terminal");
        }
    }
}

impl<W: Write> Display for TerminalDisplay<W> {
    fn render(&mut self, question: &str, answer: &str) {
        if !self.panel.render(question, answer) {
            return;
        }

        let question = self.panel.question().unwrap_or_default().to_string();
        let answer = self.panel.answer().unwrap_or_default().to_string();
        self.write_lines(&[question.as_str(), answer.as_str()]);
    }

    fn set_controls(&mut self, controls: &Controls) {
        if self.controls.as_ref() == Some(controls) {
            return;
        }
        self.controls = Some(*controls);
        if !self.show_controls {
            return;
        }

        let status = status_line(controls);
        self.write_lines(&[status.as_str()]);
    }

    fn notice(&mut self, message: &str) {
        let line = format!("({message})");
        self.write_lines(&[line.as_str()]);
    }
}

/// Render control state as a one-line status, e.g. `[Ask Gemini] text: on`
fn status_line(controls: &Controls) -> String {
    let voice = if controls.voice_enabled {
        format!("[{}] /listen", controls.voice_label)
    } else {
        format!("[{}]", controls.voice_label)
    };
    let text = if controls.text_enabled && controls.send_enabled {
        "on"
    } else {
        "off"
    };
    format!("{voice} text: {text}")
}
