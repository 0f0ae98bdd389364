//! Input mode arbitration
//!
//! Decides which input affordances are usable and when a prompt may be sent.
//! The arbiter is the only owner of input state: control enablement is derived
//! from it, never the other way round.

use crate::prompt::Prompt;

/// Voice control label while idle
pub const LABEL_IDLE: &str = "Ask Gemini";

/// Voice control label while a transcription is running
pub const LABEL_LISTENING: &str = "Listening...";

/// Voice control label while an answer is pending
pub const LABEL_THINKING: &str = "Thinking...";

/// Current input mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    /// Ready for voice or text input
    Idle,
    /// Speech recognition is running
    Listening,
    /// A prompt has been sent; waiting for the answer
    AwaitingAnswer,
}

/// Enablement and labels of the input affordances
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Controls {
    /// Voice activation control is interactive
    pub voice_enabled: bool,
    /// Voice activation control label
    pub voice_label: &'static str,
    /// Text field is interactive
    pub text_enabled: bool,
    /// Submit control is interactive
    pub send_enabled: bool,
}

impl Controls {
    /// Whether every affordance is disabled
    #[must_use]
    pub const fn all_disabled(&self) -> bool {
        !self.voice_enabled && !self.text_enabled && !self.send_enabled
    }
}

/// Identifies one request; an answer is accepted only for the live ticket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ticket(u64);

/// Identifies one recognition activation; its events count only while it is live
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Session(u64);

/// Input mode state machine with a single-slot request guard
#[derive(Debug)]
pub struct Arbiter {
    mode: InputMode,
    in_flight: Option<Ticket>,
    next_ticket: u64,
    listening: Option<Session>,
    next_session: u64,
    voice_available: bool,
}

impl Arbiter {
    /// Create an idle arbiter
    ///
    /// With `voice_available` false the voice control stays disabled for the
    /// lifetime of the arbiter.
    #[must_use]
    pub const fn new(voice_available: bool) -> Self {
        Self {
            mode: InputMode::Idle,
            in_flight: None,
            next_ticket: 0,
            listening: None,
            next_session: 0,
            voice_available,
        }
    }

    /// Current mode
    #[must_use]
    pub const fn mode(&self) -> InputMode {
        self.mode
    }

    /// Ticket of the request in flight, if any
    #[must_use]
    pub const fn in_flight(&self) -> Option<Ticket> {
        self.in_flight
    }

    /// Recognition activation currently listening, if any
    #[must_use]
    pub const fn listening(&self) -> Option<Session> {
        self.listening
    }

    /// Whether speech recognition can be used this session
    #[must_use]
    pub const fn voice_available(&self) -> bool {
        self.voice_available
    }

    /// Affordance state for the current mode
    #[must_use]
    pub const fn controls(&self) -> Controls {
        match self.mode {
            InputMode::Idle => Controls {
                voice_enabled: self.voice_available,
                voice_label: LABEL_IDLE,
                text_enabled: true,
                send_enabled: true,
            },
            // Only the voice control is locked while listening
            InputMode::Listening => Controls {
                voice_enabled: false,
                voice_label: LABEL_LISTENING,
                text_enabled: true,
                send_enabled: true,
            },
            InputMode::AwaitingAnswer => Controls {
                voice_enabled: false,
                voice_label: LABEL_THINKING,
                text_enabled: false,
                send_enabled: false,
            },
        }
    }

    /// Voice activation requested
    ///
    /// Returns the new activation when the transcription source should be
    /// started.
    pub fn request_voice(&mut self) -> Option<Session> {
        if !self.voice_available {
            tracing::debug!("voice requested but speech recognition is unavailable");
            return None;
        }
        if self.mode != InputMode::Idle {
            tracing::debug!(mode = ?self.mode, "voice requested while busy, ignoring");
            return None;
        }
        let session = Session(self.next_session);
        self.next_session += 1;
        self.listening = Some(session);
        self.mode = InputMode::Listening;
        Some(session)
    }

    /// Text form submitted
    ///
    /// Blank input never produces a request. Accepted while idle, and while
    /// listening since the text field stays interactive then.
    pub fn submit_text(&mut self, raw: &str) -> Option<(Ticket, Prompt)> {
        if self.mode == InputMode::AwaitingAnswer {
            tracing::info!("still waiting for the previous answer, ignoring input");
            return None;
        }
        let prompt = Prompt::parse(raw)?;
        self.begin(prompt)
    }

    /// Transcription of `session` produced a result
    pub fn on_transcript(
        &mut self,
        session: Session,
        transcript: &str,
    ) -> Option<(Ticket, Prompt)> {
        if !self.is_live(session) {
            tracing::debug!(?session, mode = ?self.mode, "late transcript, ignoring");
            return None;
        }
        let Some(prompt) = Prompt::parse(transcript) else {
            tracing::debug!("blank transcript, returning to idle");
            self.leave_listening(session);
            return None;
        };
        self.begin(prompt)
    }

    /// Transcription of `session` failed
    ///
    /// Returns true if the mode changed.
    pub fn on_recognition_error(&mut self, session: Session) -> bool {
        self.leave_listening(session)
    }

    /// Transcription `session` ended
    ///
    /// Returns true if the mode changed. Has no effect unless `session` is
    /// still the one listening.
    pub fn on_recognition_end(&mut self, session: Session) -> bool {
        self.leave_listening(session)
    }

    /// The request identified by `ticket` completed
    ///
    /// Returns false for a stale or unknown ticket, leaving state untouched.
    pub fn complete(&mut self, ticket: Ticket) -> bool {
        if self.in_flight != Some(ticket) {
            tracing::warn!(?ticket, live = ?self.in_flight, "answer for unknown request, ignoring");
            return false;
        }
        self.in_flight = None;
        self.mode = InputMode::Idle;
        true
    }

    fn begin(&mut self, prompt: Prompt) -> Option<(Ticket, Prompt)> {
        // Claim the slot before touching the mode
        if self.in_flight.is_some() {
            tracing::debug!("request already in flight, ignoring");
            return None;
        }
        let ticket = Ticket(self.next_ticket);
        self.next_ticket += 1;
        self.in_flight = Some(ticket);
        self.listening = None;
        self.mode = InputMode::AwaitingAnswer;
        Some((ticket, prompt))
    }

    fn is_live(&self, session: Session) -> bool {
        self.mode == InputMode::Listening && self.listening == Some(session)
    }

    fn leave_listening(&mut self, session: Session) -> bool {
        if !self.is_live(session) {
            return false;
        }
        self.listening = None;
        self.mode = InputMode::Idle;
        true
    }
}
