//! Input/output controller
//!
//! Wires the transcription source, the answer dispatcher, the synthesis sink
//! and the display together. Events are handled one at a time from a single
//! channel; the only suspension point is the answer request, which runs as a
//! task and reports back through the same channel.

mod arbiter;

pub use arbiter::{
    Arbiter, Controls, InputMode, LABEL_IDLE, LABEL_LISTENING, LABEL_THINKING, Session, Ticket,
};

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::dispatch::Dispatcher;
use crate::display::{BUSY_NOTICE, Display};
use crate::prompt::{Answer, Prompt};
use crate::voice::{RecognitionEvent, Synthesizer, Transcriber, Utterance};

/// Something the controller reacts to
#[derive(Debug, Clone)]
pub enum Event {
    /// User activated the voice control
    VoiceRequested,
    /// User submitted the text form (raw, untrimmed content)
    TextSubmitted(String),
    /// Notification from the transcription source
    Recognition {
        /// Activation the notification belongs to
        session: Session,
        /// What happened
        event: RecognitionEvent,
    },
    /// The dispatcher finished a request
    Answered {
        /// Request this answer belongs to
        ticket: Ticket,
        /// The question that was asked
        prompt: Prompt,
        /// Reply or fallback
        answer: Answer,
    },
    /// End the session
    Quit,
}

/// A prompt cleared for sending
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    /// Slot ticket for this request
    pub ticket: Ticket,
    /// Question to send
    pub prompt: Prompt,
}

/// What the event loop should do after handling an event
#[derive(Debug, PartialEq, Eq)]
pub enum Flow {
    /// Keep going
    Continue,
    /// Send this request to the dispatcher
    Dispatch(Request),
    /// Stop the loop
    Quit,
}

/// The input/output controller
pub struct Controller<T, S, D, V> {
    arbiter: Arbiter,
    transcriber: T,
    synthesizer: S,
    dispatcher: Arc<D>,
    display: V,
    events: mpsc::UnboundedSender<Event>,
}

impl<T, S, D, V> Controller<T, S, D, V>
where
    T: Transcriber,
    S: Synthesizer,
    D: Dispatcher + 'static,
    V: Display,
{
    /// Create a controller
    ///
    /// `events` is the sending half of the channel the controller is run on;
    /// finished requests are posted there. The display immediately receives
    /// the initial control state.
    pub fn new(
        transcriber: T,
        synthesizer: S,
        dispatcher: D,
        mut display: V,
        events: mpsc::UnboundedSender<Event>,
        voice_available: bool,
    ) -> Self {
        let arbiter = Arbiter::new(voice_available);
        display.set_controls(&arbiter.controls());

        Self {
            arbiter,
            transcriber,
            synthesizer,
            dispatcher: Arc::new(dispatcher),
            display,
            events,
        }
    }

    /// Current input mode
    #[must_use]
    pub const fn mode(&self) -> InputMode {
        self.arbiter.mode()
    }

    /// Current control state
    #[must_use]
    pub const fn controls(&self) -> Controls {
        self.arbiter.controls()
    }

    /// Recognition activation currently listening, if any
    #[must_use]
    pub const fn listening(&self) -> Option<Session> {
        self.arbiter.listening()
    }

    /// The display this controller drives
    pub const fn display(&self) -> &V {
        &self.display
    }

    /// Handle one event
    ///
    /// All state changes and control updates for the event are applied
    /// before this returns; a returned [`Flow::Dispatch`] is issued only after.
    pub fn handle(&mut self, event: Event) -> Flow {
        match event {
            Event::VoiceRequested => {
                if let Some(session) = self.arbiter.request_voice() {
                    self.sync_controls();
                    self.transcriber.start(session);
                }
                Flow::Continue
            }
            Event::TextSubmitted(text) => {
                // The terminal can't lock its input line, so say why it was dropped
                if self.arbiter.mode() == InputMode::AwaitingAnswer
                    && Prompt::parse(&text).is_some()
                {
                    self.display.notice(BUSY_NOTICE);
                }
                self.begin(|arbiter| arbiter.submit_text(&text))
            }
            Event::Recognition { session, event } => self.on_recognition(session, event),
            Event::Answered {
                ticket,
                prompt,
                answer,
            } => {
                self.finish(ticket, &prompt, &answer);
                Flow::Continue
            }
            Event::Quit => Flow::Quit,
        }
    }

    /// Run the event loop until [`Event::Quit`] or the channel closes
    pub async fn run(mut self, mut events: mpsc::UnboundedReceiver<Event>) {
        tracing::info!(voice = self.arbiter.voice_available(), "controller running");

        while let Some(event) = events.recv().await {
            match self.handle(event) {
                Flow::Continue => {}
                Flow::Dispatch(request) => self.dispatch(request),
                Flow::Quit => break,
            }
        }

        tracing::info!("controller stopped");
    }

    /// Run one text question through a full cycle, awaiting the answer inline
    ///
    /// Returns `None` if the text was blank or a request was already in flight.
    pub async fn ask(&mut self, text: &str) -> Option<Answer> {
        let Flow::Dispatch(request) = self.handle(Event::TextSubmitted(text.to_string())) else {
            return None;
        };

        let answer = self.dispatcher.ask(&request.prompt).await;
        self.finish(request.ticket, &request.prompt, &answer);
        Some(answer)
    }

    fn on_recognition(&mut self, session: Session, event: RecognitionEvent) -> Flow {
        match event {
            RecognitionEvent::Started => {
                tracing::debug!(?session, "recognition started");
                Flow::Continue
            }
            RecognitionEvent::Result(transcript) => {
                self.begin(|arbiter| arbiter.on_transcript(session, &transcript))
            }
            RecognitionEvent::Error(error) => {
                tracing::error!(?session, %error, "speech recognition error");
                if self.arbiter.on_recognition_error(session) {
                    self.sync_controls();
                }
                Flow::Continue
            }
            RecognitionEvent::End => {
                if self.arbiter.on_recognition_end(session) {
                    tracing::debug!("recognition ended without a result");
                    self.sync_controls();
                }
                Flow::Continue
            }
        }
    }

    fn begin(&mut self, transition: impl FnOnce(&mut Arbiter) -> Option<(Ticket, Prompt)>) -> Flow {
        let before = self.arbiter.mode();
        match transition(&mut self.arbiter) {
            Some((ticket, prompt)) => {
                tracing::info!(?ticket, %prompt, "asking");
                self.sync_controls();
                Flow::Dispatch(Request { ticket, prompt })
            }
            None => {
                // A blank transcript can still move the arbiter back to idle
                if self.arbiter.mode() != before {
                    self.sync_controls();
                }
                Flow::Continue
            }
        }
    }

    fn finish(&mut self, ticket: Ticket, prompt: &Prompt, answer: &Answer) {
        if self.arbiter.in_flight() != Some(ticket) {
            tracing::warn!(?ticket, "dropping answer for a request that is not in flight");
            return;
        }

        self.display.render(prompt.as_str(), answer.text());
        self.synthesizer.speak(&Utterance::new(answer.text()));

        self.arbiter.complete(ticket);
        self.sync_controls();
    }

    fn dispatch(&self, request: Request) {
        let dispatcher = Arc::clone(&self.dispatcher);
        let events = self.events.clone();

        tokio::spawn(async move {
            let Request { ticket, prompt } = request;
            let answer = dispatcher.ask(&prompt).await;
            if events
                .send(Event::Answered {
                    ticket,
                    prompt,
                    answer,
                })
                .is_err()
            {
                tracing::debug!("controller gone, dropping answer");
            }
        });
    }

    fn sync_controls(&mut self) {
        self.display.set_controls(&self.arbiter.controls());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompt::FALLBACK_ANSWER;
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Calls(Mutex<Vec<String>>);

    impl Calls {
        fn push(&self, call: impl Into<String>) {
            self.0.lock().unwrap().push(call.into());
        }

        fn take(&self) -> Vec<String> {
            std::mem::take(&mut *self.0.lock().unwrap())
        }
    }

    struct FakeTranscriber(Arc<Calls>);

    impl Transcriber for FakeTranscriber {
        fn start(&mut self, _session: Session) {
            self.0.push("start");
        }
    }

    struct FakeSynth(Arc<Calls>);

    impl Synthesizer for FakeSynth {
        fn speak(&mut self, utterance: &Utterance) {
            self.0.push(format!("speak {}", utterance.text));
        }
    }

    struct FakeDisplay(Arc<Calls>);

    impl Display for FakeDisplay {
        fn render(&mut self, question: &str, answer: &str) {
            self.0.push(format!("render {question} / {answer}"));
        }

        fn set_controls(&mut self, controls: &Controls) {
            self.0.push(format!("controls {}", controls.voice_label));
        }

        fn notice(&mut self, message: &str) {
            self.0.push(format!("notice {message}"));
        }
    }

    struct FixedDispatcher(Answer);

    #[async_trait]
    impl Dispatcher for FixedDispatcher {
        async fn ask(&self, _prompt: &Prompt) -> Answer {
            self.0.clone()
        }
    }

    type TestController = Controller<FakeTranscriber, FakeSynth, FixedDispatcher, FakeDisplay>;

    fn controller(answer: Answer) -> (TestController, Arc<Calls>) {
        let calls = Arc::new(Calls::default());
        let (tx, _rx) = mpsc::unbounded_channel();
        let controller = Controller::new(
            FakeTranscriber(calls.clone()),
            FakeSynth(calls.clone()),
            FixedDispatcher(answer),
            FakeDisplay(calls.clone()),
            tx,
            true,
        );
        calls.take();
        (controller, calls)
    }

    #[test]
    fn test_voice_request_starts_transcriber() {
        let (mut c, calls) = controller(Answer::Fallback);

        assert_eq!(c.handle(Event::VoiceRequested), Flow::Continue);
        assert_eq!(c.mode(), InputMode::Listening);
        assert_eq!(calls.take(), vec!["controls Listening...", "start"]);

        // Second activation while listening does nothing
        c.handle(Event::VoiceRequested);
        assert!(calls.take().is_empty());
    }

    #[test]
    fn test_recognition_error_restores_controls() {
        let (mut c, calls) = controller(Answer::Fallback);
        let initial = c.controls();
        c.handle(Event::VoiceRequested);
        let session = c.listening().unwrap();
        calls.take();

        let flow = c.handle(Event::Recognition {
            session,
            event: RecognitionEvent::Error("no-speech".to_string()),
        });

        assert_eq!(flow, Flow::Continue);
        assert_eq!(c.controls(), initial);
        assert_eq!(calls.take(), vec!["controls Ask Gemini"]);
    }

    #[test]
    fn test_blank_transcript_returns_to_idle() {
        let (mut c, calls) = controller(Answer::Fallback);
        c.handle(Event::VoiceRequested);
        let session = c.listening().unwrap();
        calls.take();

        let flow = c.handle(Event::Recognition {
            session,
            event: RecognitionEvent::Result("  ".to_string()),
        });

        assert_eq!(flow, Flow::Continue);
        assert_eq!(c.mode(), InputMode::Idle);
        assert_eq!(calls.take(), vec!["controls Ask Gemini"]);
    }

    #[test]
    fn test_submission_disables_before_dispatch() {
        let (mut c, calls) = controller(Answer::Fallback);

        let Flow::Dispatch(request) = c.handle(Event::TextSubmitted(" hi ".to_string())) else {
            panic!("expected dispatch");
        };

        assert_eq!(request.prompt.as_str(), "hi");
        assert!(c.controls().all_disabled());
        assert_eq!(calls.take(), vec!["controls Thinking..."]);
    }

    #[test]
    fn test_stale_answer_dropped() {
        let (mut c, calls) = controller(Answer::Fallback);
        let Flow::Dispatch(request) = c.handle(Event::TextSubmitted("hi".to_string())) else {
            panic!("expected dispatch");
        };
        c.handle(Event::Answered {
            ticket: request.ticket,
            prompt: request.prompt.clone(),
            answer: Answer::Reply("first".to_string()),
        });
        calls.take();

        // Replaying the same ticket has no effect
        c.handle(Event::Answered {
            ticket: request.ticket,
            prompt: request.prompt,
            answer: Answer::Reply("again".to_string()),
        });
        assert!(calls.take().is_empty());
    }

    #[test]
    fn test_busy_submission_noticed() {
        let (mut c, calls) = controller(Answer::Fallback);
        c.handle(Event::TextSubmitted("first".to_string()));
        calls.take();

        assert_eq!(c.handle(Event::TextSubmitted("second".to_string())), Flow::Continue);
        assert_eq!(calls.take(), vec![format!("notice {BUSY_NOTICE}")]);

        // Blank lines stay silent
        c.handle(Event::TextSubmitted("  ".to_string()));
        assert!(calls.take().is_empty());
    }

    #[tokio::test]
    async fn test_ask_full_cycle_order() {
        let (mut c, calls) = controller(Answer::Fallback);

        let answer = c.ask("anything").await.unwrap();

        assert!(answer.is_fallback());
        assert_eq!(
            calls.take(),
            vec![
                "controls Thinking...".to_string(),
                format!("render anything / {FALLBACK_ANSWER}"),
                format!("speak {FALLBACK_ANSWER}"),
                "controls Ask Gemini".to_string(),
            ]
        );
        assert_eq!(c.mode(), InputMode::Idle);
    }

    #[tokio::test]
    async fn test_ask_blank_is_noop() {
        let (mut c, calls) = controller(Answer::Reply("x".to_string()));
        assert!(c.ask("   ").await.is_none());
        assert!(calls.take().is_empty());
    }
}
