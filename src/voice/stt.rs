//! Speech-to-text (STT) transcription source

use std::process::Stdio;

use tokio::process::Command;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::controller::{Event, Session};
use crate::{Error, Result};

/// Environment variable carrying the recognition locale to the engine
pub const LOCALE_ENV: &str = "VOICE_QA_LOCALE";

/// Default recognition locale
pub const DEFAULT_LOCALE: &str = "en-US";

/// Notification from a transcription session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecognitionEvent {
    /// The engine began listening
    Started,
    /// First alternative of the first recognized segment
    Result(String),
    /// Recognition failed
    Error(String),
    /// The session is over (always the last event of an activation)
    End,
}

/// Recognition settings
///
/// Sessions are single-shot: one utterance, one alternative, no interim results.
#[derive(Debug, Clone)]
pub struct RecognitionSettings {
    /// Language tag, e.g. "en-US"
    pub locale: String,
}

impl Default for RecognitionSettings {
    fn default() -> Self {
        Self {
            locale: DEFAULT_LOCALE.to_string(),
        }
    }
}

/// Produces at most one transcript per activation
///
/// Outcomes are reported asynchronously, tagged with the activation's
/// `session`; `start` itself never fails; errors arrive as
/// [`RecognitionEvent::Error`] followed by [`RecognitionEvent::End`].
pub trait Transcriber {
    /// Begin activation `session`
    fn start(&mut self, session: Session);
}

impl<T: Transcriber + ?Sized> Transcriber for Box<T> {
    fn start(&mut self, session: Session) {
        (**self).start(session);
    }
}

/// Transcriber that runs an external recognizer command
///
/// The command runs under `sh -c` with the locale in `VOICE_QA_LOCALE` and
/// must print the transcript on stdout. The first non-empty line is used.
/// Starting a new activation kills a recognizer still running for an older one.
pub struct CommandTranscriber {
    command: Option<String>,
    settings: RecognitionSettings,
    events: mpsc::UnboundedSender<Event>,
    current: Option<JoinHandle<()>>,
}

impl CommandTranscriber {
    /// Create a transcriber posting its events to `events`
    #[must_use]
    pub const fn new(
        command: Option<String>,
        settings: RecognitionSettings,
        events: mpsc::UnboundedSender<Event>,
    ) -> Self {
        Self {
            command,
            settings,
            events,
            current: None,
        }
    }

    fn emit(events: &mpsc::UnboundedSender<Event>, session: Session, event: RecognitionEvent) {
        if events.send(Event::Recognition { session, event }).is_err() {
            tracing::debug!("controller gone, dropping recognition event");
        }
    }

    fn abandon_previous(&mut self) {
        if let Some(previous) = self.current.take()
            && !previous.is_finished()
        {
            tracing::debug!("stopping recognizer from an earlier activation");
            previous.abort();
        }
    }
}

impl Transcriber for CommandTranscriber {
    fn start(&mut self, session: Session) {
        self.abandon_previous();

        let Some(command) = self.command.clone() else {
            Self::emit(
                &self.events,
                session,
                RecognitionEvent::Error("no recognizer configured".to_string()),
            );
            Self::emit(&self.events, session, RecognitionEvent::End);
            return;
        };

        let events = self.events.clone();
        let locale = self.settings.locale.clone();

        tracing::debug!(?session, %locale, "starting recognition");
        Self::emit(&events, session, RecognitionEvent::Started);

        self.current = Some(tokio::spawn(async move {
            match recognize(&command, &locale).await {
                Ok(Some(transcript)) => {
                    tracing::info!(%transcript, "transcription complete");
                    Self::emit(&events, session, RecognitionEvent::Result(transcript));
                }
                Ok(None) => tracing::debug!("recognizer produced no speech"),
                Err(e) => {
                    tracing::error!(error = %e, "speech recognition error");
                    Self::emit(&events, session, RecognitionEvent::Error(e.to_string()));
                }
            }
            Self::emit(&events, session, RecognitionEvent::End);
        }));
    }
}

async fn recognize(command: &str, locale: &str) -> Result<Option<String>> {
    let output = Command::new("sh")
        .arg("-c")
        .arg(command)
        .env(LOCALE_ENV, locale)
        .stdin(Stdio::null())
        .kill_on_drop(true)
        .output()
        .await
        .map_err(|e| Error::Recognition(format!("failed to start recognizer: {e}")))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        return Err(Error::Recognition(format!(
            "recognizer exited with {}: {stderr}",
            output.status
        )));
    }

    Ok(first_transcript(&String::from_utf8_lossy(&output.stdout)))
}

/// Pick the first non-empty line of recognizer output
#[must_use]
pub fn first_transcript(output: &str) -> Option<String> {
    output
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .map(ToString::to_string)
}

/// Check whether the recognizer command can run on this host
///
/// Looks up the command's program on `PATH`. A missing command counts as
/// unavailable.
#[must_use]
pub fn probe(command: Option<&str>) -> bool {
    let Some(program) = command.and_then(|c| c.split_whitespace().next()) else {
        return false;
    };

    match which::which(program) {
        Ok(path) => {
            tracing::debug!(path = %path.display(), "speech recognizer found");
            true
        }
        Err(e) => {
            tracing::warn!(program, error = %e, "speech recognizer not found");
            false
        }
    }
}
