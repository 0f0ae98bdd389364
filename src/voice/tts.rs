//! Text-to-speech (TTS) synthesis sink

use std::process::Stdio;

use tokio::process::{Child, Command};

use crate::{Error, Result};

/// Speaking rate for every utterance
pub const SPEECH_RATE: f32 = 1.0;

/// Speaking pitch for every utterance
pub const SPEECH_PITCH: f32 = 1.0;

/// Environment variable carrying the text to speak
pub const TEXT_ENV: &str = "VOICE_QA_TEXT";

/// Environment variable carrying the speaking rate
pub const RATE_ENV: &str = "VOICE_QA_RATE";

/// Environment variable carrying the speaking pitch
pub const PITCH_ENV: &str = "VOICE_QA_PITCH";

/// One message to speak
#[derive(Debug, Clone, PartialEq)]
pub struct Utterance {
    /// Text to speak
    pub text: String,
    /// Rate multiplier
    pub rate: f32,
    /// Pitch multiplier
    pub pitch: f32,
}

impl Utterance {
    /// Utterance at the fixed rate and pitch
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            rate: SPEECH_RATE,
            pitch: SPEECH_PITCH,
        }
    }
}

/// Speaks one message at a time
pub trait Synthesizer {
    /// Cancel whatever is being spoken and start speaking `utterance`
    ///
    /// Fire-and-forget: completion is not reported.
    fn speak(&mut self, utterance: &Utterance);
}

impl<S: Synthesizer + ?Sized> Synthesizer for Box<S> {
    fn speak(&mut self, utterance: &Utterance) {
        (**self).speak(utterance);
    }
}

impl<S: Synthesizer + ?Sized> Synthesizer for &mut S {
    fn speak(&mut self, utterance: &Utterance) {
        (**self).speak(utterance);
    }
}

/// Synthesizer that runs an external speech command per utterance
///
/// The command runs under `sh -c` with the text, rate and pitch in its
/// environment. Each utterance gets its own process group, and cancelling
/// signals the whole group so engines started by the shell stop too.
pub struct CommandSynthesizer {
    command: String,
    current: Option<Child>,
}

impl CommandSynthesizer {
    /// Create a synthesizer for `command`
    #[must_use]
    pub const fn new(command: String) -> Self {
        Self {
            command,
            current: None,
        }
    }

    /// Stop the utterance in progress, if any
    pub fn cancel(&mut self) {
        if let Some(mut child) = self.current.take() {
            if let Some(pid) = child.id() {
                signal_group(pid);
            }
            match child.start_kill() {
                Ok(()) => tracing::debug!("cancelled previous utterance"),
                // Already exited
                Err(e) => tracing::trace!(error = %e, "nothing to cancel"),
            }
        }
    }

    /// Wait for the utterance in progress to finish
    ///
    /// # Errors
    ///
    /// Returns error if waiting on the speech process fails
    pub async fn wait(&mut self) -> Result<()> {
        if let Some(mut child) = self.current.take() {
            let status = child.wait().await?;
            tracing::debug!(%status, "utterance finished");
        }
        Ok(())
    }

    fn spawn(&self, utterance: &Utterance) -> Result<Child> {
        let mut command = Command::new("sh");
        command
            .arg("-c")
            .arg(&self.command)
            .env(TEXT_ENV, &utterance.text)
            .env(RATE_ENV, format!("{:.1}", utterance.rate))
            .env(PITCH_ENV, format!("{:.1}", utterance.pitch))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());
        #[cfg(unix)]
        command.process_group(0);

        command
            .spawn()
            .map_err(|e| Error::Synthesis(format!("failed to start speech command: {e}")))
    }
}

/// Send SIGTERM to the process group led by `pid`
fn signal_group(pid: u32) {
    let result = Command::new("kill")
        .arg("-TERM")
        .arg("--")
        .arg(format!("-{pid}"))
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn();

    if let Err(e) = result {
        tracing::debug!(pid, error = %e, "failed to signal speech process group");
    }
}

impl Synthesizer for CommandSynthesizer {
    fn speak(&mut self, utterance: &Utterance) {
        self.cancel();

        match self.spawn(utterance) {
            Ok(child) => {
                tracing::debug!(chars = utterance.text.len(), "speaking");
                self.current = Some(child);
            }
            Err(e) => tracing::warn!(error = %e, "speech synthesis failed"),
        }
    }
}

/// Synthesizer that stays quiet, for muted sessions
#[derive(Debug, Default)]
pub struct SilentSynthesizer;

impl Synthesizer for SilentSynthesizer {
    fn speak(&mut self, utterance: &Utterance) {
        tracing::debug!(chars = utterance.text.len(), "speech muted");
    }
}
