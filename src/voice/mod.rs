//! Voice processing module
//!
//! Speech recognition and synthesis adapters. Both delegate to external
//! engines run as child processes, behind the [`Transcriber`] and
//! [`Synthesizer`] traits so the controller can be driven by fakes.

pub mod stt;
pub mod tts;

pub use stt::{CommandTranscriber, RecognitionEvent, RecognitionSettings, Transcriber};
pub use tts::{CommandSynthesizer, SilentSynthesizer, Synthesizer, Utterance};
