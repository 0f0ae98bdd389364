//! voice-qa - voice and text question answering front end
//!
//! Captures a question by speech or typed text, sends it to a remote answer
//! service and shows and speaks the reply.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐  ┌──────────────┐
//! │  Transcriber │  │ Text input   │
//! └──────┬───────┘  └──────┬───────┘
//!        │ events          │ events
//! ┌──────▼─────────────────▼───────┐      ┌──────────────────┐
//! │ Controller (input arbiter)     ├─────►│ Dispatcher       │
//! │                                │◄─────┤ POST /api/gemini │
//! └──────┬─────────────────┬───────┘      └──────────────────┘
//!        │                 │
//! ┌──────▼───────┐  ┌──────▼───────┐
//! │ Display      │  │ Synthesizer  │
//! └──────────────┘  └──────────────┘
//! ```

pub mod config;
pub mod controller;
pub mod dispatch;
pub mod display;
pub mod error;
pub mod input;
pub mod prompt;
pub mod voice;

pub use config::Config;
pub use controller::{Controller, Controls, Event, Flow, InputMode, Request};
pub use dispatch::{Dispatcher, HttpDispatcher};
pub use display::{Display, Panel, TerminalDisplay};
pub use error::{Error, Result};
pub use prompt::{Answer, FALLBACK_ANSWER, Prompt};
pub use voice::{
    CommandSynthesizer, CommandTranscriber, RecognitionEvent, RecognitionSettings,
    SilentSynthesizer, Synthesizer, Transcriber, Utterance,
};
