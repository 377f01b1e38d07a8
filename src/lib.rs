//! Chat Narrator - chat-triggered speech playback for live streams
//!
//! This library turns live chat messages into spoken audio:
//! - Per-speaker voice assignment, stable for the session
//! - Concurrent speech synthesis, strictly ordered playback
//! - Fixed pacing between utterances, failure isolation per item
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                  Chat channel                        │
//! │           Twitch IRC (messages, events)              │
//! └────────────────────┬────────────────────────────────┘
//!                      │
//! ┌────────────────────▼────────────────────────────────┐
//! │                   Narrator                           │
//! │  ignore list │ URL redaction │ voice assignment      │
//! └────────────────────┬────────────────────────────────┘
//!                      │ fire-and-forget synthesis
//! ┌────────────────────▼────────────────────────────────┐
//! │                PlaybackQueue                         │
//! │  FIFO drain │ head-of-line wait │ pacing │ cleanup   │
//! └─────────────────────────────────────────────────────┘
//! ```

pub mod channels;
pub mod config;
pub mod daemon;
pub mod error;
pub mod narrator;
pub mod speech;

pub use config::Config;
pub use daemon::Daemon;
pub use error::{Error, Result};
pub use narrator::Narrator;
pub use speech::{
    AudioClip, AudioSink, CpalSink, PlaybackQueue, SpeechSynthesizer, SynthesisHandle,
    Synthesizer, TextToSpeech, Utterance, VoiceAssigner,
};
