//! Speech pipeline: synthesis, voice assignment, scheduling, playback

mod playback;
pub mod queue;
mod synth;
mod tts;
pub mod voices;

pub use playback::CpalSink;
pub use queue::{AudioClip, AudioSink, PlaybackQueue, SynthesisHandle, Utterance};
pub use synth::{SpeechSynthesizer, Synthesizer};
pub use tts::{TextToSpeech, VoiceInfo};
pub use voices::VoiceAssigner;
