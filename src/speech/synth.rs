//! Fire-and-forget speech synthesis
//!
//! Each utterance's synthesis runs in its own task the moment it is
//! requested; the caller gets a handle that resolves once, to a spooled
//! clip or an error. Outcomes are values — a failing backend never
//! unwinds into the caller or the queue.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::oneshot;

use crate::speech::queue::{AudioClip, SynthesisHandle};
use crate::speech::tts::TextToSpeech;
use crate::{Error, Result};

/// Trait for starting asynchronous speech synthesis
pub trait SpeechSynthesizer: Send + Sync {
    /// Kick off synthesis of `text` with `voice`
    ///
    /// Returns immediately; the handle resolves when the backend does.
    fn begin(&self, text: &str, voice: &str) -> SynthesisHandle;
}

/// Synthesizer backed by a TTS HTTP client and a session spool directory
pub struct Synthesizer {
    tts: Arc<TextToSpeech>,
    spool: Arc<tempfile::TempDir>,
    counter: AtomicU64,
}

impl Synthesizer {
    /// Create a synthesizer with a fresh spool directory
    ///
    /// # Errors
    ///
    /// Returns error if the spool directory cannot be created
    pub fn new(tts: TextToSpeech) -> Result<Self> {
        let spool = tempfile::Builder::new()
            .prefix("chat-narrator.")
            .tempdir()
            .map_err(|e| Error::Config(format!("failed to create spool dir: {e}")))?;

        tracing::debug!(path = %spool.path().display(), "spool directory created");

        Ok(Self {
            tts: Arc::new(tts),
            spool: Arc::new(spool),
            counter: AtomicU64::new(0),
        })
    }
}

impl SpeechSynthesizer for Synthesizer {
    fn begin(&self, text: &str, voice: &str) -> SynthesisHandle {
        let (tx, rx) = oneshot::channel();

        let tts = Arc::clone(&self.tts);
        let spool = Arc::clone(&self.spool);
        let seq = self.counter.fetch_add(1, Ordering::SeqCst);
        let text = text.to_string();
        let voice = voice.to_string();

        tokio::spawn(async move {
            let outcome = synthesize_to_spool(&tts, &spool, seq, &text, &voice).await;

            if let Err(e) = &outcome {
                tracing::debug!(seq, error = %e, "synthesis resolved to failure");
            }

            // The queue may already be gone on shutdown
            let _ = tx.send(outcome);
        });

        rx
    }
}

/// Synthesize and write the audio to `message.{seq}.mp3` in the spool dir
async fn synthesize_to_spool(
    tts: &TextToSpeech,
    spool: &tempfile::TempDir,
    seq: u64,
    text: &str,
    voice: &str,
) -> Result<AudioClip> {
    let bytes = tts.synthesize(text, voice).await?;
    let path = spool.path().join(format!("message.{seq}.mp3"));
    tokio::fs::write(&path, &bytes).await?;

    tracing::debug!(seq, bytes = bytes.len(), path = %path.display(), "synthesis complete");
    Ok(AudioClip::new(path))
}
