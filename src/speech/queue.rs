//! Speech playback scheduling
//!
//! Utterances are synthesized concurrently but played strictly in enqueue
//! order by a single drain worker. The head item's synthesis outcome gates
//! the whole queue: a later item that finished synthesis early still waits
//! for everything ahead of it. Failed items are dropped without pausing
//! the queue; played items are followed by a fixed pacing delay so
//! consecutive utterances don't overlap acoustically.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot};

use crate::Result;

/// One unit of text attributed to a speaker, destined for playback
#[derive(Debug, Clone)]
pub struct Utterance {
    /// Speaker identity the voice assignment is keyed on
    pub speaker: String,
    /// Text that was sent to synthesis
    pub text: String,
}

impl Utterance {
    /// Create an utterance
    #[must_use]
    pub fn new(speaker: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            speaker: speaker.into(),
            text: text.into(),
        }
    }
}

/// Synthesized audio spooled to a transient file
#[derive(Debug)]
pub struct AudioClip {
    path: PathBuf,
}

impl AudioClip {
    /// Wrap a spooled audio file
    #[must_use]
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Path to the spooled audio
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Delete the spooled file, best-effort
    ///
    /// Deletion failures are logged and swallowed; a leaked spool file is
    /// never worth stalling the queue over.
    pub async fn release(self) {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => tracing::trace!(path = %self.path.display(), "released audio clip"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "failed to delete audio clip");
            }
        }
    }
}

/// Receiver for an in-flight synthesis outcome, resolved exactly once
pub type SynthesisHandle = oneshot::Receiver<Result<AudioClip>>;

/// Trait for audio output devices
#[async_trait]
pub trait AudioSink: Send + Sync {
    /// Play a clip to completion
    async fn play(&self, clip: &AudioClip) -> Result<()>;
}

/// A queue slot: the utterance plus its in-flight synthesis
struct PendingUtterance {
    utterance: Utterance,
    synthesis: SynthesisHandle,
}

/// The playback scheduler
///
/// Producers call [`enqueue`](Self::enqueue) from anywhere; a single
/// worker owned by the queue drains slots in FIFO order. At most one
/// playback is ever in flight.
#[derive(Clone)]
pub struct PlaybackQueue {
    tx: mpsc::UnboundedSender<PendingUtterance>,
    playing: Arc<AtomicBool>,
    depth: Arc<AtomicUsize>,
}

impl PlaybackQueue {
    /// Create a queue draining into `sink`, with `pause` between utterances
    #[must_use]
    pub fn new(sink: Arc<dyn AudioSink>, pause: Duration) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let playing = Arc::new(AtomicBool::new(false));
        let depth = Arc::new(AtomicUsize::new(0));

        tokio::spawn(drain(rx, sink, pause, Arc::clone(&playing), Arc::clone(&depth)));

        Self { tx, playing, depth }
    }

    /// Append an utterance and its synthesis handle at the tail
    ///
    /// Slots take the order of `enqueue` calls, not the order syntheses
    /// complete in.
    pub fn enqueue(&self, utterance: Utterance, synthesis: SynthesisHandle) {
        self.depth.fetch_add(1, Ordering::SeqCst);
        tracing::debug!(speaker = %utterance.speaker, "enqueued utterance");

        // The worker outlives every sender; send only fails after the
        // runtime is torn down.
        if self
            .tx
            .send(PendingUtterance {
                utterance,
                synthesis,
            })
            .is_err()
        {
            self.depth.fetch_sub(1, Ordering::SeqCst);
            tracing::warn!("playback queue worker is gone, dropping utterance");
        }
    }

    /// Whether a playback is currently in flight
    #[must_use]
    pub fn is_playing(&self) -> bool {
        self.playing.load(Ordering::SeqCst)
    }

    /// Number of utterances accepted but not yet finished
    #[must_use]
    pub fn depth(&self) -> usize {
        self.depth.load(Ordering::SeqCst)
    }

    /// Whether nothing is queued or playing
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.depth() == 0
    }
}

/// Single drain worker: strict FIFO, head-of-line blocking, pacing
async fn drain(
    mut rx: mpsc::UnboundedReceiver<PendingUtterance>,
    sink: Arc<dyn AudioSink>,
    pause: Duration,
    playing: Arc<AtomicBool>,
    depth: Arc<AtomicUsize>,
) {
    while let Some(pending) = rx.recv().await {
        let speaker = pending.utterance.speaker;

        // Head-of-line wait: nothing behind this slot can play until its
        // synthesis settles, even if it settled long ago.
        match pending.synthesis.await {
            Ok(Ok(clip)) => {
                playing.store(true, Ordering::SeqCst);
                tracing::debug!(speaker = %speaker, path = %clip.path().display(), "playing utterance");

                // Playback errors count as completion
                if let Err(e) = sink.play(&clip).await {
                    tracing::warn!(speaker = %speaker, error = %e, "playback failed");
                }

                clip.release().await;

                // Pacing: the next utterance may not start before this
                // delay has fully elapsed.
                tokio::time::sleep(pause).await;
                playing.store(false, Ordering::SeqCst);
            }
            Ok(Err(e)) => {
                // Dropped item; the queue moves on immediately, no pause
                tracing::warn!(speaker = %speaker, error = %e, "synthesis failed, skipping utterance");
            }
            Err(_) => {
                tracing::warn!(speaker = %speaker, "synthesis task vanished, skipping utterance");
            }
        }

        depth.fetch_sub(1, Ordering::SeqCst);
    }
}
