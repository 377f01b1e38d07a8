//! Shared test utilities: mock audio sink and mock synthesizer

#![allow(dead_code)]

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex as StdMutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{Mutex, oneshot};
use tokio::time::Instant;

use chat_narrator::speech::SynthesisHandle;
use chat_narrator::{AudioClip, AudioSink, Error, Result, SpeechSynthesizer};

/// Record of one completed playback
#[derive(Debug, Clone)]
pub struct Played {
    /// Clip label (the mock encodes the utterance text as the clip path)
    pub label: String,
    pub started: Instant,
    pub finished: Instant,
}

/// Audio sink that records playbacks instead of producing sound
pub struct MockSink {
    /// Simulated duration of every clip
    duration: Duration,
    pub played: Mutex<Vec<Played>>,
    active: AtomicUsize,
    pub max_active: AtomicUsize,
}

impl MockSink {
    pub fn new(duration: Duration) -> Self {
        Self {
            duration,
            played: Mutex::new(Vec::new()),
            active: AtomicUsize::new(0),
            max_active: AtomicUsize::new(0),
        }
    }

    /// Labels of everything played so far, in order
    pub async fn labels(&self) -> Vec<String> {
        self.played.lock().await.iter().map(|p| p.label.clone()).collect()
    }
}

#[async_trait]
impl AudioSink for MockSink {
    async fn play(&self, clip: &AudioClip) -> Result<()> {
        let now_active = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_active.fetch_max(now_active, Ordering::SeqCst);

        let started = Instant::now();
        tokio::time::sleep(self.duration).await;

        self.active.fetch_sub(1, Ordering::SeqCst);
        self.played.lock().await.push(Played {
            label: clip.path().display().to_string(),
            started,
            finished: Instant::now(),
        });
        Ok(())
    }
}

/// Handle already resolved to a clip labeled `label`
pub fn ready_clip(label: &str) -> SynthesisHandle {
    let (tx, rx) = oneshot::channel();
    tx.send(Ok(AudioClip::new(PathBuf::from(label))))
        .expect("receiver alive");
    rx
}

/// Handle already resolved to a synthesis failure
pub fn failed_clip(reason: &str) -> SynthesisHandle {
    let (tx, rx) = oneshot::channel();
    tx.send(Err(Error::Tts(reason.to_string())))
        .expect("receiver alive");
    rx
}

/// Handle that resolves to a clip labeled `label` after `delay`
pub fn deferred_clip(label: &str, delay: Duration) -> SynthesisHandle {
    let (tx, rx) = oneshot::channel();
    let label = label.to_string();
    tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        let _ = tx.send(Ok(AudioClip::new(PathBuf::from(label))));
    });
    rx
}

/// Synthesizer that resolves instantly (or after a per-text delay) with a
/// clip whose path is the utterance text, and records every request
pub struct MockSynthesizer {
    pub requests: StdMutex<Vec<(String, String)>>,
    delays: StdMutex<HashMap<String, Duration>>,
    fail_texts: StdMutex<Vec<String>>,
}

impl MockSynthesizer {
    pub fn new() -> Self {
        Self {
            requests: StdMutex::new(Vec::new()),
            delays: StdMutex::new(HashMap::new()),
            fail_texts: StdMutex::new(Vec::new()),
        }
    }

    /// Make synthesis of `text` take `delay` to resolve
    pub fn set_delay(&self, text: &str, delay: Duration) {
        self.delays.lock().unwrap().insert(text.to_string(), delay);
    }

    /// Make synthesis of `text` resolve to a failure
    pub fn fail_on(&self, text: &str) {
        self.fail_texts.lock().unwrap().push(text.to_string());
    }

    /// `(text, voice)` pairs requested so far
    pub fn requests(&self) -> Vec<(String, String)> {
        self.requests.lock().unwrap().clone()
    }
}

impl SpeechSynthesizer for MockSynthesizer {
    fn begin(&self, text: &str, voice: &str) -> SynthesisHandle {
        self.requests
            .lock()
            .unwrap()
            .push((text.to_string(), voice.to_string()));

        if self.fail_texts.lock().unwrap().iter().any(|t| t == text) {
            return failed_clip("mock synthesis failure");
        }

        match self.delays.lock().unwrap().get(text) {
            Some(delay) => deferred_clip(text, *delay),
            None => ready_clip(text),
        }
    }
}

/// Wait until the queue has fully drained
pub async fn wait_idle(queue: &chat_narrator::PlaybackQueue) {
    tokio::time::timeout(Duration::from_secs(120), async {
        while !queue.is_idle() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("queue did not drain");
}
