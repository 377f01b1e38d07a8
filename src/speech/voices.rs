//! Voice pools and per-speaker voice assignment
//!
//! Every speaker keeps the voice they were first given for the life of the
//! process. Voices pinned to specific speakers in config are removed from
//! the automatic pool, so a pinned voice can never collide with an
//! auto-assigned one.

use std::collections::{HashMap, HashSet};

use rand::Rng;
use rand::seq::SliceRandom;

use crate::config::Provider;

/// `OpenAI` speech voices available for assignment
pub const OPENAI_VOICES: &[&str] = &[
    "alloy", "ash", "coral", "echo", "fable", "nova", "onyx", "sage", "shimmer",
];

/// ElevenLabs premade voices available for assignment: `(voice_id, name)`
pub const ELEVENLABS_VOICES: &[(&str, &str)] = &[
    ("21m00Tcm4TlvDq8ikWAM", "Rachel"),
    ("AZnzlk1XvdvUeBnXmlld", "Domi"),
    ("EXAVITQu4vr4xnSDxMaL", "Bella"),
    ("ErXwobaYiN019PkySvjV", "Antoni"),
    ("MF3mGyEYCl7XYWbV9V6O", "Elli"),
    ("TxGEqnHWrfWFTfGW9XjX", "Josh"),
    ("VR6AewLTigWG4xSOukaG", "Arnold"),
    ("pNInz6obpgDQGcFmaJgB", "Adam"),
    ("yoZ06aMxZJJ28mfd3POQ", "Sam"),
];

/// Voice identifiers for a provider's full catalog
#[must_use]
pub fn provider_voices(provider: Provider) -> Vec<String> {
    match provider {
        Provider::OpenAi => OPENAI_VOICES.iter().map(ToString::to_string).collect(),
        Provider::ElevenLabs => ELEVENLABS_VOICES
            .iter()
            .map(|(id, _)| (*id).to_string())
            .collect(),
    }
}

/// Assigns voices to speakers, stably for the session
pub struct VoiceAssigner {
    /// Shuffled pool for automatic assignment, pinned voices excluded
    pool: Vec<String>,
    /// Configured speaker → voice pins
    pinned: HashMap<String, String>,
    /// Assignments recorded so far
    assigned: HashMap<String, String>,
    /// Round-robin cursor into the pool; wraps modulo pool length
    cursor: usize,
}

impl VoiceAssigner {
    /// Create an assigner for a provider's catalog
    #[must_use]
    pub fn new(provider: Provider, pinned: HashMap<String, String>) -> Self {
        Self::with_rng(provider_voices(provider), pinned, &mut rand::thread_rng())
    }

    /// Create an assigner over an explicit voice list, shuffled with `rng`
    #[must_use]
    pub fn with_rng(voices: Vec<String>, pinned: HashMap<String, String>, rng: &mut impl Rng) -> Self {
        let pinned_values: HashSet<&String> = pinned.values().collect();

        let mut pool: Vec<String> = voices
            .iter()
            .filter(|v| !pinned_values.contains(v))
            .cloned()
            .collect();

        // If pinning consumed the whole catalog, assignment still has to
        // succeed; fall back to the full list.
        if pool.is_empty() {
            pool = voices;
        }

        pool.shuffle(rng);

        Self {
            pool,
            pinned,
            assigned: HashMap::new(),
            cursor: 0,
        }
    }

    /// Resolve a speaker's voice
    ///
    /// Returns `(was_already_assigned, voice)`. A new speaker gets their
    /// pinned voice if configured, otherwise the next pool voice in
    /// round-robin order. The mapping is recorded before returning and
    /// never changes afterwards.
    pub fn resolve(&mut self, speaker: &str) -> (bool, String) {
        if let Some(voice) = self.assigned.get(speaker) {
            return (true, voice.clone());
        }

        let voice = self.pinned.get(speaker).cloned().unwrap_or_else(|| {
            let voice = self.pool[self.cursor % self.pool.len()].clone();
            self.cursor += 1;
            voice
        });

        tracing::debug!(speaker, voice = %voice, "assigned voice");
        self.assigned.insert(speaker.to_string(), voice.clone());
        (false, voice)
    }

    /// Number of voices in the automatic pool
    #[must_use]
    pub fn pool_len(&self) -> usize {
        self.pool.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn voices(names: &[&str]) -> Vec<String> {
        names.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn voice_is_stable_across_resolutions() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut assigner =
            VoiceAssigner::with_rng(voices(&["a", "b", "c"]), HashMap::new(), &mut rng);

        let (known, first) = assigner.resolve("alice");
        assert!(!known);

        for _ in 0..10 {
            let (known, voice) = assigner.resolve("alice");
            assert!(known);
            assert_eq!(voice, first);
        }
    }

    #[test]
    fn pinned_speaker_gets_exact_voice() {
        let mut rng = StdRng::seed_from_u64(7);
        let pinned = HashMap::from([("alice".to_string(), "b".to_string())]);
        let mut assigner = VoiceAssigner::with_rng(voices(&["a", "b", "c"]), pinned, &mut rng);

        let (known, voice) = assigner.resolve("alice");
        assert!(!known);
        assert_eq!(voice, "b");
        assert_eq!(assigner.resolve("alice"), (true, "b".to_string()));
    }

    #[test]
    fn pinned_voices_are_excluded_from_the_pool() {
        let mut rng = StdRng::seed_from_u64(7);
        let pinned = HashMap::from([("alice".to_string(), "b".to_string())]);
        let mut assigner = VoiceAssigner::with_rng(voices(&["a", "b", "c"]), pinned, &mut rng);

        assert_eq!(assigner.pool_len(), 2);

        // However many speakers show up, nobody else ever gets "b"
        for i in 0..8 {
            let (_, voice) = assigner.resolve(&format!("speaker{i}"));
            assert_ne!(voice, "b");
        }
    }

    #[test]
    fn pool_wraps_when_exhausted() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut assigner = VoiceAssigner::with_rng(voices(&["a", "b"]), HashMap::new(), &mut rng);

        let (_, v1) = assigner.resolve("s1");
        let (_, v2) = assigner.resolve("s2");
        let (_, v3) = assigner.resolve("s3");
        let (_, v4) = assigner.resolve("s4");

        assert_ne!(v1, v2);
        assert_eq!(v1, v3);
        assert_eq!(v2, v4);
    }

    #[test]
    fn fully_pinned_catalog_still_assigns() {
        let mut rng = StdRng::seed_from_u64(7);
        let pinned = HashMap::from([("alice".to_string(), "a".to_string())]);
        let mut assigner = VoiceAssigner::with_rng(voices(&["a"]), pinned, &mut rng);

        let (_, voice) = assigner.resolve("bob");
        assert_eq!(voice, "a");
    }
}
