//! The narrator: turns chat events into queued utterances
//!
//! Filters ignored senders and empty messages, redacts URLs, assigns a
//! voice per speaker, and announces a first-time speaker's voice before
//! their first message. System events (subs, raids) are voiced by a fixed
//! system speaker and take the exact same path through the queue.

use std::collections::HashSet;
use std::sync::Arc;

use regex::Regex;

use crate::channels::ChatEvent;
use crate::speech::{PlaybackQueue, SpeechSynthesizer, Utterance, VoiceAssigner};

/// Speaker identity for synthetic system messages
pub const SYSTEM_SPEAKER: &str = "narrator";

/// Display name used in the system speaker's introduction
const SYSTEM_DISPLAY_NAME: &str = "The narrator";

/// Placeholder spoken in place of any URL
const URL_PLACEHOLDER: &str = "a link";

/// Chat-to-speech entry point
pub struct Narrator {
    voices: VoiceAssigner,
    synth: Arc<dyn SpeechSynthesizer>,
    queue: PlaybackQueue,
    ignore: HashSet<String>,
    url_re: Regex,
}

impl Narrator {
    /// Create a narrator
    ///
    /// `ignore` holds lowercased speaker ids that are never voiced.
    #[must_use]
    pub fn new(
        voices: VoiceAssigner,
        synth: Arc<dyn SpeechSynthesizer>,
        queue: PlaybackQueue,
        ignore: HashSet<String>,
    ) -> Self {
        Self {
            voices,
            synth,
            queue,
            ignore,
            url_re: Regex::new(r"\bhttps?://\S+").expect("URL pattern is valid"),
        }
    }

    /// Handle a chat event
    pub fn handle_event(&mut self, event: &ChatEvent) {
        match event {
            ChatEvent::Message {
                sender_id,
                sender_name,
                text,
            } => self.narrate(sender_id, sender_name, text),
            ChatEvent::Subscription { user } => self.narrate_system(&format!(
                "Thanks to {user} for subscribing to the channel!"
            )),
            ChatEvent::Resub { user, months } => self.narrate_system(&format!(
                "Thanks to {user} for subscribing to the channel for a total of {months} months!"
            )),
            ChatEvent::GiftSub { gifter, recipient } => self.narrate_system(&format!(
                "Thanks to {gifter} for gifting a subscription to {recipient}!"
            )),
            ChatEvent::Raid { raider, viewers } => self.narrate_system(&format!(
                "Woohoo! {raider} is raiding with a party of {viewers}. Thanks for the raid {raider}!"
            )),
        }
    }

    /// Voice one chat message from a speaker
    pub fn narrate(&mut self, sender_id: &str, sender_name: &str, text: &str) {
        let speaker = sender_id.to_lowercase();

        if self.ignore.contains(&speaker) {
            tracing::debug!(speaker = %speaker, "ignored speaker");
            return;
        }
        if text.trim().is_empty() {
            return;
        }

        let (known, voice) = self.voices.resolve(&speaker);

        // First appearance: the introduction goes on the queue ahead of
        // the message itself.
        if !known {
            self.speak(
                &speaker,
                &voice,
                &format!("{sender_name} is now chatting with this voice."),
            );
        }

        let redacted = self.url_re.replace_all(text, URL_PLACEHOLDER);
        self.speak(&speaker, &voice, &redacted);
    }

    /// Voice a synthetic system message
    fn narrate_system(&mut self, text: &str) {
        self.narrate(SYSTEM_SPEAKER, SYSTEM_DISPLAY_NAME, text);
    }

    /// Kick off synthesis and enqueue, in that order
    fn speak(&self, speaker: &str, voice: &str, text: &str) {
        let handle = self.synth.begin(text, voice);
        self.queue.enqueue(Utterance::new(speaker, text), handle);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_pattern_matches_http_and_https() {
        let re = Regex::new(r"\bhttps?://\S+").unwrap();

        assert_eq!(
            re.replace_all("see https://example.com/x?q=1 now", "a link"),
            "see a link now"
        );
        assert_eq!(
            re.replace_all("http://a.b and https://c.d", "a link"),
            "a link and a link"
        );
        assert_eq!(re.replace_all("no links here", "a link"), "no links here");
    }
}
