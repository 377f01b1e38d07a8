//! Daemon - the narrator service
//!
//! Wires the chat channel into the narrator: connects to Twitch, answers
//! chat commands, drops spam, and forwards everything else to the speech
//! pipeline.

use std::sync::Arc;
use std::sync::OnceLock;

use rand::Rng;
use regex::Regex;

use crate::channels::{Channel, ChatEvent, OutgoingMessage, TwitchChannel};
use crate::narrator::Narrator;
use crate::speech::{CpalSink, PlaybackQueue, Synthesizer, TextToSpeech, VoiceAssigner};
use crate::{Config, Result};

/// The narrator daemon
pub struct Daemon {
    config: Config,
}

impl Daemon {
    /// Create a daemon instance
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Run until the chat connection closes or the process is interrupted
    ///
    /// # Errors
    ///
    /// Returns error if startup (TTS client, audio device, chat connect)
    /// fails. Per-event failures are logged and absorbed.
    pub async fn run(self) -> Result<()> {
        let tts = TextToSpeech::from_config(&self.config)?;
        let synth = Arc::new(Synthesizer::new(tts)?);

        let sink = Arc::new(CpalSink::new()?);
        let queue = PlaybackQueue::new(sink, self.config.voice.pause);

        let voices = VoiceAssigner::new(self.config.provider, self.config.voice.pinned.clone());
        let mut narrator = Narrator::new(voices, synth, queue, self.config.voice.ignore.clone());

        let (mut channel, mut events) = TwitchChannel::with_receiver(&self.config.twitch);
        channel.connect().await?;

        tracing::info!(
            channel = %self.config.twitch.channel,
            provider = self.config.provider.key(),
            "narrator running"
        );

        loop {
            tokio::select! {
                event = events.recv() => {
                    match event {
                        Some(event) => dispatch(&channel, &mut narrator, &event).await,
                        None => {
                            tracing::warn!("chat connection closed");
                            break;
                        }
                    }
                }
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("interrupted, shutting down");
                    break;
                }
            }
        }

        channel.disconnect().await?;
        Ok(())
    }
}

/// Handle one chat event: command replies, spam drop, narration
pub async fn dispatch(channel: &dyn Channel, narrator: &mut Narrator, event: &ChatEvent) {
    if let ChatEvent::Message {
        sender_name, text, ..
    } = event
    {
        match text.trim() {
            "!ping" => reply(channel, "Pong!".to_string()).await,
            "!dice" => {
                let roll = rand::thread_rng().gen_range(1..=6);
                reply(channel, format!("@{sender_name} rolled a {roll}")).await;
            }
            _ => {}
        }

        if is_spam(text) {
            tracing::info!(sender = %sender_name, "dropped spam message");
            return;
        }
    }

    narrator.handle_event(event);
}

/// Send a reply, logging instead of propagating failures
async fn reply(channel: &dyn Channel, content: String) {
    if let Err(e) = channel.send(OutgoingMessage::text(content)).await {
        tracing::warn!(error = %e, "failed to send chat reply");
    }
}

/// Known spam patterns
pub fn is_spam(text: &str) -> bool {
    static FOLLOWS: OnceLock<Regex> = OnceLock::new();
    static FAMOUS: OnceLock<Regex> = OnceLock::new();
    static BUY: OnceLock<Regex> = OnceLock::new();

    let follows =
        FOLLOWS.get_or_init(|| Regex::new(r"(?i)bigfollows\s*.\s*com").expect("valid pattern"));
    let famous = FAMOUS.get_or_init(|| Regex::new(r"(?i)become famous").expect("valid pattern"));
    let buy = BUY.get_or_init(|| Regex::new(r"(?i)buy").expect("valid pattern"));

    if follows.is_match(text) {
        return true;
    }

    famous.is_match(text) && buy.is_match(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_follower_shop_spam() {
        assert!(is_spam("get viewers at bigfollows . com"));
        assert!(is_spam("BIGFOLLOWS.COM cheap"));
    }

    #[test]
    fn flags_fame_spam_only_with_buy() {
        assert!(is_spam("Become famous! Buy followers now"));
        assert!(!is_spam("you will become famous one day"));
        assert!(!is_spam("buy my album"));
    }

    #[test]
    fn passes_normal_chat() {
        assert!(!is_spam("hello everyone"));
        assert!(!is_spam("!dice"));
    }
}
