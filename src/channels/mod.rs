//! Chat channel adapters
//!
//! Each channel implements the `Channel` trait and forwards chat activity
//! as `ChatEvent`s into an `mpsc` channel owned by the daemon.

mod twitch;

use async_trait::async_trait;

pub use twitch::TwitchChannel;

use crate::Result;

/// An event observed on a chat channel
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatEvent {
    /// A regular chat message
    Message {
        /// Stable sender identifier (login name)
        sender_id: String,
        /// Sender display name
        sender_name: String,
        /// Message content
        text: String,
    },

    /// A new subscription
    Subscription {
        /// Subscribing user's display name
        user: String,
    },

    /// A resubscription
    Resub {
        /// Resubscribing user's display name
        user: String,
        /// Cumulative months subscribed
        months: u32,
    },

    /// A gifted subscription
    GiftSub {
        /// Gifting user's display name
        gifter: String,
        /// Recipient's display name
        recipient: String,
    },

    /// An incoming raid
    Raid {
        /// Raiding channel's display name
        raider: String,
        /// Size of the raiding party
        viewers: u32,
    },
}

/// A message to send back to a chat channel
#[derive(Debug, Clone)]
pub struct OutgoingMessage {
    /// Message content (plain text)
    pub content: String,
}

impl OutgoingMessage {
    /// Create a simple text message
    #[must_use]
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
        }
    }
}

/// Trait for chat channel adapters
#[async_trait]
pub trait Channel: Send + Sync {
    /// Get the channel name
    fn name(&self) -> &'static str;

    /// Connect to the channel
    async fn connect(&mut self) -> Result<()>;

    /// Disconnect from the channel
    async fn disconnect(&mut self) -> Result<()>;

    /// Send a message to the channel
    async fn send(&self, message: OutgoingMessage) -> Result<()>;

    /// Check if the channel is connected
    fn is_connected(&self) -> bool {
        false
    }
}
