//! Twitch chat channel adapter
//!
//! Speaks the Twitch IRC dialect over a plain TCP connection. Requests the
//! `tags` and `commands` capabilities so subscription/raid notices arrive
//! as USERNOTICE lines with message tags.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::net::tcp::OwnedWriteHalf;
use tokio::sync::{Mutex, mpsc};

use super::{Channel, ChatEvent, OutgoingMessage};
use crate::config::TwitchConfig;
use crate::{Error, Result};

/// Twitch IRC endpoint (plaintext port)
const TWITCH_IRC_ADDR: &str = "irc.chat.twitch.tv:6667";

/// Capacity of the outgoing event channel
const EVENT_BUFFER: usize = 256;

/// Twitch chat channel adapter
pub struct TwitchChannel {
    /// Channel to join, without the leading '#'
    channel: String,
    nick: String,
    token: Option<String>,
    event_tx: mpsc::Sender<ChatEvent>,
    writer: Arc<Mutex<Option<OwnedWriteHalf>>>,
    connected: Arc<AtomicBool>,
    reader_task: Option<tokio::task::JoinHandle<()>>,
}

impl TwitchChannel {
    /// Create a Twitch channel adapter and the receiver for its events
    ///
    /// With no token configured the adapter logs in anonymously
    /// (`justinfan` nick) and is read-only.
    #[must_use]
    pub fn with_receiver(config: &TwitchConfig) -> (Self, mpsc::Receiver<ChatEvent>) {
        let (tx, rx) = mpsc::channel(EVENT_BUFFER);

        let nick = match (&config.nick, &config.token) {
            (Some(nick), Some(_)) => nick.to_lowercase(),
            _ => format!("justinfan{}", rand::random::<u16>()),
        };

        let channel = Self {
            channel: config.channel.clone(),
            nick,
            token: config.token.clone(),
            event_tx: tx,
            writer: Arc::new(Mutex::new(None)),
            connected: Arc::new(AtomicBool::new(false)),
            reader_task: None,
        };
        (channel, rx)
    }

    /// Whether this adapter logged in anonymously (read-only)
    #[must_use]
    pub fn is_anonymous(&self) -> bool {
        self.token.is_none()
    }

    async fn write_line(writer: &Mutex<Option<OwnedWriteHalf>>, line: &str) -> Result<()> {
        let mut guard = writer.lock().await;
        let w = guard
            .as_mut()
            .ok_or_else(|| Error::Channel("twitch: not connected".to_string()))?;
        w.write_all(line.as_bytes()).await?;
        w.write_all(b"\r\n").await?;
        Ok(())
    }
}

#[async_trait]
impl Channel for TwitchChannel {
    fn name(&self) -> &'static str {
        "twitch"
    }

    async fn connect(&mut self) -> Result<()> {
        if self.channel.is_empty() {
            return Err(Error::Channel("twitch: no channel configured".to_string()));
        }

        tracing::info!(channel = %self.channel, nick = %self.nick, "twitch: connecting");

        let stream = TcpStream::connect(TWITCH_IRC_ADDR).await?;
        let (read_half, write_half) = stream.into_split();
        *self.writer.lock().await = Some(write_half);

        Self::write_line(&self.writer, "CAP REQ :twitch.tv/tags twitch.tv/commands").await?;
        if let Some(token) = &self.token {
            Self::write_line(&self.writer, &format!("PASS {token}")).await?;
        }
        Self::write_line(&self.writer, &format!("NICK {}", self.nick)).await?;
        Self::write_line(&self.writer, &format!("JOIN #{}", self.channel)).await?;

        self.connected.store(true, Ordering::SeqCst);

        let tx = self.event_tx.clone();
        let writer = Arc::clone(&self.writer);
        let connected = Arc::clone(&self.connected);

        self.reader_task = Some(tokio::spawn(async move {
            let mut lines = BufReader::new(read_half).lines();

            loop {
                match lines.next_line().await {
                    Ok(Some(line)) => {
                        let Some(msg) = parse_line(&line) else {
                            continue;
                        };

                        if msg.command == "PING" {
                            let payload = msg.params.first().map(String::as_str).unwrap_or("");
                            if let Err(e) =
                                Self::write_line(&writer, &format!("PONG :{payload}")).await
                            {
                                tracing::warn!(error = %e, "twitch: failed to answer PING");
                            }
                            continue;
                        }

                        if let Some(event) = msg.into_event() {
                            if tx.send(event).await.is_err() {
                                // Receiver dropped; daemon is shutting down
                                break;
                            }
                        }
                    }
                    Ok(None) => {
                        tracing::warn!("twitch: connection closed by server");
                        break;
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "twitch: read error");
                        break;
                    }
                }
            }

            connected.store(false, Ordering::SeqCst);
        }));

        tracing::info!(channel = %self.channel, "twitch: connected");
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<()> {
        if let Some(task) = self.reader_task.take() {
            task.abort();
        }
        *self.writer.lock().await = None;
        self.connected.store(false, Ordering::SeqCst);
        Ok(())
    }

    async fn send(&self, message: OutgoingMessage) -> Result<()> {
        if self.is_anonymous() {
            return Err(Error::Channel(
                "twitch: cannot send with anonymous login".to_string(),
            ));
        }
        Self::write_line(
            &self.writer,
            &format!("PRIVMSG #{} :{}", self.channel, message.content),
        )
        .await
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }
}

/// A parsed IRC line
#[derive(Debug)]
struct IrcMessage {
    tags: HashMap<String, String>,
    /// Sender login, extracted from the `nick!user@host` prefix
    sender: Option<String>,
    command: String,
    /// Middle params followed by the trailing param, if any
    params: Vec<String>,
}

impl IrcMessage {
    /// Message tag by key
    fn tag(&self, key: &str) -> Option<&str> {
        self.tags.get(key).map(String::as_str)
    }

    /// Trailing parameter (message text)
    fn trailing(&self) -> Option<&str> {
        self.params.last().map(String::as_str)
    }

    /// Convert a PRIVMSG or USERNOTICE into a `ChatEvent`
    fn into_event(self) -> Option<ChatEvent> {
        match self.command.as_str() {
            "PRIVMSG" => {
                let sender_id = self.sender.clone()?;
                let sender_name = self
                    .tag("display-name")
                    .filter(|n| !n.is_empty())
                    .unwrap_or(&sender_id)
                    .to_string();
                let text = self.trailing()?.to_string();
                Some(ChatEvent::Message {
                    sender_id,
                    sender_name,
                    text,
                })
            }
            "USERNOTICE" => {
                let user = self
                    .tag("display-name")
                    .filter(|n| !n.is_empty())
                    .or_else(|| self.tag("login"))?
                    .to_string();

                match self.tag("msg-id")? {
                    "sub" => Some(ChatEvent::Subscription { user }),
                    "resub" => Some(ChatEvent::Resub {
                        months: self
                            .tag("msg-param-cumulative-months")
                            .and_then(|m| m.parse().ok())
                            .unwrap_or(1),
                        user,
                    }),
                    "subgift" => Some(ChatEvent::GiftSub {
                        recipient: self.tag("msg-param-recipient-display-name")?.to_string(),
                        gifter: user,
                    }),
                    "raid" => Some(ChatEvent::Raid {
                        viewers: self
                            .tag("msg-param-viewerCount")
                            .and_then(|v| v.parse().ok())
                            .unwrap_or(0),
                        raider: self
                            .tag("msg-param-displayName")
                            .filter(|n| !n.is_empty())
                            .map_or(user, ToString::to_string),
                    }),
                    _ => None,
                }
            }
            _ => None,
        }
    }
}

/// Parse one raw IRC line into its tags, prefix, command and params
fn parse_line(line: &str) -> Option<IrcMessage> {
    let mut rest = line.trim_end();
    if rest.is_empty() {
        return None;
    }

    let mut tags = HashMap::new();
    if let Some(stripped) = rest.strip_prefix('@') {
        let (raw_tags, remainder) = stripped.split_once(' ')?;
        for tag in raw_tags.split(';') {
            match tag.split_once('=') {
                Some((key, value)) => tags.insert(key.to_string(), unescape_tag(value)),
                None => tags.insert(tag.to_string(), String::new()),
            };
        }
        rest = remainder;
    }

    let mut sender = None;
    if let Some(stripped) = rest.strip_prefix(':') {
        let (prefix, remainder) = stripped.split_once(' ')?;
        sender = Some(
            prefix
                .split_once('!')
                .map_or(prefix, |(nick, _)| nick)
                .to_string(),
        );
        rest = remainder;
    }

    let (command, raw_params) = match rest.split_once(' ') {
        Some((cmd, params)) => (cmd.to_string(), params),
        None => (rest.to_string(), ""),
    };

    let mut params = Vec::new();
    let raw_params = raw_params.trim_start();
    if let Some(trailing) = raw_params.strip_prefix(':') {
        params.push(trailing.to_string());
    } else if let Some((middles, trailing)) = raw_params.split_once(" :") {
        params.extend(middles.split_whitespace().map(ToString::to_string));
        params.push(trailing.to_string());
    } else if !raw_params.is_empty() {
        params.extend(raw_params.split_whitespace().map(ToString::to_string));
    }

    Some(IrcMessage {
        tags,
        sender,
        command,
        params,
    })
}

/// Undo IRCv3 tag value escaping
fn unescape_tag(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some('s') => out.push(' '),
                Some(':') => out.push(';'),
                Some('r') => out.push('\r'),
                Some('n') => out.push('\n'),
                Some(other) => out.push(other),
                None => {}
            }
        } else {
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_privmsg_with_tags() {
        let line = "@badge-info=;display-name=Alice;mod=0 :alice!alice@alice.tmi.twitch.tv PRIVMSG #somechannel :hello world";
        let event = parse_line(line).unwrap().into_event().unwrap();

        assert_eq!(
            event,
            ChatEvent::Message {
                sender_id: "alice".to_string(),
                sender_name: "Alice".to_string(),
                text: "hello world".to_string(),
            }
        );
    }

    #[test]
    fn privmsg_without_display_name_falls_back_to_login() {
        let line = ":bob!bob@bob.tmi.twitch.tv PRIVMSG #chan :hi";
        let event = parse_line(line).unwrap().into_event().unwrap();

        let ChatEvent::Message { sender_name, .. } = event else {
            panic!("expected message event");
        };
        assert_eq!(sender_name, "bob");
    }

    #[test]
    fn parses_ping() {
        let msg = parse_line("PING :tmi.twitch.tv").unwrap();
        assert_eq!(msg.command, "PING");
        assert_eq!(msg.trailing(), Some("tmi.twitch.tv"));
    }

    #[test]
    fn parses_resub_notice() {
        let line = "@msg-id=resub;display-name=Carol;msg-param-cumulative-months=7 :tmi.twitch.tv USERNOTICE #chan :seven months!";
        let event = parse_line(line).unwrap().into_event().unwrap();

        assert_eq!(
            event,
            ChatEvent::Resub {
                user: "Carol".to_string(),
                months: 7,
            }
        );
    }

    #[test]
    fn parses_subgift_notice() {
        let line = "@msg-id=subgift;display-name=Dan;msg-param-recipient-display-name=Erin :tmi.twitch.tv USERNOTICE #chan";
        let event = parse_line(line).unwrap().into_event().unwrap();

        assert_eq!(
            event,
            ChatEvent::GiftSub {
                gifter: "Dan".to_string(),
                recipient: "Erin".to_string(),
            }
        );
    }

    #[test]
    fn parses_raid_notice() {
        let line = "@msg-id=raid;display-name=Fay;msg-param-displayName=Fay;msg-param-viewerCount=42 :tmi.twitch.tv USERNOTICE #chan";
        let event = parse_line(line).unwrap().into_event().unwrap();

        assert_eq!(
            event,
            ChatEvent::Raid {
                raider: "Fay".to_string(),
                viewers: 42,
            }
        );
    }

    #[test]
    fn unescapes_tag_values() {
        assert_eq!(unescape_tag(r"hello\sworld"), "hello world");
        assert_eq!(unescape_tag(r"a\:b"), "a;b");
        assert_eq!(unescape_tag(r"back\\slash"), r"back\slash");
    }

    #[test]
    fn ignores_unrelated_commands() {
        let msg = parse_line(":tmi.twitch.tv 001 nick :Welcome, GLHF!").unwrap();
        assert!(msg.into_event().is_none());
    }
}
