//! Configuration management for the narrator

pub mod file;

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::time::Duration;

use crate::{Error, Result};

/// Default pause between utterances
pub const DEFAULT_PAUSE: Duration = Duration::from_millis(1500);

/// TTS provider selection
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Provider {
    /// `OpenAI` speech API
    #[default]
    OpenAi,
    /// ElevenLabs speech API
    ElevenLabs,
}

impl Provider {
    /// Parse a provider name as written in config
    ///
    /// # Errors
    ///
    /// Returns error for an unrecognized provider name
    pub fn parse(name: &str) -> Result<Self> {
        match name.to_lowercase().as_str() {
            "openai" => Ok(Self::OpenAi),
            "elevenlabs" => Ok(Self::ElevenLabs),
            other => Err(Error::Config(format!(
                "unknown TTS provider '{other}' (expected \"openai\" or \"elevenlabs\")"
            ))),
        }
    }

    /// Config/table key for this provider
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::OpenAi => "openai",
            Self::ElevenLabs => "elevenlabs",
        }
    }
}

/// Narrator configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Active TTS provider
    pub provider: Provider,

    /// API keys for TTS providers
    pub api_keys: ApiKeys,

    /// Twitch chat configuration
    pub twitch: TwitchConfig,

    /// Voice assignment and playback configuration
    pub voice: VoiceConfig,
}

/// API keys for external services
#[derive(Debug, Clone, Default)]
pub struct ApiKeys {
    /// `OpenAI` API key
    pub openai: Option<String>,

    /// ElevenLabs API key
    pub elevenlabs: Option<String>,
}

/// Twitch chat configuration
#[derive(Debug, Clone, Default)]
pub struct TwitchConfig {
    /// Channel to join (without the leading '#')
    pub channel: String,

    /// Bot nick; anonymous read-only login when `None`
    pub nick: Option<String>,

    /// OAuth token ("oauth:...")
    pub token: Option<String>,
}

/// Voice assignment and playback configuration
#[derive(Debug, Clone)]
pub struct VoiceConfig {
    /// Pause between utterances
    pub pause: Duration,

    /// TTS speed multiplier (`OpenAI` only)
    pub speed: f32,

    /// TTS model for the active provider
    pub model: String,

    /// Speaker → voice pinning table for the active provider
    pub pinned: HashMap<String, String>,

    /// Speakers that are never voiced (bots)
    pub ignore: HashSet<String>,
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            pause: DEFAULT_PAUSE,
            speed: 1.0,
            model: "tts-1".to_string(),
            pinned: HashMap::new(),
            ignore: HashSet::new(),
        }
    }
}

impl Config {
    /// Load configuration from the default file path plus environment
    ///
    /// # Errors
    ///
    /// Returns error if the resolved configuration is invalid
    pub fn load() -> Result<Self> {
        let path = file::config_file_path()
            .ok_or_else(|| Error::Config("could not determine config directory".to_string()))?;
        Self::load_from(&path)
    }

    /// Load configuration from an explicit file path plus environment
    ///
    /// Environment variables override file values:
    /// `NARRATOR_PROVIDER`, `NARRATOR_TWITCH_CHANNEL`, `NARRATOR_TWITCH_NICK`,
    /// `NARRATOR_TWITCH_TOKEN`, `OPENAI_API_KEY`, `ELEVENLABS_API_KEY`.
    ///
    /// # Errors
    ///
    /// Returns error if the resolved configuration is invalid
    pub fn load_from(path: &Path) -> Result<Self> {
        let file = file::load_config_file(path);

        let provider = match env_var("NARRATOR_PROVIDER").or(file.provider) {
            Some(name) => Provider::parse(&name)?,
            None => Provider::default(),
        };

        let api_keys = ApiKeys {
            openai: env_var("OPENAI_API_KEY").or(file.api_keys.openai),
            elevenlabs: env_var("ELEVENLABS_API_KEY").or(file.api_keys.elevenlabs),
        };

        let twitch = TwitchConfig {
            channel: env_var("NARRATOR_TWITCH_CHANNEL")
                .or(file.twitch.channel)
                .map(|c| c.trim_start_matches('#').to_lowercase())
                .unwrap_or_default(),
            nick: env_var("NARRATOR_TWITCH_NICK").or(file.twitch.nick),
            token: env_var("NARRATOR_TWITCH_TOKEN").or(file.twitch.token),
        };

        let defaults = VoiceConfig::default();
        let model = match provider {
            Provider::OpenAi => file
                .voice
                .openai_model
                .unwrap_or_else(|| defaults.model.clone()),
            Provider::ElevenLabs => file
                .voice
                .elevenlabs_model
                .unwrap_or_else(|| "eleven_monolingual_v1".to_string()),
        };

        let voice = VoiceConfig {
            pause: file
                .voice
                .pause_ms
                .map_or(DEFAULT_PAUSE, Duration::from_millis),
            speed: file.voice.speed.unwrap_or(defaults.speed),
            model,
            pinned: file
                .voice
                .pinned
                .get(provider.key())
                .cloned()
                .unwrap_or_default(),
            ignore: file
                .voice
                .ignore
                .unwrap_or_default()
                .into_iter()
                .map(|s| s.to_lowercase())
                .collect(),
        };

        Ok(Self {
            provider,
            api_keys,
            twitch,
            voice,
        })
    }

    /// API key for the active provider
    ///
    /// # Errors
    ///
    /// Returns error if no key is configured for the active provider
    pub fn active_api_key(&self) -> Result<&str> {
        let key = match self.provider {
            Provider::OpenAi => self.api_keys.openai.as_deref(),
            Provider::ElevenLabs => self.api_keys.elevenlabs.as_deref(),
        };
        key.ok_or_else(|| {
            Error::Config(format!(
                "no API key configured for provider '{}'",
                self.provider.key()
            ))
        })
    }
}

/// Read an environment variable, treating empty values as unset
fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_parse_accepts_known_names() {
        assert_eq!(Provider::parse("openai").unwrap(), Provider::OpenAi);
        assert_eq!(Provider::parse("ElevenLabs").unwrap(), Provider::ElevenLabs);
        assert!(Provider::parse("google").is_err());
    }

    #[test]
    fn load_from_missing_file_uses_defaults() {
        let config = Config::load_from(Path::new("/nonexistent/config.toml")).unwrap();
        assert_eq!(config.voice.pause, DEFAULT_PAUSE);
        assert!(config.voice.pinned.is_empty());
    }

    #[test]
    fn pinned_table_follows_active_provider() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
provider = "elevenlabs"

[voice.pinned.openai]
alice = "onyx"

[voice.pinned.elevenlabs]
alice = "Rachel"
"#,
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.provider, Provider::ElevenLabs);
        assert_eq!(config.voice.pinned.get("alice").unwrap(), "Rachel");
    }
}
