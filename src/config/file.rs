//! TOML configuration file loading
//!
//! Supports `~/.config/chat-narrator/config.toml` as a persistent config
//! source. All fields are optional — the file is a partial overlay on top
//! of defaults.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Top-level TOML configuration file schema
#[derive(Debug, Default, Deserialize)]
pub struct NarratorConfigFile {
    /// TTS provider ("openai" or "elevenlabs")
    #[serde(default)]
    pub provider: Option<String>,

    /// API keys for TTS providers
    #[serde(default)]
    pub api_keys: ApiKeysFileConfig,

    /// Twitch chat configuration
    #[serde(default)]
    pub twitch: TwitchFileConfig,

    /// Voice assignment and playback configuration
    #[serde(default)]
    pub voice: VoiceFileConfig,
}

/// API keys configuration
#[derive(Debug, Default, Deserialize)]
pub struct ApiKeysFileConfig {
    pub openai: Option<String>,
    pub elevenlabs: Option<String>,
}

/// Twitch chat configuration
#[derive(Debug, Default, Deserialize)]
pub struct TwitchFileConfig {
    /// Channel to join (without the leading '#')
    pub channel: Option<String>,

    /// Bot nick; anonymous read-only login when omitted
    pub nick: Option<String>,

    /// OAuth token ("oauth:...")
    pub token: Option<String>,
}

/// Voice assignment and playback configuration
#[derive(Debug, Default, Deserialize)]
pub struct VoiceFileConfig {
    /// Pause between utterances in milliseconds
    pub pause_ms: Option<u64>,

    /// TTS speed multiplier (OpenAI only)
    pub speed: Option<f32>,

    /// OpenAI TTS model (e.g. "tts-1")
    pub openai_model: Option<String>,

    /// ElevenLabs TTS model (e.g. "eleven_monolingual_v1")
    pub elevenlabs_model: Option<String>,

    /// Speakers that are never voiced (bots)
    pub ignore: Option<Vec<String>>,

    /// Per-provider speaker → voice pinning tables
    #[serde(default)]
    pub pinned: HashMap<String, HashMap<String, String>>,
}

/// Load the TOML config file from the given path
///
/// Returns `NarratorConfigFile::default()` if the file doesn't exist or
/// can't be parsed.
pub fn load_config_file(path: &Path) -> NarratorConfigFile {
    if !path.exists() {
        return NarratorConfigFile::default();
    }

    match std::fs::read_to_string(path) {
        Ok(content) => match toml::from_str(&content) {
            Ok(config) => {
                tracing::info!(path = %path.display(), "loaded config file");
                config
            }
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "failed to parse config file, using defaults"
                );
                NarratorConfigFile::default()
            }
        },
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "failed to read config file"
            );
            NarratorConfigFile::default()
        }
    }
}

/// Return the default config file path: `~/.config/chat-narrator/config.toml`
pub fn config_file_path() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|d| d.config_dir().join("chat-narrator").join("config.toml"))
}
