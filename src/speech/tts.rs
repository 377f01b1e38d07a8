//! Text-to-speech HTTP clients

use crate::config::{Config, Provider};
use crate::speech::voices::{ELEVENLABS_VOICES, OPENAI_VOICES};
use crate::{Error, Result};

/// A voice known to the configured provider
#[derive(Debug, Clone)]
pub struct VoiceInfo {
    /// Identifier used in synthesis requests
    pub id: String,
    /// Human-readable name
    pub name: String,
}

/// Synthesizes speech from text
pub struct TextToSpeech {
    client: reqwest::Client,
    api_key: String,
    speed: f32,
    model: String,
    provider: Provider,
}

impl TextToSpeech {
    /// Create a TTS client from configuration
    ///
    /// # Errors
    ///
    /// Returns error if no API key is configured for the active provider
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self {
            client: reqwest::Client::new(),
            api_key: config.active_api_key()?.to_string(),
            speed: config.voice.speed,
            model: config.voice.model.clone(),
            provider: config.provider,
        })
    }

    /// Synthesize text to speech with the given voice
    ///
    /// # Returns
    ///
    /// Audio bytes (MP3 format)
    ///
    /// # Errors
    ///
    /// Returns error if synthesis fails
    pub async fn synthesize(&self, text: &str, voice: &str) -> Result<Vec<u8>> {
        if text.is_empty() {
            return Err(Error::Tts("cannot synthesize empty text".to_string()));
        }

        match self.provider {
            Provider::OpenAi => self.synthesize_openai(text, voice).await,
            Provider::ElevenLabs => self.synthesize_elevenlabs(text, voice).await,
        }
    }

    /// Synthesize using `OpenAI` TTS
    async fn synthesize_openai(&self, text: &str, voice: &str) -> Result<Vec<u8>> {
        #[derive(serde::Serialize)]
        struct TtsRequest<'a> {
            model: &'a str,
            input: &'a str,
            voice: &'a str,
            speed: f32,
        }

        let request = TtsRequest {
            model: &self.model,
            input: text,
            voice,
            speed: self.speed,
        };

        let response = self
            .client
            .post("https://api.openai.com/v1/audio/speech")
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Tts(format!("OpenAI TTS error {status}: {body}")));
        }

        let audio = response.bytes().await?;
        Ok(audio.to_vec())
    }

    /// Synthesize using ElevenLabs TTS
    async fn synthesize_elevenlabs(&self, text: &str, voice: &str) -> Result<Vec<u8>> {
        #[derive(serde::Serialize)]
        struct ElevenLabsRequest<'a> {
            text: &'a str,
            model_id: &'a str,
        }

        let url = format!("https://api.elevenlabs.io/v1/text-to-speech/{voice}");

        let request = ElevenLabsRequest {
            text,
            model_id: &self.model,
        };

        let response = self
            .client
            .post(&url)
            .header("xi-api-key", &self.api_key)
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Tts(format!("ElevenLabs TTS error {status}: {body}")));
        }

        let audio = response.bytes().await?;
        Ok(audio.to_vec())
    }

    /// List the voices the configured provider supports
    ///
    /// `OpenAI` exposes a fixed catalog; ElevenLabs is queried for the
    /// account's voice library.
    ///
    /// # Errors
    ///
    /// Returns error if the provider query fails
    pub async fn list_voices(&self) -> Result<Vec<VoiceInfo>> {
        match self.provider {
            Provider::OpenAi => Ok(OPENAI_VOICES
                .iter()
                .map(|v| VoiceInfo {
                    id: (*v).to_string(),
                    name: (*v).to_string(),
                })
                .collect()),
            Provider::ElevenLabs => self.list_voices_elevenlabs().await,
        }
    }

    /// Query the ElevenLabs voice library
    async fn list_voices_elevenlabs(&self) -> Result<Vec<VoiceInfo>> {
        #[derive(serde::Deserialize)]
        struct VoicesResponse {
            voices: Vec<VoiceEntry>,
        }

        #[derive(serde::Deserialize)]
        struct VoiceEntry {
            voice_id: String,
            name: String,
        }

        let response = self
            .client
            .get("https://api.elevenlabs.io/v1/voices")
            .header("xi-api-key", &self.api_key)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Tts(format!("ElevenLabs voices error {status}: {body}")));
        }

        let parsed: VoicesResponse = response.json().await?;
        if parsed.voices.is_empty() {
            // Account libraries can be empty; the premade set always works
            return Ok(ELEVENLABS_VOICES
                .iter()
                .map(|(id, name)| VoiceInfo {
                    id: (*id).to_string(),
                    name: (*name).to_string(),
                })
                .collect());
        }

        Ok(parsed
            .voices
            .into_iter()
            .map(|v| VoiceInfo {
                id: v.voice_id,
                name: v.name,
            })
            .collect())
    }
}
