//! Адаптер ElevenLabs TTS API

use std::path::Path;

use async_trait::async_trait;
use log::{debug, info};
use reqwest::Client;
use serde_json::json;

use crate::errors::{AppError, AppResult, ProviderCallError, ProviderErrorKind};
use crate::models::VoiceSettings;
use crate::services::tts::SpeechSynthesizer;

const API_BASE: &str = "https://api.elevenlabs.io/v1/text-to-speech";

/// Клиент для работы с ElevenLabs TTS API
pub struct ElevenLabsSpeech {
    client: Client,
    api_key: String,
    model_id: String,
}

impl ElevenLabsSpeech {
    pub fn new(api_key: &str) -> AppResult<Self> {
        if api_key.is_empty() {
            return Err(AppError::Configuration(
                "ElevenLabs API key is required".to_string(),
            ));
        }
        Ok(Self {
            client: Client::new(),
            api_key: api_key.to_string(),
            model_id: "eleven_multilingual_v2".to_string(),
        })
    }
}

#[async_trait]
impl SpeechSynthesizer for ElevenLabsSpeech {
    fn engine_id(&self) -> &'static str {
        "elevenlabs"
    }

    async fn synthesize_chunk(
        &self,
        text: &str,
        settings: &VoiceSettings,
        output_path: &Path,
    ) -> Result<(), ProviderCallError> {
        info!("Generating speech using ElevenLabs");

        let url = format!("{}/{}", API_BASE, settings.voice_id);
        let response = self
            .client
            .post(&url)
            .header("xi-api-key", self.api_key.clone())
            .header("Accept", "audio/mpeg")
            .json(&json!({
                "text": text,
                "model_id": self.model_id,
                "voice_settings": {
                    "stability": 0.5,
                    "similarity_boost": 0.75
                }
            }))
            .send()
            .await
            .map_err(|e| ProviderCallError::from_transport(&e))?;

        let status = response.status();
        if !status.is_success() {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok());
            let error_text = response.text().await.unwrap_or_default();
            debug!("ElevenLabs error response ({}): {}", status, error_text);

            let mut error = ProviderCallError::from_status(status.as_u16(), error_text);
            if let Some(secs) = retry_after {
                error = error.with_retry_after(secs);
            }
            return Err(error);
        }

        let bytes: bytes::Bytes = response
            .bytes()
            .await
            .map_err(|e| ProviderCallError::from_transport(&e))?;
        if bytes.is_empty() {
            return Err(ProviderCallError::new(
                ProviderErrorKind::MalformedResponse,
                "ElevenLabs returned an empty audio body",
            ));
        }

        tokio::fs::write(output_path, &bytes).await.map_err(|e| {
            ProviderCallError::new(
                ProviderErrorKind::Unavailable,
                format!("Failed to save audio to {}: {}", output_path.display(), e),
            )
        })?;

        Ok(())
    }
}
