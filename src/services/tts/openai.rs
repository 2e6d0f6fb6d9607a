//! Адаптер OpenAI TTS API

use std::path::Path;

use async_trait::async_trait;
use log::{debug, info};
use reqwest::Client;
use serde_json::json;

use crate::errors::{AppError, AppResult, ProviderCallError, ProviderErrorKind};
use crate::models::VoiceSettings;
use crate::services::tts::SpeechSynthesizer;

const API_URL: &str = "https://api.openai.com/v1/audio/speech";

/// Клиент для работы с OpenAI TTS API
pub struct OpenAiSpeech {
    client: Client,
    api_key: String,
    model: String,
}

impl OpenAiSpeech {
    pub fn new(api_key: &str) -> AppResult<Self> {
        if api_key.is_empty() {
            return Err(AppError::Configuration(
                "OpenAI API key is required".to_string(),
            ));
        }
        Ok(Self {
            client: Client::new(),
            api_key: api_key.to_string(),
            model: "tts-1".to_string(),
        })
    }
}

#[async_trait]
impl SpeechSynthesizer for OpenAiSpeech {
    fn engine_id(&self) -> &'static str {
        "openai"
    }

    fn supports_native_speed(&self) -> bool {
        true
    }

    async fn synthesize_chunk(
        &self,
        text: &str,
        settings: &VoiceSettings,
        output_path: &Path,
    ) -> Result<(), ProviderCallError> {
        info!("Generating speech using OpenAI TTS");

        let response = self
            .client
            .post(API_URL)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&json!({
                "model": self.model,
                "voice": settings.voice_id,
                "input": text,
                "response_format": "mp3",
                "speed": settings.speed_multiplier,
            }))
            .send()
            .await
            .map_err(|e| ProviderCallError::from_transport(&e))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            debug!("OpenAI TTS error response ({}): {}", status, error_text);
            return Err(ProviderCallError::from_status(status.as_u16(), error_text));
        }

        let bytes: bytes::Bytes = response
            .bytes()
            .await
            .map_err(|e| ProviderCallError::from_transport(&e))?;
        if bytes.is_empty() {
            return Err(ProviderCallError::new(
                ProviderErrorKind::MalformedResponse,
                "OpenAI TTS returned an empty audio body",
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
