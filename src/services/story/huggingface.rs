//! Адаптер HuggingFace Inference API для генерации историй

use async_trait::async_trait;
use log::{debug, info};
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

use crate::errors::{AppError, AppResult, ProviderCallError, ProviderErrorKind};
use crate::models::GenerationRequest;
use crate::services::story::{build_story_prompt, TextGenerator};

const API_BASE: &str = "https://api-inference.huggingface.co/models";

#[derive(Debug, Deserialize)]
struct GeneratedText {
    generated_text: String,
}

/// Клиент для работы с HuggingFace Inference API
pub struct HuggingFaceGenerator {
    client: Client,
    api_key: String,
    model: String,
}

impl HuggingFaceGenerator {
    pub fn new(api_key: &str) -> AppResult<Self> {
        if api_key.is_empty() {
            return Err(AppError::Configuration(
                "HuggingFace API key is required".to_string(),
            ));
        }
        Ok(Self {
            client: Client::new(),
            api_key: api_key.to_string(),
            model: "mistralai/Mistral-7B-Instruct-v0.3".to_string(),
        })
    }
}

#[async_trait]
impl TextGenerator for HuggingFaceGenerator {
    fn provider_id(&self) -> &'static str {
        "huggingface"
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<String, ProviderCallError> {
        info!(
            "Generating story with HuggingFace (request {})",
            request.id
        );

        let (_, max_words) = request.length.target_words();
        let url = format!("{}/{}", API_BASE, self.model);

        let payload = json!({
            "inputs": build_story_prompt(request),
            "parameters": {
                // Грубая оценка: около 1.5 токена на слово
                "max_new_tokens": max_words * 3 / 2,
                "temperature": 0.8,
                "return_full_text": false
            }
        });

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&payload)
            .send()
            .await
            .map_err(|e| ProviderCallError::from_transport(&e))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            debug!("HuggingFace error response ({}): {}", status, error_text);
            return Err(ProviderCallError::from_status(status.as_u16(), error_text));
        }

        let parsed: Vec<GeneratedText> = response.json().await.map_err(|e| {
            ProviderCallError::new(
                ProviderErrorKind::MalformedResponse,
                format!("Failed to parse HuggingFace response: {}", e),
            )
        })?;

        let text = parsed
            .first()
            .map(|g| g.generated_text.trim().to_string())
            .filter(|t| !t.is_empty())
            .ok_or_else(|| {
                ProviderCallError::new(
                    ProviderErrorKind::MalformedResponse,
                    "HuggingFace response contained no generations",
                )
            })?;

        Ok(text)
    }
}
