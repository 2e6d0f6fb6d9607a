//! Адаптер Google Gemini (generateContent) для генерации историй

use async_trait::async_trait;
use log::{debug, info};
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

use crate::errors::{AppError, AppResult, ProviderCallError, ProviderErrorKind};
use crate::models::GenerationRequest;
use crate::services::story::{build_story_prompt, TextGenerator};

const API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Content,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    #[serde(default)]
    text: String,
}

/// Клиент для работы с Google AI
pub struct GoogleGenerator {
    client: Client,
    api_key: String,
    model: String,
}

impl GoogleGenerator {
    pub fn new(api_key: &str) -> AppResult<Self> {
        if api_key.is_empty() {
            return Err(AppError::Configuration(
                "Google API key is required".to_string(),
            ));
        }
        Ok(Self {
            client: Client::new(),
            api_key: api_key.to_string(),
            model: "gemini-1.5-flash".to_string(),
        })
    }
}

#[async_trait]
impl TextGenerator for GoogleGenerator {
    fn provider_id(&self) -> &'static str {
        "google"
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<String, ProviderCallError> {
        info!("Generating story with Google AI (request {})", request.id);

        let url = format!(
            "{}/{}:generateContent?key={}",
            API_BASE, self.model, self.api_key
        );

        let payload = json!({
            "contents": [{
                "parts": [{ "text": build_story_prompt(request) }]
            }],
            "generationConfig": {
                "temperature": 0.8
            }
        });

        let response = self
            .client
            .post(&url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| ProviderCallError::from_transport(&e))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            debug!("Google AI error response ({}): {}", status, error_text);
            return Err(ProviderCallError::from_status(status.as_u16(), error_text));
        }

        let parsed: GenerateContentResponse = response.json().await.map_err(|e| {
            ProviderCallError::new(
                ProviderErrorKind::MalformedResponse,
                format!("Failed to parse Google AI response: {}", e),
            )
        })?;

        let text = parsed
            .candidates
            .first()
            .and_then(|c| c.content.parts.first())
            .map(|p| p.text.trim().to_string())
            .filter(|t| !t.is_empty())
            .ok_or_else(|| {
                ProviderCallError::new(
                    ProviderErrorKind::MalformedResponse,
                    "Google AI response contained no candidates",
                )
            })?;

        Ok(text)
    }
}
