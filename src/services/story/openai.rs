//! Адаптер OpenAI chat completions для генерации историй

use async_trait::async_trait;
use log::{debug, info};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::errors::{AppError, AppResult, ProviderCallError, ProviderErrorKind};
use crate::models::GenerationRequest;
use crate::services::story::{build_story_prompt, TextGenerator};

const API_URL: &str = "https://api.openai.com/v1/chat/completions";
const SYSTEM_PROMPT: &str =
    "You are a creative storyteller. You write engaging, well-structured short stories \
     and always begin your answer with the story title on its own line.";

// Chat message structure for OpenAI API
#[derive(Debug, Serialize, Deserialize)]
struct Message {
    role: String,
    content: String,
}

// OpenAI API request
#[derive(Debug, Serialize)]
struct CompletionRequest {
    model: String,
    messages: Vec<Message>,
    temperature: f32,
}

// OpenAI API response
#[derive(Debug, Deserialize)]
struct ChatCompletion {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Message,
}

/// Клиент для работы с OpenAI chat completions
pub struct OpenAiGenerator {
    client: Client,
    api_key: String,
    model: String,
}

impl OpenAiGenerator {
    pub fn new(api_key: &str) -> AppResult<Self> {
        if api_key.is_empty() {
            return Err(AppError::Configuration(
                "OpenAI API key is required".to_string(),
            ));
        }
        Ok(Self {
            client: Client::new(),
            api_key: api_key.to_string(),
            model: "gpt-4o-mini".to_string(),
        })
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }
}

#[async_trait]
impl TextGenerator for OpenAiGenerator {
    fn provider_id(&self) -> &'static str {
        "openai"
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<String, ProviderCallError> {
        info!("Generating story with OpenAI (request {})", request.id);

        let payload = CompletionRequest {
            model: self.model.clone(),
            messages: vec![
                Message {
                    role: "system".to_string(),
                    content: SYSTEM_PROMPT.to_string(),
                },
                Message {
                    role: "user".to_string(),
                    content: build_story_prompt(request),
                },
            ],
            temperature: 0.8,
        };

        let response = self
            .client
            .post(API_URL)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&payload)
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
            debug!("OpenAI error response ({}): {}", status, error_text);

            let mut error = ProviderCallError::from_status(status.as_u16(), error_text);
            if let Some(secs) = retry_after {
                error = error.with_retry_after(secs);
            }
            return Err(error);
        }

        let completion: ChatCompletion = response.json().await.map_err(|e| {
            ProviderCallError::new(
                ProviderErrorKind::MalformedResponse,
                format!("Failed to parse OpenAI response: {}", e),
            )
        })?;

        let text = completion
            .choices
            .first()
            .map(|c| c.message.content.trim().to_string())
            .filter(|t| !t.is_empty())
            .ok_or_else(|| {
                ProviderCallError::new(
                    ProviderErrorKind::MalformedResponse,
                    "OpenAI response contained no choices",
                )
            })?;

        Ok(text)
    }
}
