// Story generation services module
// Contains implementations of the text-generation providers

use async_trait::async_trait;

use crate::config::{AppConfig, TextProvider};
use crate::errors::{AppResult, ProviderCallError};
use crate::models::GenerationRequest;
use crate::utils::common::validate_text_provider_key;

pub mod chain;
pub mod google;
pub mod huggingface;
pub mod openai;
pub mod template;

pub use chain::FallbackChain;

/// Trait that all text-generation providers must implement
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Stable provider identifier used in results and diagnostics
    fn provider_id(&self) -> &'static str;

    /// Generate story text for the request.
    ///
    /// Expected provider errors come back as a typed `ProviderCallError`,
    /// never as a panic; network faults map to `Unavailable`.
    async fn generate(&self, request: &GenerationRequest) -> Result<String, ProviderCallError>;
}

/// Get the appropriate text generator for a configured provider
pub fn get_text_generator(
    provider: TextProvider,
    config: &AppConfig,
) -> AppResult<Box<dyn TextGenerator>> {
    match provider {
        TextProvider::OpenAi => {
            validate_text_provider_key(provider, &config.openai_api_key)?;
            Ok(Box::new(openai::OpenAiGenerator::new(
                &config.openai_api_key,
            )?))
        }
        TextProvider::Google => {
            validate_text_provider_key(provider, &config.google_api_key)?;
            Ok(Box::new(google::GoogleGenerator::new(
                &config.google_api_key,
            )?))
        }
        TextProvider::HuggingFace => {
            validate_text_provider_key(provider, &config.huggingface_api_key)?;
            Ok(Box::new(huggingface::HuggingFaceGenerator::new(
                &config.huggingface_api_key,
            )?))
        }
        TextProvider::Template => Ok(Box::new(template::TemplateGenerator::new())),
    }
}

/// Build the fallback chain from the configured provider priority order.
///
/// Providers whose credentials fail the syntactic check are skipped with a
/// warning instead of aborting the whole chain; a misconfigured key should
/// degrade to the next provider exactly like a remote auth failure would.
pub fn build_chain(config: &AppConfig) -> AppResult<FallbackChain> {
    let mut providers: Vec<Box<dyn TextGenerator>> = Vec::new();
    for provider in &config.text_providers {
        match get_text_generator(*provider, config) {
            Ok(generator) => providers.push(generator),
            Err(e) => {
                log::warn!(
                    "Skipping text provider {}: {}",
                    provider.as_str(),
                    e
                );
            }
        }
    }

    FallbackChain::new(providers, config.provider_timeout_secs)
}

/// Построение промпта для текстовых провайдеров
pub(crate) fn build_story_prompt(request: &GenerationRequest) -> String {
    let (min_words, max_words) = request.length.target_words();
    format!(
        "Write a {} story about {}. The story should be between {} and {} words long. \
         Start with a title on the first line, then the story text. \
         Use plain prose without markdown formatting.",
        request.genre.as_str(),
        request.subject_text.trim(),
        min_words,
        max_words
    )
}

/// Отделение заголовка от текста истории
///
/// Провайдеры просят вернуть заголовок первой строкой; если ее нет,
/// заголовок синтезируется из жанра и темы.
pub(crate) fn split_title_and_body(raw: &str, request: &GenerationRequest) -> (String, String) {
    let trimmed = raw.trim();
    let mut lines = trimmed.splitn(2, '\n');
    let first = lines.next().unwrap_or("").trim();
    let rest = lines.next().unwrap_or("").trim();

    // Первая строка считается заголовком, только если она короткая
    // и не завершается как предложение
    let looks_like_title = !first.is_empty()
        && first.chars().count() <= 100
        && !rest.is_empty()
        && !first.ends_with(['.', '!', '?']);

    if looks_like_title {
        let title = first.trim_matches(['#', '*', '"', ' ']).to_string();
        (title, rest.to_string())
    } else {
        let title = format!(
            "A {} story about {}",
            request.genre.as_str(),
            request.subject_text.trim()
        );
        (title, trimmed.to_string())
    }
}

/// Подсчет слов в тексте истории
pub(crate) fn count_words(text: &str) -> usize {
    text.split_whitespace().count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Genre, StoryLength};

    fn request() -> GenerationRequest {
        GenerationRequest::new("a dragon", Genre::Fantasy, StoryLength::Short)
    }

    #[test]
    fn test_prompt_mentions_genre_subject_and_length() {
        let prompt = build_story_prompt(&request());
        assert!(prompt.contains("fantasy"));
        assert!(prompt.contains("a dragon"));
        assert!(prompt.contains("150"));
        assert!(prompt.contains("300"));
    }

    #[test]
    fn test_title_extracted_from_first_line() {
        let raw = "The Ember Crown\n\nOnce upon a time there was a dragon.";
        let (title, body) = split_title_and_body(raw, &request());
        assert_eq!(title, "The Ember Crown");
        assert!(body.starts_with("Once upon a time"));
    }

    #[test]
    fn test_title_synthesized_when_text_starts_with_prose() {
        let raw = "Once upon a time there was a dragon.\nIt lived in a cave.";
        let (title, body) = split_title_and_body(raw, &request());
        assert_eq!(title, "A fantasy story about a dragon");
        assert!(body.contains("Once upon a time"));
        assert!(body.contains("cave"));
    }

    #[test]
    fn test_word_count() {
        assert_eq!(count_words("one two  three\nfour"), 4);
        assert_eq!(count_words(""), 0);
    }
}
