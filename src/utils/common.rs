//! Common utility functions used across the application

use std::path::Path;

use crate::config::{SpeechEngine, TextProvider};
use crate::errors::{AppError, AppResult};

/// Check if a file exists and has valid content (non-zero size)
pub async fn check_file_exists_and_valid(path: &Path) -> bool {
    if let Ok(metadata) = tokio::fs::metadata(path).await {
        if metadata.is_file() && metadata.len() > 0 {
            return true;
        }
    }
    false
}

/// Collapse all whitespace runs into single spaces and trim the ends
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<&str>>().join(" ")
}

/// Cheap syntactic check of an API key before any network call.
///
/// Catches pasted-with-quotes and truncated keys early; a key that passes
/// can still be rejected remotely (that is `ProviderErrorKind::Auth`).
pub fn validate_text_provider_key(provider: TextProvider, key: &str) -> AppResult<()> {
    let ok = match provider {
        TextProvider::OpenAi => key.starts_with("sk-") && key.len() >= 20,
        TextProvider::Google => key.starts_with("AIza") && key.len() >= 30,
        TextProvider::HuggingFace => key.starts_with("hf_") && key.len() >= 10,
        // Локальный шаблонный провайдер не требует ключа
        TextProvider::Template => true,
    };

    if ok {
        Ok(())
    } else {
        Err(AppError::Configuration(format!(
            "API key for {} has invalid format",
            provider.as_str()
        )))
    }
}

/// Same syntactic check for speech engine credentials
pub fn validate_speech_engine_key(engine: SpeechEngine, key: &str) -> AppResult<()> {
    let ok = match engine {
        SpeechEngine::OpenAi => key.starts_with("sk-") && key.len() >= 20,
        SpeechEngine::ElevenLabs => key.len() >= 20 && key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_'),
    };

    if ok {
        Ok(())
    } else {
        Err(AppError::Configuration(format!(
            "API key for {} has invalid format",
            engine.as_str()
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_whitespace() {
        assert_eq!(normalize_whitespace("  a\t b\n\nc "), "a b c");
        assert_eq!(normalize_whitespace(""), "");
    }

    #[test]
    fn test_openai_key_format() {
        assert!(validate_text_provider_key(
            TextProvider::OpenAi,
            "sk-abcdefghijklmnopqrstuvwx"
        )
        .is_ok());
        assert!(validate_text_provider_key(TextProvider::OpenAi, "sk-short").is_err());
        assert!(validate_text_provider_key(TextProvider::OpenAi, "pk-abcdefghijklmnopqrst").is_err());
    }

    #[test]
    fn test_huggingface_and_google_key_formats() {
        assert!(validate_text_provider_key(TextProvider::HuggingFace, "hf_abcdefghij").is_ok());
        assert!(validate_text_provider_key(TextProvider::HuggingFace, "abcdefghij").is_err());
        assert!(validate_text_provider_key(
            TextProvider::Google,
            "AIzaSyA1234567890abcdefghijklmnop"
        )
        .is_ok());
        assert!(validate_text_provider_key(TextProvider::Google, "AIza-too-short").is_err());
    }

    #[test]
    fn test_template_provider_needs_no_key() {
        assert!(validate_text_provider_key(TextProvider::Template, "").is_ok());
    }
}
