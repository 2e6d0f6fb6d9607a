// Application configuration module
// Provider priorities, timeouts, chunking limits and credentials all live
// here; nothing in the pipeline hard-codes them.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::errors::{AppError, AppResult};
use crate::models::VoiceSettings;

// Доступные текстовые провайдеры
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum TextProvider {
    OpenAi,
    Google,
    HuggingFace,
    Template,
}

impl TextProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OpenAi => "openai",
            Self::Google => "google",
            Self::HuggingFace => "huggingface",
            Self::Template => "template",
        }
    }
}

// Доступные движки синтеза речи
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum SpeechEngine {
    OpenAi,
    ElevenLabs,
}

impl SpeechEngine {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OpenAi => "openai",
            Self::ElevenLabs => "elevenlabs",
        }
    }
}

/// Конфигурация приложения
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    // Учетные данные провайдеров
    #[serde(default)]
    pub openai_api_key: String,
    #[serde(default)]
    pub google_api_key: String,
    #[serde(default)]
    pub huggingface_api_key: String,
    #[serde(default)]
    pub elevenlabs_api_key: String,

    /// Текстовые провайдеры в порядке приоритета
    pub text_providers: Vec<TextProvider>,

    /// Движки синтеза речи в порядке приоритета
    pub speech_engines: Vec<SpeechEngine>,

    /// Таймаут одного вызова провайдера в секундах
    pub provider_timeout_secs: u64,

    /// Максимальная длина фрагмента текста для одного вызова TTS
    pub max_chunk_chars: usize,

    /// Максимальное количество одновременных запросов к TTS API
    pub max_concurrent_requests: usize,

    /// Настройки голоса по умолчанию
    pub default_voice: VoiceSettings,

    /// Использовать кэширование озвучки
    pub use_caching: bool,

    /// Директория для кэша (по умолчанию во временной директории)
    pub cache_dir: Option<PathBuf>,

    /// Максимальный размер кэша в байтах
    pub max_cache_size: Option<u64>,

    /// Директория для готовых артефактов
    pub output_dir: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            openai_api_key: String::new(),
            google_api_key: String::new(),
            huggingface_api_key: String::new(),
            elevenlabs_api_key: String::new(),
            text_providers: vec![
                TextProvider::OpenAi,
                TextProvider::Google,
                TextProvider::HuggingFace,
                TextProvider::Template,
            ],
            speech_engines: vec![SpeechEngine::OpenAi, SpeechEngine::ElevenLabs],
            provider_timeout_secs: 60,
            max_chunk_chars: 400,
            max_concurrent_requests: 5,
            default_voice: VoiceSettings::default(),
            use_caching: true,
            cache_dir: None,
            max_cache_size: Some(1024 * 1024 * 1024), // 1 GB
            output_dir: PathBuf::from("output"),
        }
    }
}

impl AppConfig {
    /// Подхватить ключи API из переменных окружения, если они не заданы
    pub fn apply_env_overrides(&mut self) {
        for (field, var) in [
            (&mut self.openai_api_key, "OPENAI_API_KEY"),
            (&mut self.google_api_key, "GOOGLE_API_KEY"),
            (&mut self.huggingface_api_key, "HUGGINGFACE_API_KEY"),
            (&mut self.elevenlabs_api_key, "ELEVENLABS_API_KEY"),
        ] {
            if field.is_empty() {
                if let Ok(value) = std::env::var(var) {
                    *field = value;
                }
            }
        }
    }

    pub fn validate(&self) -> AppResult<()> {
        if self.text_providers.is_empty() {
            return Err(AppError::Configuration(
                "At least one text provider must be configured".to_string(),
            ));
        }
        if self.speech_engines.is_empty() {
            return Err(AppError::Configuration(
                "At least one speech engine must be configured".to_string(),
            ));
        }
        if self.max_chunk_chars == 0 {
            return Err(AppError::Configuration(
                "max_chunk_chars must be greater than zero".to_string(),
            ));
        }
        if self.max_concurrent_requests == 0 {
            return Err(AppError::Configuration(
                "max_concurrent_requests must be greater than zero".to_string(),
            ));
        }
        self.default_voice.validate()
    }
}

// Кэш для конфигурации
static CONFIG_CACHE: Lazy<Mutex<Option<AppConfig>>> = Lazy::new(|| Mutex::new(None));

// Загрузка конфигурации из JSON-файла
pub fn load_config(path: &Path) -> AppResult<AppConfig> {
    let mut cache = CONFIG_CACHE.lock().map_err(|e| {
        AppError::Configuration(format!("Failed to acquire lock for config: {}", e))
    })?;

    // Если конфигурация уже загружена в кэш, вернем ее
    if let Some(config) = &*cache {
        return Ok(config.clone());
    }

    let mut config = if path.exists() {
        let raw = std::fs::read_to_string(path)?;
        serde_json::from_str::<AppConfig>(&raw)
            .map_err(|e| AppError::Configuration(format!("Failed to parse config: {}", e)))?
    } else {
        // Если конфигурации нет, используем дефолтные значения
        AppConfig::default()
    };

    config.apply_env_overrides();
    config.validate()?;

    *cache = Some(config.clone());
    Ok(config)
}

// Сохранение конфигурации в JSON-файл
pub fn save_config(path: &Path, config: &AppConfig) -> AppResult<()> {
    config.validate()?;

    {
        let mut cache = CONFIG_CACHE.lock().map_err(|e| {
            AppError::Configuration(format!("Failed to acquire lock for config: {}", e))
        })?;
        *cache = Some(config.clone());
    }

    let raw = serde_json::to_string_pretty(config)
        .map_err(|e| AppError::Configuration(format!("Failed to serialize config: {}", e)))?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, raw)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(AppConfig::default().validate().is_ok());
    }

    #[test]
    fn test_default_provider_order_ends_with_template() {
        let config = AppConfig::default();
        assert_eq!(config.text_providers.last(), Some(&TextProvider::Template));
    }

    #[test]
    fn test_config_roundtrip() {
        let config = AppConfig::default();
        let raw = serde_json::to_string(&config).unwrap();
        let back: AppConfig = serde_json::from_str(&raw).unwrap();
        assert_eq!(back.text_providers, config.text_providers);
        assert_eq!(back.max_chunk_chars, config.max_chunk_chars);
    }

    #[test]
    fn test_empty_provider_list_rejected() {
        let config = AppConfig {
            text_providers: vec![],
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
