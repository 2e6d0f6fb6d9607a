//! Библиотека storynova
//!
//! Конвейер генерации контента: текстовый промпт превращается в историю
//! через цепочку провайдеров с переходом при отказе, а история — в
//! озвучку через разбиение на фрагменты, синтез речи и сборку, с
//! кэшированием по хэшу настроек.

pub mod config;
pub mod errors;
pub mod models;
pub mod progress;
pub mod services;
pub mod utils;

use log::{info, warn};

pub use crate::config::AppConfig;
pub use crate::errors::{AppError, AppResult, ProviderErrorKind, ProviderFailure};
pub use crate::models::{
    GeneratedStory, GenerationRequest, Genre, NarrationResult, StoryLength, StoryOutput,
    VoiceSettings,
};

use crate::models::ProviderResult;
use crate::progress::{ProcessStep, ProgressObserver, ProgressTracker};
use crate::services::storage::ArtifactStore;
use crate::services::story::{self, TextGenerator};
use crate::services::tts::{self, cache, chunker, NarrationCache};

/// Основная структура для работы с конвейером генерации
pub struct StoryNova {
    /// Конфигурация конвейера
    config: AppConfig,
    /// Трекер прогресса
    progress_tracker: Option<ProgressTracker>,
}

impl StoryNova {
    /// Создать новый экземпляр с указанной конфигурацией
    pub fn new(config: AppConfig) -> Self {
        Self {
            config,
            progress_tracker: None,
        }
    }

    /// Создать экземпляр с наблюдателем прогресса
    pub fn with_observer(config: AppConfig, observer: Box<dyn ProgressObserver>) -> Self {
        let tracker = ProgressTracker::new();
        tracker.add_observer(observer);
        Self {
            config,
            progress_tracker: Some(tracker),
        }
    }

    /// Сгенерировать историю по запросу.
    ///
    /// Провайдеры опрашиваются в порядке приоритета; если отказали все,
    /// результат дает локальный шаблонный провайдер — пользователь
    /// получает деградированный, но рабочий ответ вместо ошибки.
    pub async fn generate_story(&self, request: &GenerationRequest) -> AppResult<GeneratedStory> {
        request.validate()?;

        if let Some(t) = &self.progress_tracker {
            t.set_step(ProcessStep::StoryGeneration);
        }

        let chain = story::build_chain(&self.config)?;
        let result = match chain.generate(request).await {
            Ok(result) => result,
            Err(AppError::AllProvidersFailed(failures)) => {
                warn!(
                    "All text providers failed ({} failures), falling back to local template",
                    failures.len()
                );
                let template = story::template::TemplateGenerator::new();
                let text = template
                    .generate(request)
                    .await
                    .map_err(|e| AppError::Other(e.message))?;
                ProviderResult {
                    provider: template.provider_id().to_string(),
                    text,
                }
            }
            Err(other) => return Err(other),
        };

        if let Some(t) = &self.progress_tracker {
            t.update_step_progress(100.0, Some(format!("provider {}", result.provider)));
        }

        let (title, content) = story::split_title_and_body(&result.text, request);
        let word_count = story::count_words(&content);
        info!(
            "Generated story \"{}\" ({} words, provider {})",
            title, word_count, result.provider
        );

        Ok(GeneratedStory {
            title,
            content,
            word_count,
            provider: result.provider,
        })
    }

    /// Сгенерировать озвучку для текста истории.
    ///
    /// Сначала проверяется кэш по хэшу настроек и тексту; при попадании
    /// синтез не выполняется вовсе.
    pub async fn generate_narration(
        &self,
        story_text: &str,
        settings: &VoiceSettings,
    ) -> AppResult<NarrationResult> {
        settings.validate()?;

        let primary_engine = self
            .config
            .speech_engines
            .first()
            .ok_or_else(|| {
                AppError::Configuration("No speech engines configured".to_string())
            })?
            .as_str();

        if let Some(t) = &self.progress_tracker {
            t.set_step(ProcessStep::CacheLookup);
        }

        // Идентичность текста берется после нормализации, чтобы
        // отличия только в пробелах не приводили к повторному синтезу
        let normalized = chunker::prepare_text(story_text);
        let cache_key = cache::derive_cache_key(settings, primary_engine, &normalized);

        let narration_cache = if self.config.use_caching {
            Some(NarrationCache::new(&self.config)?)
        } else {
            None
        };

        if let Some(cache) = &narration_cache {
            if let Some(hit) = cache.lookup(&cache_key) {
                info!("Narration cache hit, skipping synthesis");
                if let Some(t) = &self.progress_tracker {
                    t.complete();
                }
                return Ok(hit);
            }
        }

        if let Some(t) = &self.progress_tracker {
            t.update_step_progress(100.0, Some("cache miss".to_string()));
        }

        let store = ArtifactStore::new(&self.config)?;
        let settings_hash = cache::derive_settings_hash(settings, primary_engine);
        let output_path = store.artifact_path(&settings_hash);

        let narration = tts::synthesize_narration(
            story_text,
            settings,
            &self.config,
            &output_path,
            self.progress_tracker.as_ref(),
        )
        .await?;

        if !utils::common::check_file_exists_and_valid(&narration.audio_path).await {
            return Err(AppError::Storage(format!(
                "Assembled narration is missing or empty: {}",
                narration.audio_path.display()
            )));
        }

        store.store_narration(&narration)?;

        if let Some(cache) = &narration_cache {
            // Промах записи в кэш не фатален: артефакт уже сохранен
            if let Err(e) = cache.store(&cache_key, &narration) {
                warn!("Failed to cache narration: {}", e);
            }
        }

        Ok(narration)
    }

    /// Полный конвейер: история плюс опциональная озвучка
    pub async fn process(
        &self,
        request: &GenerationRequest,
        with_narration: bool,
    ) -> AppResult<StoryOutput> {
        let story = self.generate_story(request).await?;

        let narration = if with_narration {
            Some(
                self.generate_narration(&story.content, &request.voice_settings)
                    .await?,
            )
        } else {
            None
        };

        if let Some(t) = &self.progress_tracker {
            t.complete();
        }

        Ok(StoryOutput { story, narration })
    }
}

/// Публичный API для удобного использования без настройки экземпляра
pub async fn generate_story(
    subject: &str,
    genre: Genre,
    length: StoryLength,
    config: AppConfig,
) -> AppResult<GeneratedStory> {
    let request = GenerationRequest::new(subject, genre, length);
    StoryNova::new(config).generate_story(&request).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TextProvider;

    // Без единого ключа API цепочка сводится к шаблонному провайдеру —
    // это и есть деградированный режим
    #[tokio::test]
    async fn test_story_generation_works_without_any_credentials() {
        let config = AppConfig::default();
        let request = GenerationRequest::new("a dragon", Genre::Fantasy, StoryLength::Short);

        let story = StoryNova::new(config)
            .generate_story(&request)
            .await
            .unwrap();

        assert_eq!(story.provider, "template");
        assert!(story.word_count > 0);
        assert!(story.content.contains("a dragon"));
        assert!(!story.title.is_empty());
    }

    #[tokio::test]
    async fn test_template_only_chain_is_deterministic() {
        let config = AppConfig {
            text_providers: vec![TextProvider::Template],
            ..AppConfig::default()
        };
        let request = GenerationRequest::new("a lost robot", Genre::SciFi, StoryLength::Medium);

        let nova = StoryNova::new(config);
        let first = nova.generate_story(&request).await.unwrap();
        let second = nova.generate_story(&request).await.unwrap();
        assert_eq!(first.content, second.content);
        assert_eq!(first.title, second.title);
    }

    #[tokio::test]
    async fn test_invalid_request_is_rejected_before_any_call() {
        let config = AppConfig::default();
        let request = GenerationRequest::new("", Genre::Fantasy, StoryLength::Short);
        assert!(StoryNova::new(config)
            .generate_story(&request)
            .await
            .is_err());
    }
}
