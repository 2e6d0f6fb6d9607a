//! Модуль для кэширования результатов синтеза речи
//!
//! Готовая озвучка сохраняется на диске под ключом, выведенным из
//! настроек голоса и текста; повторный запрос с теми же настройками
//! не обращается к платному API.

use std::fs;
use std::path::PathBuf;

use log::{debug, warn};

use crate::config::AppConfig;
use crate::errors::{AppError, AppResult};
use crate::models::{NarrationResult, VoiceSettings};

/// Ключ из настроек голоса и движка
///
/// Кодирование каноническое (фиксированный порядок и формат полей),
/// поэтому ключ не зависит от порядка полей источника, а любое
/// изменение значения меняет дайджест.
pub fn derive_settings_hash(settings: &VoiceSettings, engine: &str) -> String {
    let canonical = format!(
        "engine={}|voice={}|pitch={}|speed={:.3}|volume={:.3}",
        engine,
        settings.voice_id,
        settings.pitch_percent,
        settings.speed_multiplier,
        settings.volume
    );
    format!("{:x}", md5::compute(canonical.as_bytes()))
}

/// Полный ключ кэша: настройки плюс идентичность исходного текста
pub fn derive_cache_key(settings: &VoiceSettings, engine: &str, text: &str) -> String {
    let mut hasher = md5::Context::new();
    hasher.consume(derive_settings_hash(settings, engine).as_bytes());
    hasher.consume(text.as_bytes());
    format!("{:x}", hasher.compute())
}

/// Структура для управления кэшем озвучки
pub struct NarrationCache {
    /// Директория для кэша
    cache_dir: PathBuf,
    /// Максимальный размер кэша в байтах
    max_size: Option<u64>,
}

impl NarrationCache {
    /// Создать новый экземпляр NarrationCache
    pub fn new(config: &AppConfig) -> AppResult<Self> {
        let cache_dir = if let Some(dir) = &config.cache_dir {
            dir.clone()
        } else {
            std::env::temp_dir().join("storynova-cache")
        };

        if !cache_dir.exists() {
            fs::create_dir_all(&cache_dir)?;
        }

        Ok(Self {
            cache_dir,
            max_size: config.max_cache_size,
        })
    }

    fn audio_path(&self, key: &str) -> PathBuf {
        self.cache_dir.join(format!("{}.mp3", key))
    }

    fn metadata_path(&self, key: &str) -> PathBuf {
        self.cache_dir.join(format!("{}.json", key))
    }

    /// Найти готовую озвучку по ключу
    pub fn lookup(&self, key: &str) -> Option<NarrationResult> {
        let audio = self.audio_path(key);
        let metadata = self.metadata_path(key);

        let audio_ok = fs::metadata(&audio)
            .map(|m| m.is_file() && m.len() > 0)
            .unwrap_or(false);
        if !audio_ok || !metadata.exists() {
            return None;
        }

        let raw = fs::read_to_string(&metadata).ok()?;
        match serde_json::from_str::<NarrationResult>(&raw) {
            Ok(mut narration) => {
                narration.audio_path = audio;
                debug!("Narration cache hit for {}", key);
                Some(narration)
            }
            Err(e) => {
                warn!("Discarding unreadable cache metadata {}: {}", key, e);
                None
            }
        }
    }

    /// Добавить озвучку в кэш; возвращает запись с путем внутри кэша
    pub fn store(&self, key: &str, narration: &NarrationResult) -> AppResult<NarrationResult> {
        let audio = self.audio_path(key);
        let metadata = self.metadata_path(key);

        fs::copy(&narration.audio_path, &audio).map_err(|e| {
            AppError::Storage(format!(
                "Failed to copy narration into cache {}: {}",
                audio.display(),
                e
            ))
        })?;

        let mut cached = narration.clone();
        cached.audio_path = audio;
        fs::write(&metadata, serde_json::to_string_pretty(&cached)?)?;

        self.enforce_max_size()?;

        Ok(cached)
    }

    /// Очистить кэш
    pub fn clear(&self) -> AppResult<()> {
        for entry in fs::read_dir(&self.cache_dir)? {
            let entry = entry?;
            if entry.file_type()?.is_file() {
                fs::remove_file(entry.path())?;
            }
        }
        Ok(())
    }

    /// Проверить размер кэша и удалить старые файлы при превышении
    fn enforce_max_size(&self) -> AppResult<()> {
        let Some(max_size) = self.max_size else {
            return Ok(());
        };

        let mut total_size = 0;
        let mut files = Vec::new();

        for entry in fs::read_dir(&self.cache_dir)? {
            let entry = entry?;
            if entry.file_type()?.is_file() {
                let metadata = entry.metadata()?;
                total_size += metadata.len();
                files.push((entry.path(), metadata.modified()?));
            }
        }

        if total_size > max_size {
            // Удаляем от старых к новым, пока не впишемся в лимит
            files.sort_by(|a, b| a.1.cmp(&b.1));

            for (path, _) in files {
                if total_size <= max_size {
                    break;
                }
                if let Ok(metadata) = fs::metadata(&path) {
                    total_size -= metadata.len();
                    fs::remove_file(path)?;
                }
            }
        }

        Ok(())
    }

    #[cfg(test)]
    fn at(dir: &std::path::Path, max_size: Option<u64>) -> Self {
        Self {
            cache_dir: dir.to_path_buf(),
            max_size,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AudioArtifact;

    fn settings() -> VoiceSettings {
        VoiceSettings {
            voice_id: "alloy".to_string(),
            pitch_percent: 10,
            speed_multiplier: 1.25,
            volume: 0.8,
        }
    }

    #[test]
    fn test_same_settings_yield_same_key() {
        let a = derive_cache_key(&settings(), "openai", "Once upon a time.");
        let b = derive_cache_key(&settings(), "openai", "Once upon a time.");
        assert_eq!(a, b);
    }

    #[test]
    fn test_every_field_changes_the_key() {
        let base = derive_settings_hash(&settings(), "openai");

        let mut changed = settings();
        changed.voice_id = "nova".to_string();
        assert_ne!(derive_settings_hash(&changed, "openai"), base);

        let mut changed = settings();
        changed.pitch_percent = -10;
        assert_ne!(derive_settings_hash(&changed, "openai"), base);

        let mut changed = settings();
        changed.speed_multiplier = 1.5;
        assert_ne!(derive_settings_hash(&changed, "openai"), base);

        let mut changed = settings();
        changed.volume = 1.0;
        assert_ne!(derive_settings_hash(&changed, "openai"), base);

        assert_ne!(derive_settings_hash(&settings(), "elevenlabs"), base);
    }

    #[test]
    fn test_text_identity_is_part_of_the_key() {
        let a = derive_cache_key(&settings(), "openai", "Story one.");
        let b = derive_cache_key(&settings(), "openai", "Story two.");
        assert_ne!(a, b);
    }

    #[test]
    fn test_store_then_lookup_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let cache = NarrationCache::at(dir.path(), None);

        // Файл с фейковыми аудиоданными вместо настоящего mp3
        let source = dir.path().join("source.mp3");
        fs::write(&source, b"fake audio bytes").unwrap();

        let narration = NarrationResult {
            artifacts: vec![AudioArtifact {
                chunk_index: 0,
                audio_path: source.clone(),
                duration_seconds: 2.5,
            }],
            audio_path: source,
            total_duration_seconds: 2.5,
            settings_hash: "abc".to_string(),
            engine: "openai".to_string(),
        };

        let key = "deadbeef";
        assert!(cache.lookup(key).is_none());

        cache.store(key, &narration).unwrap();
        let hit = cache.lookup(key).expect("expected cache hit");
        assert_eq!(hit.total_duration_seconds, 2.5);
        assert_eq!(hit.engine, "openai");
        assert!(hit.audio_path.ends_with("deadbeef.mp3"));
    }

    #[test]
    fn test_lookup_rejects_empty_audio_file() {
        let dir = tempfile::tempdir().unwrap();
        let cache = NarrationCache::at(dir.path(), None);

        fs::write(dir.path().join("empty.mp3"), b"").unwrap();
        fs::write(dir.path().join("empty.json"), b"{}").unwrap();

        assert!(cache.lookup("empty").is_none());
    }
}
