// Artifact storage module
// Generated narrations are stored as files; database records keep only
// the returned path reference, never the bytes.

use std::fs;
use std::path::PathBuf;

use chrono::Utc;
use log::info;
use serde::{Deserialize, Serialize};

use crate::config::AppConfig;
use crate::errors::{AppError, AppResult};
use crate::models::NarrationResult;

/// Ссылка на сохраненный артефакт озвучки
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredArtifact {
    /// Путь к аудиофайлу
    pub audio_path: PathBuf,
    /// Общая длительность в секундах
    pub total_duration_seconds: f64,
    /// Ключ настроек, под которым сгенерирован артефакт
    pub settings_hash: String,
}

/// Хранилище готовых артефактов
pub struct ArtifactStore {
    output_dir: PathBuf,
}

impl ArtifactStore {
    pub fn new(config: &AppConfig) -> AppResult<Self> {
        let output_dir = config.output_dir.clone();
        if !output_dir.exists() {
            fs::create_dir_all(&output_dir)?;
        }
        Ok(Self { output_dir })
    }

    /// Путь для нового артефакта: `{timestamp}_{settings_hash}.mp3`
    pub fn artifact_path(&self, settings_hash: &str) -> PathBuf {
        let timestamp = Utc::now().format("%Y%m%d%H%M%S");
        self.output_dir
            .join(format!("{}_{}.mp3", timestamp, settings_hash))
    }

    /// Сохранить метаданные озвучки рядом с аудиофайлом
    pub fn store_narration(&self, narration: &NarrationResult) -> AppResult<StoredArtifact> {
        if !narration.audio_path.exists() {
            return Err(AppError::Storage(format!(
                "Narration audio missing at {}",
                narration.audio_path.display()
            )));
        }

        let sidecar = narration.audio_path.with_extension("json");
        fs::write(&sidecar, serde_json::to_string_pretty(narration)?)?;

        info!(
            "Stored narration {} ({:.2}s)",
            narration.audio_path.display(),
            narration.total_duration_seconds
        );

        Ok(StoredArtifact {
            audio_path: narration.audio_path.clone(),
            total_duration_seconds: narration.total_duration_seconds,
            settings_hash: narration.settings_hash.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AudioArtifact;

    #[test]
    fn test_artifact_path_embeds_settings_hash() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig {
            output_dir: dir.path().to_path_buf(),
            ..AppConfig::default()
        };
        let store = ArtifactStore::new(&config).unwrap();

        let path = store.artifact_path("cafebabe");
        let name = path.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.ends_with("_cafebabe.mp3"));
    }

    #[test]
    fn test_store_narration_writes_sidecar() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig {
            output_dir: dir.path().to_path_buf(),
            ..AppConfig::default()
        };
        let store = ArtifactStore::new(&config).unwrap();

        let audio_path = dir.path().join("20240101000000_cafebabe.mp3");
        fs::write(&audio_path, b"fake audio").unwrap();

        let narration = NarrationResult {
            artifacts: vec![AudioArtifact {
                chunk_index: 0,
                audio_path: audio_path.clone(),
                duration_seconds: 1.5,
            }],
            audio_path: audio_path.clone(),
            total_duration_seconds: 1.5,
            settings_hash: "cafebabe".to_string(),
            engine: "openai".to_string(),
        };

        let stored = store.store_narration(&narration).unwrap();
        assert_eq!(stored.settings_hash, "cafebabe");
        assert!(audio_path.with_extension("json").exists());
    }

    #[test]
    fn test_store_narration_requires_audio_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig {
            output_dir: dir.path().to_path_buf(),
            ..AppConfig::default()
        };
        let store = ArtifactStore::new(&config).unwrap();

        let narration = NarrationResult {
            artifacts: vec![],
            audio_path: dir.path().join("missing.mp3"),
            total_duration_seconds: 0.0,
            settings_hash: "x".to_string(),
            engine: "openai".to_string(),
        };

        assert!(matches!(
            store.store_narration(&narration),
            Err(AppError::Storage(_))
        ));
    }
}
