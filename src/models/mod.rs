// Domain models module
// Contains core data structures used throughout the application

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::{AppError, AppResult};

/// Жанр истории
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Genre {
    Fantasy,
    Adventure,
    Mystery,
    Romance,
    #[serde(rename = "sci-fi")]
    SciFi,
    Horror,
    Comedy,
    Drama,
    Thriller,
}

impl Genre {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fantasy => "fantasy",
            Self::Adventure => "adventure",
            Self::Mystery => "mystery",
            Self::Romance => "romance",
            Self::SciFi => "sci-fi",
            Self::Horror => "horror",
            Self::Comedy => "comedy",
            Self::Drama => "drama",
            Self::Thriller => "thriller",
        }
    }
}

impl std::str::FromStr for Genre {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "fantasy" => Ok(Self::Fantasy),
            "adventure" => Ok(Self::Adventure),
            "mystery" => Ok(Self::Mystery),
            "romance" => Ok(Self::Romance),
            "sci-fi" | "scifi" => Ok(Self::SciFi),
            "horror" => Ok(Self::Horror),
            "comedy" => Ok(Self::Comedy),
            "drama" => Ok(Self::Drama),
            "thriller" => Ok(Self::Thriller),
            other => Err(AppError::Configuration(format!("Unknown genre: {}", other))),
        }
    }
}

/// Длина истории
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum StoryLength {
    Short,
    Medium,
    Long,
    VeryLong,
}

impl Default for StoryLength {
    fn default() -> Self {
        Self::Short
    }
}

impl StoryLength {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Short => "short",
            Self::Medium => "medium",
            Self::Long => "long",
            Self::VeryLong => "very-long",
        }
    }

    /// Целевой диапазон длины в словах, используется при построении промпта
    pub fn target_words(&self) -> (usize, usize) {
        match self {
            Self::Short => (150, 300),
            Self::Medium => (300, 600),
            Self::Long => (600, 1200),
            Self::VeryLong => (1200, 2500),
        }
    }
}

impl std::str::FromStr for StoryLength {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "short" => Ok(Self::Short),
            "medium" => Ok(Self::Medium),
            "long" => Ok(Self::Long),
            "very-long" | "verylong" => Ok(Self::VeryLong),
            other => Err(AppError::Configuration(format!(
                "Unknown story length: {}",
                other
            ))),
        }
    }
}

/// Настройки голоса для синтеза речи
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VoiceSettings {
    /// Идентификатор голоса у провайдера
    pub voice_id: String,

    /// Сдвиг высоты тона в процентах (-50..=50)
    #[serde(default)]
    pub pitch_percent: i32,

    /// Множитель скорости речи (0.5 - 2.0)
    #[serde(default = "default_speed")]
    pub speed_multiplier: f32,

    /// Громкость (0.0 - 1.0)
    #[serde(default = "default_volume")]
    pub volume: f32,
}

fn default_speed() -> f32 {
    1.0
}

fn default_volume() -> f32 {
    1.0
}

impl Default for VoiceSettings {
    fn default() -> Self {
        Self {
            voice_id: "alloy".to_string(),
            pitch_percent: 0,
            speed_multiplier: 1.0,
            volume: 1.0,
        }
    }
}

impl VoiceSettings {
    pub fn validate(&self) -> AppResult<()> {
        if self.voice_id.trim().is_empty() {
            return Err(AppError::Configuration("Voice id is required".to_string()));
        }
        if !(-50..=50).contains(&self.pitch_percent) {
            return Err(AppError::Configuration(format!(
                "Pitch must be within [-50, 50], got {}",
                self.pitch_percent
            )));
        }
        if !(0.5..=2.0).contains(&self.speed_multiplier) {
            return Err(AppError::Configuration(format!(
                "Speed multiplier must be within [0.5, 2.0], got {}",
                self.speed_multiplier
            )));
        }
        if !(0.0..=1.0).contains(&self.volume) {
            return Err(AppError::Configuration(format!(
                "Volume must be within [0.0, 1.0], got {}",
                self.volume
            )));
        }
        Ok(())
    }
}

/// Запрос на генерацию истории
///
/// Неизменяем после создания; идентификатор используется в логах
/// и именах временных файлов.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub id: Uuid,
    pub subject_text: String,
    pub genre: Genre,
    pub length: StoryLength,
    pub voice_settings: VoiceSettings,
}

impl GenerationRequest {
    pub fn new(subject_text: impl Into<String>, genre: Genre, length: StoryLength) -> Self {
        Self {
            id: Uuid::new_v4(),
            subject_text: subject_text.into(),
            genre,
            length,
            voice_settings: VoiceSettings::default(),
        }
    }

    pub fn with_voice_settings(mut self, voice_settings: VoiceSettings) -> Self {
        self.voice_settings = voice_settings;
        self
    }

    pub fn validate(&self) -> AppResult<()> {
        if self.subject_text.trim().is_empty() {
            return Err(AppError::Configuration(
                "Subject text is required".to_string(),
            ));
        }
        self.voice_settings.validate()
    }
}

/// Результат успешного вызова текстового провайдера
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderResult {
    /// Идентификатор провайдера, который дал результат
    pub provider: String,
    /// Сырой сгенерированный текст
    pub text: String,
}

/// Сгенерированная история
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedStory {
    pub title: String,
    pub content: String,
    pub word_count: usize,
    pub provider: String,
}

/// Фрагмент текста, подготовленный для одного вызова синтеза речи
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextChunk {
    /// Порядковый номер фрагмента, начиная с 0
    pub index: usize,
    /// Текст фрагмента
    pub content: String,
}

impl TextChunk {
    pub fn char_length(&self) -> usize {
        self.content.chars().count()
    }
}

/// Озвученный фрагмент
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioArtifact {
    /// Номер исходного фрагмента текста
    pub chunk_index: usize,
    /// Путь к аудиофайлу фрагмента
    pub audio_path: PathBuf,
    /// Длительность фрагмента в секундах, > 0 при успехе
    pub duration_seconds: f64,
}

/// Итоговая озвучка истории
///
/// Создается один раз на успешную генерацию и далее не меняется;
/// кэшируется по settings_hash.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NarrationResult {
    /// Фрагменты в порядке возрастания chunk_index
    pub artifacts: Vec<AudioArtifact>,
    /// Путь к объединенному аудиофайлу
    pub audio_path: PathBuf,
    /// Сумма длительностей фрагментов
    pub total_duration_seconds: f64,
    /// Ключ кэша, под которым сохранен результат
    pub settings_hash: String,
    /// Движок, который реально синтезировал озвучку
    pub engine: String,
}

/// Полный результат конвейера: история плюс опциональная озвучка
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoryOutput {
    pub story: GeneratedStory,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub narration: Option<NarrationResult>,
}
