// TTS services module
// Contains implementations of the speech synthesis engines and the
// chunk/cache/assemble pipeline around them

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;

use crate::config::{AppConfig, SpeechEngine};
use crate::errors::{AppResult, ProviderCallError};
use crate::models::VoiceSettings;
use crate::utils::common::validate_speech_engine_key;

pub mod assembler;
pub mod cache;
pub mod chunker;
pub mod elevenlabs;
pub mod openai;
pub mod synthesizer;

pub use cache::NarrationCache;
pub use synthesizer::synthesize_narration;

/// Trait that all speech synthesis engines must implement
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Stable engine identifier used in cache keys and diagnostics
    fn engine_id(&self) -> &'static str;

    /// Whether the engine applies the speed multiplier natively.
    /// When false, tempo is adjusted after synthesis with an audio filter.
    fn supports_native_speed(&self) -> bool {
        false
    }

    /// Synthesize one text chunk into an audio file at `output_path`
    async fn synthesize_chunk(
        &self,
        text: &str,
        settings: &VoiceSettings,
        output_path: &Path,
    ) -> Result<(), ProviderCallError>;
}

/// Get the appropriate speech synthesizer for a configured engine
pub fn get_speech_synthesizer(
    engine: SpeechEngine,
    config: &AppConfig,
) -> AppResult<Arc<dyn SpeechSynthesizer>> {
    match engine {
        SpeechEngine::OpenAi => {
            validate_speech_engine_key(engine, &config.openai_api_key)?;
            Ok(Arc::new(openai::OpenAiSpeech::new(&config.openai_api_key)?))
        }
        SpeechEngine::ElevenLabs => {
            validate_speech_engine_key(engine, &config.elevenlabs_api_key)?;
            Ok(Arc::new(elevenlabs::ElevenLabsSpeech::new(
                &config.elevenlabs_api_key,
            )?))
        }
    }
}

/// Get the list of available speech engines
pub fn available_engines() -> Vec<String> {
    vec!["openai".to_string(), "elevenlabs".to_string()]
}
