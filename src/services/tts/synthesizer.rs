//! Оркестрация синтеза озвучки
//!
//! Фрагменты текста синтезируются конкурентно (с ограничением числа
//! одновременных запросов), затем собираются строго в исходном порядке.
//! При отказе движка набор фрагментов отбрасывается целиком и синтез
//! повторяется следующим движком из списка приоритетов.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use log::{info, warn};
use tokio::sync::Semaphore;

use crate::config::AppConfig;
use crate::errors::{
    AppError, AppResult, ProviderCallError, ProviderErrorKind, ProviderFailure,
};
use crate::models::{AudioArtifact, NarrationResult, TextChunk, VoiceSettings};
use crate::progress::{ProcessStep, ProgressTracker};
use crate::services::tts::{assembler, cache, chunker, get_speech_synthesizer, SpeechSynthesizer};
use crate::utils::audio;

/// Синтезировать озвучку текста в файл `output_path`
pub async fn synthesize_narration(
    text: &str,
    settings: &VoiceSettings,
    config: &AppConfig,
    output_path: &Path,
    tracker: Option<&ProgressTracker>,
) -> AppResult<NarrationResult> {
    settings.validate()?;
    audio::ensure_tools_available()?;

    if let Some(t) = tracker {
        t.set_step(ProcessStep::TextChunking);
    }

    let chunks = chunker::split(text, config.max_chunk_chars);
    if chunks.is_empty() {
        return Err(AppError::Other(
            "No narratable text after normalization".to_string(),
        ));
    }
    info!(
        "Prepared {} chunks (max {} chars each)",
        chunks.len(),
        config.max_chunk_chars
    );

    if let Some(t) = tracker {
        t.update_step_progress(100.0, Some(format!("{} chunks", chunks.len())));
        t.set_step(ProcessStep::SpeechSynthesis);
    }

    // Движки пробуются по приоритету; частичные результаты отбрасываются
    let mut failures: Vec<ProviderFailure> = Vec::new();
    for engine_kind in &config.speech_engines {
        let engine = match get_speech_synthesizer(*engine_kind, config) {
            Ok(engine) => engine,
            Err(e) => {
                warn!(
                    "Skipping speech engine {}: {}",
                    engine_kind.as_str(),
                    e
                );
                failures.push(ProviderFailure::new(
                    engine_kind.as_str(),
                    ProviderCallError::new(ProviderErrorKind::Auth, e.to_string()),
                ));
                continue;
            }
        };

        match synthesize_with_engine(engine.clone(), &chunks, settings, config, tracker).await {
            Ok((artifacts, _temp_dir_guard)) => {
                if let Some(t) = tracker {
                    t.set_step(ProcessStep::AudioAssembly);
                }
                let settings_hash = cache::derive_settings_hash(settings, engine.engine_id());
                let narration = assembler::assemble(
                    artifacts,
                    output_path,
                    settings_hash,
                    engine.engine_id().to_string(),
                )?;
                if let Some(t) = tracker {
                    t.update_step_progress(100.0, None);
                }
                return Ok(narration);
            }
            Err(error) => {
                warn!(
                    "Speech engine {} failed ({}): {}",
                    engine.engine_id(),
                    error.kind,
                    error.message
                );
                failures.push(ProviderFailure::new(engine.engine_id(), error));
            }
        }
    }

    Err(AppError::AllProvidersFailed(failures))
}

/// Синтез всех фрагментов одним движком.
///
/// Возвращает артефакты в порядке возрастания индексов вместе с guard
/// временной директории: файлы фрагментов должны пережить сборку.
async fn synthesize_with_engine(
    engine: Arc<dyn SpeechSynthesizer>,
    chunks: &[TextChunk],
    settings: &VoiceSettings,
    config: &AppConfig,
    tracker: Option<&ProgressTracker>,
) -> Result<(Vec<AudioArtifact>, tempfile::TempDir), ProviderCallError> {
    let temp_dir = tempfile::tempdir().map_err(|e| {
        ProviderCallError::new(
            ProviderErrorKind::Unavailable,
            format!("Failed to create temp dir: {}", e),
        )
    })?;
    let temp_path = temp_dir.path().to_path_buf();

    // Семафор ограничивает количество одновременных запросов к API
    let semaphore = Arc::new(Semaphore::new(config.max_concurrent_requests));
    let call_timeout = Duration::from_secs(config.provider_timeout_secs);
    let completed = Arc::new(AtomicUsize::new(0));
    let total = chunks.len();

    let tasks = chunks.iter().map(|chunk| {
        let engine = engine.clone();
        let settings = settings.clone();
        let semaphore = semaphore.clone();
        let temp_path = temp_path.clone();
        let completed = completed.clone();

        async move {
            let _permit = semaphore
                .acquire()
                .await
                .expect("semaphore is never closed");

            let raw_path = temp_path.join(format!("chunk_{}_raw.mp3", chunk.index));
            let outcome = tokio::time::timeout(
                call_timeout,
                engine.synthesize_chunk(&chunk.content, &settings, &raw_path),
            )
            .await;

            match outcome {
                Ok(Ok(())) => {}
                Ok(Err(error)) => return (chunk.index, Err(error)),
                Err(_) => {
                    return (
                        chunk.index,
                        Err(ProviderCallError::new(
                            ProviderErrorKind::Timeout,
                            format!("Chunk {} not synthesized within {:?}", chunk.index, call_timeout),
                        )),
                    )
                }
            }

            let final_path = match post_process_chunk(
                &raw_path,
                &temp_path,
                chunk.index,
                &settings,
                engine.supports_native_speed(),
            ) {
                Ok(path) => path,
                Err(e) => {
                    return (
                        chunk.index,
                        Err(ProviderCallError::new(
                            ProviderErrorKind::Unavailable,
                            format!("Post-processing failed for chunk {}: {}", chunk.index, e),
                        )),
                    )
                }
            };

            let duration = match audio::get_audio_duration(&final_path) {
                Ok(duration) => duration,
                Err(e) => {
                    return (
                        chunk.index,
                        Err(ProviderCallError::new(
                            ProviderErrorKind::MalformedResponse,
                            format!("Duration probe failed for chunk {}: {}", chunk.index, e),
                        )),
                    )
                }
            };

            completed.fetch_add(1, Ordering::SeqCst);
            (
                chunk.index,
                Ok(AudioArtifact {
                    chunk_index: chunk.index,
                    audio_path: final_path,
                    duration_seconds: duration,
                }),
            )
        }
    });

    // join_all: при отмене всего запроса отменяются и вызовы фрагментов
    let results = join_all(tasks).await;

    if let Some(t) = tracker {
        let done = completed.load(Ordering::SeqCst);
        t.update_step_progress(
            (done as f32 / total as f32) * 100.0,
            Some(format!("{}/{} chunks", done, total)),
        );
    }

    let mut artifacts = Vec::with_capacity(results.len());
    for (index, result) in results {
        match result {
            Ok(artifact) => artifacts.push(artifact),
            Err(error) => {
                warn!("Chunk {} failed: {}", index, error.message);
                return Err(error);
            }
        }
    }

    // join_all сохраняет порядок, но сборщик требует его явно
    artifacts.sort_by_key(|a| a.chunk_index);

    Ok((artifacts, temp_dir))
}

/// Применение пост-фильтров, которые движок не умеет делать сам:
/// темп (если нет нативной поддержки скорости), высота тона, громкость
fn post_process_chunk(
    raw_path: &Path,
    temp_dir: &Path,
    index: usize,
    settings: &VoiceSettings,
    native_speed: bool,
) -> AppResult<PathBuf> {
    let mut current = raw_path.to_path_buf();
    let mut stage = 0;

    let next_path = |stage: &mut usize| {
        *stage += 1;
        temp_dir.join(format!("chunk_{}_f{}.mp3", index, stage))
    };

    if !native_speed && (settings.speed_multiplier - 1.0).abs() > f32::EPSILON {
        let output = next_path(&mut stage);
        audio::adjust_audio_tempo(&current, settings.speed_multiplier as f64, &output)?;
        current = output;
    }

    if settings.pitch_percent != 0 {
        let output = next_path(&mut stage);
        audio::adjust_audio_pitch(&current, settings.pitch_percent, &output)?;
        current = output;
    }

    if (settings.volume - 1.0).abs() > f32::EPSILON {
        let output = next_path(&mut stage);
        audio::adjust_audio_volume(&current, settings.volume, &output)?;
        current = output;
    }

    Ok(current)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_post_process_is_identity_for_default_settings() {
        let dir = tempfile::tempdir().unwrap();
        let raw = dir.path().join("chunk_0_raw.mp3");
        std::fs::write(&raw, b"fake").unwrap();

        let settings = VoiceSettings::default();
        let result = post_process_chunk(&raw, dir.path(), 0, &settings, false).unwrap();
        assert_eq!(result, raw);
    }

    #[test]
    fn test_native_speed_engine_skips_tempo_filter() {
        let dir = tempfile::tempdir().unwrap();
        let raw = dir.path().join("chunk_0_raw.mp3");
        std::fs::write(&raw, b"fake").unwrap();

        let settings = VoiceSettings {
            speed_multiplier: 1.5,
            ..VoiceSettings::default()
        };
        // Нативная скорость: фильтры не нужны, путь не меняется
        let result = post_process_chunk(&raw, dir.path(), 0, &settings, true).unwrap();
        assert_eq!(result, raw);
    }
}
