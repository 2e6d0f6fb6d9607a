//! Сборка озвученных фрагментов в единую озвучку
//!
//! Сборщик отвечает за порядок и агрегацию метаданных; само
//! склеивание аудиопотоков делегировано ffmpeg.

use std::path::Path;

use log::info;

use crate::errors::{AppError, AppResult};
use crate::models::{AudioArtifact, NarrationResult};
use crate::utils::audio;

/// Проверка предусловий и подсчет общей длительности.
///
/// Фрагменты обязаны идти строго по возрастанию chunk_index без
/// пропусков и дублей; нарушение означает внутреннюю ошибку конвейера
/// и никогда не исправляется молча.
pub fn aggregate_metadata(artifacts: &[AudioArtifact]) -> AppResult<f64> {
    if artifacts.is_empty() {
        return Err(AppError::IncompleteSequence(
            "Artifact sequence is empty".to_string(),
        ));
    }

    let mut total = 0.0;
    for (position, artifact) in artifacts.iter().enumerate() {
        if artifact.chunk_index != position {
            return Err(AppError::IncompleteSequence(format!(
                "Expected chunk {} at position {}, found chunk {}",
                position, position, artifact.chunk_index
            )));
        }
        if artifact.duration_seconds <= 0.0 {
            return Err(AppError::AudioProcessing(format!(
                "Chunk {} has non-positive duration {}",
                artifact.chunk_index, artifact.duration_seconds
            )));
        }
        total += artifact.duration_seconds;
    }

    Ok(total)
}

/// Собрать упорядоченные фрагменты в итоговый файл `output_path`
pub fn assemble(
    artifacts: Vec<AudioArtifact>,
    output_path: &Path,
    settings_hash: String,
    engine: String,
) -> AppResult<NarrationResult> {
    let total_duration_seconds = aggregate_metadata(&artifacts)?;

    let inputs: Vec<&Path> = artifacts.iter().map(|a| a.audio_path.as_path()).collect();
    audio::concat_audio_files(&inputs, output_path)?;

    info!(
        "Assembled {} chunks into {} ({:.2}s)",
        artifacts.len(),
        output_path.display(),
        total_duration_seconds
    );

    Ok(NarrationResult {
        artifacts,
        audio_path: output_path.to_path_buf(),
        total_duration_seconds,
        settings_hash,
        engine,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn artifact(chunk_index: usize, duration_seconds: f64) -> AudioArtifact {
        AudioArtifact {
            chunk_index,
            audio_path: PathBuf::from(format!("chunk_{}.mp3", chunk_index)),
            duration_seconds,
        }
    }

    #[test]
    fn test_total_duration_is_exact_sum() {
        let artifacts = vec![artifact(0, 2.0), artifact(1, 3.5), artifact(2, 1.0)];
        assert_eq!(aggregate_metadata(&artifacts).unwrap(), 6.5);
    }

    #[test]
    fn test_gap_in_sequence_is_rejected() {
        let artifacts = vec![artifact(0, 2.0), artifact(2, 1.0)];
        match aggregate_metadata(&artifacts) {
            Err(AppError::IncompleteSequence(message)) => {
                assert!(message.contains("position 1"));
            }
            other => panic!("Expected IncompleteSequence, got {:?}", other),
        }
    }

    #[test]
    fn test_out_of_order_sequence_is_rejected() {
        let artifacts = vec![artifact(1, 2.0), artifact(0, 1.0)];
        assert!(matches!(
            aggregate_metadata(&artifacts),
            Err(AppError::IncompleteSequence(_))
        ));
    }

    #[test]
    fn test_duplicate_chunk_is_rejected() {
        let artifacts = vec![artifact(0, 2.0), artifact(0, 2.0)];
        assert!(matches!(
            aggregate_metadata(&artifacts),
            Err(AppError::IncompleteSequence(_))
        ));
    }

    #[test]
    fn test_empty_sequence_is_rejected() {
        assert!(matches!(
            aggregate_metadata(&[]),
            Err(AppError::IncompleteSequence(_))
        ));
    }

    #[test]
    fn test_non_positive_duration_is_rejected() {
        let artifacts = vec![artifact(0, 0.0)];
        assert!(matches!(
            aggregate_metadata(&artifacts),
            Err(AppError::AudioProcessing(_))
        ));
    }
}
