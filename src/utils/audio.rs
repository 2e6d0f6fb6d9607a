//! Модуль для работы с аудио
//!
//! Вся обработка аудио делегируется ffmpeg/ffprobe; здесь только
//! обертки над вызовами этих утилит.

use std::path::Path;

use log::debug;

use crate::errors::{AppError, AppResult};

/// Проверяет, что ffmpeg и ffprobe доступны в PATH
pub fn ensure_tools_available() -> AppResult<()> {
    for tool in ["ffmpeg", "ffprobe"] {
        which::which(tool).map_err(|_| {
            AppError::AudioProcessing(format!(
                "{} not found in PATH; install ffmpeg to enable narration",
                tool
            ))
        })?;
    }
    Ok(())
}

/// Запуск команды FFmpeg
fn run_ffmpeg_command(args: &[&str]) -> AppResult<()> {
    debug!("Running ffmpeg {}", args.join(" "));
    let output = std::process::Command::new("ffmpeg").args(args).output()?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(AppError::AudioProcessing(format!(
            "FFmpeg command failed with status {}: {}",
            output.status,
            stderr.trim()
        )));
    }

    Ok(())
}

/// Получение длительности аудиофайла в секундах
pub fn get_audio_duration(file_path: &Path) -> AppResult<f64> {
    let output = std::process::Command::new("ffprobe")
        .args([
            "-v",
            "error",
            "-show_entries",
            "format=duration",
            "-of",
            "default=noprint_wrappers=1:nokey=1",
        ])
        .arg(file_path)
        .output()?;

    if !output.status.success() {
        return Err(AppError::AudioProcessing(format!(
            "FFprobe command failed with status: {}",
            output.status
        )));
    }

    let duration_str = String::from_utf8_lossy(&output.stdout);
    let duration = duration_str.trim().parse::<f64>().map_err(|_| {
        AppError::AudioProcessing(format!("Failed to parse audio duration: {}", duration_str))
    })?;

    Ok(duration)
}

/// Объединение аудиофайлов в порядке перечисления
pub fn concat_audio_files(input_files: &[&Path], output_file: &Path) -> AppResult<()> {
    if input_files.is_empty() {
        return Err(AppError::AudioProcessing(
            "No input files to concatenate".to_string(),
        ));
    }

    // Создаем временный файл со списком входных файлов
    let temp_dir = tempfile::tempdir()?;
    let concat_list_path = temp_dir.path().join("concat_list.txt");
    {
        use std::io::Write;
        let mut concat_list = std::fs::File::create(&concat_list_path)?;
        for file in input_files {
            writeln!(concat_list, "file '{}'", file.display())?;
        }
    }

    let concat_list = concat_list_path.to_string_lossy().to_string();
    let output = output_file.to_string_lossy().to_string();
    run_ffmpeg_command(&[
        "-f",
        "concat",
        "-safe",
        "0",
        "-i",
        &concat_list,
        "-c",
        "copy",
        "-y",
        &output,
    ])
}

/// Изменение темпа аудио без изменения высоты тона
pub fn adjust_audio_tempo(input_file: &Path, tempo_factor: f64, output_file: &Path) -> AppResult<()> {
    let filter_str = format!("atempo={:.2}", tempo_factor);
    let input = input_file.to_string_lossy().to_string();
    let output = output_file.to_string_lossy().to_string();
    run_ffmpeg_command(&["-i", &input, "-filter:a", &filter_str, "-y", &output])
}

/// Сдвиг высоты тона на указанный процент с сохранением длительности
pub fn adjust_audio_pitch(input_file: &Path, pitch_percent: i32, output_file: &Path) -> AppResult<()> {
    let factor = 1.0 + pitch_percent as f64 / 100.0;
    // asetrate меняет и тон и темп; atempo с обратным коэффициентом
    // возвращает исходную длительность
    let filter_str = format!(
        "asetrate=44100*{:.4},aresample=44100,atempo={:.4}",
        factor,
        1.0 / factor
    );
    let input = input_file.to_string_lossy().to_string();
    let output = output_file.to_string_lossy().to_string();
    run_ffmpeg_command(&["-i", &input, "-filter:a", &filter_str, "-y", &output])
}

/// Нормализация громкости аудио
pub fn adjust_audio_volume(input_file: &Path, volume: f32, output_file: &Path) -> AppResult<()> {
    let filter_str = format!("volume={:.2}", volume);
    let input = input_file.to_string_lossy().to_string();
    let output = output_file.to_string_lossy().to_string();
    run_ffmpeg_command(&["-i", &input, "-filter:a", &filter_str, "-y", &output])
}
