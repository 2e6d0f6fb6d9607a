use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use log::info;

use storynova::models::{GenerationRequest, Genre, StoryLength, VoiceSettings};
use storynova::{config, StoryNova};

const USAGE: &str = "Usage: storynova <subject> [--genre <genre>] [--length <length>] \
[--voice <voice-id>] [--narrate] [--config <path>]

Genres:  fantasy adventure mystery romance sci-fi horror comedy drama thriller
Lengths: short medium long very-long";

struct CliArgs {
    subject: String,
    genre: Genre,
    length: StoryLength,
    voice_id: Option<String>,
    narrate: bool,
    config_path: PathBuf,
}

fn parse_args(args: &[String]) -> Result<CliArgs> {
    let mut subject = None;
    let mut genre = Genre::Fantasy;
    let mut length = StoryLength::Short;
    let mut voice_id = None;
    let mut narrate = false;
    let mut config_path = std::env::var("STORYNOVA_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("storynova.json"));

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--genre" => {
                let value = iter.next().context("--genre requires a value")?;
                genre = value.parse()?;
            }
            "--length" => {
                let value = iter.next().context("--length requires a value")?;
                length = value.parse()?;
            }
            "--voice" => {
                let value = iter.next().context("--voice requires a value")?;
                voice_id = Some(value.clone());
            }
            "--config" => {
                let value = iter.next().context("--config requires a value")?;
                config_path = PathBuf::from(value);
            }
            "--narrate" => narrate = true,
            "--help" | "-h" => {
                println!("{}", USAGE);
                std::process::exit(0);
            }
            other if other.starts_with("--") => bail!("Unknown option: {}", other),
            other => {
                if subject.is_some() {
                    bail!("Unexpected extra argument: {}", other);
                }
                subject = Some(other.to_string());
            }
        }
    }

    let Some(subject) = subject else {
        bail!("{}", USAGE);
    };

    Ok(CliArgs {
        subject,
        genre,
        length,
        voice_id,
        narrate,
        config_path,
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    // Инициализируем логгер с тонкой настройкой
    storynova::utils::logger::init_logger();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let cli = parse_args(&args)?;

    let app_config = config::load_config(&cli.config_path)?;
    info!(
        "Loaded configuration ({} text providers, {} speech engines)",
        app_config.text_providers.len(),
        app_config.speech_engines.len()
    );

    let mut request = GenerationRequest::new(cli.subject, cli.genre, cli.length);
    if let Some(voice_id) = cli.voice_id {
        request = request.with_voice_settings(VoiceSettings {
            voice_id,
            ..app_config.default_voice.clone()
        });
    } else {
        request = request.with_voice_settings(app_config.default_voice.clone());
    }

    let nova = StoryNova::new(app_config);
    let output = nova.process(&request, cli.narrate).await?;

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_minimal_invocation() {
        let cli = parse_args(&args(&["a dragon"])).unwrap();
        assert_eq!(cli.subject, "a dragon");
        assert_eq!(cli.genre, Genre::Fantasy);
        assert_eq!(cli.length, StoryLength::Short);
        assert!(!cli.narrate);
    }

    #[test]
    fn test_parse_full_invocation() {
        let cli = parse_args(&args(&[
            "a lost robot",
            "--genre",
            "sci-fi",
            "--length",
            "medium",
            "--voice",
            "nova",
            "--narrate",
        ]))
        .unwrap();
        assert_eq!(cli.genre, Genre::SciFi);
        assert_eq!(cli.length, StoryLength::Medium);
        assert_eq!(cli.voice_id.as_deref(), Some("nova"));
        assert!(cli.narrate);
    }

    #[test]
    fn test_unknown_option_is_rejected() {
        assert!(parse_args(&args(&["subject", "--frobnicate"])).is_err());
    }

    #[test]
    fn test_missing_subject_is_rejected() {
        assert!(parse_args(&args(&["--narrate"])).is_err());
    }
}
