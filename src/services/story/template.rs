//! Локальный шаблонный провайдер
//!
//! Детерминированная генерация истории без обращения к внешним API.
//! Используется как последнее звено цепочки, чтобы конвейер оставался
//! работоспособным без единого ключа API.

use async_trait::async_trait;
use log::info;

use crate::errors::ProviderCallError;
use crate::models::{GenerationRequest, Genre, StoryLength};
use crate::services::story::TextGenerator;

pub struct TemplateGenerator;

impl TemplateGenerator {
    pub fn new() -> Self {
        Self
    }

    fn opening(genre: Genre, subject: &str) -> String {
        match genre {
            Genre::Fantasy => format!(
                "In a kingdom beyond the last map, the tale of {} began with a whisper of old magic.",
                subject
            ),
            Genre::Adventure => format!(
                "The expedition set out at dawn, and {} was the reason every one of them had signed on.",
                subject
            ),
            Genre::Mystery => format!(
                "Nobody in town could explain {}, and that was precisely what troubled Inspector Hale.",
                subject
            ),
            Genre::Romance => format!(
                "They met on an ordinary Tuesday, and {} changed everything between them.",
                subject
            ),
            Genre::SciFi => format!(
                "The station logs first mentioned {} on the third orbit, filed under anomalies.",
                subject
            ),
            Genre::Horror => format!(
                "The house had been quiet for years until {} arrived with the autumn fog.",
                subject
            ),
            Genre::Comedy => format!(
                "It all started, as these things do, with {} and a spectacularly bad plan.",
                subject
            ),
            Genre::Drama => format!(
                "Years later, the family would still argue about {} and what it had cost them.",
                subject
            ),
            Genre::Thriller => format!(
                "The phone rang at midnight, and the voice on the line said only two words about {}.",
                subject
            ),
        }
    }

    fn middle(genre: Genre, subject: &str, paragraph: usize) -> String {
        let beats = match genre {
            Genre::Fantasy => [
                "The old stories warned of a price, and the price came due sooner than anyone hoped.",
                "Allies appeared in unlikely places, each carrying a piece of the answer.",
                "Magic, it turned out, obeyed rules older than the kingdom itself.",
            ],
            Genre::Horror => [
                "Doors that had been locked stood open, and the cold crept in a room at a time.",
                "Every rational explanation fell apart under the weight of what they saw next.",
                "By the third night, no one suggested staying any longer.",
            ],
            _ => [
                "What followed tested everyone involved in ways none of them expected.",
                "Each small discovery changed what they thought they knew.",
                "For a while it seemed the matter was settled, but it was not.",
            ],
        };
        format!(
            "{} Through it all, {} remained at the heart of the matter.",
            beats[paragraph % beats.len()],
            subject
        )
    }

    fn closing(genre: Genre, subject: &str) -> String {
        match genre {
            Genre::Comedy => format!(
                "In the end everyone agreed that {} had been worth the chaos, though nobody volunteered to repeat it.",
                subject
            ),
            Genre::Horror => format!(
                "They never spoke of {} again, but the fog still comes every autumn.",
                subject
            ),
            _ => format!(
                "And so the story of {} found its ending, remembered long after by those who lived it.",
                subject
            ),
        }
    }

    fn paragraph_count(length: StoryLength) -> usize {
        match length {
            StoryLength::Short => 2,
            StoryLength::Medium => 4,
            StoryLength::Long => 8,
            StoryLength::VeryLong => 16,
        }
    }
}

impl Default for TemplateGenerator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TextGenerator for TemplateGenerator {
    fn provider_id(&self) -> &'static str {
        "template"
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<String, ProviderCallError> {
        info!("Generating story from local template (request {})", request.id);

        let subject = request.subject_text.trim();
        let title = format!(
            "The Tale of {}",
            if subject.is_empty() { "Nothing" } else { subject }
        );

        let mut paragraphs = vec![Self::opening(request.genre, subject)];
        for i in 0..Self::paragraph_count(request.length) {
            paragraphs.push(Self::middle(request.genre, subject, i));
        }
        paragraphs.push(Self::closing(request.genre, subject));

        Ok(format!("{}\n\n{}", title, paragraphs.join("\n\n")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Genre, StoryLength};

    fn request(length: StoryLength) -> GenerationRequest {
        GenerationRequest::new("a dragon", Genre::Fantasy, length)
    }

    #[test]
    fn test_template_is_deterministic() {
        tokio_test::block_on(async {
            let generator = TemplateGenerator::new();
            let first = generator.generate(&request(StoryLength::Short)).await.unwrap();
            let second = generator
                .generate(&request(StoryLength::Short))
                .await
                .unwrap();
            assert_eq!(first, second);
        });
    }

    #[tokio::test]
    async fn test_template_mentions_subject() {
        let generator = TemplateGenerator::new();
        let story = generator.generate(&request(StoryLength::Short)).await.unwrap();
        assert!(story.contains("a dragon"));
        assert!(story.starts_with("The Tale of a dragon"));
    }

    #[tokio::test]
    async fn test_longer_lengths_produce_longer_stories() {
        let generator = TemplateGenerator::new();
        let short = generator.generate(&request(StoryLength::Short)).await.unwrap();
        let long = generator
            .generate(&request(StoryLength::VeryLong))
            .await
            .unwrap();
        assert!(long.len() > short.len());
    }
}
