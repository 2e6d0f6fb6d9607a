// Error handling module
// Contains the application error type and the provider failure taxonomy

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Классификация отказов внешнего провайдера
///
/// Каждый адаптер обязан привести любую ошибку HTTP-уровня к одному из
/// этих вариантов; исключения сетевого уровня становятся `Unavailable`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderErrorKind {
    /// Неверные или отсутствующие учетные данные
    Auth,
    /// Превышен лимит запросов провайдера
    RateLimited,
    /// Запрос не уложился в таймаут
    Timeout,
    /// Ответ получен, но его не удалось разобрать
    MalformedResponse,
    /// Провайдер недоступен (сетевая ошибка или 5xx)
    Unavailable,
}

impl ProviderErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Auth => "auth",
            Self::RateLimited => "rate_limited",
            Self::Timeout => "timeout",
            Self::MalformedResponse => "malformed_response",
            Self::Unavailable => "unavailable",
        }
    }
}

impl std::fmt::Display for ProviderErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Типизированный отказ одного вызова адаптера
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderCallError {
    /// Классификация отказа
    pub kind: ProviderErrorKind,
    /// Диагностическое сообщение провайдера
    pub message: String,
    /// Подсказка для повтора (секунды), если провайдер ее прислал
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_after_secs: Option<u64>,
}

impl ProviderCallError {
    pub fn new(kind: ProviderErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            retry_after_secs: None,
        }
    }

    pub fn with_retry_after(mut self, secs: u64) -> Self {
        self.retry_after_secs = Some(secs);
        self
    }

    /// Привести HTTP-статус провайдера к классификации отказа
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let kind = match status {
            401 | 403 => ProviderErrorKind::Auth,
            429 => ProviderErrorKind::RateLimited,
            408 | 504 => ProviderErrorKind::Timeout,
            400 | 422 => ProviderErrorKind::MalformedResponse,
            _ => ProviderErrorKind::Unavailable,
        };
        Self::new(kind, message)
    }

    /// Привести транспортную ошибку reqwest к классификации отказа
    pub fn from_transport(err: &reqwest::Error) -> Self {
        let kind = if err.is_timeout() {
            ProviderErrorKind::Timeout
        } else {
            ProviderErrorKind::Unavailable
        };
        Self::new(kind, err.to_string())
    }
}

/// Отказ провайдера, зафиксированный цепочкой (с идентификатором провайдера)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderFailure {
    pub provider: String,
    pub kind: ProviderErrorKind,
    pub message: String,
}

impl ProviderFailure {
    pub fn new(provider: impl Into<String>, error: ProviderCallError) -> Self {
        Self {
            provider: provider.into(),
            kind: error.kind,
            message: error.message,
        }
    }
}

impl std::fmt::Display for ProviderFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.provider, self.kind)
    }
}

fn summarize_failures(failures: &[ProviderFailure]) -> String {
    failures
        .iter()
        .map(|f| f.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

// Application error type
#[derive(Debug, Error)]
pub enum AppError {
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("All providers failed: {}", summarize_failures(.0))]
    AllProvidersFailed(Vec<ProviderFailure>),

    #[error("Incomplete artifact sequence: {0}")]
    IncompleteSequence(String),

    #[error("Audio processing error: {0}")]
    AudioProcessing(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Other error: {0}")]
    Other(String),
}

impl From<String> for AppError {
    fn from(err: String) -> Self {
        AppError::Other(err)
    }
}

impl From<&str> for AppError {
    fn from(err: &str) -> Self {
        AppError::Other(err.to_string())
    }
}

// Result type alias for application
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aggregate_failure_lists_every_provider() {
        let err = AppError::AllProvidersFailed(vec![
            ProviderFailure::new(
                "openai",
                ProviderCallError::new(ProviderErrorKind::RateLimited, "429"),
            ),
            ProviderFailure::new(
                "google",
                ProviderCallError::new(ProviderErrorKind::Unavailable, "503"),
            ),
        ]);

        let rendered = err.to_string();
        assert!(rendered.contains("openai: rate_limited"));
        assert!(rendered.contains("google: unavailable"));
    }

    #[test]
    fn test_status_classification() {
        assert_eq!(
            ProviderCallError::from_status(401, "").kind,
            ProviderErrorKind::Auth
        );
        assert_eq!(
            ProviderCallError::from_status(429, "").kind,
            ProviderErrorKind::RateLimited
        );
        assert_eq!(
            ProviderCallError::from_status(422, "").kind,
            ProviderErrorKind::MalformedResponse
        );
        assert_eq!(
            ProviderCallError::from_status(503, "").kind,
            ProviderErrorKind::Unavailable
        );
    }

    #[test]
    fn test_retry_after_hint_is_preserved() {
        let err = ProviderCallError::new(ProviderErrorKind::RateLimited, "slow down")
            .with_retry_after(30);
        assert_eq!(err.retry_after_secs, Some(30));
    }
}
