//! Цепочка текстовых провайдеров с переходом при отказе
//!
//! Провайдеры опрашиваются в порядке приоритета с таймаутом на вызов;
//! побеждает первый успешный ответ. Повторы внутри одного провайдера —
//! забота адаптера, не цепочки.

use std::time::Duration;

use log::{info, warn};

use crate::errors::{
    AppError, AppResult, ProviderCallError, ProviderErrorKind, ProviderFailure,
};
use crate::models::{GenerationRequest, ProviderResult};
use crate::services::story::TextGenerator;

pub struct FallbackChain {
    providers: Vec<Box<dyn TextGenerator>>,
    call_timeout: Duration,
}

impl FallbackChain {
    pub fn new(providers: Vec<Box<dyn TextGenerator>>, timeout_secs: u64) -> AppResult<Self> {
        if providers.is_empty() {
            return Err(AppError::Configuration(
                "Fallback chain requires at least one provider".to_string(),
            ));
        }
        Ok(Self {
            providers,
            call_timeout: Duration::from_secs(timeout_secs),
        })
    }

    /// Опросить провайдеров по порядку и вернуть первый успешный результат
    pub async fn generate(&self, request: &GenerationRequest) -> AppResult<ProviderResult> {
        let mut failures: Vec<ProviderFailure> = Vec::new();

        for provider in &self.providers {
            let provider_id = provider.provider_id();
            info!("Trying text provider {}", provider_id);

            let outcome = tokio::time::timeout(self.call_timeout, provider.generate(request)).await;

            match outcome {
                Ok(Ok(text)) => {
                    info!("Text provider {} succeeded", provider_id);
                    return Ok(ProviderResult {
                        provider: provider_id.to_string(),
                        text,
                    });
                }
                Ok(Err(error)) => {
                    warn!(
                        "Text provider {} failed ({}): {}",
                        provider_id, error.kind, error.message
                    );
                    failures.push(ProviderFailure::new(provider_id, error));
                }
                Err(_) => {
                    warn!(
                        "Text provider {} timed out after {:?}",
                        provider_id, self.call_timeout
                    );
                    failures.push(ProviderFailure::new(
                        provider_id,
                        ProviderCallError::new(
                            ProviderErrorKind::Timeout,
                            format!("No response within {:?}", self.call_timeout),
                        ),
                    ));
                }
            }
        }

        Err(AppError::AllProvidersFailed(failures))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Genre, StoryLength};
    use async_trait::async_trait;

    struct FailingProvider {
        id: &'static str,
        kind: ProviderErrorKind,
    }

    #[async_trait]
    impl TextGenerator for FailingProvider {
        fn provider_id(&self) -> &'static str {
            self.id
        }

        async fn generate(
            &self,
            _request: &GenerationRequest,
        ) -> Result<String, ProviderCallError> {
            Err(ProviderCallError::new(self.kind, "forced failure"))
        }
    }

    struct SucceedingProvider {
        id: &'static str,
        text: &'static str,
    }

    #[async_trait]
    impl TextGenerator for SucceedingProvider {
        fn provider_id(&self) -> &'static str {
            self.id
        }

        async fn generate(
            &self,
            _request: &GenerationRequest,
        ) -> Result<String, ProviderCallError> {
            Ok(self.text.to_string())
        }
    }

    struct HangingProvider;

    #[async_trait]
    impl TextGenerator for HangingProvider {
        fn provider_id(&self) -> &'static str {
            "hanging"
        }

        async fn generate(
            &self,
            _request: &GenerationRequest,
        ) -> Result<String, ProviderCallError> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            unreachable!("sleep should outlive the chain timeout")
        }
    }

    fn request() -> GenerationRequest {
        GenerationRequest::new("a dragon", Genre::Fantasy, StoryLength::Short)
    }

    #[tokio::test]
    async fn test_first_success_wins_and_is_tagged() {
        let chain = FallbackChain::new(
            vec![
                Box::new(FailingProvider {
                    id: "a",
                    kind: ProviderErrorKind::RateLimited,
                }),
                Box::new(SucceedingProvider {
                    id: "b",
                    text: "Once upon a time...",
                }),
                Box::new(SucceedingProvider {
                    id: "c",
                    text: "never reached",
                }),
            ],
            5,
        )
        .unwrap();

        let result = chain.generate(&request()).await.unwrap();
        assert_eq!(result.provider, "b");
        assert_eq!(result.text, "Once upon a time...");
    }

    #[tokio::test]
    async fn test_all_failures_are_aggregated_in_order() {
        let chain = FallbackChain::new(
            vec![
                Box::new(FailingProvider {
                    id: "a",
                    kind: ProviderErrorKind::RateLimited,
                }),
                Box::new(FailingProvider {
                    id: "b",
                    kind: ProviderErrorKind::Unavailable,
                }),
            ],
            5,
        )
        .unwrap();

        let err = chain.generate(&request()).await.unwrap_err();
        match err {
            AppError::AllProvidersFailed(failures) => {
                assert_eq!(failures.len(), 2);
                assert_eq!(failures[0].provider, "a");
                assert_eq!(failures[0].kind, ProviderErrorKind::RateLimited);
                assert_eq!(failures[1].provider, "b");
                assert_eq!(failures[1].kind, ProviderErrorKind::Unavailable);
            }
            other => panic!("Expected AllProvidersFailed, got {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_provider_times_out_and_chain_advances() {
        let chain = FallbackChain::new(
            vec![
                Box::new(HangingProvider),
                Box::new(SucceedingProvider {
                    id: "fast",
                    text: "made it",
                }),
            ],
            1,
        )
        .unwrap();

        let result = chain.generate(&request()).await.unwrap();
        assert_eq!(result.provider, "fast");
    }

    #[tokio::test]
    async fn test_empty_chain_is_rejected() {
        assert!(FallbackChain::new(vec![], 5).is_err());
    }
}
