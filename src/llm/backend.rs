//! The configured model behind the gateway

use super::{GeminiService, LlmError, LlmRequest, LlmResponse, LlmService, MessageRole};
use crate::state_machine::Mode;
use std::sync::Arc;
use std::time::Instant;

/// Model used when `GEMINI_MODEL` is not set
pub const DEFAULT_MODEL: &str = "gemini-1.5-pro";

/// Inference settings read from the environment
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub gemini_api_key: Option<String>,
    pub model: String,
    /// Override for the API base URL (tests, proxies)
    pub base_url: Option<String>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            gemini_api_key: None,
            model: DEFAULT_MODEL.to_string(),
            base_url: None,
        }
    }
}

impl LlmConfig {
    pub fn from_env() -> Self {
        Self {
            gemini_api_key: std::env::var("GEMINI_API_KEY")
                .ok()
                .filter(|k| !k.is_empty()),
            model: std::env::var("GEMINI_MODEL")
                .ok()
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            base_url: std::env::var("GEMINI_BASE_URL").ok(),
        }
    }
}

/// Single inference backend. Without an API key there is no service and
/// every active turn fails with an auth error; onboarding still works.
pub struct InferenceBackend {
    service: Option<Arc<dyn LlmService>>,
    model_id: String,
}

impl InferenceBackend {
    pub fn from_config(config: &LlmConfig) -> Self {
        let service = config.gemini_api_key.as_ref().and_then(|api_key| {
            match GeminiService::new(api_key.clone(), &config.model, config.base_url.as_deref()) {
                Ok(service) => Some(Arc::new(service) as Arc<dyn LlmService>),
                Err(e) => {
                    tracing::error!(model = %config.model, error = %e, "Failed to create Gemini client");
                    None
                }
            }
        });

        Self {
            service,
            model_id: config.model.clone(),
        }
    }

    #[allow(dead_code)] // Fake backends in handler tests
    pub fn with_service(service: Arc<dyn LlmService>) -> Self {
        let model_id = service.model_id().to_string();
        Self {
            service: Some(service),
            model_id,
        }
    }

    pub fn model_id(&self) -> &str {
        &self.model_id
    }

    pub fn is_configured(&self) -> bool {
        self.service.is_some()
    }

    /// Run one active-session inference and log it against the session's mode
    pub async fn infer(&self, request: &LlmRequest) -> Result<LlmResponse, LlmError> {
        let service = self
            .service
            .as_ref()
            .ok_or_else(|| LlmError::auth("GEMINI_API_KEY is not configured"))?;

        let mode = request.mode.map_or("none", Mode::as_str);
        let user_turns = request
            .messages
            .iter()
            .filter(|m| m.role == MessageRole::User)
            .count();

        let start = Instant::now();
        let result = service.complete(request).await;
        let duration_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);

        match &result {
            Ok(response) => tracing::info!(
                model = %self.model_id,
                mode,
                user_turns,
                duration_ms,
                input_tokens = response.usage.input_tokens,
                output_tokens = response.usage.output_tokens,
                finish_reason = response.finish_reason.as_deref().unwrap_or("unknown"),
                "Inference completed"
            ),
            Err(e) => tracing::error!(
                model = %self.model_id,
                mode,
                user_turns,
                duration_ms,
                kind = ?e.kind,
                retryable = e.kind.is_retryable(),
                error = %e.message,
                "Inference failed"
            ),
        }

        result
    }
}
