//! Gemini inference for active sessions
//!
//! Only the active-session pipeline talks to the model. A request is the
//! consented mode's system instruction plus the alternating turn history;
//! a reply is text, or a classified failure that the governor turns into a
//! `Backend Error` without charging the risk budget.

mod backend;
mod error;
mod gemini;
mod types;

pub use backend::{InferenceBackend, LlmConfig};
pub use error::{LlmError, LlmErrorKind};
pub use gemini::GeminiService;
pub use types::*;

use async_trait::async_trait;

/// Wire client for one hosted model
#[async_trait]
pub trait LlmService: Send + Sync {
    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse, LlmError>;

    fn model_id(&self) -> &str;
}
