//! API request and response types

use crate::runtime::SessionSummary;
use serde::{Deserialize, Serialize};

/// Session id used when a request does not name one
pub const DEFAULT_SESSION_ID: &str = "default";

/// `?session=` selector accepted by every session endpoint
#[derive(Debug, Default, Deserialize)]
pub struct SessionQuery {
    pub session: Option<String>,
}

impl SessionQuery {
    /// The named session, if the request named one
    pub fn explicit_id(&self) -> Option<&str> {
        self.session
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    pub fn id(&self) -> &str {
        self.explicit_id().unwrap_or(DEFAULT_SESSION_ID)
    }
}

/// `?limit=` for session listing
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub limit: Option<usize>,
}

/// Request to send a chat message
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
}

/// Reply to a chat message
#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub response: String,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ResetResponse {
    pub status: String,
    /// First onboarding prompt for the fresh session
    pub prompt: String,
}

#[derive(Debug, Serialize)]
pub struct ExportResponse {
    pub log: String,
}

#[derive(Debug, Serialize)]
pub struct SessionListResponse {
    pub sessions: Vec<SessionSummary>,
}

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub deleted: bool,
}

#[derive(Debug, Serialize)]
pub struct ClearResponse {
    pub cleared: usize,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}
