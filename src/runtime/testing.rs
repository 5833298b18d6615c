//! Mock implementations for testing
//!
//! These mocks enable governor tests without a database or network.

use super::traits::*;
use crate::db::SessionRecord;
use crate::llm::{LlmError, LlmRequest, LlmResponse};
use crate::session::Session;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Duration;

// ============================================================================
// Mock LLM Client
// ============================================================================

/// Mock inference client that returns queued responses
pub struct MockLlmClient {
    responses: Mutex<VecDeque<Result<LlmResponse, LlmError>>>,
    model_id: String,
    delay: Option<Duration>,
    /// Record of all requests made
    pub requests: Mutex<Vec<LlmRequest>>,
}

impl MockLlmClient {
    pub fn new(model_id: impl Into<String>) -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            model_id: model_id.into(),
            delay: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Sleep before answering, to widen race windows
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Queue a successful response
    pub fn queue_response(&self, response: LlmResponse) {
        self.responses.lock().unwrap().push_back(Ok(response));
    }

    pub fn queue_text(&self, text: &str) {
        self.queue_response(LlmResponse::from_text(text));
    }

    /// Queue an error response
    pub fn queue_error(&self, error: LlmError) {
        self.responses.lock().unwrap().push_back(Err(error));
    }

    /// Get recorded requests
    pub fn recorded_requests(&self) -> Vec<LlmRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl LlmClient for MockLlmClient {
    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse, LlmError> {
        self.requests.lock().unwrap().push(request.clone());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(LlmError::network("No mock response queued")))
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}

// ============================================================================
// In-memory session store
// ============================================================================

struct StoredBlob {
    blob: String,
    updated_at: DateTime<Utc>,
    sequence: u64,
}

/// Session store backed by a map. Recency is tracked with a write counter
/// so listing order is deterministic.
#[derive(Default)]
pub struct MemoryStore {
    sessions: Mutex<HashMap<String, StoredBlob>>,
    sequence: AtomicU64,
    fail_saves: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a blob directly, bypassing serialization
    pub fn insert_raw(&self, id: &str, blob: &str) {
        let sequence = self.sequence.fetch_add(1, Ordering::SeqCst);
        self.sessions.lock().unwrap().insert(
            id.to_string(),
            StoredBlob {
                blob: blob.to_string(),
                updated_at: Utc::now(),
                sequence,
            },
        );
    }

    pub fn blob(&self, id: &str) -> Option<String> {
        self.sessions
            .lock()
            .unwrap()
            .get(id)
            .map(|s| s.blob.clone())
    }

    /// Decode the stored session; panics on a malformed blob
    pub fn session(&self, id: &str) -> Option<Session> {
        self.blob(id).map(|b| Session::from_blob(&b).unwrap())
    }

    /// Make every subsequent save fail
    pub fn set_fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn save(&self, id: &str, blob: &str) -> Result<(), String> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err("disk full".to_string());
        }
        self.insert_raw(id, blob);
        Ok(())
    }

    async fn load(&self, id: &str) -> Result<Option<String>, String> {
        Ok(self.blob(id))
    }

    async fn list_recent(&self, limit: usize) -> Result<Vec<SessionRecord>, String> {
        let sessions = self.sessions.lock().unwrap();
        let mut entries: Vec<_> = sessions.iter().collect();
        entries.sort_by(|a, b| b.1.sequence.cmp(&a.1.sequence));
        Ok(entries
            .into_iter()
            .take(limit)
            .map(|(id, stored)| SessionRecord {
                id: id.clone(),
                blob: stored.blob.clone(),
                updated_at: stored.updated_at,
            })
            .collect())
    }

    async fn delete(&self, id: &str) -> Result<bool, String> {
        Ok(self.sessions.lock().unwrap().remove(id).is_some())
    }

    async fn clear_all(&self) -> Result<usize, String> {
        let mut sessions = self.sessions.lock().unwrap();
        let removed = sessions.len();
        sessions.clear();
        Ok(removed)
    }
}
