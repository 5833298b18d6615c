//! Trait abstractions for runtime I/O
//!
//! These traits let the governor run against mock collaborators in tests.

use crate::db::SessionRecord;
use crate::llm::{LlmError, LlmRequest, LlmResponse};
use async_trait::async_trait;

/// Keyed blob store for session state
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Insert or replace the blob for a session
    async fn save(&self, id: &str, blob: &str) -> Result<(), String>;

    /// Fetch the blob for a session, if one was ever saved
    async fn load(&self, id: &str) -> Result<Option<String>, String>;

    /// Most recently updated sessions first
    async fn list_recent(&self, limit: usize) -> Result<Vec<SessionRecord>, String>;

    /// Remove one session, returning whether it existed
    async fn delete(&self, id: &str) -> Result<bool, String>;

    /// Remove every session, returning how many were removed
    async fn clear_all(&self) -> Result<usize, String>;
}

/// Client for making inference requests
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Complete an inference request
    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse, LlmError>;

    /// Get the model ID
    fn model_id(&self) -> &str;
}

// ============================================================================
// Arc implementations for trait objects
// ============================================================================

#[async_trait]
impl<T: SessionStore + ?Sized> SessionStore for Arc<T> {
    async fn save(&self, id: &str, blob: &str) -> Result<(), String> {
        (**self).save(id, blob).await
    }

    async fn load(&self, id: &str) -> Result<Option<String>, String> {
        (**self).load(id).await
    }

    async fn list_recent(&self, limit: usize) -> Result<Vec<SessionRecord>, String> {
        (**self).list_recent(limit).await
    }

    async fn delete(&self, id: &str) -> Result<bool, String> {
        (**self).delete(id).await
    }

    async fn clear_all(&self) -> Result<usize, String> {
        (**self).clear_all().await
    }
}

#[async_trait]
impl<T: LlmClient + ?Sized> LlmClient for Arc<T> {
    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse, LlmError> {
        (**self).complete(request).await
    }

    fn model_id(&self) -> &str {
        (**self).model_id()
    }
}

// ============================================================================
// Production Adapters
// ============================================================================

use crate::db::Database;
use crate::llm::InferenceBackend;
use std::sync::Arc;

/// Adapter to use Database as a SessionStore
#[derive(Clone)]
pub struct DatabaseStorage {
    db: Database,
}

impl DatabaseStorage {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl SessionStore for DatabaseStorage {
    async fn save(&self, id: &str, blob: &str) -> Result<(), String> {
        self.db.save_session(id, blob).map_err(|e| e.to_string())
    }

    async fn load(&self, id: &str) -> Result<Option<String>, String> {
        self.db
            .load_session(id)
            .map(|record| record.map(|r| r.blob))
            .map_err(|e| e.to_string())
    }

    async fn list_recent(&self, limit: usize) -> Result<Vec<SessionRecord>, String> {
        self.db
            .list_recent_sessions(limit)
            .map_err(|e| e.to_string())
    }

    async fn delete(&self, id: &str) -> Result<bool, String> {
        self.db.delete_session(id).map_err(|e| e.to_string())
    }

    async fn clear_all(&self) -> Result<usize, String> {
        self.db.clear_sessions().map_err(|e| e.to_string())
    }
}

#[async_trait]
impl LlmClient for InferenceBackend {
    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse, LlmError> {
        self.infer(request).await
    }

    fn model_id(&self) -> &str {
        InferenceBackend::model_id(self)
    }
}
