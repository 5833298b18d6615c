//! Session runtime
//!
//! The governor owns every session: it loads the session for an id,
//! serializes turns against it, routes the input to onboarding or the
//! active pipeline, and writes the result back.

mod governor;
pub mod traits;

#[cfg(test)]
pub mod testing;

pub use governor::{Governor, RESET_ACKNOWLEDGEMENT};
pub use traits::*;

use crate::llm::InferenceBackend;
use crate::state_machine::{Mode, Step};
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};

/// Type alias for the governor with production adapters
pub type ProductionGovernor = Governor<DatabaseStorage, InferenceBackend>;

/// Sampling temperature for every active turn
pub const TEMPERATURE: f32 = 0.9;

/// Output bound for every active turn
pub const MAX_OUTPUT_TOKENS: u32 = 8192;

#[derive(Debug, Clone)]
pub struct GovernorConfig {
    pub exclude_interrupts: bool,
    /// Credential lifetime used when no duration was recorded
    pub default_lifetime: Duration,
    pub temperature: f32,
    pub max_output_tokens: u32,
}

impl Default for GovernorConfig {
    fn default() -> Self {
        Self {
            exclude_interrupts: false,
            default_lifetime: Duration::hours(24),
            temperature: TEMPERATURE,
            max_output_tokens: MAX_OUTPUT_TOKENS,
        }
    }
}

/// Listing entry for a stored session
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionSummary {
    pub id: String,
    pub updated_at: DateTime<Utc>,
    /// `None` when the stored blob could not be decoded
    pub step: Option<Step>,
    pub mode: Option<Mode>,
}

/// Per-session mutual exclusion. Turns for the same id run one at a time;
/// different ids never contend beyond the table lookup.
///
/// An entry lives only while some caller holds or waits on it, so the table
/// stays bounded by the number of in-flight requests.
#[derive(Default)]
pub(crate) struct SessionLocks {
    locks: RwLock<HashMap<String, Arc<Mutex<()>>>>,
}

impl SessionLocks {
    async fn get(&self, id: &str) -> Arc<Mutex<()>> {
        if let Some(lock) = self.locks.read().await.get(id) {
            return Arc::clone(lock);
        }
        let mut locks = self.locks.write().await;
        Arc::clone(locks.entry(id.to_string()).or_default())
    }

    /// Wait for exclusive access to a session
    pub(crate) async fn acquire(&self, id: &str) -> OwnedMutexGuard<()> {
        self.get(id).await.lock_owned().await
    }

    /// Unlock, and drop the entry if nobody else is holding or waiting on it
    pub(crate) async fn release(&self, id: &str, guard: OwnedMutexGuard<()>) {
        drop(guard);
        let mut locks = self.locks.write().await;
        if locks.get(id).is_some_and(|lock| Arc::strong_count(lock) == 1) {
            locks.remove(id);
        }
    }

    /// Drop every idle entry
    pub(crate) async fn prune(&self) {
        self.locks
            .write()
            .await
            .retain(|_, lock| Arc::strong_count(lock) > 1);
    }

    pub(crate) async fn len(&self) -> usize {
        self.locks.read().await.len()
    }
}
