//! HTTP API for the gateway

mod handlers;
mod types;

pub use handlers::create_router;

use crate::runtime::ProductionGovernor;
use std::sync::Arc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub governor: Arc<ProductionGovernor>,
}

impl AppState {
    pub fn new(governor: ProductionGovernor) -> Self {
        Self {
            governor: Arc::new(governor),
        }
    }
}
