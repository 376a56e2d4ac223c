use std::sync::Arc;

use crate::analysis::Oracle;
use crate::config::Config;
use crate::layout::Measurement;
use crate::session::store::SessionStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Structuring/scoring oracle. Production: `LlmClient`; tests script replies.
    pub oracle: Arc<dyn Oracle>,
    pub sessions: SessionStore,
    /// Fixed at startup from `LAYOUT_MEASUREMENT`.
    pub measurement: Measurement,
    pub config: Config,
}

impl AppState {
    pub fn new(oracle: Arc<dyn Oracle>, config: Config) -> Self {
        Self {
            oracle,
            sessions: SessionStore::new(),
            measurement: config.layout_measurement,
            config,
        }
    }
}
