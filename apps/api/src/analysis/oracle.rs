//! The oracle seam: one JSON-producing call, swappable for tests.
//!
//! `AppState` holds an `Arc<dyn Oracle>`. Production uses [`LlmClient`]; tests script replies.

use async_trait::async_trait;
use serde_json::Value;

use crate::llm_client::{LlmClient, LlmError};

#[async_trait]
pub trait Oracle: Send + Sync {
    /// Sends one prompt and returns the decoded JSON reply.
    async fn generate_json(&self, prompt: &str, system: &str) -> Result<Value, LlmError>;
}

#[async_trait]
impl Oracle for LlmClient {
    async fn generate_json(&self, prompt: &str, system: &str) -> Result<Value, LlmError> {
        self.call_json::<Value>(prompt, system).await
    }
}
