//! Dummy LLM provider: echoes input back prefixed with `[echo]`.
//! Used to try the bot end to end without a completion server.

use std::time::Duration;

use crate::llm::ProviderError;

#[derive(Debug, Clone, Default)]
pub struct DummyProvider {
    /// Simulated latency, so the throbber and timeout paths can be seen.
    delay: Duration,
}

impl DummyProvider {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }

    pub async fn complete(&self, content: &str) -> Result<String, ProviderError> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        Ok(format!("[echo] {content}"))
    }
}
