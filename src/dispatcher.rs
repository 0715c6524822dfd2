//! Turns a persona instruction and a cleaned chat message into exactly one
//! completion request.

use tracing::info;

use crate::llm::{LlmProvider, ProviderError};
use crate::prompt::{Substyle, make_prompt};

#[derive(Debug, Clone)]
pub struct Dispatcher {
    provider: LlmProvider,
    substyle: Substyle,
}

impl Dispatcher {
    pub fn new(provider: LlmProvider, substyle: Substyle) -> Self {
        Self { provider, substyle }
    }

    /// Format the prompt, send it, and return the model's text.
    ///
    /// Failures are returned as-is; there is no retry.
    pub async fn dispatch(&self, persona: &str, input: &str) -> Result<String, ProviderError> {
        let prompt = make_prompt(persona, input, self.substyle);

        info!(
            provider = self.provider.kind(),
            substyle = %self.substyle,
            %persona,
            %input,
            "dispatching completion"
        );

        let response = self.provider.complete(&prompt).await?;

        info!(%response, "completion received");
        Ok(response)
    }
}
