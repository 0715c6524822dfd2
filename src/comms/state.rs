//! Shared state for the comms subsystem.
//!
//! Built once at startup and handed to every channel as `Arc<CommsState>`.
//! Everything in it is read-only after construction, so concurrent replies
//! never contend on it.
//!
//! # Intra-subsystem events
//!
//! [`CommsState::report_event`] lets a running channel signal the comms
//! manager (e.g. "gateway ready", "I shut down") without any shared mutable
//! state. The manager owns the receiver end.

use std::time::Duration;

use tokio::sync::mpsc;
use tracing::warn;

use crate::config::Config;
use crate::dispatcher::Dispatcher;
use crate::error::AppError;
use crate::llm::providers;
use crate::throbber::Throbber;

// ── Events ────────────────────────────────────────────────────────────────────

/// Events a channel sends back to the comms subsystem manager.
#[derive(Debug)]
pub enum CommsEvent {
    /// Channel connected and is accepting messages.
    ChannelReady { channel_id: String, detail: String },
    /// Channel has stopped (clean exit or EOF).
    ChannelShutdown { channel_id: String },
}

// ── State ─────────────────────────────────────────────────────────────────────

pub struct CommsState {
    persona_name: String,
    persona_instruction: String,
    dispatcher: Dispatcher,
    response_timeout: Duration,
    throbber: Throbber,
    placeholder: String,
    show_prompt_marker: String,
    event_tx: mpsc::Sender<CommsEvent>,
}

impl CommsState {
    /// Build the LLM provider and reply settings from config.
    pub fn from_config(config: &Config, event_tx: mpsc::Sender<CommsEvent>) -> Result<Self, AppError> {
        let provider = providers::build(&config.llm, config.llm_api_key.clone())
            .map_err(|e| AppError::Config(e.to_string()))?;

        let throbber = if config.throbber.enabled {
            Throbber::new(config.throbber.style, config.throbber.frame_time)
        } else {
            Throbber::disabled()
        };

        Ok(Self {
            persona_name: config.persona.name.clone(),
            persona_instruction: config.persona.instruction.clone(),
            dispatcher: Dispatcher::new(provider, config.llm.substyle),
            response_timeout: config.llm.response_timeout,
            throbber,
            placeholder: config.comms.discord.placeholder.clone(),
            show_prompt_marker: config.comms.discord.show_prompt_marker.clone(),
            event_tx,
        })
    }

    pub fn persona_name(&self) -> &str {
        &self.persona_name
    }

    pub fn persona_instruction(&self) -> &str {
        &self.persona_instruction
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    pub fn response_timeout(&self) -> Duration {
        self.response_timeout
    }

    pub fn throbber(&self) -> &Throbber {
        &self.throbber
    }

    pub fn placeholder(&self) -> &str {
        &self.placeholder
    }

    pub fn show_prompt_marker(&self) -> &str {
        &self.show_prompt_marker
    }

    /// Report an event to the comms subsystem manager.
    ///
    /// Non-blocking: drops the event and logs a warning if the manager is not
    /// keeping up (channel full) or has already exited (closed).
    pub fn report_event(&self, event: CommsEvent) {
        if let Err(e) = self.event_tx.try_send(event) {
            warn!("comms event dropped: {e}");
        }
    }
}

// ── test helpers ──────────────────────────────────────────────────────────────

#[cfg(test)]
impl CommsState {
    /// State over [`Config::test_default`] with a few knobs exposed.
    pub fn for_test(response_timeout: Duration, dummy_delay: Duration) -> Self {
        let mut config = Config::test_default();
        config.llm.response_timeout = response_timeout;
        config.llm.dummy.delay = dummy_delay;
        let (event_tx, _event_rx) = mpsc::channel(8);
        Self::from_config(&config, event_tx).expect("test config must build")
    }
}
