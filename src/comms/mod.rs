//! Comms subsystem: the chat surfaces the bot answers on.
//!
//! # Architecture
//!
//! Each channel (Discord, PTY) implements [`runtime::Component`] and is
//! spawned as an independent task by [`start`]. Channels capture the shared
//! [`Arc<CommsState>`] at construction time and hand every qualifying
//! message to [`responder::respond`] through their own [`ChatSurface`].
//!
//! An intra-subsystem [`mpsc`] channel lets running channels signal the
//! comms manager (ready, shutdown). It is drained by a short-lived
//! background task that dies when all channel senders are dropped.
//!
//! [`runtime::Component`]: crate::runtime::Component
//! [`responder::respond`]: crate::responder::respond

mod state;
mod surface;
#[cfg(feature = "channel-discord")]
pub mod discord;
#[cfg(feature = "channel-pty")]
pub mod pty;

pub use state::{CommsEvent, CommsState};
pub use surface::ChatSurface;

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::config::Config;
use crate::error::AppError;
use crate::runtime::{ChannelSet, Component};

// ── start ─────────────────────────────────────────────────────────────────────

/// Build the shared state, spawn all configured channels and return a
/// [`ChannelSet`].
///
/// Fails only when the shared state cannot be built (e.g. an unknown LLM
/// provider). Channel failures surface through [`ChannelSet::join`].
pub fn start(config: &Config, shutdown: CancellationToken) -> Result<ChannelSet, AppError> {
    let (event_tx, event_rx) = mpsc::channel::<CommsEvent>(32);
    let state = Arc::new(CommsState::from_config(config, event_tx)?);

    let mut components: Vec<Box<dyn Component>> = Vec::new();

    #[cfg(feature = "channel-discord")]
    {
        if config.comms_discord_should_load() {
            info!("loading discord channel");
            components.push(Box::new(discord::DiscordChannel::new(
                "discord0",
                state.clone(),
                config.discord_token.clone(),
            )));
        }
    }

    #[cfg(feature = "channel-pty")]
    {
        if config.comms_pty_should_load() {
            info!("loading pty channel");
            components.push(Box::new(pty::PtyChannel::new("pty0", state.clone())));
        }
    }

    if components.is_empty() {
        info!("no comms channels configured");
    }

    // Drop our own sender copy so the drain ends once every channel is gone.
    drop(state);

    tokio::spawn(async move {
        let mut rx = event_rx;
        while let Some(event) = rx.recv().await {
            match event {
                CommsEvent::ChannelReady { ref channel_id, ref detail } => {
                    info!(%channel_id, %detail, "channel ready");
                }
                CommsEvent::ChannelShutdown { ref channel_id } => {
                    debug!(%channel_id, "channel reported shutdown");
                }
            }
        }
    });

    Ok(ChannelSet::spawn(components, shutdown))
}
