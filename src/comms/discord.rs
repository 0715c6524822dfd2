//! Discord comms channel: listens on the gateway for messages that mention
//! the bot and answers each one with a placeholder that is edited in place.
//!
//! Every gateway event is handled in its own task by serenity, so two
//! mentions arriving together run two independent replies.

use std::sync::{Arc, OnceLock};

use serenity::async_trait;
use serenity::builder::EditMessage;
use serenity::client::{Client, Context, EventHandler};
use serenity::http::Http;
use serenity::model::channel::Message;
use serenity::model::gateway::{GatewayIntents, Ready};
use serenity::model::id::{ChannelId, MessageId, UserId};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::state::{CommsEvent, CommsState};
use super::surface::ChatSurface;
use crate::error::AppError;
use crate::mention::{Addressing, strip_mention};
use crate::responder::respond;
use crate::runtime::{Component, ComponentFuture};

// ── Constants ─────────────────────────────────────────────────────────────────

/// Discord rejects message content longer than 2000 characters.
const MAX_MESSAGE_LENGTH: usize = 2000;

// ── DiscordSurface ────────────────────────────────────────────────────────────

/// A message the bot posted and may edit later.
#[derive(Debug, Clone, Copy)]
pub struct PostedMessage {
    pub channel_id: ChannelId,
    pub message_id: MessageId,
}

/// Posts and edits through serenity's REST client.
pub struct DiscordSurface {
    http: Arc<Http>,
}

impl DiscordSurface {
    pub fn new(http: Arc<Http>) -> Self {
        Self { http }
    }
}

impl ChatSurface for DiscordSurface {
    type Channel = ChannelId;
    type Handle = PostedMessage;
    const MAX_MESSAGE_CHARS: usize = MAX_MESSAGE_LENGTH;

    async fn send(&self, channel: &ChannelId, text: &str) -> Result<PostedMessage, AppError> {
        let message = channel
            .say(&*self.http, text)
            .await
            .map_err(|e| AppError::Comms(format!("discord send to {channel} failed: {e}")))?;
        Ok(PostedMessage { channel_id: message.channel_id, message_id: message.id })
    }

    async fn edit(&self, handle: &PostedMessage, text: &str) -> Result<(), AppError> {
        handle
            .channel_id
            .edit_message(&*self.http, handle.message_id, EditMessage::new().content(text))
            .await
            .map(|_| ())
            .map_err(|e| AppError::Comms(format!("discord edit of {} failed: {e}", handle.message_id)))
    }
}

// ── Handler ───────────────────────────────────────────────────────────────────

struct Handler {
    channel_id: String,
    state: Arc<CommsState>,
    /// Learned from the `Ready` event; messages before it are ignored.
    bot_id: OnceLock<UserId>,
}

#[async_trait]
impl EventHandler for Handler {
    async fn ready(&self, _ctx: Context, ready: Ready) {
        let _ = self.bot_id.set(ready.user.id);
        let detail = format!(
            "{} is ready. Connected to {} guild(s).",
            self.state.persona_name(),
            ready.guilds.len()
        );
        info!(bot_user = %ready.user.name, bot_id = %ready.user.id, "{detail}");
        self.state.report_event(CommsEvent::ChannelReady {
            channel_id: self.channel_id.clone(),
            detail,
        });
    }

    async fn message(&self, ctx: Context, msg: Message) {
        let Some(bot_id) = self.bot_id.get().copied() else {
            debug!("ignoring message received before ready");
            return;
        };

        let mentioned: Vec<u64> = msg.mentions.iter().map(|u| u.id.get()).collect();
        let addressing = Addressing {
            author_id: msg.author.id.get(),
            bot_id: bot_id.get(),
            mentioned: &mentioned,
            content: &msg.content,
        };
        if !addressing.is_for_bot() {
            return;
        }

        info!(
            author = %msg.author.name,
            channel = %msg.channel_id,
            "mention received"
        );

        let payload = strip_mention(&msg.content, bot_id.get());
        let surface = DiscordSurface::new(ctx.http.clone());

        match respond(&surface, &msg.channel_id, &self.state, &payload).await {
            Ok(resolution) => debug!(?resolution, message_id = %msg.id, "reply resolved"),
            Err(e) => warn!(message_id = %msg.id, "reply abandoned: {e}"),
        }
    }
}

// ── DiscordChannel ────────────────────────────────────────────────────────────

pub struct DiscordChannel {
    channel_id: String,
    state: Arc<CommsState>,
    token: Option<String>,
}

impl DiscordChannel {
    pub fn new(channel_id: impl Into<String>, state: Arc<CommsState>, token: Option<String>) -> Self {
        Self { channel_id: channel_id.into(), state, token }
    }
}

impl Component for DiscordChannel {
    fn id(&self) -> &str {
        &self.channel_id
    }

    fn run(self: Box<Self>, shutdown: CancellationToken) -> ComponentFuture {
        Box::pin(run_discord(self.channel_id, self.state, self.token, shutdown))
    }
}

// ── run_discord ───────────────────────────────────────────────────────────────

async fn run_discord(
    channel_id: String,
    state: Arc<CommsState>,
    token: Option<String>,
    shutdown: CancellationToken,
) -> Result<(), AppError> {
    let Some(token) = token else {
        warn!(%channel_id, "DISCORD_TOKEN not set, discord channel exiting");
        return Ok(());
    };

    info!(%channel_id, "discord channel starting");

    // Message content is a privileged intent; enable it on the bot's settings page.
    let intents = GatewayIntents::GUILD_MESSAGES
        | GatewayIntents::DIRECT_MESSAGES
        | GatewayIntents::MESSAGE_CONTENT;

    let handler = Handler {
        channel_id: channel_id.clone(),
        state: state.clone(),
        bot_id: OnceLock::new(),
    };

    let mut client = Client::builder(&token, intents)
        .event_handler(handler)
        .await
        .map_err(|e| AppError::Comms(format!("failed to build discord client: {e}")))?;

    let shard_manager = client.shard_manager.clone();

    tokio::select! {
        biased;

        _ = shutdown.cancelled() => {
            info!(%channel_id, "shutdown signal received: closing discord channel");
            shard_manager.shutdown_all().await;
        }
        res = client.start() => {
            res.map_err(|e| AppError::Comms(format!("discord gateway error: {e}")))?;
            warn!(%channel_id, "discord client exited unexpectedly");
        }
    }

    state.report_event(CommsEvent::ChannelShutdown { channel_id });
    Ok(())
}
