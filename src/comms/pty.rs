//! PTY (console) comms channel: every stdin line is a message addressed to
//! the bot; posted messages and edits are printed to stdout.
//!
//! Useful with `llm.default = "dummy"` to watch the placeholder, throbber
//! and timeout behaviour without a Discord token. Runs until the `shutdown`
//! token is cancelled (Ctrl-C) or stdin is closed.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::state::{CommsEvent, CommsState};
use super::surface::ChatSurface;
use crate::error::AppError;
use crate::responder::respond;
use crate::runtime::{Component, ComponentFuture};

// ── ConsoleSurface ────────────────────────────────────────────────────────────

/// Prints messages as `[<channel> #<n>] text` and edits as `[#<n> edited] text`.
#[derive(Debug, Default)]
pub struct ConsoleSurface {
    next_id: AtomicU64,
}

impl ConsoleSurface {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ChatSurface for ConsoleSurface {
    type Channel = String;
    type Handle = u64;
    const MAX_MESSAGE_CHARS: usize = usize::MAX;

    async fn send(&self, channel: &String, text: &str) -> Result<u64, AppError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        println!("[{channel} #{id}] {text}");
        Ok(id)
    }

    async fn edit(&self, handle: &u64, text: &str) -> Result<(), AppError> {
        println!("[#{handle} edited] {text}");
        Ok(())
    }
}

// ── PtyChannel ────────────────────────────────────────────────────────────────

pub struct PtyChannel {
    channel_id: String,
    state: Arc<CommsState>,
}

impl PtyChannel {
    pub fn new(channel_id: impl Into<String>, state: Arc<CommsState>) -> Self {
        Self { channel_id: channel_id.into(), state }
    }
}

impl Component for PtyChannel {
    fn id(&self) -> &str {
        &self.channel_id
    }

    fn run(self: Box<Self>, shutdown: CancellationToken) -> ComponentFuture {
        Box::pin(run_pty(self.channel_id, self.state, shutdown))
    }
}

// ── run_pty ───────────────────────────────────────────────────────────────────

async fn run_pty(
    channel_id: String,
    state: Arc<CommsState>,
    shutdown: CancellationToken,
) -> Result<(), AppError> {
    info!(%channel_id, "pty channel started: type a message and press Enter. Ctrl-C to quit.");
    state.report_event(CommsEvent::ChannelReady {
        channel_id: channel_id.clone(),
        detail: format!("{} is listening on the console", state.persona_name()),
    });

    let stdin = BufReader::new(tokio::io::stdin());
    serve_lines(&channel_id, &state, stdin, &shutdown).await;

    state.report_event(CommsEvent::ChannelShutdown { channel_id });
    Ok(())
}

/// Answer each non-empty line from `reader` until EOF or `shutdown`.
///
/// Shutdown is also watched while a reply is outstanding; cancelling drops
/// the in-flight race and leaves its placeholder unedited.
async fn serve_lines<R>(channel_id: &String, state: &CommsState, reader: R, shutdown: &CancellationToken)
where
    R: AsyncBufRead + Unpin,
{
    let surface = ConsoleSurface::new();
    let mut lines = reader.lines();

    loop {
        let line = tokio::select! {
            biased;
            _ = shutdown.cancelled() => break,
            line = lines.next_line() => line,
        };

        let input = match line {
            Err(e) => {
                warn!("pty read error: {e}");
                break;
            }
            Ok(None) => {
                info!("pty stdin closed");
                break;
            }
            Ok(Some(input)) => input,
        };
        let input = input.trim();
        if input.is_empty() {
            continue;
        }

        debug!(%input, "pty received line");
        tokio::select! {
            biased;
            _ = shutdown.cancelled() => {
                info!(%channel_id, "shutdown during reply, dropping it");
                break;
            }
            res = respond(&surface, channel_id, state, input) => match res {
                Ok(resolution) => debug!(?resolution, "pty reply resolved"),
                Err(e) => warn!("pty reply abandoned: {e}"),
            },
        }
    }
    info!(%channel_id, "closing console channel");
}
