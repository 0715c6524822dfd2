//! Channel runtime: runs the configured chat channels side by side.
//!
//! Each channel is a [`Component`] that owns its shared state and watches a
//! common [`CancellationToken`]. [`ChannelSet::spawn`] starts them all;
//! [`ChannelSet::join`] waits for every one to exit. A channel that fails
//! or panics cancels the token, so the others wind down with it.

use std::future::Future;
use std::pin::Pin;

use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::error::AppError;

/// A boxed, owned future returned by [`Component::run`].
pub type ComponentFuture =
    Pin<Box<dyn Future<Output = Result<(), AppError>> + Send + 'static>>;

/// One chat channel (Discord gateway, console).
pub trait Component: Send + 'static {
    /// Channel id used in log messages, e.g. `discord0`.
    fn id(&self) -> &str;

    /// Run until `shutdown` is cancelled or the channel's input ends.
    fn run(self: Box<Self>, shutdown: CancellationToken) -> ComponentFuture;
}

/// The running channels and the token that stops them.
pub struct ChannelSet {
    tasks: JoinSet<(String, Result<(), AppError>)>,
    shutdown: CancellationToken,
}

impl ChannelSet {
    /// Spawn every component on the current runtime.
    pub fn spawn(components: Vec<Box<dyn Component>>, shutdown: CancellationToken) -> Self {
        let mut tasks = JoinSet::new();
        for component in components {
            let id = component.id().to_string();
            debug!(channel = %id, "spawning channel");
            let run = component.run(shutdown.clone());
            tasks.spawn(async move { (id, run.await) });
        }
        Self { tasks, shutdown }
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Wait for every channel to exit. Returns the first failure, if any.
    pub async fn join(mut self) -> Result<(), AppError> {
        let mut first_err = None;

        while let Some(joined) = self.tasks.join_next().await {
            let err = match joined {
                Ok((id, Ok(()))) => {
                    info!(channel = %id, "channel exited");
                    continue;
                }
                Ok((id, Err(e))) => {
                    error!(channel = %id, "channel failed: {e}");
                    e
                }
                Err(e) => {
                    error!("channel task panicked: {e}");
                    AppError::Comms(format!("channel task panicked: {e}"))
                }
            };
            self.shutdown.cancel();
            first_err.get_or_insert(err);
        }

        first_err.map_or(Ok(()), Err)
    }
}
