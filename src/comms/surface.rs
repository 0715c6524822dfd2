//! The two things the bot needs from a chat platform: post a message and
//! later edit it in place.

use std::future::Future;

use crate::error::AppError;

pub trait ChatSurface: Sync {
    /// Where messages are posted (a Discord channel, the console…).
    type Channel: Sync;
    /// Refers to one posted message so it can be edited later.
    type Handle: Send + Sync;

    /// Longest text the platform accepts in a single message, in characters.
    const MAX_MESSAGE_CHARS: usize;

    fn send(
        &self,
        channel: &Self::Channel,
        text: &str,
    ) -> impl Future<Output = Result<Self::Handle, AppError>> + Send;

    /// Replace the content of a previously sent message.
    fn edit(
        &self,
        handle: &Self::Handle,
        text: &str,
    ) -> impl Future<Output = Result<(), AppError>> + Send;
}
