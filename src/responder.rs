//! Answer one message addressed to the bot.
//!
//! Per message: optionally echo the prompt, post a placeholder, race the
//! completion against the response timeout while the throbber spins, then
//! edit the placeholder exactly once with whichever outcome won.
//!
//! ```text
//! RECEIVED → PLACEHOLDER_SENT → RACING → { Answered | TimedOut | Failed }
//! ```
//!
//! Nothing here is shared between messages: two concurrent calls run two
//! independent races against two different placeholders.

use tracing::{debug, error, warn};

use crate::comms::ChatSurface;
use crate::comms::CommsState;
use crate::error::AppError;
use crate::mention::take_marker;
use crate::race::{RaceOutcome, race_with_timeout};

/// Written to the placeholder when the model does not answer in time.
pub const TIMEOUT_NOTICE: &str = "`LLM not responding!`";
/// Written to the placeholder when the completion request itself failed.
pub const FAILURE_NOTICE: &str = "`LLM request failed!`";
/// Stand-in for a blank completion; platforms reject empty edits.
pub const EMPTY_REPLY: &str = "(empty response)";

/// Terminal state of one reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Answered,
    TimedOut,
    Failed,
}

/// Reply to `payload` (already stripped of the bot mention) on `channel`.
///
/// Completion failures are contained here: they are logged and shown as
/// [`FAILURE_NOTICE`]. Only chat surface errors are returned.
pub async fn respond<S: ChatSurface>(
    surface: &S,
    channel: &S::Channel,
    state: &CommsState,
    payload: &str,
) -> Result<Resolution, AppError> {
    let persona = state.persona_instruction();
    let (input, show_prompt) = take_marker(payload, state.show_prompt_marker());

    if show_prompt {
        let max = S::MAX_MESSAGE_CHARS;
        surface.send(channel, &fit_reply(&format!("`PROMPT: {persona}`"), max)).await?;
        surface.send(channel, &fit_reply(&format!("`INPUT: {input}`"), max)).await?;
    }

    let placeholder = surface.send(channel, state.placeholder()).await?;
    debug!("placeholder sent, racing completion");

    let throbber = state.throbber();
    let outcome = race_with_timeout(
        state.dispatcher().dispatch(persona, &input),
        throbber.spin(std::io::stderr()),
        state.response_timeout(),
    )
    .await;
    throbber.clear(std::io::stderr());

    let (text, resolution) = match outcome {
        RaceOutcome::Completed(Ok(reply)) => (fit_reply(&reply, S::MAX_MESSAGE_CHARS), Resolution::Answered),
        RaceOutcome::Completed(Err(e)) => {
            error!(error = %e, "completion failed");
            (FAILURE_NOTICE.to_string(), Resolution::Failed)
        }
        RaceOutcome::TimedOut => {
            warn!(timeout_secs = state.response_timeout().as_secs(), "LLM not responding!");
            (TIMEOUT_NOTICE.to_string(), Resolution::TimedOut)
        }
    };

    surface.edit(&placeholder, &text).await?;
    Ok(resolution)
}

/// Make `reply` acceptable as a single message of at most `max_chars`.
pub fn fit_reply(reply: &str, max_chars: usize) -> String {
    if reply.trim().is_empty() {
        return EMPTY_REPLY.to_string();
    }
    if max_chars == 0 || reply.chars().count() <= max_chars {
        return reply.to_string();
    }
    let mut out: String = reply.chars().take(max_chars - 1).collect();
    out.push('…');
    out
}
