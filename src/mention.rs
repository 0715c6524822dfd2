//! Deciding whether a chat message is addressed to the bot, and cutting the
//! mention (and other markers) out of its text.

/// Remove the first occurrence of `token` from `input`, joining the text on
/// either side. Returns `input` unchanged when `token` is absent or empty.
pub fn cut_out(input: &str, token: &str) -> String {
    if token.is_empty() {
        return input.to_string();
    }
    match input.split_once(token) {
        Some((before, after)) => {
            let mut out = String::with_capacity(input.len() - token.len());
            out.push_str(before);
            out.push_str(after);
            out
        }
        None => input.to_string(),
    }
}

/// `<@ID>`: how Discord writes a user mention in message text.
pub fn mention_token(bot_id: u64) -> String {
    format!("<@{bot_id}>")
}

/// `<@!ID>`: the older nickname form some clients still send.
fn nickname_mention_token(bot_id: u64) -> String {
    format!("<@!{bot_id}>")
}

/// Strip the bot's mention from `content`.
///
/// Only the first mention is removed; any further mentions are passed on to
/// the model as ordinary text.
pub fn strip_mention(content: &str, bot_id: u64) -> String {
    let plain = mention_token(bot_id);
    if content.contains(&plain) {
        return cut_out(content, &plain);
    }
    cut_out(content, &nickname_mention_token(bot_id))
}

/// The identity facts of an inbound message that decide whether to answer.
#[derive(Debug, Clone, Copy)]
pub struct Addressing<'a> {
    pub author_id: u64,
    pub bot_id: u64,
    /// Ids of users the platform resolved as mentioned.
    pub mentioned: &'a [u64],
    pub content: &'a str,
}

impl Addressing<'_> {
    /// True when the bot should answer: not its own message, the bot is
    /// mentioned, and its id appears in the text. The last check screens
    /// out `@everyone`, `@here` and role pings.
    pub fn is_for_bot(&self) -> bool {
        self.author_id != self.bot_id
            && self.mentioned.contains(&self.bot_id)
            && self.content.contains(&self.bot_id.to_string())
    }
}

/// Pull `marker` out of `payload`, reporting whether it was present.
pub fn take_marker(payload: &str, marker: &str) -> (String, bool) {
    if !marker.is_empty() && payload.contains(marker) {
        (cut_out(payload, marker), true)
    } else {
        (payload.to_string(), false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BOT: u64 = 1_119_445_227_732_742_265;

    #[test]
    fn cut_out_without_token_is_noop() {
        for p in ["", "hello", "no mention here <@12>", "<@", "emoji 🦀 text"] {
            assert_eq!(cut_out(p, "<@999>"), p);
        }
    }

    #[test]
    fn cut_out_removes_single_occurrence_preserving_order() {
        assert_eq!(cut_out("<@999> hi there", "<@999>"), " hi there");
        assert_eq!(cut_out("hi <@999> there", "<@999>"), "hi  there");
        assert_eq!(cut_out("hi there <@999>", "<@999>"), "hi there ");
        assert_eq!(cut_out("<@999>", "<@999>"), "");
    }

    #[test]
    fn cut_out_only_removes_first_occurrence() {
        assert_eq!(cut_out("a <@1> b <@1> c", "<@1>"), "a  b <@1> c");
    }

    #[test]
    fn cut_out_empty_token_is_noop() {
        assert_eq!(cut_out("abc", ""), "abc");
    }

    #[test]
    fn strip_plain_mention() {
        let msg = format!("<@{BOT}> edit this headline");
        assert_eq!(strip_mention(&msg, BOT), " edit this headline");
    }

    #[test]
    fn strip_nickname_mention() {
        let msg = format!("hey <@!{BOT}>, what's up");
        assert_eq!(strip_mention(&msg, BOT), "hey , what's up");
    }

    #[test]
    fn plain_mention_preferred_over_nickname() {
        let msg = format!("<@!{BOT}> and <@{BOT}>");
        assert_eq!(strip_mention(&msg, BOT), format!("<@!{BOT}> and "));
    }

    #[test]
    fn addressed_when_mentioned_by_someone_else() {
        let content = format!("<@{BOT}> hello");
        let a = Addressing { author_id: 42, bot_id: BOT, mentioned: &[BOT], content: &content };
        assert!(a.is_for_bot());
    }

    #[test]
    fn ignores_own_messages() {
        let content = format!("<@{BOT}> hello");
        let a = Addressing { author_id: BOT, bot_id: BOT, mentioned: &[BOT], content: &content };
        assert!(!a.is_for_bot());
    }

    #[test]
    fn ignores_messages_without_mention() {
        let a = Addressing { author_id: 42, bot_id: BOT, mentioned: &[7], content: "<@7> hi" };
        assert!(!a.is_for_bot());
    }

    #[test]
    fn ignores_broadcast_pings() {
        // Platform resolved the bot as mentioned via @everyone, but its id is not in the text.
        let a = Addressing { author_id: 42, bot_id: BOT, mentioned: &[BOT], content: "@everyone standup" };
        assert!(!a.is_for_bot());
    }

    #[test]
    fn marker_is_taken_once() {
        let (rest, found) = take_marker(" [show_prompt] fix my typo", "[show_prompt]");
        assert!(found);
        assert_eq!(rest, "  fix my typo");

        let (rest, found) = take_marker("plain", "[show_prompt]");
        assert!(!found);
        assert_eq!(rest, "plain");
    }
}
