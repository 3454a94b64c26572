use std::time::Duration;

use teloxide::prelude::*;
use teloxide::types::{MessageId, ReplyParameters};

/// Telegram rejects message bodies longer than this.
pub const MESSAGE_LIMIT: usize = 4096;

/// Pause between consecutive chunks of one oversized reply.
pub const CHUNK_DELAY: Duration = Duration::from_millis(500);

/// Deliver `text` to `chat`. A reply that fits is sent once, reply-linked to
/// the triggering message. An oversized reply is split on line boundaries;
/// the first chunk is reply-linked and the rest are plain sends paced by
/// `delay` (zero in tests).
pub async fn dispatch(
    bot: &Bot,
    chat: ChatId,
    reply_to: MessageId,
    text: &str,
    delay: Duration,
) -> ResponseResult<()> {
    for (i, chunk) in split_reply(text, MESSAGE_LIMIT).iter().enumerate() {
        if i == 0 {
            bot.send_message(chat, chunk)
                .reply_parameters(ReplyParameters::new(reply_to))
                .await?;
        } else {
            tokio::time::sleep(delay).await;
            bot.send_message(chat, chunk).await?;
        }
    }
    Ok(())
}

/// Greedy line packing: whole lines are appended (each with a trailing
/// newline) until the next line would push the buffer past `max_len`, then
/// the buffer is flushed as a chunk. A single line longer than `max_len` is
/// never split mid-line and produces an oversized chunk (known limitation).
pub fn split_reply(text: &str, max_len: usize) -> Vec<String> {
    if text.len() <= max_len {
        return vec![text.to_string()];
    }

    let mut chunks = Vec::new();
    let mut current = String::new();

    for line in text.split('\n') {
        if !current.is_empty() && current.len() + line.len() + 1 > max_len {
            chunks.push(std::mem::take(&mut current));
        }
        current.push_str(line);
        current.push('\n');
    }

    if !current.is_empty() {
        chunks.push(current);
    }

    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_text_is_a_single_untouched_chunk() {
        let chunks = split_reply("a short answer", MESSAGE_LIMIT);
        assert_eq!(chunks, vec!["a short answer".to_string()]);
    }

    #[test]
    fn test_text_at_exactly_the_limit_is_not_split() {
        let text = "x".repeat(MESSAGE_LIMIT);
        assert_eq!(split_reply(&text, MESSAGE_LIMIT), vec![text]);
    }

    #[test]
    fn test_long_text_splits_on_line_boundaries_within_limit() {
        let line = "y".repeat(100);
        let text = vec![line.clone(); 90].join("\n");
        assert!(text.len() > MESSAGE_LIMIT);

        let chunks = split_reply(&text, MESSAGE_LIMIT);
        assert!(chunks.len() >= 3);
        for chunk in &chunks {
            assert!(chunk.len() <= MESSAGE_LIMIT);
            for line_part in chunk.trim_end().split('\n') {
                assert_eq!(line_part, line);
            }
        }
    }

    #[test]
    fn test_chunks_concatenate_back_to_the_original_lines() {
        let text = (0..400)
            .map(|i| format!("line number {i}"))
            .collect::<Vec<_>>()
            .join("\n");

        let chunks = split_reply(&text, 256);
        let rejoined = chunks.concat();
        let original_lines: Vec<&str> = text.split('\n').collect();
        let rejoined_lines: Vec<&str> =
            rejoined.split('\n').filter(|l| !l.is_empty()).collect();
        assert_eq!(original_lines, rejoined_lines);
    }

    #[test]
    fn test_nine_thousand_chars_make_at_least_three_chunks() {
        let text = vec!["z".repeat(89); 100].join("\n");
        assert_eq!(text.len(), 8999);
        let chunks = split_reply(&text, MESSAGE_LIMIT);
        assert!(chunks.len() >= 3);
        assert!(chunks.iter().all(|c| c.len() <= MESSAGE_LIMIT));
    }

    #[test]
    fn test_single_overlong_line_is_not_split() {
        let long_line = "w".repeat(MESSAGE_LIMIT + 500);
        let text = format!("before\n{long_line}\nafter");

        let chunks = split_reply(&text, MESSAGE_LIMIT);
        assert!(chunks.iter().any(|c| c.len() > MESSAGE_LIMIT));
        assert!(chunks.iter().any(|c| c.contains(&long_line)));
    }
}
