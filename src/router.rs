use once_cell::sync::Lazy;
use regex::Regex;
use teloxide::types::{Me, Message};

/// Platform-agnostic view of one incoming Telegram message. Built from a
/// `teloxide::types::Message` and consumed within a single handler call.
#[derive(Debug, Clone)]
pub struct InboundMessage {
    pub sender_name: String,
    pub is_private: bool,
    /// Message text, or the caption for photo messages.
    pub text: String,
    pub reply: Option<RepliedTo>,
    pub has_photo: bool,
}

/// The message this one was sent in reply to, if any.
#[derive(Debug, Clone)]
pub struct RepliedTo {
    pub text: String,
    pub from_bot: bool,
}

impl InboundMessage {
    /// Returns `None` for messages with no text or caption to route on.
    pub fn from_telegram(msg: &Message, me: &Me) -> Option<Self> {
        let text = msg.text().or_else(|| msg.caption())?.to_string();

        let sender_name = msg
            .from
            .as_ref()
            .map(|user| user.first_name.clone())
            .unwrap_or_else(|| "there".to_string());

        let reply = msg.reply_to_message().map(|replied| RepliedTo {
            text: replied
                .text()
                .or_else(|| replied.caption())
                .unwrap_or_default()
                .to_string(),
            from_bot: replied
                .from
                .as_ref()
                .is_some_and(|user| user.id == me.user.id),
        });

        Some(Self {
            sender_name,
            is_private: msg.chat.is_private(),
            text,
            reply,
            has_photo: msg.photo().is_some(),
        })
    }
}

/// How the bot should respond to one inbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoutingDecision {
    Greet,
    Ignore,
    DirectReply,
    /// Continue a reply-threaded exchange; `prior` is the bot's own earlier
    /// message the user replied to.
    ContinueChain {
        prior: String,
    },
    SummarizeLink {
        url: String,
    },
    DescribeImage,
}

/// Decide whether and how to respond. Rules are evaluated top to bottom and
/// the first match wins, so ordering encodes priority.
///
/// Summarization always requires an explicit request: the trigger keyword
/// plus the summarize keyword, either in a reply to a message carrying the
/// link or inline next to the link itself.
pub fn classify(msg: &InboundMessage, trigger: &str, summarize_kw: &str) -> RoutingDecision {
    if is_start_command(&msg.text) {
        return RoutingDecision::Greet;
    }

    let asks_summary =
        contains_keyword(&msg.text, trigger) && contains_keyword(&msg.text, summarize_kw);

    if let Some(reply) = &msg.reply {
        if asks_summary {
            if let Some(url) = find_url(&reply.text) {
                return RoutingDecision::SummarizeLink { url };
            }
        }
        if reply.from_bot {
            return RoutingDecision::ContinueChain {
                prior: reply.text.clone(),
            };
        }
    }

    if msg.has_photo && contains_keyword(&msg.text, trigger) {
        return RoutingDecision::DescribeImage;
    }

    if asks_summary {
        if let Some(url) = find_url(&msg.text) {
            return RoutingDecision::SummarizeLink { url };
        }
    }

    if msg.is_private || contains_keyword(&msg.text, trigger) {
        return RoutingDecision::DirectReply;
    }

    RoutingDecision::Ignore
}

fn is_start_command(text: &str) -> bool {
    let first_word = text.split_whitespace().next().unwrap_or("");
    first_word == "/start" || first_word.starts_with("/start@")
}

/// Case-insensitive substring containment, not a word-boundary match.
fn contains_keyword(text: &str, keyword: &str) -> bool {
    text.to_lowercase().contains(&keyword.to_lowercase())
}

static URL_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"https?://\S+").expect("static URL pattern"));

/// First http(s) URL in `text`: the scheme prefix followed by a greedy
/// non-whitespace run. Later URLs are ignored.
pub fn find_url(text: &str) -> Option<String> {
    URL_PATTERN.find(text).map(|m| m.as_str().to_string())
}
