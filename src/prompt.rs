use crate::llm::{CompletionRequest, RequestInput, Role, Turn};

/// Page text is cut to this many characters before it is wrapped in the
/// summarization prompt.
pub const MAX_PAGE_PROMPT_LEN: usize = 4000;

/// Reply sent when an extracted page is too short to be worth summarizing.
pub const NOT_ENOUGH_TEXT_REPLY: &str =
    "I couldn't find enough readable text on that page to summarize.";

/// Reply sent when the page could not be fetched at all.
pub const PAGE_FETCH_FAILED_REPLY: &str =
    "I couldn't open that link. The page may be down or blocking me.";

/// Reply sent when the photo's file link could not be resolved.
pub const PHOTO_FETCH_FAILED_REPLY: &str =
    "I couldn't download that photo. Please try sending it again.";

fn persona(sender_name: &str) -> String {
    format!(
        "You are Diko, a friendly Telegram assistant. You are chatting with {sender_name}. \
         Reply in the same language the user writes in, and keep answers clear and concise."
    )
}

/// Static /start and new-member greeting, no model call involved.
pub fn greeting(sender_name: &str) -> String {
    format!("Hello {sender_name}! Welcome to the AI bot. Please ask your questions.")
}

pub fn direct_reply(sender_name: &str, text: &str) -> CompletionRequest {
    CompletionRequest {
        instructions: persona(sender_name),
        input: RequestInput::Text(text.to_string()),
    }
}

/// Continue a reply-threaded exchange: the bot's earlier answer followed by
/// the user's follow-up, under the same persona.
pub fn continue_chain(sender_name: &str, prior: &str, current: &str) -> CompletionRequest {
    CompletionRequest {
        instructions: persona(sender_name),
        input: RequestInput::Turns(vec![
            Turn {
                role: Role::Assistant,
                text: prior.to_string(),
            },
            Turn {
                role: Role::User,
                text: current.to_string(),
            },
        ]),
    }
}

pub fn summarize_page(url: &str, page_text: &str) -> CompletionRequest {
    let truncated = truncate_on_char_boundary(page_text, MAX_PAGE_PROMPT_LEN);
    CompletionRequest {
        instructions: "You summarize web pages. Write 3 to 5 sentences covering the main \
                       points of the page. Skip navigation, ads, and boilerplate. Reply in \
                       the language the page is written in."
            .to_string(),
        input: RequestInput::Text(format!("Page content from {url}:\n\n{truncated}")),
    }
}

pub fn describe_image(sender_name: &str, caption: &str, image_url: &str) -> CompletionRequest {
    CompletionRequest {
        instructions: format!(
            "You are Diko, a friendly Telegram assistant with vision. {sender_name} sent you \
             a photo. Describe what the photo shows and answer the caption. Reply in the \
             same language as the caption."
        ),
        input: RequestInput::ImageWithCaption {
            caption: caption.to_string(),
            image_url: image_url.to_string(),
        },
    }
}

fn truncate_on_char_boundary(text: &str, max_len: usize) -> &str {
    if text.len() <= max_len {
        return text;
    }
    let mut end = max_len;
    while end > 0 && !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}
