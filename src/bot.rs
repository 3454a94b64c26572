use std::sync::Arc;

use anyhow::Result;
use teloxide::prelude::*;
use teloxide::types::{ChatAction, Me};
use tracing::{error, info, warn};

use crate::config::Config;
use crate::dispatch;
use crate::llm::{CompletionRequest, LlmClient};
use crate::prompt;
use crate::router::{classify, InboundMessage, RoutingDecision};
use crate::web;

/// Shared application state. `me` is fetched once at startup, before the
/// dispatcher runs, and only read afterwards.
pub struct AppState {
    pub config: Config,
    pub llm: LlmClient,
    pub me: Me,
}

impl AppState {
    pub fn new(config: Config, me: Me) -> Self {
        let llm = LlmClient::new(config.llm.clone());
        Self { config, llm, me }
    }
}

/// Start the Telegram bot
pub async fn run(bot: Bot, state: Arc<AppState>) -> Result<()> {
    info!("Starting Telegram bot...");

    let handler = Update::filter_message().endpoint(handle_message);

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![state])
        .default_handler(|upd| async move {
            warn!("Unhandled update: {:?}", upd.id);
        })
        .error_handler(LoggingErrorHandler::with_custom_text("bot"))
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    Ok(())
}

async fn handle_message(bot: Bot, msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    // Members joining a group get the same greeting as /start.
    if let Some(members) = msg.new_chat_members() {
        for member in members {
            bot.send_message(msg.chat.id, prompt::greeting(&member.first_name))
                .await?;
        }
        return Ok(());
    }

    let Some(inbound) = InboundMessage::from_telegram(&msg, &state.me) else {
        return Ok(());
    };

    info!(
        "Message from {} (chat {}): {}",
        inbound.sender_name, msg.chat.id, inbound.text
    );

    let decision = classify(
        &inbound,
        &state.config.bot.trigger_keyword,
        &state.config.bot.summarize_keyword,
    );

    match decision {
        RoutingDecision::Ignore => {}
        RoutingDecision::Greet => {
            bot.send_message(msg.chat.id, prompt::greeting(&inbound.sender_name))
                .await?;
        }
        RoutingDecision::DirectReply => {
            let request = prompt::direct_reply(&inbound.sender_name, &inbound.text);
            respond(&bot, &state, &msg, &request).await?;
        }
        RoutingDecision::ContinueChain { prior } => {
            let request = prompt::continue_chain(&inbound.sender_name, &prior, &inbound.text);
            respond(&bot, &state, &msg, &request).await?;
        }
        RoutingDecision::SummarizeLink { url } => {
            bot.send_chat_action(msg.chat.id, ChatAction::Typing)
                .await
                .ok();
            match web::fetch_page_text(&url).await {
                Ok(text) if text.len() >= web::MIN_EXTRACTED_LEN => {
                    let request = prompt::summarize_page(&url, &text);
                    respond(&bot, &state, &msg, &request).await?;
                }
                Ok(_) => {
                    reply_text(&bot, &msg, prompt::NOT_ENOUGH_TEXT_REPLY).await?;
                }
                Err(e) => {
                    error!("Failed to fetch {}: {:#}", url, e);
                    reply_text(&bot, &msg, prompt::PAGE_FETCH_FAILED_REPLY).await?;
                }
            }
        }
        RoutingDecision::DescribeImage => {
            match resolve_photo_url(&bot, &msg).await {
                Some(image_url) => {
                    let request =
                        prompt::describe_image(&inbound.sender_name, &inbound.text, &image_url);
                    respond(&bot, &state, &msg, &request).await?;
                }
                None => {
                    reply_text(&bot, &msg, prompt::PHOTO_FETCH_FAILED_REPLY).await?;
                }
            }
        }
    }

    Ok(())
}

/// Run the completion call and deliver the result, chunked if oversized.
async fn respond(
    bot: &Bot,
    state: &AppState,
    msg: &Message,
    request: &CompletionRequest,
) -> ResponseResult<()> {
    bot.send_chat_action(msg.chat.id, ChatAction::Typing)
        .await
        .ok();

    let reply = state.llm.complete(request).await;
    dispatch::dispatch(bot, msg.chat.id, msg.id, &reply, dispatch::CHUNK_DELAY).await
}

async fn reply_text(bot: &Bot, msg: &Message, text: &str) -> ResponseResult<()> {
    dispatch::dispatch(bot, msg.chat.id, msg.id, text, dispatch::CHUNK_DELAY).await
}

/// Resolve the largest photo of `msg` to a downloadable file URL.
async fn resolve_photo_url(bot: &Bot, msg: &Message) -> Option<String> {
    let photo = msg.photo().and_then(|sizes| sizes.last())?;
    match bot.get_file(photo.file.id.clone()).await {
        Ok(file) => Some(format!(
            "https://api.telegram.org/file/bot{}/{}",
            bot.token(),
            file.path
        )),
        Err(e) => {
            error!("Failed to resolve photo file link: {}", e);
            None
        }
    }
}
