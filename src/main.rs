mod bot;
mod config;
mod dispatch;
mod llm;
mod prompt;
mod router;
mod web;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use teloxide::prelude::*;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::bot::AppState;
use crate::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,dikobot=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("config.toml"));

    info!("Loading configuration from: {}", config_path.display());
    let config = Config::load(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;

    info!("Configuration loaded successfully");
    info!("  Model: {}", config.llm.model);
    info!("  Vision model: {}", config.llm.vision_model);
    info!("  Trigger keyword: {}", config.bot.trigger_keyword);

    let bot = Bot::new(&config.telegram.bot_token);

    // The identity must be in place before the first update is handled; the
    // classifier reads it to recognize replies to the bot's own messages.
    let me = bot
        .get_me()
        .await
        .context("Failed to fetch the bot's own identity")?;
    info!("Authorized as @{}", me.username());

    let state = Arc::new(AppState::new(config, me));

    info!("Bot is starting...");
    bot::run(bot, state).await?;

    Ok(())
}
