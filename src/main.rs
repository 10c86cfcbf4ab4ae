use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use teloxide::prelude::*;
use teloxide::types::{InlineQuery, Update};
use tracing::{info, warn};
use vote_bot::bot;
use vote_bot::config::{AppConfig, BOT_TOKEN_KEY};
use vote_bot::errors::error_logging;
use vote_bot::localization;
use vote_bot::observability;
use vote_bot::observability_config::ObservabilityConfig;
use vote_bot::session_lifecycle;
use vote_bot::vote_store::VoteStore;

#[tokio::main]
async fn main() -> Result<()> {
    let startup_time = std::time::Instant::now();

    // Load environment variables from .env file first
    dotenvy::dotenv().ok();

    // Logging comes up before anything that can fail
    observability::init_logging(&ObservabilityConfig::from_env())?;

    let config = AppConfig::from_env()
        .and_then(|config| config.validate().map(|_| config))
        .inspect_err(|e| error_logging::log_config_error(e, BOT_TOKEN_KEY, "load_config"))?;
    info!(summary = %config.summary(), "Configuration loaded");

    // The one store shared by the handlers and the sweeper
    let store = Arc::new(VoteStore::new());

    observability::init_metrics_export(&config.observability, Arc::clone(&store)).await?;

    let _sweeper_handle =
        session_lifecycle::start_expiry_sweeper(Arc::clone(&store), config.sweep.clone());
    info!(
        interval_secs = config.sweep.interval_secs,
        retention_secs = config.sweep.retention_secs,
        "Session expiry sweeper started"
    );

    let localization_manager = localization::create_localization_manager()?;

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.bot.http_timeout_secs))
        .build()?;

    let bot = Bot::with_client(config.bot.token.clone(), client);

    info!(
        bot_username = %config.bot.bot_username,
        http_timeout_secs = config.bot.http_timeout_secs,
        "Bot initialized, starting dispatcher"
    );

    let handler = dptree::entry()
        .branch(Update::filter_inline_query().endpoint({
            let store = Arc::clone(&store);
            let localization = Arc::clone(&localization_manager);
            move |bot: Bot, q: InlineQuery| {
                let store = Arc::clone(&store);
                let localization = Arc::clone(&localization);
                async move { bot::inline_query_handler(bot, q, store, localization).await }
            }
        }))
        .branch(Update::filter_callback_query().endpoint({
            let store = Arc::clone(&store);
            let localization = Arc::clone(&localization_manager);
            move |bot: Bot, q: CallbackQuery| {
                let store = Arc::clone(&store);
                let localization = Arc::clone(&localization);
                async move { bot::callback_handler(bot, q, store, localization).await }
            }
        }));

    observability::record_startup_metrics(startup_time.elapsed());

    Dispatcher::builder(bot, handler)
        .default_handler(|update: Arc<Update>| async move {
            observability::record_telegram_update("unhandled");
            warn!(update_id = %update.id.0, "Unknown update type, ignoring");
        })
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    Ok(())
}
