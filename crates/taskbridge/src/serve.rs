// SPDX-FileCopyrightText: 2026 Taskbridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `taskbridge serve` command implementation.
//!
//! Wires the webhook client, the serenity REST adapter and the workflow
//! orchestrator together, then runs the Discord gateway until SIGINT or
//! SIGTERM.

use std::sync::Arc;
use std::time::Duration;

use serenity::Client;
use serenity::all::Http;
use taskbridge_config::TaskbridgeConfig;
use taskbridge_core::TaskbridgeError;
use taskbridge_discord::convert::discord_error;
use taskbridge_discord::{Handler, SerenityDiscord, intents};
use taskbridge_webhook::WebhookClient;
use taskbridge_workflow::shutdown::{install_signal_handler, settle_cleanup};
use taskbridge_workflow::{Layout, Orchestrator};
use tracing::info;

/// How long pending thread cleanup may run after the gateway stops.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

/// Runs the `taskbridge serve` command.
pub async fn run_serve(config: TaskbridgeConfig) -> Result<(), TaskbridgeError> {
    init_tracing(&config.bot.log_level);

    info!(name = %config.bot.name, "starting taskbridge serve");

    let token = config
        .discord
        .bot_token
        .clone()
        .ok_or_else(|| TaskbridgeError::Config("discord.bot_token is required".into()))?;
    let layout = Layout::from_config(&config)?;
    let webhook = WebhookClient::new(&config.webhook)?;
    info!(base_url = %config.webhook.base_url, "webhook client initialized");

    let http = Arc::new(Http::new(&token));
    let discord = SerenityDiscord::connect(http).await?;
    let orchestrator = Arc::new(Orchestrator::new(
        Arc::new(discord),
        webhook,
        layout,
        &config.workflow,
    ));

    let handler = Handler::new(Arc::clone(&orchestrator), config.discord.register_commands);
    let mut client = Client::builder(&token, intents())
        .event_handler(handler)
        .await
        .map_err(|e| discord_error("failed to build gateway client", e))?;

    let cancel = install_signal_handler();
    let shard_manager = Arc::clone(&client.shard_manager);
    tokio::spawn(async move {
        cancel.cancelled().await;
        info!("stopping discord gateway");
        shard_manager.shutdown_all().await;
    });

    client
        .start()
        .await
        .map_err(|e| discord_error("discord gateway failed", e))?;

    let abandoned = settle_cleanup(orchestrator.lifecycle(), SHUTDOWN_GRACE).await;
    info!(abandoned, "taskbridge serve shutdown complete");
    Ok(())
}

/// Initializes the tracing subscriber with the given log level.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("taskbridge={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
