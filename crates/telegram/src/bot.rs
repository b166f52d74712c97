//! Bot construction and the long-polling loop.

use std::{future::Future, pin::Pin, sync::Arc};

use {
    secrecy::ExposeSecret,
    teloxide::{
        ApiError, RequestError,
        prelude::*,
        types::{AllowedUpdate, BotCommand, Message, UpdateKind},
    },
    tokio_util::sync::CancellationToken,
    tracing::{debug, error, info, warn},
};

use {courier_config::TelegramConfig, courier_dispatch::Dispatcher};

use crate::{handlers, workers::ChatWorkers};

/// Build the bot, verify its credentials and return it together with its
/// username (needed for the dispatcher's addressing rules).
pub async fn connect(config: &TelegramConfig) -> anyhow::Result<(Bot, Option<String>)> {
    // Client timeout longer than the long-polling timeout (30s) so the HTTP
    // client doesn't abort the request before Telegram responds.
    let client = teloxide::net::default_reqwest_settings()
        .timeout(std::time::Duration::from_secs(45))
        .build()?;
    let bot = Bot::with_client(config.token.expose_secret(), client);

    let me = bot.get_me().await?;
    let bot_username = me.username.clone();

    // Delete any existing webhook so long polling works.
    bot.delete_webhook().send().await?;

    // Register slash commands for autocomplete in Telegram clients.
    let commands = vec![
        BotCommand::new("new_session", "Start a named session"),
        BotCommand::new("switch", "Switch to a named session"),
        BotCommand::new("sessions", "List sessions"),
        BotCommand::new("reset", "Clear the active session"),
        BotCommand::new("delete", "Delete a named session"),
    ];
    if let Err(e) = bot.set_my_commands(commands).await {
        warn!("failed to register bot commands: {e}");
    }

    info!(username = ?bot_username, "telegram bot connected (webhook cleared)");
    Ok((bot, bot_username))
}

/// Start the manual polling loop.
///
/// Spawns a background task that processes updates until the returned
/// `CancellationToken` is cancelled. Each chat gets its own worker task, so
/// one chat's slow backend turn never stalls polling or the other chats,
/// while messages within a chat are handled strictly in arrival order.
pub fn start_polling(bot: Bot, dispatcher: Arc<Dispatcher>) -> CancellationToken {
    let cancel = CancellationToken::new();

    let cancel_clone = cancel.clone();
    tokio::spawn(async move {
        info!("starting telegram manual polling loop");
        let mut offset: i32 = 0;

        let workers = ChatWorkers::new({
            let bot = bot.clone();
            let dispatcher = Arc::clone(&dispatcher);
            move |msg: Message| {
                let bot = bot.clone();
                let dispatcher = Arc::clone(&dispatcher);
                Box::pin(async move {
                    if let Err(e) = handlers::handle_message(msg, &bot, &dispatcher).await {
                        error!(error = %e, "error handling telegram message");
                    }
                }) as Pin<Box<dyn Future<Output = ()> + Send>>
            }
        });

        loop {
            if cancel_clone.is_cancelled() {
                info!("telegram polling stopped");
                break;
            }

            let result = bot
                .get_updates()
                .offset(offset)
                .timeout(30)
                .allowed_updates(vec![AllowedUpdate::Message])
                .await;

            match result {
                Ok(updates) => {
                    debug!(count = updates.len(), "got telegram updates");
                    for update in updates {
                        offset = update.id.as_offset();
                        match update.kind {
                            UpdateKind::Message(msg) => {
                                debug!(chat_id = msg.chat.id.0, "received telegram message");
                                workers.deliver(msg.chat.id.0, msg);
                            },
                            other => {
                                debug!("ignoring non-message update: {other:?}");
                            },
                        }
                    }
                },
                Err(e) => {
                    // Conflict means another instance is polling with the
                    // same token; stop rather than fight over updates.
                    if matches!(&e, RequestError::Api(ApiError::TerminatedByOtherGetUpdates)) {
                        error!(
                            "telegram polling stopped: another instance is already running with this token"
                        );
                        cancel_clone.cancel();
                        break;
                    }

                    warn!(error = %e, "telegram getUpdates failed");
                    tokio::time::sleep(std::time::Duration::from_secs(5)).await;
                },
            }
        }
    });

    cancel
}
