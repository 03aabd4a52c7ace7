#[macro_use]
extern crate log;
#[macro_use]
extern crate async_trait;

mod components;
mod gopal;

use components::*;
use gopal::*;
use serenity::prelude::GatewayIntents;
use serenity::Client;
use songbird::SerenityInit;
use std::sync::Arc;

#[tokio::main]
async fn main() {
    if let Err(error) = log4rs::init_file("log4rs.yaml", Default::default()) {
        eprintln!("Logging is not configured: {}.", error);
    }

    let settings = match Settings::load() {
        Ok(settings) => settings,
        Err(error) => {
            error!("Settings loading failed: {}.", error);
            return;
        }
    };
    let l10n = match L10n::load(&settings.lang) {
        Ok(l10n) => l10n,
        Err(error) => {
            error!("Localization loading failed: {}.", error);
            return;
        }
    };

    let player = Arc::new(DiscordPlayer::new(
        YoutubeSearch::new(settings.youtube_api_key.clone()),
        settings.voice_session_configuration(),
    ));
    let handler = GopalCommandsHandlerConstructor {
        player: player.clone(),
        history_size: settings.history_size,
        l10n,
    }
    .build();

    let intents = GatewayIntents::non_privileged() | GatewayIntents::MESSAGE_CONTENT;
    let mut client = match Client::builder(&settings.discord_token, intents)
        .event_handler(handler)
        .register_songbird()
        .await
    {
        Ok(client) => client,
        Err(error) => {
            error!("Client creation failed: {}.", error);
            return;
        }
    };

    let shard_manager = client.shard_manager.clone();
    tokio::spawn(async move {
        if let Err(error) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl-C: {}.", error);
            return;
        }
        let closed = player.shutdown().await;
        info!("Ctrl-C received, closed {} voice sessions.", closed.len());
        shard_manager.lock().await.shutdown_all().await;
    });

    if let Err(error) = client.start().await {
        error!("Client error: {}.", error);
    }
}
