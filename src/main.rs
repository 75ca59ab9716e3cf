use anyhow::Result;
use serenity::{model::gateway::GatewayIntents, Client};
use std::sync::Arc;
use tracing::{error, info};

mod bot;
mod catalog;
mod config;
mod cooldown;
mod error;
mod hashtags;
mod lookup;
mod selection;
mod service;
mod storage;
mod sync;
mod ui;

use crate::bot::VideoBot;
use crate::config::Config;
use crate::service::VideoService;

#[tokio::main]
async fn main() -> Result<()> {
    // Inicializar logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("clip_curator=debug".parse()?)
                .add_directive("serenity=info".parse()?),
        )
        .init();

    info!("🎬 Iniciando Clip Curator v{}", env!("CARGO_PKG_VERSION"));

    // Cargar configuración
    let config = Arc::new(Config::load()?);
    info!("{}", config.summary());

    // Abrir catálogo y sincronizar caches
    let service = Arc::new(VideoService::create(&config).await?);

    // Solo se usan slash commands
    let intents = GatewayIntents::GUILDS;

    let handler = VideoBot::new(config.clone(), service.clone());
    let mut client = Client::builder(&config.discord_token, intents)
        .event_handler(handler)
        .await?;

    // Manejar shutdown graceful
    let shard_manager = client.shard_manager.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("⚠️ Señal de shutdown recibida, cerrando...");
                shard_manager.shutdown_all().await;
            }
            Err(e) => error!("Error al registrar Ctrl+C: {:?}", e),
        }
    });

    info!("🚀 Bot iniciado exitosamente");
    if let Err(why) = client.start().await {
        error!("Error al ejecutar cliente: {:?}", why);
    }

    service.close().await?;
    Ok(())
}
