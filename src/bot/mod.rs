//! # Bot Module
//!
//! Thin Discord layer over [`VideoService`].
//!
//! - Slash command registration and dispatch
//! - Autocomplete for video names
//! - Background maintenance (periodic cache synchronization)
//! - Delivery of removal notices to the moderation log channel
//!
//! Handlers only parse options, call the service and render the result;
//! none of them touch the caches directly.

use anyhow::Result;
use serenity::{
    all::{ChannelId, Context, EventHandler, GuildId, Http, Interaction, Ready},
    async_trait,
};
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{error, info, warn};

pub mod commands;
pub mod handlers;

use crate::{
    config::Config,
    service::{unix_now, VideoRemoved, VideoService},
    ui::embeds::category_emoji,
};

/// Main Discord event handler.
pub struct VideoBot {
    /// Bot configuration loaded from environment variables
    config: Arc<Config>,
    /// Owner of the catalog and every cache
    service: Arc<VideoService>,
    /// `ready` fires again on reconnect; background tasks start once
    tasks_started: AtomicBool,
}

impl VideoBot {
    pub fn new(config: Arc<Config>, service: Arc<VideoService>) -> Self {
        Self {
            config,
            service,
            tasks_started: AtomicBool::new(false),
        }
    }

    /// Registers slash commands with Discord.
    ///
    /// Guild commands propagate in about a second, global ones can take up
    /// to an hour, so `GUILD_ID` is handy during development.
    async fn register_commands(&self, ctx: &Context) -> Result<()> {
        info!("📝 Registrando comandos slash...");

        match self.config.guild_id {
            Some(guild_id) => {
                info!("🏠 Registrando comandos para guild específica: {}", guild_id);
                let guild_id = GuildId::new(guild_id);

                if !ctx.cache.guilds().contains(&guild_id) {
                    warn!("⚠️ El bot no está en la guild especificada: {}", guild_id);
                    return Ok(());
                }

                commands::register_guild_commands(ctx, guild_id).await.map_err(|e| {
                    error!("❌ Error registrando comandos de guild: {:?}", e);
                    anyhow::anyhow!("No se pudieron registrar comandos de guild. Verifica que el bot tenga permisos de 'applications.commands' en la guild.")
                })?;
                info!("✅ Comandos de guild registrados para: {}", guild_id);
            }
            None => {
                info!("🌐 Registrando comandos globalmente");
                commands::register_global_commands(ctx).await.map_err(|e| {
                    error!("❌ Error registrando comandos globales: {:?}", e);
                    anyhow::anyhow!("No se pudieron registrar comandos globales. Verifica que el bot tenga permisos de 'applications.commands'.")
                })?;
                info!("✅ Comandos globales registrados");
            }
        }

        Ok(())
    }

    fn start_background_tasks(&self, ctx: &Context) {
        if self.tasks_started.swap(true, Ordering::SeqCst) {
            return;
        }

        let service = self.service.clone();
        let interval = self.config.sync_interval;
        tokio::spawn(async move {
            maintenance_tasks(service, interval).await;
        });

        match self.config.mod_log_channel_id {
            Some(channel_id) => {
                let removals = self.service.subscribe_removals();
                let http = ctx.http.clone();
                tokio::spawn(async move {
                    notify_removals(http, ChannelId::new(channel_id), removals).await;
                });
            }
            None => info!("ℹ️ MOD_LOG_CHANNEL_ID no configurado, avisos de eliminación desactivados"),
        }
    }
}

#[async_trait]
impl EventHandler for VideoBot {
    async fn ready(&self, ctx: Context, ready: Ready) {
        info!("🤖 {} está en línea!", ready.user.name);
        info!("📊 Conectado a {} servidores", ready.guilds.len());

        if let Err(e) = self.register_commands(&ctx).await {
            error!("Error al registrar comandos: {:?}", e);
        }

        self.start_background_tasks(&ctx);
    }

    async fn interaction_create(&self, ctx: Context, interaction: Interaction) {
        match interaction {
            Interaction::Command(command) => {
                if let Err(e) = handlers::handle_command(&ctx, command, self).await {
                    error!("Error manejando comando: {:?}", e);
                }
            }
            Interaction::Autocomplete(autocomplete) => {
                if let Err(e) = handlers::handle_autocomplete(&ctx, autocomplete, self).await {
                    error!("Error en autocompletado: {:?}", e);
                }
            }
            _ => {}
        }
    }
}

/// Re-runs the cache synchronizer every `interval_secs`.
///
/// Startup already ran one pass, so the first tick is skipped. Failures are
/// logged and retried on the next tick.
async fn maintenance_tasks(service: Arc<VideoService>, interval_secs: u64) {
    let mut interval = tokio::time::interval(tokio::time::Duration::from_secs(interval_secs));
    interval.tick().await;

    loop {
        interval.tick().await;

        match service.resync(unix_now()).await {
            Ok(report) if report.is_clean() => info!("🧹 Sincronización periódica sin cambios"),
            Ok(_) => info!("🧹 Sincronización periódica aplicó correcciones"),
            Err(e) => warn!("Error en sincronización periódica: {:?}", e),
        }
    }
}

async fn notify_removals(http: Arc<Http>, channel: ChannelId, mut removals: broadcast::Receiver<VideoRemoved>) {
    loop {
        match removals.recv().await {
            Ok(event) => {
                if let Err(e) = channel.say(&http, removal_notice(&event)).await {
                    warn!("⚠️ No se pudo enviar aviso de eliminación: {:?}", e);
                }
            }
            Err(RecvError::Lagged(skipped)) => warn!("⚠️ Se perdieron {} avisos de eliminación", skipped),
            Err(RecvError::Closed) => break,
        }
    }
}

fn removal_notice(event: &VideoRemoved) -> String {
    format!(
        "🗑️ **{}** ({} {}) added by **{}** was deleted by **{}**\n<{}>",
        event.video_name,
        category_emoji(event.category),
        event.category,
        event.original_contributor,
        event.deleted_by,
        event.original_url
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Category;

    #[test]
    fn test_removal_notice_names_everyone_involved() {
        let notice = removal_notice(&VideoRemoved {
            video_name: "cat".into(),
            category: Category::Green,
            deleted_by: "mod".into(),
            original_contributor: "alice".into(),
            original_url: "https://cdn.discordapp.com/attachments/1/2/cat.mp4".into(),
        });
        assert_eq!(
            notice,
            "🗑️ **cat** (🟢 green) added by **alice** was deleted by **mod**\n<https://cdn.discordapp.com/attachments/1/2/cat.mp4>"
        );
    }
}
