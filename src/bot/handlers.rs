use anyhow::Result;
use serenity::{
    builder::{
        CreateAutocompleteResponse, CreateEmbed, CreateInteractionResponse,
        CreateInteractionResponseMessage, EditInteractionResponse,
    },
    model::{application::CommandInteraction, id::RoleId},
    prelude::Context,
};
use tracing::{error, info};
use url::Url;

use crate::{
    bot::VideoBot,
    catalog::{Category, IdentifierKind, NewVideo, VideoRecord},
    cooldown::{format_cooldown, to_seconds},
    error::VideoError,
    hashtags::EditMode,
    lookup::{format_suggestion, MAX_SUGGESTIONS},
    service::{unix_now, PromoteOutcome, RecolorOutcome},
    ui::embeds,
};

/// Hosts serving Discord message attachments
const ATTACHMENT_HOSTS: &[&str] = &["cdn.discordapp.com", "media.discordapp.net"];

/// Maneja comandos slash
pub async fn handle_command(ctx: &Context, command: CommandInteraction, bot: &VideoBot) -> Result<()> {
    info!(
        "📝 Comando /{} usado por {} en guild {:?}",
        command.data.name, command.user.name, command.guild_id
    );

    match command.data.name.as_str() {
        "randomvid" => handle_randomvid(ctx, &command, bot).await?,
        "vid" => handle_vid(ctx, &command, bot).await?,
        "vids" => handle_vids(ctx, &command, bot).await?,
        "delvid" => handle_delvid(ctx, &command, bot).await?,
        "changevidcolour" => handle_changevidcolour(ctx, &command, bot).await?,
        "addhof" => handle_addhof(ctx, &command, bot).await?,
        "hof" => handle_hof(ctx, &command, bot).await?,
        "addhashtags" => handle_hashtag_edit(ctx, &command, bot, EditMode::Add).await?,
        "removehashtags" => handle_hashtag_edit(ctx, &command, bot, EditMode::Remove).await?,
        "hashtags" => handle_hashtags(ctx, &command, bot).await?,
        "getvid" => handle_getvid(ctx, &command, bot).await?,
        "findvid" => handle_findvid(ctx, &command, bot).await?,
        "totalvids" => handle_totalvids(ctx, &command, bot).await?,
        "uservids" => handle_uservids(ctx, &command, bot).await?,
        "showcooldown" => handle_showcooldown(ctx, &command, bot).await?,
        "updatecooldown" => handle_updatecooldown(ctx, &command, bot).await?,
        _ => reply(ctx, &command, "❌ Unknown command", true).await?,
    }

    Ok(())
}

/// Responde al autocompletado de nombres de video
pub async fn handle_autocomplete(ctx: &Context, autocomplete: CommandInteraction, bot: &VideoBot) -> Result<()> {
    let input = autocomplete
        .data
        .autocomplete()
        .map(|focused| focused.value.to_string())
        .unwrap_or_default();

    let mut response = CreateAutocompleteResponse::new();
    for video in bot.service.suggest(&input).into_iter().take(MAX_SUGGESTIONS) {
        response = response.add_string_choice(format_suggestion(&video), video.name);
    }

    autocomplete
        .create_response(&ctx.http, CreateInteractionResponse::Autocomplete(response))
        .await?;
    Ok(())
}

fn string_option<'a>(command: &'a CommandInteraction, name: &str) -> Option<&'a str> {
    command
        .data
        .options
        .iter()
        .find(|opt| opt.name == name)
        .and_then(|opt| opt.value.as_str())
}

fn required_string<'a>(command: &'a CommandInteraction, name: &str) -> Result<&'a str> {
    string_option(command, name).ok_or_else(|| anyhow::anyhow!("Opción {} no proporcionada", name))
}

async fn reply(ctx: &Context, command: &CommandInteraction, content: impl Into<String>, ephemeral: bool) -> Result<()> {
    command
        .create_response(
            &ctx.http,
            CreateInteractionResponse::Message(
                CreateInteractionResponseMessage::new()
                    .content(content)
                    .ephemeral(ephemeral),
            ),
        )
        .await?;
    Ok(())
}

async fn reply_embed(ctx: &Context, command: &CommandInteraction, embed: CreateEmbed) -> Result<()> {
    command
        .create_response(
            &ctx.http,
            CreateInteractionResponse::Message(CreateInteractionResponseMessage::new().embed(embed)),
        )
        .await?;
    Ok(())
}

/// Convierte un error del servicio en una respuesta para el usuario
async fn reply_error(ctx: &Context, command: &CommandInteraction, err: VideoError) -> Result<()> {
    match err {
        VideoError::DuplicateConflict(conflicts) => {
            reply_embed(ctx, command, embeds::create_conflicts_embed(&conflicts)).await
        }
        VideoError::StorageUnavailable(_) | VideoError::Io(_) | VideoError::Json(_) => {
            error!("❌ Error en /{}: {}", command.data.name, err);
            reply(ctx, command, "❌ Something went wrong talking to the video library. Try again later.", true).await
        }
        other => reply(ctx, command, user_message(&other), true).await,
    }
}

fn user_message(err: &VideoError) -> String {
    match err {
        VideoError::NotFound(what) => format!("🔍 No video found for `{}`.", what),
        VideoError::InvalidValue(why) => format!("⚠️ {}", why),
        other => format!("❌ {}", other),
    }
}

fn is_admin(command: &CommandInteraction, bot: &VideoBot) -> bool {
    if bot.config.admin_user_id == Some(command.user.id.get()) {
        return true;
    }
    match (bot.config.admin_role_id, command.member.as_ref()) {
        (Some(role), Some(member)) => member.roles.contains(&RoleId::new(role)),
        _ => false,
    }
}

/// `all` selects every colour; no choice defaults to yellow.
fn parse_colour_choice(choice: Option<&str>) -> Result<Vec<Category>, String> {
    match choice.map(str::trim) {
        None | Some("") => Ok(vec![Category::Yellow]),
        Some(c) if c.eq_ignore_ascii_case("all") => Ok(Category::ALL.to_vec()),
        Some(c) => c.parse::<Category>().map(|cat| vec![cat]).map_err(|e| e.to_string()),
    }
}

/// URLs are looked up by original URL, everything else by name.
fn identifier_kind(identifier: &str) -> IdentifierKind {
    if identifier.starts_with("http://") || identifier.starts_with("https://") {
        IdentifierKind::OriginalUrl
    } else {
        IdentifierKind::Name
    }
}

fn is_discord_attachment(raw: &str) -> bool {
    match Url::parse(raw.trim()) {
        Ok(url) => {
            url.scheme() == "https"
                && url.host_str().is_some_and(|host| ATTACHMENT_HOSTS.contains(&host))
                && url.path().starts_with("/attachments/")
        }
        Err(_) => false,
    }
}

async fn handle_randomvid(ctx: &Context, command: &CommandInteraction, bot: &VideoBot) -> Result<()> {
    let categories = match parse_colour_choice(string_option(command, "colour")) {
        Ok(categories) => categories,
        Err(why) => return reply(ctx, command, format!("⚠️ {}", why), true).await,
    };

    // La consulta al catálogo puede tardar
    command
        .create_response(
            &ctx.http,
            CreateInteractionResponse::Defer(CreateInteractionResponseMessage::new()),
        )
        .await?;

    let content = match bot.service.random_video(&categories, unix_now()).await {
        Ok(Some(video)) => randomvid_message(&video),
        Ok(None) => "⏳ Every video in that colour is on cooldown. Try again later.".to_string(),
        Err(e) => {
            error!("❌ Error en /randomvid: {}", e);
            "❌ Something went wrong talking to the video library. Try again later.".to_string()
        }
    };

    command
        .edit_response(&ctx.http, EditInteractionResponse::new().content(content))
        .await?;
    Ok(())
}

fn randomvid_message(video: &VideoRecord) -> String {
    let marker = if video.is_hall_of_fame { "🏆 " } else { "" };
    format!("{}**{}**\n{}", marker, video.name, video.shortened_url)
}

async fn handle_vids(ctx: &Context, command: &CommandInteraction, bot: &VideoBot) -> Result<()> {
    let category = match required_string(command, "colour")?.parse::<Category>() {
        Ok(category) => category,
        Err(e) => return reply(ctx, command, format!("⚠️ {}", e), true).await,
    };
    let page = command
        .data
        .options
        .iter()
        .find(|opt| opt.name == "page")
        .and_then(|opt| opt.value.as_i64())
        .and_then(|page| usize::try_from(page).ok())
        .unwrap_or(1);

    match bot.service.videos_in_category(category).await {
        Ok(videos) => reply_embed(ctx, command, embeds::create_video_list_embed(category, &videos, page)).await,
        Err(e) => reply_error(ctx, command, e).await,
    }
}

async fn handle_vid(ctx: &Context, command: &CommandInteraction, bot: &VideoBot) -> Result<()> {
    let colour = required_string(command, "colour")?;
    let name = required_string(command, "name")?;
    let url = required_string(command, "url")?;

    let category = match colour.parse::<Category>() {
        Ok(category) => category,
        Err(e) => return reply(ctx, command, format!("⚠️ {}", e), true).await,
    };
    if !is_discord_attachment(url) {
        return reply(ctx, command, "⚠️ The URL must be a Discord attachment link.", true).await;
    }

    let video = NewVideo::new(name, category, url.trim(), command.user.name.clone());
    match bot.service.add(video).await {
        Ok(record) => {
            reply_embed(
                ctx,
                command,
                embeds::create_success_embed(
                    "Video added",
                    &format!("**{}** is now in {}.", record.name, record.category),
                ),
            )
            .await
        }
        Err(e) => reply_error(ctx, command, e).await,
    }
}

async fn handle_delvid(ctx: &Context, command: &CommandInteraction, bot: &VideoBot) -> Result<()> {
    if !is_admin(command, bot) {
        return reply(ctx, command, "🚫 You are not allowed to delete videos.", true).await;
    }
    let identifier = required_string(command, "identifier")?.trim();

    match bot
        .service
        .remove(identifier, identifier_kind(identifier), &command.user.name)
        .await
    {
        Ok(removed) => {
            reply(
                ctx,
                command,
                format!("🗑️ Deleted **{}** from {}.", removed.name, removed.category),
                false,
            )
            .await
        }
        Err(e) => reply_error(ctx, command, e).await,
    }
}

async fn handle_changevidcolour(ctx: &Context, command: &CommandInteraction, bot: &VideoBot) -> Result<()> {
    let name = required_string(command, "name")?.trim();
    let category = match required_string(command, "colour")?.parse::<Category>() {
        Ok(category) => category,
        Err(e) => return reply(ctx, command, format!("⚠️ {}", e), true).await,
    };

    match bot.service.recolor(name, category).await {
        Ok(RecolorOutcome::Moved { from, to }) => {
            reply(ctx, command, format!("🎨 **{}** moved from {} to {}.", name, from, to), false).await
        }
        Ok(RecolorOutcome::Unchanged(current)) => {
            reply(ctx, command, format!("ℹ️ **{}** is already {}.", name, current), true).await
        }
        Err(e) => reply_error(ctx, command, e).await,
    }
}

async fn handle_addhof(ctx: &Context, command: &CommandInteraction, bot: &VideoBot) -> Result<()> {
    if !is_admin(command, bot) {
        return reply(ctx, command, "🚫 You are not allowed to edit the hall of fame.", true).await;
    }
    let identifier = required_string(command, "identifier")?.trim();

    match bot.service.promote_hall_of_fame(identifier).await {
        Ok(PromoteOutcome::Promoted(video)) => {
            reply(ctx, command, format!("🏆 **{}** joined the hall of fame!", video.name), false).await
        }
        Ok(PromoteOutcome::AlreadyPromoted(video)) => {
            reply(ctx, command, format!("ℹ️ **{}** is already in the hall of fame.", video.name), true).await
        }
        Err(e) => reply_error(ctx, command, e).await,
    }
}

async fn handle_hof(ctx: &Context, command: &CommandInteraction, bot: &VideoBot) -> Result<()> {
    match bot.service.hall_of_fame().await {
        Ok(videos) => reply_embed(ctx, command, embeds::create_hall_of_fame_embed(&videos)).await,
        Err(e) => reply_error(ctx, command, e).await,
    }
}

async fn handle_hashtag_edit(
    ctx: &Context,
    command: &CommandInteraction,
    bot: &VideoBot,
    mode: EditMode,
) -> Result<()> {
    if !is_admin(command, bot) {
        return reply(ctx, command, "🚫 You are not allowed to edit hashtags.", true).await;
    }
    let name = required_string(command, "name")?.trim();
    let requested = vec![required_string(command, "hashtags")?.to_string()];

    match bot.service.edit_hashtags(name, requested.as_slice(), mode).await {
        Ok(edit) if edit.is_noop() => {
            let reason = match mode {
                EditMode::Add => "already has those hashtags",
                EditMode::Remove => "has none of those hashtags",
            };
            reply(ctx, command, format!("ℹ️ **{}** {}.", name, reason), true).await
        }
        Ok(edit) => {
            let verb = match mode {
                EditMode::Add => "Added",
                EditMode::Remove => "Removed",
            };
            let applied: Vec<String> = edit.applied.iter().map(|t| format!("#{}", t)).collect();
            let resulting: Vec<String> = edit.resulting.iter().map(|t| format!("#{}", t)).collect();
            reply(
                ctx,
                command,
                format!(
                    "#️⃣ {} {} on **{}**. Now: {}",
                    verb,
                    applied.join(" "),
                    name,
                    if resulting.is_empty() { "none".to_string() } else { resulting.join(" ") }
                ),
                false,
            )
            .await
        }
        Err(e) => reply_error(ctx, command, e).await,
    }
}

async fn handle_hashtags(ctx: &Context, command: &CommandInteraction, bot: &VideoBot) -> Result<()> {
    match bot.service.all_hashtags().await {
        Ok(tags) => reply_embed(ctx, command, embeds::create_hashtags_embed(&tags)).await,
        Err(e) => reply_error(ctx, command, e).await,
    }
}

async fn handle_getvid(ctx: &Context, command: &CommandInteraction, bot: &VideoBot) -> Result<()> {
    let name = required_string(command, "name")?;
    match bot.service.get_by_name(name).await {
        Ok(Some(video)) => reply_embed(ctx, command, embeds::create_video_embed(&video)).await,
        Ok(None) => reply_error(ctx, command, VideoError::NotFound(name.to_string())).await,
        Err(e) => reply_error(ctx, command, e).await,
    }
}

async fn handle_findvid(ctx: &Context, command: &CommandInteraction, bot: &VideoBot) -> Result<()> {
    let url = required_string(command, "url")?;
    match bot.service.find_by_url(url).await {
        Ok(Some(video)) => reply_embed(ctx, command, embeds::create_video_embed(&video)).await,
        Ok(None) => reply_error(ctx, command, VideoError::NotFound(url.to_string())).await,
        Err(e) => reply_error(ctx, command, e).await,
    }
}

async fn handle_totalvids(ctx: &Context, command: &CommandInteraction, bot: &VideoBot) -> Result<()> {
    match bot.service.totals().await {
        Ok(totals) => reply_embed(ctx, command, embeds::create_totals_embed(&totals)).await,
        Err(e) => reply_error(ctx, command, e).await,
    }
}

async fn handle_uservids(ctx: &Context, command: &CommandInteraction, bot: &VideoBot) -> Result<()> {
    match bot.service.contributors().await {
        Ok(counts) => reply_embed(ctx, command, embeds::create_contributors_embed(&counts)).await,
        Err(e) => reply_error(ctx, command, e).await,
    }
}

async fn handle_showcooldown(ctx: &Context, command: &CommandInteraction, bot: &VideoBot) -> Result<()> {
    match bot.service.cooldown_status(unix_now()).await {
        Ok((cooldown, status)) => reply_embed(ctx, command, embeds::create_cooldown_embed(cooldown, status)).await,
        Err(e) => reply_error(ctx, command, e).await,
    }
}

async fn handle_updatecooldown(ctx: &Context, command: &CommandInteraction, bot: &VideoBot) -> Result<()> {
    if bot.config.admin_user_id != Some(command.user.id.get()) {
        return reply(ctx, command, "🚫 Only the bot admin can change the cooldown.", true).await;
    }

    let value = command
        .data
        .options
        .iter()
        .find(|opt| opt.name == "value")
        .and_then(|opt| opt.value.as_i64())
        .ok_or_else(|| anyhow::anyhow!("Valor no proporcionado"))?;
    let unit = required_string(command, "unit")?;

    let Some(seconds) = to_seconds(value, unit) else {
        return reply(ctx, command, format!("⚠️ Unknown unit `{}`.", unit), true).await;
    };

    match bot.service.set_cooldown(seconds).await {
        Ok(seconds) => {
            reply(ctx, command, format!("⏱️ Cooldown set to {}.", format_cooldown(seconds)), false).await
        }
        Err(e) => reply_error(ctx, command, e).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_colour_choice() {
        assert_eq!(parse_colour_choice(None), Ok(vec![Category::Yellow]));
        assert_eq!(parse_colour_choice(Some("All")), Ok(Category::ALL.to_vec()));
        assert_eq!(parse_colour_choice(Some("red")), Ok(vec![Category::Red]));
        assert!(parse_colour_choice(Some("purple")).is_err());
    }

    #[test]
    fn test_identifier_kind() {
        assert_eq!(identifier_kind("https://cdn.discordapp.com/attachments/1/2/a.mp4"), IdentifierKind::OriginalUrl);
        assert_eq!(identifier_kind("funny cat"), IdentifierKind::Name);
    }

    #[test]
    fn test_only_discord_attachments_are_accepted() {
        assert!(is_discord_attachment("https://cdn.discordapp.com/attachments/1/2/clip.mp4"));
        assert!(is_discord_attachment(" https://media.discordapp.net/attachments/1/2/clip.mov?ex=1 "));
        assert!(!is_discord_attachment("http://cdn.discordapp.com/attachments/1/2/clip.mp4"));
        assert!(!is_discord_attachment("https://cdn.discordapp.com/avatars/1/2.png"));
        assert!(!is_discord_attachment("https://evil.example/attachments/clip.mp4"));
        assert!(!is_discord_attachment("not a url"));
    }

    #[test]
    fn test_randomvid_marks_hall_of_fame() {
        let mut video = VideoRecord {
            id: 1,
            name: "legend".into(),
            category: Category::Yellow,
            shortened_url: "https://cdn.discordapp.com/attachments/1/2/l.mp4".into(),
            original_url: "https://cdn.discordapp.com/attachments/1/2/l.mp4".into(),
            added_by: "alice".into(),
            date_added: String::new(),
            is_hall_of_fame: false,
            hashtags: None,
            provenance: Default::default(),
        };
        assert_eq!(
            randomvid_message(&video),
            "**legend**\nhttps://cdn.discordapp.com/attachments/1/2/l.mp4"
        );

        video.is_hall_of_fame = true;
        assert!(randomvid_message(&video).starts_with("🏆 **legend**"));
    }

    #[test]
    fn test_user_messages() {
        assert_eq!(
            user_message(&VideoError::NotFound("cat".into())),
            "🔍 No video found for `cat`."
        );
        assert_eq!(
            user_message(&VideoError::InvalidValue("cooldown must not be negative".into())),
            "⚠️ cooldown must not be negative"
        );
    }
}
