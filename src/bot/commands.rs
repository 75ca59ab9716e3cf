use anyhow::Result;
use serenity::{
    builder::{CreateCommand, CreateCommandOption},
    model::{application::CommandOptionType, id::GuildId},
    prelude::Context,
};

fn all_commands() -> Vec<CreateCommand> {
    vec![
        randomvid_command(),
        vid_command(),
        vids_command(),
        delvid_command(),
        changevidcolour_command(),
        addhof_command(),
        hof_command(),
        addhashtags_command(),
        removehashtags_command(),
        hashtags_command(),
        getvid_command(),
        findvid_command(),
        totalvids_command(),
        uservids_command(),
        showcooldown_command(),
        updatecooldown_command(),
    ]
}

/// Registra comandos globales
pub async fn register_global_commands(ctx: &Context) -> Result<()> {
    for command in all_commands() {
        ctx.http.create_global_command(&command).await?;
    }

    Ok(())
}

/// Registra comandos para una guild específica (desarrollo)
pub async fn register_guild_commands(ctx: &Context, guild_id: GuildId) -> Result<()> {
    guild_id.set_commands(&ctx.http, all_commands()).await?;

    Ok(())
}

fn colour_option(required: bool) -> CreateCommandOption {
    CreateCommandOption::new(CommandOptionType::String, "colour", "Video colour")
        .required(required)
        .add_string_choice("Green", "green")
        .add_string_choice("Red", "red")
        .add_string_choice("Yellow", "yellow")
}

fn name_option(description: &str) -> CreateCommandOption {
    CreateCommandOption::new(CommandOptionType::String, "name", description)
        .required(true)
        .set_autocomplete(true)
}

// Selección

fn randomvid_command() -> CreateCommand {
    CreateCommand::new("randomvid")
        .description("Show a random video that is not on cooldown")
        .add_option(
            CreateCommandOption::new(CommandOptionType::String, "colour", "Colour to pick from (default yellow)")
                .add_string_choice("All", "all")
                .add_string_choice("Green", "green")
                .add_string_choice("Red", "red")
                .add_string_choice("Yellow", "yellow"),
        )
}

fn showcooldown_command() -> CreateCommand {
    CreateCommand::new("showcooldown").description("Show the current cooldown and how many videos it holds back")
}

fn updatecooldown_command() -> CreateCommand {
    CreateCommand::new("updatecooldown")
        .description("Change how long a video stays out of rotation")
        .add_option(
            CreateCommandOption::new(CommandOptionType::Integer, "value", "Amount of time")
                .required(true)
                .min_int_value(0),
        )
        .add_option(
            CreateCommandOption::new(CommandOptionType::String, "unit", "Time unit")
                .required(true)
                .add_string_choice("Days", "days")
                .add_string_choice("Hours", "hours")
                .add_string_choice("Minutes", "minutes")
                .add_string_choice("Seconds", "seconds"),
        )
}

// Catálogo

fn vid_command() -> CreateCommand {
    CreateCommand::new("vid")
        .description("Add a video to the library")
        .add_option(colour_option(true))
        .add_option(
            CreateCommandOption::new(CommandOptionType::String, "name", "Unique name for the video")
                .required(true)
                .max_length(100),
        )
        .add_option(
            CreateCommandOption::new(CommandOptionType::String, "url", "Discord attachment URL")
                .required(true),
        )
}

fn vids_command() -> CreateCommand {
    CreateCommand::new("vids")
        .description("List every video of a colour")
        .add_option(colour_option(true))
        .add_option(
            CreateCommandOption::new(CommandOptionType::Integer, "page", "Page number (default 1)")
                .min_int_value(1),
        )
}

fn delvid_command() -> CreateCommand {
    CreateCommand::new("delvid")
        .description("Delete a video by name or URL")
        .add_option(
            CreateCommandOption::new(CommandOptionType::String, "identifier", "Video name or original URL")
                .required(true)
                .set_autocomplete(true),
        )
}

fn changevidcolour_command() -> CreateCommand {
    CreateCommand::new("changevidcolour")
        .description("Move a video to another colour")
        .add_option(name_option("Video name"))
        .add_option(colour_option(true))
}

fn getvid_command() -> CreateCommand {
    CreateCommand::new("getvid")
        .description("Show a video by name")
        .add_option(name_option("Video name"))
}

fn findvid_command() -> CreateCommand {
    CreateCommand::new("findvid")
        .description("Find which video a URL belongs to")
        .add_option(
            CreateCommandOption::new(CommandOptionType::String, "url", "Video URL").required(true),
        )
}

// Hall of fame

fn addhof_command() -> CreateCommand {
    CreateCommand::new("addhof")
        .description("Add a video to the hall of fame")
        .add_option(
            CreateCommandOption::new(CommandOptionType::String, "identifier", "Video name or original URL")
                .required(true)
                .set_autocomplete(true),
        )
}

fn hof_command() -> CreateCommand {
    CreateCommand::new("hof").description("List the hall of fame")
}

// Hashtags

fn addhashtags_command() -> CreateCommand {
    CreateCommand::new("addhashtags")
        .description("Tag a video")
        .add_option(name_option("Video name"))
        .add_option(
            CreateCommandOption::new(CommandOptionType::String, "hashtags", "Tags separated by spaces or commas")
                .required(true),
        )
}

fn removehashtags_command() -> CreateCommand {
    CreateCommand::new("removehashtags")
        .description("Remove tags from a video")
        .add_option(name_option("Video name"))
        .add_option(
            CreateCommandOption::new(CommandOptionType::String, "hashtags", "Tags separated by spaces or commas")
                .required(true),
        )
}

fn hashtags_command() -> CreateCommand {
    CreateCommand::new("hashtags").description("List every hashtag in use")
}

// Estadísticas

fn totalvids_command() -> CreateCommand {
    CreateCommand::new("totalvids").description("Count videos per colour")
}

fn uservids_command() -> CreateCommand {
    CreateCommand::new("uservids").description("Count videos per contributor")
}
