use serenity::{
    all::{Colour, Timestamp},
    builder::{CreateEmbed, CreateEmbedFooter},
};
use std::collections::BTreeMap;

use crate::{
    catalog::{display_contributor, Category, Conflict, VideoRecord},
    cooldown::format_cooldown,
    selection::CooldownStatus,
};

/// Paleta de colores estandarizada para el bot
pub mod colors {
    use serenity::all::Colour;

    pub const SUCCESS_GREEN: Colour = Colour::from_rgb(67, 181, 129);
    pub const ERROR_RED: Colour = Colour::from_rgb(220, 53, 69);
    pub const WARNING_ORANGE: Colour = Colour::from_rgb(255, 193, 7);
    pub const INFO_BLUE: Colour = Colour::from_rgb(52, 144, 220);
    pub const HALL_OF_FAME_GOLD: Colour = Colour::from_rgb(212, 175, 55);
}

/// Footer estandarizado para todos los embeds
const STANDARD_FOOTER: &str = "🎬 Clip Curator";

/// Discord admite hasta 25 campos por embed
const MAX_FIELDS: usize = 25;

pub fn category_colour(category: Category) -> Colour {
    match category {
        Category::Green => Colour::from_rgb(46, 204, 113),
        Category::Red => Colour::from_rgb(231, 76, 60),
        Category::Yellow => Colour::from_rgb(241, 196, 15),
    }
}

pub fn category_emoji(category: Category) -> &'static str {
    match category {
        Category::Green => "🟢",
        Category::Red => "🔴",
        Category::Yellow => "🟡",
    }
}

fn base(title: impl Into<String>, colour: Colour) -> CreateEmbed {
    CreateEmbed::default()
        .title(title)
        .color(colour)
        .timestamp(Timestamp::now())
        .footer(CreateEmbedFooter::new(STANDARD_FOOTER))
}

/// Crea un embed con los detalles de un video
pub fn create_video_embed(video: &VideoRecord) -> CreateEmbed {
    let title = if video.is_hall_of_fame {
        format!("🏆 {}", video.name)
    } else {
        format!("🎬 {}", video.name)
    };

    let mut embed = base(title, category_colour(video.category))
        .url(&video.shortened_url)
        .field(
            "Colour",
            format!("{} {}", category_emoji(video.category), video.category),
            true,
        )
        .field("Added by", or_unknown(display_contributor(&video.added_by)), true)
        .field("Date added", or_unknown(&video.date_added), true)
        .field("URL", &video.shortened_url, false);

    let tags = video.tags();
    if !tags.is_empty() {
        let rendered: Vec<String> = tags.iter().map(|t| format!("#{}", t)).collect();
        embed = embed.field("Hashtags", rendered.join(" "), false);
    }

    let provenance = &video.provenance;
    for (label, link) in [
        ("Author", &provenance.author_link),
        ("Source", &provenance.source_link),
        ("Audio", &provenance.audio_link),
    ] {
        if let Some(link) = link {
            embed = embed.field(label, link, true);
        }
    }

    embed
}

fn or_unknown(value: &str) -> &str {
    if value.is_empty() {
        "Unknown"
    } else {
        value
    }
}

/// Crea un embed con el total de videos por color
pub fn create_totals_embed(totals: &BTreeMap<Category, u64>) -> CreateEmbed {
    let total: u64 = totals.values().sum();
    let mut embed = base("📊 Video totals", colors::INFO_BLUE).description(format!("**{}** videos in total", total));

    for category in Category::ALL {
        let count = totals.get(&category).copied().unwrap_or(0);
        embed = embed.field(
            format!("{} {}", category_emoji(category), category),
            count.to_string(),
            true,
        );
    }
    embed
}

/// Crea un embed con los aportes de cada usuario
pub fn create_contributors_embed(counts: &[(String, u64)]) -> CreateEmbed {
    if counts.is_empty() {
        return base("👥 Videos per user", colors::INFO_BLUE).description("No videos yet.");
    }

    let lines: Vec<String> = counts
        .iter()
        .enumerate()
        .take(MAX_FIELDS)
        .map(|(i, (user, count))| format!("**{}.** {}: {}", i + 1, user, count))
        .collect();

    let mut embed = base("👥 Videos per user", colors::INFO_BLUE).description(lines.join("\n"));
    if counts.len() > MAX_FIELDS {
        embed = embed.field("…", format!("and {} more", counts.len() - MAX_FIELDS), false);
    }
    embed
}

/// Crea un embed con todos los hashtags en uso
pub fn create_hashtags_embed(tags: &[String]) -> CreateEmbed {
    let description = if tags.is_empty() {
        "No hashtags in use.".to_string()
    } else {
        let rendered: Vec<String> = tags.iter().map(|t| format!("`#{}`", t)).collect();
        truncate(&rendered.join(" "), 4000)
    };

    base(format!("#️⃣ Hashtags ({})", tags.len()), colors::INFO_BLUE).description(description)
}

/// Crea un embed con el estado del cooldown
pub fn create_cooldown_embed(cooldown: u64, status: CooldownStatus) -> CreateEmbed {
    base("⏱️ Cooldown", colors::WARNING_ORANGE)
        .description(format!("Videos stay out of rotation for **{}** after being shown.", format_cooldown(cooldown)))
        .field("On cooldown", status.on_cooldown.to_string(), true)
        .field("Available", status.available.to_string(), true)
}

/// Crea un embed con el hall of fame
pub fn create_hall_of_fame_embed(videos: &[VideoRecord]) -> CreateEmbed {
    if videos.is_empty() {
        return base("🏆 Hall of Fame", colors::HALL_OF_FAME_GOLD).description("Nothing here yet.");
    }

    let lines: Vec<String> = videos
        .iter()
        .map(|v| format!("{} [{}]({})", category_emoji(v.category), v.name, v.shortened_url))
        .collect();

    base(format!("🏆 Hall of Fame ({})", videos.len()), colors::HALL_OF_FAME_GOLD)
        .description(truncate(&lines.join("\n"), 4000))
}

/// Crea un embed que lista cada conflicto encontrado al agregar un video
pub fn create_conflicts_embed(conflicts: &[Conflict]) -> CreateEmbed {
    let mut embed = base("❌ Video already exists", colors::ERROR_RED)
        .description("The new video clashes with what is already in the library:");

    for conflict in conflicts.iter().take(MAX_FIELDS) {
        embed = embed.field(
            format!("Same {}", conflict.field),
            format!("**{}**\n{}", conflict.name, conflict.url),
            false,
        );
    }
    embed
}

/// Videos listed per page before the description limit kicks in
pub const VIDEOS_PER_PAGE: usize = 30;

/// Discord rejects embed descriptions longer than this
const DESCRIPTION_LIMIT: usize = 4096;

/// Splits `[name](url)` lines into pages of at most [`VIDEOS_PER_PAGE`]
/// lines and [`DESCRIPTION_LIMIT`] characters. Always yields at least one page.
pub fn paginate_video_links(videos: &[VideoRecord]) -> Vec<String> {
    let mut pages = Vec::new();
    let mut current: Vec<String> = Vec::new();
    let mut current_chars = 0;

    for video in videos {
        let line = truncate(&format!("[{}]({})", video.name, video.original_url), DESCRIPTION_LIMIT);
        let line_chars = line.chars().count();
        // Lines are joined with a newline
        let needed = if current.is_empty() { line_chars } else { current_chars + 1 + line_chars };

        if !current.is_empty() && (current.len() == VIDEOS_PER_PAGE || needed > DESCRIPTION_LIMIT) {
            pages.push(current.join("\n"));
            current.clear();
            current_chars = line_chars;
        } else {
            current_chars = needed;
        }
        current.push(line);
    }

    if !current.is_empty() || pages.is_empty() {
        pages.push(current.join("\n"));
    }
    pages
}

/// Crea un embed paginado con todos los videos de un color
///
/// `page` empieza en 1 y se ajusta al rango válido.
pub fn create_video_list_embed(category: Category, videos: &[VideoRecord], page: usize) -> CreateEmbed {
    let pages = paginate_video_links(videos);
    let page = page.clamp(1, pages.len());
    let description = match pages.get(page - 1) {
        Some(links) if !links.is_empty() => links.clone(),
        _ => "No videos in this colour yet.".to_string(),
    };

    CreateEmbed::default()
        .title(format!("{} {} videos ({})", category_emoji(category), category, videos.len()))
        .color(category_colour(category))
        .description(description)
        .timestamp(Timestamp::now())
        .footer(CreateEmbedFooter::new(format!("Page {} of {} • {}", page, pages.len(), STANDARD_FOOTER)))
}

/// Crea un embed de éxito
pub fn create_success_embed(title: &str, description: &str) -> CreateEmbed {
    base(format!("✅ {}", title), colors::SUCCESS_GREEN).description(description)
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(max_chars.saturating_sub(1)).collect();
    cut.push('…');
    cut
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_counts_chars() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("ñññññ", 3), "ññ…");
    }

    fn videos(count: usize, url_len: usize) -> Vec<VideoRecord> {
        (0..count)
            .map(|i| VideoRecord {
                id: i as i64,
                name: format!("v{:03}", i),
                category: Category::Green,
                shortened_url: "u".repeat(url_len),
                original_url: "u".repeat(url_len),
                added_by: String::new(),
                date_added: String::new(),
                is_hall_of_fame: false,
                hashtags: None,
                provenance: Default::default(),
            })
            .collect()
    }

    #[test]
    fn test_empty_category_has_one_empty_page() {
        assert_eq!(paginate_video_links(&[]), vec![String::new()]);

        let embed = serde_json::to_value(create_video_list_embed(Category::Red, &[], 3)).unwrap();
        assert_eq!(embed["description"], "No videos in this colour yet.");
        assert_eq!(embed["footer"]["text"], format!("Page 1 of 1 • {}", STANDARD_FOOTER));
    }

    #[test]
    fn test_exactly_one_full_page() {
        let pages = paginate_video_links(&videos(VIDEOS_PER_PAGE, 10));
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].lines().count(), VIDEOS_PER_PAGE);
        assert!(pages[0].starts_with("[v000](uuuuuuuuuu)"));
    }

    #[test]
    fn test_last_page_holds_the_remainder() {
        let list = videos(VIDEOS_PER_PAGE * 2 + 5, 10);
        let pages = paginate_video_links(&list);
        assert_eq!(pages.len(), 3);
        assert_eq!(pages[2].lines().count(), 5);

        let embed = serde_json::to_value(create_video_list_embed(Category::Green, &list, 99)).unwrap();
        assert_eq!(embed["title"], "🟢 green videos (65)");
        assert_eq!(embed["description"], pages[2].as_str());
        assert_eq!(embed["footer"]["text"], format!("Page 3 of 3 • {}", STANDARD_FOOTER));
    }

    #[test]
    fn test_long_links_respect_description_limit() {
        // `[v000](` + 300 + `)` is 308 chars; 13 lines and 12 newlines fit in 4096
        let pages = paginate_video_links(&videos(VIDEOS_PER_PAGE, 300));
        assert_eq!(pages.len(), 3);
        assert_eq!(pages[0].lines().count(), 13);
        assert!(pages.iter().all(|p| p.chars().count() <= DESCRIPTION_LIMIT));
        assert_eq!(pages.iter().map(|p| p.lines().count()).sum::<usize>(), VIDEOS_PER_PAGE);
    }

    #[test]
    fn test_each_category_has_its_own_colour() {
        let colours: Vec<u32> = Category::ALL.iter().map(|c| category_colour(*c).0).collect();
        assert_ne!(colours[0], colours[1]);
        assert_ne!(colours[1], colours[2]);
    }
}
