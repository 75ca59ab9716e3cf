use dashmap::DashMap;
use std::{collections::HashMap, sync::Arc};
use tracing::debug;

use crate::catalog::{Category, VideoRecord};

/// Discord caps autocomplete responses at 25 choices.
pub const MAX_SUGGESTIONS: usize = 25;

/// Name-keyed mirror of the catalog for autocomplete and quick reads.
///
/// Keys are lower-cased names. The cache is only ever patched after the
/// catalog write it mirrors has succeeded, and the synchronizer rebuilds it
/// wholesale.
#[derive(Debug, Clone, Default)]
pub struct LookupCache {
    data: Arc<DashMap<String, VideoRecord>>,
}

fn key(name: &str) -> String {
    name.trim().to_lowercase()
}

impl LookupCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the whole content with `videos`.
    ///
    /// Entries still present are overwritten in place, so concurrent readers
    /// never observe an empty cache mid-rebuild.
    pub fn rebuild(&self, videos: Vec<VideoRecord>) {
        let fresh: HashMap<String, VideoRecord> = videos.into_iter().map(|v| (key(&v.name), v)).collect();
        self.data.retain(|name, _| fresh.contains_key(name));
        for (name, video) in fresh {
            self.data.insert(name, video);
        }
        debug!("Cache de búsqueda reconstruido con {} videos", self.data.len());
    }

    pub fn insert(&self, video: VideoRecord) {
        self.data.insert(key(&video.name), video);
    }

    pub fn remove(&self, name: &str) -> Option<VideoRecord> {
        self.data.remove(&key(name)).map(|(_, video)| video)
    }

    pub fn get(&self, name: &str) -> Option<VideoRecord> {
        self.data.get(&key(name)).map(|entry| entry.value().clone())
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[allow(dead_code)]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn set_category(&self, name: &str, category: Category) {
        if let Some(mut entry) = self.data.get_mut(&key(name)) {
            entry.category = category;
        }
    }

    pub fn set_hall_of_fame(&self, name: &str) {
        if let Some(mut entry) = self.data.get_mut(&key(name)) {
            entry.is_hall_of_fame = true;
        }
    }

    pub fn set_hashtags(&self, name: &str, stored: &str) {
        if let Some(mut entry) = self.data.get_mut(&key(name)) {
            entry.hashtags = if stored.is_empty() { None } else { Some(stored.to_string()) };
        }
    }

    /// Autocomplete matches for `input`, sorted by name.
    ///
    /// - `hof` lists hall of fame videos
    /// - `#tag` terms match videos carrying any of those tags
    /// - anything else is a case-insensitive substring match on name, tags
    ///   or contributor
    pub fn suggest(&self, input: &str, limit: usize) -> Vec<VideoRecord> {
        let query = input.trim().to_lowercase();
        if query.is_empty() {
            return Vec::new();
        }

        let tag_terms: Vec<String> = query
            .split_whitespace()
            .filter_map(|term| term.strip_prefix('#'))
            .map(|term| term.trim_matches('#').to_string())
            .filter(|term| !term.is_empty())
            .collect();

        let matches = |video: &VideoRecord| -> bool {
            if query == "hof" {
                return video.is_hall_of_fame;
            }
            let tags = video.tags();
            if query.starts_with('#') {
                return !tag_terms.is_empty() && tags.iter().any(|t| tag_terms.contains(t));
            }
            video.name.to_lowercase().contains(&query)
                || video.added_by.to_lowercase().contains(&query)
                || tags.iter().any(|t| t.contains(&query))
        };

        let mut found: Vec<VideoRecord> = self
            .data
            .iter()
            .filter(|entry| matches(entry.value()))
            .map(|entry| entry.value().clone())
            .collect();

        found.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
        found.truncate(limit);
        found
    }
}

/// `name 🏆 contributor #tag, #tag`, cut to Discord's 100 character limit.
pub fn format_suggestion(video: &VideoRecord) -> String {
    let mut label = video.name.clone();
    if video.is_hall_of_fame {
        label.push_str(" 🏆");
    }
    let contributor = crate::catalog::display_contributor(&video.added_by);
    if !contributor.is_empty() {
        label.push_str(&format!(" [{}]", contributor));
    }
    let tags = video.tags();
    if !tags.is_empty() {
        let rendered: Vec<String> = tags.iter().map(|t| format!("#{}", t)).collect();
        label.push_str(&format!(" [{}]", rendered.join(", ")));
    }

    if label.chars().count() > 100 {
        label = label.chars().take(97).collect::<String>() + "...";
    }
    label
}
