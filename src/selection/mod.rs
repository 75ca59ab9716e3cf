//! # Selection Module
//!
//! In-memory rotation state used to hand out videos fairly.
//!
//! The [`SelectionCache`] is derived data: every part of it can be rebuilt
//! from the catalog. It holds:
//!
//! - a shuffled queue of original URLs per [`Category`]
//! - when each queue was last refilled (`last_reset`)
//! - when each video was last shown (`played_videos`)
//! - the hall of fame, in promotion order
//!
//! The whole structure is persisted as one JSON snapshot after every change,
//! through [`SnapshotStore`].

pub mod dispenser;
pub mod shuffle;

use rand::Rng;
use serde::{Deserialize, Deserializer, Serialize};
use std::{
    collections::BTreeMap,
    path::PathBuf,
};
use tracing::info;

use crate::{catalog::Category, error::Result, storage};

pub use dispenser::Dispenser;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionCache {
    #[serde(default)]
    video_lists: BTreeMap<Category, Vec<String>>,
    #[serde(default, deserialize_with = "lenient_timestamps")]
    last_reset: BTreeMap<Category, i64>,
    #[serde(default, deserialize_with = "lenient_timestamps")]
    played_videos: BTreeMap<String, i64>,
    #[serde(default)]
    hall_of_fame: Vec<String>,
}

/// Older snapshots stored fractional Unix timestamps.
fn lenient_timestamps<'de, D, K>(deserializer: D) -> std::result::Result<BTreeMap<K, i64>, D::Error>
where
    D: Deserializer<'de>,
    K: Deserialize<'de> + Ord,
{
    let raw = BTreeMap::<K, f64>::deserialize(deserializer)?;
    Ok(raw.into_iter().map(|(k, v)| (k, v as i64)).collect())
}

/// How many queued videos are currently held back by the cooldown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CooldownStatus {
    pub on_cooldown: usize,
    pub available: usize,
}

impl SelectionCache {
    pub fn queue(&self, category: Category) -> &[String] {
        self.video_lists
            .get(&category)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// A queue counts as loaded once it has been filled from the catalog.
    pub fn is_loaded(&self, category: Category) -> bool {
        self.last_reset.contains_key(&category)
    }

    pub fn last_reset(&self, category: Category) -> Option<i64> {
        self.last_reset.get(&category).copied()
    }

    pub fn needs_refill(&self, category: Category, now: i64, staleness_window: i64) -> bool {
        let last = self.last_reset(category).unwrap_or(0);
        self.queue(category).is_empty() || now.saturating_sub(last) > staleness_window
    }

    pub(crate) fn replace_queue(&mut self, category: Category, urls: Vec<String>, now: i64) {
        self.video_lists.insert(category, urls);
        self.last_reset.insert(category, now);
    }

    /// Appends to a loaded queue and reshuffles it. An unloaded queue is left
    /// alone; the next refill brings the video in.
    pub(crate) fn enqueue<R: Rng + ?Sized>(&mut self, category: Category, url: String, rng: &mut R) {
        if !self.is_loaded(category) {
            return;
        }
        let queue = self.video_lists.entry(category).or_default();
        if !queue.contains(&url) {
            queue.push(url);
            shuffle::fisher_yates(queue, rng);
        }
    }

    /// Removes `url` from whichever queue holds it.
    pub(crate) fn dequeue(&mut self, url: &str) -> Option<Category> {
        let mut found = None;
        for (category, queue) in self.video_lists.iter_mut() {
            let before = queue.len();
            queue.retain(|u| u != url);
            if queue.len() != before && found.is_none() {
                found = Some(*category);
            }
        }
        found
    }

    pub(crate) fn move_to(&mut self, url: &str, to: Category) {
        self.dequeue(url);
        if self.is_loaded(to) {
            self.video_lists.entry(to).or_default().push(url.to_string());
        }
    }

    pub fn last_played(&self, url: &str) -> Option<i64> {
        self.played_videos.get(url).copied()
    }

    /// Never played, or last shown more than `cooldown` seconds ago.
    pub fn is_eligible(&self, url: &str, now: i64, cooldown: u64) -> bool {
        let cooldown = i64::try_from(cooldown).unwrap_or(i64::MAX);
        match self.last_played(url) {
            None => true,
            Some(played_at) => now.saturating_sub(played_at) > cooldown,
        }
    }

    pub(crate) fn mark_played(&mut self, url: &str, at: i64) {
        self.played_videos.insert(url.to_string(), at);
    }

    /// Drops play history and hall of fame membership for a deleted video.
    pub(crate) fn forget(&mut self, url: &str) {
        self.played_videos.remove(url);
        self.hall_of_fame.retain(|u| u != url);
    }

    pub fn hall_of_fame(&self) -> &[String] {
        &self.hall_of_fame
    }

    /// Returns `false` when already present.
    pub(crate) fn promote(&mut self, url: &str) -> bool {
        if self.hall_of_fame.iter().any(|u| u == url) {
            return false;
        }
        self.hall_of_fame.push(url.to_string());
        true
    }

    pub(crate) fn set_hall_of_fame(&mut self, urls: Vec<String>) {
        self.hall_of_fame = urls;
    }

    /// Moves play history recorded under an old key to the key `resolve`
    /// maps it to. The later timestamp wins when both keys exist.
    pub(crate) fn rekey_played<F: Fn(&str) -> Option<String>>(&mut self, resolve: F) -> Vec<(String, String)> {
        let moves: Vec<(String, String)> = self
            .played_videos
            .keys()
            .filter_map(|old| resolve(old).filter(|new| new != old).map(|new| (old.clone(), new)))
            .collect();

        for (old, new) in &moves {
            if let Some(at) = self.played_videos.remove(old) {
                let entry = self.played_videos.entry(new.clone()).or_insert(at);
                *entry = (*entry).max(at);
            }
        }
        moves
    }

    /// Drops play history for videos `keep` rejects; returns how many went.
    pub(crate) fn retain_played<F: Fn(&str) -> bool>(&mut self, keep: F) -> usize {
        let before = self.played_videos.len();
        self.played_videos.retain(|url, _| keep(url));
        before - self.played_videos.len()
    }

    pub fn cooldown_status(&self, now: i64, cooldown: u64) -> CooldownStatus {
        let (on_cooldown, available) = self
            .video_lists
            .values()
            .flatten()
            .fold((0, 0), |(held, free), url| {
                if self.is_eligible(url, now, cooldown) {
                    (held, free + 1)
                } else {
                    (held + 1, free)
                }
            });
        CooldownStatus { on_cooldown, available }
    }
}

/// Where the selection cache snapshot lives on disk.
pub struct SnapshotStore {
    path: PathBuf,
}

impl SnapshotStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub async fn load(&self) -> Result<Option<SelectionCache>> {
        let snapshot = storage::read_json::<SelectionCache>(&self.path).await?;
        if let Some(cache) = &snapshot {
            info!(
                "📂 Snapshot cargado: {} videos en cola, {} reproducidos",
                cache.video_lists.values().map(Vec::len).sum::<usize>(),
                cache.played_videos.len()
            );
        }
        Ok(snapshot)
    }

    pub async fn save(&self, cache: &SelectionCache) -> Result<()> {
        storage::write_json_atomic(&self.path, cache).await
    }
}
