//! # Video Service
//!
//! The single long-lived owner of the catalog handle, the selection cache,
//! the lookup cache and the cooldown policy. Command handlers receive it by
//! reference and never touch the caches directly.
//!
//! Every mutation writes the catalog first and only then patches the
//! in-memory state, under one async lock, before persisting the snapshot.

use rand::{rngs::StdRng, SeedableRng};
use std::{
    collections::{BTreeMap, BTreeSet, HashMap},
    path::PathBuf,
    sync::Arc,
};
use tokio::sync::{broadcast, Mutex};
use tracing::{error, info, warn};

use crate::{
    catalog::{
        display_contributor, Catalog, Category, HallOfFameChange, IdentifierKind, NewVideo,
        RemovedVideo, SqliteCatalog, VideoRecord,
    },
    config::Config,
    cooldown::CooldownPolicy,
    error::{Result, VideoError},
    hashtags::{self, EditMode, HashtagEdit},
    lookup::{LookupCache, MAX_SUGGESTIONS},
    selection::{CooldownStatus, Dispenser, SelectionCache, SnapshotStore},
    sync::{self, SyncReport},
};

/// Emitted when someone deletes a video another member contributed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoRemoved {
    pub video_name: String,
    pub category: Category,
    pub deleted_by: String,
    pub original_contributor: String,
    pub original_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecolorOutcome {
    Moved { from: Category, to: Category },
    Unchanged(Category),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromoteOutcome {
    Promoted(VideoRecord),
    AlreadyPromoted(VideoRecord),
}

/// Files and tunables the service needs.
#[derive(Debug, Clone)]
pub struct ServiceOptions {
    pub snapshot_file: PathBuf,
    pub settings_file: PathBuf,
    pub default_cooldown: u64,
    pub staleness_window: i64,
}

impl ServiceOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            snapshot_file: config.snapshot_path(),
            settings_file: config.settings_path(),
            default_cooldown: config.default_cooldown,
            staleness_window: config.staleness_window,
        }
    }

    #[cfg(test)]
    pub fn in_dir(dir: &std::path::Path) -> Self {
        Self {
            snapshot_file: dir.join("video_data.json"),
            settings_file: dir.join("bot_settings.json"),
            default_cooldown: 216_000,
            staleness_window: crate::selection::dispenser::DEFAULT_STALENESS_WINDOW,
        }
    }
}

pub fn unix_now() -> i64 {
    chrono::Utc::now().timestamp()
}

pub struct VideoService {
    catalog: Arc<dyn Catalog>,
    selection: Mutex<SelectionCache>,
    lookup: LookupCache,
    cooldown: CooldownPolicy,
    snapshots: SnapshotStore,
    dispenser: Dispenser,
    removals: broadcast::Sender<VideoRemoved>,
}

impl VideoService {
    /// Opens the SQLite catalog named by `config` and reconciles the caches.
    pub async fn create(config: &Config) -> Result<Self> {
        let catalog = SqliteCatalog::open(&config.database_path())?;
        Self::open(Arc::new(catalog), ServiceOptions::from_config(config)).await
    }

    /// Loads the last snapshot and runs the synchronizer once.
    ///
    /// An unreadable snapshot is discarded; the synchronizer rebuilds it.
    pub async fn open(catalog: Arc<dyn Catalog>, options: ServiceOptions) -> Result<Self> {
        let snapshots = SnapshotStore::new(options.snapshot_file);
        let cache = match snapshots.load().await {
            Ok(Some(cache)) => cache,
            Ok(None) => {
                info!("📂 Sin snapshot previo, se construirá desde el catálogo");
                SelectionCache::default()
            }
            Err(e) => {
                warn!("⚠️ Snapshot ilegible, se reconstruye: {}", e);
                SelectionCache::default()
            }
        };

        let (removals, _) = broadcast::channel(64);
        let service = Self {
            catalog,
            selection: Mutex::new(cache),
            lookup: LookupCache::new(),
            cooldown: CooldownPolicy::new(options.settings_file, options.default_cooldown),
            snapshots,
            dispenser: Dispenser::new(options.staleness_window),
            removals,
        };

        service.resync(unix_now()).await?;
        info!("✅ Servicio de videos listo ({} videos)", service.lookup.len());
        Ok(service)
    }

    /// Flushes the snapshot one last time.
    pub async fn close(&self) -> Result<()> {
        let cache = self.selection.lock().await;
        self.snapshots.save(&cache).await?;
        info!("👋 Servicio de videos cerrado");
        Ok(())
    }

    async fn persist(&self, cache: &SelectionCache) {
        if let Err(e) = self.snapshots.save(cache).await {
            error!("❌ Error guardando snapshot: {}", e);
        }
    }

    /// Eligible original URLs, shuffled. Never records a play.
    #[allow(dead_code)]
    pub async fn dispense(&self, categories: &[Category], now: i64, cooldown: u64) -> Result<Vec<String>> {
        let mut cache = self.selection.lock().await;
        let before: Vec<Option<i64>> = categories.iter().map(|c| cache.last_reset(*c)).collect();

        let mut rng = StdRng::from_entropy();
        let available = self
            .dispenser
            .dispense(&mut cache, self.catalog.as_ref(), categories, now, cooldown, &mut rng)
            .await?;

        let refilled = categories
            .iter()
            .zip(before)
            .any(|(c, last)| cache.last_reset(*c) != last);
        if refilled {
            self.persist(&cache).await;
        }
        Ok(available)
    }

    #[allow(dead_code)]
    pub async fn mark_played(&self, original_url: &str, at: i64) -> Result<()> {
        let mut cache = self.selection.lock().await;
        cache.mark_played(original_url, at);
        self.snapshots.save(&cache).await
    }

    /// Picks one eligible video and records the play.
    ///
    /// `None` means everything requested is on cooldown.
    pub async fn random_video(&self, categories: &[Category], now: i64) -> Result<Option<VideoRecord>> {
        let cooldown = self.cooldown.get_cooldown().await?;

        let chosen = {
            let mut cache = self.selection.lock().await;
            let mut rng = StdRng::from_entropy();
            let available = self
                .dispenser
                .dispense(&mut cache, self.catalog.as_ref(), categories, now, cooldown, &mut rng)
                .await?;

            match available.into_iter().next() {
                Some(url) => {
                    cache.mark_played(&url, now);
                    self.persist(&cache).await;
                    url
                }
                None => return Ok(None),
            }
        };

        let record = self.catalog.find_by_url(&chosen).await?;
        if record.is_none() {
            warn!("⚠️ Video en cola ya no existe en el catálogo: {}", chosen);
        }
        Ok(record)
    }

    pub async fn add(&self, video: NewVideo) -> Result<VideoRecord> {
        if video.name.is_empty() {
            return Err(VideoError::InvalidValue("video name must not be empty".into()));
        }

        let record = self.catalog.insert(video).await?;

        let mut cache = self.selection.lock().await;
        let mut rng = StdRng::from_entropy();
        cache.enqueue(record.category, record.original_url.clone(), &mut rng);
        self.lookup.insert(record.clone());
        self.persist(&cache).await;

        info!("➕ Video agregado: {} [{}] por {}", record.name, record.category, record.added_by);
        Ok(record)
    }

    /// Deletes a video and clears every trace of it from the caches.
    pub async fn remove(&self, identifier: &str, kind: IdentifierKind, deleted_by: &str) -> Result<RemovedVideo> {
        let removed = self
            .catalog
            .delete(identifier, kind)
            .await?
            .ok_or_else(|| VideoError::NotFound(identifier.to_string()))?;

        {
            let mut cache = self.selection.lock().await;
            cache.dequeue(&removed.original_url);
            cache.forget(&removed.original_url);
            self.lookup.remove(&removed.name);
            self.persist(&cache).await;
        }

        info!("🗑️ Video eliminado: {} [{}] por {}", removed.name, removed.category, deleted_by);

        let contributor = display_contributor(&removed.added_by);
        if !contributor.is_empty() && !contributor.eq_ignore_ascii_case(display_contributor(deleted_by)) {
            // No subscribers is fine
            let _ = self.removals.send(VideoRemoved {
                video_name: removed.name.clone(),
                category: removed.category,
                deleted_by: deleted_by.to_string(),
                original_contributor: removed.added_by.clone(),
                original_url: removed.original_url.clone(),
            });
        }

        Ok(removed)
    }

    pub async fn recolor(&self, name: &str, to: Category) -> Result<RecolorOutcome> {
        let record = self
            .catalog
            .get_by_name(name)
            .await?
            .ok_or_else(|| VideoError::NotFound(name.to_string()))?;

        if record.category == to {
            return Ok(RecolorOutcome::Unchanged(to));
        }
        if !self.catalog.update_category(&record.name, to).await? {
            return Err(VideoError::NotFound(name.to_string()));
        }

        let mut cache = self.selection.lock().await;
        cache.move_to(&record.original_url, to);
        self.lookup.set_category(&record.name, to);
        self.persist(&cache).await;

        info!("🎨 {} movido de {} a {}", record.name, record.category, to);
        Ok(RecolorOutcome::Moved { from: record.category, to })
    }

    /// One-way; there is no demotion.
    pub async fn promote_hall_of_fame(&self, identifier: &str) -> Result<PromoteOutcome> {
        match self.catalog.set_hall_of_fame(identifier).await? {
            HallOfFameChange::NotFound => Err(VideoError::NotFound(identifier.to_string())),
            HallOfFameChange::AlreadyPromoted(record) => Ok(PromoteOutcome::AlreadyPromoted(record)),
            HallOfFameChange::Promoted(record) => {
                let mut cache = self.selection.lock().await;
                cache.promote(&record.original_url);
                self.lookup.set_hall_of_fame(&record.name);
                self.persist(&cache).await;

                info!("🏆 {} entra al hall of fame", record.name);
                Ok(PromoteOutcome::Promoted(record))
            }
        }
    }

    /// Reports exactly which tags changed; a no-op edit skips the write.
    pub async fn edit_hashtags<S: AsRef<str>>(&self, name: &str, tags: &[S], mode: EditMode) -> Result<HashtagEdit> {
        let record = self
            .catalog
            .get_by_name(name)
            .await?
            .ok_or_else(|| VideoError::NotFound(name.to_string()))?;

        let edit = hashtags::apply_edit(record.hashtags.as_deref(), tags, mode);
        if edit.is_noop() {
            return Ok(edit);
        }

        let stored = edit.stored();
        if !self.catalog.update_hashtags(&record.name, &stored).await? {
            return Err(VideoError::NotFound(name.to_string()));
        }
        self.lookup.set_hashtags(&record.name, &stored);

        info!("#️⃣ Hashtags de {}: {:?} ({:?})", record.name, edit.applied, mode);
        Ok(edit)
    }

    pub async fn get_cooldown(&self) -> Result<u64> {
        self.cooldown.get_cooldown().await
    }

    pub async fn set_cooldown(&self, seconds: i64) -> Result<u64> {
        self.cooldown.set_cooldown(seconds).await
    }

    pub fn subscribe_removals(&self) -> broadcast::Receiver<VideoRemoved> {
        self.removals.subscribe()
    }

    pub fn suggest(&self, input: &str) -> Vec<VideoRecord> {
        self.lookup.suggest(input, MAX_SUGGESTIONS)
    }

    pub async fn get_by_name(&self, name: &str) -> Result<Option<VideoRecord>> {
        self.catalog.get_by_name(name.trim()).await
    }

    pub async fn find_by_url(&self, url: &str) -> Result<Option<VideoRecord>> {
        self.catalog.find_by_url(url.trim()).await
    }

    /// Every video of one colour, ordered by name.
    pub async fn videos_in_category(&self, category: Category) -> Result<Vec<VideoRecord>> {
        self.catalog.videos_in_category(category).await
    }

    pub async fn totals(&self) -> Result<BTreeMap<Category, u64>> {
        self.catalog.counts_by_category().await
    }

    /// Per-contributor counts, most prolific first.
    pub async fn contributors(&self) -> Result<Vec<(String, u64)>> {
        let mut merged: HashMap<String, u64> = HashMap::new();
        for (added_by, count) in self.catalog.counts_by_contributor().await? {
            let name = match display_contributor(&added_by) {
                "" => "unknown",
                name => name,
            };
            *merged.entry(name.to_string()).or_default() += count;
        }

        let mut counts: Vec<(String, u64)> = merged.into_iter().collect();
        counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        Ok(counts)
    }

    pub async fn all_hashtags(&self) -> Result<Vec<String>> {
        let tags: BTreeSet<String> = self
            .catalog
            .hashtag_strings()
            .await?
            .iter()
            .flat_map(|stored| hashtags::parse_stored(Some(stored)))
            .collect();
        Ok(tags.into_iter().collect())
    }

    /// Hall of fame records in promotion order.
    pub async fn hall_of_fame(&self) -> Result<Vec<VideoRecord>> {
        let order = self.selection.lock().await.hall_of_fame().to_vec();
        let mut by_url: HashMap<String, VideoRecord> = self
            .catalog
            .all_videos()
            .await?
            .into_iter()
            .map(|v| (v.original_url.clone(), v))
            .collect();

        Ok(order.iter().filter_map(|url| by_url.remove(url)).collect())
    }

    /// Cooldown currently in force and how it splits the queued videos.
    pub async fn cooldown_status(&self, now: i64) -> Result<(u64, CooldownStatus)> {
        let cooldown = self.cooldown.get_cooldown().await?;
        let status = self.selection.lock().await.cooldown_status(now, cooldown);
        Ok((cooldown, status))
    }

    /// Runs the synchronizer and persists the result.
    pub async fn resync(&self, now: i64) -> Result<SyncReport> {
        let mut cache = self.selection.lock().await;
        let mut rng = StdRng::from_entropy();
        let report = sync::reconcile(self.catalog.as_ref(), &mut cache, &self.lookup, now, &mut rng).await?;
        self.snapshots.save(&cache).await?;
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    struct Fixture {
        _dir: tempfile::TempDir,
        catalog: Arc<SqliteCatalog>,
        service: VideoService,
    }

    async fn fixture(seed: &[(&str, Category, &str)]) -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let catalog = Arc::new(SqliteCatalog::open_in_memory().unwrap());
        for (name, category, added_by) in seed {
            catalog
                .insert(NewVideo::new(*name, *category, format!("https://cdn.example/{}", name), *added_by))
                .await
                .unwrap();
        }
        let service = VideoService::open(catalog.clone(), ServiceOptions::in_dir(dir.path()))
            .await
            .unwrap();
        Fixture { _dir: dir, catalog, service }
    }

    fn url(name: &str) -> String {
        format!("https://cdn.example/{}", name)
    }

    #[tokio::test]
    async fn test_add_then_remove_restores_prior_state() {
        let f = fixture(&[("old", Category::Green, "alice")]).await;
        let cache_before = f.service.selection.lock().await.clone();
        let rows_before = f.catalog.all_videos().await.unwrap();

        let added = f
            .service
            .add(NewVideo::new("fresh", Category::Green, url("fresh"), "bob"))
            .await
            .unwrap();
        assert!(f.service.selection.lock().await.queue(Category::Green).contains(&added.original_url));
        assert!(f.service.lookup.get("fresh").is_some());

        let removed = f
            .service
            .remove(&added.original_url, IdentifierKind::OriginalUrl, "bob")
            .await
            .unwrap();
        assert_eq!((removed.original_url.as_str(), removed.name.as_str()), (url("fresh").as_str(), "fresh"));

        assert_eq!(*f.service.selection.lock().await, cache_before);
        assert_eq!(f.catalog.all_videos().await.unwrap(), rows_before);
        assert!(f.service.lookup.get("fresh").is_none());
        assert_eq!(f.service.lookup.len(), 1);
    }

    #[tokio::test]
    async fn test_add_conflict_and_empty_name() {
        let f = fixture(&[("x", Category::Red, "alice")]).await;

        let conflict = f.service.add(NewVideo::new("x", Category::Green, url("other"), "bob")).await;
        assert!(matches!(conflict, Err(VideoError::DuplicateConflict(ref c)) if c.len() == 1));

        let empty = f.service.add(NewVideo::new("   ", Category::Green, url("blank"), "bob")).await;
        assert!(matches!(empty, Err(VideoError::InvalidValue(_))));
    }

    #[tokio::test]
    async fn test_names_differing_only_in_case_conflict() {
        let f = fixture(&[]).await;
        f.service.add(NewVideo::new("Clip", Category::Green, url("upper"), "alice")).await.unwrap();

        let second = f.service.add(NewVideo::new("clip", Category::Red, url("lower"), "bob")).await;
        assert!(matches!(second, Err(VideoError::DuplicateConflict(ref c)) if c.len() == 1));

        let kept = f.service.lookup.get("clip").unwrap();
        assert_eq!(kept.name, "Clip");
        assert_eq!(kept.original_url, url("upper"));
        assert_eq!(f.service.suggest("clip").len(), 1);
        assert!(f.catalog.find_by_url(&url("lower")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_remove_notifies_only_for_someone_elses_video() {
        let f = fixture(&[("mine", Category::Green, "alice#0001"), ("theirs", Category::Red, "carol")]).await;
        let mut events = f.service.subscribe_removals();

        f.service.remove("mine", IdentifierKind::Name, "Alice").await.unwrap();
        assert!(events.try_recv().is_err());

        f.service.remove("theirs", IdentifierKind::Name, "alice").await.unwrap();
        let event = events.try_recv().unwrap();
        assert_eq!(
            event,
            VideoRemoved {
                video_name: "theirs".into(),
                category: Category::Red,
                deleted_by: "alice".into(),
                original_contributor: "carol".into(),
                original_url: url("theirs"),
            }
        );

        let missing = f.service.remove("theirs", IdentifierKind::Name, "alice").await;
        assert!(matches!(missing, Err(VideoError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_remove_clears_history_and_hall_of_fame() {
        let f = fixture(&[("star", Category::Yellow, "alice")]).await;
        f.service.mark_played(&url("star"), 10).await.unwrap();
        f.service.promote_hall_of_fame("star").await.unwrap();

        f.service.remove("star", IdentifierKind::Name, "alice").await.unwrap();

        let cache = f.service.selection.lock().await;
        assert_eq!(cache.last_played(&url("star")), None);
        assert!(cache.hall_of_fame().is_empty());
        assert!(cache.queue(Category::Yellow).is_empty());
    }

    #[tokio::test]
    async fn test_recolor_moves_queue_entry() {
        let f = fixture(&[("clip", Category::Green, "alice")]).await;

        assert_eq!(
            f.service.recolor("clip", Category::Green).await.unwrap(),
            RecolorOutcome::Unchanged(Category::Green)
        );
        assert_eq!(
            f.service.recolor("clip", Category::Red).await.unwrap(),
            RecolorOutcome::Moved { from: Category::Green, to: Category::Red }
        );

        {
            let cache = f.service.selection.lock().await;
            assert!(cache.queue(Category::Green).is_empty());
            assert_eq!(cache.queue(Category::Red), [url("clip")]);
        }
        assert_eq!(f.service.lookup.get("clip").unwrap().category, Category::Red);
        assert!(matches!(
            f.service.recolor("nope", Category::Red).await,
            Err(VideoError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_promote_is_one_way_and_ordered() {
        let f = fixture(&[("a", Category::Green, "x"), ("b", Category::Green, "x")]).await;

        assert!(matches!(f.service.promote_hall_of_fame("b").await.unwrap(), PromoteOutcome::Promoted(_)));
        assert!(matches!(
            f.service.promote_hall_of_fame(&url("a")).await.unwrap(),
            PromoteOutcome::Promoted(_)
        ));
        assert!(matches!(
            f.service.promote_hall_of_fame("b").await.unwrap(),
            PromoteOutcome::AlreadyPromoted(_)
        ));
        assert!(matches!(f.service.promote_hall_of_fame("zzz").await, Err(VideoError::NotFound(_))));

        let names: Vec<String> = f.service.hall_of_fame().await.unwrap().into_iter().map(|v| v.name).collect();
        assert_eq!(names, vec!["b", "a"]);
        assert_eq!(f.service.suggest("hof").len(), 2);
    }

    #[tokio::test]
    async fn test_hashtag_edits_report_applied_tags() {
        let f = fixture(&[("clip", Category::Green, "x")]).await;

        let added = f.service.edit_hashtags("clip", &["#Cats", "dogs"], EditMode::Add).await.unwrap();
        assert_eq!(added.applied, vec!["cats", "dogs"]);

        let again = f.service.edit_hashtags("clip", &["cats"], EditMode::Add).await.unwrap();
        assert!(again.is_noop());

        let removed = f.service.edit_hashtags("clip", &["dogs", "fish"], EditMode::Remove).await.unwrap();
        assert_eq!(removed.applied, vec!["dogs"]);
        assert_eq!(removed.resulting, vec!["cats"]);

        assert_eq!(f.service.all_hashtags().await.unwrap(), vec!["cats"]);
        assert_eq!(f.service.suggest("#cats").len(), 1);
        assert!(matches!(
            f.service.edit_hashtags("ghost", &["x"], EditMode::Add).await,
            Err(VideoError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_random_video_marks_play_and_respects_cooldown() {
        let f = fixture(&[("only", Category::Red, "x")]).await;
        f.service.set_cooldown(100).await.unwrap();

        let first = f.service.random_video(&[Category::Red], 0).await.unwrap();
        assert_eq!(first.map(|v| v.name), Some("only".to_string()));
        assert!(f.service.random_video(&[Category::Red], 50).await.unwrap().is_none());
        assert!(f.service.random_video(&[Category::Red], 101).await.unwrap().is_some());

        let (cooldown, status) = f.service.cooldown_status(120).await.unwrap();
        assert_eq!(cooldown, 100);
        assert_eq!(status, CooldownStatus { on_cooldown: 1, available: 0 });
    }

    #[tokio::test]
    async fn test_dispense_does_not_record_plays() {
        let f = fixture(&[("g1", Category::Green, "x"), ("g2", Category::Green, "x")]).await;

        let first = f.service.dispense(&[Category::Green], 0, 100).await.unwrap();
        let second = f.service.dispense(&[Category::Green], 0, 100).await.unwrap();
        assert_eq!(first.len(), 2);
        assert_eq!(second.len(), 2);
        assert_eq!(f.service.selection.lock().await.last_played(&url("g1")), None);
    }

    #[tokio::test]
    async fn test_stats() {
        let f = fixture(&[
            ("a", Category::Green, "alice#1234"),
            ("b", Category::Green, "alice"),
            ("c", Category::Yellow, "bob"),
        ])
        .await;

        let totals = f.service.totals().await.unwrap();
        assert_eq!(totals[&Category::Green], 2);
        assert_eq!(totals[&Category::Red], 0);

        assert_eq!(
            f.service.contributors().await.unwrap(),
            vec![("alice".to_string(), 2), ("bob".to_string(), 1)]
        );
    }

    #[tokio::test]
    async fn test_videos_in_category_lists_one_colour() {
        let f = fixture(&[("b", Category::Green, "x"), ("a", Category::Green, "x"), ("r", Category::Red, "x")]).await;

        let names: Vec<String> = f
            .service
            .videos_in_category(Category::Green)
            .await
            .unwrap()
            .into_iter()
            .map(|v| v.name)
            .collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_play_history_from_display_url_snapshot_keeps_cooldown() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = Arc::new(SqliteCatalog::open_in_memory().unwrap());
        let mut video = NewVideo::new("old", Category::Green, url("old"), "x");
        video.shortened_url = "https://tinyurl.com/abc".into();
        catalog.insert(video).await.unwrap();

        let now = unix_now();
        let options = ServiceOptions::in_dir(dir.path());
        let snapshot = serde_json::json!({
            "video_lists": {"green": ["https://tinyurl.com/abc"]},
            "last_reset": {"green": now},
            "played_videos": {"https://tinyurl.com/abc": now},
            "hall_of_fame": []
        });
        std::fs::write(&options.snapshot_file, snapshot.to_string()).unwrap();

        let service = VideoService::open(catalog, options).await.unwrap();
        assert_eq!(service.selection.lock().await.last_played(&url("old")), Some(now));
        assert!(service.random_video(&[Category::Green], now + 10).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_snapshot_survives_restart() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = Arc::new(SqliteCatalog::open_in_memory().unwrap());
        catalog
            .insert(NewVideo::new("clip", Category::Green, url("clip"), "x"))
            .await
            .unwrap();

        let service = VideoService::open(catalog.clone(), ServiceOptions::in_dir(dir.path())).await.unwrap();
        service.mark_played(&url("clip"), 1_000).await.unwrap();
        service.close().await.unwrap();
        drop(service);

        let reopened = VideoService::open(catalog, ServiceOptions::in_dir(dir.path())).await.unwrap();
        assert_eq!(reopened.selection.lock().await.last_played(&url("clip")), Some(1_000));
    }
}
