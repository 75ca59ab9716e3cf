//! # Cache Synchronizer
//!
//! Reconciles the selection cache and the lookup cache with the catalog.
//! Runs on startup and periodically afterwards; it is the only place that
//! resolves duplicate `original_url` rows.
//!
//! A second run with no store changes in between reports nothing and logs
//! nothing.

use rand::Rng;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use tracing::{info, warn};

use crate::{
    catalog::{Catalog, Category, VideoRecord},
    error::Result,
    lookup::LookupCache,
    selection::{shuffle, SelectionCache},
};

/// What a reconciliation pass corrected.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub duplicates_removed: usize,
    pub added: BTreeMap<Category, Vec<String>>,
    pub removed: BTreeMap<Category, Vec<String>>,
    pub hall_of_fame_changed: bool,
    /// Play history moved from a display URL onto its original URL
    pub played_rekeyed: usize,
    pub played_pruned: usize,
}

impl SyncReport {
    /// True when the cache already matched the store.
    pub fn is_clean(&self) -> bool {
        self.duplicates_removed == 0
            && self.added.values().all(Vec::is_empty)
            && self.removed.values().all(Vec::is_empty)
            && !self.hall_of_fame_changed
            && self.played_rekeyed == 0
            && self.played_pruned == 0
    }
}

/// Brings `cache` and `lookup` in line with `catalog`.
///
/// The caller persists the snapshot afterwards.
pub async fn reconcile<R: Rng + ?Sized>(
    catalog: &dyn Catalog,
    cache: &mut SelectionCache,
    lookup: &LookupCache,
    now: i64,
    rng: &mut R,
) -> Result<SyncReport> {
    let mut report = SyncReport {
        duplicates_removed: remove_duplicates(catalog).await?,
        ..SyncReport::default()
    };

    // Everything is read before the cache is touched
    let mut store_sets = Vec::with_capacity(Category::ALL.len());
    for category in Category::ALL {
        store_sets.push((category, catalog.urls_in_category(category).await?));
    }
    let store_hall_of_fame = catalog.hall_of_fame_urls().await?;
    let videos = catalog.all_videos().await?;

    for (category, urls) in store_sets {
        let in_store: BTreeSet<&String> = urls.iter().collect();
        let in_cache: BTreeSet<&String> = cache.queue(category).iter().collect();

        let added: Vec<String> = in_store.difference(&in_cache).map(|u| u.to_string()).collect();
        let removed: Vec<String> = in_cache.difference(&in_store).map(|u| u.to_string()).collect();

        for url in &added {
            info!("➕ [{}] agregado al cache: {}", category, url);
        }
        for url in &removed {
            info!("➖ [{}] eliminado del cache: {}", category, url);
        }

        if !added.is_empty() || !removed.is_empty() || !cache.is_loaded(category) {
            let mut queue = urls;
            shuffle::fisher_yates(&mut queue, rng);
            cache.replace_queue(category, queue, now);
        }
        report.added.insert(category, added);
        report.removed.insert(category, removed);
    }

    report.hall_of_fame_changed = reconcile_hall_of_fame(cache, store_hall_of_fame);

    let known: HashSet<&str> = videos.iter().map(|v| v.original_url.as_str()).collect();

    // Older snapshots keyed play history by the display URL
    let by_display: HashMap<&str, &str> = videos
        .iter()
        .filter(|v| v.shortened_url != v.original_url)
        .map(|v| (v.shortened_url.as_str(), v.original_url.as_str()))
        .collect();
    let rekeyed = cache.rekey_played(|key| {
        if known.contains(key) {
            return None;
        }
        by_display.get(key).map(|original| original.to_string())
    });
    for (old, new) in &rekeyed {
        info!("🔑 Historial de reproducción migrado: {} -> {}", old, new);
    }
    report.played_rekeyed = rekeyed.len();

    report.played_pruned = cache.retain_played(|url| known.contains(url));
    if report.played_pruned > 0 {
        info!("🧹 {} entradas de reproducción sin video eliminadas", report.played_pruned);
    }

    if let Err(e) = catalog.enforce_unique_identity().await {
        warn!("⚠️ No se pudo crear el índice único de original_url: {}", e);
    }

    lookup.rebuild(videos);

    if !report.is_clean() {
        info!("🔄 Sincronización completada: {:?}", report);
    }
    Ok(report)
}

/// Keeps the lowest id of every group sharing an `original_url`.
async fn remove_duplicates(catalog: &dyn Catalog) -> Result<usize> {
    let mut removed = 0;

    for group in catalog.duplicate_groups().await? {
        let Some((kept, discarded)) = group.records.split_first() else {
            continue;
        };
        info!(
            "🔁 Duplicado de {}: se conserva #{} {}",
            group.original_url,
            kept.id,
            describe(kept)
        );
        for record in discarded {
            catalog.delete_by_id(record.id).await?;
            info!("🗑️ Descartado #{} {}", record.id, describe(record));
            removed += 1;
        }
    }

    Ok(removed)
}

fn describe(record: &VideoRecord) -> String {
    format!(
        "`{}` ({}, agregado por {})",
        record.name,
        record.category,
        if record.added_by.is_empty() { "desconocido" } else { record.added_by.as_str() }
    )
}

/// Store flag wins. Existing entries keep their promotion order.
fn reconcile_hall_of_fame(cache: &mut SelectionCache, in_store: Vec<String>) -> bool {
    let flagged: HashSet<&String> = in_store.iter().collect();
    let mut merged: Vec<String> = cache
        .hall_of_fame()
        .iter()
        .filter(|url| flagged.contains(url))
        .cloned()
        .collect();
    for url in &in_store {
        if !merged.contains(url) {
            merged.push(url.clone());
        }
    }

    if merged == cache.hall_of_fame() {
        return false;
    }
    info!(
        "🏆 Hall of fame corregido: {} -> {} videos",
        cache.hall_of_fame().len(),
        merged.len()
    );
    cache.set_hall_of_fame(merged);
    true
}
