use rand::Rng;
use tracing::debug;

use super::{shuffle, SelectionCache};
use crate::{
    catalog::{Catalog, Category},
    error::Result,
};

/// How long a queue may go without a refill, even when it is not empty.
pub const DEFAULT_STALENESS_WINDOW: i64 = 129_600;

/// Picks the videos currently allowed to be shown.
///
/// Dispensing never records a play. Callers that commit to a video mark it
/// played themselves, so re-rolls do not burn through the rotation.
#[derive(Debug, Clone, Copy)]
pub struct Dispenser {
    staleness_window: i64,
}

impl Default for Dispenser {
    fn default() -> Self {
        Self::new(DEFAULT_STALENESS_WINDOW)
    }
}

impl Dispenser {
    pub fn new(staleness_window: i64) -> Self {
        Self { staleness_window }
    }

    /// Returns the eligible original URLs of `categories`, shuffled.
    ///
    /// Empty or stale queues are refilled from the catalog first. All refill
    /// queries finish before any queue is replaced, so a store failure
    /// leaves the cache exactly as it was. An empty result means everything
    /// is on cooldown.
    pub async fn dispense<R: Rng + ?Sized>(
        &self,
        cache: &mut SelectionCache,
        catalog: &dyn Catalog,
        categories: &[Category],
        now: i64,
        cooldown: u64,
        rng: &mut R,
    ) -> Result<Vec<String>> {
        let mut refills = Vec::new();
        for &category in categories {
            if refills.iter().any(|(c, _)| *c == category) {
                continue;
            }
            if cache.needs_refill(category, now, self.staleness_window) {
                let urls = catalog.urls_in_category(category).await?;
                refills.push((category, urls));
            }
        }

        for (category, mut urls) in refills {
            shuffle::fisher_yates(&mut urls, rng);
            debug!("🔀 Cola {} recargada con {} videos", category, urls.len());
            cache.replace_queue(category, urls, now);
        }

        let mut seen = Vec::with_capacity(categories.len());
        let mut available = Vec::new();
        for &category in categories {
            if seen.contains(&category) {
                continue;
            }
            seen.push(category);
            available.extend(
                cache
                    .queue(category)
                    .iter()
                    .filter(|url| cache.is_eligible(url, now, cooldown))
                    .cloned(),
            );
        }

        shuffle::fisher_yates(&mut available, rng);
        Ok(available)
    }
}
