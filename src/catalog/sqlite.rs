use async_trait::async_trait;
use parking_lot::Mutex;
use rusqlite::{params, types::Type, Connection, OptionalExtension, Row};
use std::{collections::BTreeMap, path::Path, sync::Arc};
use tracing::{debug, info};

use super::{
    Catalog, Category, Conflict, ConflictField, DuplicateGroup, HallOfFameChange, IdentifierKind,
    NewVideo, Provenance, RemovedVideo, VideoRecord,
};
use crate::error::{Result, VideoError};

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS videos (
        id INTEGER PRIMARY KEY,
        name TEXT NOT NULL,
        url TEXT NOT NULL,
        color TEXT NOT NULL,
        original_url TEXT NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_videos_color ON videos(color);
    CREATE INDEX IF NOT EXISTS idx_videos_name ON videos(name);
"#;

/// Columns added after the first release. Older databases get them via
/// `ALTER TABLE` on open.
const LATER_COLUMNS: &[(&str, &str)] = &[
    ("date_added", "TEXT"),
    ("added_by", "TEXT"),
    ("is_hall_of_fame", "INTEGER NOT NULL DEFAULT 0"),
    ("hashtags", "TEXT"),
    ("author_link", "TEXT"),
    ("source_link", "TEXT"),
    ("audio_link", "TEXT"),
];

const COLUMNS: &str = "id, name, color, url, original_url, added_by, date_added, \
                       is_hall_of_fame, hashtags, author_link, source_link, audio_link";

/// SQLite-backed catalog.
///
/// rusqlite is synchronous, so every call hops onto the blocking pool while
/// holding the connection lock.
#[derive(Clone)]
pub struct SqliteCatalog {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteCatalog {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode = WAL;")?;
        migrate(&conn)?;

        info!("🗄️ Catálogo abierto en: {}", path.display());
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    #[allow(dead_code)]
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        migrate(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    async fn with_conn<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let mut guard = conn.lock();
            f(&mut guard)
        })
        .await?
    }

    /// Runs arbitrary SQL, bypassing the conflict check. Lets tests recreate
    /// legacy corruption.
    #[cfg(test)]
    pub(crate) async fn execute_raw(&self, sql: &str) -> Result<()> {
        let sql = sql.to_string();
        self.with_conn(move |conn| {
            conn.execute_batch(&sql)?;
            Ok(())
        })
        .await
    }
}

fn migrate(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA)?;

    let existing: Vec<String> = {
        let mut stmt = conn.prepare("PRAGMA table_info(videos)")?;
        let names = stmt.query_map([], |row| row.get::<_, String>(1))?;
        names.collect::<rusqlite::Result<_>>()?
    };

    for (column, definition) in LATER_COLUMNS {
        if !existing.iter().any(|c| c == column) {
            conn.execute_batch(&format!("ALTER TABLE videos ADD COLUMN {} {};", column, definition))?;
            debug!("Columna agregada al catálogo: {}", column);
        }
    }

    Ok(())
}

fn map_video(row: &Row) -> rusqlite::Result<VideoRecord> {
    let color: String = row.get(2)?;
    let category = color
        .parse::<Category>()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(2, Type::Text, Box::new(e)))?;

    Ok(VideoRecord {
        id: row.get(0)?,
        name: row.get(1)?,
        category,
        shortened_url: row.get(3)?,
        original_url: row.get(4)?,
        added_by: row.get::<_, Option<String>>(5)?.unwrap_or_default(),
        date_added: row.get::<_, Option<String>>(6)?.unwrap_or_default(),
        is_hall_of_fame: row.get::<_, Option<i64>>(7)?.unwrap_or(0) != 0,
        hashtags: row.get::<_, Option<String>>(8)?.filter(|h| !h.is_empty()),
        provenance: Provenance {
            author_link: row.get(9)?,
            source_link: row.get(10)?,
            audio_link: row.get(11)?,
        },
    })
}

fn query_videos<P: rusqlite::Params>(conn: &Connection, sql: &str, params: P) -> Result<Vec<VideoRecord>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map(params, map_video)?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

fn find_conflicts(conn: &Connection, video: &NewVideo) -> Result<Vec<Conflict>> {
    let sql = format!(
        "SELECT {} FROM videos
         WHERE LOWER(name) = LOWER(?1) OR url = ?2 OR original_url = ?3
            OR (?4 IS NOT NULL AND source_link = ?4)
         ORDER BY id",
        COLUMNS
    );
    let clashing = query_videos(
        conn,
        &sql,
        params![
            video.name,
            video.shortened_url,
            video.original_url,
            video.provenance.source_link
        ],
    )?;

    let mut conflicts = Vec::new();
    for existing in clashing {
        let mut clash = |field| {
            conflicts.push(Conflict {
                field,
                name: existing.name.clone(),
                url: existing.original_url.clone(),
            })
        };

        // Names are unique regardless of case
        if existing.name.to_lowercase() == video.name.to_lowercase() {
            clash(ConflictField::Name);
        }
        // Display and original URL are usually the same string; report it once.
        if existing.original_url == video.original_url {
            clash(ConflictField::OriginalUrl);
        } else if existing.shortened_url == video.shortened_url {
            clash(ConflictField::ShortenedUrl);
        }
        if video.provenance.source_link.is_some()
            && existing.provenance.source_link == video.provenance.source_link
        {
            clash(ConflictField::SourceLink);
        }
    }

    Ok(conflicts)
}

#[async_trait]
impl Catalog for SqliteCatalog {
    async fn insert(&self, video: NewVideo) -> Result<VideoRecord> {
        self.with_conn(move |conn| {
            let tx = conn.transaction()?;

            let conflicts = find_conflicts(&tx, &video)?;
            if !conflicts.is_empty() {
                return Err(VideoError::DuplicateConflict(conflicts));
            }

            tx.execute(
                "INSERT INTO videos (name, url, color, original_url, added_by, date_added,
                                     is_hall_of_fame, hashtags, author_link, source_link, audio_link)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, 0, NULL, ?7, ?8, ?9)",
                params![
                    video.name,
                    video.shortened_url,
                    video.category.as_str(),
                    video.original_url,
                    video.added_by,
                    video.date_added,
                    video.provenance.author_link,
                    video.provenance.source_link,
                    video.provenance.audio_link,
                ],
            )?;
            let id = tx.last_insert_rowid();
            tx.commit()?;

            Ok(VideoRecord {
                id,
                name: video.name,
                category: video.category,
                shortened_url: video.shortened_url,
                original_url: video.original_url,
                added_by: video.added_by,
                date_added: video.date_added,
                is_hall_of_fame: false,
                hashtags: None,
                provenance: video.provenance,
            })
        })
        .await
    }

    async fn delete(&self, identifier: &str, kind: IdentifierKind) -> Result<Option<RemovedVideo>> {
        let identifier = identifier.to_string();
        self.with_conn(move |conn| {
            let tx = conn.transaction()?;
            let mut removed = None;

            for category in Category::ALL {
                let select = format!(
                    "SELECT {} FROM videos WHERE {} = ?1 AND LOWER(color) = ?2 ORDER BY id LIMIT 1",
                    COLUMNS,
                    kind.column()
                );
                let found = tx
                    .query_row(&select, params![identifier, category.as_str()], map_video)
                    .optional()?;

                if let Some(record) = found {
                    let delete = format!(
                        "DELETE FROM videos WHERE {} = ?1 AND LOWER(color) = ?2",
                        kind.column()
                    );
                    tx.execute(&delete, params![identifier, category.as_str()])?;
                    removed = Some(RemovedVideo {
                        original_url: record.original_url,
                        name: record.name,
                        category: record.category,
                        added_by: record.added_by,
                    });
                    break;
                }
            }

            tx.commit()?;
            Ok(removed)
        })
        .await
    }

    async fn delete_by_id(&self, id: i64) -> Result<()> {
        self.with_conn(move |conn| {
            conn.execute("DELETE FROM videos WHERE id = ?1", params![id])?;
            Ok(())
        })
        .await
    }

    async fn get_by_name(&self, name: &str) -> Result<Option<VideoRecord>> {
        let name = name.to_string();
        self.with_conn(move |conn| {
            let sql = format!("SELECT {} FROM videos WHERE name = ?1 ORDER BY id LIMIT 1", COLUMNS);
            Ok(conn.query_row(&sql, params![name], map_video).optional()?)
        })
        .await
    }

    async fn find_by_url(&self, url: &str) -> Result<Option<VideoRecord>> {
        let url = url.to_string();
        self.with_conn(move |conn| {
            let sql = format!(
                "SELECT {} FROM videos WHERE url = ?1 OR original_url = ?1 ORDER BY id LIMIT 1",
                COLUMNS
            );
            Ok(conn.query_row(&sql, params![url], map_video).optional()?)
        })
        .await
    }

    async fn update_category(&self, name: &str, category: Category) -> Result<bool> {
        let name = name.to_string();
        self.with_conn(move |conn| {
            let changed = conn.execute(
                "UPDATE videos SET color = ?1 WHERE name = ?2",
                params![category.as_str(), name],
            )?;
            Ok(changed > 0)
        })
        .await
    }

    async fn set_hall_of_fame(&self, identifier: &str) -> Result<HallOfFameChange> {
        let identifier = identifier.to_string();
        self.with_conn(move |conn| {
            let sql = format!(
                "SELECT {} FROM videos WHERE name = ?1 OR original_url = ?1 ORDER BY id LIMIT 1",
                COLUMNS
            );
            let Some(mut record) = conn.query_row(&sql, params![identifier], map_video).optional()? else {
                return Ok(HallOfFameChange::NotFound);
            };

            if record.is_hall_of_fame {
                return Ok(HallOfFameChange::AlreadyPromoted(record));
            }

            conn.execute("UPDATE videos SET is_hall_of_fame = 1 WHERE id = ?1", params![record.id])?;
            record.is_hall_of_fame = true;
            Ok(HallOfFameChange::Promoted(record))
        })
        .await
    }

    async fn update_hashtags(&self, name: &str, hashtags: &str) -> Result<bool> {
        let name = name.to_string();
        let hashtags = hashtags.to_string();
        self.with_conn(move |conn| {
            let stored = if hashtags.is_empty() { None } else { Some(hashtags) };
            let changed = conn.execute(
                "UPDATE videos SET hashtags = ?1 WHERE name = ?2",
                params![stored, name],
            )?;
            Ok(changed > 0)
        })
        .await
    }

    async fn urls_in_category(&self, category: Category) -> Result<Vec<String>> {
        self.with_conn(move |conn| {
            let mut stmt =
                conn.prepare("SELECT original_url FROM videos WHERE LOWER(color) = ?1 ORDER BY id")?;
            let urls = stmt.query_map(params![category.as_str()], |row| row.get::<_, String>(0))?;
            Ok(urls.collect::<rusqlite::Result<Vec<_>>>()?)
        })
        .await
    }

    async fn videos_in_category(&self, category: Category) -> Result<Vec<VideoRecord>> {
        self.with_conn(move |conn| {
            let sql = format!(
                "SELECT {} FROM videos WHERE LOWER(color) = ?1 ORDER BY name COLLATE NOCASE, id",
                COLUMNS
            );
            query_videos(conn, &sql, params![category.as_str()])
        })
        .await
    }

    async fn hall_of_fame_urls(&self) -> Result<Vec<String>> {
        self.with_conn(|conn| {
            let mut stmt =
                conn.prepare("SELECT original_url FROM videos WHERE is_hall_of_fame = 1 ORDER BY id")?;
            let urls = stmt.query_map([], |row| row.get::<_, String>(0))?;
            Ok(urls.collect::<rusqlite::Result<Vec<_>>>()?)
        })
        .await
    }

    async fn all_videos(&self) -> Result<Vec<VideoRecord>> {
        self.with_conn(|conn| {
            let sql = format!("SELECT {} FROM videos ORDER BY id", COLUMNS);
            query_videos(conn, &sql, [])
        })
        .await
    }

    async fn duplicate_groups(&self) -> Result<Vec<DuplicateGroup>> {
        self.with_conn(|conn| {
            let urls: Vec<String> = {
                let mut stmt = conn.prepare(
                    "SELECT original_url FROM videos GROUP BY original_url
                     HAVING COUNT(*) > 1 ORDER BY MIN(id)",
                )?;
                let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
                rows.collect::<rusqlite::Result<_>>()?
            };

            let sql = format!("SELECT {} FROM videos WHERE original_url = ?1 ORDER BY id", COLUMNS);
            urls.into_iter()
                .map(|original_url| -> Result<DuplicateGroup> {
                    let records = query_videos(conn, &sql, params![original_url])?;
                    Ok(DuplicateGroup { original_url, records })
                })
                .collect()
        })
        .await
    }

    async fn enforce_unique_identity(&self) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute_batch(
                "CREATE UNIQUE INDEX IF NOT EXISTS idx_videos_original_url ON videos(original_url);",
            )?;
            Ok(())
        })
        .await
    }

    async fn counts_by_category(&self) -> Result<BTreeMap<Category, u64>> {
        self.with_conn(|conn| {
            let mut counts: BTreeMap<Category, u64> = Category::ALL.iter().map(|c| (*c, 0)).collect();
            let mut stmt = conn.prepare("SELECT LOWER(color), COUNT(*) FROM videos GROUP BY LOWER(color)")?;
            let rows = stmt.query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)))?;

            for row in rows {
                let (color, count) = row?;
                if let Ok(category) = color.parse::<Category>() {
                    counts.insert(category, count.max(0) as u64);
                }
            }
            Ok(counts)
        })
        .await
    }

    async fn counts_by_contributor(&self) -> Result<Vec<(String, u64)>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT COALESCE(added_by, ''), COUNT(*) FROM videos GROUP BY COALESCE(added_by, '')",
            )?;
            let rows = stmt.query_map([], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?.max(0) as u64))
            })?;
            Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
        })
        .await
    }

    async fn hashtag_strings(&self) -> Result<Vec<String>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT DISTINCT hashtags FROM videos WHERE hashtags IS NOT NULL AND hashtags != ''",
            )?;
            let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
            Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn video(name: &str, category: Category, url: &str) -> NewVideo {
        NewVideo::new(name, category, url, "tester#0001")
    }

    #[tokio::test]
    async fn test_insert_then_lookup_by_name_and_url() {
        let catalog = SqliteCatalog::open_in_memory().unwrap();
        let stored = catalog
            .insert(video("clip", Category::Green, "https://cdn.example/a.mp4"))
            .await
            .unwrap();

        let by_name = catalog.get_by_name("clip").await.unwrap().unwrap();
        assert_eq!(by_name, stored);
        assert_eq!(by_name.category, Category::Green);
        assert!(!by_name.is_hall_of_fame);

        let by_url = catalog.find_by_url("https://cdn.example/a.mp4").await.unwrap();
        assert_eq!(by_url.map(|v| v.name), Some("clip".to_string()));
    }

    #[tokio::test]
    async fn test_insert_reports_every_conflict() {
        let catalog = SqliteCatalog::open_in_memory().unwrap();
        catalog.insert(video("x", Category::Green, "https://cdn.example/1")).await.unwrap();
        catalog.insert(video("other", Category::Red, "y")).await.unwrap();

        let conflicts = match catalog.insert(video("x", Category::Yellow, "y")).await {
            Err(VideoError::DuplicateConflict(conflicts)) => conflicts,
            other => panic!("expected a duplicate conflict, got {other:?}"),
        };

        assert_eq!(
            conflicts,
            vec![
                Conflict {
                    field: ConflictField::Name,
                    name: "x".into(),
                    url: "https://cdn.example/1".into(),
                },
                Conflict {
                    field: ConflictField::OriginalUrl,
                    name: "other".into(),
                    url: "y".into(),
                },
            ]
        );
        assert_eq!(catalog.all_videos().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_name_conflict_ignores_case() {
        let catalog = SqliteCatalog::open_in_memory().unwrap();
        catalog.insert(video("Clip", Category::Green, "https://cdn.example/1")).await.unwrap();

        match catalog.insert(video("clip", Category::Red, "https://cdn.example/2")).await {
            Err(VideoError::DuplicateConflict(conflicts)) => {
                assert_eq!(conflicts.len(), 1);
                assert_eq!(conflicts[0].field, ConflictField::Name);
                assert_eq!(conflicts[0].name, "Clip");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_videos_in_category_sorted_by_name() {
        let catalog = SqliteCatalog::open_in_memory().unwrap();
        catalog.insert(video("zebra", Category::Green, "z")).await.unwrap();
        catalog.insert(video("Apple", Category::Green, "a")).await.unwrap();
        catalog.insert(video("mango", Category::Green, "m")).await.unwrap();
        catalog.insert(video("red one", Category::Red, "r")).await.unwrap();

        let names: Vec<String> = catalog
            .videos_in_category(Category::Green)
            .await
            .unwrap()
            .into_iter()
            .map(|v| v.name)
            .collect();
        assert_eq!(names, vec!["Apple", "mango", "zebra"]);
        assert!(catalog.videos_in_category(Category::Yellow).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_source_link_conflict() {
        let catalog = SqliteCatalog::open_in_memory().unwrap();
        let mut first = video("first", Category::Green, "https://cdn.example/1");
        first.provenance.source_link = Some("https://www.tiktok.com/@a/video/9".into());
        catalog.insert(first).await.unwrap();

        let mut second = video("second", Category::Green, "https://cdn.example/2");
        second.provenance.source_link = Some("https://www.tiktok.com/@a/video/9".into());

        match catalog.insert(second).await {
            Err(VideoError::DuplicateConflict(conflicts)) => {
                assert_eq!(conflicts.len(), 1);
                assert_eq!(conflicts[0].field, ConflictField::SourceLink);
                assert_eq!(conflicts[0].name, "first");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_delete_by_name_and_by_url() {
        let catalog = SqliteCatalog::open_in_memory().unwrap();
        catalog.insert(video("a", Category::Red, "https://cdn.example/a")).await.unwrap();
        catalog.insert(video("b", Category::Yellow, "https://cdn.example/b")).await.unwrap();

        let removed = catalog.delete("a", IdentifierKind::Name).await.unwrap().unwrap();
        assert_eq!(removed.original_url, "https://cdn.example/a");
        assert_eq!(removed.category, Category::Red);
        assert_eq!(removed.added_by, "tester#0001");

        let removed = catalog
            .delete("https://cdn.example/b", IdentifierKind::OriginalUrl)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(removed.name, "b");

        assert!(catalog.delete("a", IdentifierKind::Name).await.unwrap().is_none());
        assert!(catalog.all_videos().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_hall_of_fame_is_set_once() {
        let catalog = SqliteCatalog::open_in_memory().unwrap();
        catalog.insert(video("star", Category::Green, "https://cdn.example/s")).await.unwrap();

        assert!(matches!(
            catalog.set_hall_of_fame("star").await.unwrap(),
            HallOfFameChange::Promoted(ref v) if v.is_hall_of_fame
        ));
        assert!(matches!(
            catalog.set_hall_of_fame("https://cdn.example/s").await.unwrap(),
            HallOfFameChange::AlreadyPromoted(_)
        ));
        assert_eq!(catalog.set_hall_of_fame("missing").await.unwrap(), HallOfFameChange::NotFound);
        assert_eq!(
            catalog.hall_of_fame_urls().await.unwrap(),
            vec!["https://cdn.example/s".to_string()]
        );
    }

    #[tokio::test]
    async fn test_category_partitions_and_counts() {
        let catalog = SqliteCatalog::open_in_memory().unwrap();
        catalog.insert(video("g1", Category::Green, "g1")).await.unwrap();
        catalog.insert(video("g2", Category::Green, "g2")).await.unwrap();
        catalog.insert(video("r1", Category::Red, "r1")).await.unwrap();

        assert!(catalog.update_category("g2", Category::Yellow).await.unwrap());
        assert!(!catalog.update_category("nope", Category::Yellow).await.unwrap());

        assert_eq!(catalog.urls_in_category(Category::Green).await.unwrap(), vec!["g1".to_string()]);
        assert_eq!(catalog.urls_in_category(Category::Yellow).await.unwrap(), vec!["g2".to_string()]);

        let counts = catalog.counts_by_category().await.unwrap();
        assert_eq!(counts[&Category::Green], 1);
        assert_eq!(counts[&Category::Red], 1);
        assert_eq!(counts[&Category::Yellow], 1);
    }

    #[tokio::test]
    async fn test_hashtags_replace_and_clear() {
        let catalog = SqliteCatalog::open_in_memory().unwrap();
        catalog.insert(video("tagged", Category::Green, "t")).await.unwrap();

        assert!(catalog.update_hashtags("tagged", "cats,dogs").await.unwrap());
        assert_eq!(
            catalog.get_by_name("tagged").await.unwrap().unwrap().hashtags.as_deref(),
            Some("cats,dogs")
        );
        assert_eq!(catalog.hashtag_strings().await.unwrap(), vec!["cats,dogs".to_string()]);

        assert!(catalog.update_hashtags("tagged", "").await.unwrap());
        assert!(catalog.get_by_name("tagged").await.unwrap().unwrap().hashtags.is_none());
        assert!(catalog.hashtag_strings().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_legacy_table_gains_new_columns() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("videos.db");
        {
            let conn = Connection::open(&path).unwrap();
            conn.execute_batch(
                "CREATE TABLE videos (id INTEGER PRIMARY KEY, name TEXT, url TEXT, color TEXT, original_url TEXT);
                 INSERT INTO videos (name, url, color, original_url) VALUES ('old', 'short', 'Green', 'long');",
            )
            .unwrap();
        }

        let catalog = SqliteCatalog::open(&path).unwrap();
        let old = catalog.get_by_name("old").await.unwrap().unwrap();
        assert_eq!(old.category, Category::Green);
        assert_eq!(old.shortened_url, "short");
        assert_eq!(old.added_by, "");
        assert!(!old.is_hall_of_fame);
        assert_eq!(catalog.urls_in_category(Category::Green).await.unwrap(), vec!["long".to_string()]);
    }

    #[tokio::test]
    async fn test_unique_identity_blocks_raw_duplicates() {
        let catalog = SqliteCatalog::open_in_memory().unwrap();
        catalog.insert(video("one", Category::Green, "same")).await.unwrap();
        catalog.enforce_unique_identity().await.unwrap();

        let raw = catalog
            .with_conn(|conn| {
                conn.execute(
                    "INSERT INTO videos (name, url, color, original_url) VALUES ('two', 'x', 'red', 'same')",
                    [],
                )?;
                Ok(())
            })
            .await;
        assert!(matches!(raw, Err(VideoError::StorageUnavailable(_))));
    }
}
