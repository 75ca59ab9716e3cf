//! Process-wide cooldown setting.
//!
//! Lives in a small settings file shared with unrelated features, so reads
//! and writes touch only the `cooldown` key.

use serde_json::{Map, Value};
use std::path::PathBuf;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::{
    error::{Result, VideoError},
    storage,
};

const COOLDOWN_KEY: &str = "cooldown";

pub struct CooldownPolicy {
    path: PathBuf,
    default_seconds: u64,
    /// Serializes read-modify-write cycles on the settings file
    write_lock: Mutex<()>,
}

impl CooldownPolicy {
    pub fn new(path: PathBuf, default_seconds: u64) -> Self {
        Self {
            path,
            default_seconds,
            write_lock: Mutex::new(()),
        }
    }

    /// Current cooldown in seconds, read from disk on every call so an edit
    /// takes effect without a restart.
    pub async fn get_cooldown(&self) -> Result<u64> {
        let settings = self.load().await?;
        match settings.get(COOLDOWN_KEY) {
            None => Ok(self.default_seconds),
            Some(value) => match value.as_u64() {
                Some(seconds) => Ok(seconds),
                None => {
                    warn!("⚠️ Cooldown inválido en {}: {}", self.path.display(), value);
                    Ok(self.default_seconds)
                }
            },
        }
    }

    /// Zero is allowed and means every video is always eligible.
    pub async fn set_cooldown(&self, seconds: i64) -> Result<u64> {
        let seconds = u64::try_from(seconds)
            .map_err(|_| VideoError::InvalidValue(format!("cooldown must not be negative, got {}", seconds)))?;

        let _guard = self.write_lock.lock().await;
        let mut settings = self.load().await?;
        settings.insert(COOLDOWN_KEY.to_string(), Value::from(seconds));
        storage::write_json_atomic(&self.path, &settings).await?;

        info!("⏱️ Cooldown actualizado a {}s", seconds);
        Ok(seconds)
    }

    async fn load(&self) -> Result<Map<String, Value>> {
        match storage::read_json::<Value>(&self.path).await? {
            Some(Value::Object(map)) => Ok(map),
            Some(other) => {
                warn!("⚠️ {} no contiene un objeto JSON: {}", self.path.display(), other);
                Ok(Map::new())
            }
            None => Ok(Map::new()),
        }
    }
}

/// `"2 days, 3 hours"` style rendering; zero renders as `"0 seconds"`.
pub fn format_cooldown(seconds: u64) -> String {
    let days = seconds / 86_400;
    let hours = seconds % 86_400 / 3_600;
    let minutes = seconds % 3_600 / 60;
    let secs = seconds % 60;

    let mut parts = Vec::new();
    for (amount, unit) in [(days, "day"), (hours, "hour"), (minutes, "minute"), (secs, "second")] {
        if amount > 0 {
            let plural = if amount == 1 { "" } else { "s" };
            parts.push(format!("{} {}{}", amount, unit, plural));
        }
    }

    if parts.is_empty() {
        "0 seconds".to_string()
    } else {
        parts.join(", ")
    }
}

/// Converts a value in `days`, `hours`, `minutes` or `seconds` into seconds.
pub fn to_seconds(value: i64, unit: &str) -> Option<i64> {
    let factor = match unit {
        "days" => 86_400,
        "hours" => 3_600,
        "minutes" => 60,
        "seconds" => 1,
        _ => return None,
    };
    value.checked_mul(factor)
}
