use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    // Discord
    pub discord_token: String,
    pub application_id: u64,
    pub guild_id: Option<u64>, // Para comandos de desarrollo

    // Paths
    pub data_dir: PathBuf,
    pub database_file: PathBuf,
    pub snapshot_file: PathBuf,
    pub settings_file: PathBuf,

    // Selección (en segundos)
    pub default_cooldown: u64,
    pub staleness_window: i64,
    pub sync_interval: u64,

    // Moderación
    pub admin_user_id: Option<u64>,
    pub admin_role_id: Option<u64>,
    pub mod_log_channel_id: Option<u64>,
}

fn optional_id(key: &str) -> Option<u64> {
    std::env::var(key).ok().and_then(|s| s.trim().parse().ok())
}

impl Config {
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        let config = Self {
            // Discord
            discord_token: std::env::var("DISCORD_TOKEN")?,
            application_id: std::env::var("APPLICATION_ID")?.parse()?,
            guild_id: optional_id("GUILD_ID"),

            // Paths
            data_dir: std::env::var("DATA_DIR")
                .unwrap_or_else(|_| "./data".to_string())
                .into(),
            database_file: std::env::var("DATABASE_FILE")
                .unwrap_or_else(|_| "videos.db".to_string())
                .into(),
            snapshot_file: std::env::var("SNAPSHOT_FILE")
                .unwrap_or_else(|_| "video_data.json".to_string())
                .into(),
            settings_file: std::env::var("SETTINGS_FILE")
                .unwrap_or_else(|_| "bot_settings.json".to_string())
                .into(),

            // Selección
            default_cooldown: std::env::var("DEFAULT_COOLDOWN")
                .unwrap_or_else(|_| "216000".to_string()) // 60 horas
                .parse()?,
            staleness_window: std::env::var("STALENESS_WINDOW")
                .unwrap_or_else(|_| "129600".to_string()) // 36 horas
                .parse()?,
            sync_interval: std::env::var("SYNC_INTERVAL")
                .unwrap_or_else(|_| "21600".to_string()) // 6 horas
                .parse()?,

            // Moderación
            admin_user_id: optional_id("ADMIN_USER_ID"),
            admin_role_id: optional_id("ADMIN_ROLE_ID"),
            mod_log_channel_id: optional_id("MOD_LOG_CHANNEL_ID"),
        };

        // Create the data directory if it doesn't exist
        std::fs::create_dir_all(&config.data_dir)?;

        config.validate()?;

        Ok(config)
    }

    /// Validates configuration values for correctness.
    ///
    /// # Validation Rules
    ///
    /// - Application ID must be set
    /// - Staleness window must be positive
    /// - Sync interval must be at least one minute
    pub fn validate(&self) -> Result<()> {
        if self.application_id == 0 {
            anyhow::bail!("APPLICATION_ID must be set");
        }

        if self.staleness_window <= 0 {
            anyhow::bail!("Staleness window must be positive, got: {}", self.staleness_window);
        }

        if self.sync_interval < 60 {
            anyhow::bail!("Sync interval must be at least 60 seconds, got: {}", self.sync_interval);
        }

        Ok(())
    }

    fn in_data_dir(&self, file: &Path) -> PathBuf {
        if file.is_absolute() {
            file.to_path_buf()
        } else {
            self.data_dir.join(file)
        }
    }

    pub fn database_path(&self) -> PathBuf {
        self.in_data_dir(&self.database_file)
    }

    pub fn snapshot_path(&self) -> PathBuf {
        self.in_data_dir(&self.snapshot_file)
    }

    pub fn settings_path(&self) -> PathBuf {
        self.in_data_dir(&self.settings_file)
    }

    /// Returns a summary of the current configuration for logging.
    ///
    /// Never includes the token.
    pub fn summary(&self) -> String {
        format!(
            "Config Summary:\n  \
            Discord: App ID {} (Guild: {})\n  \
            Data: {}\n  \
            Selection: {}s default cooldown, {}s staleness, sync every {}s\n  \
            Moderation: admin user {}, admin role {}, mod log {}",
            self.application_id,
            self.guild_id.map_or("global".to_string(), |id| id.to_string()),
            self.data_dir.display(),
            self.default_cooldown,
            self.staleness_window,
            self.sync_interval,
            describe_id(self.admin_user_id),
            describe_id(self.admin_role_id),
            describe_id(self.mod_log_channel_id),
        )
    }
}

fn describe_id(id: Option<u64>) -> String {
    id.map_or("-".to_string(), |id| id.to_string())
}

/// Default configuration values.
///
/// Used as fallbacks when environment variables are not provided.
impl Default for Config {
    fn default() -> Self {
        Self {
            // Discord (no defaults - must be provided)
            discord_token: String::new(),
            application_id: 0,
            guild_id: None,

            // Path defaults
            data_dir: "./data".into(),
            database_file: "videos.db".into(),
            snapshot_file: "video_data.json".into(),
            settings_file: "bot_settings.json".into(),

            // Selection defaults
            default_cooldown: 216_000,
            staleness_window: 129_600,
            sync_interval: 21_600,

            admin_user_id: None,
            admin_role_id: None,
            mod_log_channel_id: None,
        }
    }
}
