use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

// ---------------------------------------------------------------------------
// FileConfig: TOML on disk, no secrets
// ---------------------------------------------------------------------------

/// TOML-backed configuration loaded from disk.
/// Secrets (API keys) stay as env vars, see [`AppConfig`].
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub video: VideoConfig,
    #[serde(default)]
    pub collection: CollectionConfig,
    pub classification: ClassificationConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub stats: StatsConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VideoConfig {
    /// Watch URL, short link, or bare video id.
    pub url: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CollectionConfig {
    /// Stop paging once this many comments are fetched. Unset fetches all.
    pub max_comments: Option<usize>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClassificationConfig {
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Prompt template file, relative to the config file.
    pub prompt: PathBuf,
    pub app_name: Option<String>,
    pub site_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    /// Tag appended to store file names, e.g. `2026-02-14`.
    pub target_date: Option<String>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            target_date: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StatsConfig {
    /// Hours east of UTC used for snapshot timestamps.
    #[serde(default = "default_utc_offset_hours")]
    pub utc_offset_hours: i32,
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self {
            utc_offset_hours: default_utc_offset_hours(),
        }
    }
}

fn default_model() -> String {
    "openai/gpt-4o-mini".to_string()
}

fn default_batch_size() -> usize {
    15
}

fn default_temperature() -> f32 {
    0.1
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

fn default_utc_offset_hours() -> i32 {
    9
}

/// Resolved locations of the two stores.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorePaths {
    pub comments: PathBuf,
    pub stats: PathBuf,
}

impl FileConfig {
    /// Parse TOML text and check value ranges.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: FileConfig = toml::from_str(content).context("Failed to parse config TOML")?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.video.url.trim().is_empty() {
            anyhow::bail!("video.url must not be empty");
        }
        if self.classification.batch_size == 0 {
            anyhow::bail!("classification.batch_size must be at least 1");
        }
        if !(-12..=14).contains(&self.stats.utc_offset_hours) {
            anyhow::bail!(
                "stats.utc_offset_hours out of range: {}",
                self.stats.utc_offset_hours
            );
        }
        Ok(())
    }

    /// Store file locations. A relative `data_dir` is resolved against `config_dir`.
    pub fn store_paths(&self, config_dir: &Path) -> StorePaths {
        let dir = config_dir.join(&self.storage.data_dir);
        let suffix = self
            .storage
            .target_date
            .as_deref()
            .map(|tag| format!("_{tag}"))
            .unwrap_or_default();
        StorePaths {
            comments: dir.join(format!("analyzed_comments{suffix}.csv")),
            stats: dir.join(format!("video_stats{suffix}.csv")),
        }
    }

    /// Prompt template location, resolved against `config_dir`.
    pub fn prompt_path(&self, config_dir: &Path) -> PathBuf {
        config_dir.join(&self.classification.prompt)
    }
}

/// Load and parse a TOML config file.
pub fn load_config(path: &Path) -> Result<FileConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    FileConfig::from_toml_str(&content)
        .with_context(|| format!("Invalid config file: {}", path.display()))
}

// ---------------------------------------------------------------------------
// AppConfig: secrets from the environment
// ---------------------------------------------------------------------------

/// Credentials for the two external services. Either may be absent: a missing
/// key degrades the affected call instead of failing startup.
#[derive(Clone, Default)]
pub struct AppConfig {
    pub openrouter_api_key: Option<String>,
    pub youtube_api_key: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let config = Self {
            openrouter_api_key: non_empty_env("OPENROUTER_API_KEY"),
            youtube_api_key: non_empty_env("YOUTUBE_API_KEY"),
        };

        config.log_keys();
        config
    }

    pub fn log_keys(&self) {
        tracing::info!("Config loaded:");
        tracing::info!("  OPENROUTER_API_KEY: {}", preview_opt(&self.openrouter_api_key));
        tracing::info!("  YOUTUBE_API_KEY: {}", preview_opt(&self.youtube_api_key));
        if self.openrouter_api_key.is_none() {
            tracing::warn!("OPENROUTER_API_KEY missing: new comments will be stored as error records");
        }
        if self.youtube_api_key.is_none() {
            tracing::warn!("YOUTUBE_API_KEY missing: comments and stats cannot be collected");
        }
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("openrouter_api_key", &preview_opt(&self.openrouter_api_key))
            .field("youtube_api_key", &preview_opt(&self.youtube_api_key))
            .finish()
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn preview(val: &str) -> String {
    let n = val.char_indices().nth(5).map(|(i, _)| i).unwrap_or(val.len());
    format!("{}...({} chars)", &val[..n], val.chars().count())
}

fn preview_opt(val: &Option<String>) -> String {
    match val {
        Some(v) if !v.is_empty() => preview(v),
        _ => "<not set>".to_string(),
    }
}
