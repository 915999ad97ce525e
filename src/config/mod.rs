use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Top-level application configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub scraper: ScraperConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

/// Upstream service and politeness settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ScraperConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Parliamentary term, e.g. 9 → `/Sejm9.nsf/`
    #[serde(default = "default_term")]
    pub term: u32,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Mean of the randomized delay before each request. Std-dev is a third of it.
    #[serde(default = "default_mean_delay_secs")]
    pub mean_delay_secs: f64,

    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Id of the anchor carrying the obfuscated e-mail address.
    #[serde(default = "default_email_anchor_id")]
    pub email_anchor_id: String,
}

/// Record table location
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    #[serde(default = "default_table_path")]
    pub table_path: PathBuf,
}

// ── Defaults ─────────────────────────────────────────────────────────────────

fn default_base_url() -> String {
    "https://sejm.gov.pl".to_string()
}
fn default_term() -> u32 {
    9
}
fn default_timeout_secs() -> u64 {
    30
}
fn default_mean_delay_secs() -> f64 {
    2.0
}
fn default_max_attempts() -> u32 {
    5
}
fn default_user_agent() -> String {
    "sejm-scraper/0.1 (research project; member records)".to_string()
}
fn default_email_anchor_id() -> String {
    "view:_id1:_id2:facetMain:_id190:_id280".to_string()
}
fn default_table_path() -> PathBuf {
    PathBuf::from("data/mps.csv")
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            term: default_term(),
            timeout_secs: default_timeout_secs(),
            mean_delay_secs: default_mean_delay_secs(),
            max_attempts: default_max_attempts(),
            user_agent: default_user_agent(),
            email_anchor_id: default_email_anchor_id(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            table_path: default_table_path(),
        }
    }
}

// ── Loader ───────────────────────────────────────────────────────────────────

impl AppConfig {
    /// Load configuration from file + environment overrides
    pub fn load() -> Result<Self> {
        dotenv::dotenv().ok();

        let cfg = config::Config::builder()
            .add_source(
                config::File::with_name("config/default")
                    .required(false)
                    .format(config::FileFormat::Toml),
            )
            .add_source(
                config::File::with_name("config/local")
                    .required(false)
                    .format(config::FileFormat::Toml),
            )
            .add_source(config::Environment::with_prefix("SEJM").separator("__"))
            .build()
            .context("Failed to read configuration")?;

        let app_cfg: AppConfig = cfg
            .try_deserialize()
            .context("Invalid configuration")?;

        if app_cfg.scraper.max_attempts == 0 {
            anyhow::bail!("scraper.max_attempts must be at least 1");
        }
        Ok(app_cfg)
    }
}
