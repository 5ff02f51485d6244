use std::path::{Path, PathBuf};

use iroh::SecretKey;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::fs;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

static DATA_DIR_NAME: &str = "trylog";
static TRYLOG_DB_NAME: &str = "trylog_db.sqlite";
static STORAGE_DIR_NAME: &str = "storage";
static CONFIG_FILE_NAME: &str = "config.json";
static DATA_DIR_ENV: &str = "TRYLOG_DATA_DIR";
static DEFAULT_PUBLIC_BASE_URL: &str = "http://localhost:54321";

// data_dir_path
// |- trylog
//    |- trylog_db.sqlite
//    |- config.json
//    |- storage
//       |- post-images
//       |- users-icon

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no data directory available on this platform; set {DATA_DIR_ENV}")]
    NoDataDir,
    #[error("config io failed")]
    Io(#[from] std::io::Error),
    #[error("config file is not valid json")]
    Json(#[from] serde_json::Error),
}

fn default_secret_key() -> SecretKey {
    SecretKey::generate(&mut rand::rng())
}

fn default_public_base_url() -> String {
    DEFAULT_PUBLIC_BASE_URL.to_string()
}

#[derive(Serialize, Deserialize, Debug)]
pub struct TryLogConfig {
    /// Secret key for the store node that serves RPC.
    #[serde(default = "default_secret_key")]
    pub(crate) secret_key: SecretKey,

    /// Secret key for the client endpoint (separate from the node secret).
    #[serde(default = "default_secret_key")]
    pub(crate) client_secret_key: SecretKey,

    pub(crate) database_path: PathBuf,

    /// Root directory of the object storage buckets.
    pub(crate) storage_dir: PathBuf,

    /// Prefix of every public object URL handed out by storage.
    #[serde(default = "default_public_base_url")]
    pub(crate) public_base_url: String,
}

impl TryLogConfig {
    /// Creates a config with fresh secret keys rooted at `data_dir`.
    fn new(data_dir: &Path) -> Self {
        TryLogConfig {
            secret_key: default_secret_key(),
            client_secret_key: default_secret_key(),
            database_path: data_dir.join(TRYLOG_DB_NAME),
            storage_dir: data_dir.join(STORAGE_DIR_NAME),
            public_base_url: default_public_base_url(),
        }
    }

    pub fn database_path(&self) -> &Path {
        &self.database_path
    }

    pub fn storage_dir(&self) -> &Path {
        &self.storage_dir
    }

    pub fn public_base_url(&self) -> &str {
        &self.public_base_url
    }
}

fn data_dir() -> Result<PathBuf, ConfigError> {
    if let Some(dir) = std::env::var_os(DATA_DIR_ENV) {
        return Ok(PathBuf::from(dir));
    }

    dirs::data_dir()
        .map(|dir| dir.join(DATA_DIR_NAME))
        .ok_or(ConfigError::NoDataDir)
}

/// Gets the existing config or initializes a new one if it doesn't exist
pub async fn get_or_init() -> Result<TryLogConfig, ConfigError> {
    load_or_create(&data_dir()?).await
}

/// Reads `config.json` under `trylog_dir`, writing a fresh one on first run.
pub async fn load_or_create(trylog_dir: &Path) -> Result<TryLogConfig, ConfigError> {
    let config_path = trylog_dir.join(CONFIG_FILE_NAME);

    fs::create_dir_all(trylog_dir).await?;

    if fs::try_exists(&config_path).await? {
        let mut file = fs::File::open(&config_path).await?;
        let mut contents = String::new();
        file.read_to_string(&mut contents).await?;

        let config: TryLogConfig = serde_json::from_str(&contents)?;
        tracing::debug!(path = %config_path.display(), "loaded config");
        Ok(config)
    } else {
        let config = TryLogConfig::new(trylog_dir);

        let json = serde_json::to_string_pretty(&config)?;
        let mut file = fs::File::create(&config_path).await?;
        file.write_all(json.as_bytes()).await?;

        tracing::info!(path = %config_path.display(), "created config");
        Ok(config)
    }
}
