//! Store selection and connection parameters

use serde::Deserialize;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use urlsniffer_core::DEFAULT_MYSQL_PORT;

use crate::{MemoryRepository, MySqlRepository, SqliteRepository, StoreError, StoreResult, UrlRepository};

/// Which backend holds the `urls` table
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(tag = "driver", rename_all = "lowercase")]
pub enum StoreConfig {
    /// Non-durable, process-local
    #[default]
    Memory,
    /// SQLite database file
    Sqlite { path: PathBuf },
    /// MySQL server
    Mysql(MySqlSettings),
}

/// MySQL connection parameters
#[derive(Clone, Deserialize)]
pub struct MySqlSettings {
    #[serde(default = "default_host")]
    pub host: String,
    pub database: String,
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    DEFAULT_MYSQL_PORT
}

impl fmt::Debug for MySqlSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MySqlSettings")
            .field("host", &self.host)
            .field("database", &self.database)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("port", &self.port)
            .finish()
    }
}

/// Open the configured backend
pub async fn connect(config: &StoreConfig) -> StoreResult<Arc<dyn UrlRepository>> {
    let repo: Arc<dyn UrlRepository> = match config {
        StoreConfig::Memory => Arc::new(MemoryRepository::new()),
        StoreConfig::Sqlite { path } => Arc::new(SqliteRepository::open(path).await?),
        StoreConfig::Mysql(settings) => {
            if settings.database.is_empty() {
                return Err(StoreError::Config("mysql database name is empty".to_string()));
            }
            Arc::new(MySqlRepository::connect(settings).await?)
        }
    };

    info!("Connected to {} store", repo.name());
    Ok(repo)
}
