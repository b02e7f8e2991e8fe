//! Persistence for the user's API key.
//!
//! A single setting named `apiKey` lives in a `settings(key, value)` table.
//! Read failures are logged and reported as "no key", so callers only ever
//! have to handle absence.
use anyhow::{Context as _, Result as AnyResult};
use async_trait::async_trait;
use precis_common::{Credential, PrecisError, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Row, SqlitePool};
use std::path::Path;
use tokio::sync::RwLock;

pub const API_KEY_SETTING: &str = "apiKey";

#[async_trait]
pub trait KeyStore: Send + Sync {
    /// The saved key, or `None` when absent or unreadable.
    async fn get(&self) -> Option<Credential>;

    /// Save `credential`, trimmed. Blank input is rejected and nothing is written.
    async fn set(&self, credential: Credential) -> Result<()>;

    /// Forget the saved key.
    async fn clear(&self) -> Result<()>;
}

fn normalized(credential: &Credential) -> Result<Credential> {
    let trimmed = credential.expose().trim();
    if trimmed.is_empty() {
        return Err(PrecisError::Configuration(
            "The API key must not be empty.".to_string(),
        ));
    }
    Ok(Credential::new(trimmed))
}

/// SQLite-backed key store.
#[derive(Clone)]
pub struct SqliteKeyStore {
    pool: SqlitePool,
}

impl SqliteKeyStore {
    /// Open (creating if needed) the database file at `path`.
    pub async fn open(path: &Path) -> AnyResult<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .with_context(|| format!("failed to open key store at {}", path.display()))?;
        tracing::debug!(path = %path.display(), "keystore.sqlite.open");
        Self::from_pool(pool).await
    }

    /// A private in-memory database. Contents vanish with the store.
    pub async fn in_memory() -> AnyResult<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;
        Self::from_pool(pool).await
    }

    pub async fn from_pool(pool: SqlitePool) -> AnyResult<Self> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS settings (
                key   TEXT PRIMARY KEY NOT NULL,
                value TEXT NOT NULL
            )",
        )
        .execute(&pool)
        .await
        .context("failed to create settings table")?;
        Ok(Self { pool })
    }
}

#[async_trait]
impl KeyStore for SqliteKeyStore {
    async fn get(&self) -> Option<Credential> {
        let row = sqlx::query("SELECT value FROM settings WHERE key = ?")
            .bind(API_KEY_SETTING)
            .fetch_optional(&self.pool)
            .await;
        match row {
            Ok(Some(row)) => match row.try_get::<String, _>("value") {
                Ok(value) if !value.trim().is_empty() => Some(Credential::new(value)),
                Ok(_) => None,
                Err(err) => {
                    tracing::warn!(error = ?err, "keystore.get.decode_failed");
                    None
                }
            },
            Ok(None) => None,
            Err(err) => {
                tracing::warn!(error = ?err, "keystore.get.failed");
                None
            }
        }
    }

    async fn set(&self, credential: Credential) -> Result<()> {
        let credential = normalized(&credential)?;
        sqlx::query(
            "INSERT INTO settings (key, value) VALUES (?, ?)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
        )
        .bind(API_KEY_SETTING)
        .bind(credential.expose())
        .execute(&self.pool)
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, "keystore.set.failed");
            PrecisError::Configuration(format!("Could not save the API key: {err}"))
        })?;
        tracing::info!("keystore.set");
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        sqlx::query("DELETE FROM settings WHERE key = ?")
            .bind(API_KEY_SETTING)
            .execute(&self.pool)
            .await
            .map_err(|err| {
                tracing::error!(error = ?err, "keystore.clear.failed");
                PrecisError::Configuration(format!("Could not clear the API key: {err}"))
            })?;
        tracing::info!("keystore.clear");
        Ok(())
    }
}

/// Process-local key store.
#[derive(Default)]
pub struct MemoryKeyStore {
    key: RwLock<Option<Credential>>,
}

impl MemoryKeyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store the way [`KeyStore::set`] would; a blank key leaves
    /// it empty.
    pub fn with_key(key: impl Into<String>) -> Self {
        Self {
            key: RwLock::new(normalized(&Credential::new(key)).ok()),
        }
    }
}

#[async_trait]
impl KeyStore for MemoryKeyStore {
    async fn get(&self) -> Option<Credential> {
        self.key.read().await.clone()
    }

    async fn set(&self, credential: Credential) -> Result<()> {
        let credential = normalized(&credential)?;
        *self.key.write().await = Some(credential);
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        *self.key.write().await = None;
        Ok(())
    }
}
