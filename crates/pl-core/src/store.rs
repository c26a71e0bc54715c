//! On-disk credential store
//!
//! A single SQLite database holding zero or one [`DeviceIdentity`]. The
//! session lifecycle only ever asks "is there an identity?"; writes come
//! from the protocol engine as a side effect of pairing and reconnecting,
//! and from an explicit logout.

use std::path::{Path, PathBuf};

use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteSynchronous,
};

use crate::error::StoreError;
use crate::types::{DeviceId, DeviceIdentity, SessionMaterial};

/// The `slot = 0` check keeps the table to one row.
const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS device (
    slot INTEGER PRIMARY KEY CHECK (slot = 0),
    device_id TEXT NOT NULL,
    material BLOB NOT NULL,
    paired_at INTEGER NOT NULL
)";

/// Handle to the credential database. Cheap to clone.
#[derive(Clone, Debug)]
pub struct CredentialStore {
    pool: SqlitePool,
    path: PathBuf,
}

impl CredentialStore {
    /// Open (creating if needed) the database `file_name` inside `dir`.
    ///
    /// The directory is created first; any failure to create it or to
    /// open and initialize the database is reported as unavailable storage.
    pub async fn open(dir: &Path, file_name: &str) -> Result<Self, StoreError> {
        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|source| StoreError::CreateDir {
                path: dir.to_path_buf(),
                source,
            })?;

        let path = dir.join(file_name);
        let options = SqliteConnectOptions::new()
            .filename(&path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .foreign_keys(true);

        // One writer per run; concurrent runs on the same directory are unsupported.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .map_err(|source| StoreError::Open {
                path: path.clone(),
                source,
            })?;

        sqlx::query(SCHEMA)
            .execute(&pool)
            .await
            .map_err(|source| StoreError::Open {
                path: path.clone(),
                source,
            })?;

        tracing::debug!("Credential store open at {:?}", path);
        Ok(Self { pool, path })
    }

    /// Path of the database file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the resident identity, if any
    pub async fn load(&self) -> Result<Option<DeviceIdentity>, StoreError> {
        let row: Option<(String, Vec<u8>, i64)> =
            sqlx::query_as("SELECT device_id, material, paired_at FROM device WHERE slot = 0")
                .fetch_optional(&self.pool)
                .await?;

        let Some((device_id, material, paired_at)) = row else {
            return Ok(None);
        };

        let id = DeviceId::parse(device_id)
            .ok_or_else(|| StoreError::Corrupt("empty device id".to_string()))?;
        let paired_at = u64::try_from(paired_at)
            .map_err(|_| StoreError::Corrupt(format!("negative pairing time {}", paired_at)))?;

        Ok(Some(DeviceIdentity::new(
            id,
            SessionMaterial::new(material),
            paired_at,
        )))
    }

    /// Store `identity`, replacing whatever identity was resident
    pub async fn save(&self, identity: &DeviceIdentity) -> Result<(), StoreError> {
        let paired_at = i64::try_from(identity.paired_at_ms).map_err(|_| {
            StoreError::Corrupt(format!("pairing time {} out of range", identity.paired_at_ms))
        })?;

        sqlx::query(
            "INSERT INTO device (slot, device_id, material, paired_at) VALUES (0, ?1, ?2, ?3)
             ON CONFLICT(slot) DO UPDATE SET
                device_id = excluded.device_id,
                material = excluded.material,
                paired_at = excluded.paired_at",
        )
        .bind(identity.id.as_str())
        .bind(identity.material.as_bytes())
        .bind(paired_at)
        .execute(&self.pool)
        .await?;

        tracing::info!("Stored device identity {}", identity.id);
        Ok(())
    }

    /// Replace the session material of the resident identity.
    ///
    /// Returns `false` when there is no identity to update.
    pub async fn update_material(&self, material: &SessionMaterial) -> Result<bool, StoreError> {
        let result = sqlx::query("UPDATE device SET material = ?1 WHERE slot = 0")
            .bind(material.as_bytes())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Remove the resident identity
    pub async fn clear(&self) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM device").execute(&self.pool).await?;
        tracing::info!("Cleared device identity");
        Ok(())
    }

    /// Close the underlying pool, flushing the WAL
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn identity(id: &str, material: &[u8]) -> DeviceIdentity {
        DeviceIdentity::new(
            DeviceId::parse(id).unwrap(),
            SessionMaterial::new(material.to_vec()),
            1_700_000_000_000,
        )
    }

    #[tokio::test]
    async fn test_open_creates_directory() {
        let dir = TempDir::new().unwrap();
        let session_dir = dir.path().join("nested").join("session");

        let store = CredentialStore::open(&session_dir, "session.db").await.unwrap();

        assert!(session_dir.is_dir());
        assert!(store.path().exists());
        assert!(store.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_open_unavailable_location() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, b"not a directory").unwrap();

        let result = CredentialStore::open(&blocker.join("session"), "session.db").await;
        assert!(matches!(result, Err(StoreError::CreateDir { .. })));
    }

    #[tokio::test]
    async fn test_save_replaces_resident_identity() {
        let dir = TempDir::new().unwrap();
        let store = CredentialStore::open(dir.path(), "session.db").await.unwrap();

        store.save(&identity("first@s.whatsapp.net", b"one")).await.unwrap();
        store.save(&identity("second@s.whatsapp.net", b"two")).await.unwrap();

        let loaded = store.load().await.unwrap().unwrap();
        assert_eq!(loaded, identity("second@s.whatsapp.net", b"two"));
    }

    #[tokio::test]
    async fn test_identity_survives_reopen() {
        let dir = TempDir::new().unwrap();
        {
            let store = CredentialStore::open(dir.path(), "session.db").await.unwrap();
            store.save(&identity("628@s.whatsapp.net", b"keys")).await.unwrap();
            store.close().await;
        }

        let store = CredentialStore::open(dir.path(), "session.db").await.unwrap();
        assert_eq!(
            store.load().await.unwrap(),
            Some(identity("628@s.whatsapp.net", b"keys"))
        );
    }

    #[tokio::test]
    async fn test_update_material() {
        let dir = TempDir::new().unwrap();
        let store = CredentialStore::open(dir.path(), "session.db").await.unwrap();

        let rotated = SessionMaterial::new(b"rotated".to_vec());
        assert!(!store.update_material(&rotated).await.unwrap());

        store.save(&identity("628@s.whatsapp.net", b"keys")).await.unwrap();
        assert!(store.update_material(&rotated).await.unwrap());
        assert_eq!(store.load().await.unwrap().unwrap().material, rotated);
    }

    #[tokio::test]
    async fn test_pairing_time_out_of_range() {
        let dir = TempDir::new().unwrap();
        let store = CredentialStore::open(dir.path(), "session.db").await.unwrap();

        let far_future = DeviceIdentity::new(
            DeviceId::parse("628@s.whatsapp.net").unwrap(),
            SessionMaterial::new(b"keys".to_vec()),
            u64::MAX,
        );
        assert!(matches!(
            store.save(&far_future).await,
            Err(StoreError::Corrupt(_))
        ));
        assert!(store.load().await.unwrap().is_none());

        sqlx::query("INSERT INTO device (slot, device_id, material, paired_at) VALUES (0, 'x', x'00', -5)")
            .execute(&store.pool)
            .await
            .unwrap();
        assert!(matches!(store.load().await, Err(StoreError::Corrupt(_))));
    }

    #[tokio::test]
    async fn test_clear() {
        let dir = TempDir::new().unwrap();
        let store = CredentialStore::open(dir.path(), "session.db").await.unwrap();

        store.save(&identity("628@s.whatsapp.net", b"keys")).await.unwrap();
        store.clear().await.unwrap();
        assert!(store.load().await.unwrap().is_none());

        // clearing an empty store is fine
        store.clear().await.unwrap();
    }
}
