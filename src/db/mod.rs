use chrono::Utc;
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

use crate::error::{HarvestError, Result};

pub mod migrator;
pub mod repositories;

/// Identifier store: remembers which platform id a hashtag name resolved to.
///
/// One `Store` is one SQLite connection. Open it for the duration of a
/// hashtag fetch and [`close`](Self::close) it afterwards.
pub struct Store {
    conn: DatabaseConnection,
}

impl Store {
    /// Opens (creating if needed) the database at `db_url` and applies
    /// pending migrations.
    pub async fn open(db_url: &str) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        if !db_url.contains(":memory:") {
            let path_str = db_url.trim_start_matches("sqlite:");
            let path_str = path_str.split('?').next().unwrap_or(path_str);
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(HarvestError::filesystem(parent))?;
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str).map_err(HarvestError::filesystem(path_str))?;
                info!("Created hashtag database at {}", path_str);
            }
        }

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(1)
            .min_connections(1)
            .connect_timeout(Duration::from_secs(10))
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        debug!("Hashtag database ready: {}", db_url);

        Ok(Self { conn })
    }

    fn hashtag_repo(&self) -> repositories::hashtag::HashtagRepository {
        repositories::hashtag::HashtagRepository::new(self.conn.clone())
    }

    pub async fn lookup_hashtag_id(&self, name: &str) -> Result<Option<String>> {
        self.hashtag_repo().find_id(name).await
    }

    /// Records a freshly resolved id. Fails with
    /// [`HarvestError::DuplicateKey`] if the name or the id is already stored.
    pub async fn store_hashtag_id(&self, name: &str, hashtag_id: &str) -> Result<()> {
        self.hashtag_repo()
            .insert(name, hashtag_id, Utc::now())
            .await?;
        info!(name, hashtag_id, "Stored hashtag id");
        Ok(())
    }

    pub async fn close(self) -> Result<()> {
        self.conn.close().await?;
        info!("Closed hashtag database connection");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_db_url() -> (String, std::path::PathBuf) {
        let dir = std::env::temp_dir().join(format!("harvest-store-{}", uuid::Uuid::new_v4()));
        let path = dir.join("instagram.db");
        (format!("sqlite:{}", path.display()), dir)
    }

    #[tokio::test]
    async fn test_lookup_after_store() {
        let (url, dir) = temp_db_url();
        let store = Store::open(&url).await.unwrap();

        assert_eq!(store.lookup_hashtag_id("bluebottle").await.unwrap(), None);

        store
            .store_hashtag_id("bluebottle", "17843826142012701")
            .await
            .unwrap();

        assert_eq!(
            store.lookup_hashtag_id("bluebottle").await.unwrap(),
            Some("17843826142012701".to_string())
        );

        store.close().await.unwrap();
        std::fs::remove_dir_all(dir).ok();
    }

    #[tokio::test]
    async fn test_duplicate_name_is_rejected() {
        let (url, dir) = temp_db_url();
        let store = Store::open(&url).await.unwrap();

        store.store_hashtag_id("bluebottle", "1").await.unwrap();
        let err = store.store_hashtag_id("bluebottle", "2").await.unwrap_err();
        assert!(err.is_duplicate_key(), "unexpected error: {err}");

        let err = store.store_hashtag_id("coffee", "1").await.unwrap_err();
        assert!(err.is_duplicate_key(), "unexpected error: {err}");

        assert_eq!(
            store.lookup_hashtag_id("bluebottle").await.unwrap(),
            Some("1".to_string())
        );

        store.close().await.unwrap();
        std::fs::remove_dir_all(dir).ok();
    }

    #[tokio::test]
    async fn test_reopen_reuses_existing_file() {
        let (url, dir) = temp_db_url();

        let store = Store::open(&url).await.unwrap();
        store.store_hashtag_id("coffee", "17841562447105233").await.unwrap();
        store.close().await.unwrap();

        let store = Store::open(&url).await.unwrap();
        assert_eq!(
            store.lookup_hashtag_id("coffee").await.unwrap(),
            Some("17841562447105233".to_string())
        );
        store.close().await.unwrap();
        std::fs::remove_dir_all(dir).ok();
    }
}
