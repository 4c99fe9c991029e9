//! Key-value repository implementation

use crate::error::Result;
use crate::util::now_ms;
use libsql::{params, Connection};

/// Trait for raw key-value storage operations (async)
#[allow(async_fn_in_trait)]
pub trait KvRepository {
    /// Read the value stored under `key`, if any
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Insert or replace the value under `key`
    async fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Remove `key`; missing keys are not an error
    async fn delete(&self, key: &str) -> Result<()>;

    /// Write several entries in one transaction
    async fn set_many(&self, entries: &[(&str, Option<&str>)]) -> Result<()>;
}

/// libSQL implementation of `KvRepository`
pub struct LibSqlKvRepository<'a> {
    conn: &'a Connection,
}

impl<'a> LibSqlKvRepository<'a> {
    /// Create a new repository with the given connection
    pub const fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    async fn write(&self, key: &str, value: Option<&str>) -> Result<()> {
        match value {
            Some(value) => {
                self.conn
                    .execute(
                        "INSERT OR REPLACE INTO kv_store (key, value, updated_at) VALUES (?, ?, ?)",
                        params![key, value, now_ms()],
                    )
                    .await?;
            }
            None => {
                self.conn
                    .execute("DELETE FROM kv_store WHERE key = ?", params![key])
                    .await?;
            }
        }
        Ok(())
    }
}

impl KvRepository for LibSqlKvRepository<'_> {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut rows = self
            .conn
            .query("SELECT value FROM kv_store WHERE key = ?", params![key])
            .await?;

        if let Some(row) = rows.next().await? {
            Ok(Some(row.get::<String>(0)?))
        } else {
            Ok(None)
        }
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.write(key, Some(value)).await
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.write(key, None).await
    }

    async fn set_many(&self, entries: &[(&str, Option<&str>)]) -> Result<()> {
        self.conn.execute("BEGIN TRANSACTION", ()).await?;

        for (key, value) in entries {
            if let Err(e) = self.write(key, *value).await {
                self.conn.execute("ROLLBACK", ()).await.ok();
                return Err(e);
            }
        }

        if let Err(e) = self.conn.execute("COMMIT", ()).await {
            self.conn.execute("ROLLBACK", ()).await.ok();
            return Err(e.into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;

    async fn setup() -> Database {
        Database::open_in_memory().await.unwrap()
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_get_missing_key() {
        let db = setup().await;
        let repo = LibSqlKvRepository::new(db.connection());

        assert_eq!(repo.get("activeGame").await.unwrap(), None);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_set_overwrites_and_delete_removes() {
        let db = setup().await;
        let repo = LibSqlKvRepository::new(db.connection());

        repo.set("versionstamp", "3").await.unwrap();
        repo.set("versionstamp", "4").await.unwrap();
        assert_eq!(repo.get("versionstamp").await.unwrap().as_deref(), Some("4"));

        repo.delete("versionstamp").await.unwrap();
        repo.delete("versionstamp").await.unwrap();
        assert_eq!(repo.get("versionstamp").await.unwrap(), None);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_set_many_writes_and_deletes() {
        let db = setup().await;
        let repo = LibSqlKvRepository::new(db.connection());
        repo.set("api_key", "secret").await.unwrap();

        repo.set_many(&[("activeGame", Some("null")), ("api_key", None)])
            .await
            .unwrap();

        assert_eq!(repo.get("activeGame").await.unwrap().as_deref(), Some("null"));
        assert_eq!(repo.get("api_key").await.unwrap(), None);
    }
}
