//! SQLite-backed store.

use super::{CreateOutcome, StoreClient, StoreError};
use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{params, Connection, ErrorCode, OptionalExtension};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

const SCHEMA: &str = r#"
PRAGMA journal_mode = WAL;

CREATE TABLE IF NOT EXISTS entries (
    key TEXT PRIMARY KEY NOT NULL,
    value TEXT NOT NULL,
    created_at TEXT NOT NULL
);
"#;

/// How long SQLite waits on a locked database before reporting busy.
const BUSY_TIMEOUT: Duration = Duration::from_secs(2);

pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    pub async fn new(path: PathBuf) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                StoreError::Unavailable(format!("Failed to create store dir: {}", e))
            })?;
        }

        let db_path = path.clone();
        let conn = tokio::task::spawn_blocking(move || {
            let conn = Connection::open(&db_path).map_err(map_sqlite_error)?;
            conn.busy_timeout(BUSY_TIMEOUT).map_err(map_sqlite_error)?;
            conn.execute_batch(SCHEMA).map_err(map_sqlite_error)?;
            Ok::<_, StoreError>(conn)
        })
        .await
        .map_err(|e| StoreError::Unavailable(format!("Task join error: {}", e)))??;

        tracing::debug!("Opened SQLite store at {}", path.display());

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }
}

/// Lock contention is the SQLite flavour of a timeout; everything else means
/// the store cannot serve the request.
fn map_sqlite_error(err: rusqlite::Error) -> StoreError {
    match &err {
        rusqlite::Error::SqliteFailure(failure, _)
            if matches!(
                failure.code,
                ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked
            ) =>
        {
            StoreError::Timeout(err.to_string())
        }
        _ => StoreError::Unavailable(err.to_string()),
    }
}

fn map_join_error(err: tokio::task::JoinError) -> StoreError {
    StoreError::Unavailable(format!("Task join error: {}", err))
}

#[async_trait]
impl StoreClient for SqliteStore {
    async fn create_if_absent(
        &self,
        key: &str,
        value: String,
    ) -> Result<CreateOutcome, StoreError> {
        let conn = self.conn.clone();
        let key = key.to_string();

        tokio::task::spawn_blocking(move || {
            let conn = conn.blocking_lock();
            let inserted = conn
                .execute(
                    "INSERT INTO entries (key, value, created_at) VALUES (?1, ?2, ?3)
                     ON CONFLICT(key) DO NOTHING",
                    params![&key, &value, Utc::now().to_rfc3339()],
                )
                .map_err(map_sqlite_error)?;

            if inserted == 0 {
                Ok(CreateOutcome::AlreadyExists)
            } else {
                Ok(CreateOutcome::Created)
            }
        })
        .await
        .map_err(map_join_error)?
    }

    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let conn = self.conn.clone();
        let key = key.to_string();

        tokio::task::spawn_blocking(move || {
            let conn = conn.blocking_lock();
            conn.query_row(
                "SELECT value FROM entries WHERE key = ?1",
                params![&key],
                |row| row.get::<_, String>(0),
            )
            .optional()
            .map_err(map_sqlite_error)
        })
        .await
        .map_err(map_join_error)?
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>, StoreError> {
        let conn = self.conn.clone();
        let prefix = prefix.to_string();

        tokio::task::spawn_blocking(move || {
            let conn = conn.blocking_lock();
            // No ORDER BY: callers get whatever order the store yields.
            let mut stmt = conn
                .prepare("SELECT value FROM entries WHERE substr(key, 1, length(?1)) = ?1")
                .map_err(map_sqlite_error)?;

            let values = stmt
                .query_map(params![&prefix], |row| row.get::<_, String>(0))
                .map_err(map_sqlite_error)?
                .collect::<Result<Vec<_>, _>>()
                .map_err(map_sqlite_error)?;

            Ok(values)
        })
        .await
        .map_err(map_join_error)?
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn temp_store() -> (tempfile::TempDir, SqliteStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteStore::new(dir.path().join("nested").join("receptor.db"))
            .await
            .expect("Failed to open store");
        (dir, store)
    }

    #[tokio::test]
    async fn test_create_if_absent_is_exclusive() {
        let (_dir, store) = temp_store().await;

        let first = store
            .create_if_absent("/v1/task/a", "first".to_string())
            .await
            .unwrap();
        let second = store
            .create_if_absent("/v1/task/a", "second".to_string())
            .await
            .unwrap();

        assert_eq!(first, CreateOutcome::Created);
        assert_eq!(second, CreateOutcome::AlreadyExists);
        assert_eq!(
            store.get("/v1/task/a").await.unwrap().as_deref(),
            Some("first")
        );
    }

    async fn race_for_key(stores: Vec<Arc<SqliteStore>>, attempts: usize) -> (usize, usize) {
        let handles: Vec<_> = (0..attempts)
            .map(|i| {
                let store = Arc::clone(&stores[i % stores.len()]);
                tokio::spawn(async move {
                    store
                        .create_if_absent("/v1/task/contended", format!("writer-{}", i))
                        .await
                })
            })
            .collect();

        let mut created = 0;
        let mut existing = 0;
        for outcome in futures::future::join_all(handles).await {
            match outcome.unwrap().unwrap() {
                CreateOutcome::Created => created += 1,
                CreateOutcome::AlreadyExists => existing += 1,
            }
        }
        (created, existing)
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_create_has_single_winner() {
        let (_dir, store) = temp_store().await;

        let (created, existing) = race_for_key(vec![Arc::new(store)], 32).await;
        assert_eq!(created, 1);
        assert_eq!(existing, 31);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_create_across_connections_has_single_winner() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("receptor.db");
        let first = SqliteStore::new(path.clone()).await.unwrap();
        let second = SqliteStore::new(path).await.unwrap();

        let (created, existing) =
            race_for_key(vec![Arc::new(first), Arc::new(second)], 32).await;
        assert_eq!(created, 1);
        assert_eq!(existing, 31);
    }

    #[tokio::test]
    async fn test_get_missing_key() {
        let (_dir, store) = temp_store().await;
        assert!(store.get("/v1/task/missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_by_prefix() {
        let (_dir, store) = temp_store().await;
        for (key, value) in [("/v1/task/a", "a"), ("/v1/task/b", "b"), ("/v1/lrp/c", "c")] {
            store
                .create_if_absent(key, value.to_string())
                .await
                .unwrap();
        }

        let mut values = store.list("/v1/task/").await.unwrap();
        values.sort();
        assert_eq!(values, vec!["a".to_string(), "b".to_string()]);
    }

    #[tokio::test]
    async fn test_data_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("receptor.db");

        {
            let store = SqliteStore::new(path.clone()).await.unwrap();
            store
                .create_if_absent("/v1/task/a", "a".to_string())
                .await
                .unwrap();
        }

        let store = SqliteStore::new(path).await.unwrap();
        assert_eq!(
            store
                .create_if_absent("/v1/task/a", "again".to_string())
                .await
                .unwrap(),
            CreateOutcome::AlreadyExists
        );
    }
}
