use async_trait::async_trait;
use jiff::Timestamp;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use sqlx::Row;
use std::path::Path;
use std::str::FromStr;
use waypoint_core::error::StorageError;
use waypoint_core::repository::{
    LinkRecord, LinkUpdate, NewLink, ReadRepository, Repository, Result,
};
use waypoint_core::shortcode::ShortCode;

/// SQLite implementation of the repository contract.
///
/// The whole service persists into a single database file; this is the
/// file the vault subsystem snapshots and restores. Timestamps are
/// stored as unix seconds.
#[derive(Debug, Clone)]
pub struct SqliteRepository {
    pool: SqlitePool,
}

impl SqliteRepository {
    /// Creates a repository from an existing SQLite connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Opens (creating if missing) the database file and bootstraps the schema.
    ///
    /// WAL journaling is enabled for better read concurrency under
    /// redirect traffic.
    pub async fn connect(path: impl AsRef<Path>) -> Result<Self> {
        let options = SqliteConnectOptions::new()
            .filename(path.as_ref())
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal);

        let pool = SqlitePool::connect_with(options)
            .await
            .map_err(map_sqlx_error)?;

        let repo = Self::new(pool);
        repo.init_schema().await?;
        Ok(repo)
    }

    /// Opens an in-memory database, used by tests.
    ///
    /// The pool is pinned to a single connection: every pooled
    /// connection would otherwise open its own empty `:memory:`
    /// database.
    pub async fn connect_in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")
            .map_err(map_sqlx_error)?;

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
            .map_err(map_sqlx_error)?;

        let repo = Self::new(pool);
        repo.init_schema().await?;
        Ok(repo)
    }

    /// Returns a reference to the underlying pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn init_schema(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS links (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                short_code TEXT UNIQUE NOT NULL,
                name TEXT NOT NULL,
                target_url TEXT NOT NULL,
                description TEXT,
                is_active INTEGER NOT NULL DEFAULT 1,
                created_at INTEGER NOT NULL,
                updated_at INTEGER NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_links_short_code ON links(short_code)")
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        sqlx::query("CREATE INDEX IF NOT EXISTS idx_links_created_at ON links(created_at)")
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        Ok(())
    }
}

fn now_unix_seconds() -> i64 {
    Timestamp::now().as_second()
}

fn parse_timestamp(seconds: i64) -> Result<Timestamp> {
    Timestamp::from_second(seconds).map_err(|e| {
        StorageError::InvalidData(format!("invalid timestamp '{}': {e}", seconds))
    })
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .is_some_and(sqlx::error::DatabaseError::is_unique_violation)
}

fn map_sqlx_error(err: sqlx::Error) -> StorageError {
    let message = err.to_string();

    match err {
        sqlx::Error::PoolTimedOut => StorageError::Timeout(message),
        sqlx::Error::PoolClosed | sqlx::Error::WorkerCrashed | sqlx::Error::Io(_) => {
            StorageError::Unavailable(message)
        }
        sqlx::Error::ColumnIndexOutOfBounds { .. }
        | sqlx::Error::ColumnNotFound(_)
        | sqlx::Error::ColumnDecode { .. }
        | sqlx::Error::TypeNotFound { .. }
        | sqlx::Error::Decode(_)
        | sqlx::Error::RowNotFound => StorageError::InvalidData(message),
        _ => StorageError::Query(message),
    }
}

fn row_to_record(row: &sqlx::sqlite::SqliteRow) -> Result<LinkRecord> {
    let short_code: String = row.try_get("short_code").map_err(map_sqlx_error)?;
    let name: String = row.try_get("name").map_err(map_sqlx_error)?;
    let target_url: String = row.try_get("target_url").map_err(map_sqlx_error)?;
    let description: Option<String> = row.try_get("description").map_err(map_sqlx_error)?;
    let is_active: i64 = row.try_get("is_active").map_err(map_sqlx_error)?;
    let created_at: i64 = row.try_get("created_at").map_err(map_sqlx_error)?;
    let updated_at: i64 = row.try_get("updated_at").map_err(map_sqlx_error)?;

    Ok(LinkRecord {
        short_code: ShortCode::new_unchecked(short_code),
        name,
        target_url,
        description,
        is_active: is_active != 0,
        created_at: parse_timestamp(created_at)?,
        updated_at: parse_timestamp(updated_at)?,
    })
}

#[async_trait]
impl ReadRepository for SqliteRepository {
    async fn get(&self, code: &ShortCode) -> Result<Option<LinkRecord>> {
        let row = sqlx::query(
            r#"
            SELECT short_code, name, target_url, description, is_active, created_at, updated_at
            FROM links
            WHERE short_code = ?
            LIMIT 1
            "#,
        )
        .bind(code.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        row.as_ref().map(row_to_record).transpose()
    }

    async fn exists(&self, code: &ShortCode) -> Result<bool> {
        let exists = sqlx::query(
            r#"
            SELECT 1
            FROM links
            WHERE short_code = ?
            LIMIT 1
            "#,
        )
        .bind(code.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?
        .is_some();

        Ok(exists)
    }
}

#[async_trait]
impl Repository for SqliteRepository {
    async fn insert(&self, link: NewLink) -> Result<LinkRecord> {
        let now = now_unix_seconds();

        let result = sqlx::query(
            r#"
            INSERT INTO links (short_code, name, target_url, description, is_active, created_at, updated_at)
            VALUES (?, ?, ?, ?, 1, ?, ?)
            "#,
        )
        .bind(link.short_code.as_str())
        .bind(&link.name)
        .bind(&link.target_url)
        .bind(&link.description)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => {}
            Err(err) if is_unique_violation(&err) => {
                return Err(StorageError::Conflict(link.short_code.to_string()))
            }
            Err(err) => return Err(map_sqlx_error(err)),
        }

        let created_at = parse_timestamp(now)?;
        Ok(LinkRecord {
            short_code: link.short_code,
            name: link.name,
            target_url: link.target_url,
            description: link.description,
            is_active: true,
            created_at,
            updated_at: created_at,
        })
    }

    async fn update(&self, code: &ShortCode, update: LinkUpdate) -> Result<Option<LinkRecord>> {
        let Some(current) = self.get(code).await? else {
            return Ok(None);
        };

        let name = update.name.unwrap_or(current.name);
        let target_url = update.target_url.unwrap_or(current.target_url);
        let description = update.description.unwrap_or(current.description);
        let is_active = update.is_active.unwrap_or(current.is_active);
        let now = now_unix_seconds();

        sqlx::query(
            r#"
            UPDATE links
            SET name = ?, target_url = ?, description = ?, is_active = ?, updated_at = ?
            WHERE short_code = ?
            "#,
        )
        .bind(&name)
        .bind(&target_url)
        .bind(&description)
        .bind(is_active as i64)
        .bind(now)
        .bind(code.as_str())
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(Some(LinkRecord {
            short_code: current.short_code,
            name,
            target_url,
            description,
            is_active,
            created_at: current.created_at,
            updated_at: parse_timestamp(now)?,
        }))
    }

    async fn delete(&self, code: &ShortCode) -> Result<bool> {
        let result = sqlx::query("DELETE FROM links WHERE short_code = ?")
            .bind(code.as_str())
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        Ok(result.rows_affected() > 0)
    }

    async fn list(&self) -> Result<Vec<LinkRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT short_code, name, target_url, description, is_active, created_at, updated_at
            FROM links
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        rows.iter().map(row_to_record).collect()
    }
}
