use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite, SqliteExecutor, Transaction};
use tracing::info;

use crate::db::schema::SQLITE_INIT;
use crate::error::BookswapError;

pub type SqlitePool = Pool<Sqlite>;

/// Handle to the marketplace tables. Cheap to clone; shares one pool.
#[derive(Clone)]
pub struct Storage {
    pub(super) pool: SqlitePool,
}

/// Pagination window shared by every list operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub skip: i64,
    pub limit: i64,
}

impl Default for Page {
    fn default() -> Self {
        Self {
            skip: 0,
            limit: 100,
        }
    }
}

impl Storage {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Open (creating the file if missing) and initialize the schema.
    pub async fn connect(database_url: &str) -> Result<Self, BookswapError> {
        let connect_opts = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .foreign_keys(true);
        let pool = SqlitePoolOptions::new().connect_with(connect_opts).await?;
        let storage = Self::new(pool);
        storage.init_schema().await?;
        info!(database_url = %database_url, "database ready");
        Ok(storage)
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// `BEGIN IMMEDIATE`: takes the write lock up front, so a read-then-write
    /// transaction waits on `busy_timeout` instead of failing with `SQLITE_BUSY`.
    pub(super) async fn begin_write(
        &self,
    ) -> Result<Transaction<'static, Sqlite>, BookswapError> {
        Ok(self.pool.begin_with("BEGIN IMMEDIATE").await?)
    }

    /// Initialize the schema by executing the bundled DDL.
    pub async fn init_schema(&self) -> Result<(), BookswapError> {
        // sqlx::query runs one statement at a time
        for stmt in SQLITE_INIT.split(';') {
            let s = stmt.trim();
            if s.is_empty() {
                continue;
            }
            sqlx::query(s).execute(&self.pool).await?;
        }
        Ok(())
    }
}

pub(super) async fn row_exists<'e, E>(
    exec: E,
    table: &str,
    id: i64,
) -> Result<bool, BookswapError>
where
    E: SqliteExecutor<'e>,
{
    // callers only pass table-name literals
    let sql = format!("SELECT EXISTS(SELECT 1 FROM {table} WHERE id = ?)");
    let exists: i64 = sqlx::query_scalar(&sql).bind(id).fetch_one(exec).await?;
    Ok(exists != 0)
}

pub(super) async fn delete_row(
    pool: &SqlitePool,
    table: &str,
    id: i64,
) -> Result<bool, BookswapError> {
    let sql = format!("DELETE FROM {table} WHERE id = ?");
    let result = sqlx::query(&sql).bind(id).execute(pool).await?;
    Ok(result.rows_affected() > 0)
}
