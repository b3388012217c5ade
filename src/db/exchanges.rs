use chrono::Utc;
use sqlx::SqliteExecutor;
use tracing::debug;

use crate::db::models::{Exchange, ExchangeStatus, NewExchange};
use crate::db::sqlite::{Page, Storage, delete_row, row_exists};
use crate::error::BookswapError;

const EXCHANGE_COLUMNS: &str = "id, proposer_family_id, receiver_family_id, offered_book_id, \
                                requested_book_id, status, created_at, updated_at";

impl Storage {
    pub async fn list_exchanges(&self, page: Page) -> Result<Vec<Exchange>, BookswapError> {
        let sql =
            format!("SELECT {EXCHANGE_COLUMNS} FROM exchanges ORDER BY id LIMIT ? OFFSET ?");
        let rows = sqlx::query_as::<_, Exchange>(&sql)
            .bind(page.limit)
            .bind(page.skip)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    pub async fn get_exchange(&self, id: i64) -> Result<Option<Exchange>, BookswapError> {
        fetch_exchange(&self.pool, id).await
    }

    /// Validate both families and both books, then insert a pending exchange.
    /// All lookups and the insert share one transaction; a failed check writes nothing.
    pub async fn propose_exchange(&self, new: &NewExchange) -> Result<Exchange, BookswapError> {
        let mut tx = self.begin_write().await?;

        if !row_exists(&mut *tx, "families", new.proposer_family_id).await?
            || !row_exists(&mut *tx, "families", new.receiver_family_id).await?
        {
            return Err(BookswapError::InvalidReference(
                "Invalid family ID(s).".to_string(),
            ));
        }
        if !row_exists(&mut *tx, "books", new.offered_book_id).await?
            || !row_exists(&mut *tx, "books", new.requested_book_id).await?
        {
            return Err(BookswapError::InvalidReference(
                "Invalid book ID(s).".to_string(),
            ));
        }

        let now = Utc::now();
        let sql = format!(
            "INSERT INTO exchanges (proposer_family_id, receiver_family_id, offered_book_id, \
             requested_book_id, status, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?) RETURNING {EXCHANGE_COLUMNS}"
        );
        let exchange = sqlx::query_as::<_, Exchange>(&sql)
            .bind(new.proposer_family_id)
            .bind(new.receiver_family_id)
            .bind(new.offered_book_id)
            .bind(new.requested_book_id)
            .bind(ExchangeStatus::Pending)
            .bind(now)
            .bind(now)
            .fetch_one(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(exchange)
    }

    /// Move an exchange to `status`, refusing anything but pending -> accepted/rejected.
    /// Returns `None` when the exchange does not exist.
    ///
    /// The status check and the write are one conditional `UPDATE`, so of two
    /// racing answers exactly one lands and the other sees the new status.
    pub async fn update_exchange_status(
        &self,
        id: i64,
        status: ExchangeStatus,
    ) -> Result<Option<Exchange>, BookswapError> {
        if ExchangeStatus::Pending.can_transition_to(status) {
            let sql = format!(
                "UPDATE exchanges SET status = ?, updated_at = ? \
                 WHERE id = ? AND status = ? RETURNING {EXCHANGE_COLUMNS}"
            );
            let updated = sqlx::query_as::<_, Exchange>(&sql)
                .bind(status)
                .bind(Utc::now())
                .bind(id)
                .bind(ExchangeStatus::Pending)
                .fetch_optional(&self.pool)
                .await?;
            if updated.is_some() {
                return Ok(updated);
            }
        }

        let Some(current) = fetch_exchange(&self.pool, id).await? else {
            return Ok(None);
        };
        debug!(exchange_id = id, from = %current.status, to = %status, "transition refused");
        Err(BookswapError::InvalidTransition {
            from: current.status,
            to: status,
        })
    }

    pub async fn delete_exchange(&self, id: i64) -> Result<bool, BookswapError> {
        delete_row(&self.pool, "exchanges", id).await
    }
}

async fn fetch_exchange<'e, E>(exec: E, id: i64) -> Result<Option<Exchange>, BookswapError>
where
    E: SqliteExecutor<'e>,
{
    let sql = format!("SELECT {EXCHANGE_COLUMNS} FROM exchanges WHERE id = ?");
    let row = sqlx::query_as::<_, Exchange>(&sql)
        .bind(id)
        .fetch_optional(exec)
        .await?;
    Ok(row)
}
