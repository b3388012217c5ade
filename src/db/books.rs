use chrono::Utc;

use crate::db::models::{Book, BookPatch, NewBook};
use crate::db::sqlite::{Page, Storage, delete_row, row_exists};
use crate::error::BookswapError;

const BOOK_COLUMNS: &str = "id, title, author, grade, isbn, owner_id, added_at";

impl Storage {
    pub async fn list_books(&self, page: Page) -> Result<Vec<Book>, BookswapError> {
        let sql = format!("SELECT {BOOK_COLUMNS} FROM books ORDER BY id LIMIT ? OFFSET ?");
        let rows = sqlx::query_as::<_, Book>(&sql)
            .bind(page.limit)
            .bind(page.skip)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    pub async fn get_book(&self, id: i64) -> Result<Option<Book>, BookswapError> {
        let sql = format!("SELECT {BOOK_COLUMNS} FROM books WHERE id = ?");
        let row = sqlx::query_as::<_, Book>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    pub async fn isbn_taken(
        &self,
        isbn: &str,
        exclude_id: Option<i64>,
    ) -> Result<bool, BookswapError> {
        let hit: Option<i64> =
            sqlx::query_scalar("SELECT id FROM books WHERE isbn = ? AND id != ?")
                .bind(isbn)
                .bind(exclude_id.unwrap_or(-1))
                .fetch_optional(&self.pool)
                .await?;
        Ok(hit.is_some())
    }

    pub async fn create_book(&self, new: &NewBook) -> Result<Book, BookswapError> {
        let mut tx = self.begin_write().await?;
        if !row_exists(&mut *tx, "families", new.owner_id).await? {
            return Err(BookswapError::InvalidReference(
                "Invalid owner ID.".to_string(),
            ));
        }
        let sql = format!(
            "INSERT INTO books (title, author, grade, isbn, owner_id, added_at) \
             VALUES (?, ?, ?, ?, ?, ?) RETURNING {BOOK_COLUMNS}"
        );
        let book = sqlx::query_as::<_, Book>(&sql)
            .bind(&new.title)
            .bind(&new.author)
            .bind(new.grade)
            .bind(&new.isbn)
            .bind(new.owner_id)
            .bind(Utc::now())
            .fetch_one(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(book)
    }

    /// Returns `None` when the book does not exist.
    pub async fn update_book(
        &self,
        id: i64,
        patch: BookPatch,
    ) -> Result<Option<Book>, BookswapError> {
        let mut tx = self.begin_write().await?;
        let sql = format!("SELECT {BOOK_COLUMNS} FROM books WHERE id = ?");
        let Some(mut book) = sqlx::query_as::<_, Book>(&sql)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
        else {
            return Ok(None);
        };

        if let Some(owner_id) = patch.owner_id
            && !row_exists(&mut *tx, "families", owner_id).await?
        {
            return Err(BookswapError::InvalidReference(
                "Invalid owner ID.".to_string(),
            ));
        }
        patch.apply(&mut book);

        sqlx::query(
            r#"UPDATE books SET
                title = ?,
                author = ?,
                grade = ?,
                isbn = ?,
                owner_id = ?
              WHERE id = ?"#,
        )
        .bind(&book.title)
        .bind(&book.author)
        .bind(book.grade)
        .bind(&book.isbn)
        .bind(book.owner_id)
        .bind(id)
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(Some(book))
    }

    pub async fn delete_book(&self, id: i64) -> Result<bool, BookswapError> {
        delete_row(&self.pool, "books", id).await
    }
}
