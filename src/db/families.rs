use crate::db::models::{Book, Family, FamilyPatch, NewFamily};
use crate::db::sqlite::{Page, Storage, delete_row, row_exists};
use crate::error::BookswapError;

impl Storage {
    pub async fn list_families(&self, page: Page) -> Result<Vec<Family>, BookswapError> {
        let rows = sqlx::query_as::<_, Family>(
            "SELECT id, name, email FROM families ORDER BY id LIMIT ? OFFSET ?",
        )
        .bind(page.limit)
        .bind(page.skip)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn get_family(&self, id: i64) -> Result<Option<Family>, BookswapError> {
        let row = sqlx::query_as::<_, Family>("SELECT id, name, email FROM families WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    pub async fn family_exists(&self, id: i64) -> Result<bool, BookswapError> {
        row_exists(&self.pool, "families", id).await
    }

    pub async fn create_family(&self, new: &NewFamily) -> Result<Family, BookswapError> {
        let family = sqlx::query_as::<_, Family>(
            "INSERT INTO families (name, email) VALUES (?, ?) RETURNING id, name, email",
        )
        .bind(&new.name)
        .bind(&new.email)
        .fetch_one(&self.pool)
        .await?;
        Ok(family)
    }

    /// Returns `None` when the family does not exist.
    pub async fn update_family(
        &self,
        id: i64,
        patch: FamilyPatch,
    ) -> Result<Option<Family>, BookswapError> {
        let mut tx = self.begin_write().await?;
        let current =
            sqlx::query_as::<_, Family>("SELECT id, name, email FROM families WHERE id = ?")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;
        let Some(mut family) = current else {
            return Ok(None);
        };

        if let Some(name) = patch.name {
            family.name = name;
        }
        if let Some(email) = patch.email {
            family.email = email;
        }

        sqlx::query("UPDATE families SET name = ?, email = ? WHERE id = ?")
            .bind(&family.name)
            .bind(&family.email)
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(Some(family))
    }

    pub async fn delete_family(&self, id: i64) -> Result<bool, BookswapError> {
        delete_row(&self.pool, "families", id).await
    }

    pub async fn list_family_books(
        &self,
        family_id: i64,
        page: Page,
    ) -> Result<Vec<Book>, BookswapError> {
        let rows = sqlx::query_as::<_, Book>(
            r#"SELECT id, title, author, grade, isbn, owner_id, added_at
               FROM books WHERE owner_id = ? ORDER BY id LIMIT ? OFFSET ?"#,
        )
        .bind(family_id)
        .bind(page.limit)
        .bind(page.skip)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}
