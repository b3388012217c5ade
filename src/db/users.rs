use sqlx::SqliteExecutor;

use crate::db::models::{NewFamily, NewUser, User, UserChanges};
use crate::db::sqlite::{Page, Storage, delete_row, row_exists};
use crate::error::BookswapError;

const USER_COLUMNS: &str = "id, username, email, hashed_password, is_active, family_id";

impl Storage {
    pub async fn list_users(&self, page: Page) -> Result<Vec<User>, BookswapError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users ORDER BY id LIMIT ? OFFSET ?");
        let rows = sqlx::query_as::<_, User>(&sql)
            .bind(page.limit)
            .bind(page.skip)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    pub async fn get_user(&self, id: i64) -> Result<Option<User>, BookswapError> {
        fetch_user(&self.pool, id).await
    }

    pub async fn get_user_by_username(
        &self,
        username: &str,
    ) -> Result<Option<User>, BookswapError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE username = ?");
        let row = sqlx::query_as::<_, User>(&sql)
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    /// Name of the first unique field already used by another user, if any.
    pub async fn taken_user_field(
        &self,
        username: Option<&str>,
        email: Option<&str>,
        exclude_id: Option<i64>,
    ) -> Result<Option<&'static str>, BookswapError> {
        let exclude = exclude_id.unwrap_or(-1);
        if let Some(username) = username {
            let hit: Option<i64> =
                sqlx::query_scalar("SELECT id FROM users WHERE username = ? AND id != ?")
                    .bind(username)
                    .bind(exclude)
                    .fetch_optional(&self.pool)
                    .await?;
            if hit.is_some() {
                return Ok(Some("Username"));
            }
        }
        if let Some(email) = email {
            let hit: Option<i64> =
                sqlx::query_scalar("SELECT id FROM users WHERE email = ? AND id != ?")
                    .bind(email)
                    .bind(exclude)
                    .fetch_optional(&self.pool)
                    .await?;
            if hit.is_some() {
                return Ok(Some("Email"));
            }
        }
        Ok(None)
    }

    pub async fn create_user(&self, new: &NewUser) -> Result<User, BookswapError> {
        let mut tx = self.begin_write().await?;
        if !row_exists(&mut *tx, "families", new.family_id).await? {
            return Err(BookswapError::InvalidReference(
                "Invalid family ID.".to_string(),
            ));
        }
        let user = insert_user(&mut *tx, new).await?;
        tx.commit().await?;
        Ok(user)
    }

    /// Registration path: a fresh family plus its first user, atomically.
    pub async fn create_user_with_family(
        &self,
        family: &NewFamily,
        username: &str,
        email: &str,
        hashed_password: &str,
    ) -> Result<User, BookswapError> {
        let mut tx = self.begin_write().await?;
        let family_id: i64 =
            sqlx::query_scalar("INSERT INTO families (name, email) VALUES (?, ?) RETURNING id")
                .bind(&family.name)
                .bind(&family.email)
                .fetch_one(&mut *tx)
                .await?;
        let new = NewUser {
            username: username.to_string(),
            email: email.to_string(),
            hashed_password: hashed_password.to_string(),
            family_id,
        };
        let user = insert_user(&mut *tx, &new).await?;
        tx.commit().await?;
        Ok(user)
    }

    /// Returns `None` when the user does not exist.
    pub async fn update_user(
        &self,
        id: i64,
        changes: UserChanges,
    ) -> Result<Option<User>, BookswapError> {
        let mut tx = self.begin_write().await?;
        let Some(mut user) = fetch_user(&mut *tx, id).await? else {
            return Ok(None);
        };

        if let Some(family_id) = changes.family_id {
            if !row_exists(&mut *tx, "families", family_id).await? {
                return Err(BookswapError::InvalidReference(
                    "Invalid family ID.".to_string(),
                ));
            }
            user.family_id = family_id;
        }
        if let Some(username) = changes.username {
            user.username = username;
        }
        if let Some(email) = changes.email {
            user.email = email;
        }
        if let Some(hashed_password) = changes.hashed_password {
            user.hashed_password = hashed_password;
        }
        if let Some(is_active) = changes.is_active {
            user.is_active = is_active;
        }

        sqlx::query(
            r#"UPDATE users SET
                username = ?,
                email = ?,
                hashed_password = ?,
                is_active = ?,
                family_id = ?
              WHERE id = ?"#,
        )
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.hashed_password)
        .bind(user.is_active)
        .bind(user.family_id)
        .bind(id)
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(Some(user))
    }

    pub async fn delete_user(&self, id: i64) -> Result<bool, BookswapError> {
        delete_row(&self.pool, "users", id).await
    }
}

async fn fetch_user<'e, E>(exec: E, id: i64) -> Result<Option<User>, BookswapError>
where
    E: SqliteExecutor<'e>,
{
    let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?");
    let row = sqlx::query_as::<_, User>(&sql)
        .bind(id)
        .fetch_optional(exec)
        .await?;
    Ok(row)
}

async fn insert_user<'e, E>(exec: E, new: &NewUser) -> Result<User, BookswapError>
where
    E: SqliteExecutor<'e>,
{
    let sql = format!(
        "INSERT INTO users (username, email, hashed_password, is_active, family_id) \
         VALUES (?, ?, ?, 1, ?) RETURNING {USER_COLUMNS}"
    );
    let user = sqlx::query_as::<_, User>(&sql)
        .bind(&new.username)
        .bind(&new.email)
        .bind(&new.hashed_password)
        .bind(new.family_id)
        .fetch_one(exec)
        .await?;
    Ok(user)
}
