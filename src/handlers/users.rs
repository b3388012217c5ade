use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use tracing::info;

use crate::db::Page;
use crate::db::models::{
    NewFamily, NewUser, UserChanges, UserRead, require_email, require_non_blank,
};
use crate::error::BookswapError;
use crate::middleware::auth::CurrentUser;
use crate::middleware::extract::{ValidJson, ValidPath};
use crate::router::BookswapState;

#[derive(Debug, Deserialize)]
pub struct UserCreate {
    pub username: String,
    pub email: String,
    pub password: String,
    /// Join an existing family; without it a family named after the user is created.
    #[serde(default)]
    pub family_id: Option<i64>,
}

impl UserCreate {
    fn validate(&self) -> Result<(), BookswapError> {
        require_non_blank("username", &self.username)?;
        require_email(&self.email)?;
        require_non_blank("password", &self.password)
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct UserUpdate {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub is_active: Option<bool>,
    pub family_id: Option<i64>,
}

impl UserUpdate {
    fn validate(&self) -> Result<(), BookswapError> {
        if let Some(username) = &self.username {
            require_non_blank("username", username)?;
        }
        if let Some(email) = &self.email {
            require_email(email)?;
        }
        if let Some(password) = &self.password {
            require_non_blank("password", password)?;
        }
        Ok(())
    }
}

pub async fn list_users(
    State(state): State<BookswapState>,
    _user: CurrentUser,
    page: Page,
) -> Result<Json<Vec<UserRead>>, BookswapError> {
    let users = state.storage.list_users(page).await?;
    Ok(Json(users.into_iter().map(UserRead::from).collect()))
}

pub async fn read_user(
    State(state): State<BookswapState>,
    _user: CurrentUser,
    ValidPath(id): ValidPath<i64>,
) -> Result<Json<UserRead>, BookswapError> {
    state
        .storage
        .get_user(id)
        .await?
        .map(|u| Json(u.into()))
        .ok_or(BookswapError::NotFound("User"))
}

pub async fn create_user(
    State(state): State<BookswapState>,
    _user: CurrentUser,
    ValidJson(req): ValidJson<UserCreate>,
) -> Result<impl IntoResponse, BookswapError> {
    req.validate()?;
    if let Some(field) = state
        .storage
        .taken_user_field(Some(&req.username), Some(&req.email), None)
        .await?
    {
        return Err(BookswapError::Conflict(format!("{field} already registered")));
    }

    let hashed_password = state.passwords.hash_blocking(req.password).await?;
    let user = match req.family_id {
        Some(family_id) => {
            let new = NewUser {
                username: req.username,
                email: req.email,
                hashed_password,
                family_id,
            };
            state.storage.create_user(&new).await?
        }
        None => {
            let family = NewFamily {
                name: req.username.clone(),
                email: req.email.clone(),
            };
            state
                .storage
                .create_user_with_family(&family, &req.username, &req.email, &hashed_password)
                .await?
        }
    };

    info!(user_id = user.id, family_id = user.family_id, "created user");
    Ok((StatusCode::CREATED, Json(UserRead::from(user))))
}

/// Partial update; a supplied password is re-hashed before storage.
pub async fn update_user(
    State(state): State<BookswapState>,
    _user: CurrentUser,
    ValidPath(id): ValidPath<i64>,
    ValidJson(req): ValidJson<UserUpdate>,
) -> Result<Json<UserRead>, BookswapError> {
    if state.storage.get_user(id).await?.is_none() {
        return Err(BookswapError::NotFound("User"));
    }
    req.validate()?;
    if let Some(field) = state
        .storage
        .taken_user_field(req.username.as_deref(), req.email.as_deref(), Some(id))
        .await?
    {
        return Err(BookswapError::Conflict(format!("{field} already registered")));
    }

    let hashed_password = match req.password {
        Some(password) => Some(state.passwords.hash_blocking(password).await?),
        None => None,
    };
    let changes = UserChanges {
        username: req.username,
        email: req.email,
        hashed_password,
        is_active: req.is_active,
        family_id: req.family_id,
    };

    state
        .storage
        .update_user(id, changes)
        .await?
        .map(|u| Json(u.into()))
        .ok_or(BookswapError::NotFound("User"))
}

pub async fn delete_user(
    State(state): State<BookswapState>,
    _user: CurrentUser,
    ValidPath(id): ValidPath<i64>,
) -> Result<StatusCode, BookswapError> {
    if !state.storage.delete_user(id).await? {
        return Err(BookswapError::NotFound("User"));
    }
    info!(user_id = id, "deleted user");
    Ok(StatusCode::NO_CONTENT)
}
