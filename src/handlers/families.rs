use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};
use tracing::info;

use crate::db::Page;
use crate::db::models::{Book, Family, FamilyPatch, NewFamily};
use crate::error::BookswapError;
use crate::middleware::auth::CurrentUser;
use crate::middleware::extract::{ValidJson, ValidPath};
use crate::router::BookswapState;

pub async fn list_families(
    State(state): State<BookswapState>,
    _user: CurrentUser,
    page: Page,
) -> Result<Json<Vec<Family>>, BookswapError> {
    Ok(Json(state.storage.list_families(page).await?))
}

pub async fn read_family(
    State(state): State<BookswapState>,
    _user: CurrentUser,
    ValidPath(id): ValidPath<i64>,
) -> Result<Json<Family>, BookswapError> {
    state
        .storage
        .get_family(id)
        .await?
        .map(Json)
        .ok_or(BookswapError::NotFound("Family"))
}

pub async fn create_family(
    State(state): State<BookswapState>,
    _user: CurrentUser,
    ValidJson(new): ValidJson<NewFamily>,
) -> Result<impl IntoResponse, BookswapError> {
    new.validate()?;
    let family = state.storage.create_family(&new).await?;
    info!(family_id = family.id, "created family");
    Ok((StatusCode::CREATED, Json(family)))
}

pub async fn update_family(
    State(state): State<BookswapState>,
    _user: CurrentUser,
    ValidPath(id): ValidPath<i64>,
    ValidJson(patch): ValidJson<FamilyPatch>,
) -> Result<Json<Family>, BookswapError> {
    patch.validate()?;
    state
        .storage
        .update_family(id, patch)
        .await?
        .map(Json)
        .ok_or(BookswapError::NotFound("Family"))
}

/// Refused with 400 while users, books or exchanges still reference the family.
pub async fn delete_family(
    State(state): State<BookswapState>,
    _user: CurrentUser,
    ValidPath(id): ValidPath<i64>,
) -> Result<StatusCode, BookswapError> {
    if !state.storage.delete_family(id).await? {
        return Err(BookswapError::NotFound("Family"));
    }
    info!(family_id = id, "deleted family");
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_family_books(
    State(state): State<BookswapState>,
    _user: CurrentUser,
    ValidPath(id): ValidPath<i64>,
    page: Page,
) -> Result<Json<Vec<Book>>, BookswapError> {
    if !state.storage.family_exists(id).await? {
        return Err(BookswapError::NotFound("Family"));
    }
    Ok(Json(state.storage.list_family_books(id, page).await?))
}
