use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};
use tracing::info;

use crate::db::Page;
use crate::db::models::{Book, BookPatch, NewBook};
use crate::error::BookswapError;
use crate::middleware::auth::CurrentUser;
use crate::middleware::extract::{ValidJson, ValidPath};
use crate::router::BookswapState;

pub async fn list_books(
    State(state): State<BookswapState>,
    _user: CurrentUser,
    page: Page,
) -> Result<Json<Vec<Book>>, BookswapError> {
    Ok(Json(state.storage.list_books(page).await?))
}

pub async fn read_book(
    State(state): State<BookswapState>,
    _user: CurrentUser,
    ValidPath(id): ValidPath<i64>,
) -> Result<Json<Book>, BookswapError> {
    state
        .storage
        .get_book(id)
        .await?
        .map(Json)
        .ok_or(BookswapError::NotFound("Book"))
}

pub async fn create_book(
    State(state): State<BookswapState>,
    CurrentUser(user): CurrentUser,
    ValidJson(new): ValidJson<NewBook>,
) -> Result<impl IntoResponse, BookswapError> {
    new.validate()?;
    if let Some(isbn) = &new.isbn
        && state.storage.isbn_taken(isbn, None).await?
    {
        return Err(BookswapError::Conflict("ISBN already registered".to_string()));
    }

    let book = state.storage.create_book(&new).await?;
    info!(book_id = book.id, owner_id = book.owner_id, user_id = user.id, "created book");
    Ok((StatusCode::CREATED, Json(book)))
}

/// Partial update: only supplied fields change.
pub async fn update_book(
    State(state): State<BookswapState>,
    _user: CurrentUser,
    ValidPath(id): ValidPath<i64>,
    ValidJson(patch): ValidJson<BookPatch>,
) -> Result<Json<Book>, BookswapError> {
    if state.storage.get_book(id).await?.is_none() {
        return Err(BookswapError::NotFound("Book"));
    }
    patch.validate()?;
    if let Some(Some(isbn)) = &patch.isbn
        && state.storage.isbn_taken(isbn, Some(id)).await?
    {
        return Err(BookswapError::Conflict("ISBN already registered".to_string()));
    }

    state
        .storage
        .update_book(id, patch)
        .await?
        .map(Json)
        .ok_or(BookswapError::NotFound("Book"))
}

pub async fn delete_book(
    State(state): State<BookswapState>,
    _user: CurrentUser,
    ValidPath(id): ValidPath<i64>,
) -> Result<StatusCode, BookswapError> {
    if !state.storage.delete_book(id).await? {
        return Err(BookswapError::NotFound("Book"));
    }
    info!(book_id = id, "deleted book");
    Ok(StatusCode::NO_CONTENT)
}
