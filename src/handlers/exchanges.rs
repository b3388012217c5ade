use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use tracing::info;

use crate::db::Page;
use crate::db::models::{Exchange, ExchangeStatus, NewExchange};
use crate::error::BookswapError;
use crate::middleware::auth::CurrentUser;
use crate::middleware::extract::{ValidJson, ValidPath};
use crate::router::BookswapState;

#[derive(Debug, Deserialize)]
pub struct ExchangeUpdate {
    pub status: ExchangeStatus,
}

pub async fn list_exchanges(
    State(state): State<BookswapState>,
    _user: CurrentUser,
    page: Page,
) -> Result<Json<Vec<Exchange>>, BookswapError> {
    Ok(Json(state.storage.list_exchanges(page).await?))
}

pub async fn read_exchange(
    State(state): State<BookswapState>,
    _user: CurrentUser,
    ValidPath(id): ValidPath<i64>,
) -> Result<Json<Exchange>, BookswapError> {
    state
        .storage
        .get_exchange(id)
        .await?
        .map(Json)
        .ok_or(BookswapError::NotFound("Exchange"))
}

/// POST /exchanges -> proposes a swap; families and books must exist.
pub async fn create_exchange(
    State(state): State<BookswapState>,
    CurrentUser(user): CurrentUser,
    ValidJson(new): ValidJson<NewExchange>,
) -> Result<impl IntoResponse, BookswapError> {
    let exchange = state.storage.propose_exchange(&new).await?;
    info!(
        exchange_id = exchange.id,
        proposer = exchange.proposer_family_id,
        receiver = exchange.receiver_family_id,
        user_id = user.id,
        "exchange proposed"
    );
    Ok((StatusCode::CREATED, Json(exchange)))
}

/// PUT /exchanges/{id} -> answers a pending exchange (accepted or rejected).
pub async fn update_exchange(
    State(state): State<BookswapState>,
    _user: CurrentUser,
    ValidPath(id): ValidPath<i64>,
    ValidJson(update): ValidJson<ExchangeUpdate>,
) -> Result<Json<Exchange>, BookswapError> {
    let exchange = state
        .storage
        .update_exchange_status(id, update.status)
        .await?
        .ok_or(BookswapError::NotFound("Exchange"))?;
    info!(exchange_id = id, status = %exchange.status, "exchange updated");
    Ok(Json(exchange))
}

pub async fn delete_exchange(
    State(state): State<BookswapState>,
    _user: CurrentUser,
    ValidPath(id): ValidPath<i64>,
) -> Result<StatusCode, BookswapError> {
    if !state.storage.delete_exchange(id).await? {
        return Err(BookswapError::NotFound("Exchange"));
    }
    info!(exchange_id = id, "deleted exchange");
    Ok(StatusCode::NO_CONTENT)
}
