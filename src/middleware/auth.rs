use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum_extra::TypedHeader;
use headers::{Authorization, authorization::Bearer};
use tracing::debug;

use crate::db::models::User;
use crate::error::BookswapError;
use crate::router::BookswapState;

/// The authenticated, active user behind the request's bearer token.
///
/// Rejects with 401 when the `Authorization: Bearer` header is missing or
/// malformed, the token fails verification, or its subject no longer exists.
/// Rejects with 403 when the account is inactive.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

impl FromRequestParts<BookswapState> for CurrentUser {
    type Rejection = BookswapError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &BookswapState,
    ) -> Result<Self, Self::Rejection> {
        let TypedHeader(auth) =
            TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
                .await
                .map_err(|_| BookswapError::Unauthorized)?;

        let claims = state
            .tokens
            .verify_now(auth.token())
            .inspect_err(|e| debug!(error = %e, "bearer token rejected"))?;

        let user = state
            .storage
            .get_user_by_username(&claims.sub)
            .await?
            .ok_or(BookswapError::Unauthorized)?;

        ensure_active(&user)?;
        Ok(Self(user))
    }
}

pub fn ensure_active(user: &User) -> Result<(), BookswapError> {
    if !user.is_active {
        return Err(BookswapError::InactiveUser);
    }
    Ok(())
}
