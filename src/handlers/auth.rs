use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::db::models::{NewFamily, UserRead, require_email, require_non_blank};
use crate::error::BookswapError;
use crate::middleware::auth::{CurrentUser, ensure_active};
use crate::middleware::extract::{ValidForm, ValidJson};
use crate::router::BookswapState;

/// OAuth2 password-grant style form. Extra fields (`grant_type`, `scope`) are ignored.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    /// Defaults to the username.
    #[serde(default)]
    pub family_name: Option<String>,
}

impl RegisterRequest {
    fn validate(&self) -> Result<(), BookswapError> {
        require_non_blank("username", &self.username)?;
        require_email(&self.email)?;
        require_non_blank("password", &self.password)?;
        if let Some(name) = &self.family_name {
            require_non_blank("family_name", name)?;
        }
        Ok(())
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterResponse {
    pub access_token: String,
    pub token_type: String,
    pub family_id: i64,
}

/// POST /auth/token -> exchanges username & password for a bearer token.
pub async fn login_for_access_token(
    State(state): State<BookswapState>,
    ValidForm(form): ValidForm<LoginForm>,
) -> Result<Json<TokenResponse>, BookswapError> {
    let user = state.storage.get_user_by_username(&form.username).await?;
    let matches = state
        .passwords
        .check_login_blocking(form.password, user.as_ref().map(|u| u.hashed_password.clone()))
        .await?;
    let user = match user {
        Some(user) if matches => user,
        Some(user) => {
            warn!(username = %user.username, "failed login attempt");
            return Err(BookswapError::InvalidCredentials);
        }
        None => {
            warn!(username = %form.username, "login for unknown user");
            return Err(BookswapError::InvalidCredentials);
        }
    };
    ensure_active(&user)?;

    let access_token = state
        .tokens
        .issue_now(&user.username)
        .map_err(BookswapError::TokenIssue)?;
    info!(user_id = user.id, "login succeeded");
    Ok(Json(TokenResponse {
        access_token,
        token_type: "bearer".to_string(),
    }))
}

/// POST /auth/register -> creates a family and its first user, then logs them in.
pub async fn register(
    State(state): State<BookswapState>,
    ValidJson(req): ValidJson<RegisterRequest>,
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
    let family = NewFamily {
        name: req.family_name.unwrap_or_else(|| req.username.clone()),
        email: req.email.clone(),
    };
    let user = state
        .storage
        .create_user_with_family(&family, &req.username, &req.email, &hashed_password)
        .await?;

    let access_token = state
        .tokens
        .issue_now(&user.username)
        .map_err(BookswapError::TokenIssue)?;
    info!(user_id = user.id, family_id = user.family_id, "registered user");
    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            access_token,
            token_type: "bearer".to_string(),
            family_id: user.family_id,
        }),
    ))
}

/// GET /auth/me -> the user behind the bearer token.
pub async fn me(CurrentUser(user): CurrentUser) -> Json<UserRead> {
    Json(user.into())
}
