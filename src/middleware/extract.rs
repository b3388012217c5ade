use axum::{
    Form, Json,
    extract::{FromRequest, FromRequestParts, Path, Query, Request},
    http::request::Parts,
};
use serde::de::DeserializeOwned;

use crate::db::Page;
use crate::error::BookswapError;

/// `Json<T>` whose rejections become structured 400 validation errors.
pub struct ValidJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = BookswapError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(BookswapError::Validation(rejection.body_text())),
        }
    }
}

/// `Form<T>` with the same rejection handling as [`ValidJson`].
pub struct ValidForm<T>(pub T);

impl<T, S> FromRequest<S> for ValidForm<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = BookswapError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Form::<T>::from_request(req, state).await {
            Ok(Form(value)) => Ok(Self(value)),
            Err(rejection) => Err(BookswapError::Validation(rejection.body_text())),
        }
    }
}

/// `Path<T>` whose rejections (e.g. `/books/abc`) become structured 400 validation errors.
pub struct ValidPath<T>(pub T);

impl<T, S> FromRequestParts<S> for ValidPath<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = BookswapError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Path::<T>::from_request_parts(parts, state).await {
            Ok(Path(value)) => Ok(Self(value)),
            Err(rejection) => Err(BookswapError::Validation(rejection.body_text())),
        }
    }
}

/// `?skip=&limit=` query parameters. `offset` is accepted as an alias of `skip`.
#[derive(Debug, Clone, Copy, serde::Deserialize)]
pub struct Pagination {
    #[serde(default, alias = "offset")]
    pub skip: Option<u32>,
    #[serde(default)]
    pub limit: Option<u32>,
}

impl From<Pagination> for Page {
    fn from(p: Pagination) -> Self {
        let default = Page::default();
        Page {
            skip: p.skip.map(i64::from).unwrap_or(default.skip),
            limit: p.limit.map(i64::from).unwrap_or(default.limit),
        }
    }
}

impl<S> FromRequestParts<S> for Page
where
    S: Send + Sync,
{
    type Rejection = BookswapError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Query::<Pagination>::from_request_parts(parts, state).await {
            Ok(Query(p)) => Ok(p.into()),
            Err(rejection) => Err(BookswapError::Validation(rejection.body_text())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request as HttpRequest;

    async fn page_for(uri: &str) -> Result<Page, BookswapError> {
        let (mut parts, _) = HttpRequest::builder()
            .uri(uri)
            .body(())
            .expect("request")
            .into_parts();
        Page::from_request_parts(&mut parts, &()).await
    }

    #[tokio::test]
    async fn pagination_defaults_to_first_hundred() {
        let page = page_for("/books").await.expect("page");
        assert_eq!(page, Page { skip: 0, limit: 100 });
    }

    #[tokio::test]
    async fn offset_is_an_alias_for_skip() {
        let page = page_for("/books?offset=5&limit=2").await.expect("page");
        assert_eq!(page, Page { skip: 5, limit: 2 });
        let page = page_for("/books?skip=7").await.expect("page");
        assert_eq!(page, Page { skip: 7, limit: 100 });
    }

    #[tokio::test]
    async fn negative_values_are_rejected() {
        assert!(matches!(
            page_for("/books?limit=-1").await,
            Err(BookswapError::Validation(_))
        ));
    }
}
