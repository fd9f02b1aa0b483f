//! Request extractors
//!
//! `AuthUser` verifies the bearer token before a handler runs, so protected
//! handlers only ever see a verified user id. `ApiJson` and `ApiQuery` wrap
//! the axum extractors to turn decoding failures into [`ApiError`] bodies.

use std::ops::Deref;

use axum::Json;
use axum::extract::{FromRequest, FromRequestParts, Query, Request};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use mediguard_auth::{AuthError, UserInfo, extract_bearer};
use serde::de::DeserializeOwned;

use crate::error::ApiError;
use crate::state::AppState;

/// Maximum token size (8KB)
const MAX_TOKEN_SIZE: usize = 8 * 1024;

/// Authenticated user extractor
///
/// ```ignore
/// async fn handler(user: AuthUser) -> impl IntoResponse {
///     format!("Hello, {}!", user.display_name)
/// }
/// ```
#[derive(Debug, Clone)]
pub struct AuthUser(pub UserInfo);

impl Deref for AuthUser {
    type Target = UserInfo;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(extract_bearer)
            .ok_or(AuthError::MissingToken)?;

        if token.len() > MAX_TOKEN_SIZE {
            return Err(AuthError::InvalidToken("token too large".to_string()).into());
        }

        let user = state.credentials.verify(token).await?;
        Ok(Self(user))
    }
}

/// JSON body extractor with API error bodies
#[derive(Debug, Clone)]
pub struct ApiJson<T>(pub T);

impl<T, S> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        Ok(Self(value))
    }
}

/// Query string extractor with API error bodies
#[derive(Debug, Clone)]
pub struct ApiQuery<T>(pub T);

impl<T, S> FromRequestParts<S> for ApiQuery<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state).await?;
        Ok(Self(value))
    }
}
