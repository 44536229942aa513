//! Custom Extractors
//!
//! Axum extractors for the identities the security pipeline attaches to a
//! request.

use std::convert::Infallible;

use axum::{
    extract::{FromRequestParts, OptionalFromRequestParts},
    http::request::Parts,
};

use crate::presentation::middleware::AuthUser;
use crate::shared::error::AppError;

/// Requires the optional auth layer to have verified a bearer token.
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or_else(|| AppError::Unauthorized("Missing or invalid bearer token".into()))
    }
}

/// `Option<AuthUser>` for routes open to anonymous callers.
impl<S> OptionalFromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> Result<Option<Self>, Self::Rejection> {
        Ok(parts.extensions.get::<AuthUser>().cloned())
    }
}

/// Session identifier from the configured session header, when present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionId(pub Option<String>);

impl FromRequestParts<crate::startup::AppState> for SessionId {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &crate::startup::AppState,
    ) -> Result<Self, Self::Rejection> {
        let session = parts
            .headers
            .get(state.settings.csrf.session_header.as_str())
            .and_then(|h| h.to_str().ok())
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_owned);

        Ok(SessionId(session))
    }
}
