//! Authentication Middleware
//!
//! Optional JWT identity for rate limit keys. Authorization itself belongs to
//! the business handlers; this layer never rejects a request.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::headers::{authorization::Bearer, Authorization, HeaderMapExt};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

use crate::startup::AppState;

/// JWT claims structure
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

/// Authenticated user extension
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub user_id: String,
}

/// Decode a bearer token into the authenticated user it names.
pub fn verify_token(token: &str, secret: &str) -> Option<AuthUser> {
    let mut validation = Validation::new(Algorithm::HS256);
    // Tokens come from the hosted auth provider with its own audience
    validation.validate_aud = false;

    match decode::<Claims>(token, &DecodingKey::from_secret(secret.as_bytes()), &validation) {
        Ok(data) if !data.claims.sub.is_empty() => Some(AuthUser {
            user_id: data.claims.sub,
        }),
        Ok(_) => None,
        Err(e) => {
            tracing::debug!(error = %e, "Ignoring invalid bearer token");
            None
        }
    }
}

/// Optional authentication middleware (doesn't fail if no token)
pub async fn optional_auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    if let Some(secret) = state.settings.jwt.secret.as_deref() {
        let user = request
            .headers()
            .typed_get::<Authorization<Bearer>>()
            .and_then(|Authorization(bearer)| verify_token(bearer.token(), secret));

        if let Some(user) = user {
            request.extensions_mut().insert(user);
        }
    }

    next.run(request).await
}
