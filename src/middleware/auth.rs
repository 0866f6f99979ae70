// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! JWT authentication middleware.
//!
//! Identity tokens are issued by the auth provider and signed with the
//! shared HS256 key; this service only verifies them.

use crate::AppState;
use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use chrono::{DateTime, Utc};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Cookie carrying the identity token for browser clients.
pub const TOKEN_COOKIE: &str = "fitbuddy_token";

/// JWT claims structure.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,
    /// Expiration time (Unix timestamp)
    pub exp: usize,
    /// Issued at (Unix timestamp)
    pub iat: usize,
    /// Session ID, when the provider assigns one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sid: Option<String>,
}

/// Authenticated user extracted from JWT.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub uid: String,
    /// Key for per-session state
    pub session_id: String,
    /// When the token stops being accepted
    pub expires_at: DateTime<Utc>,
}

/// Pull the raw token from the cookie or the `Authorization` header.
fn extract_token(jar: &CookieJar, headers: &HeaderMap) -> Option<String> {
    if let Some(cookie) = jar.get(TOKEN_COOKIE) {
        return Some(cookie.value().to_string());
    }

    headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(String::from)
}

/// Verify a token and turn its claims into an [`AuthUser`].
pub fn verify_token(token: &str, signing_key: &[u8]) -> Option<AuthUser> {
    let key = DecodingKey::from_secret(signing_key);
    let validation = Validation::new(Algorithm::HS256);

    let claims = decode::<Claims>(token, &key, &validation).ok()?.claims;
    if claims.sub.is_empty() {
        return None;
    }

    let expires_at = DateTime::from_timestamp(i64::try_from(claims.exp).ok()?, 0)?;
    let session_id = claims
        .sid
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| format!("{}:{}", claims.sub, claims.iat));

    Some(AuthUser {
        uid: claims.sub,
        session_id,
        expires_at,
    })
}

/// Identify the caller from a request, if it carries a valid token.
pub fn authenticate(jar: &CookieJar, headers: &HeaderMap, signing_key: &[u8]) -> Option<AuthUser> {
    extract_token(jar, headers).and_then(|token| verify_token(&token, signing_key))
}

/// Middleware that requires valid JWT authentication.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let auth_user = authenticate(&jar, request.headers(), &state.config.jwt_signing_key)
        .ok_or(StatusCode::UNAUTHORIZED)?;

    request.extensions_mut().insert(auth_user);

    Ok(next.run(request).await)
}

/// Create a JWT for a user session.
pub fn create_jwt(uid: &str, session_id: Option<&str>, signing_key: &[u8]) -> anyhow::Result<String> {
    use jsonwebtoken::{encode, EncodingKey, Header};
    use std::time::{SystemTime, UNIX_EPOCH};

    let now = SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs() as usize;

    let claims = Claims {
        sub: uid.to_string(),
        iat: now,
        exp: now + 30 * 24 * 60 * 60, // 30 days
        sid: session_id.map(String::from),
    };

    Ok(encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(signing_key),
    )?)
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: &[u8] = b"unit_test_signing_key_0123456789";

    #[test]
    fn test_round_trip_with_session_id() {
        let token = create_jwt("user-1", Some("sess-9"), KEY).unwrap();
        let user = verify_token(&token, KEY).unwrap();

        assert_eq!(user.uid, "user-1");
        assert_eq!(user.session_id, "sess-9");
        assert!(user.expires_at > Utc::now() + chrono::Duration::days(29));
    }

    #[test]
    fn test_session_id_falls_back_to_subject_and_iat() {
        let token = create_jwt("user-1", None, KEY).unwrap();
        let user = verify_token(&token, KEY).unwrap();

        assert!(user.session_id.starts_with("user-1:"));
    }

    #[test]
    fn test_wrong_key_rejected() {
        let token = create_jwt("user-1", None, KEY).unwrap();
        assert!(verify_token(&token, b"some_other_key_that_is_long_enough").is_none());
    }
}
