// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session routes.
//!
//! Sign-up and sign-in happen against the auth provider directly; this
//! service only needs to forget session state on logout.

use crate::middleware::auth::{authenticate, TOKEN_COOKIE};
use crate::AppState;
use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::post,
    Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use std::sync::Arc;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/auth/logout", post(logout))
}

/// End the caller's session and clear the token cookie.
///
/// Succeeds even without a valid token so clients can always log out.
async fn logout(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    headers: HeaderMap,
) -> (CookieJar, StatusCode) {
    if let Some(user) = authenticate(&jar, &headers, &state.config.jwt_signing_key) {
        state.sessions.end(&user.session_id);
        tracing::info!(uid = %user.uid, "User logged out");
    }

    let secure = state.config.frontend_url.starts_with("https://");
    let removal = Cookie::build(TOKEN_COOKIE)
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure);

    (jar.remove(removal), StatusCode::NO_CONTENT)
}
