use axum_extra::extract::cookie::{Cookie, SameSite};
use time::{Duration, OffsetDateTime};

/// Name of the session cookie.
pub const TOKEN_COOKIE: &str = "token";

/// Session cookie carrying `token`, expiring after `ttl_days`.
pub fn session_cookie(token: String, ttl_days: i64, secure: bool) -> Cookie<'static> {
    Cookie::build((TOKEN_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Strict)
        .secure(secure)
        .max_age(Duration::days(ttl_days))
        .build()
}

/// Empty, already-expired session cookie used to log out.
pub fn cleared_cookie(secure: bool) -> Cookie<'static> {
    Cookie::build((TOKEN_COOKIE, ""))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Strict)
        .secure(secure)
        .max_age(Duration::ZERO)
        .expires(OffsetDateTime::UNIX_EPOCH)
        .build()
}
