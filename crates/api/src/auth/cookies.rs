//! Session cookies carrying the access and refresh tokens.

use axum_extra::extract::cookie::{Cookie, CookieJar};

pub const ACCESS_COOKIE: &str = "access_token";
pub const REFRESH_COOKIE: &str = "refresh_token";

/// Attributes shared by both token cookies.
#[derive(Debug, Clone)]
pub struct CookieConfig {
    /// `Max-Age` in days (default: 7).
    pub max_age_days: i64,
    /// Emit the `Secure` attribute.
    pub secure: bool,
}

fn token_cookie(name: &'static str, value: String, config: &CookieConfig) -> Cookie<'static> {
    Cookie::build((name, value))
        .http_only(true)
        .path("/")
        .max_age(time::Duration::seconds(config.max_age_days.saturating_mul(86_400)))
        .secure(config.secure)
        .build()
}

/// Set both token cookies.
pub fn set_session_cookies(
    jar: CookieJar,
    access_token: &str,
    refresh_token: &str,
    config: &CookieConfig,
) -> CookieJar {
    jar.add(token_cookie(REFRESH_COOKIE, refresh_token.to_string(), config))
        .add(token_cookie(ACCESS_COOKIE, access_token.to_string(), config))
}

/// Replace only the access token cookie.
pub fn set_access_cookie(jar: CookieJar, access_token: &str, config: &CookieConfig) -> CookieJar {
    jar.add(token_cookie(ACCESS_COOKIE, access_token.to_string(), config))
}

/// An already-expired cookie with the same name, path, and flags as the original.
fn removal_cookie(name: &'static str) -> Cookie<'static> {
    let mut cookie = Cookie::build((name, "")).http_only(true).path("/").build();
    cookie.make_removal();
    cookie
}

/// Expire both token cookies.
///
/// Removal cookies are always emitted, even when the request carried no
/// cookies (bearer-only clients).
pub fn clear_session_cookies(jar: CookieJar) -> CookieJar {
    jar.add(removal_cookie(REFRESH_COOKIE))
        .add(removal_cookie(ACCESS_COOKIE))
}
