//! Opaque cookie sessions, anti-forgery tokens and the intended-route cookie.
//!
//! A session token is 32 random bytes handed to the browser once. The
//! database only ever sees its SHA-256.

use std::{sync::Arc, time::Duration};

use anyhow::Context;
use axum::http::{
    header::{InvalidHeaderValue, COOKIE},
    uri::PathAndQuery,
    HeaderMap, HeaderValue,
};
use base64ct::{Base64UrlUnpadded, Encoding};
use rand::{rngs::OsRng, RngCore};
use sha2::{Digest, Sha256};
use time::{Duration as TimeDuration, OffsetDateTime};
use tracing::{debug, info, warn};

use crate::{
    auth::{
        repo::SessionRepo,
        repo_types::{SessionRow, User},
    },
    config::SessionConfig,
    state::AppState,
};

pub const SESSION_COOKIE: &str = "session";
pub const CSRF_COOKIE: &str = "csrf_token";
pub const INTENDED_COOKIE: &str = "intended";

const INTENDED_MAX_AGE_SECS: i64 = 10 * 60;

pub fn generate_token() -> anyhow::Result<String> {
    let mut bytes = [0u8; 32];
    OsRng
        .try_fill_bytes(&mut bytes)
        .context("failed to generate random token")?;
    Ok(Base64UrlUnpadded::encode_string(&bytes))
}

pub fn hash_token(token: &str) -> Vec<u8> {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hasher.finalize().to_vec()
}

/// Value of the first cookie called `name` in the request.
pub fn read_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|h| h.to_str().ok())
        .flat_map(|h| h.split(';'))
        .find_map(|pair| {
            let (key, val) = pair.trim().split_once('=')?;
            (key.trim() == name && !val.trim().is_empty()).then(|| val.trim().to_string())
        })
}

pub fn cookie(
    name: &str,
    value: &str,
    max_age_secs: i64,
    secure: bool,
) -> Result<HeaderValue, InvalidHeaderValue> {
    let mut cookie =
        format!("{name}={value}; Path=/; HttpOnly; SameSite=Lax; Max-Age={max_age_secs}");
    if secure {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie)
}

pub fn clear_cookie(name: &str, secure: bool) -> Result<HeaderValue, InvalidHeaderValue> {
    cookie(name, "", 0, secure)
}

/// Issue a fresh session for `user`, dropping whatever session the request
/// carried. Returns the `Set-Cookie` value.
pub async fn start_session(
    state: &AppState,
    headers: &HeaderMap,
    user: &User,
) -> anyhow::Result<HeaderValue> {
    if let Some(old) = read_cookie(headers, SESSION_COOKIE) {
        state.sessions.delete(&hash_token(&old)).await?;
    }

    let cfg = &state.config.session;
    let token = generate_token()?;
    let now = OffsetDateTime::now_utc();
    let row = SessionRow {
        token_hash: hash_token(&token),
        user_id: user.id,
        created_at: now,
        expires_at: now + TimeDuration::minutes(cfg.ttl_minutes),
    };
    state.sessions.insert(&row).await?;
    debug!(user_id = %user.id, expires_at = %row.expires_at, "session started");

    cookie(SESSION_COOKIE, &token, cfg.ttl_minutes * 60, cfg.cookie_secure)
        .context("session cookie header")
}

/// Invalidate the request's session, if any. Returns the cookie that clears it.
pub async fn end_session(state: &AppState, headers: &HeaderMap) -> anyhow::Result<HeaderValue> {
    if let Some(token) = read_cookie(headers, SESSION_COOKIE) {
        state.sessions.delete(&hash_token(&token)).await?;
    }
    clear_cookie(SESSION_COOKIE, state.config.session.cookie_secure)
        .context("clear session cookie header")
}

/// The user behind the request's session cookie. `None` for a missing,
/// unknown or expired session.
pub async fn current_user(state: &AppState, headers: &HeaderMap) -> anyhow::Result<Option<User>> {
    let Some(token) = read_cookie(headers, SESSION_COOKIE) else {
        return Ok(None);
    };
    let Some(user_id) = state.sessions.lookup(&hash_token(&token)).await? else {
        return Ok(None);
    };
    let user = state.users.find_by_id(user_id).await?;
    if user.is_none() {
        warn!(%user_id, "session references a missing user");
    }
    Ok(user)
}

/// Anti-forgery token for a form render. Reuses the visitor's cookie when
/// present; otherwise mints one and returns the cookie to set.
pub fn csrf_token(
    headers: &HeaderMap,
    cfg: &SessionConfig,
) -> anyhow::Result<(String, Option<HeaderValue>)> {
    if let Some(token) = read_cookie(headers, CSRF_COOKIE) {
        return Ok((token, None));
    }
    let (token, header) = rotate_csrf(cfg)?;
    Ok((token, Some(header)))
}

pub fn rotate_csrf(cfg: &SessionConfig) -> anyhow::Result<(String, HeaderValue)> {
    let token = generate_token()?;
    let header = cookie(CSRF_COOKIE, &token, cfg.ttl_minutes * 60, cfg.cookie_secure)
        .context("csrf cookie header")?;
    Ok((token, header))
}

/// Double-submit check: the submitted field must equal the cookie.
pub fn csrf_matches(headers: &HeaderMap, submitted: &str) -> bool {
    match read_cookie(headers, CSRF_COOKIE) {
        Some(expected) => constant_time_eq(expected.as_bytes(), submitted.as_bytes()),
        None => false,
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// Remember where an anonymous visitor was headed.
pub fn intended_cookie(path: &str, secure: bool) -> Result<HeaderValue, InvalidHeaderValue> {
    let encoded = Base64UrlUnpadded::encode_string(path.as_bytes());
    cookie(INTENDED_COOKIE, &encoded, INTENDED_MAX_AGE_SECS, secure)
}

/// The remembered destination, only if it stays on this site and is usable
/// as a `Location` header as-is.
pub fn intended_path(headers: &HeaderMap) -> Option<String> {
    let raw = read_cookie(headers, INTENDED_COOKIE)?;
    let bytes = Base64UrlUnpadded::decode_vec(&raw).ok()?;
    let path = String::from_utf8(bytes).ok()?;
    is_local_path(&path).then_some(path)
}

// Browsers drop tabs and newlines from URLs, so "/\t/host" would turn into
// "//host" on their side.
fn is_local_path(path: &str) -> bool {
    path.starts_with('/')
        && !path.starts_with("//")
        && !path
            .chars()
            .any(|c| c == '\\' || c.is_control() || c.is_whitespace())
        && path.parse::<PathAndQuery>().is_ok()
        && HeaderValue::from_str(path).is_ok()
}

/// Periodically drop expired sessions. Runs until the process exits.
pub async fn purge_loop(sessions: Arc<dyn SessionRepo>, every: Duration) {
    let mut ticker = tokio::time::interval(every);
    loop {
        ticker.tick().await;
        match sessions.purge_expired().await {
            Ok(0) => {}
            Ok(n) => info!(purged = n, "expired sessions removed"),
            Err(e) => warn!(error = %e, "session purge failed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers_with_cookie(raw: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_str(raw).unwrap());
        headers
    }

    #[test]
    fn tokens_are_unique_and_url_safe() {
        let a = generate_token().unwrap();
        let b = generate_token().unwrap();
        assert_ne!(a, b);
        assert_eq!(a.len(), 43);
        assert!(a.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }

    #[test]
    fn token_hash_is_sha256() {
        assert_eq!(hash_token("abc").len(), 32);
        assert_eq!(hash_token("abc"), hash_token("abc"));
        assert_ne!(hash_token("abc"), hash_token("abd"));
    }

    #[test]
    fn read_cookie_picks_named_pair() {
        let headers = headers_with_cookie("theme=dark; session=tok123 ; csrf_token=xyz");
        assert_eq!(read_cookie(&headers, SESSION_COOKIE).as_deref(), Some("tok123"));
        assert_eq!(read_cookie(&headers, CSRF_COOKIE).as_deref(), Some("xyz"));
        assert_eq!(read_cookie(&headers, "missing"), None);
    }

    #[test]
    fn empty_cookie_value_counts_as_absent() {
        let headers = headers_with_cookie("session=");
        assert_eq!(read_cookie(&headers, SESSION_COOKIE), None);
    }

    #[test]
    fn cookie_attributes() {
        let plain = cookie("session", "t", 60, false).unwrap();
        assert_eq!(plain, "session=t; Path=/; HttpOnly; SameSite=Lax; Max-Age=60");
        let secure = clear_cookie("session", true).unwrap();
        assert!(secure.to_str().unwrap().ends_with("Max-Age=0; Secure"));
    }

    #[test]
    fn csrf_requires_cookie_and_equal_field() {
        let headers = headers_with_cookie("csrf_token=abc");
        assert!(csrf_matches(&headers, "abc"));
        assert!(!csrf_matches(&headers, "abd"));
        assert!(!csrf_matches(&headers, ""));
        assert!(!csrf_matches(&HeaderMap::new(), "abc"));
    }

    #[test]
    fn intended_path_round_trips_local_paths_only() {
        let set = intended_cookie("/dashboard?tab=a;b", false).unwrap();
        let value = set.to_str().unwrap().split(';').next().unwrap().to_string();
        let headers = headers_with_cookie(&value);
        assert_eq!(intended_path(&headers).as_deref(), Some("/dashboard?tab=a;b"));

        let offsite = intended_cookie("//evil.example/", false).unwrap();
        let value = offsite.to_str().unwrap().split(';').next().unwrap().to_string();
        assert_eq!(intended_path(&headers_with_cookie(&value)), None);
    }

    #[test]
    fn local_path_rules() {
        assert!(is_local_path("/dashboard"));
        assert!(!is_local_path("https://evil.example"));
        assert!(!is_local_path("//evil.example"));
        assert!(!is_local_path("/\\evil.example"));
        assert!(!is_local_path("/\t/evil.example/"));
        assert!(!is_local_path("/\n/evil.example/"));
        assert!(!is_local_path("/\u{1}x"));
        assert!(!is_local_path("/a b"));
        assert!(is_local_path("/dashboard?tab=sales&page=2"));
    }
}
