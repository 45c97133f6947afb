//! Session cookie encoding.
//!
//! The cookie only carries the opaque token; everything else lives in the
//! `sessions` table.

use axum::http::{
    HeaderMap, HeaderValue,
    header::{COOKIE, SET_COOKIE},
};
use cookie::{Cookie, SameSite, time::Duration};

use crate::config::AuthConfig;
use crate::error::AppError;
use crate::models::SessionToken;

/// Name of the session cookie.
pub const SESSION_COOKIE: &str = "session";

/// Build the cookie that carries a freshly issued session.
#[must_use]
pub fn session_cookie(token: &SessionToken, config: &AuthConfig) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token.as_str().to_owned()))
        .http_only(true)
        .same_site(SameSite::Lax)
        .path("/")
        .secure(config.cookie_secure)
        .max_age(Duration::try_from(config.session_ttl).unwrap_or(Duration::MAX))
        .build()
}

/// Build a cookie that clears the session cookie in the browser.
#[must_use]
pub fn removal_cookie(config: &AuthConfig) -> Cookie<'static> {
    let mut cookie = Cookie::build((SESSION_COOKIE, ""))
        .http_only(true)
        .same_site(SameSite::Lax)
        .path("/")
        .secure(config.cookie_secure)
        .build();
    cookie.make_removal();
    cookie
}

/// Encode a cookie as a `Set-Cookie` header pair.
///
/// # Errors
///
/// Returns `AppError::Internal` if the cookie is not a valid header value.
pub fn set_cookie_header(
    cookie: &Cookie<'_>,
) -> Result<[(axum::http::HeaderName, HeaderValue); 1], AppError> {
    let value = HeaderValue::from_str(&cookie.to_string())
        .map_err(|e| AppError::Internal(format!("invalid cookie header: {e}")))?;
    Ok([(SET_COOKIE, value)])
}

/// Read the session token from the request's `Cookie` headers.
#[must_use]
pub fn read_session_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(Cookie::split_parse)
        .filter_map(Result::ok)
        .find(|cookie| cookie.name() == SESSION_COOKIE)
        .map(|cookie| cookie.value().to_owned())
        .filter(|token| !token.is_empty())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration as StdDuration;

    use super::*;

    fn config(secure: bool) -> AuthConfig {
        AuthConfig {
            cookie_secure: secure,
            session_ttl: StdDuration::from_secs(7 * 24 * 60 * 60),
            ..AuthConfig::default()
        }
    }

    #[test]
    fn test_session_cookie_attributes() {
        let token = SessionToken::new("tok123".to_string());
        let cookie = session_cookie(&token, &config(false));

        assert_eq!(cookie.name(), "session");
        assert_eq!(cookie.value(), "tok123");
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Lax));
        assert_eq!(cookie.path(), Some("/"));
        assert_ne!(cookie.secure(), Some(true));
        assert_eq!(cookie.max_age(), Some(Duration::days(7)));
    }

    #[test]
    fn test_session_cookie_secure_flag() {
        let token = SessionToken::new("tok123".to_string());
        let cookie = session_cookie(&token, &config(true));
        assert_eq!(cookie.secure(), Some(true));
        assert!(cookie.to_string().contains("Secure"));
    }

    #[test]
    fn test_removal_cookie_expires_immediately() {
        let cookie = removal_cookie(&config(false));
        assert_eq!(cookie.name(), "session");
        assert_eq!(cookie.value(), "");
        assert_eq!(cookie.max_age(), Some(Duration::ZERO));
        assert_eq!(cookie.path(), Some("/"));
    }

    #[test]
    fn test_read_session_token() {
        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            HeaderValue::from_static("theme=dark; session=abc-123; other=1"),
        );
        assert_eq!(read_session_token(&headers).as_deref(), Some("abc-123"));
    }

    #[test]
    fn test_read_session_token_missing_or_empty() {
        let mut headers = HeaderMap::new();
        assert_eq!(read_session_token(&headers), None);

        headers.insert(COOKIE, HeaderValue::from_static("session="));
        assert_eq!(read_session_token(&headers), None);
    }

    #[test]
    fn test_set_cookie_header() {
        let token = SessionToken::new("tok".to_string());
        let [(name, value)] = set_cookie_header(&session_cookie(&token, &config(false))).unwrap();
        assert_eq!(name, SET_COOKIE);
        let value = value.to_str().unwrap();
        assert!(value.starts_with("session=tok"));
        assert!(value.contains("HttpOnly"));
        assert!(value.contains("SameSite=Lax"));
    }
}
