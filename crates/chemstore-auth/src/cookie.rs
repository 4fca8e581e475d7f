//! Transport of the identity token in the `access` cookie.

use axum::http::HeaderMap;
use axum_extra::extract::CookieJar;
use axum_extra::extract::cookie::{Cookie, SameSite};
use time::OffsetDateTime;
use tracing::warn;

use chemstore_config::JwtConfig;

use crate::jwt::SignedToken;

/// Name of the cookie carrying the identity token.
pub const COOKIE_NAME: &str = "access";

/// Builds the `access` cookie for a freshly signed token.
///
/// The cookie expires together with the token. An expiry outside the cookie
/// date range yields a session cookie without `Expires`.
pub fn token_cookie(signed: &SignedToken, config: &JwtConfig) -> Cookie<'static> {
    let expires = match OffsetDateTime::from_unix_timestamp(signed.claims.exp) {
        Ok(expires) => Some(expires),
        Err(_) => {
            warn!(
                exp = signed.claims.exp,
                "Token expiry out of cookie date range, using session cookie"
            );
            None
        }
    };

    build(signed.token.clone(), expires, config)
}

/// Builds a cookie that clears `access` in the browser.
pub fn empty_token_cookie(config: &JwtConfig) -> Cookie<'static> {
    build(String::new(), Some(OffsetDateTime::UNIX_EPOCH), config)
}

/// Reads the raw token from the request's `Cookie` headers.
pub fn read_token(headers: &HeaderMap) -> Option<String> {
    CookieJar::from_headers(headers)
        .get(COOKIE_NAME)
        .map(|cookie| cookie.value().to_string())
}

fn build(value: String, expires: Option<OffsetDateTime>, config: &JwtConfig) -> Cookie<'static> {
    Cookie::build((COOKIE_NAME, value))
        .path("/")
        .domain(config.domain.clone())
        .secure(config.secure_cookies)
        .http_only(true)
        .same_site(SameSite::Strict)
        .expires(expires)
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::claims::Claims;
    use axum::http::header::COOKIE;

    fn config() -> JwtConfig {
        JwtConfig {
            domain: "chem.example.org".to_string(),
            secure_cookies: true,
            expiration_delta_minutes: 60,
        }
    }

    fn signed() -> SignedToken {
        SignedToken {
            token: "header.payload.signature".to_string(),
            claims: Claims {
                sub: "user".to_string(),
                acr: "admin".to_string(),
                iat: 1_700_000_000,
                exp: 1_700_003_600,
            },
        }
    }

    #[test]
    fn test_token_cookie_attributes() {
        let cookie = token_cookie(&signed(), &config());

        assert_eq!(cookie.name(), "access");
        assert_eq!(cookie.value(), "header.payload.signature");
        assert_eq!(cookie.path(), Some("/"));
        assert_eq!(cookie.domain(), Some("chem.example.org"));
        assert_eq!(cookie.secure(), Some(true));
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Strict));
        assert_eq!(
            cookie.expires_datetime().map(|t| t.unix_timestamp()),
            Some(1_700_003_600)
        );
    }

    #[test]
    fn test_unrepresentable_expiry_is_session_cookie() {
        let mut signed = signed();
        signed.claims.exp = i64::MAX;
        let cookie = token_cookie(&signed, &config());

        assert_eq!(cookie.value(), "header.payload.signature");
        assert!(cookie.expires().is_some_and(|e| e.is_session()));
        assert_eq!(cookie.expires_datetime(), None);
        assert!(!cookie.to_string().contains("Expires"));
    }

    #[test]
    fn test_insecure_cookie_when_configured() {
        let mut config = config();
        config.secure_cookies = false;
        let cookie = token_cookie(&signed(), &config);
        assert_eq!(cookie.secure(), Some(false));
    }

    #[test]
    fn test_empty_token_cookie_expires_at_epoch() {
        let cookie = empty_token_cookie(&config());

        assert_eq!(cookie.name(), "access");
        assert_eq!(cookie.value(), "");
        assert_eq!(cookie.path(), Some("/"));
        assert_eq!(cookie.domain(), Some("chem.example.org"));
        assert_eq!(
            cookie.expires_datetime().map(|t| t.unix_timestamp()),
            Some(0)
        );
    }

    #[test]
    fn test_read_token() {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, "theme=dark; access=abc.def.ghi".parse().unwrap());
        assert_eq!(read_token(&headers).as_deref(), Some("abc.def.ghi"));
    }

    #[test]
    fn test_read_token_missing() {
        let mut headers = HeaderMap::new();
        assert_eq!(read_token(&headers), None);

        headers.insert(COOKIE, "theme=dark".parse().unwrap());
        assert_eq!(read_token(&headers), None);
    }
}
