//! HTTP Basic authentication for management routes
//!
//! A single admin user from [`AuthConfig`] guards everything except the
//! public allowlist: the landing page, health checks and token downloads.

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderMap, HeaderValue, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde_json::json;

use crate::config::AuthConfig;
use crate::state::AppState;

/// Realm advertised in `WWW-Authenticate`
pub const REALM: &str = "advent-server";

/// Paths reachable without credentials
pub fn is_public_path(path: &str) -> bool {
    path == "/" || path == "/health" || path.starts_with("/api/download/")
}

/// Decode `Authorization: Basic <base64(user:pass)>`
pub fn basic_credentials(headers: &HeaderMap) -> Option<(String, String)> {
    let encoded = headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Basic ")?;
    let decoded = STANDARD.decode(encoded.trim()).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (user, pass) = decoded.split_once(':')?;
    Some((user.to_string(), pass.to_string()))
}

/// Compare without short-circuiting on the first differing byte
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

impl AuthConfig {
    /// Whether the request headers carry this user's credentials
    pub fn authorizes(&self, headers: &HeaderMap) -> bool {
        match basic_credentials(headers) {
            Some((user, pass)) => {
                let user_ok = constant_time_eq(user.as_bytes(), self.username.as_bytes());
                let pass_ok = constant_time_eq(pass.as_bytes(), self.password.as_bytes());
                user_ok & pass_ok
            }
            None => false,
        }
    }
}

/// Require admin credentials outside the public allowlist
pub async fn require_basic_auth(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    if is_public_path(req.uri().path()) || state.config().auth.authorizes(req.headers()) {
        return next.run(req).await;
    }

    tracing::debug!(path = %req.uri().path(), "Rejected unauthenticated request");
    unauthorized()
}

fn unauthorized() -> Response {
    let mut response = (
        StatusCode::UNAUTHORIZED,
        Json(json!({
            "error": "unauthorized",
            "message": "Authentication required",
        })),
    )
        .into_response();

    if let Ok(value) = HeaderValue::from_str(&format!("Basic realm=\"{}\"", REALM)) {
        response.headers_mut().insert(header::WWW_AUTHENTICATE, value);
    }
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers_with(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    fn auth() -> AuthConfig {
        AuthConfig {
            username: "admin".to_string(),
            password: "s3cret".to_string(),
        }
    }

    #[test]
    fn test_public_paths() {
        assert!(is_public_path("/"));
        assert!(is_public_path("/health"));
        assert!(is_public_path("/api/download/0123456789abcdef0123456789abcdef"));
        assert!(!is_public_path("/api/models"));
        assert!(!is_public_path("/api/downloads"));
        assert!(!is_public_path("/api/models/upload"));
    }

    #[test]
    fn test_basic_credentials() {
        let headers = headers_with(&format!("Basic {}", STANDARD.encode("admin:pa:ss")));
        assert_eq!(
            basic_credentials(&headers),
            Some(("admin".to_string(), "pa:ss".to_string()))
        );

        assert_eq!(basic_credentials(&headers_with("Bearer abc")), None);
        assert_eq!(basic_credentials(&headers_with("Basic not-base64!")), None);
        assert_eq!(basic_credentials(&HeaderMap::new()), None);
    }

    #[test]
    fn test_authorizes() {
        let auth = auth();
        let good = headers_with(&format!("Basic {}", STANDARD.encode("admin:s3cret")));
        let bad = headers_with(&format!("Basic {}", STANDARD.encode("admin:wrong")));
        assert!(auth.authorizes(&good));
        assert!(!auth.authorizes(&bad));
        assert!(!auth.authorizes(&HeaderMap::new()));
    }

    #[test]
    fn test_unauthorized_response() {
        let response = unauthorized();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            response.headers().get(header::WWW_AUTHENTICATE).unwrap(),
            "Basic realm=\"advent-server\""
        );
    }
}
