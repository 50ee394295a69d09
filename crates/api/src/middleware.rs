use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderMap, HeaderValue, StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use base64::Engine;
use tracing::Instrument;

use orgchart_auth::{CredentialStore, authenticate};

use crate::context::PrincipalContext;

#[derive(Clone)]
pub struct AuthState {
    pub credentials: Arc<dyn CredentialStore>,
}

/// HTTP Basic authentication.
///
/// Verified credentials become a `PrincipalContext` request extension;
/// anything else gets the Basic challenge back.
pub async fn auth_middleware(
    State(state): State<AuthState>,
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Response {
    let (username, password) = match extract_basic(req.headers()) {
        Some(credentials) => credentials,
        None => return challenge(),
    };

    match authenticate(state.credentials.as_ref(), &username, &password) {
        Some(principal) => {
            req.extensions_mut().insert(PrincipalContext::new(principal));
            next.run(req).await
        }
        None => challenge(),
    }
}

/// Per-request correlation id: recorded on the request span and echoed back
/// as `x-request-id`.
pub async fn request_id_middleware(
    req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Response {
    let request_id = uuid::Uuid::now_v7();
    let span = tracing::info_span!(
        "request",
        %request_id,
        method = %req.method(),
        path = %req.uri().path(),
    );

    let mut res = next.run(req).instrument(span).await;
    if let Ok(value) = HeaderValue::from_str(&request_id.to_string()) {
        res.headers_mut().insert("x-request-id", value);
    }
    res
}

fn challenge() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        [(header::WWW_AUTHENTICATE, r#"Basic realm="orgchart""#)],
    )
        .into_response()
}

fn extract_basic(headers: &HeaderMap) -> Option<(String, String)> {
    let header = headers.get(header::AUTHORIZATION)?;
    let header = header.to_str().ok()?;
    let encoded = header.strip_prefix("Basic ")?.trim();

    let decoded = base64::engine::general_purpose::STANDARD
        .decode(encoded)
        .ok()?;
    let decoded = String::from_utf8(decoded).ok()?;

    let (username, password) = decoded.split_once(':')?;
    if username.is_empty() {
        return None;
    }
    Some((username.to_string(), password.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers_with(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, value.parse().unwrap());
        headers
    }

    #[test]
    fn extracts_valid_basic_credentials() {
        // "alice:secret"
        let headers = headers_with("Basic YWxpY2U6c2VjcmV0");
        let (username, password) = extract_basic(&headers).unwrap();
        assert_eq!(username, "alice");
        assert_eq!(password, "secret");
    }

    #[test]
    fn password_may_contain_colons() {
        // "alice:a:b:c"
        let encoded = base64::engine::general_purpose::STANDARD.encode("alice:a:b:c");
        let headers = headers_with(&format!("Basic {encoded}"));
        let (_, password) = extract_basic(&headers).unwrap();
        assert_eq!(password, "a:b:c");
    }

    #[test]
    fn rejects_missing_header_wrong_scheme_and_garbage() {
        assert!(extract_basic(&HeaderMap::new()).is_none());
        assert!(extract_basic(&headers_with("Bearer sometoken")).is_none());
        assert!(extract_basic(&headers_with("Basic !!!not-base64!!!")).is_none());
        // no colon separator ("alice")
        assert!(extract_basic(&headers_with("Basic YWxpY2U=")).is_none());
    }
}
