use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{header::COOKIE, request::Parts},
};
use tracing::warn;

use crate::error::ApiError;
use crate::providers::auth::{AuthProviderError, Principal};
use crate::state::AppState;

pub const SESSION_COOKIE: &str = "focal_session";

/// Extracts the session cookie and verifies it against the auth provider.
/// Rejections follow the taxonomy: no/invalid cookie is 401, an
/// unreachable provider is a 500-class upstream failure.
pub struct Session {
    pub token: String,
    pub principal: Principal,
}

#[async_trait]
impl<S> FromRequestParts<S> for Session
where
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let state = AppState::from_ref(state);

        let cookie_header = parts.headers.get(COOKIE).and_then(|h| h.to_str().ok());
        let token =
            token_from_cookie_header(cookie_header).ok_or(ApiError::Unauthenticated)?;

        match state.auth.verify_token(&token).await {
            Ok(Some(principal)) => Ok(Session { token, principal }),
            Ok(None) => {
                warn!("session cookie rejected by auth provider");
                Err(ApiError::Unauthenticated)
            }
            // Provider being down is a 500-class outcome, not a 401.
            Err(e) => Err(ApiError::Upstream(anyhow::anyhow!(e))),
        }
    }
}

/// Pulls the session token out of a `Cookie` header value, if present.
pub fn token_from_cookie_header(header: Option<&str>) -> Option<String> {
    let header = header?;
    for pair in header.split(';') {
        let pair = pair.trim();
        if let Some((name, value)) = pair.split_once('=') {
            if name == SESSION_COOKIE && !value.is_empty() {
                return Some(value.to_string());
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_token_among_other_cookies() {
        let header = "theme=dark; focal_session=tok-abc123; focal_view_mode=studio";
        assert_eq!(
            token_from_cookie_header(Some(header)),
            Some("tok-abc123".to_string())
        );
    }

    #[test]
    fn missing_or_empty_cookie_yields_none() {
        assert_eq!(token_from_cookie_header(None), None);
        assert_eq!(token_from_cookie_header(Some("")), None);
        assert_eq!(token_from_cookie_header(Some("theme=dark")), None);
        assert_eq!(token_from_cookie_header(Some("focal_session=")), None);
    }

    #[test]
    fn cookie_name_must_match_exactly() {
        assert_eq!(
            token_from_cookie_header(Some("focal_session_old=tok")),
            None
        );
    }
}
