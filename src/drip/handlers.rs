use axum::{
    extract::State,
    http::{header::AUTHORIZATION, HeaderMap},
    routing::post,
    Router,
};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use tracing::instrument;

use crate::drip::job::{run_batch, DripSummary};
use crate::error::{ApiError, ApiResult, Envelope};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/jobs/drip-run", post(trigger_drip_run))
}

/// Invoked by the external scheduler, guarded by a shared-secret bearer
/// header when one is configured.
#[instrument(skip(state, headers))]
pub async fn trigger_drip_run(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<DripSummary> {
    let presented = headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok());
    if !trigger_authorized(presented, state.config.jobs.secret.as_deref()) {
        return Err(ApiError::Unauthenticated);
    }

    let summary = run_batch(&state).await.map_err(ApiError::Internal)?;
    Ok(Envelope::ok(summary))
}

fn trigger_authorized(presented: Option<&str>, secret: Option<&str>) -> bool {
    match secret {
        None => true,
        Some(secret) => presented
            .and_then(|h| h.strip_prefix("Bearer "))
            .is_some_and(|token| constant_time_eq(token.as_bytes(), secret.as_bytes())),
    }
}

/// Double-HMAC compare: MACing both sides under a fixed key reduces the
/// comparison to `verify_slice`, which is constant-time.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    const COMPARE_KEY: &[u8] = b"focal.jobs.trigger";
    let tag = match Hmac::<Sha256>::new_from_slice(COMPARE_KEY) {
        Ok(mut mac) => {
            mac.update(a);
            mac.finalize().into_bytes()
        }
        Err(_) => return false,
    };
    match Hmac::<Sha256>::new_from_slice(COMPARE_KEY) {
        Ok(mut mac) => {
            mac.update(b);
            mac.verify_slice(&tag).is_ok()
        }
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    #[test]
    fn trigger_guard_matches_bearer_secret() {
        assert!(trigger_authorized(None, None));
        assert!(trigger_authorized(Some("Bearer s3cret"), Some("s3cret")));
        assert!(!trigger_authorized(Some("Bearer wrong"), Some("s3cret")));
        assert!(!trigger_authorized(Some("s3cret"), Some("s3cret")));
        assert!(!trigger_authorized(None, Some("s3cret")));
    }

    #[test]
    fn secret_compare_handles_prefixes_and_lengths() {
        assert!(constant_time_eq(b"s3cret", b"s3cret"));
        assert!(!constant_time_eq(b"s3cret", b"s3cret-with-suffix"));
        assert!(!constant_time_eq(b"s3cre", b"s3cret"));
        assert!(!constant_time_eq(b"", b"s3cret"));
        assert!(constant_time_eq(b"", b""));
    }

    #[tokio::test]
    async fn unauthorized_trigger_is_rejected() {
        let app = router().with_state(AppState::fake());
        let resp = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/jobs/drip-run")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }
}
