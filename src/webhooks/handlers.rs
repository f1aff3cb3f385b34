use axum::{body::Bytes, extract::State, http::HeaderMap, routing::post, Router};
use serde::Serialize;
use tracing::instrument;

use crate::error::{ApiResult, Envelope};
use crate::state::AppState;
use crate::webhooks::ingest::{ingest, Outcome};

pub const SIGNATURE_HEADER: &str = "focal-signature";

pub fn router() -> Router<AppState> {
    Router::new().route("/webhooks/payments", post(receive_payment_webhook))
}

#[derive(Debug, Serialize)]
pub struct IngestAck {
    pub status: &'static str,
}

/// Provider-authenticated, not user-authenticated: provenance comes from
/// the signature header, never from a session. Duplicates and unknown
/// types are acknowledged with 2xx so the provider stops retrying.
#[instrument(skip(state, headers, body))]
pub async fn receive_payment_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<IngestAck> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok());

    let outcome = ingest(&state, &body, signature).await?;
    let status = match outcome {
        Outcome::Applied => "applied",
        Outcome::Duplicate => "duplicate",
        Outcome::Ignored => "ignored",
    };
    Ok(Envelope::ok(IngestAck { status }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::webhooks::signature::sign;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use time::OffsetDateTime;
    use tower::ServiceExt;

    fn app() -> Router {
        router().with_state(AppState::fake())
    }

    fn valid_header(body: &str) -> String {
        sign(
            "whsec_test123secret456",
            body.as_bytes(),
            OffsetDateTime::now_utc().unix_timestamp(),
        )
    }

    #[tokio::test]
    async fn unsigned_request_is_unauthorized() {
        let resp = app()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/webhooks/payments")
                    .body(Body::from(r#"{"id":"evt_1","type":"invoice.paid"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn tampered_signature_is_unauthorized() {
        let body = r#"{"id":"evt_1","type":"invoice.paid","data":{"subscription_id":"sub_1"}}"#;
        let header = valid_header(r#"{"id":"evt_other"}"#);
        let resp = app()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/webhooks/payments")
                    .header(SIGNATURE_HEADER, header)
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn unknown_event_type_is_acknowledged() {
        let body = r#"{"id":"evt_2","type":"customer.created","data":{}}"#;
        let resp = app()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/webhooks/payments")
                    .header(SIGNATURE_HEADER, valid_header(body))
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["data"]["status"], "ignored");
    }
}
