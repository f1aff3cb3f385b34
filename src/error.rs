use axum::{http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

/// Uniform response envelope: `{success, data}` on the happy path,
/// `{success: false, error}` otherwise.
#[derive(Debug, Serialize)]
pub struct Envelope<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T: Serialize> Envelope<T> {
    pub fn ok(data: T) -> Json<Self> {
        Json(Self {
            success: true,
            data: Some(data),
            error: None,
        })
    }
}

pub type ApiResult<T> = Result<Json<Envelope<T>>, ApiError>;

/// Error taxonomy for every handler. The HTTP status carries the
/// authoritative class; the message is safe to show to callers.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("authentication required")]
    Unauthenticated,
    #[error("not permitted")]
    Forbidden,
    /// Valid credential but no profile row yet. Expected for freshly
    /// created accounts, so it carries a stable message the frontend can
    /// branch on instead of a generic failure.
    #[error("profile not provisioned")]
    NotProvisioned,
    #[error("invalid webhook signature")]
    BadSignature,
    #[error("{0}")]
    Validation(String),
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("{0}")]
    Conflict(String),
    #[error("upstream service unavailable")]
    Upstream(anyhow::Error),
    #[error("internal error")]
    Internal(anyhow::Error),
}

impl From<anyhow::Error> for ApiError {
    fn from(e: anyhow::Error) -> Self {
        Self::Internal(e)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Unauthenticated | Self::BadSignature => StatusCode::UNAUTHORIZED,
            Self::Forbidden | Self::NotProvisioned => StatusCode::FORBIDDEN,
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Upstream(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        // Operator detail stays in the logs; the body gets the safe message.
        match &self {
            ApiError::Upstream(source) => error!(error = %source, "upstream failure"),
            ApiError::Internal(source) => error!(error = %source, "unexpected failure"),
            _ => {}
        }
        let body: Envelope<()> = Envelope {
            success: false,
            data: None,
            error: Some(self.to_string()),
        };
        (self.status(), Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping_follows_taxonomy() {
        assert_eq!(ApiError::Unauthenticated.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError::BadSignature.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError::Forbidden.status(), StatusCode::FORBIDDEN);
        assert_eq!(ApiError::NotProvisioned.status(), StatusCode::FORBIDDEN);
        assert_eq!(
            ApiError::Validation("bad".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(ApiError::NotFound("gallery").status(), StatusCode::NOT_FOUND);
        assert_eq!(
            ApiError::Conflict("dup".into()).status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ApiError::Internal(anyhow::anyhow!("boom")).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn not_provisioned_keeps_its_distinct_message() {
        assert_eq!(
            ApiError::NotProvisioned.to_string(),
            "profile not provisioned"
        );
        assert_ne!(
            ApiError::NotProvisioned.to_string(),
            ApiError::Forbidden.to_string()
        );
    }

    #[test]
    fn envelope_shapes() {
        let ok = serde_json::to_value(Envelope::ok(serde_json::json!({"n": 1})).0).unwrap();
        assert_eq!(ok["success"], true);
        assert_eq!(ok["data"]["n"], 1);
        assert!(ok.get("error").is_none());

        let err: Envelope<()> = Envelope {
            success: false,
            data: None,
            error: Some("not permitted".into()),
        };
        let err = serde_json::to_value(err).unwrap();
        assert_eq!(err["success"], false);
        assert_eq!(err["error"], "not permitted");
        assert!(err.get("data").is_none());
    }
}
