use axum::{
    extract::{Query, State},
    routing::get,
    Router,
};
use serde::Deserialize;
use tracing::instrument;

use crate::access::{self, Role};
use crate::admin::repo::{self, Overview};
use crate::error::{ApiError, ApiResult, Envelope};
use crate::providers::auth::Principal;
use crate::session::Session;
use crate::state::AppState;
use crate::webhooks::repo::{recent_events, WebhookEventRow};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/admin/overview", get(get_overview))
        .route("/admin/webhooks", get(list_webhooks))
        .route("/admin/users", get(list_users))
}

#[derive(Debug, Deserialize)]
pub struct EventQuery {
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_limit() -> i64 {
    50
}

#[instrument(skip(state, session))]
pub async fn get_overview(
    State(state): State<AppState>,
    session: Session,
) -> ApiResult<Overview> {
    access::authorize(&state, &session.principal, Some(Role::Admin)).await?;
    let overview = repo::overview(&state.db).await.map_err(ApiError::Internal)?;
    Ok(Envelope::ok(overview))
}

/// Administrative inspection of the webhook audit trail. Processing
/// itself never goes through this gate.
#[instrument(skip(state, session))]
pub async fn list_webhooks(
    State(state): State<AppState>,
    session: Session,
    Query(q): Query<EventQuery>,
) -> ApiResult<Vec<WebhookEventRow>> {
    access::authorize(&state, &session.principal, Some(Role::Admin)).await?;
    let rows = recent_events(&state.db, q.limit.clamp(1, 500))
        .await
        .map_err(ApiError::Internal)?;
    Ok(Envelope::ok(rows))
}

#[instrument(skip(state, session))]
pub async fn list_users(
    State(state): State<AppState>,
    session: Session,
) -> ApiResult<Vec<Principal>> {
    access::authorize(&state, &session.principal, Some(Role::Admin)).await?;
    let users = state
        .auth
        .list_users()
        .await
        .map_err(|e| ApiError::Upstream(anyhow::anyhow!(e)))?;
    Ok(Envelope::ok(users))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    #[tokio::test]
    async fn admin_routes_require_a_session() {
        for uri in ["/admin/overview", "/admin/webhooks", "/admin/users"] {
            let app = router().with_state(AppState::fake());
            let resp = app
                .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
                .await
                .unwrap();
            assert_eq!(resp.status(), StatusCode::UNAUTHORIZED, "uri {uri}");
        }
    }
}
