use axum::{
    extract::State,
    http::header::{COOKIE, SET_COOKIE},
    http::HeaderMap,
    response::{AppendHeaders, IntoResponse},
    routing::{get, post},
    Router,
};
use serde::Serialize;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::access::{self, route_for, Role};
use crate::error::{ApiError, ApiResult, Envelope};
use crate::session::extractor::{token_from_cookie_header, Session, SESSION_COOKIE};
use crate::state::AppState;

/// Cookies cleared on logout alongside the session itself.
const RELATED_COOKIES: &[&str] = &["focal_view_mode"];

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/auth/session", get(session_info))
        .route("/auth/logout", post(logout))
}

#[derive(Debug, Serialize)]
pub struct SessionInfo {
    pub id: Uuid,
    pub email: String,
    pub verified: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dashboard: Option<&'static str>,
}

/// Who am I: principal plus resolved role and canonical dashboard route.
/// A not-yet-provisioned account still gets a successful answer, just
/// without a role.
#[instrument(skip(state, session))]
pub async fn session_info(
    State(state): State<AppState>,
    session: Session,
) -> ApiResult<SessionInfo> {
    let principal = session.principal;
    let (role, dashboard) = match access::authorize(&state, &principal, None).await {
        Ok(grant) => (Some(grant.role), Some(route_for(grant.role))),
        Err(ApiError::NotProvisioned) => (None, None),
        Err(e) => return Err(e),
    };

    Ok(Envelope::ok(SessionInfo {
        id: principal.id,
        email: principal.email,
        verified: principal.verified,
        role,
        dashboard,
    }))
}

#[derive(Debug, Serialize)]
pub struct LogoutAck {
    pub signed_out: bool,
}

/// Destroys the provider-side session when one exists and tells the
/// caller to drop every credential cookie. Idempotent: no session is
/// still a success and clears nothing that exists.
#[instrument(skip(state, headers))]
pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> impl IntoResponse {
    let token = token_from_cookie_header(headers.get(COOKIE).and_then(|h| h.to_str().ok()));

    let mut signed_out = false;
    if let Some(token) = token {
        match state.auth.sign_out(&token).await {
            Ok(()) => {
                signed_out = true;
                info!("provider session invalidated");
            }
            // Best effort: the cookies get cleared regardless.
            Err(e) => warn!(error = %e, "provider sign_out failed"),
        }
    }

    let mut clear = vec![expired_cookie(SESSION_COOKIE)];
    clear.extend(RELATED_COOKIES.iter().map(|name| expired_cookie(name)));
    let headers: Vec<_> = clear.into_iter().map(|c| (SET_COOKIE, c)).collect();

    (AppendHeaders(headers), Envelope::ok(LogoutAck { signed_out }))
}

fn expired_cookie(name: &str) -> String {
    format!("{name}=; Path=/; Max-Age=0; HttpOnly; SameSite=Lax")
}
