use axum::{
    extract::{Path, Query, State},
    response::Redirect,
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::access::{self, Role};
use crate::error::{ApiError, ApiResult, Envelope};
use crate::galleries::dto::{CreateGalleryRequest, Pagination};
use crate::galleries::repo::{self, Gallery};
use crate::session::Session;
use crate::state::AppState;

const COVER_URL_TTL_SECS: u64 = 600;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/galleries", get(list_galleries))
        .route("/galleries", post(create_gallery))
        .route("/galleries/:id", get(get_gallery))
        .route("/galleries/:id/cover", get(get_cover))
}

/// Photographers list what they own; clients list what was granted to
/// their email. Admin gets the owner view over their own id, which is
/// normally empty.
#[instrument(skip(state, session))]
pub async fn list_galleries(
    State(state): State<AppState>,
    session: Session,
    Query(p): Query<Pagination>,
) -> ApiResult<Vec<Gallery>> {
    let grant = access::authorize(&state, &session.principal, None).await?;
    let rows = match grant.role {
        Role::Client => {
            repo::list_granted(&state.db, &session.principal.email, p.limit, p.offset).await
        }
        Role::Photographer | Role::Admin => {
            repo::list_for_photographer(&state.db, grant.profile.id, p.limit, p.offset).await
        }
    }
    .map_err(ApiError::Internal)?;
    Ok(Envelope::ok(rows))
}

#[instrument(skip(state, session, payload))]
pub async fn create_gallery(
    State(state): State<AppState>,
    session: Session,
    Json(payload): Json<CreateGalleryRequest>,
) -> ApiResult<Gallery> {
    let grant =
        access::authorize(&state, &session.principal, Some(Role::Photographer)).await?;

    let title = payload.title.trim();
    if title.is_empty() {
        return Err(ApiError::Validation("title is required".into()));
    }

    let client_email = payload.client_email.as_deref().map(str::to_lowercase);
    let created = repo::create(
        &state.db,
        grant.profile.id,
        title,
        client_email.as_deref(),
        payload.cover_key.as_deref(),
    )
    .await
    .map_err(ApiError::Internal)?;

    info!(gallery_id = %created.id, photographer_id = %grant.profile.id, "gallery created");
    Ok(Envelope::ok(created))
}

#[instrument(skip(state, session))]
pub async fn get_gallery(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<Uuid>,
) -> ApiResult<Gallery> {
    let gallery = find_visible(&state, &session, id).await?;
    Ok(Envelope::ok(gallery))
}

/// 302 to a short-lived presigned URL for the cover asset.
#[instrument(skip(state, session))]
pub async fn get_cover(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<Uuid>,
) -> Result<Redirect, ApiError> {
    let gallery = find_visible(&state, &session, id).await?;
    let key = gallery.cover_key.ok_or(ApiError::NotFound("cover"))?;
    let url = state
        .storage
        .presign_get(&key, COVER_URL_TTL_SECS)
        .await
        .map_err(ApiError::Internal)?;
    Ok(Redirect::temporary(&url))
}

/// Visibility: owner, granted client, or admin. Anything else is a 404,
/// not a 403, so existence is not leaked.
async fn find_visible(
    state: &AppState,
    session: &Session,
    id: Uuid,
) -> Result<Gallery, ApiError> {
    let grant = access::authorize(state, &session.principal, None).await?;
    let found = match grant.role {
        Role::Photographer => repo::find_owned(&state.db, id, grant.profile.id).await,
        Role::Client => repo::find_granted(&state.db, id, &session.principal.email).await,
        Role::Admin => repo::find_by_id(&state.db, id).await,
    }
    .map_err(ApiError::Internal)?;
    found.ok_or(ApiError::NotFound("gallery"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    #[tokio::test]
    async fn gallery_routes_require_a_session() {
        for uri in [
            "/galleries",
            "/galleries/4b6e108a-9999-4b58-9a23-5a1a2f1a0001",
            "/galleries/4b6e108a-9999-4b58-9a23-5a1a2f1a0001/cover",
        ] {
            let app = router().with_state(AppState::fake());
            let resp = app
                .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
                .await
                .unwrap();
            assert_eq!(resp.status(), StatusCode::UNAUTHORIZED, "uri {uri}");
        }
    }
}
