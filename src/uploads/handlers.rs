use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, Path, State},
    routing::{get, post, put},
    Json, Router,
};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::access::{self, Role};
use crate::error::{ApiError, ApiResult, Envelope};
use crate::session::Session;
use crate::state::AppState;
use crate::uploads::dto::{
    validate_chunk_index, validate_total_chunks, ChunkAck, CreateUploadRequest, UploadStatus,
};
use crate::uploads::repo::{self, UploadManifest};

const MAX_CHUNK_BYTES: usize = 20 * 1024 * 1024;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/uploads", post(create_upload))
        .route("/uploads/:id", get(get_upload))
        .route("/uploads/:id/complete", post(complete_upload))
        .route(
            "/uploads/:id/chunks/:index",
            put(put_chunk).layer(DefaultBodyLimit::max(MAX_CHUNK_BYTES)),
        )
}

#[instrument(skip(state, session, payload))]
pub async fn create_upload(
    State(state): State<AppState>,
    session: Session,
    Json(payload): Json<CreateUploadRequest>,
) -> ApiResult<UploadManifest> {
    let grant =
        access::authorize(&state, &session.principal, Some(Role::Photographer)).await?;
    validate_total_chunks(payload.total_chunks).map_err(ApiError::Validation)?;

    let content_type = payload
        .content_type
        .unwrap_or_else(|| "application/octet-stream".into());
    let manifest =
        repo::insert_manifest(&state.db, grant.profile.id, payload.total_chunks, &content_type)
            .await
            .map_err(ApiError::Internal)?;

    info!(upload_id = %manifest.id, total_chunks = manifest.total_chunks, "upload manifest created");
    Ok(Envelope::ok(manifest))
}

/// Stores the raw chunk body, then records the index in the manifest's
/// received set. Redelivering a chunk overwrites the same key and
/// re-records the same index, so retries are safe.
#[instrument(skip(state, session, body))]
pub async fn put_chunk(
    State(state): State<AppState>,
    session: Session,
    Path((id, index)): Path<(Uuid, i32)>,
    body: Bytes,
) -> ApiResult<ChunkAck> {
    let grant =
        access::authorize(&state, &session.principal, Some(Role::Photographer)).await?;
    let manifest = repo::find_manifest(&state.db, id, grant.profile.id)
        .await
        .map_err(ApiError::Internal)?
        .ok_or(ApiError::NotFound("upload"))?;

    validate_chunk_index(index, manifest.total_chunks).map_err(ApiError::Validation)?;
    if manifest.completed_at.is_some() {
        return Err(ApiError::Conflict("upload already completed".into()));
    }
    if body.is_empty() {
        return Err(ApiError::Validation("chunk body is empty".into()));
    }

    let key = chunk_key(grant.profile.id, id, index);
    let size = body.len() as i64;
    state
        .storage
        .put_object(&key, body, &manifest.content_type)
        .await
        .map_err(ApiError::Internal)?;
    repo::record_chunk(&state.db, id, index, size)
        .await
        .map_err(ApiError::Internal)?;

    let received = repo::count_received(&state.db, id)
        .await
        .map_err(ApiError::Internal)?;
    Ok(Envelope::ok(ChunkAck {
        chunk_index: index,
        received,
        total_chunks: manifest.total_chunks,
    }))
}

/// Completion succeeds only when every index has been received; the
/// stamp is idempotent.
#[instrument(skip(state, session))]
pub async fn complete_upload(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<Uuid>,
) -> ApiResult<UploadStatus> {
    let grant =
        access::authorize(&state, &session.principal, Some(Role::Photographer)).await?;
    let manifest = repo::find_manifest(&state.db, id, grant.profile.id)
        .await
        .map_err(ApiError::Internal)?
        .ok_or(ApiError::NotFound("upload"))?;

    let received = repo::count_received(&state.db, id)
        .await
        .map_err(ApiError::Internal)?;
    if received < i64::from(manifest.total_chunks) {
        return Err(ApiError::Validation(format!(
            "{received} of {} chunks received",
            manifest.total_chunks
        )));
    }

    repo::mark_completed(&state.db, id)
        .await
        .map_err(ApiError::Internal)?;
    status_of(&state, id, grant.profile.id).await
}

#[instrument(skip(state, session))]
pub async fn get_upload(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<Uuid>,
) -> ApiResult<UploadStatus> {
    let grant =
        access::authorize(&state, &session.principal, Some(Role::Photographer)).await?;
    status_of(&state, id, grant.profile.id).await
}

async fn status_of(state: &AppState, id: Uuid, owner_id: Uuid) -> ApiResult<UploadStatus> {
    let manifest = repo::find_manifest(&state.db, id, owner_id)
        .await
        .map_err(ApiError::Internal)?
        .ok_or(ApiError::NotFound("upload"))?;
    let received = repo::received_indices(&state.db, id)
        .await
        .map_err(ApiError::Internal)?;
    Ok(Envelope::ok(UploadStatus { manifest, received }))
}

fn chunk_key(owner_id: Uuid, upload_id: Uuid, index: i32) -> String {
    format!("uploads/{owner_id}/{upload_id}/{index:05}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    #[test]
    fn chunk_keys_sort_lexicographically() {
        let owner = Uuid::new_v4();
        let upload = Uuid::new_v4();
        let k1 = chunk_key(owner, upload, 2);
        let k2 = chunk_key(owner, upload, 10);
        assert!(k1.ends_with("/00002"));
        assert!(k2.ends_with("/00010"));
        assert!(k1 < k2);
    }

    #[tokio::test]
    async fn upload_routes_require_a_session() {
        let app = router().with_state(AppState::fake());
        let resp = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/uploads")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"total_chunks":3}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }
}
