//! Video handlers: upload, listing, playback URL and status.

use axum::extract::{Multipart, Path, State};
use axum::Json;
use serde::Serialize;
use tracing::info;

use vhub_models::{ModerationJob, VideoId, VideoRecord, VideoStatus};
use vhub_storage::object_key;

use crate::auth::AuthUser;
use crate::error::{ApiError, ApiResult};
use crate::metrics;
use crate::state::AppState;

/// Response for a successful upload.
#[derive(Debug, Serialize)]
pub struct UploadResponse {
    #[serde(rename = "videoId")]
    pub video_id: VideoId,
}

/// Response for the playback URL route.
#[derive(Debug, Serialize)]
pub struct UrlResponse {
    pub url: String,
}

/// Response for the status read path.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: VideoStatus,
    pub progress: u8,
}

/// `POST /videos/upload`
///
/// Stores the payload, creates the record and enqueues the moderation job;
/// responds as soon as the job is queued, never waiting for processing.
/// Editors and admins only.
pub async fn upload_video(
    State(state): State<AppState>,
    auth: AuthUser,
    mut multipart: Multipart,
) -> ApiResult<Json<UploadResponse>> {
    if !auth.role.can_upload() {
        return Err(ApiError::forbidden("Uploading requires the editor role"));
    }

    // Reserve a queue slot before any side effects: overflow must surface
    // without creating a record or storing a payload.
    let permit = state.queue.reserve()?;

    let mut upload: Option<(String, String, Vec<u8>)> = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("Invalid multipart body: {}", e)))?
    {
        if field.name() != Some("video") {
            continue;
        }

        let filename = field
            .file_name()
            .unwrap_or("upload.mp4")
            .to_string();
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let data = field
            .bytes()
            .await
            .map_err(|e| ApiError::bad_request(format!("Failed to read upload: {}", e)))?;

        upload = Some((filename, content_type, data.to_vec()));
        break;
    }

    let Some((filename, content_type, data)) = upload else {
        return Err(ApiError::bad_request("No file uploaded"));
    };

    if !content_type.starts_with("video/") {
        return Err(ApiError::bad_request("Only video files allowed"));
    }
    if data.is_empty() {
        return Err(ApiError::bad_request("No file uploaded"));
    }

    let key = object_key(&auth.tenant_id, &filename);
    let stored = state.media.put(&key, data, &content_type).await?;

    let record = VideoRecord::new(
        VideoId::new(),
        &auth.tenant_id,
        &filename,
        &stored.url,
        &stored.key,
    );
    let video_id = record.video_id.clone();
    state.store.create(record).await?;

    permit.enqueue(ModerationJob::new(video_id.clone(), &auth.tenant_id));
    metrics::record_job_enqueued();
    metrics::set_queue_depth(state.queue.len());

    info!(video_id = %video_id, tenant = %auth.tenant_id, "Upload accepted");

    Ok(Json(UploadResponse { video_id }))
}

/// `GET /videos` — the caller's videos, newest first.
pub async fn list_videos(
    State(state): State<AppState>,
    auth: AuthUser,
) -> ApiResult<Json<Vec<VideoRecord>>> {
    let videos = state.store.list_by_tenant(&auth.tenant_id).await?;
    Ok(Json(videos))
}

/// `GET /videos/:video_id/url` — playback locator for an owned video.
pub async fn get_video_url(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(video_id): Path<String>,
) -> ApiResult<Json<UrlResponse>> {
    let record = owned_record(&state, &auth, &video_id).await?;
    Ok(Json(UrlResponse {
        url: record.media_url,
    }))
}

/// `GET /videos/:video_id/status` — current status and progress.
///
/// The re-fetch path clients use on (re)connect, since live events are not
/// replayed.
pub async fn get_video_status(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(video_id): Path<String>,
) -> ApiResult<Json<StatusResponse>> {
    let record = owned_record(&state, &auth, &video_id).await?;
    Ok(Json(StatusResponse {
        status: record.status,
        progress: record.progress,
    }))
}

/// Fetch a record, hiding other tenants' videos behind a 404.
async fn owned_record(
    state: &AppState,
    auth: &AuthUser,
    video_id: &str,
) -> ApiResult<VideoRecord> {
    let id = VideoId::from_string(video_id);
    match state.store.get(&id).await? {
        Some(record) if record.tenant_id == auth.tenant_id => Ok(record),
        _ => Err(ApiError::not_found("Video not found")),
    }
}
