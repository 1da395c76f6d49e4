use crate::AppState;
use crate::api::error::AppError;
use crate::api::handlers::videos::{caller_id, parse_video_id};
use crate::services::upload_session::receive_upload;
use crate::services::video_pipeline::PipelineError;
use crate::utils::auth::Claims;
use axum::{
    Extension, Json,
    extract::{Multipart, Path, State, multipart::MultipartRejection},
    http::StatusCode,
};
use serde::Serialize;
use tracing::info;
use utoipa::ToSchema;

#[derive(Serialize, ToSchema)]
pub struct UploadVideoResponse {
    pub video_url: String,
}

#[utoipa::path(
    post,
    path = "/api/video_upload/{videoID}",
    params(
        ("videoID" = String, Path, description = "Video ID")
    ),
    request_body(content = Object, description = "mp4 file in the `video` field", content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Video processed and stored", body = UploadVideoResponse),
        (status = 400, description = "Invalid ID, missing file or unsupported format"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Caller does not own the video"),
        (status = 404, description = "Video not found"),
        (status = 500, description = "Processing or storage failure")
    ),
    security(
        ("jwt" = [])
    ),
    tag = "videos"
)]
pub async fn upload_video(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(video_id): Path<String>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<(StatusCode, Json<UploadVideoResponse>), AppError> {
    let video_id = parse_video_id(&video_id)?;
    let user_id = caller_id(&claims)?;

    info!("Uploading video {} by user {}", video_id, user_id);

    // Ownership is settled before a single body byte hits the disk
    let video = state.pipeline.authorize(video_id, user_id).await?;

    let mut multipart = multipart.map_err(|rejection| {
        PipelineError::Validation(format!("Unable to parse form: {}", rejection.body_text()))
    })?;

    let session = receive_upload(
        &mut multipart,
        &state.config.temp_dir,
        state.config.max_upload_size,
    )
    .await?;

    let video_url = state.pipeline.run(video, session).await?;

    Ok((StatusCode::CREATED, Json(UploadVideoResponse { video_url })))
}
