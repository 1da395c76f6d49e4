use crate::AppState;
use crate::api::error::AppError;
use crate::entities::videos;
use crate::services::video_repository::CreateVideoParams;
use crate::utils::auth::Claims;
use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Serialize, ToSchema)]
pub struct VideoResponse {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub title: String,
    pub description: String,
    pub thumbnail_url: Option<String>,
    pub video_url: Option<String>,
    pub user_id: String,
}

impl From<videos::Model> for VideoResponse {
    fn from(m: videos::Model) -> Self {
        Self {
            id: m.id,
            created_at: m.created_at,
            updated_at: m.updated_at,
            title: m.title,
            description: m.description,
            thumbnail_url: m.thumbnail_url,
            video_url: m.video_url,
            user_id: m.user_id,
        }
    }
}

#[derive(Deserialize, ToSchema)]
pub struct CreateVideoRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
}

pub(crate) fn parse_video_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw).map_err(|_| AppError::BadRequest("Invalid video ID".to_string()))
}

pub(crate) fn caller_id(claims: &Claims) -> Result<Uuid, AppError> {
    claims
        .user_id()
        .ok_or_else(|| AppError::Unauthorized("Invalid user ID in token".to_string()))
}

#[utoipa::path(
    post,
    path = "/api/videos",
    request_body = CreateVideoRequest,
    responses(
        (status = 201, description = "Video created", body = VideoResponse),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("jwt" = [])
    ),
    tag = "videos"
)]
pub async fn create_video(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CreateVideoRequest>,
) -> Result<(StatusCode, Json<VideoResponse>), AppError> {
    let user_id = caller_id(&claims)?;

    if req.title.trim().is_empty() {
        return Err(AppError::BadRequest("Title is required".to_string()));
    }

    let video = state
        .videos
        .create_video(CreateVideoParams {
            title: req.title,
            description: req.description,
            user_id,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(video.into())))
}

#[utoipa::path(
    get,
    path = "/api/videos",
    responses(
        (status = 200, description = "Videos owned by the caller", body = Vec<VideoResponse>),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("jwt" = [])
    ),
    tag = "videos"
)]
pub async fn list_videos(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Vec<VideoResponse>>, AppError> {
    let user_id = caller_id(&claims)?;
    let videos = state.videos.list_videos(user_id).await?;
    Ok(Json(videos.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    get,
    path = "/api/videos/{videoID}",
    params(
        ("videoID" = String, Path, description = "Video ID")
    ),
    responses(
        (status = 200, description = "Video metadata", body = VideoResponse),
        (status = 400, description = "Invalid video ID"),
        (status = 404, description = "Video not found")
    ),
    tag = "videos"
)]
pub async fn get_video(
    State(state): State<AppState>,
    Path(video_id): Path<String>,
) -> Result<Json<VideoResponse>, AppError> {
    let video_id = parse_video_id(&video_id)?;
    let video = state
        .videos
        .get_video(video_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Couldn't get video".to_string()))?;

    Ok(Json(video.into()))
}

#[utoipa::path(
    delete,
    path = "/api/videos/{videoID}",
    params(
        ("videoID" = String, Path, description = "Video ID")
    ),
    responses(
        (status = 204, description = "Video deleted"),
        (status = 403, description = "Caller does not own the video"),
        (status = 404, description = "Video not found")
    ),
    security(
        ("jwt" = [])
    ),
    tag = "videos"
)]
pub async fn delete_video(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(video_id): Path<String>,
) -> Result<StatusCode, AppError> {
    let video_id = parse_video_id(&video_id)?;
    let user_id = caller_id(&claims)?;

    let video = state
        .videos
        .get_video(video_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Couldn't get video".to_string()))?;

    if video.user_id != user_id.to_string() {
        return Err(AppError::Forbidden("You can't delete this video".to_string()));
    }

    state.videos.delete_video(video_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
