pub mod api;
pub mod config;
pub mod entities;
pub mod infrastructure;
pub mod services;
pub mod utils;

use crate::config::AppConfig;
use crate::services::video_pipeline::VideoPipeline;
use crate::services::video_repository::VideoRepository;
use axum::{
    Json, Router,
    middleware::{from_fn, from_fn_with_state},
    routing::{delete, get, post},
};
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        api::handlers::health::health_check,
        api::handlers::videos::create_video,
        api::handlers::videos::list_videos,
        api::handlers::videos::get_video,
        api::handlers::videos::delete_video,
        api::handlers::video_upload::upload_video,
    ),
    components(
        schemas(
            api::handlers::health::HealthResponse,
            api::handlers::videos::VideoResponse,
            api::handlers::videos::CreateVideoRequest,
            api::handlers::video_upload::UploadVideoResponse,
        )
    ),
    tags(
        (name = "videos", description = "Video metadata and upload endpoints"),
        (name = "system", description = "Service status")
    )
)]
pub struct ApiDoc;

#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub videos: Arc<dyn VideoRepository>,
    pub pipeline: Arc<VideoPipeline>,
    pub config: AppConfig,
}

pub fn create_app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(api::handlers::health::health_check))
        .route(
            "/api-docs/openapi.json",
            get(|| async { Json(ApiDoc::openapi()) }),
        )
        .route(
            "/api/videos",
            post(api::handlers::videos::create_video)
                .get(api::handlers::videos::list_videos)
                .layer(from_fn_with_state(
                    state.clone(),
                    api::middleware::auth::auth_middleware,
                )),
        )
        .route(
            "/api/videos/:videoID",
            get(api::handlers::videos::get_video).merge(
                delete(api::handlers::videos::delete_video).layer(from_fn_with_state(
                    state.clone(),
                    api::middleware::auth::auth_middleware,
                )),
            ),
        )
        .route(
            "/api/video_upload/:videoID",
            post(api::handlers::video_upload::upload_video)
                .layer(axum::extract::DefaultBodyLimit::max(
                    state.config.max_upload_size + 10 * 1024 * 1024, // Add 10MB buffer for multipart overhead
                ))
                .layer(from_fn_with_state(
                    state.clone(),
                    api::middleware::auth::auth_middleware,
                )),
        )
        .layer(from_fn(api::middleware::request_id::request_id_middleware))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
                .expose_headers(Any),
        )
        .with_state(state)
}
