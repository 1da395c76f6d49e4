use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info};
use uuid::Uuid;

use crate::entities::videos;
use crate::services::orientation::{Orientation, OrientationError, classify};
use crate::services::probe::MediaProber;
use crate::services::remux::Remuxer;
use crate::services::storage::{StorageKey, StorageService};
use crate::services::upload_session::UploadSession;
use crate::services::video_repository::VideoRepository;

/// Stages of one upload run, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    Received,
    Probed,
    Classified,
    Remuxed,
    Uploaded,
    Persisted,
}

impl PipelineStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineStage::Received => "received",
            PipelineStage::Probed => "probed",
            PipelineStage::Classified => "classified",
            PipelineStage::Remuxed => "remuxed",
            PipelineStage::Uploaded => "uploaded",
            PipelineStage::Persisted => "persisted",
        }
    }
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Ownership(String),

    #[error("{0}")]
    NotFound(String),

    /// `stage` is the state the run failed to reach.
    #[error("failed to reach '{stage}': {cause:#}")]
    ExternalTool {
        stage: PipelineStage,
        cause: anyhow::Error,
    },

    #[error("unclassifiable media: {0}")]
    Classification(#[from] OrientationError),

    #[error("storage upload failed: {0:#}")]
    Storage(anyhow::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("metadata store failed: {0}")]
    Persistence(#[from] sea_orm::DbErr),
}

/// Sequences probe, classify, remux, upload and the metadata write for one
/// upload. Collaborators are injected so each can be replaced in tests.
pub struct VideoPipeline {
    videos: Arc<dyn VideoRepository>,
    prober: Arc<dyn MediaProber>,
    remuxer: Arc<dyn Remuxer>,
    storage: Arc<dyn StorageService>,
}

impl VideoPipeline {
    pub fn new(
        videos: Arc<dyn VideoRepository>,
        prober: Arc<dyn MediaProber>,
        remuxer: Arc<dyn Remuxer>,
        storage: Arc<dyn StorageService>,
    ) -> Self {
        Self {
            videos,
            prober,
            remuxer,
            storage,
        }
    }

    /// Resolves the target video and checks the caller owns it. Runs before
    /// the request body is read.
    pub async fn authorize(
        &self,
        video_id: Uuid,
        user_id: Uuid,
    ) -> Result<videos::Model, PipelineError> {
        let video = self
            .videos
            .get_video(video_id)
            .await?
            .ok_or_else(|| PipelineError::NotFound(format!("No video with id {}", video_id)))?;

        if video.user_id != user_id.to_string() {
            return Err(PipelineError::Ownership(
                "You do not have permission to upload to this video".to_string(),
            ));
        }

        Ok(video)
    }

    /// Runs every stage after `Received`. The session, and with it every
    /// temporary file, is dropped when this returns.
    pub async fn run(
        &self,
        video: videos::Model,
        session: UploadSession,
    ) -> Result<String, PipelineError> {
        let video_id = video.id.clone();
        let result = self.process(video, session).await;
        if let Err(e) = &result {
            error!(video_id = %video_id, "Video pipeline failed: {}", e);
        }
        result
    }

    async fn process(
        &self,
        mut video: videos::Model,
        mut session: UploadSession,
    ) -> Result<String, PipelineError> {
        let video_id = Uuid::parse_str(&video.id)
            .map_err(|_| PipelineError::NotFound(format!("Malformed video id {}", video.id)))?;
        info!(video_id = %video_id, stage = %PipelineStage::Received, "Upload stored at {}", session.raw_path().display());

        let geometry = self
            .prober
            .probe(session.raw_path())
            .await
            .map_err(|cause| PipelineError::ExternalTool {
                stage: PipelineStage::Probed,
                cause,
            })?;
        info!(video_id = %video_id, stage = %PipelineStage::Probed, "Geometry {}x{}", geometry.width, geometry.height);

        let orientation: Orientation = classify(geometry)?;
        info!(video_id = %video_id, stage = %PipelineStage::Classified, "Orientation {}", orientation);

        let processed = self
            .remuxer
            .remux(session.raw_path())
            .await
            .map_err(|cause| PipelineError::ExternalTool {
                stage: PipelineStage::Remuxed,
                cause,
            })?;
        session.adopt_processed(processed);
        info!(video_id = %video_id, stage = %PipelineStage::Remuxed, "Fast-start copy ready");

        let key = StorageKey::new(orientation, video_id, session.extension());
        let file = session.open_processed().await?;
        self.storage
            .upload_file(&key, file, session.media_type())
            .await
            .map_err(PipelineError::Storage)?;
        let url = self.storage.object_url(&key);
        info!(video_id = %video_id, stage = %PipelineStage::Uploaded, "Uploaded to {}", key);

        video.video_url = Some(url.clone());
        self.videos.update_video(video).await?;
        info!(video_id = %video_id, stage = %PipelineStage::Persisted, "Video URL saved");

        Ok(url)
    }
}
