pub mod orientation;
pub mod probe;
pub mod remux;
pub mod storage;
pub mod upload_session;
pub mod video_pipeline;
pub mod video_repository;
