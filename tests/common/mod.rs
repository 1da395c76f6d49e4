#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{Request, Response},
};
use http_body_util::BodyExt;
use sea_orm::{Database, DbErr};
use serde_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tempfile::TempDir;
use tokio::fs::File;
use tokio::io::AsyncReadExt;
use tower::ServiceExt;
use tubely::config::AppConfig;
use tubely::entities::videos;
use tubely::infrastructure::database::run_migrations;
use tubely::services::orientation::StreamGeometry;
use tubely::services::probe::MediaProber;
use tubely::services::remux::{Remuxer, processing_path};
use tubely::services::storage::{StorageKey, StorageService, object_url};
use tubely::services::video_pipeline::VideoPipeline;
use tubely::services::video_repository::{CreateVideoParams, SeaOrmVideoRepository, VideoRepository};
use tubely::utils::auth::create_jwt;
use tubely::{AppState, create_app};
use uuid::Uuid;

pub const JWT_SECRET: &str = "test_secret";
pub const BUCKET: &str = "tubely-test";
pub const REGION: &str = "us-east-2";

pub struct FakeProber {
    geometry: Option<StreamGeometry>,
    pub calls: AtomicUsize,
    pub seen: Mutex<Vec<PathBuf>>,
}

impl FakeProber {
    pub fn returning(width: u32, height: u32) -> Self {
        Self {
            geometry: Some(StreamGeometry::new(width, height)),
            calls: AtomicUsize::new(0),
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            geometry: None,
            calls: AtomicUsize::new(0),
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MediaProber for FakeProber {
    async fn probe(&self, path: &Path) -> anyhow::Result<StreamGeometry> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        assert!(path.exists(), "probe target must exist");
        self.seen.lock().unwrap().push(path.to_path_buf());
        self.geometry
            .ok_or_else(|| anyhow::anyhow!("ffprobe exited with exit status: 1"))
    }
}

pub struct FakeRemuxer {
    fail: bool,
    pub calls: AtomicUsize,
    pub outputs: Mutex<Vec<PathBuf>>,
}

impl FakeRemuxer {
    pub fn new() -> Self {
        Self {
            fail: false,
            calls: AtomicUsize::new(0),
            outputs: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Remuxer for FakeRemuxer {
    async fn remux(&self, path: &Path) -> anyhow::Result<PathBuf> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(anyhow::anyhow!("ffmpeg exited with exit status: 1"));
        }
        let output = processing_path(path);
        tokio::fs::copy(path, &output).await?;
        self.outputs.lock().unwrap().push(output.clone());
        Ok(output)
    }
}

pub struct MockStorageService {
    fail: bool,
    pub objects: Mutex<HashMap<String, (Vec<u8>, String)>>,
    pub uploads: AtomicUsize,
}

impl MockStorageService {
    pub fn new() -> Self {
        Self {
            fail: false,
            objects: Mutex::new(HashMap::new()),
            uploads: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new()
        }
    }

    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.objects.lock().unwrap().keys().cloned().collect();
        keys.sort();
        keys
    }

    pub fn object(&self, key: &str) -> Option<(Vec<u8>, String)> {
        self.objects.lock().unwrap().get(key).cloned()
    }
}

#[async_trait]
impl StorageService for MockStorageService {
    async fn upload_file(
        &self,
        key: &StorageKey,
        mut file: File,
        content_type: &str,
    ) -> anyhow::Result<()> {
        self.uploads.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(anyhow::anyhow!("service unavailable"));
        }
        let mut data = Vec::new();
        file.read_to_end(&mut data).await?;
        self.objects
            .lock()
            .unwrap()
            .insert(key.to_string(), (data, content_type.to_string()));
        Ok(())
    }

    fn object_url(&self, key: &StorageKey) -> String {
        object_url(BUCKET, REGION, key.as_str())
    }
}

/// Delegates to the real store but rejects every metadata write.
pub struct FailingUpdateRepository {
    inner: Arc<SeaOrmVideoRepository>,
    pub updates: AtomicUsize,
}

#[async_trait]
impl VideoRepository for FailingUpdateRepository {
    async fn create_video(&self, params: CreateVideoParams) -> Result<videos::Model, DbErr> {
        self.inner.create_video(params).await
    }

    async fn get_video(&self, id: Uuid) -> Result<Option<videos::Model>, DbErr> {
        self.inner.get_video(id).await
    }

    async fn list_videos(&self, user_id: Uuid) -> Result<Vec<videos::Model>, DbErr> {
        self.inner.list_videos(user_id).await
    }

    async fn update_video(&self, _video: videos::Model) -> Result<videos::Model, DbErr> {
        self.updates.fetch_add(1, Ordering::SeqCst);
        Err(DbErr::Custom("database is locked".to_string()))
    }

    async fn delete_video(&self, id: Uuid) -> Result<(), DbErr> {
        self.inner.delete_video(id).await
    }
}

pub struct TestApp {
    pub app: Router,
    pub config: AppConfig,
    pub videos: Arc<SeaOrmVideoRepository>,
    pub prober: Arc<FakeProber>,
    pub remuxer: Arc<FakeRemuxer>,
    pub storage: Arc<MockStorageService>,
    pub failed_updates: Option<Arc<FailingUpdateRepository>>,
    pub temp_dir: TempDir,
}

pub struct TestAppBuilder {
    prober: FakeProber,
    remuxer: FakeRemuxer,
    storage: MockStorageService,
    max_upload_size: usize,
    fail_metadata_writes: bool,
}

impl TestAppBuilder {
    pub fn new() -> Self {
        Self {
            prober: FakeProber::returning(1920, 1080),
            remuxer: FakeRemuxer::new(),
            storage: MockStorageService::new(),
            max_upload_size: 1 << 30,
            fail_metadata_writes: false,
        }
    }

    pub fn prober(mut self, prober: FakeProber) -> Self {
        self.prober = prober;
        self
    }

    pub fn remuxer(mut self, remuxer: FakeRemuxer) -> Self {
        self.remuxer = remuxer;
        self
    }

    pub fn storage(mut self, storage: MockStorageService) -> Self {
        self.storage = storage;
        self
    }

    pub fn max_upload_size(mut self, size: usize) -> Self {
        self.max_upload_size = size;
        self
    }

    pub fn fail_metadata_writes(mut self) -> Self {
        self.fail_metadata_writes = true;
        self
    }

    pub async fn build(self) -> TestApp {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        run_migrations(&db).await.unwrap();

        let temp_dir = tempfile::tempdir().unwrap();
        let config = AppConfig {
            s3_bucket: BUCKET.to_string(),
            s3_region: REGION.to_string(),
            jwt_secret: JWT_SECRET.to_string(),
            database_url: "sqlite::memory:".to_string(),
            max_upload_size: self.max_upload_size,
            temp_dir: temp_dir.path().to_path_buf(),
            ..AppConfig::default()
        };

        let videos = Arc::new(SeaOrmVideoRepository::new(db.clone()));
        let prober = Arc::new(self.prober);
        let remuxer = Arc::new(self.remuxer);
        let storage = Arc::new(self.storage);

        let failed_updates = self.fail_metadata_writes.then(|| {
            Arc::new(FailingUpdateRepository {
                inner: videos.clone(),
                updates: AtomicUsize::new(0),
            })
        });
        let store: Arc<dyn VideoRepository> = match &failed_updates {
            Some(failing) => failing.clone(),
            None => videos.clone(),
        };

        let pipeline = Arc::new(VideoPipeline::new(
            store.clone(),
            prober.clone(),
            remuxer.clone(),
            storage.clone(),
        ));

        let state = AppState {
            db,
            videos: store,
            pipeline,
            config: config.clone(),
        };

        TestApp {
            app: create_app(state),
            config,
            videos,
            prober,
            remuxer,
            storage,
            failed_updates,
            temp_dir,
        }
    }
}

impl TestApp {
    pub async fn create_video(&self, owner: Uuid) -> Uuid {
        let video = self
            .videos
            .create_video(CreateVideoParams {
                title: "Boots".to_string(),
                description: "A bear in the woods".to_string(),
                user_id: owner,
            })
            .await
            .unwrap();
        Uuid::parse_str(&video.id).unwrap()
    }

    pub async fn video_url(&self, id: Uuid) -> Option<String> {
        self.videos.get_video(id).await.unwrap().unwrap().video_url
    }

    /// Files left behind in the upload temp dir.
    pub fn leftover_files(&self) -> Vec<PathBuf> {
        std::fs::read_dir(self.temp_dir.path())
            .unwrap()
            .map(|e| e.unwrap().path())
            .collect()
    }

    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.app.clone().oneshot(request).await.unwrap()
    }
}

pub fn token_for(user_id: Uuid) -> String {
    create_jwt(&user_id.to_string(), JWT_SECRET).unwrap()
}

pub const BOUNDARY: &str = "---------------------------tubely0123456789";

pub fn multipart_body(field: &str, content_type: &str, data: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\n\
            Content-Disposition: form-data; name=\"{field}\"; filename=\"boots.mp4\"\r\n\
            Content-Type: {content_type}\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
    body
}

pub fn upload_request(video_id: &str, token: Option<&str>, body: Vec<u8>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(format!("/api/video_upload/{}", video_id))
        .header(
            "Content-Type",
            format!("multipart/form-data; boundary={}", BOUNDARY),
        );
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {}", token));
    }
    builder.body(Body::from(body)).unwrap()
}

pub async fn body_json(response: Response<Body>) -> Value {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap()
}
