use async_trait::async_trait;
use chrono::Utc;
use sea_orm::ActiveValue::Set;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QueryOrder,
};
use uuid::Uuid;

use crate::entities::{prelude::*, videos};

#[derive(Debug, Clone)]
pub struct CreateVideoParams {
    pub title: String,
    pub description: String,
    pub user_id: Uuid,
}

/// Persistent store of video metadata records.
#[async_trait]
pub trait VideoRepository: Send + Sync {
    async fn create_video(&self, params: CreateVideoParams) -> Result<videos::Model, DbErr>;
    async fn get_video(&self, id: Uuid) -> Result<Option<videos::Model>, DbErr>;
    async fn list_videos(&self, user_id: Uuid) -> Result<Vec<videos::Model>, DbErr>;
    /// Overwrites every mutable field; concurrent writers race and the last one wins.
    async fn update_video(&self, video: videos::Model) -> Result<videos::Model, DbErr>;
    async fn delete_video(&self, id: Uuid) -> Result<(), DbErr>;
}

pub struct SeaOrmVideoRepository {
    db: DatabaseConnection,
}

impl SeaOrmVideoRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl VideoRepository for SeaOrmVideoRepository {
    async fn create_video(&self, params: CreateVideoParams) -> Result<videos::Model, DbErr> {
        let now = Utc::now();
        let video = videos::ActiveModel {
            id: Set(Uuid::new_v4().to_string()),
            created_at: Set(now),
            updated_at: Set(now),
            title: Set(params.title),
            description: Set(params.description),
            thumbnail_url: Set(None),
            video_url: Set(None),
            user_id: Set(params.user_id.to_string()),
        };
        video.insert(&self.db).await
    }

    async fn get_video(&self, id: Uuid) -> Result<Option<videos::Model>, DbErr> {
        Videos::find_by_id(id.to_string()).one(&self.db).await
    }

    async fn list_videos(&self, user_id: Uuid) -> Result<Vec<videos::Model>, DbErr> {
        Videos::find()
            .filter(videos::Column::UserId.eq(user_id.to_string()))
            .order_by_desc(videos::Column::CreatedAt)
            .all(&self.db)
            .await
    }

    async fn update_video(&self, video: videos::Model) -> Result<videos::Model, DbErr> {
        let mut active: videos::ActiveModel = video.clone().into();
        active.title = Set(video.title);
        active.description = Set(video.description);
        active.thumbnail_url = Set(video.thumbnail_url);
        active.video_url = Set(video.video_url);
        active.updated_at = Set(Utc::now());
        active.update(&self.db).await
    }

    async fn delete_video(&self, id: Uuid) -> Result<(), DbErr> {
        Videos::delete_by_id(id.to_string()).exec(&self.db).await?;
        Ok(())
    }
}
