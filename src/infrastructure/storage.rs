use crate::config::AppConfig;
use crate::services::storage::S3StorageService;
use aws_sdk_s3::config::{Credentials, Region};
use std::env;
use std::sync::Arc;
use tracing::info;

pub async fn setup_storage(config: &AppConfig) -> Arc<S3StorageService> {
    let mut loader = aws_config::from_env().region(Region::new(config.s3_region.clone()));

    if let Some(endpoint_url) = &config.s3_endpoint {
        info!("☁️  S3 Storage: {} (Bucket: {})", endpoint_url, config.s3_bucket);
        loader = loader.endpoint_url(endpoint_url);

        if let (Ok(access_key), Ok(secret_key)) =
            (env::var("S3_ACCESS_KEY"), env::var("S3_SECRET_KEY"))
        {
            loader = loader.credentials_provider(Credentials::new(
                access_key, secret_key, None, None, "static",
            ));
        }
    } else {
        info!(
            "☁️  S3 Storage: AWS {} (Bucket: {})",
            config.s3_region, config.s3_bucket
        );
    }

    let aws_config = loader.load().await;

    let s3_config = aws_sdk_s3::config::Builder::from(&aws_config)
        .force_path_style(config.s3_endpoint.is_some())
        .build();

    let s3_client = aws_sdk_s3::Client::from_conf(s3_config);
    let storage = S3StorageService::new(
        s3_client,
        config.s3_bucket.clone(),
        config.s3_region.clone(),
    );
    info!("✅ Uploads go to bucket '{}'", storage.bucket());

    Arc::new(storage)
}
