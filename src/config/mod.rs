use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Runtime configuration for the video service
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Target bucket for processed videos (default: "tubely-videos")
    pub s3_bucket: String,

    /// Bucket region, also used to build public object URLs (default: "us-east-1")
    pub s3_region: String,

    /// Custom S3-compatible endpoint (e.g. MinIO). Path-style addressing is used when set.
    pub s3_endpoint: Option<String>,

    /// JWT Secret Key
    pub jwt_secret: String,

    /// Database connection string (default: local sqlite file)
    pub database_url: String,

    /// Maximum accepted video size in bytes (default: 1 GiB)
    pub max_upload_size: usize,

    /// Directory for request-scoped temporary files (default: OS temp dir)
    pub temp_dir: PathBuf,

    /// ffprobe executable (default: "ffprobe")
    pub ffprobe_bin: String,

    /// ffmpeg executable (default: "ffmpeg")
    pub ffmpeg_bin: String,

    /// Upper bound for a single ffprobe/ffmpeg invocation (default: 300 s)
    pub tool_timeout: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            s3_bucket: "tubely-videos".to_string(),
            s3_region: "us-east-1".to_string(),
            s3_endpoint: None,
            jwt_secret: "secret".to_string(),
            database_url: "sqlite://tubely.db?mode=rwc".to_string(),
            max_upload_size: 1 << 30, // 1 GiB
            temp_dir: env::temp_dir(),
            ffprobe_bin: "ffprobe".to_string(),
            ffmpeg_bin: "ffmpeg".to_string(),
            tool_timeout: Duration::from_secs(300),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let default = Self::default();

        Self {
            s3_bucket: env::var("S3_BUCKET").unwrap_or(default.s3_bucket),

            s3_region: env::var("S3_REGION").unwrap_or(default.s3_region),

            s3_endpoint: env::var("S3_ENDPOINT").ok().filter(|v| !v.is_empty()),

            jwt_secret: env::var("JWT_SECRET").unwrap_or(default.jwt_secret), // Fallback for dev convenience, strictly enforced in production method

            database_url: env::var("DATABASE_URL").unwrap_or(default.database_url),

            max_upload_size: env::var("MAX_UPLOAD_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.max_upload_size),

            temp_dir: env::var("UPLOAD_TEMP_DIR")
                .ok()
                .map(PathBuf::from)
                .unwrap_or(default.temp_dir),

            ffprobe_bin: env::var("FFPROBE_BIN").unwrap_or(default.ffprobe_bin),

            ffmpeg_bin: env::var("FFMPEG_BIN").unwrap_or(default.ffmpeg_bin),

            tool_timeout: env::var("MEDIA_TOOL_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(default.tool_timeout),
        }
    }

    /// Create config for local development (throwaway database, short tool timeout)
    pub fn development() -> Self {
        Self {
            database_url: "sqlite://tubely-dev.db?mode=rwc".to_string(),
            tool_timeout: Duration::from_secs(60),
            ..Self::default()
        }
    }

    /// Create config for production (JWT secret must be provided)
    pub fn production() -> Self {
        Self {
            jwt_secret: env::var("JWT_SECRET").expect("CRITICAL: JWT_SECRET must be set"),
            ..Self::from_env()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.max_upload_size, 1024 * 1024 * 1024);
        assert_eq!(config.s3_region, "us-east-1");
        assert_eq!(config.ffprobe_bin, "ffprobe");
        assert_eq!(config.ffmpeg_bin, "ffmpeg");
        assert!(config.s3_endpoint.is_none());
    }

    #[test]
    fn test_development_config() {
        let config = AppConfig::development();
        assert_eq!(config.database_url, "sqlite://tubely-dev.db?mode=rwc");
        assert_eq!(config.tool_timeout, Duration::from_secs(60));
    }

    #[test]
    fn test_production_config() {
        unsafe { env::set_var("JWT_SECRET", "test_secret") };
        let config = AppConfig::production();
        unsafe { env::remove_var("JWT_SECRET") };
        assert_eq!(config.jwt_secret, "test_secret");
    }
}
