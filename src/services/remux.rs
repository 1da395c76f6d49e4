use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, error};

/// Rewrites a container for progressive playback without re-encoding.
/// The caller owns the returned file.
#[async_trait]
pub trait Remuxer: Send + Sync {
    async fn remux(&self, path: &Path) -> Result<PathBuf>;
}

/// Sibling path the fast-start output is written to.
pub fn processing_path(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".processing");
    PathBuf::from(name)
}

pub struct FfmpegRemuxer {
    bin: String,
    timeout: Duration,
}

impl FfmpegRemuxer {
    pub fn new(bin: impl Into<String>, timeout: Duration) -> Self {
        Self {
            bin: bin.into(),
            timeout,
        }
    }
}

#[async_trait]
impl Remuxer for FfmpegRemuxer {
    async fn remux(&self, path: &Path) -> Result<PathBuf> {
        let output_path = processing_path(path);

        let mut cmd = Command::new(&self.bin);
        cmd.arg("-i")
            .arg(path)
            .arg("-c")
            .arg("copy")
            .arg("-movflags")
            .arg("faststart")
            .arg("-f")
            .arg("mp4")
            .arg(&output_path)
            .stdin(Stdio::null())
            .kill_on_drop(true);

        debug!("ffmpeg: remuxing {} -> {}", path.display(), output_path.display());

        let result = tokio::time::timeout(self.timeout, cmd.output())
            .await
            .map_err(|_| anyhow!("ffmpeg timed out after {:?}", self.timeout))
            .and_then(|res| {
                res.with_context(|| format!("Failed to execute {}", self.bin))
            });

        let output = match result {
            Ok(output) => output,
            Err(e) => {
                let _ = tokio::fs::remove_file(&output_path).await;
                return Err(e);
            }
        };

        if !output.status.success() {
            let err_msg = String::from_utf8_lossy(&output.stderr);
            error!("ffmpeg failed: {}", err_msg);
            // Partial output must not outlive the failed run
            let _ = tokio::fs::remove_file(&output_path).await;
            return Err(anyhow!("ffmpeg exited with {}: {}", output.status, err_msg.trim()));
        }

        Ok(output_path)
    }
}
