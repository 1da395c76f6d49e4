use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use serde::Deserialize;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, error};

use crate::services::orientation::StreamGeometry;

/// Reads stream geometry from a local media file.
#[async_trait]
pub trait MediaProber: Send + Sync {
    async fn probe(&self, path: &Path) -> Result<StreamGeometry>;
}

/// Subset of `ffprobe -print_format json -show_streams` output
#[derive(Debug, Deserialize)]
struct ProbeOutput {
    #[serde(default)]
    streams: Vec<ProbeStream>,
}

#[derive(Debug, Deserialize)]
struct ProbeStream {
    width: Option<u32>,
    height: Option<u32>,
}

/// Extracts the first stream's geometry from ffprobe's JSON output.
/// A stream without dimensions (e.g. audio) yields 0x0.
pub fn parse_probe_output(stdout: &[u8]) -> Result<StreamGeometry> {
    let output: ProbeOutput =
        serde_json::from_slice(stdout).context("Failed to parse ffprobe output")?;

    let stream = output
        .streams
        .first()
        .ok_or_else(|| anyhow!("ffprobe reported no streams"))?;

    Ok(StreamGeometry::new(
        stream.width.unwrap_or(0),
        stream.height.unwrap_or(0),
    ))
}

pub struct FfprobeProber {
    bin: String,
    timeout: Duration,
}

impl FfprobeProber {
    pub fn new(bin: impl Into<String>, timeout: Duration) -> Self {
        Self {
            bin: bin.into(),
            timeout,
        }
    }
}

#[async_trait]
impl MediaProber for FfprobeProber {
    async fn probe(&self, path: &Path) -> Result<StreamGeometry> {
        let mut cmd = Command::new(&self.bin);
        cmd.arg("-v")
            .arg("error")
            .arg("-print_format")
            .arg("json")
            .arg("-show_streams")
            .arg(path)
            .stdin(Stdio::null())
            .kill_on_drop(true);

        debug!("ffprobe: probing {}", path.display());

        let output = tokio::time::timeout(self.timeout, cmd.output())
            .await
            .map_err(|_| anyhow!("ffprobe timed out after {:?}", self.timeout))?
            .with_context(|| format!("Failed to execute {} for {}", self.bin, path.display()))?;

        if !output.status.success() {
            let err_msg = String::from_utf8_lossy(&output.stderr);
            error!("ffprobe failed: {}", err_msg);
            return Err(anyhow!(
                "ffprobe exited with {} for {}: {}",
                output.status,
                path.display(),
                err_msg.trim()
            ));
        }

        parse_probe_output(&output.stdout)
    }
}
