use axum::extract::Multipart;
use mime::Mime;
use std::io::SeekFrom;
use std::path::{Path, PathBuf};
use tempfile::{NamedTempFile, TempPath};
use tokio::fs::File;
use tokio::io::{AsyncSeekExt, AsyncWriteExt};
use tracing::debug;

use crate::services::video_pipeline::PipelineError;

/// Multipart field carrying the video bytes
pub const VIDEO_FIELD: &str = "video";

/// The only container the pipeline accepts
pub const ACCEPTED_EXTENSION: &str = "mp4";

/// Request-scoped temporary files of one upload. Dropping the session
/// removes the raw upload and, if present, the remuxed output.
#[derive(Debug)]
pub struct UploadSession {
    raw: NamedTempFile,
    processed: Option<TempPath>,
    media_type: String,
    extension: String,
}

impl UploadSession {
    pub fn raw_path(&self) -> &Path {
        self.raw.path()
    }

    pub fn processed_path(&self) -> Option<&Path> {
        self.processed.as_deref()
    }

    pub fn media_type(&self) -> &str {
        &self.media_type
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// Takes ownership of a file produced from the raw upload so it is
    /// deleted together with the session.
    pub fn adopt_processed(&mut self, path: PathBuf) {
        self.processed = Some(TempPath::from_path(path));
    }

    /// Opens the remuxed output positioned at its start.
    pub async fn open_processed(&self) -> std::io::Result<File> {
        let path = self.processed_path().ok_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::NotFound, "no processed file")
        })?;
        File::open(path).await
    }
}

/// Parses a declared content type and derives the file extension from its
/// subtype. Only `mp4` is accepted.
pub fn media_type_extension(content_type: Option<&str>) -> Result<(String, String), PipelineError> {
    let raw = content_type.unwrap_or_default().trim();
    let mime: Mime = raw
        .parse()
        .map_err(|_| PipelineError::Validation(format!("Invalid Content-Type: '{}'", raw)))?;

    let media_type = mime.essence_str().to_string();
    let extension = mime.subtype().as_str().to_lowercase();

    if extension != ACCEPTED_EXTENSION {
        return Err(PipelineError::Validation(format!(
            "Wrong format, got {}, expected {}",
            extension, ACCEPTED_EXTENSION
        )));
    }

    Ok((media_type, extension))
}

/// Reads the `video` field into a fresh temporary file under `temp_dir`,
/// enforcing `max_size`, and rewinds it. Other fields are skipped.
pub async fn receive_upload(
    multipart: &mut Multipart,
    temp_dir: &Path,
    max_size: usize,
) -> Result<UploadSession, PipelineError> {
    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|e| PipelineError::Validation(format!("Unable to parse form: {}", e)))?
    {
        if field.name() != Some(VIDEO_FIELD) {
            continue;
        }

        let (media_type, extension) = media_type_extension(field.content_type())?;

        let raw = tempfile::Builder::new()
            .prefix("tubely-upload")
            .suffix(&format!(".{}", extension))
            .tempfile_in(temp_dir)?;
        let mut file = File::from_std(raw.as_file().try_clone()?);

        let mut written = 0usize;
        while let Some(chunk) = field
            .chunk()
            .await
            .map_err(|e| PipelineError::Validation(format!("Unable to read video: {}", e)))?
        {
            written += chunk.len();
            if written > max_size {
                return Err(PipelineError::Validation(format!(
                    "Video exceeds the {} byte limit",
                    max_size
                )));
            }
            file.write_all(&chunk).await?;
        }

        file.flush().await?;
        file.seek(SeekFrom::Start(0)).await?;

        debug!("Received {} bytes into {}", written, raw.path().display());

        return Ok(UploadSession {
            raw,
            processed: None,
            media_type,
            extension,
        });
    }

    Err(PipelineError::Validation(format!(
        "Missing form file '{}'",
        VIDEO_FIELD
    )))
}
