use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use tempfile::TempDir;
use tokio::process::Command;
use uuid::Uuid;

use super::planner::ChunkRange;
use super::whisper::TranscriptionBackend;
use crate::sources::AudioArtifact;
use crate::{PipelineError, Result};

/// Trait for exporting one time range of an audio file to a standalone artifact
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChunkExporter: Send + Sync {
    async fn export_range(
        &self,
        artifact: &AudioArtifact,
        range: &ChunkRange,
        dest: &Path,
    ) -> Result<()>;
}

/// Exports chunks with ffmpeg, re-encoded to single-channel low-bitrate MP3.
///
/// Re-encoding keeps the exported size conservatively under the constant
/// bitrate estimate the planner worked from; exported sizes are not
/// re-measured before submission.
pub struct FfmpegExporter {
    ffmpeg_path: String,
}

impl FfmpegExporter {
    pub fn new() -> Self {
        Self {
            ffmpeg_path: "ffmpeg".to_string(),
        }
    }
}

impl Default for FfmpegExporter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ChunkExporter for FfmpegExporter {
    async fn export_range(
        &self,
        artifact: &AudioArtifact,
        range: &ChunkRange,
        dest: &Path,
    ) -> Result<()> {
        let start_s = format!("{:.3}", range.start_ms as f64 / 1000.0);
        let duration_s = format!("{:.3}", range.duration_ms() as f64 / 1000.0);

        let output = Command::new(&self.ffmpeg_path)
            .args([
                "-nostdin",
                "-y",
                "-ss",
                &start_s,
                "-t",
                &duration_s,
                "-i",
                &artifact.path.to_string_lossy(),
                "-ac",
                "1",
                "-b:a",
                "64k",
                &dest.to_string_lossy(),
            ])
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await?;

        if !output.status.success() {
            let error = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!(
                "ffmpeg failed to export range [{}ms, {}ms): {}",
                range.start_ms,
                range.end_ms,
                error.trim()
            );
        }

        Ok(())
    }
}

/// Deletes the chunk file when dropped, on every exit path
struct TempChunk(PathBuf);

impl Drop for TempChunk {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.0);
    }
}

/// Transcribes individual chunks: export, submit, clean up.
///
/// Stateless per chunk; remote failures are propagated, not retried. Retry
/// policy belongs to the caller.
pub struct ChunkTranscriber {
    exporter: Arc<dyn ChunkExporter>,
    backend: Arc<dyn TranscriptionBackend>,
    workdir: TempDir,
}

impl ChunkTranscriber {
    pub fn new(exporter: Arc<dyn ChunkExporter>, backend: Arc<dyn TranscriptionBackend>) -> Result<Self> {
        let workdir = TempDir::new()?;
        Ok(Self {
            exporter,
            backend,
            workdir,
        })
    }

    /// Export one time range and submit it to the transcription service.
    ///
    /// The exported artifact is deleted before returning, whether the export,
    /// the read, or the remote call failed or succeeded.
    pub async fn transcribe_range(
        &self,
        artifact: &AudioArtifact,
        range: &ChunkRange,
    ) -> Result<String> {
        let file_name = format!(
            "chunk_{}_{}.mp3",
            range.start_ms,
            &Uuid::new_v4().to_string()[..8]
        );
        let chunk_path = self.workdir.path().join(&file_name);

        // Guard created before the export so a partial file is reclaimed too
        let _cleanup = TempChunk(chunk_path.clone());

        self.exporter
            .export_range(artifact, range, &chunk_path)
            .await?;

        let audio = fs_err::read(&chunk_path)?;
        tracing::debug!(
            "Submitting chunk [{}ms, {}ms) ({} bytes)",
            range.start_ms,
            range.end_ms,
            audio.len()
        );

        self.backend.transcribe(audio, &file_name, "audio/mpeg").await
    }

    /// Submit the whole artifact directly, skipping the export/delete overhead
    pub async fn transcribe_whole(&self, artifact: &AudioArtifact) -> Result<String> {
        let file_name = artifact
            .path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| {
                PipelineError::TranscriptionService(format!(
                    "audio path has no file name: {}",
                    artifact.path.display()
                ))
            })?
            .to_string();

        let audio = fs_err::read(&artifact.path)?;
        self.backend
            .transcribe(audio, &file_name, artifact.format.mime_type())
            .await
    }

    pub fn backend(&self) -> &Arc<dyn TranscriptionBackend> {
        &self.backend
    }
}
