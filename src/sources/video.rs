use async_trait::async_trait;
use serde_json::Value;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::process::Command;

use super::{AudioArtifact, AudioFormat, AudioSource, EpisodeMetadata};
use crate::utils::probe_duration_ms;
use crate::{PipelineError, Result};

/// Video platform audio source using yt-dlp
pub struct VideoSource {
    yt_dlp_path: String,
    downloads_dir: PathBuf,
    reuse_downloads: bool,
}

impl VideoSource {
    pub fn new(downloads_dir: PathBuf, reuse_downloads: bool) -> Self {
        Self {
            yt_dlp_path: "yt-dlp".to_string(),
            downloads_dir,
            reuse_downloads,
        }
    }

    /// Strip extra query parameters (playlist indices, timestamps) that would
    /// make yt-dlp resolve something other than the single video.
    fn sanitize_url(url: &str) -> &str {
        url.split('&').next().unwrap_or(url)
    }

    /// Get video information using yt-dlp
    async fn get_video_info(&self, url: &str) -> Result<Value> {
        tracing::debug!("Extracting video info for: {}", url);

        let output = Command::new(&self.yt_dlp_path)
            .args(["--dump-json", "--no-playlist", url])
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await?;

        if !output.status.success() {
            let error = String::from_utf8_lossy(&output.stderr);
            return Err(PipelineError::EpisodeNotFound(format!(
                "yt-dlp could not resolve {}: {}",
                url,
                error.trim()
            ))
            .into());
        }

        let json_str = String::from_utf8(output.stdout)?;
        let info: Value = serde_json::from_str(&json_str)?;

        Ok(info)
    }

    /// Download the best audio stream converted to MP3
    async fn download_audio(&self, url: &str, output_path: &std::path::Path) -> Result<()> {
        tracing::info!("Downloading audio to: {}", output_path.display());

        let output = Command::new(&self.yt_dlp_path)
            .args([
                "--output",
                &output_path.to_string_lossy(),
                "--extract-audio",
                "--audio-format",
                "mp3",
                "--format",
                "bestaudio/best",
                "--no-playlist",
                "--newline",
                url,
            ])
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await?;

        if !output.status.success() {
            let error = String::from_utf8_lossy(&output.stderr);
            return Err(PipelineError::NoAudio(format!(
                "yt-dlp failed to download audio: {}",
                error.trim()
            ))
            .into());
        }

        Ok(())
    }

    fn metadata_from_info(info: &Value) -> EpisodeMetadata {
        let id = info["id"].as_str().unwrap_or_default().to_string();
        let release_date = info["upload_date"]
            .as_str()
            .and_then(|raw| chrono::NaiveDate::parse_from_str(raw, "%Y%m%d").ok())
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_default();

        EpisodeMetadata {
            id,
            title: info["title"].as_str().unwrap_or_default().to_string(),
            channel: info["channel"]
                .as_str()
                .or_else(|| info["uploader"].as_str())
                .unwrap_or_default()
                .to_string(),
            thumbnail: info["thumbnail"].as_str().unwrap_or_default().to_string(),
            duration_string: info["duration_string"]
                .as_str()
                .unwrap_or_default()
                .to_string(),
            release_date,
        }
    }
}

#[async_trait]
impl AudioSource for VideoSource {
    async fn fetch<'a>(
        &self,
        identifier: &str,
        _episode_name: Option<&'a str>,
    ) -> Result<(AudioArtifact, EpisodeMetadata)> {
        let url = Self::sanitize_url(identifier);

        let info = self.get_video_info(url).await?;
        let metadata = Self::metadata_from_info(&info);
        if metadata.id.is_empty() {
            return Err(
                PipelineError::EpisodeNotFound(format!("no video id in metadata for {}", url))
                    .into(),
            );
        }

        let audio_path = self
            .downloads_dir
            .join(&metadata.id)
            .join(format!("{}.mp3", metadata.id));

        if self.reuse_downloads && audio_path.exists() {
            tracing::info!("Reusing previously downloaded audio for {}", metadata.id);
        } else {
            if let Some(parent) = audio_path.parent() {
                fs_err::create_dir_all(parent)?;
            }
            self.download_audio(url, &audio_path).await?;
        }

        let total_bytes = fs_err::metadata(&audio_path)?.len();
        let duration_ms = probe_duration_ms(&audio_path).await?;

        let artifact = AudioArtifact {
            path: audio_path,
            total_bytes,
            duration_ms,
            format: AudioFormat::Mp3,
        };

        Ok((artifact, metadata))
    }

    fn platform_name(&self) -> &'static str {
        "Video platform"
    }
}
