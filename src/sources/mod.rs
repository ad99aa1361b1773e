use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub mod feed;
pub mod video;

use crate::Result;

/// A downloaded audio file ready for transcription
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioArtifact {
    /// Path to the local audio file
    pub path: PathBuf,

    /// File size in bytes
    pub total_bytes: u64,

    /// Playback duration in milliseconds
    pub duration_ms: u64,

    /// Audio format of the file
    pub format: AudioFormat,
}

/// Episode metadata produced by the audio source; flows read-only through the pipeline
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EpisodeMetadata {
    /// Stable episode identifier, unique per distinct audio content.
    /// Used as the transcript cache key.
    pub id: String,

    /// Episode title
    pub title: String,

    /// Channel or show name
    pub channel: String,

    /// Thumbnail URL if available
    pub thumbnail: String,

    /// Human-readable duration (e.g. "1:02:35")
    pub duration_string: String,

    /// Release date as YYYY-MM-DD
    pub release_date: String,
}

/// Supported audio formats
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub enum AudioFormat {
    Mp3,
    M4a,
    Wav,
    Flac,
    Ogg,
}

impl AudioFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            AudioFormat::Mp3 => "mp3",
            AudioFormat::M4a => "m4a",
            AudioFormat::Wav => "wav",
            AudioFormat::Flac => "flac",
            AudioFormat::Ogg => "ogg",
        }
    }

    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "mp3" => Some(AudioFormat::Mp3),
            "m4a" | "aac" => Some(AudioFormat::M4a),
            "wav" => Some(AudioFormat::Wav),
            "flac" => Some(AudioFormat::Flac),
            "ogg" => Some(AudioFormat::Ogg),
            _ => None,
        }
    }

    /// Get MIME type for the format
    pub fn mime_type(&self) -> &'static str {
        match self {
            AudioFormat::Mp3 => "audio/mpeg",
            AudioFormat::M4a => "audio/mp4",
            AudioFormat::Wav => "audio/wav",
            AudioFormat::Flac => "audio/flac",
            AudioFormat::Ogg => "audio/ogg",
        }
    }
}

/// Platform tag selecting which audio source resolves the identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    /// Video platform URL resolved via yt-dlp
    Video,
    /// Podcast RSS/Atom feed URL
    Feed,
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Platform::Video => write!(f, "video"),
            Platform::Feed => write!(f, "feed"),
        }
    }
}

/// Trait for resolving a source identifier to a local audio file plus metadata
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AudioSource: Send + Sync {
    /// Fetch the episode audio and its metadata.
    ///
    /// `episode_name` selects a specific entry where the identifier alone is
    /// ambiguous (RSS feeds); video sources ignore it.
    async fn fetch<'a>(
        &self,
        identifier: &str,
        episode_name: Option<&'a str>,
    ) -> Result<(AudioArtifact, EpisodeMetadata)>;

    /// Get the name of this platform
    fn platform_name(&self) -> &'static str;
}
