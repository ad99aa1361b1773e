use async_trait::async_trait;
use feed_rs::model::{Entry, Feed};
use futures_util::StreamExt;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::Write;
use std::path::{Path, PathBuf};

use super::{AudioArtifact, AudioFormat, AudioSource, EpisodeMetadata};
use crate::utils::{format_duration, probe_duration_ms, sanitize_filename};
use crate::{PipelineError, Result};

/// Podcast audio source reading episodes from an RSS/Atom feed
pub struct FeedSource {
    client: reqwest::Client,
    downloads_dir: PathBuf,
    reuse_downloads: bool,
}

impl FeedSource {
    pub fn new(client: reqwest::Client, downloads_dir: PathBuf, reuse_downloads: bool) -> Self {
        Self {
            client,
            downloads_dir,
            reuse_downloads,
        }
    }

    async fn fetch_feed(&self, url: &str) -> Result<Feed> {
        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            return Err(PipelineError::EpisodeNotFound(format!(
                "failed to fetch feed {}: HTTP {}",
                url,
                response.status()
            ))
            .into());
        }

        let body = response.bytes().await?;
        let feed = feed_rs::parser::parse(body.as_ref()).map_err(|e| {
            PipelineError::EpisodeNotFound(format!("failed to parse feed {}: {}", url, e))
        })?;

        Ok(feed)
    }

    /// Select the entry matching `episode_name` (case-insensitive), or the
    /// latest entry when no name is given.
    fn select_entry<'a>(feed: &'a Feed, episode_name: Option<&str>) -> Option<&'a Entry> {
        match episode_name {
            Some(name) => feed.entries.iter().find(|entry| {
                entry
                    .title
                    .as_ref()
                    .map(|t| t.content.eq_ignore_ascii_case(name))
                    .unwrap_or(false)
            }),
            None => feed.entries.first(),
        }
    }

    /// Find the audio enclosure URL of an entry
    fn audio_url(entry: &Entry) -> Option<String> {
        // Enclosures surface as links carrying an audio media type
        if let Some(link) = entry.links.iter().find(|link| {
            link.media_type
                .as_deref()
                .map(|mt| mt.starts_with("audio/"))
                .unwrap_or(false)
        }) {
            return Some(link.href.clone());
        }

        // Fall back to a link whose path looks like an audio file
        entry
            .links
            .iter()
            .find(|link| {
                let lower = link.href.to_lowercase();
                [".mp3", ".m4a", ".wav", ".ogg", ".flac"]
                    .iter()
                    .any(|ext| lower.contains(ext))
            })
            .map(|link| link.href.clone())
    }

    /// Derive a stable episode id from the enclosure filename stem
    fn episode_id(audio_url: &str) -> String {
        let last_segment = audio_url
            .split('/')
            .next_back()
            .unwrap_or(audio_url)
            .split('?')
            .next()
            .unwrap_or_default();

        let stem = last_segment
            .rsplit_once('.')
            .map(|(stem, _ext)| stem)
            .unwrap_or(last_segment);

        let decoded = urlencoding::decode(stem)
            .map(|s| s.into_owned())
            .unwrap_or_else(|_| stem.to_string());

        sanitize_filename(&decoded)
    }

    fn metadata_from_entry(feed: &Feed, entry: &Entry, episode_id: &str) -> EpisodeMetadata {
        let thumbnail = feed
            .logo
            .as_ref()
            .map(|img| img.uri.clone())
            .or_else(|| feed.icon.as_ref().map(|img| img.uri.clone()))
            .unwrap_or_default();

        EpisodeMetadata {
            id: episode_id.to_string(),
            title: entry
                .title
                .as_ref()
                .map(|t| t.content.clone())
                .unwrap_or_default(),
            channel: feed
                .title
                .as_ref()
                .map(|t| t.content.clone())
                .unwrap_or_default(),
            thumbnail,
            // Filled from the probed audio duration after download
            duration_string: String::new(),
            release_date: entry
                .published
                .map(|dt| dt.format("%Y-%m-%d").to_string())
                .unwrap_or_default(),
        }
    }

    /// Stream the enclosure to disk with progress tracking
    async fn download_enclosure(&self, url: &str, output_path: &Path) -> Result<()> {
        tracing::info!("Downloading episode to: {}", output_path.display());

        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            return Err(PipelineError::NoAudio(format!(
                "failed to download enclosure: HTTP {}",
                response.status()
            ))
            .into());
        }

        let total_size = response.content_length().unwrap_or(0);
        let progress = ProgressBar::new(total_size);
        progress.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} {msg}")
                .unwrap(),
        );
        progress.set_message("Downloading episode...");

        let mut file = fs_err::File::create(output_path)?;
        let mut downloaded = 0u64;
        let mut stream = response.bytes_stream();

        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            file.write_all(&chunk)?;
            downloaded += chunk.len() as u64;
            progress.set_position(downloaded);
        }

        progress.finish_with_message("Download complete");

        Ok(())
    }
}

#[async_trait]
impl AudioSource for FeedSource {
    async fn fetch<'a>(
        &self,
        identifier: &str,
        episode_name: Option<&'a str>,
    ) -> Result<(AudioArtifact, EpisodeMetadata)> {
        let feed = self.fetch_feed(identifier).await?;

        let entry = Self::select_entry(&feed, episode_name).ok_or_else(|| {
            PipelineError::EpisodeNotFound(
                "no feed entry matches the requested episode name".to_string(),
            )
        })?;

        let audio_url = Self::audio_url(entry).ok_or_else(|| {
            PipelineError::NoAudio("the selected entry has no audio enclosure".to_string())
        })?;

        let episode_id = Self::episode_id(&audio_url);
        let mut metadata = Self::metadata_from_entry(&feed, entry, &episode_id);

        let format = Path::new(&audio_url)
            .extension()
            .and_then(|ext| AudioFormat::from_extension(&ext.to_string_lossy()))
            .unwrap_or(AudioFormat::Mp3);

        let audio_path = self
            .downloads_dir
            .join(&episode_id)
            .join(format!("{}.{}", episode_id, format.as_str()));

        if self.reuse_downloads && audio_path.exists() {
            tracing::info!("Reusing previously downloaded episode {}", episode_id);
        } else {
            if let Some(parent) = audio_path.parent() {
                fs_err::create_dir_all(parent)?;
            }
            self.download_enclosure(&audio_url, &audio_path).await?;
        }

        let total_bytes = fs_err::metadata(&audio_path)?.len();
        let duration_ms = probe_duration_ms(&audio_path).await?;
        metadata.duration_string = format_duration(duration_ms / 1000);

        let artifact = AudioArtifact {
            path: audio_path,
            total_bytes,
            duration_ms,
            format,
        };

        Ok((artifact, metadata))
    }

    fn platform_name(&self) -> &'static str {
        "RSS feed"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_feed() -> Feed {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
        <rss version="2.0">
          <channel>
            <title>Test Show</title>
            <item>
              <title>Newest Episode</title>
              <pubDate>Tue, 14 Jan 2026 08:00:00 GMT</pubDate>
              <enclosure url="https://cdn.example/ep%2042.mp3" type="audio/mpeg" length="1000"/>
            </item>
            <item>
              <title>Older Episode</title>
              <pubDate>Tue, 07 Jan 2026 08:00:00 GMT</pubDate>
              <enclosure url="https://cdn.example/ep41.mp3" type="audio/mpeg" length="1000"/>
            </item>
            <item>
              <title>Broken Episode</title>
            </item>
          </channel>
        </rss>"#;
        feed_rs::parser::parse(xml.as_bytes()).unwrap()
    }

    #[test]
    fn selects_latest_entry_when_no_name_given() {
        let feed = sample_feed();
        let entry = FeedSource::select_entry(&feed, None).unwrap();
        assert_eq!(entry.title.as_ref().unwrap().content, "Newest Episode");
    }

    #[test]
    fn selects_entry_by_case_insensitive_title() {
        let feed = sample_feed();
        let entry = FeedSource::select_entry(&feed, Some("older episode")).unwrap();
        assert_eq!(entry.title.as_ref().unwrap().content, "Older Episode");
    }

    #[test]
    fn missing_episode_yields_none() {
        let feed = sample_feed();
        assert!(FeedSource::select_entry(&feed, Some("No Such Episode")).is_none());
    }

    #[test]
    fn audio_url_prefers_audio_enclosure() {
        let feed = sample_feed();
        let entry = FeedSource::select_entry(&feed, Some("Older Episode")).unwrap();
        assert_eq!(
            FeedSource::audio_url(entry).as_deref(),
            Some("https://cdn.example/ep41.mp3")
        );
    }

    #[test]
    fn entry_without_enclosure_has_no_audio() {
        let feed = sample_feed();
        let entry = FeedSource::select_entry(&feed, Some("Broken Episode")).unwrap();
        assert!(FeedSource::audio_url(entry).is_none());
    }

    #[test]
    fn episode_id_decodes_and_sanitizes_filename_stem() {
        assert_eq!(
            FeedSource::episode_id("https://cdn.example/ep%2042.mp3"),
            "ep 42"
        );
        assert_eq!(
            FeedSource::episode_id("https://cdn.example/shows/ep41.mp3?auth=tok"),
            "ep41"
        );
    }

    #[test]
    fn metadata_from_entry_maps_feed_fields() {
        let feed = sample_feed();
        let entry = FeedSource::select_entry(&feed, None).unwrap();
        let meta = FeedSource::metadata_from_entry(&feed, entry, "ep 42");
        assert_eq!(meta.id, "ep 42");
        assert_eq!(meta.title, "Newest Episode");
        assert_eq!(meta.channel, "Test Show");
        assert_eq!(meta.release_date, "2026-01-14");
    }
}
