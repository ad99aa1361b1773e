use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::sources::{AudioSource, EpisodeMetadata, Platform};
use crate::summarize::Summarizer;
use crate::transcribe::TranscriptAssembler;
use crate::Result;

/// One summarization request, as received from the adapter surface
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummarizeRequest {
    /// Video URL or feed URL, depending on `platform`
    pub source_identifier: String,

    /// Episode title to select within a feed; ignored for video sources
    pub episode_name: Option<String>,

    /// Summary verbosity dial in [0.0, 1.0], interpreted only by the summarizer
    pub detail_level: f64,

    /// Which audio source resolves the identifier
    pub platform: Platform,
}

/// Terminal outcome of one pipeline run: exactly one of success or failure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PipelineResponse {
    Success {
        success: bool,
        title: String,
        summary: String,
        thumbnail: String,
        channel: String,
        duration_string: String,
        release_date: String,
    },
    Failure {
        success: bool,
        error: String,
    },
}

impl PipelineResponse {
    fn success(metadata: EpisodeMetadata, summary: String) -> Self {
        PipelineResponse::Success {
            success: true,
            title: metadata.title,
            summary,
            thumbnail: metadata.thumbnail,
            channel: metadata.channel,
            duration_string: metadata.duration_string,
            release_date: metadata.release_date,
        }
    }

    fn failure(error: String) -> Self {
        PipelineResponse::Failure {
            success: false,
            error,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, PipelineResponse::Success { .. })
    }
}

/// Sequences fetch, transcription, and summarization for one request.
///
/// Each stage runs exactly once; any stage failure is caught once at this
/// boundary and converted into a failure response carrying the original
/// error message.
pub struct SummaryPipeline {
    video_source: Arc<dyn AudioSource>,
    feed_source: Arc<dyn AudioSource>,
    assembler: TranscriptAssembler,
    summarizer: Arc<dyn Summarizer>,
}

impl SummaryPipeline {
    pub fn new(
        video_source: Arc<dyn AudioSource>,
        feed_source: Arc<dyn AudioSource>,
        assembler: TranscriptAssembler,
        summarizer: Arc<dyn Summarizer>,
    ) -> Self {
        Self {
            video_source,
            feed_source,
            assembler,
            summarizer,
        }
    }

    fn source_for(&self, platform: Platform) -> &Arc<dyn AudioSource> {
        match platform {
            Platform::Video => &self.video_source,
            Platform::Feed => &self.feed_source,
        }
    }

    /// Run the full pipeline, returning exactly one terminal outcome
    pub async fn run(&self, request: &SummarizeRequest) -> PipelineResponse {
        match self.execute(request).await {
            Ok(response) => response,
            Err(err) => {
                tracing::error!("Pipeline failed: {}", err);
                PipelineResponse::failure(err.to_string())
            }
        }
    }

    async fn execute(&self, request: &SummarizeRequest) -> Result<PipelineResponse> {
        let source = self.source_for(request.platform);

        tracing::info!(
            "Fetching {} from {}",
            request.source_identifier,
            source.platform_name()
        );
        let (artifact, metadata) = source
            .fetch(&request.source_identifier, request.episode_name.as_deref())
            .await?;
        tracing::info!("Downloaded {}", metadata.title);

        let transcript = self.assembler.get_transcript(&artifact, &metadata.id).await?;
        tracing::info!("Transcription complete");

        let summary = self
            .summarizer
            .summarize(&transcript, request.detail_level)
            .await?;
        tracing::info!("Summarization complete");

        Ok(PipelineResponse::success(metadata, summary))
    }
}
