//! Podbrief - summarize spoken-audio episodes from video platforms and podcast feeds
//!
//! This library downloads an episode's audio, transcribes it with an
//! OpenAI-compatible Whisper endpoint (splitting oversized files into
//! sequential chunks under the service's payload ceiling), and produces an
//! abstractive summary whose verbosity is controlled by a detail dial.

pub mod cli;
pub mod config;
pub mod output;
pub mod pipeline;
pub mod sources;
pub mod summarize;
pub mod transcribe;
pub mod utils;

pub use cli::{Cli, Commands, OutputFormat};
pub use config::Config;
pub use pipeline::{PipelineResponse, SummarizeRequest, SummaryPipeline};
pub use sources::{AudioArtifact, AudioSource, EpisodeMetadata, Platform};
pub use transcribe::TranscriptAssembler;

/// Result type used throughout the library
pub type Result<T> = anyhow::Result<T>;

/// Error types specific to the summarization pipeline
#[derive(thiserror::Error, Debug)]
pub enum PipelineError {
    #[error("Episode not found: {0}")]
    EpisodeNotFound(String),

    #[error("No audio available: {0}")]
    NoAudio(String),

    #[error("Chunk planning failed: {0}")]
    Planning(String),

    #[error("Transcription service error: {0}")]
    TranscriptionService(String),

    #[error("Summarization service error: {0}")]
    SummarizationService(String),
}
