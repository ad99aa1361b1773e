use anyhow::Result;
use clap::Parser;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use podbrief::cli::{Cli, Commands};
use podbrief::config::Config;
use podbrief::output;
use podbrief::pipeline::{SummarizeRequest, SummaryPipeline};
use podbrief::sources::{feed::FeedSource, video::VideoSource};
use podbrief::summarize::OpenAiSummarizer;
use podbrief::transcribe::{
    ChunkTranscriber, FfmpegExporter, TranscriptAssembler, TranscriptCache, WhisperClient,
};
use podbrief::utils;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "podbrief=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Summarize {
            source,
            platform,
            episode,
            detail,
            output,
            format,
        } => {
            // Check for required external dependencies (non-fatal)
            let missing_deps = utils::check_dependencies().await;
            if !missing_deps.is_empty() {
                eprintln!("Dependency check warnings:");
                for dep in missing_deps {
                    eprintln!("   - {}", dep);
                }
                eprintln!("   (Continuing anyway - tools may be available)");
            }

            let config = Config::load().await?;
            let source_url = utils::validate_and_normalize_url(&source)?;

            let request = SummarizeRequest {
                source_identifier: source_url,
                episode_name: episode,
                detail_level: detail,
                platform,
            };

            let pipeline = build_pipeline(&config)?;

            tracing::info!("Starting summarization for: {}", request.source_identifier);
            let response = pipeline.run(&request).await;

            match output {
                Some(path) => {
                    output::save_to_file(&response, &path, &format).await?;
                    println!("Result saved to: {}", path.display());
                }
                None => {
                    output::print_to_console(&response, &format)?;
                }
            }

            if !response.is_success() {
                std::process::exit(1);
            }
        }
        Commands::Config { show } => {
            let config = Config::load().await?;
            if show {
                config.display();
            } else {
                config.save().await?;
                println!("Configuration written. Edit it at the path shown by `config --show`.");
            }
        }
        Commands::Platforms => {
            println!("Supported platforms:");
            println!("  - Video platforms supported by yt-dlp (--platform video)");
            println!("  - Podcast RSS/Atom feeds (--platform feed)");
        }
    }

    Ok(())
}

/// Wire service clients and sources from explicit configuration
fn build_pipeline(config: &Config) -> Result<SummaryPipeline> {
    let api_key = Config::api_key()?;
    let http = reqwest::Client::new();

    let whisper = WhisperClient::new(
        http.clone(),
        config.openai.api_base.clone(),
        api_key.clone(),
        config.openai.transcription_model.clone(),
        config.openai.byte_ceiling,
    );

    let summarizer = OpenAiSummarizer::new(
        http.clone(),
        config.openai.api_base.clone(),
        api_key,
        config.openai.summary_model.clone(),
    );

    let chunker = ChunkTranscriber::new(Arc::new(FfmpegExporter::new()), Arc::new(whisper))?;

    let cache = config
        .app
        .cache_transcripts
        .then(|| TranscriptCache::new(config.app.downloads_dir.clone()));

    let assembler = TranscriptAssembler::new(chunker, cache);

    let video_source = VideoSource::new(
        config.app.downloads_dir.clone(),
        config.app.reuse_downloads,
    );
    let feed_source = FeedSource::new(
        http,
        config.app.downloads_dir.clone(),
        config.app.reuse_downloads,
    );

    Ok(SummaryPipeline::new(
        Arc::new(video_source),
        Arc::new(feed_source),
        assembler,
        Arc::new(summarizer),
    ))
}
