use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::sources::Platform;

#[derive(Parser)]
#[command(
    name = "podbrief",
    about = "Podbrief - Summarize podcast and video episodes with Whisper transcription",
    version,
    long_about = "Downloads an episode from a video platform or podcast RSS feed, transcribes it \
with an OpenAI-compatible Whisper endpoint (splitting oversized audio into sequential chunks), \
and produces an abstractive summary at a chosen level of detail."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable progress indicators
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Download, transcribe, and summarize one episode
    Summarize {
        /// Video URL or podcast feed URL
        #[arg(value_name = "SOURCE")]
        source: String,

        /// Which platform resolves the source
        #[arg(short, long, value_enum, default_value = "video")]
        platform: Platform,

        /// Episode title to select within a feed (latest entry if omitted)
        #[arg(short, long, value_name = "TITLE")]
        episode: Option<String>,

        /// Summary detail level between 0.0 (terse) and 1.0 (in-depth)
        #[arg(short, long, default_value = "0.3", value_parser = parse_detail)]
        detail: f64,

        /// Output file path (prints to console if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Show or initialize configuration
    Config {
        /// Show current configuration
        #[arg(short, long)]
        show: bool,
    },

    /// List supported platforms
    Platforms,
}

fn parse_detail(raw: &str) -> Result<f64, String> {
    let value: f64 = raw.parse().map_err(|_| format!("`{}` is not a number", raw))?;
    if !(0.0..=1.0).contains(&value) {
        return Err("detail level must be between 0.0 and 1.0".to_string());
    }
    Ok(value)
}

#[derive(ValueEnum, Clone, Debug)]
pub enum OutputFormat {
    /// Plain text summary with a metadata header
    Text,
    /// Full response as JSON
    Json,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detail_values_outside_unit_interval_are_rejected() {
        assert!(parse_detail("0.0").is_ok());
        assert!(parse_detail("1.0").is_ok());
        assert!(parse_detail("0.45").is_ok());
        assert!(parse_detail("1.5").is_err());
        assert!(parse_detail("-0.1").is_err());
        assert!(parse_detail("high").is_err());
    }
}
