use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default payload ceiling of the Whisper endpoint: 25 MiB
pub const DEFAULT_BYTE_CEILING: u64 = 25 * 1024 * 1024;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// OpenAI-compatible service configuration
    pub openai: OpenAiConfig,

    /// Application settings
    pub app: AppConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAiConfig {
    /// Base URL of the OpenAI-compatible API
    pub api_base: String,

    /// Transcription model name
    pub transcription_model: String,

    /// Summarization model name
    pub summary_model: String,

    /// Maximum payload size the transcription endpoint accepts per call
    pub byte_ceiling: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Directory for downloaded episodes and cached transcripts
    pub downloads_dir: PathBuf,

    /// Persist and reuse assembled transcripts keyed by episode id
    pub cache_transcripts: bool,

    /// Reuse an already-downloaded episode audio file
    pub reuse_downloads: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            openai: OpenAiConfig {
                api_base: "https://api.openai.com/v1".to_string(),
                transcription_model: "whisper-1".to_string(),
                summary_model: "gpt-4o-mini".to_string(),
                byte_ceiling: DEFAULT_BYTE_CEILING,
            },
            app: AppConfig {
                downloads_dir: PathBuf::from("downloads"),
                cache_transcripts: true,
                reuse_downloads: true,
            },
        }
    }
}

impl Config {
    /// Load configuration from file or create default
    pub async fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            let content = fs_err::read_to_string(&config_path)
                .context("Failed to read config file")?;

            let config: Config = serde_yaml::from_str(&content)
                .context("Failed to parse config file")?;

            config.validate()?;
            Ok(config)
        } else {
            let config = Self::default();
            config.save().await?;
            Ok(config)
        }
    }

    /// Save configuration to file
    pub async fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            fs_err::create_dir_all(parent)?;
        }

        let content = serde_yaml::to_string(self)
            .context("Failed to serialize config")?;

        fs_err::write(&config_path, content)
            .context("Failed to write config file")?;

        Ok(())
    }

    /// Get configuration file path
    fn config_path() -> Result<PathBuf> {
        // First try current directory for easy testing
        let local_config = PathBuf::from("config.yaml");
        if local_config.exists() {
            return Ok(local_config);
        }

        let config_dir = dirs::config_dir()
            .context("Could not determine config directory")?;

        Ok(config_dir.join("podbrief").join("config.yaml"))
    }

    /// Validate configuration
    fn validate(&self) -> Result<()> {
        if self.openai.api_base.is_empty() {
            anyhow::bail!("OpenAI API base URL must be configured");
        }

        if self.openai.byte_ceiling == 0 {
            anyhow::bail!("Transcription byte ceiling must be greater than zero");
        }

        Ok(())
    }

    /// Read the API key from the environment; never stored in the config file
    pub fn api_key() -> Result<String> {
        std::env::var("OPENAI_API_KEY")
            .context("OPENAI_API_KEY environment variable is not set")
    }

    /// Display current configuration
    pub fn display(&self) {
        println!("Current Configuration:");
        println!("  API Base: {}", self.openai.api_base);
        println!("  Transcription Model: {}", self.openai.transcription_model);
        println!("  Summary Model: {}", self.openai.summary_model);
        println!(
            "  Byte Ceiling: {}",
            crate::utils::format_file_size(self.openai.byte_ceiling)
        );
        println!("  Downloads Dir: {}", self.app.downloads_dir.display());
        println!("  Cache Transcripts: {}", self.app.cache_transcripts);
        println!("  Reuse Downloads: {}", self.app.reuse_downloads);
    }
}
