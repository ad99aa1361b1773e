use async_trait::async_trait;
use serde::Deserialize;

use crate::{PipelineError, Result};

/// Trait for the remote speech-to-text service.
///
/// The service accepts at most `max_payload_bytes` per call; the chunk
/// planner uses that ceiling to size its ranges.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TranscriptionBackend: Send + Sync {
    /// Submit one audio payload and return the recognized text
    async fn transcribe(&self, audio: Vec<u8>, file_name: &str, mime_type: &str)
        -> Result<String>;

    /// Maximum payload size accepted per call, in bytes
    fn max_payload_bytes(&self) -> u64;
}

#[derive(Debug, Deserialize)]
struct TranscriptionResponse {
    text: String,
}

/// OpenAI-compatible Whisper transcription client
pub struct WhisperClient {
    client: reqwest::Client,
    api_base: String,
    api_key: String,
    model: String,
    byte_ceiling: u64,
}

impl WhisperClient {
    pub fn new(
        client: reqwest::Client,
        api_base: String,
        api_key: String,
        model: String,
        byte_ceiling: u64,
    ) -> Self {
        Self {
            client,
            api_base: api_base.trim_end_matches('/').to_string(),
            api_key,
            model,
            byte_ceiling,
        }
    }
}

#[async_trait]
impl TranscriptionBackend for WhisperClient {
    async fn transcribe(
        &self,
        audio: Vec<u8>,
        file_name: &str,
        mime_type: &str,
    ) -> Result<String> {
        let url = format!("{}/audio/transcriptions", self.api_base);

        let part = reqwest::multipart::Part::bytes(audio)
            .file_name(file_name.to_string())
            .mime_str(mime_type)
            .map_err(|e| PipelineError::TranscriptionService(e.to_string()))?;

        let form = reqwest::multipart::Form::new()
            .part("file", part)
            .text("model", self.model.clone())
            .text("response_format", "json");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await
            .map_err(|e| PipelineError::TranscriptionService(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(PipelineError::TranscriptionService(format!(
                "HTTP {}: {}",
                status, body
            ))
            .into());
        }

        let parsed: TranscriptionResponse = response
            .json()
            .await
            .map_err(|e| PipelineError::TranscriptionService(e.to_string()))?;

        Ok(parsed.text)
    }

    fn max_payload_bytes(&self) -> u64 {
        self.byte_ceiling
    }
}
