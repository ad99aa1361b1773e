use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use crate::{PipelineError, Result};

/// Trait for mapping transcript text plus a detail dial to a summary.
///
/// `detail` is a caller-supplied value in `[0.0, 1.0]`; only the summarizer
/// interprets it.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize(&self, transcript: &str, detail: f64) -> Result<String>;
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: String,
}

/// Abstractive summarizer backed by an OpenAI-compatible chat completions endpoint
pub struct OpenAiSummarizer {
    client: reqwest::Client,
    api_base: String,
    api_key: String,
    model: String,
}

impl OpenAiSummarizer {
    pub fn new(client: reqwest::Client, api_base: String, api_key: String, model: String) -> Self {
        Self {
            client,
            api_base: api_base.trim_end_matches('/').to_string(),
            api_key,
            model,
        }
    }

    /// Map the detail dial to a target summary length instruction
    fn length_instruction(detail: f64) -> &'static str {
        match detail {
            d if d < 0.25 => "Write a concise summary of 3-5 sentences.",
            d if d < 0.5 => "Write a summary of one to two paragraphs.",
            d if d < 0.75 => {
                "Write a detailed summary of several paragraphs covering each major topic."
            }
            _ => {
                "Write an in-depth summary with a section per topic, \
                 including notable quotes and specific claims."
            }
        }
    }
}

#[async_trait]
impl Summarizer for OpenAiSummarizer {
    async fn summarize(&self, transcript: &str, detail: f64) -> Result<String> {
        let url = format!("{}/chat/completions", self.api_base);

        let system_prompt = format!(
            "You summarize podcast and video episode transcripts. {}",
            Self::length_instruction(detail)
        );

        let body = json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": system_prompt },
                { "role": "user", "content": transcript },
            ],
        });

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| PipelineError::SummarizationService(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(PipelineError::SummarizationService(format!(
                "HTTP {}: {}",
                status, body
            ))
            .into());
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| PipelineError::SummarizationService(e.to_string()))?;

        parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| {
                PipelineError::SummarizationService("response contained no choices".to_string())
                    .into()
            })
    }
}
