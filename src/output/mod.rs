use anyhow::Result;
use std::path::Path;

use crate::cli::OutputFormat;
use crate::pipeline::PipelineResponse;

fn format_response(response: &PipelineResponse, format: &OutputFormat) -> Result<String> {
    let content = match format {
        OutputFormat::Text => format_as_text(response),
        OutputFormat::Json => serde_json::to_string_pretty(response)?,
    };
    Ok(content)
}

fn format_as_text(response: &PipelineResponse) -> String {
    match response {
        PipelineResponse::Success {
            title,
            summary,
            channel,
            duration_string,
            release_date,
            ..
        } => {
            let mut out = String::new();
            out.push_str(&format!("{}\n", title));
            if !channel.is_empty() {
                out.push_str(channel);
                if !release_date.is_empty() {
                    out.push_str(&format!(" - {}", release_date));
                }
                if !duration_string.is_empty() {
                    out.push_str(&format!(" ({})", duration_string));
                }
                out.push('\n');
            }
            out.push('\n');
            out.push_str(summary);
            out.push('\n');
            out
        }
        PipelineResponse::Failure { error, .. } => format!("Error: {}\n", error),
    }
}

/// Save the pipeline response to file
pub async fn save_to_file(
    response: &PipelineResponse,
    path: &Path,
    format: &OutputFormat,
) -> Result<()> {
    let content = format_response(response, format)?;
    fs_err::write(path, content)?;
    Ok(())
}

/// Print the pipeline response to console
pub fn print_to_console(response: &PipelineResponse, format: &OutputFormat) -> Result<()> {
    let content = format_response(response, format)?;
    println!("{}", content);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn success_response() -> PipelineResponse {
        serde_json::from_value(serde_json::json!({
            "success": true,
            "title": "Episode 42",
            "summary": "A summary.",
            "thumbnail": "",
            "channel": "Test Show",
            "duration_string": "10:00",
            "release_date": "2026-01-14",
        }))
        .unwrap()
    }

    #[test]
    fn text_output_includes_header_and_summary() {
        let text = format_as_text(&success_response());
        assert!(text.starts_with("Episode 42\n"));
        assert!(text.contains("Test Show - 2026-01-14 (10:00)"));
        assert!(text.contains("A summary."));
    }

    #[test]
    fn failure_renders_as_error_line() {
        let failure: PipelineResponse = serde_json::from_value(serde_json::json!({
            "success": false,
            "error": "boom",
        }))
        .unwrap();
        assert_eq!(format_as_text(&failure), "Error: boom\n");
    }

    #[test]
    fn json_output_round_trips() {
        let json = format_response(&success_response(), &OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["success"], true);
        assert_eq!(value["title"], "Episode 42");
    }
}
