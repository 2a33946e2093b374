use reqwest::Response;
use serde::Deserialize;

use super::base::Usage;
use crate::errors::{ClientError, Result};
use crate::stream::StreamChunk;

/// Marker the service sends as the data of its last server-sent event
pub const STREAM_DONE: &str = "[DONE]";

#[derive(Debug, Deserialize)]
struct StreamEvent {
    #[serde(default)]
    choices: Vec<StreamChoice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct StreamChoice {
    #[serde(default)]
    delta: StreamDelta,
}

#[derive(Debug, Default, Deserialize)]
struct StreamDelta {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    reasoning_content: Option<String>,
}

/// Convert the JSON data of one streamed event into chunks.
///
/// A delta carrying `reasoning_content` belongs to the reasoning channel,
/// anything else with `content` to the answer. The usage summary arrives on
/// an event with no choices.
pub fn stream_event_to_chunks(data: &str) -> Result<Vec<StreamChunk>> {
    let event: StreamEvent = serde_json::from_str(data)?;
    let mut chunks = Vec::new();

    if let Some(choice) = event.choices.into_iter().next() {
        match choice.delta {
            StreamDelta {
                reasoning_content: Some(reasoning),
                ..
            } => chunks.push(StreamChunk::reasoning(reasoning)),
            StreamDelta {
                content: Some(content),
                ..
            } => chunks.push(StreamChunk::answer(content)),
            _ => {}
        }
    }

    if let Some(usage) = event.usage {
        let usage = Usage::new(usage.prompt_tokens, usage.completion_tokens, usage.total_tokens);
        chunks.push(StreamChunk::Usage(usage));
    }

    Ok(chunks)
}

/// Turn a non-success response into a transport error carrying the body
pub async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    tracing::debug!(%status, %body, "request rejected by service");
    Err(ClientError::Transport { status, body })
}
