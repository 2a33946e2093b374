use std::fmt;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::errors::Result;
use crate::models::request::ChatRequest;
use crate::models::role::Role;
use crate::stream::StreamChunk;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: Option<u32>,
    pub completion_tokens: Option<u32>,
    pub total_tokens: Option<u32>,
}

impl Usage {
    pub fn new(
        prompt_tokens: Option<u32>,
        completion_tokens: Option<u32>,
        total_tokens: Option<u32>,
    ) -> Self {
        let total_tokens = total_tokens.or(match (prompt_tokens, completion_tokens) {
            (Some(prompt), Some(completion)) => prompt.checked_add(completion),
            _ => None,
        });

        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens,
        }
    }
}

impl fmt::Display for Usage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn count(value: Option<u32>) -> String {
            value.map_or_else(|| "-".to_string(), |v| v.to_string())
        }

        write!(
            f,
            "prompt_tokens={} completion_tokens={} total_tokens={}",
            count(self.prompt_tokens),
            count(self.completion_tokens),
            count(self.total_tokens)
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseMessage {
    pub role: Role,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning_content: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Choice {
    #[serde(default)]
    pub index: u32,
    pub message: ResponseMessage,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

/// A complete (non-streamed) chat-completion response.
///
/// Fields the service adds beyond the ones modelled here are kept in `extra`
/// so the response can be printed back in full.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatCompletion {
    #[serde(default)]
    pub id: String,
    pub model: String,
    pub choices: Vec<Choice>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ChatCompletion {
    /// Content of the first choice, if any
    pub fn text(&self) -> Option<&str> {
        self.choices
            .first()
            .and_then(|choice| choice.message.content.as_deref())
    }
}

/// A file held by the remote service for the duration of one request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    pub id: String,
    pub local_path: PathBuf,
}

impl UploadedFile {
    /// The reference a document request uses to point at this file
    pub fn reference(&self) -> String {
        format!("fileid://{}", self.id)
    }
}

pub type ChunkStream = BoxStream<'static, Result<StreamChunk>>;

/// The remote inference service (DashScope, or a test double)
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send a request and wait for the whole response
    async fn complete(&self, request: &ChatRequest) -> Result<ChatCompletion>;

    /// Send a request and return the incremental chunks as they arrive
    async fn stream(&self, request: &ChatRequest) -> Result<ChunkStream>;

    /// Upload a local file under the given purpose tag
    async fn upload_file(&self, path: &Path, purpose: &str) -> Result<UploadedFile>;

    /// Delete a previously uploaded file
    async fn delete_file(&self, file_id: &str) -> Result<()>;
}
