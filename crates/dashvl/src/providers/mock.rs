use std::path::Path;
use std::sync::Mutex;

use async_trait::async_trait;
use futures::stream;
use reqwest::StatusCode;

use super::base::{ChatCompletion, Choice, ChunkStream, ResponseMessage, Transport, UploadedFile};
use crate::errors::{ClientError, Result};
use crate::models::request::ChatRequest;
use crate::models::role::Role;
use crate::stream::StreamChunk;

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Upload(String),
    Complete(ChatRequest),
    Stream(ChatRequest),
    Delete(String),
}

/// A transport that records every call and answers from canned data
pub struct MockTransport {
    calls: Mutex<Vec<Call>>,
    chunks: Vec<StreamChunk>,
    pub fail_upload: bool,
    pub fail_request: bool,
    pub fail_delete: bool,
}

impl MockTransport {
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            chunks: Vec::new(),
            fail_upload: false,
            fail_request: false,
            fail_delete: false,
        }
    }

    pub fn with_chunks(mut self, chunks: Vec<StreamChunk>) -> Self {
        self.chunks = chunks;
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, matches: impl Fn(&Call) -> bool) -> usize {
        self.calls().iter().filter(|call| matches(call)).count()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    fn failure(what: &str) -> ClientError {
        ClientError::Transport {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            body: format!("{what} failed"),
        }
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn complete(&self, request: &ChatRequest) -> Result<ChatCompletion> {
        self.record(Call::Complete(request.clone()));
        if self.fail_request {
            return Err(Self::failure("completion"));
        }

        Ok(ChatCompletion {
            id: "chatcmpl-mock".to_string(),
            model: request.model.clone(),
            choices: vec![Choice {
                index: 0,
                message: ResponseMessage {
                    role: Role::Assistant,
                    content: Some("mock answer".to_string()),
                    reasoning_content: None,
                },
                finish_reason: Some("stop".to_string()),
            }],
            usage: None,
            extra: Default::default(),
        })
    }

    async fn stream(&self, request: &ChatRequest) -> Result<ChunkStream> {
        self.record(Call::Stream(request.clone()));
        if self.fail_request {
            return Err(Self::failure("stream"));
        }

        Ok(Box::pin(stream::iter(
            self.chunks.clone().into_iter().map(Ok),
        )))
    }

    async fn upload_file(&self, path: &Path, _purpose: &str) -> Result<UploadedFile> {
        self.record(Call::Upload(path.display().to_string()));
        if self.fail_upload {
            return Err(Self::failure("upload"));
        }

        Ok(UploadedFile {
            id: "file-mock-1".to_string(),
            local_path: path.to_path_buf(),
        })
    }

    async fn delete_file(&self, file_id: &str) -> Result<()> {
        self.record(Call::Delete(file_id.to_string()));
        if self.fail_delete {
            return Err(Self::failure("delete"));
        }
        Ok(())
    }
}
