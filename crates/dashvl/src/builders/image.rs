use serde_json::json;

use super::RequestProcessor;
use crate::errors::Result;
use crate::models::content::ContentPart;
use crate::models::message::Message;
use crate::models::request::{ChatRequest, Options};

pub const DEFAULT_THINKING_BUDGET: u32 = 81920;

/// Ask a question about a single image
#[derive(Debug, Clone)]
pub struct ImageAnalysis {
    pub model: String,
    pub image_url: String,
    pub prompt: String,
    pub stream: bool,
    pub enable_thinking: bool,
    pub thinking_budget: u32,
    pub options: Options,
}

impl ImageAnalysis {
    /// Streaming with the reasoning trace on, as the service's reasoning
    /// models expect.
    pub fn new<M, U, P>(model: M, image_url: U, prompt: P) -> Self
    where
        M: Into<String>,
        U: Into<String>,
        P: Into<String>,
    {
        Self {
            model: model.into(),
            image_url: image_url.into(),
            prompt: prompt.into(),
            stream: true,
            enable_thinking: true,
            thinking_budget: DEFAULT_THINKING_BUDGET,
            options: Options::new(),
        }
    }

    pub fn with_stream(mut self, stream: bool) -> Self {
        self.stream = stream;
        self
    }

    pub fn with_thinking(mut self, enable_thinking: bool) -> Self {
        self.enable_thinking = enable_thinking;
        self
    }

    pub fn with_thinking_budget(mut self, thinking_budget: u32) -> Self {
        self.thinking_budget = thinking_budget;
        self
    }

    pub fn with_options(mut self, options: Options) -> Self {
        self.options = options;
        self
    }
}

impl RequestProcessor for ImageAnalysis {
    fn build(&self) -> Result<ChatRequest> {
        let message = Message::user_parts(vec![
            ContentPart::image(&self.image_url),
            ContentPart::text(&self.prompt),
        ]);

        let mut request = ChatRequest::new(&self.model, vec![message])?
            .with_option("stream", json!(self.stream))
            .with_option("enable_thinking", json!(self.enable_thinking))
            .with_option("thinking_budget", json!(self.thinking_budget));
        if self.stream {
            request = request.with_option("stream_options", json!({ "include_usage": true }));
        }

        request.merge_options(&self.options)
    }
}
