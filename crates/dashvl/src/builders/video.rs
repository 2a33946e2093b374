use super::RequestProcessor;
use crate::errors::{ClientError, Result};
use crate::models::content::ContentPart;
use crate::models::message::Message;
use crate::models::request::{ChatRequest, Options};

/// Ask about a video supplied as decomposed frames.
///
/// The service is given frame image URLs in playback order, never a video
/// container.
#[derive(Debug, Clone)]
pub struct VideoAnalysis {
    pub model: String,
    pub frames: Vec<String>,
    pub prompt: String,
    pub options: Options,
}

impl VideoAnalysis {
    pub fn new<M, P>(model: M, frames: Vec<String>, prompt: P) -> Self
    where
        M: Into<String>,
        P: Into<String>,
    {
        Self {
            model: model.into(),
            frames,
            prompt: prompt.into(),
            options: Options::new(),
        }
    }

    pub fn with_options(mut self, options: Options) -> Self {
        self.options = options;
        self
    }
}

impl RequestProcessor for VideoAnalysis {
    fn build(&self) -> Result<ChatRequest> {
        if self.frames.is_empty() {
            return Err(ClientError::InvalidRequest(
                "video analysis needs at least one frame".to_string(),
            ));
        }

        let message = Message::user_parts(vec![
            ContentPart::video(self.frames.iter().cloned()),
            ContentPart::text(&self.prompt),
        ]);

        ChatRequest::new(&self.model, vec![message])?.merge_options(&self.options)
    }
}
