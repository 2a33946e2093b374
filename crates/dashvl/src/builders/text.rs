use super::RequestProcessor;
use crate::errors::Result;
use crate::models::message::Message;
use crate::models::request::{ChatRequest, Options};

/// A plain text conversation; messages are sent as given
#[derive(Debug, Clone)]
pub struct TextChat {
    pub model: String,
    pub messages: Vec<Message>,
    pub options: Options,
}

impl TextChat {
    pub fn new<S: Into<String>>(model: S, messages: Vec<Message>) -> Self {
        Self {
            model: model.into(),
            messages,
            options: Options::new(),
        }
    }

    pub fn with_options(mut self, options: Options) -> Self {
        self.options = options;
        self
    }
}

impl RequestProcessor for TextChat {
    fn build(&self) -> Result<ChatRequest> {
        ChatRequest::new(&self.model, self.messages.clone())?.merge_options(&self.options)
    }
}
