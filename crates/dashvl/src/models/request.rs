use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::message::Message;
use crate::errors::{ClientError, Result};

/// Extra request parameters, merged verbatim into the request body.
pub type Options = Map<String, Value>;

const MODEL_KEY: &str = "model";
const MESSAGES_KEY: &str = "messages";

#[derive(Debug, Clone, PartialEq, Deserialize)]
/// A chat-completion request ready to hand to a transport
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<Message>,
    #[serde(flatten)]
    pub options: Options,
}

impl ChatRequest {
    pub fn new<S: Into<String>>(model: S, messages: Vec<Message>) -> Result<Self> {
        if messages.is_empty() {
            return Err(ClientError::InvalidRequest(
                "a request needs at least one message".to_string(),
            ));
        }

        Ok(Self {
            model: model.into(),
            messages,
            options: Options::new(),
        })
    }

    /// Set a single option, replacing any previous value under the same key
    pub fn with_option<S: Into<String>>(mut self, key: S, value: Value) -> Self {
        self.options.insert(key.into(), value);
        self
    }

    /// Merge caller options on top of the current ones; caller keys win.
    ///
    /// `model` and `messages` replace the typed fields and must have the same
    /// shape they have on the wire.
    pub fn merge_options(mut self, options: &Options) -> Result<Self> {
        for (key, value) in options {
            match key.as_str() {
                MODEL_KEY => {
                    self.model = value
                        .as_str()
                        .filter(|model| !model.trim().is_empty())
                        .ok_or_else(|| {
                            ClientError::InvalidRequest(
                                "the model option must be a non-empty string".to_string(),
                            )
                        })?
                        .to_string();
                }
                MESSAGES_KEY => {
                    let messages: Vec<Message> = serde_json::from_value(value.clone())
                        .map_err(|e| {
                            ClientError::InvalidRequest(format!("invalid messages option: {e}"))
                        })?;
                    if messages.is_empty() {
                        return Err(ClientError::InvalidRequest(
                            "a request needs at least one message".to_string(),
                        ));
                    }
                    self.messages = messages;
                }
                _ => {
                    self.options.insert(key.clone(), value.clone());
                }
            }
        }
        Ok(self)
    }

    /// Whether the request asks the service for an incremental response
    pub fn is_stream(&self) -> bool {
        self.flag("stream")
    }

    /// Whether the service will send a reasoning trace before the answer
    pub fn is_thinking(&self) -> bool {
        self.flag("enable_thinking")
    }

    fn flag(&self, key: &str) -> bool {
        self.options
            .get(key)
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }
}

// The typed fields always win on the wire, so the body never carries a key twice
// even when `options` is edited directly.
impl Serialize for ChatRequest {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let extra = self
            .options
            .iter()
            .filter(|(key, _)| key.as_str() != MODEL_KEY && key.as_str() != MESSAGES_KEY);

        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry(MODEL_KEY, &self.model)?;
        map.serialize_entry(MESSAGES_KEY, &self.messages)?;
        for (key, value) in extra {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}
