use serde_json::{json, Value};

use super::RequestProcessor;
use crate::errors::{ClientError, Result};
use crate::models::content::ContentPart;
use crate::models::message::Message;
use crate::models::request::{ChatRequest, Options};
use crate::prompt_template::ocr_extraction_prompt;

/// Below this many pixels the service upscales the image, keeping its aspect ratio
pub const DEFAULT_MIN_PIXELS: u32 = 28 * 28 * 4;
/// Above this many pixels the service downscales the image, keeping its aspect ratio
pub const DEFAULT_MAX_PIXELS: u32 = 28 * 28 * 8192;

pub const TRAIN_TICKET_PROMPT: &str = "Extract the invoice number, train number, departure station, \
arrival station, departure date and time, seat number, seat class, fare, ID card number and \
passenger name from the train ticket image. Extract these fields accurately without omitting or \
inventing information; replace any single character that is blurred or hidden by glare with an \
English question mark \"?\". Return the result as JSON in the form: {\"invoice_number\": \"xxx\", \
\"train_number\": \"xxx\", \"departure_station\": \"xxx\", \"arrival_station\": \"xxx\", \
\"departure_time\": \"xxx\", \"seat_number\": \"xxx\", \"seat_class\": \"xxx\", \"fare\": \"xxx\", \
\"id_number\": \"xxx\", \"passenger_name\": \"xxx\"}";

/// Fields extracted from an invoice when no schema is given
pub fn default_invoice_schema() -> Value {
    json!({
        "seller_name": "",
        "buyer_name": "",
        "price_excluding_tax": "",
        "organization_code": "",
        "invoice_code": ""
    })
}

/// Structured text extraction from an image
#[derive(Debug, Clone)]
pub struct OcrExtraction {
    pub model: String,
    pub image_url: String,
    /// Target JSON shape; values are empty placeholders, list values are
    /// per-element templates
    pub schema: Option<Value>,
    /// Replaces the generated extraction instruction entirely
    pub custom_prompt: Option<String>,
    pub min_pixels: u32,
    pub max_pixels: u32,
    pub options: Options,
}

impl OcrExtraction {
    pub fn new<M, U>(model: M, image_url: U) -> Self
    where
        M: Into<String>,
        U: Into<String>,
    {
        Self {
            model: model.into(),
            image_url: image_url.into(),
            schema: None,
            custom_prompt: None,
            min_pixels: DEFAULT_MIN_PIXELS,
            max_pixels: DEFAULT_MAX_PIXELS,
            options: Options::new(),
        }
    }

    /// Ticket extraction with the fixed train-ticket instruction
    pub fn train_ticket<M, U>(model: M, image_url: U) -> Self
    where
        M: Into<String>,
        U: Into<String>,
    {
        Self::new(model, image_url).with_custom_prompt(TRAIN_TICKET_PROMPT)
    }

    pub fn with_schema(mut self, schema: Value) -> Self {
        self.schema = Some(schema);
        self
    }

    pub fn with_custom_prompt<S: Into<String>>(mut self, prompt: S) -> Self {
        self.custom_prompt = Some(prompt.into());
        self
    }

    pub fn with_pixel_bounds(mut self, min_pixels: u32, max_pixels: u32) -> Self {
        self.min_pixels = min_pixels;
        self.max_pixels = max_pixels;
        self
    }

    pub fn with_options(mut self, options: Options) -> Self {
        self.options = options;
        self
    }

    /// The text instruction sent alongside the image
    pub fn instruction(&self) -> Result<String> {
        if let Some(prompt) = self.custom_prompt.as_ref().filter(|p| !p.trim().is_empty()) {
            return Ok(prompt.clone());
        }

        let schema = match &self.schema {
            Some(Value::String(raw)) => raw.trim().to_string(),
            Some(schema) => serde_json::to_string(schema)?,
            None => default_invoice_schema().to_string(),
        };
        Ok(ocr_extraction_prompt(&schema)?)
    }
}

impl RequestProcessor for OcrExtraction {
    fn build(&self) -> Result<ChatRequest> {
        if self.min_pixels > self.max_pixels {
            return Err(ClientError::InvalidRequest(format!(
                "min_pixels ({}) is larger than max_pixels ({})",
                self.min_pixels, self.max_pixels
            )));
        }

        let message = Message::user_parts(vec![
            ContentPart::image_with_bounds(&self.image_url, self.min_pixels, self.max_pixels),
            ContentPart::text(self.instruction()?),
        ]);

        ChatRequest::new(&self.model, vec![message])?.merge_options(&self.options)
    }
}
