//! Request builders, one per modality.
//!
//! Builders are plain values: they hold what the caller supplied and turn it
//! into a [`ChatRequest`] without touching the network. Every builder accepts
//! an open [`Options`](crate::models::request::Options) map that is merged into
//! the final request last, so caller keys override generated ones.

pub mod document;
pub mod image;
pub mod ocr;
pub mod text;
pub mod video;

use crate::errors::Result;
use crate::models::request::ChatRequest;

pub use document::DocumentQuery;
pub use image::ImageAnalysis;
pub use ocr::OcrExtraction;
pub use text::TextChat;
pub use video::VideoAnalysis;

pub trait RequestProcessor {
    /// Build the request this value describes
    fn build(&self) -> Result<ChatRequest>;
}
