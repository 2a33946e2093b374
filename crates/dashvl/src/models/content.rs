use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageUrl {
    pub url: String,
}

/// An image reference, optionally carrying the pixel bounds the service
/// rescales the image into before inference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRef {
    pub image_url: ImageUrl,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_pixels: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_pixels: Option<u32>,
}

impl ImageRef {
    pub fn url(&self) -> &str {
        &self.image_url.url
    }
}

/// A video given as an ordered list of frame image URLs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoRef {
    #[serde(rename = "video")]
    pub frames: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextPart {
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
/// One typed part of a multimodal message
pub enum ContentPart {
    Text(TextPart),
    #[serde(rename = "image_url")]
    Image(ImageRef),
    Video(VideoRef),
}

impl ContentPart {
    pub fn text<S: Into<String>>(text: S) -> Self {
        ContentPart::Text(TextPart { text: text.into() })
    }

    pub fn image<S: Into<String>>(url: S) -> Self {
        ContentPart::Image(ImageRef {
            image_url: ImageUrl { url: url.into() },
            min_pixels: None,
            max_pixels: None,
        })
    }

    pub fn image_with_bounds<S: Into<String>>(url: S, min_pixels: u32, max_pixels: u32) -> Self {
        ContentPart::Image(ImageRef {
            image_url: ImageUrl { url: url.into() },
            min_pixels: Some(min_pixels),
            max_pixels: Some(max_pixels),
        })
    }

    pub fn video<I, S>(frames: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ContentPart::Video(VideoRef {
            frames: frames.into_iter().map(Into::into).collect(),
        })
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            ContentPart::Text(text) => Some(&text.text),
            _ => None,
        }
    }

    pub fn as_image(&self) -> Option<&ImageRef> {
        match self {
            ContentPart::Image(image) => Some(image),
            _ => None,
        }
    }

    pub fn as_video(&self) -> Option<&VideoRef> {
        match self {
            ContentPart::Video(video) => Some(video),
            _ => None,
        }
    }
}
