use std::path::{Path, PathBuf};

use tokio_util::sync::CancellationToken;

use crate::errors::{ClientError, Result};
use crate::lifecycle::{with_uploaded_file, FILE_EXTRACT_PURPOSE};
use crate::models::message::Message;
use crate::models::request::{ChatRequest, Options};
use crate::providers::base::{ChatCompletion, Transport, UploadedFile};
use crate::stream::{consume_stream, StreamAccumulator, StreamOutcome, StreamSink};

pub const SUPPORTED_EXTENSIONS: [&str; 7] = ["txt", "pdf", "docx", "pptx", "xlsx", "html", "md"];
pub const DEFAULT_QUERY: &str = "What is this document about?";

/// Check the file extension against the formats the service can extract
pub fn check_document_format(path: &Path) -> Result<()> {
    let extension = path
        .extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .unwrap_or_default();

    if SUPPORTED_EXTENSIONS.contains(&extension.as_str()) {
        return Ok(());
    }

    Err(ClientError::UnsupportedFormat {
        extension: if extension.is_empty() {
            "(none)".to_string()
        } else {
            format!(".{}", extension)
        },
        supported: SUPPORTED_EXTENSIONS
            .iter()
            .map(|ext| format!(".{}", ext))
            .collect::<Vec<_>>()
            .join(", "),
    })
}

/// A question about a local document, answered from an uploaded copy
#[derive(Debug, Clone)]
pub struct DocumentQuery {
    pub model: String,
    pub path: PathBuf,
    pub query: String,
    pub options: Options,
}

impl DocumentQuery {
    pub fn new<M, P>(model: M, path: P) -> Self
    where
        M: Into<String>,
        P: Into<PathBuf>,
    {
        Self {
            model: model.into(),
            path: path.into(),
            query: DEFAULT_QUERY.to_string(),
            options: Options::new(),
        }
    }

    pub fn with_query<S: Into<String>>(mut self, query: S) -> Self {
        let query = query.into();
        if !query.trim().is_empty() {
            self.query = query;
        }
        self
    }

    pub fn with_options(mut self, options: Options) -> Self {
        self.options = options;
        self
    }

    pub fn validate(&self) -> Result<()> {
        check_document_format(&self.path)
    }

    /// The request referencing an already uploaded copy of the document
    pub fn build_with_file(&self, file: &UploadedFile) -> Result<ChatRequest> {
        let messages = vec![Message::system(file.reference()), Message::user(&self.query)];
        ChatRequest::new(&self.model, messages)?.merge_options(&self.options)
    }
}

/// What a document request produced
#[derive(Debug, Clone)]
pub enum DocumentAnswer {
    Complete(ChatCompletion),
    Streamed(StreamOutcome),
}

/// Validate, upload, ask and clean up.
///
/// Streams into `sink` when the query's options ask for streaming. The upload
/// is deleted before this returns, on every path.
pub async fn run_document(
    transport: &(impl Transport + ?Sized),
    query: &DocumentQuery,
    sink: &mut impl StreamSink,
    cancel: &CancellationToken,
) -> Result<DocumentAnswer> {
    query.validate()?;

    with_uploaded_file(transport, &query.path, FILE_EXTRACT_PURPOSE, cancel, |file| async move {
        let request = query.build_with_file(&file)?;
        if !request.is_stream() {
            return Ok(DocumentAnswer::Complete(transport.complete(&request).await?));
        }

        let stream = transport.stream(&request).await?;
        let mut accumulator = StreamAccumulator::new(false);
        consume_stream(stream, &mut accumulator, sink, cancel).await?;
        Ok(DocumentAnswer::Streamed(accumulator.finish()))
    })
    .await
}
