//! Scoped use of uploaded files.
//!
//! An uploaded file must be deleted exactly once after the request that uses
//! it, whether that request succeeds, fails or is cancelled.

use std::future::Future;
use std::path::Path;

use tokio_util::sync::CancellationToken;

use crate::errors::{ClientError, Result};
use crate::providers::base::{Transport, UploadedFile};

/// Purpose tag for files the service should extract text from
pub const FILE_EXTRACT_PURPOSE: &str = "file-extract";

/// Upload `path`, run `f` with the uploaded file, then delete the upload.
///
/// The delete runs on every exit path of `f`, including cancellation through
/// `cancel`. If only the delete fails the result is
/// [`ClientError::ResourceCleanup`]; if both fail the request error stays
/// primary inside [`ClientError::CleanupAfterFailure`].
pub async fn with_uploaded_file<R, F, Fut>(
    transport: &(impl Transport + ?Sized),
    path: &Path,
    purpose: &str,
    cancel: &CancellationToken,
    f: F,
) -> Result<R>
where
    F: FnOnce(UploadedFile) -> Fut,
    Fut: Future<Output = Result<R>>,
{
    let file = transport.upload_file(path, purpose).await?;
    let file_id = file.id.clone();

    let outcome = tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(ClientError::Cancelled),
        result = f(file) => result,
    };

    let cleanup = transport.delete_file(&file_id).await;

    match (outcome, cleanup) {
        (Ok(value), Ok(())) => Ok(value),
        (Ok(_), Err(err)) => {
            tracing::warn!(%file_id, error = %err, "failed to delete uploaded file");
            Err(ClientError::ResourceCleanup {
                file_id,
                source: Box::new(err),
            })
        }
        (Err(err), Ok(())) => Err(err),
        (Err(primary), Err(cleanup)) => {
            tracing::warn!(
                %file_id,
                error = %cleanup,
                "failed to delete uploaded file after request error"
            );
            Err(ClientError::CleanupAfterFailure {
                primary: Box::new(primary),
                cleanup: Box::new(cleanup),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::message::Message;
    use crate::models::request::ChatRequest;
    use crate::providers::mock::{Call, MockTransport};
    use std::path::PathBuf;

    fn path() -> PathBuf {
        PathBuf::from("report.pdf")
    }

    async fn use_file(transport: &MockTransport, file: UploadedFile) -> Result<String> {
        let request = ChatRequest::new("qwen-long", vec![Message::system(file.reference())])?;
        let completion = transport.complete(&request).await?;
        Ok(completion.text().unwrap_or_default().to_string())
    }

    #[tokio::test]
    async fn test_success_deletes_once() {
        let transport = MockTransport::new();
        let cancel = CancellationToken::new();

        let answer = with_uploaded_file(&transport, &path(), FILE_EXTRACT_PURPOSE, &cancel, |file| {
            use_file(&transport, file)
        })
        .await
        .unwrap();

        assert_eq!(answer, "mock answer");
        let calls = transport.calls();
        assert!(matches!(calls[0], Call::Upload(_)));
        assert!(matches!(calls[1], Call::Complete(_)));
        assert_eq!(calls[2], Call::Delete("file-mock-1".to_string()));
        assert_eq!(calls.len(), 3);
    }

    #[tokio::test]
    async fn test_request_failure_still_deletes() {
        let mut transport = MockTransport::new();
        transport.fail_request = true;
        let cancel = CancellationToken::new();

        let err = with_uploaded_file(&transport, &path(), FILE_EXTRACT_PURPOSE, &cancel, |file| {
            use_file(&transport, file)
        })
        .await
        .unwrap_err();

        assert!(matches!(err, ClientError::Transport { .. }));
        assert_eq!(transport.count(|call| matches!(call, Call::Delete(_))), 1);
    }

    #[tokio::test]
    async fn test_failed_upload_skips_request_and_delete() {
        let mut transport = MockTransport::new();
        transport.fail_upload = true;
        let cancel = CancellationToken::new();

        let err = with_uploaded_file(&transport, &path(), FILE_EXTRACT_PURPOSE, &cancel, |file| {
            use_file(&transport, file)
        })
        .await
        .unwrap_err();

        assert!(matches!(err, ClientError::Transport { .. }));
        assert_eq!(transport.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_delete_failure_is_reported() {
        let mut transport = MockTransport::new();
        transport.fail_delete = true;
        let cancel = CancellationToken::new();

        let err = with_uploaded_file(&transport, &path(), FILE_EXTRACT_PURPOSE, &cancel, |file| {
            use_file(&transport, file)
        })
        .await
        .unwrap_err();

        match err {
            ClientError::ResourceCleanup { file_id, .. } => assert_eq!(file_id, "file-mock-1"),
            other => panic!("Expected cleanup error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_both_failures_keep_request_error_primary() {
        let mut transport = MockTransport::new();
        transport.fail_request = true;
        transport.fail_delete = true;
        let cancel = CancellationToken::new();

        let err = with_uploaded_file(&transport, &path(), FILE_EXTRACT_PURPOSE, &cancel, |file| {
            use_file(&transport, file)
        })
        .await
        .unwrap_err();

        assert!(matches!(err, ClientError::CleanupAfterFailure { .. }));
        assert!(err.to_string().starts_with("Request failed"));
        assert!(err.to_string().contains("delete failed"));
        assert_eq!(transport.count(|call| matches!(call, Call::Delete(_))), 1);
    }

    #[tokio::test]
    async fn test_cancellation_still_deletes() {
        let transport = MockTransport::new();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = with_uploaded_file(&transport, &path(), FILE_EXTRACT_PURPOSE, &cancel, |_file| {
            futures::future::pending::<Result<()>>()
        })
        .await
        .unwrap_err();

        assert!(matches!(err, ClientError::Cancelled));
        assert_eq!(
            transport.calls(),
            vec![
                Call::Upload("report.pdf".to_string()),
                Call::Delete("file-mock-1".to_string())
            ]
        );
    }
}
