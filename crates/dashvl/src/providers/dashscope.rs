use std::path::Path;
use std::sync::Arc;

use async_stream::stream;
use async_trait::async_trait;
use eventsource_stream::Eventsource;
use futures::{Stream, StreamExt};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response};
use serde::Deserialize;
use serde_json::json;

use super::base::{ChatCompletion, ChunkStream, Transport, UploadedFile};
use super::configs::ClientConfig;
use super::utils::{check_status, stream_event_to_chunks, STREAM_DONE};
use crate::errors::{ClientError, Result};
use crate::key_manager::{get_api_key, Environment, RealEnvironment, API_KEY_ENV};
use crate::models::request::ChatRequest;
use crate::stream::StreamChunk;

#[derive(Debug, Deserialize)]
struct FileObject {
    id: String,
}

/// HTTP transport for the DashScope OpenAI-compatible endpoint
pub struct DashScopeClient {
    client: Client,
    config: ClientConfig,
    environment: Arc<dyn Environment>,
}

impl DashScopeClient {
    pub fn new(config: ClientConfig) -> Result<Self> {
        let client = Client::builder().timeout(config.timeout).build()?;

        Ok(Self {
            client,
            config,
            environment: Arc::new(RealEnvironment),
        })
    }

    /// Look up `DASHSCOPE_API_KEY` in `environment` instead of the process environment
    pub fn with_environment(mut self, environment: impl Environment + 'static) -> Self {
        self.environment = Arc::new(environment);
        self
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn api_key(&self) -> Result<String> {
        get_api_key(
            self.config.api_key.as_deref(),
            API_KEY_ENV,
            self.environment.as_ref(),
        )
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.config.base_url.trim_end_matches('/'), path)
    }

    async fn post_chat(&self, request: &ChatRequest) -> Result<reqwest::Response> {
        let api_key = self.api_key()?;
        tracing::debug!(
            model = %request.model,
            messages = request.messages.len(),
            stream = request.is_stream(),
            "sending chat completion"
        );

        let response = self
            .client
            .post(self.url("chat/completions"))
            .bearer_auth(api_key)
            .json(request)
            .send()
            .await?;

        check_status(response).await
    }
}

#[async_trait]
impl Transport for DashScopeClient {
    async fn complete(&self, request: &ChatRequest) -> Result<ChatCompletion> {
        let request = if request.is_stream() {
            request.clone().with_option("stream", json!(false))
        } else {
            request.clone()
        };

        let response = self.post_chat(&request).await?;
        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }

    async fn stream(&self, request: &ChatRequest) -> Result<ChunkStream> {
        let mut request = request.clone().with_option("stream", json!(true));
        if !request.options.contains_key("stream_options") {
            request = request.with_option("stream_options", json!({ "include_usage": true }));
        }

        let response = self.post_chat(&request).await?;
        Ok(Box::pin(sse_chunks(response)))
    }

    async fn upload_file(&self, path: &Path, purpose: &str) -> Result<UploadedFile> {
        let api_key = self.api_key()?;
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());
        let mime = mime_guess::from_path(path).first_or_octet_stream();

        let part = Part::bytes(bytes)
            .file_name(file_name)
            .mime_str(mime.essence_str())?;
        let form = Form::new().text("purpose", purpose.to_string()).part("file", part);

        let response = self
            .client
            .post(self.url("files"))
            .bearer_auth(api_key)
            .multipart(form)
            .send()
            .await?;
        let response = check_status(response).await?;
        let file: FileObject = serde_json::from_slice(&response.bytes().await?)?;

        tracing::info!(file_id = %file.id, path = %path.display(), "uploaded file");
        Ok(UploadedFile {
            id: file.id,
            local_path: path.to_path_buf(),
        })
    }

    async fn delete_file(&self, file_id: &str) -> Result<()> {
        let api_key = self.api_key()?;
        let response = self
            .client
            .delete(self.url(&format!("files/{}", file_id)))
            .bearer_auth(api_key)
            .send()
            .await?;
        check_status(response).await?;

        tracing::info!(%file_id, "deleted uploaded file");
        Ok(())
    }
}

/// Parse a server-sent event body into chunks, ending at the `[DONE]` marker
fn sse_chunks(response: Response) -> impl Stream<Item = Result<StreamChunk>> + Send + 'static {
    let mut events = response.bytes_stream().eventsource();

    stream! {
        while let Some(event) = events.next().await {
            let event = match event {
                Ok(event) => event,
                Err(e) => {
                    yield Err(ClientError::Stream(e.to_string()));
                    break;
                }
            };

            let data = event.data.trim();
            if data == STREAM_DONE {
                break;
            }
            if data.is_empty() {
                continue;
            }

            match stream_event_to_chunks(data) {
                Ok(chunks) => {
                    for chunk in chunks {
                        yield Ok(chunk);
                    }
                }
                Err(e) => {
                    yield Err(e);
                    break;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key_manager::MockEnvironment;
    use crate::models::message::Message;
    use crate::providers::base::Usage;
    use reqwest::StatusCode;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> DashScopeClient {
        let config = ClientConfig::default()
            .with_api_key("test_api_key")
            .with_base_url(format!("{}/compatible-mode/v1/", server.uri()));
        DashScopeClient::new(config).unwrap()
    }

    fn request() -> ChatRequest {
        ChatRequest::new(
            "qwen-plus",
            vec![
                Message::system("You are a helpful assistant."),
                Message::user("Who are you?"),
            ],
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_complete_basic() {
        let server = MockServer::start().await;
        let response_body = json!({
            "id": "chatcmpl-123",
            "object": "chat.completion",
            "model": "qwen-plus",
            "choices": [{
                "index": 0,
                "message": {"role": "assistant", "content": "I am Qwen."},
                "finish_reason": "stop"
            }],
            "usage": {"prompt_tokens": 22, "completion_tokens": 5, "total_tokens": 27}
        });
        Mock::given(method("POST"))
            .and(path("/compatible-mode/v1/chat/completions"))
            .and(header("authorization", "Bearer test_api_key"))
            .and(body_partial_json(json!({"model": "qwen-plus"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(response_body))
            .expect(1)
            .mount(&server)
            .await;

        let completion = client_for(&server).complete(&request()).await.unwrap();

        assert_eq!(completion.text(), Some("I am Qwen."));
        assert_eq!(
            completion.usage,
            Some(Usage::new(Some(22), Some(5), Some(27)))
        );
        assert_eq!(completion.extra.get("object"), Some(&json!("chat.completion")));
    }

    #[tokio::test]
    async fn test_complete_error_status_is_transport_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/compatible-mode/v1/chat/completions"))
            .respond_with(
                ResponseTemplate::new(401).set_body_string("{\"code\":\"InvalidApiKey\"}"),
            )
            .mount(&server)
            .await;

        let err = client_for(&server).complete(&request()).await.unwrap_err();
        match err {
            ClientError::Transport { status, body } => {
                assert_eq!(status, StatusCode::UNAUTHORIZED);
                assert!(body.contains("InvalidApiKey"));
            }
            other => panic!("Expected transport error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_stream_parses_channels_and_usage() {
        let server = MockServer::start().await;
        let sse = [
            r#"data: {"choices":[{"delta":{"role":"assistant","content":"","reasoning_content":"Think"},"index":0}]}"#,
            r#"data: {"choices":[{"delta":{"content":"","reasoning_content":"ing"},"index":0}]}"#,
            r#"data: {"choices":[{"delta":{"content":"Answer","reasoning_content":null},"index":0}]}"#,
            r#"data: {"choices":[],"usage":{"prompt_tokens":3,"completion_tokens":4,"total_tokens":7}}"#,
            "data: [DONE]",
        ]
        .join("\n\n")
            + "\n\n";
        Mock::given(method("POST"))
            .and(path("/compatible-mode/v1/chat/completions"))
            .and(body_partial_json(
                json!({"stream": true, "stream_options": {"include_usage": true}}),
            ))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/event-stream")
                    .set_body_string(sse),
            )
            .expect(1)
            .mount(&server)
            .await;

        let stream = client_for(&server).stream(&request()).await.unwrap();
        let chunks: Vec<StreamChunk> = stream.map(|chunk| chunk.unwrap()).collect().await;

        assert_eq!(
            chunks,
            vec![
                StreamChunk::reasoning("Think"),
                StreamChunk::reasoning("ing"),
                StreamChunk::answer("Answer"),
                StreamChunk::Usage(Usage::new(Some(3), Some(4), Some(7))),
            ]
        );
    }

    #[tokio::test]
    async fn test_upload_and_delete_file() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/compatible-mode/v1/files"))
            .and(header("authorization", "Bearer test_api_key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "file-fe-abc",
                "object": "file",
                "filename": "notes.txt",
                "purpose": "file-extract"
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/compatible-mode/v1/files/file-fe-abc"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "file-fe-abc",
                "deleted": true
            })))
            .expect(1)
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let file_path = dir.path().join("notes.txt");
        std::fs::write(&file_path, "hello").unwrap();

        let client = client_for(&server);
        let file = client.upload_file(&file_path, "file-extract").await.unwrap();
        assert_eq!(file.id, "file-fe-abc");
        assert_eq!(file.local_path, file_path);

        client.delete_file(&file.id).await.unwrap();

        let requests = server.received_requests().await.unwrap();
        let upload_body = String::from_utf8_lossy(&requests[0].body).to_string();
        assert!(upload_body.contains("name=\"purpose\""));
        assert!(upload_body.contains("file-extract"));
        assert!(upload_body.contains("filename=\"notes.txt\""));
    }

    #[tokio::test]
    async fn test_missing_api_key_surfaces_on_first_use() {
        let server = MockServer::start().await;
        let mut environment = MockEnvironment::new();
        environment
            .expect_get_var()
            .withf(|key| key == API_KEY_ENV)
            .times(1)
            .returning(|_| Err(std::env::VarError::NotPresent));

        let config = ClientConfig::default().with_base_url(server.uri());
        let client = DashScopeClient::new(config)
            .unwrap()
            .with_environment(environment);

        let err = client.complete(&request()).await.unwrap_err();
        assert!(matches!(err, ClientError::Configuration(_)));
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_api_key_from_environment() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/files/file-fe-1"))
            .and(header("authorization", "Bearer sk-from-env"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"deleted": true})))
            .expect(1)
            .mount(&server)
            .await;

        let mut environment = MockEnvironment::new();
        environment
            .expect_get_var()
            .returning(|_| Ok("sk-from-env".to_string()));

        let client = DashScopeClient::new(ClientConfig::default().with_base_url(server.uri()))
            .unwrap()
            .with_environment(environment);

        client.delete_file("file-fe-1").await.unwrap();
    }
}
