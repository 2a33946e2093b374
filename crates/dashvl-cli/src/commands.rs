pub mod chat;
pub mod document;
pub mod image;
pub mod ocr;
pub mod video;

use std::future::Future;

use anyhow::Result;
use dashvl::errors::ClientError;
use dashvl::providers::dashscope::DashScopeClient;
use tokio_util::sync::CancellationToken;

use crate::configuration::Settings;

/// Everything a command needs to talk to the service
pub struct AppContext {
    pub client: DashScopeClient,
    pub settings: Settings,
    pub cancel: CancellationToken,
}

impl AppContext {
    /// Run a single request, abandoning it when Ctrl-C fires.
    ///
    /// Only for requests that hold no remote resources; uploads handle the
    /// token themselves so they can clean up.
    pub async fn until_cancelled<T, F>(&self, request: F) -> Result<T, ClientError>
    where
        F: Future<Output = Result<T, ClientError>>,
    {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(ClientError::Cancelled),
            result = request => result,
        }
    }
}

/// Await `work` behind a spinner
pub async fn with_spinner<T, F>(message: &str, work: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    let spin = cliclack::spinner();
    spin.start(message);

    let result = work.await;
    match &result {
        Ok(_) => spin.stop("Response received"),
        Err(_) => spin.error("Request failed"),
    }
    result
}
