use crate::{
    error::Result,
    models::{AsyncJobHandle, GenerationRequest, GenerationResult},
};
use async_trait::async_trait;

/// Dispatch surface shared by every generation task.
#[async_trait]
pub trait GenerationClient: Send + Sync {
    /// One request/response exchange for image tasks.
    async fn submit_synchronous(&self, request: &GenerationRequest) -> Result<GenerationResult>;

    /// Starts a long-running job and returns its handle without waiting.
    async fn submit_asynchronous(&self, request: &GenerationRequest) -> Result<AsyncJobHandle>;

    /// Queries the provider once for the current state of `handle`.
    async fn refresh_job(&self, handle: &AsyncJobHandle) -> Result<AsyncJobHandle>;

    /// Authenticated fetch of a finished artifact.
    async fn download(&self, uri: &str) -> Result<Vec<u8>>;
}
