pub mod content_client;
pub mod image_client;
pub mod traits;
pub mod transport;
pub mod video_client;
pub mod wire;

use crate::{
    config::StudioConfig,
    error::{Result, StudioError},
    models::{AsyncJobHandle, GenerationRequest, GenerationResult},
    prompt::{template_for, DispatchMode},
    storage::ClientContext,
};
use async_trait::async_trait;

pub use content_client::ContentClient;
pub use image_client::ImageClient;
pub use traits::GenerationClient;
pub use transport::Transport;
pub use video_client::VideoClient;

/// Gemini REST client covering the content, Imagen and Veo endpoints.
#[derive(Clone)]
pub struct GeminiClient {
    config: StudioConfig,
    content_client: ContentClient,
    image_client: ImageClient,
    video_client: VideoClient,
}

impl GeminiClient {
    /// Consumes the context; fails with `CredentialNotSet` if no key was supplied.
    pub fn new(context: ClientContext) -> Result<Self> {
        let (config, credential) = context.into_parts()?;

        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder
            .build()
            .map_err(|e| StudioError::Config(format!("failed to build HTTP client: {}", e)))?;

        let transport = Transport::new(http, config.api_base.clone(), credential);
        log::debug!("Gemini client ready for {}", config.api_base);

        Ok(Self {
            content_client: ContentClient::new(transport.clone()),
            image_client: ImageClient::new(transport.clone()),
            video_client: VideoClient::new(transport),
            config,
        })
    }

    pub fn config(&self) -> &StudioConfig {
        &self.config
    }

    pub fn content(&self) -> &ContentClient {
        &self.content_client
    }

    pub fn image(&self) -> &ImageClient {
        &self.image_client
    }

    pub fn video(&self) -> &VideoClient {
        &self.video_client
    }
}

#[async_trait]
impl GenerationClient for GeminiClient {
    async fn submit_synchronous(&self, request: &GenerationRequest) -> Result<GenerationResult> {
        match template_for(request.task_kind).mode {
            DispatchMode::Content => self.content_client.generate(request).await,
            DispatchMode::ImagePrediction => self.image_client.generate(request).await,
            DispatchMode::LongRunningVideo => Err(StudioError::Config(format!(
                "{} runs as a long-running job",
                request.task_kind
            ))),
        }
    }

    async fn submit_asynchronous(&self, request: &GenerationRequest) -> Result<AsyncJobHandle> {
        match template_for(request.task_kind).mode {
            DispatchMode::LongRunningVideo => self.video_client.submit(request).await,
            _ => Err(StudioError::Config(format!(
                "{} is not a long-running task",
                request.task_kind
            ))),
        }
    }

    async fn refresh_job(&self, handle: &AsyncJobHandle) -> Result<AsyncJobHandle> {
        self.video_client.refresh(handle).await
    }

    async fn download(&self, uri: &str) -> Result<Vec<u8>> {
        self.video_client.download(uri).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        models::{GenerationInputs, TaskKind},
        prompt::RequestBuilder,
        storage::Credential,
    };

    fn client() -> GeminiClient {
        let context = ClientContext::new(StudioConfig::new().with_api_base("http://127.0.0.1:9"))
            .with_credential(Credential::new("test-key").unwrap());
        GeminiClient::new(context).unwrap()
    }

    #[test]
    fn test_uninitialized_context_is_rejected() {
        let context = ClientContext::new(StudioConfig::new());
        assert!(matches!(
            GeminiClient::new(context),
            Err(StudioError::CredentialNotSet)
        ));
    }

    #[tokio::test]
    async fn test_dispatch_mode_mismatch() {
        let client = client();
        let builder = RequestBuilder::default();

        let video = builder.build(TaskKind::TextToVideo, &GenerationInputs::new("waves"));
        assert!(matches!(
            client.submit_synchronous(&video).await,
            Err(StudioError::Config(_))
        ));

        let image = builder.build(TaskKind::TextToImage, &GenerationInputs::new("waves"));
        assert!(matches!(
            client.submit_asynchronous(&image).await,
            Err(StudioError::Config(_))
        ));
    }
}
