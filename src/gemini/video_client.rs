use super::{
    transport::Transport,
    wire::{Operation, PredictRequest, VeoImage, VeoInstance, VeoParameters},
};
use crate::{
    error::Result,
    models::{AsyncJobHandle, GenerationRequest},
};

const RESOLUTION: &str = "720p";

/// Long-running video generation: submit, status query, download.
#[derive(Clone)]
pub struct VideoClient {
    transport: Transport,
}

impl VideoClient {
    pub fn new(transport: Transport) -> Self {
        Self { transport }
    }

    pub async fn submit(&self, request: &GenerationRequest) -> Result<AsyncJobHandle> {
        let image = request.primary_attachment().map(|first_frame| VeoImage {
            bytes_base64_encoded: first_frame.data.clone(),
            mime_type: first_frame.content_type.clone(),
        });
        let payload = PredictRequest {
            instances: vec![VeoInstance {
                prompt: request.instruction_text.clone(),
                image,
            }],
            parameters: VeoParameters {
                aspect_ratio: request.output_hint.aspect_ratio.to_string(),
                resolution: RESOLUTION.to_string(),
                sample_count: 1,
            },
        };

        log::info!(
            "Starting video generation with model: {} ({}, {})",
            request.model,
            request.output_hint.aspect_ratio,
            if payload.instances[0].image.is_some() {
                "first frame supplied"
            } else {
                "prompt only"
            }
        );

        let operation: Operation = self
            .transport
            .post_json(
                request.task_kind.operation(),
                &format!("models/{}:predictLongRunning", request.model),
                &payload,
            )
            .await?;

        log::info!("Video operation started: {}", operation.name);
        Ok(operation.into())
    }

    pub async fn refresh(&self, handle: &AsyncJobHandle) -> Result<AsyncJobHandle> {
        let operation: Operation = self
            .transport
            .get_json("check video status", &handle.operation)
            .await?;
        log::debug!(
            "Operation {} done={}",
            operation.name,
            operation.done
        );
        Ok(operation.into())
    }

    pub async fn download(&self, uri: &str) -> Result<Vec<u8>> {
        log::info!("Downloading generated video");
        let bytes = self.transport.get_bytes("download video", uri).await?;
        log::debug!("Downloaded {} bytes", bytes.len());
        Ok(bytes)
    }
}
