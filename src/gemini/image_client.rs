use super::{
    transport::Transport,
    wire::{ImagenInstance, ImagenParameters, ImagenResponse, PredictRequest},
};
use crate::{
    error::{Result, StudioError},
    models::{GenerationRequest, GenerationResult, MediaAttachment},
};

const OUTPUT_MIME_TYPE: &str = "image/png";

/// Prompt-only image generation through `models/{model}:predict`.
#[derive(Clone)]
pub struct ImageClient {
    transport: Transport,
}

impl ImageClient {
    pub fn new(transport: Transport) -> Self {
        Self { transport }
    }

    pub async fn generate(&self, request: &GenerationRequest) -> Result<GenerationResult> {
        let payload = PredictRequest {
            instances: vec![ImagenInstance {
                prompt: request.instruction_text.clone(),
            }],
            parameters: ImagenParameters {
                sample_count: 1,
                aspect_ratio: request.output_hint.aspect_ratio.to_string(),
                output_mime_type: OUTPUT_MIME_TYPE.to_string(),
            },
        };

        log::info!(
            "Generating image with model: {} ({})",
            request.model,
            request.output_hint.aspect_ratio
        );

        let response: ImagenResponse = self
            .transport
            .post_json(
                request.task_kind.operation(),
                &format!("models/{}:predict", request.model),
                &payload,
            )
            .await?;

        let image = response
            .predictions
            .into_iter()
            .find_map(|prediction| {
                let data = prediction.bytes_base64_encoded.filter(|d| !d.is_empty())?;
                let mime = prediction
                    .mime_type
                    .unwrap_or_else(|| OUTPUT_MIME_TYPE.to_string());
                Some(MediaAttachment::new(data, mime))
            })
            .ok_or_else(|| {
                log::warn!("No images generated");
                StudioError::EmptyResponse
            })?;

        Ok(GenerationResult::Content {
            image: Some(image),
            text: None,
        })
    }
}
