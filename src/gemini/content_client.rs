use super::{
    transport::Transport,
    wire::{Content, GenerateContentRequest, GenerateContentResponse, GenerationConfig, Part},
};
use crate::{
    error::{Result, StudioError},
    models::{GenerationRequest, GenerationResult, MediaAttachment},
};

/// Image-conditioned generation through `models/{model}:generateContent`.
#[derive(Clone)]
pub struct ContentClient {
    transport: Transport,
}

impl ContentClient {
    pub fn new(transport: Transport) -> Self {
        Self { transport }
    }

    pub async fn generate(&self, request: &GenerationRequest) -> Result<GenerationResult> {
        let mut parts: Vec<Part> = request.attachments.iter().map(Part::inline).collect();
        if !request.instruction_text.is_empty() {
            parts.push(Part::text(request.instruction_text.clone()));
        }

        let payload = GenerateContentRequest {
            contents: vec![Content { role: None, parts }],
            generation_config: GenerationConfig {
                response_modalities: vec!["IMAGE".to_string(), "TEXT".to_string()],
            },
        };

        log::info!("Invoking model: {}", request.model);
        log::debug!(
            "{} request: {} attachment(s), {} chars of instruction",
            request.task_kind,
            request.attachments.len(),
            request.instruction_text.len()
        );

        let response: GenerateContentResponse = self
            .transport
            .post_json(
                request.task_kind.operation(),
                &format!("models/{}:generateContent", request.model),
                &payload,
            )
            .await?;

        extract_content(response)
    }
}

/// Picks the image and caption out of the first candidate. Later parts win.
pub(crate) fn extract_content(response: GenerateContentResponse) -> Result<GenerationResult> {
    let candidate = response.candidates.into_iter().next();
    if let Some(reason) = candidate.as_ref().and_then(|c| c.finish_reason.as_deref()) {
        log::debug!("Candidate finished with {}", reason);
    }
    let parts = candidate
        .and_then(|c| c.content)
        .map(|content| content.parts)
        .unwrap_or_default();

    let mut image = None;
    let mut text = None;
    for part in parts {
        if let Some(inline) = part.inline_data {
            if !inline.data.is_empty() {
                image = Some(MediaAttachment::new(inline.data, inline.mime_type));
            }
        }
        if let Some(caption) = part.text.filter(|t| !t.trim().is_empty()) {
            text = Some(caption);
        }
    }

    if image.is_none() && text.is_none() {
        log::warn!("Response carried neither an image nor text");
        return Err(StudioError::EmptyResponse);
    }
    Ok(GenerationResult::Content { image, text })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(value: serde_json::Value) -> GenerateContentResponse {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_single_image_part() {
        let response = parse(json!({
            "candidates": [ { "content": { "parts": [
                { "inlineData": { "mimeType": "image/png", "data": "iVBORw0KGgo=" } }
            ] } } ]
        }));
        let result = extract_content(response).unwrap();
        assert_eq!(
            result,
            GenerationResult::Content {
                image: Some(MediaAttachment::new("iVBORw0KGgo=", "image/png")),
                text: None
            }
        );
    }

    #[test]
    fn test_last_parts_win() {
        let response = parse(json!({
            "candidates": [ { "content": { "parts": [
                { "text": "first" },
                { "inlineData": { "mimeType": "image/png", "data": "AAAA" } },
                { "text": "second" },
                { "inlineData": { "mimeType": "image/jpeg", "data": "BBBB" } }
            ] } } ]
        }));
        let result = extract_content(response).unwrap();
        assert_eq!(result.text(), Some("second"));
        assert_eq!(result.image().unwrap().content_type, "image/jpeg");
    }

    #[test]
    fn test_empty_responses() {
        for value in [
            json!({}),
            json!({ "candidates": [] }),
            json!({ "candidates": [ { "finishReason": "SAFETY" } ] }),
            json!({ "candidates": [ { "content": { "parts": [] } } ] }),
            json!({ "candidates": [ { "content": { "parts": [ { "text": "  " } ] } } ] }),
        ] {
            assert!(matches!(
                extract_content(parse(value)),
                Err(StudioError::EmptyResponse)
            ));
        }
    }
}
