use super::media::MediaAttachment;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationResult {
    /// Synchronous output: at most one image and one caption.
    Content {
        image: Option<MediaAttachment>,
        text: Option<String>,
    },
    /// Location of a rendered video on the provider side.
    Video { uri: String },
}

impl GenerationResult {
    pub fn image(&self) -> Option<&MediaAttachment> {
        match self {
            GenerationResult::Content { image, .. } => image.as_ref(),
            GenerationResult::Video { .. } => None,
        }
    }

    pub fn text(&self) -> Option<&str> {
        match self {
            GenerationResult::Content { text, .. } => text.as_deref(),
            GenerationResult::Video { .. } => None,
        }
    }
}
