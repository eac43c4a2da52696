use serde::{Deserialize, Serialize};
use std::fmt;

use super::media::{AspectRatio, MediaAttachment};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    Edit,
    TextToImage,
    TryOn,
    CharacterConsistency,
    SceneCompose,
    TextToVideo,
}

impl TaskKind {
    pub const ALL: [TaskKind; 6] = [
        TaskKind::Edit,
        TaskKind::TextToImage,
        TaskKind::TryOn,
        TaskKind::CharacterConsistency,
        TaskKind::SceneCompose,
        TaskKind::TextToVideo,
    ];

    /// Operation name used when wrapping provider errors.
    pub fn operation(&self) -> &'static str {
        match self {
            TaskKind::Edit => "edit image",
            TaskKind::TextToImage => "generate image",
            TaskKind::TryOn => "perform try-on",
            TaskKind::CharacterConsistency => "generate character",
            TaskKind::SceneCompose => "create virtual scene",
            TaskKind::TextToVideo => "generate video",
        }
    }

    pub fn is_asynchronous(&self) -> bool {
        matches!(self, TaskKind::TextToVideo)
    }
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TaskKind::Edit => "edit",
            TaskKind::TextToImage => "text_to_image",
            TaskKind::TryOn => "try_on",
            TaskKind::CharacterConsistency => "character_consistency",
            TaskKind::SceneCompose => "scene_compose",
            TaskKind::TextToVideo => "text_to_video",
        };
        f.write_str(name)
    }
}

/// What an uploaded image stands for inside a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageRole {
    /// The subject whose identity the output keeps.
    Primary,
    Reference,
    Garment,
    Accessory,
    Handheld,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputImage {
    pub role: ImageRole,
    pub attachment: MediaAttachment,
}

/// Everything a user typed or uploaded for one submission.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerationInputs {
    pub prompt: String,
    pub images: Vec<InputImage>,
    pub aspect_ratio: Option<AspectRatio>,
    pub pose: Option<String>,
    pub context: Option<String>,
    pub details: Option<String>,
}

impl GenerationInputs {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            ..Default::default()
        }
    }

    pub fn with_image(mut self, role: ImageRole, attachment: MediaAttachment) -> Self {
        self.images.push(InputImage { role, attachment });
        self
    }

    pub fn with_aspect_ratio(mut self, ratio: AspectRatio) -> Self {
        self.aspect_ratio = Some(ratio);
        self
    }

    pub fn with_pose(mut self, pose: impl Into<String>) -> Self {
        self.pose = Some(pose.into());
        self
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn images_with_role(&self, role: ImageRole) -> impl Iterator<Item = &MediaAttachment> {
        self.images
            .iter()
            .filter(move |image| image.role == role)
            .map(|image| &image.attachment)
    }

    /// Replaces every image of `role`; `None` just clears them.
    pub fn set_image(&mut self, role: ImageRole, attachment: Option<MediaAttachment>) {
        self.images.retain(|image| image.role != role);
        if let Some(attachment) = attachment {
            self.images.push(InputImage { role, attachment });
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputHint {
    pub aspect_ratio: AspectRatio,
}

/// An assembled provider request. Built per submission and never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    pub task_kind: TaskKind,
    pub model: String,
    pub instruction_text: String,
    pub attachments: Vec<MediaAttachment>,
    pub output_hint: OutputHint,
}

impl GenerationRequest {
    pub fn primary_attachment(&self) -> Option<&MediaAttachment> {
        self.attachments.first()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_image_replaces_role() {
        let mut inputs = GenerationInputs::new("a red coat")
            .with_image(ImageRole::Primary, MediaAttachment::new("AA==", "image/png"))
            .with_image(ImageRole::Garment, MediaAttachment::new("AQ==", "image/jpeg"));

        inputs.set_image(ImageRole::Garment, Some(MediaAttachment::new("Ag==", "image/webp")));
        let garments: Vec<_> = inputs.images_with_role(ImageRole::Garment).collect();
        assert_eq!(garments.len(), 1);
        assert_eq!(garments[0].content_type, "image/webp");

        inputs.set_image(ImageRole::Primary, None);
        assert_eq!(inputs.images_with_role(ImageRole::Primary).count(), 0);
    }

    #[test]
    fn test_only_video_is_asynchronous() {
        let asynchronous: Vec<_> = TaskKind::ALL
            .iter()
            .filter(|kind| kind.is_asynchronous())
            .collect();
        assert_eq!(asynchronous, vec![&TaskKind::TextToVideo]);
        assert_eq!(TaskKind::TryOn.operation(), "perform try-on");
    }
}
