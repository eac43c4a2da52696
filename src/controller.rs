use std::sync::Arc;

use crate::{
    codec::{self, ResourceGuard, ResourceRegistry},
    config::StudioConfig,
    error::{Result, StudioError},
    gemini::{GeminiClient, GenerationClient},
    logger::Timer,
    models::{GenerationInputs, GenerationResult, ImageRole, MediaAttachment, TaskKind},
    poller::{CancelSignal, JobPoller},
    prompt::{template_for, RequestBuilder},
    storage::ClientContext,
};

const VIDEO_CONTENT_TYPE: &str = "video/mp4";

/// Checks that a submission has everything its task needs before any
/// provider call is made.
pub fn validate_inputs(kind: TaskKind, inputs: &GenerationInputs) -> Result<()> {
    let template = template_for(kind);

    for slot in template.required_slots() {
        let usable = inputs
            .images_with_role(slot.role)
            .any(|image| image.has_content_type() && !image.is_empty());
        if !usable {
            return Err(StudioError::MissingInput(describe_role(kind, slot.role).into()));
        }
    }

    if template.requires_prompt && inputs.prompt.trim().is_empty() {
        return Err(StudioError::MissingInput(describe_prompt(kind).into()));
    }
    Ok(())
}

fn describe_role(kind: TaskKind, role: ImageRole) -> &'static str {
    match (kind, role) {
        (TaskKind::Edit, _) => "an image to edit",
        (TaskKind::TryOn, ImageRole::Primary) => "a photo of the model",
        (TaskKind::TryOn, ImageRole::Garment) => "a photo of the outfit",
        (TaskKind::CharacterConsistency, _) => "at least one reference photo of the character",
        (TaskKind::SceneCompose, _) => "a photo of the subject",
        _ => "an input image",
    }
}

fn describe_prompt(kind: TaskKind) -> &'static str {
    match kind {
        TaskKind::Edit => "an edit instruction",
        TaskKind::TextToImage => "a description of the image",
        TaskKind::CharacterConsistency | TaskKind::SceneCompose => "a description of the scene",
        TaskKind::TextToVideo => "a description of the video",
        TaskKind::TryOn => "a prompt",
    }
}

/// What a finished submission produced.
#[derive(Debug)]
pub enum FeatureOutput {
    Content {
        image: Option<MediaAttachment>,
        text: Option<String>,
    },
    /// Downloaded video, live in the registry until this output goes away.
    Video(ResourceGuard),
}

impl FeatureOutput {
    pub fn image(&self) -> Option<&MediaAttachment> {
        match self {
            FeatureOutput::Content { image, .. } => image.as_ref(),
            FeatureOutput::Video(_) => None,
        }
    }

    /// `data:` URI of the returned image, ready to display.
    pub fn image_data_uri(&self) -> Option<String> {
        self.image().map(codec::to_data_uri)
    }

    pub fn text(&self) -> Option<&str> {
        match self {
            FeatureOutput::Content { text, .. } => text.as_deref(),
            FeatureOutput::Video(_) => None,
        }
    }

    pub fn video(&self) -> Option<&ResourceGuard> {
        match self {
            FeatureOutput::Video(guard) => Some(guard),
            FeatureOutput::Content { .. } => None,
        }
    }
}

/// Per-task state: the inputs being edited, the last output or error, and
/// whether a submission is in flight.
pub struct FeatureController {
    kind: TaskKind,
    client: Arc<dyn GenerationClient>,
    builder: RequestBuilder,
    poller: JobPoller,
    registry: ResourceRegistry,
    inputs: GenerationInputs,
    output: Option<FeatureOutput>,
    error: Option<String>,
    loading: bool,
}

impl FeatureController {
    pub fn new(
        kind: TaskKind,
        client: Arc<dyn GenerationClient>,
        builder: RequestBuilder,
        poller: JobPoller,
        registry: ResourceRegistry,
    ) -> Self {
        let inputs = GenerationInputs {
            aspect_ratio: Some(template_for(kind).default_ratio),
            ..Default::default()
        };
        Self {
            kind,
            client,
            builder,
            poller,
            registry,
            inputs,
            output: None,
            error: None,
            loading: false,
        }
    }

    pub fn kind(&self) -> TaskKind {
        self.kind
    }

    pub fn inputs(&self) -> &GenerationInputs {
        &self.inputs
    }

    pub fn inputs_mut(&mut self) -> &mut GenerationInputs {
        &mut self.inputs
    }

    pub fn set_inputs(&mut self, inputs: GenerationInputs) {
        self.inputs = inputs;
    }

    pub fn output(&self) -> Option<&FeatureOutput> {
        self.output.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Drops the current output, releasing any local resource it holds.
    pub fn clear_output(&mut self) {
        if let Some(FeatureOutput::Video(guard)) = self.output.take() {
            guard.release();
        }
    }

    pub async fn submit(&mut self) -> Option<&FeatureOutput> {
        self.submit_with(&CancelSignal::never()).await
    }

    /// Runs one submission. Failures land in [`FeatureController::error`].
    pub async fn submit_with(&mut self, cancel: &CancelSignal) -> Option<&FeatureOutput> {
        self.clear_output();
        self.error = None;
        self.loading = true;

        let outcome = self.run(cancel).await;
        self.loading = false;

        match outcome {
            Ok(output) => {
                self.output = Some(output);
                self.output.as_ref()
            }
            Err(e) => {
                if e.is_validation() {
                    log::warn!("{} not submitted: {}", self.kind, e);
                } else {
                    log::error!("Failed to {}: {}", self.kind.operation(), e);
                }
                self.error = Some(e.user_message());
                None
            }
        }
    }

    async fn run(&self, cancel: &CancelSignal) -> Result<FeatureOutput> {
        validate_inputs(self.kind, &self.inputs)?;
        let request = self.builder.build(self.kind, &self.inputs);
        let _timer = Timer::new(format!("{} ({})", self.kind.operation(), request.model));

        if !self.kind.is_asynchronous() {
            return match self.client.submit_synchronous(&request).await? {
                GenerationResult::Content { image, text } => Ok(FeatureOutput::Content { image, text }),
                GenerationResult::Video { uri } => self.fetch_video(&uri).await,
            };
        }

        let handle = self.client.submit_asynchronous(&request).await?;
        let uri = self
            .poller
            .wait(self.client.as_ref(), handle, cancel)
            .await?;
        self.fetch_video(&uri).await
    }

    async fn fetch_video(&self, uri: &str) -> Result<FeatureOutput> {
        let guard =
            codec::fetch_resource(self.client.as_ref(), uri, VIDEO_CONTENT_TYPE, &self.registry)
                .await?;
        log::info!("Video ready at {} ({} bytes)", guard.url(), guard.len());
        Ok(FeatureOutput::Video(guard))
    }
}

/// One controller per task, sharing a client and a resource registry.
pub struct Studio {
    registry: ResourceRegistry,
    controllers: [FeatureController; 6],
}

impl Studio {
    pub fn new(client: Arc<dyn GenerationClient>, config: &StudioConfig) -> Self {
        let registry = ResourceRegistry::new();
        let builder = RequestBuilder::new(config.models.clone());
        let poller = JobPoller::new(config.poll.clone());
        let controllers = TaskKind::ALL.map(|kind| {
            FeatureController::new(
                kind,
                client.clone(),
                builder.clone(),
                poller.clone(),
                registry.clone(),
            )
        });
        Self {
            registry,
            controllers,
        }
    }

    /// Builds a Gemini-backed studio; fails if the context has no credential.
    pub fn connect(context: ClientContext) -> Result<Self> {
        let client = GeminiClient::new(context)?;
        let config = client.config().clone();
        Ok(Self::new(Arc::new(client), &config))
    }

    pub fn controller(&self, kind: TaskKind) -> &FeatureController {
        &self.controllers[kind as usize]
    }

    pub fn controller_mut(&mut self, kind: TaskKind) -> &mut FeatureController {
        &mut self.controllers[kind as usize]
    }

    pub fn registry(&self) -> &ResourceRegistry {
        &self.registry
    }
}
