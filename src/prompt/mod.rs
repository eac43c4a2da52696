pub mod templates;

use crate::{
    config::ModelConfig,
    models::{
        AspectRatio, GenerationInputs, GenerationRequest, MediaAttachment, OutputHint, TaskKind,
    },
};

pub use templates::{
    template_for, Clause, DispatchMode, RoleSlot, RuleKind, TaskTemplate, CONTEXT_SUGGESTIONS,
    POSE_SUGGESTIONS, TEMPLATES,
};

/// Turns typed inputs into a provider request using the template table.
///
/// Pure: the same inputs always yield the same request. Presence checks are
/// the caller's job (see [`crate::controller::validate_inputs`]).
#[derive(Debug, Clone, Default)]
pub struct RequestBuilder {
    models: ModelConfig,
}

impl RequestBuilder {
    pub fn new(models: ModelConfig) -> Self {
        Self { models }
    }

    pub fn model_for(&self, mode: DispatchMode) -> &str {
        match mode {
            DispatchMode::Content => &self.models.content,
            DispatchMode::ImagePrediction => &self.models.image,
            DispatchMode::LongRunningVideo => &self.models.video,
        }
    }

    pub fn build(&self, kind: TaskKind, inputs: &GenerationInputs) -> GenerationRequest {
        let template = template_for(kind);
        let aspect_ratio = resolve_ratio(template, inputs.aspect_ratio);

        let mut attachments: Vec<MediaAttachment> = Vec::new();
        let mut role_lines: Vec<String> = Vec::new();
        for slot in template.slots {
            let images: Vec<&MediaAttachment> =
                inputs.images_with_role(slot.role).take(slot.max).collect();
            if images.is_empty() {
                continue;
            }
            let first = attachments.len() + 1;
            let last = attachments.len() + images.len();
            if !slot.line.is_empty() {
                let position = if first == last {
                    format!("{} {}", template.position_noun, first)
                } else {
                    format!("{}s {}-{}", template.position_noun, first, last)
                };
                role_lines.push(slot.line.replace("{position}", &position));
            }
            attachments.extend(images.into_iter().cloned());
        }

        let instruction_text = render_instruction(template, inputs, aspect_ratio, &role_lines);

        GenerationRequest {
            task_kind: kind,
            model: self.model_for(template.mode).to_string(),
            instruction_text,
            attachments,
            output_hint: OutputHint { aspect_ratio },
        }
    }
}

fn resolve_ratio(template: &TaskTemplate, requested: Option<AspectRatio>) -> AspectRatio {
    match requested {
        Some(ratio) if template.accepts_ratio(ratio) => ratio,
        Some(ratio) => {
            log::warn!(
                "{} does not support aspect ratio {}, using {}",
                template.kind,
                ratio,
                template.default_ratio
            );
            template.default_ratio
        }
        None => template.default_ratio,
    }
}

fn non_blank(value: Option<&String>) -> Option<&str> {
    value.map(|v| v.trim()).filter(|v| !v.is_empty())
}

fn render_instruction(
    template: &TaskTemplate,
    inputs: &GenerationInputs,
    aspect_ratio: AspectRatio,
    role_lines: &[String],
) -> String {
    let prompt = inputs.prompt.trim();
    let ratio = aspect_ratio.as_str();
    let fill = |text: &str| text.replace("{prompt}", prompt).replace("{ratio}", ratio);

    let mut lines: Vec<String> = Vec::new();
    let mut rule_number = 0;
    for clause in template.clauses {
        match clause {
            Clause::Text(text) => lines.push(fill(text)),
            Clause::InputRoles => lines.extend(role_lines.iter().cloned()),
            Clause::Prompt => {
                if !prompt.is_empty() {
                    lines.push(prompt.to_string());
                }
            }
            Clause::Rule(_, text) => {
                rule_number += 1;
                lines.push(format!("{}.  {}", rule_number, fill(text)));
            }
            Clause::Instruction(_, text) => lines.push(fill(text)),
            Clause::Details(text) => {
                if let Some(details) = non_blank(inputs.details.as_ref()) {
                    lines.push(text.replace("{details}", details));
                }
            }
            Clause::Pose(text) => {
                if let Some(pose) = non_blank(inputs.pose.as_ref()) {
                    lines.push(text.replace("{pose}", pose));
                }
            }
            Clause::Context(text) => {
                if let Some(context) = non_blank(inputs.context.as_ref()) {
                    lines.push(text.replace("{context}", context));
                }
            }
        }
    }
    if let Some(directive) = template.ratio_directive {
        lines.push(fill(directive));
    }

    lines.join("\n")
}
