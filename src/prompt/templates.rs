use crate::models::{AspectRatio, ImageRole, TaskKind};

/// Which provider endpoint serves a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchMode {
    /// `generateContent` on a multimodal model, one exchange.
    Content,
    /// `predict` on an image model, one exchange.
    ImagePrediction,
    /// `predictLongRunning` on a video model, polled.
    LongRunningVideo,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleKind {
    Identity,
    Consistency,
    SceneIntegration,
    Quality,
}

/// One piece of an assembled instruction, in output order.
///
/// Fixed text may carry `{prompt}` and `{ratio}` placeholders; the optional
/// user fields carry their own (`{details}`, `{pose}`, `{context}`) and are
/// skipped when the field is blank.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Clause {
    Text(&'static str),
    /// One line per attachment role that has images, numbered by position.
    InputRoles,
    /// The user's instruction verbatim.
    Prompt,
    /// Numbered rule.
    Rule(RuleKind, &'static str),
    /// Unnumbered block that still counts for rule ordering.
    Instruction(RuleKind, &'static str),
    Details(&'static str),
    Pose(&'static str),
    Context(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoleSlot {
    pub role: ImageRole,
    pub required: bool,
    pub max: usize,
    /// `{position}` expands to e.g. `Image 1` or `Images 2-5`.
    pub line: &'static str,
}

#[derive(Debug)]
pub struct TaskTemplate {
    pub kind: TaskKind,
    pub mode: DispatchMode,
    pub slots: &'static [RoleSlot],
    pub position_noun: &'static str,
    pub requires_prompt: bool,
    pub preserves_identity: bool,
    pub default_ratio: AspectRatio,
    /// Empty means every ratio is accepted.
    pub allowed_ratios: &'static [AspectRatio],
    pub clauses: &'static [Clause],
    /// Appended after every clause so earlier free text cannot override it.
    pub ratio_directive: Option<&'static str>,
}

impl TaskTemplate {
    pub fn required_slots(&self) -> impl Iterator<Item = &RoleSlot> {
        self.slots.iter().filter(|slot| slot.required)
    }

    pub fn max_attachments(&self) -> usize {
        self.slots.iter().map(|slot| slot.max).sum()
    }

    pub fn accepts_ratio(&self, ratio: AspectRatio) -> bool {
        self.allowed_ratios.is_empty() || self.allowed_ratios.contains(&ratio)
    }

    /// Every identity rule comes before the first scene-integration rule.
    pub fn identity_precedes_scene(&self) -> bool {
        let kinds: Vec<RuleKind> = self
            .clauses
            .iter()
            .filter_map(|clause| match clause {
                Clause::Rule(kind, _) | Clause::Instruction(kind, _) => Some(*kind),
                _ => None,
            })
            .collect();
        let last_identity = kinds.iter().rposition(|k| *k == RuleKind::Identity);
        let first_scene = kinds.iter().position(|k| *k == RuleKind::SceneIntegration);
        match (last_identity, first_scene) {
            (Some(identity), Some(scene)) => identity < scene,
            _ => true,
        }
    }
}

const ALL_RATIOS: &[AspectRatio] = &[];
const VIDEO_RATIOS: &[AspectRatio] = &[AspectRatio::Landscape16x9, AspectRatio::Portrait9x16];

pub static TEMPLATES: [TaskTemplate; 6] = [
    TaskTemplate {
        kind: TaskKind::Edit,
        mode: DispatchMode::Content,
        slots: &[RoleSlot {
            role: ImageRole::Primary,
            required: true,
            max: 1,
            line: "",
        }],
        position_noun: "Image",
        requires_prompt: true,
        preserves_identity: false,
        default_ratio: AspectRatio::Square,
        allowed_ratios: ALL_RATIOS,
        clauses: &[Clause::Prompt],
        ratio_directive: Some("The final image must have a {ratio} aspect ratio."),
    },
    TaskTemplate {
        kind: TaskKind::TextToImage,
        mode: DispatchMode::ImagePrediction,
        slots: &[],
        position_noun: "Image",
        requires_prompt: true,
        preserves_identity: false,
        default_ratio: AspectRatio::Square,
        allowed_ratios: &[
            AspectRatio::Square,
            AspectRatio::Portrait9x16,
            AspectRatio::Landscape16x9,
            AspectRatio::Landscape4x3,
            AspectRatio::Portrait3x4,
        ],
        clauses: &[Clause::Prompt],
        ratio_directive: None,
    },
    TaskTemplate {
        kind: TaskKind::TryOn,
        mode: DispatchMode::Content,
        slots: &[
            RoleSlot {
                role: ImageRole::Primary,
                required: true,
                max: 1,
                line: "**{position} (Model):** An image of a person.",
            },
            RoleSlot {
                role: ImageRole::Garment,
                required: true,
                max: 1,
                line: "**{position} (Garment):** An image of clothing.",
            },
            RoleSlot {
                role: ImageRole::Accessory,
                required: false,
                max: 1,
                line: "**{position} (Accessory):** An image of accessories (e.g., hats, glasses, jewelry).",
            },
            RoleSlot {
                role: ImageRole::Handheld,
                required: false,
                max: 1,
                line: "**{position} (Handheld):** An image of a handheld item (e.g., a bag, a phone).",
            },
        ],
        position_noun: "Input",
        requires_prompt: false,
        preserves_identity: true,
        default_ratio: AspectRatio::Portrait9x16,
        allowed_ratios: ALL_RATIOS,
        clauses: &[
            Clause::Text("**Primary Goal:** Virtual Fashion Try-On."),
            Clause::InputRoles,
            Clause::Text("\n**Critical Instructions (MUST FOLLOW):**"),
            Clause::Rule(
                RuleKind::Identity,
                "**Preserve the Model 100%:** The person from the Model image MUST be preserved perfectly. DO NOT change their face, facial expression, hair, body shape, or skin tone. The face must be an IDENTICAL match.",
            ),
            Clause::Rule(
                RuleKind::SceneIntegration,
                "**Transfer All Items:** Identify ALL items in the Garment, Accessory, and Handheld images and accurately place them on/with the model. Garments should be worn, accessories placed appropriately, and handheld items held naturally.",
            ),
            Clause::Rule(
                RuleKind::Quality,
                "**Realism is Key:** The final image must be photorealistic. Ensure the fit, drape, texture, and lighting of all transferred items on the model are natural and believable.",
            ),
            Clause::Details("\n**Detailed Edits:** Apply the following specific edits: \"{details}\"."),
            Clause::Pose("\n**Pose Instruction:** The model should be in the following pose: \"{pose}\"."),
            Clause::Context("\n**Background Instruction:** Place the model in this context: \"{context}\"."),
        ],
        ratio_directive: Some("\n**Output Format:** The final image must have a {ratio} aspect ratio."),
    },
    TaskTemplate {
        kind: TaskKind::CharacterConsistency,
        mode: DispatchMode::Content,
        slots: &[
            RoleSlot {
                role: ImageRole::Primary,
                required: true,
                max: 1,
                line: "- **Primary Reference ({position}):** THIS IS THE GROUND TRUTH for the character's face and identity.",
            },
            RoleSlot {
                role: ImageRole::Reference,
                required: false,
                max: 4,
                line: "- **Additional References ({position}):** Use these for additional details (e.g., body type, style) but the face from the Primary Reference is NON-NEGOTIABLE.",
            },
        ],
        position_noun: "Image",
        requires_prompt: true,
        preserves_identity: true,
        default_ratio: AspectRatio::Square,
        allowed_ratios: ALL_RATIOS,
        clauses: &[
            Clause::Text("**Primary Goal:** Flawless Consistent Character Recreation."),
            Clause::Text("**Task:** Recreate the character from the provided reference images in a new scene."),
            Clause::Text("\n**Reference Images:**"),
            Clause::InputRoles,
            Clause::Text("\n**Scene Description:** {prompt}"),
            Clause::Text("\n**CRITICAL, NON-NEGOTIABLE RULES:**"),
            Clause::Rule(
                RuleKind::Identity,
                "**IDENTICAL FACE REPLICATION:** The face of the character in the generated image MUST be a 100% PERFECT, IDENTICAL match to the face in the **Primary Reference (Image 1)**. DO NOT alter facial structure, features, skin tone, or unique marks. This is the most important rule.",
            ),
            Clause::Rule(
                RuleKind::Consistency,
                "**FEATURE CONSISTENCY:** Maintain absolute consistency with all other character features learned from the reference images, such as hair style, hair color, body type, and height.",
            ),
            Clause::Rule(
                RuleKind::SceneIntegration,
                "**SCENE INTEGRATION:** Place the perfectly replicated character into the scene described: \"{prompt}\". The pose, lighting, and clothing (unless specified in the prompt) should be appropriate for the scene.",
            ),
            Clause::Rule(
                RuleKind::Quality,
                "**PHOTOREALISM:** The final image must be photorealistic, with natural lighting, shadows, and textures, making the character look seamlessly integrated into the environment.",
            ),
            Clause::Text("\nFailure to follow these rules, especially Rule #1, results in a failed task."),
        ],
        ratio_directive: Some("**ASPECT RATIO:** The final image MUST have a {ratio} aspect ratio."),
    },
    TaskTemplate {
        kind: TaskKind::SceneCompose,
        mode: DispatchMode::Content,
        slots: &[RoleSlot {
            role: ImageRole::Primary,
            required: true,
            max: 1,
            line: "**{position} (Subject):** The image containing the person/subject to be extracted.",
        }],
        position_noun: "Input",
        requires_prompt: true,
        preserves_identity: true,
        default_ratio: AspectRatio::Square,
        allowed_ratios: ALL_RATIOS,
        clauses: &[
            Clause::Text("**GOAL:** Flawless Scene Integration (Virtual Photo)."),
            Clause::InputRoles,
            Clause::Text("**Text Prompt:** A description of the new scene: \"{prompt}\"."),
            Clause::Text("\n**CRITICAL, NON-NEGOTIABLE RULE:**"),
            Clause::Rule(
                RuleKind::Identity,
                "**IDENTICAL SUBJECT PRESERVATION:** You MUST extract the person/subject from the Subject image (Input 1) and place them into the new scene. The person's face, body, clothing, and pose MUST remain 100% IDENTICAL to the original. This is the most important rule. Do not change anything about the person.",
            ),
            Clause::Instruction(
                RuleKind::SceneIntegration,
                "\n**INSTRUCTION:**\nCreate a new, photorealistic image where the perfectly preserved person from Input 1 is seamlessly integrated into a new background as described in the Text Prompt. The new background must be photorealistic and match the description accurately.",
            ),
        ],
        ratio_directive: Some("\n**OUTPUT FORMAT:**\nThe final generated image MUST have a {ratio} aspect ratio."),
    },
    TaskTemplate {
        kind: TaskKind::TextToVideo,
        mode: DispatchMode::LongRunningVideo,
        slots: &[RoleSlot {
            role: ImageRole::Primary,
            required: false,
            max: 1,
            line: "",
        }],
        position_noun: "Image",
        requires_prompt: true,
        preserves_identity: false,
        default_ratio: AspectRatio::Landscape16x9,
        allowed_ratios: VIDEO_RATIOS,
        clauses: &[Clause::Prompt],
        ratio_directive: None,
    },
];

pub fn template_for(kind: TaskKind) -> &'static TaskTemplate {
    TEMPLATES
        .iter()
        .find(|template| template.kind == kind)
        .unwrap_or(&TEMPLATES[0])
}

/// Pose choices offered for try-on. Leaving the pose unset lets the model choose.
pub const POSE_SUGGESTIONS: &[&str] = &[
    "Standing straight",
    "Sitting on a chair",
    "Walking confidently",
    "Lying relaxed on the grass",
    "Leaning against a brick wall",
    "Arms crossed",
    "Hands on hips",
    "Jumping in the air",
    "Jogging lightly",
    "Dancing",
    "Squatting",
    "Yoga tree pose",
    "Looking over the shoulder",
    "Sitting on steps",
];

pub const CONTEXT_SUGGESTIONS: &[&str] = &[
    "on a busy city street",
    "in a cozy coffee shop",
    "on a luxury yacht",
    "in front of graffiti art",
    "in a mystical forest",
    "at an outdoor music festival",
    "on a bridge overlooking the city",
    "in an art gallery",
    "on a snowy mountain peak",
    "in a lively night market",
];
