//! Prompt composition.
//!
//! Turns scene units, a character descriptor, and fixed consistency
//! modifiers into the final text handed to the image synthesizer. All
//! functions here are pure string construction.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::segment::SceneUnit;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Descriptor used when the caller does not supply one.
pub const DEFAULT_CHARACTER_DESCRIPTOR: &str =
    "the same recurring characters in a consistent illustrated style";

/// Modifiers appended to the base subject in simple mode.
const SIMPLE_MODIFIERS: &str = "consistent art style, cinematic lighting, same characters";

/// Modifiers closing every storyline-mode prompt.
const STORYLINE_MODIFIERS: &str =
    "consistent art style, same recurring characters, cinematic lighting.";

/// Modifiers closing every bias-grid portrait prompt.
const PORTRAIT_MODIFIERS: &str =
    "studio lighting, high quality, continuous art style with same objects";

/// Maximum accepted length of a user-supplied prompt or story, in characters.
pub const MAX_PROMPT_LENGTH: usize = 10_000;

// ---------------------------------------------------------------------------
// Mode
// ---------------------------------------------------------------------------

/// How scene prompts are built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PromptMode {
    /// The whole input is the base subject; scenes differ only by number.
    #[default]
    Simple,
    /// Each sentence becomes its own scene prompt, prefixed by the descriptor.
    Storyline,
}

impl PromptMode {
    /// Parse from the form value. Unknown values are a validation error.
    pub fn from_name(name: &str) -> Result<Self, CoreError> {
        match name.trim().to_ascii_lowercase().as_str() {
            "" | "simple" => Ok(Self::Simple),
            "storyline" => Ok(Self::Storyline),
            other => Err(CoreError::Validation(format!(
                "Invalid prompt mode '{other}'. Must be one of: simple, storyline"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// Composition
// ---------------------------------------------------------------------------

/// Build the prompt for one scene.
///
/// In [`PromptMode::Simple`] `base_subject` is the subject and the scene text
/// is ignored; in [`PromptMode::Storyline`] the scene text is used together
/// with `descriptor`.
pub fn compose_prompt(
    scene: &SceneUnit,
    base_subject: &str,
    descriptor: &str,
    mode: PromptMode,
) -> String {
    match mode {
        PromptMode::Simple => simple_prompt(base_subject, scene.index),
        PromptMode::Storyline => storyline_prompt(descriptor, scene),
    }
}

/// `"{subject}, consistent art style, cinematic lighting, same characters, scene {i}, part {i} of the story"`
pub fn simple_prompt(base_subject: &str, index: u32) -> String {
    format!("{base_subject}, {SIMPLE_MODIFIERS}, scene {index}, part {index} of the story")
}

/// `"{descriptor}. Scene {i}: {text}. consistent art style, same recurring characters, cinematic lighting."`
pub fn storyline_prompt(descriptor: &str, scene: &SceneUnit) -> String {
    format!(
        "{descriptor}. Scene {}: {}. {STORYLINE_MODIFIERS}",
        scene.index, scene.text
    )
}

/// Portrait prompt for one label of a demographic sweep.
pub fn portrait_prompt(base_prompt: &str, label: &str) -> String {
    format!("{base_prompt}, portrait of {label}, {PORTRAIT_MODIFIERS}")
}

/// Prompt for one variation of a style-transfer batch.
pub fn style_prompt(base_prompt: &str, style: &str, index: u32) -> String {
    format!("{base_prompt}, in the style of {style}, variation {index}, consistent composition")
}

/// Resolve an optional caller descriptor, falling back to the default when
/// absent or blank.
pub fn resolve_descriptor(descriptor: Option<&str>) -> &str {
    match descriptor.map(str::trim) {
        Some(d) if !d.is_empty() => d,
        _ => DEFAULT_CHARACTER_DESCRIPTOR,
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Validate user prompt text: must be non-blank and within length limit.
pub fn validate_prompt(text: &str) -> Result<(), CoreError> {
    if text.trim().is_empty() {
        return Err(CoreError::Validation("Prompt must not be empty".to_string()));
    }
    let length = text.chars().count();
    if length > MAX_PROMPT_LENGTH {
        return Err(CoreError::Validation(format!(
            "Prompt exceeds maximum length of {MAX_PROMPT_LENGTH} characters (got {length})"
        )));
    }
    Ok(())
}
