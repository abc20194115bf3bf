//! Sampling parameters and their validation.

use serde::Serialize;

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

/// Default number of denoising steps.
pub const DEFAULT_STEPS: u32 = 12;
/// Default classifier-free guidance scale.
pub const DEFAULT_GUIDANCE_SCALE: f32 = 2.0;
/// Default output height in pixels.
pub const DEFAULT_HEIGHT: u32 = 512;
/// Default output width in pixels.
pub const DEFAULT_WIDTH: u32 = 512;

/// Upper bound on denoising steps.
pub const MAX_STEPS: u32 = 150;
/// Upper bound on guidance scale.
pub const MAX_GUIDANCE_SCALE: f32 = 30.0;
/// Smallest accepted image side.
pub const MIN_DIMENSION: u32 = 64;
/// Largest accepted image side.
pub const MAX_DIMENSION: u32 = 2048;

/// Maximum number of scenes one story request may produce.
pub const MAX_SCENES_PER_STORY: u32 = 10;

/// Maximum number of variations one style request may produce.
pub const MAX_STYLE_VARIATIONS: u32 = 4;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Sampling parameters shared by every call of a process.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GenerationSettings {
    pub steps: u32,
    pub guidance_scale: f32,
    pub height: u32,
    pub width: u32,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            steps: DEFAULT_STEPS,
            guidance_scale: DEFAULT_GUIDANCE_SCALE,
            height: DEFAULT_HEIGHT,
            width: DEFAULT_WIDTH,
        }
    }
}

impl GenerationSettings {
    /// Check every parameter against its accepted range.
    pub fn validate(&self) -> Result<(), CoreError> {
        if !(1..=MAX_STEPS).contains(&self.steps) {
            return Err(CoreError::Validation(format!(
                "steps must be between 1 and {MAX_STEPS} (got {})",
                self.steps
            )));
        }
        if !(0.0..=MAX_GUIDANCE_SCALE).contains(&self.guidance_scale) {
            return Err(CoreError::Validation(format!(
                "guidance_scale must be between 0 and {MAX_GUIDANCE_SCALE} (got {})",
                self.guidance_scale
            )));
        }
        validate_dimension("height", self.height)?;
        validate_dimension("width", self.width)?;
        Ok(())
    }

    /// Build the request for a single synthesis call.
    pub fn request(&self, prompt: impl Into<String>) -> GenerationRequest {
        GenerationRequest {
            prompt: prompt.into(),
            steps: self.steps,
            guidance_scale: self.guidance_scale,
            height: self.height,
            width: self.width,
        }
    }
}

/// Parameters of one synthesis call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerationRequest {
    pub prompt: String,
    pub steps: u32,
    pub guidance_scale: f32,
    pub height: u32,
    pub width: u32,
}

/// Image sides must be multiples of 8 (latent downsampling factor).
fn validate_dimension(name: &str, value: u32) -> Result<(), CoreError> {
    if !(MIN_DIMENSION..=MAX_DIMENSION).contains(&value) || value % 8 != 0 {
        return Err(CoreError::Validation(format!(
            "{name} must be a multiple of 8 between {MIN_DIMENSION} and {MAX_DIMENSION} (got {value})"
        )));
    }
    Ok(())
}

/// Clamp a requested scene count to `[1, MAX_SCENES_PER_STORY]`.
pub fn clamp_scene_count(count: u32) -> u32 {
    count.clamp(1, MAX_SCENES_PER_STORY)
}

/// Clamp a requested variation count to `[1, MAX_STYLE_VARIATIONS]`.
pub fn clamp_style_count(count: u32) -> u32 {
    count.clamp(1, MAX_STYLE_VARIATIONS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let settings = GenerationSettings::default();
        assert_eq!(settings.steps, 12);
        assert_eq!(settings.guidance_scale, 2.0);
        assert_eq!((settings.height, settings.width), (512, 512));
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn zero_steps_rejected() {
        let settings = GenerationSettings {
            steps: 0,
            ..Default::default()
        };
        assert!(settings.validate().is_err());
    }

    #[test]
    fn negative_guidance_rejected() {
        let settings = GenerationSettings {
            guidance_scale: -1.0,
            ..Default::default()
        };
        assert!(settings.validate().is_err());
    }

    #[test]
    fn unaligned_dimension_rejected() {
        let settings = GenerationSettings {
            height: 500,
            ..Default::default()
        };
        assert!(settings.validate().is_err());
    }

    #[test]
    fn style_count_clamped() {
        assert_eq!(clamp_style_count(0), 1);
        assert_eq!(clamp_style_count(3), 3);
        assert_eq!(clamp_style_count(9), MAX_STYLE_VARIATIONS);
    }

    #[test]
    fn request_copies_settings() {
        let req = GenerationSettings::default().request("a castle");
        assert_eq!(req.prompt, "a castle");
        assert_eq!(req.steps, DEFAULT_STEPS);
        assert_eq!(req.width, DEFAULT_WIDTH);
    }

    #[test]
    fn scene_count_clamped() {
        assert_eq!(clamp_scene_count(0), 1);
        assert_eq!(clamp_scene_count(5), 5);
        assert_eq!(clamp_scene_count(50), MAX_SCENES_PER_STORY);
    }
}
