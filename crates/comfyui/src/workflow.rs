//! Text-to-image workflow graph in ComfyUI's API format.
//!
//! The graph is the stock txt2img pipeline: checkpoint loader, positive
//! and negative CLIP encoders, empty latent, KSampler, VAE decode, and a
//! SaveImage node whose output is read back through history.

use illustrator_core::generation::GenerationRequest;
use serde_json::{json, Value};

/// Node id of the KSampler.
pub const SAMPLER_NODE: &str = "3";
/// Node id of the positive prompt encoder.
pub const POSITIVE_NODE: &str = "6";
/// Node id of the SaveImage output.
pub const SAVE_NODE: &str = "9";

/// Sampler used for every run. Ancestral sampling suits the low step
/// counts of distilled turbo checkpoints.
pub const SAMPLER_NAME: &str = "euler_ancestral";
/// Noise schedule used for every run.
pub const SCHEDULER: &str = "normal";
/// Filename prefix of images saved by ComfyUI.
pub const FILENAME_PREFIX: &str = "story_illustrator";

/// Static inputs of the graph that do not vary per call.
#[derive(Debug, Clone)]
pub struct WorkflowTemplate {
    /// Checkpoint file name as known to ComfyUI.
    pub checkpoint: String,
    /// Negative prompt shared by every call.
    pub negative_prompt: String,
}

impl WorkflowTemplate {
    /// Build the API-format graph for one request.
    pub fn build(&self, request: &GenerationRequest, seed: u64) -> Value {
        json!({
            SAMPLER_NODE: {
                "class_type": "KSampler",
                "inputs": {
                    "seed": seed,
                    "steps": request.steps,
                    "cfg": request.guidance_scale,
                    "sampler_name": SAMPLER_NAME,
                    "scheduler": SCHEDULER,
                    "denoise": 1.0,
                    "model": ["4", 0],
                    "positive": [POSITIVE_NODE, 0],
                    "negative": ["7", 0],
                    "latent_image": ["5", 0]
                }
            },
            "4": {
                "class_type": "CheckpointLoaderSimple",
                "inputs": { "ckpt_name": self.checkpoint }
            },
            "5": {
                "class_type": "EmptyLatentImage",
                "inputs": {
                    "width": request.width,
                    "height": request.height,
                    "batch_size": 1
                }
            },
            POSITIVE_NODE: {
                "class_type": "CLIPTextEncode",
                "inputs": { "text": request.prompt, "clip": ["4", 1] }
            },
            "7": {
                "class_type": "CLIPTextEncode",
                "inputs": { "text": self.negative_prompt, "clip": ["4", 1] }
            },
            "8": {
                "class_type": "VAEDecode",
                "inputs": { "samples": [SAMPLER_NODE, 0], "vae": ["4", 2] }
            },
            SAVE_NODE: {
                "class_type": "SaveImage",
                "inputs": { "filename_prefix": FILENAME_PREFIX, "images": ["8", 0] }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use illustrator_core::generation::GenerationSettings;

    use super::*;

    fn template() -> WorkflowTemplate {
        WorkflowTemplate {
            checkpoint: "sd_turbo.safetensors".into(),
            negative_prompt: "blurry".into(),
        }
    }

    #[test]
    fn sampler_carries_request_parameters() {
        let request = GenerationSettings::default().request("a dragon");
        let graph = template().build(&request, 42);

        let sampler = &graph[SAMPLER_NODE]["inputs"];
        assert_eq!(sampler["seed"], 42);
        assert_eq!(sampler["steps"], 12);
        assert_eq!(sampler["cfg"], 2.0);
    }

    #[test]
    fn prompts_and_latent_size_wired() {
        let request = GenerationSettings::default().request("a dragon");
        let graph = template().build(&request, 1);

        assert_eq!(graph[POSITIVE_NODE]["inputs"]["text"], "a dragon");
        assert_eq!(graph["7"]["inputs"]["text"], "blurry");
        assert_eq!(graph["5"]["inputs"]["width"], 512);
        assert_eq!(graph["5"]["inputs"]["height"], 512);
        assert_eq!(graph["4"]["inputs"]["ckpt_name"], "sd_turbo.safetensors");
    }

    #[test]
    fn save_node_reads_decoded_image() {
        let request = GenerationSettings::default().request("x");
        let graph = template().build(&request, 1);
        assert_eq!(graph[SAVE_NODE]["class_type"], "SaveImage");
        assert_eq!(graph[SAVE_NODE]["inputs"]["images"][0], "8");
    }
}
