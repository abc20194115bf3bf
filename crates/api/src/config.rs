use std::str::FromStr;
use std::time::Duration;

use illustrator_comfyui::gateway::{ComfyUIConfig, DEFAULT_POLL_INTERVAL};
use illustrator_core::error::CoreError;
use illustrator_core::generation::{
    GenerationSettings, DEFAULT_GUIDANCE_SCALE, DEFAULT_HEIGHT, DEFAULT_STEPS, DEFAULT_WIDTH,
};
use illustrator_pipeline::runner::DEFAULT_SYNTHESIS_TIMEOUT;
use illustrator_pipeline::PipelineOptions;

/// Server configuration loaded from environment variables.
///
/// All fields have defaults suitable for local development against a
/// ComfyUI instance on the same machine.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `8000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds. Sized for a whole batch (default: `900`).
    pub request_timeout_secs: u64,
    /// Directory generated images are written to (default: `static`).
    pub output_dir: String,
    /// ComfyUI connection settings.
    pub comfyui: ComfyUIConfig,
    /// Sampling parameters and per-call timeout.
    pub pipeline: PipelineOptions,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                    | Default                   |
    /// |----------------------------|---------------------------|
    /// | `HOST`                     | `0.0.0.0`                 |
    /// | `PORT`                     | `8000`                    |
    /// | `CORS_ORIGINS`             | `http://localhost:5173`   |
    /// | `REQUEST_TIMEOUT_SECS`     | `900`                     |
    /// | `OUTPUT_DIR`               | `static`                  |
    /// | `COMFYUI_URL`              | `http://127.0.0.1:8188`   |
    /// | `COMFYUI_CHECKPOINT`       | `sd_turbo.safetensors`    |
    /// | `COMFYUI_NEGATIVE_PROMPT`  | (empty)                   |
    /// | `COMFYUI_POLL_INTERVAL_MS` | `250`                     |
    /// | `SYNTHESIS_TIMEOUT_SECS`   | `300`                     |
    /// | `GENERATION_STEPS`         | `12`                      |
    /// | `GENERATION_GUIDANCE`      | `2.0`                     |
    /// | `GENERATION_HEIGHT`        | `512`                     |
    /// | `GENERATION_WIDTH`         | `512`                     |
    ///
    /// Panics on unparseable or out-of-range values so misconfiguration
    /// stops startup instead of failing each request.
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());
        let port: u16 = parse_env("PORT", 8000);

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = parse_env("REQUEST_TIMEOUT_SECS", 900);
        let output_dir = std::env::var("OUTPUT_DIR").unwrap_or_else(|_| "static".into());

        let comfyui = ComfyUIConfig {
            api_url: std::env::var("COMFYUI_URL")
                .unwrap_or_else(|_| "http://127.0.0.1:8188".into()),
            checkpoint: std::env::var("COMFYUI_CHECKPOINT")
                .unwrap_or_else(|_| "sd_turbo.safetensors".into()),
            negative_prompt: std::env::var("COMFYUI_NEGATIVE_PROMPT").unwrap_or_default(),
            poll_interval: Duration::from_millis(parse_env(
                "COMFYUI_POLL_INTERVAL_MS",
                DEFAULT_POLL_INTERVAL.as_millis() as u64,
            )),
        };

        let pipeline = PipelineOptions {
            settings: GenerationSettings {
                steps: parse_env("GENERATION_STEPS", DEFAULT_STEPS),
                guidance_scale: parse_env("GENERATION_GUIDANCE", DEFAULT_GUIDANCE_SCALE),
                height: parse_env("GENERATION_HEIGHT", DEFAULT_HEIGHT),
                width: parse_env("GENERATION_WIDTH", DEFAULT_WIDTH),
            },
            synthesis_timeout: Duration::from_secs(parse_env(
                "SYNTHESIS_TIMEOUT_SECS",
                DEFAULT_SYNTHESIS_TIMEOUT.as_secs(),
            )),
            ..Default::default()
        };

        let config = Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            output_dir,
            comfyui,
            pipeline,
        };
        if let Err(e) = config.validate() {
            panic!("Invalid configuration: {e}");
        }
        config
    }

    /// Reject settings that would fail every generation request.
    pub fn validate(&self) -> Result<(), CoreError> {
        self.pipeline.settings.validate()?;
        if self.pipeline.synthesis_timeout.is_zero() {
            return Err(CoreError::Validation(
                "SYNTHESIS_TIMEOUT_SECS must be greater than 0".into(),
            ));
        }
        if self.request_timeout_secs == 0 {
            return Err(CoreError::Validation(
                "REQUEST_TIMEOUT_SECS must be greater than 0".into(),
            ));
        }
        if self.output_dir.trim().is_empty() {
            return Err(CoreError::Validation("OUTPUT_DIR must not be empty".into()));
        }
        Ok(())
    }
}

/// Read `key` and parse it, falling back to `default` when unset.
fn parse_env<T: FromStr>(key: &str, default: T) -> T {
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .unwrap_or_else(|_| panic!("{key} must be a valid {}", std::any::type_name::<T>())),
        Err(_) => default,
    }
}
