//! ComfyUI-backed image synthesis.
//!
//! Provides the HTTP API wrapper, a txt2img workflow builder, history
//! parsing, and [`gateway::ComfyUIGateway`], the
//! [`ImageSynthesizer`](illustrator_core::gateway::ImageSynthesizer)
//! implementation used by the server.

pub mod api;
pub mod gateway;
pub mod history;
pub mod workflow;
