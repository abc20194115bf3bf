//! Domain logic for the story illustrator.
//!
//! Everything here is pure or trait-level: text segmentation, prompt
//! composition, the demographic attribute table, output filename
//! conventions, generation parameters, and the [`gateway::ImageSynthesizer`]
//! seam behind which the actual diffusion backend lives.

pub mod attributes;
pub mod error;
pub mod gateway;
pub mod generation;
pub mod naming;
pub mod prompt;
pub mod segment;
