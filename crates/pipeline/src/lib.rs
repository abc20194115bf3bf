//! Illustration orchestrators.
//!
//! Each orchestrator drives the segmenter/composer from
//! `illustrator_core`, issues synthesis calls strictly one at a time
//! through an injected [`ImageSynthesizer`](illustrator_core::gateway::ImageSynthesizer),
//! and persists every image into a per-request [`store::Batch`].
//!
//! - [`scene`]: story text -> one image per scene
//! - [`style`]: one prompt -> style variations
//! - [`bias`]: one prompt -> demographic grid

pub mod bias;
pub mod error;
pub mod runner;
pub mod scene;
pub mod store;
pub mod style;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use error::PipelineError;
pub use runner::PipelineOptions;
