use std::sync::Arc;

use illustrator_core::gateway::ImageSynthesizer;
use illustrator_pipeline::store::OutputStore;
use illustrator_pipeline::PipelineOptions;
use tokio::sync::Mutex;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Image backend, created once at startup.
    pub synthesizer: Arc<dyn ImageSynthesizer>,
    /// Held for the whole of a generation request. The backend owns one
    /// accelerator, so concurrent requests queue here.
    pub generation_lock: Arc<Mutex<()>>,
    /// Output directory.
    pub store: OutputStore,
    /// Sampling parameters and per-call timeout. Each request swaps in
    /// its own cancellation token.
    pub options: PipelineOptions,
}

impl AppState {
    pub fn new(config: ServerConfig, synthesizer: Arc<dyn ImageSynthesizer>) -> Self {
        let store = OutputStore::new(&config.output_dir);
        let options: PipelineOptions = config.pipeline.clone();
        Self {
            config: Arc::new(config),
            synthesizer,
            generation_lock: Arc::new(Mutex::new(())),
            store,
            options,
        }
    }
}
