//! In-memory [`ImageSynthesizer`] for tests.
//!
//! Records every prompt, returns a small PNG, and can be told to fail on
//! specific call numbers or to sleep before answering. Tracks how many
//! calls are in flight at once.

use std::collections::HashSet;
use std::io::Cursor;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use illustrator_core::gateway::{GeneratedImage, ImageSynthesizer, SynthesisError};
use illustrator_core::generation::GenerationRequest;

/// Scriptable fake synthesizer.
#[derive(Debug, Default)]
pub struct FakeSynthesizer {
    /// Prompts received, in call order.
    pub prompts: Mutex<Vec<String>>,
    /// Number of `release` calls.
    pub releases: AtomicU32,
    /// Number of `cancel` calls.
    pub cancels: AtomicU32,
    in_flight: AtomicU32,
    max_in_flight: AtomicU32,
    /// 1-based call numbers that fail.
    fail_on: HashSet<u32>,
    delay: Option<Duration>,
    unhealthy: bool,
}

impl FakeSynthesizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the given 1-based calls with an execution error.
    pub fn failing_on(mut self, calls: &[u32]) -> Self {
        self.fail_on = calls.iter().copied().collect();
        self
    }

    /// Sleep before answering each call.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Report the backend as unreachable from `health`.
    pub fn unhealthy(mut self) -> Self {
        self.unhealthy = true;
        self
    }

    /// Number of synthesize calls received.
    pub fn calls(&self) -> usize {
        self.prompts.lock().map(|p| p.len()).unwrap_or(0)
    }

    /// Calls currently inside `synthesize`.
    pub fn in_flight(&self) -> u32 {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Highest number of overlapping `synthesize` calls seen.
    pub fn max_in_flight(&self) -> u32 {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    /// Copy of the recorded prompts.
    pub fn recorded_prompts(&self) -> Vec<String> {
        self.prompts.lock().map(|p| p.clone()).unwrap_or_default()
    }
}

/// Decrements the in-flight counter when a call ends or is dropped.
struct InFlight<'a>(&'a AtomicU32);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// A black PNG of the given size.
pub fn png_fixture(width: u32, height: u32) -> Vec<u8> {
    let img = image::RgbImage::new(width, height);
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, image::ImageFormat::Png)
        .expect("encoding an in-memory PNG cannot fail");
    out.into_inner()
}

#[async_trait::async_trait]
impl ImageSynthesizer for FakeSynthesizer {
    async fn synthesize(&self, request: &GenerationRequest) -> Result<GeneratedImage, SynthesisError> {
        let call = {
            let mut prompts = self
                .prompts
                .lock()
                .map_err(|_| SynthesisError::Backend("fake poisoned".into()))?;
            prompts.push(request.prompt.clone());
            prompts.len() as u32
        };

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        let _in_flight = InFlight(&self.in_flight);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if self.fail_on.contains(&call) {
            return Err(SynthesisError::Execution(format!("scripted failure on call {call}")));
        }

        GeneratedImage::from_bytes(png_fixture(8, 8))
    }

    async fn release(&self) -> Result<(), SynthesisError> {
        self.releases.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn cancel(&self) -> Result<(), SynthesisError> {
        self.cancels.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn health(&self) -> Result<(), SynthesisError> {
        if self.unhealthy {
            Err(SynthesisError::Unavailable("fake is down".into()))
        } else {
            Ok(())
        }
    }

    fn name(&self) -> &str {
        "fake"
    }
}
