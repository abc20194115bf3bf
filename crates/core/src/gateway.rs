//! The image synthesis seam.
//!
//! [`ImageSynthesizer`] is the only way the pipeline reaches a diffusion
//! backend. Implementations own the model/device lifecycle; callers issue
//! one [`synthesize`](ImageSynthesizer::synthesize) at a time and call
//! [`release`](ImageSynthesizer::release) after each image.

use std::io::Cursor;
use std::time::Duration;

use image::{ImageFormat, ImageReader};

use crate::generation::GenerationRequest;

/// Errors raised by a synthesis backend.
#[derive(Debug, thiserror::Error)]
pub enum SynthesisError {
    /// The backend could not be reached.
    #[error("Synthesis backend unavailable: {0}")]
    Unavailable(String),

    /// The backend rejected the request or answered with an error status.
    #[error("Synthesis backend error: {0}")]
    Backend(String),

    /// The backend accepted the job but execution failed.
    #[error("Synthesis execution failed: {0}")]
    Execution(String),

    /// Execution finished without producing an image.
    #[error("No image produced: {0}")]
    MissingOutput(String),

    /// The returned bytes are not a decodable image.
    #[error("Invalid image data: {0}")]
    InvalidImage(String),

    /// The call did not complete in time.
    #[error("Synthesis timed out after {}s", .0.as_secs())]
    Timeout(Duration),

    /// The caller abandoned the call before it finished.
    #[error("Synthesis cancelled")]
    Cancelled,
}

/// One rendered image as returned by the backend.
#[derive(Debug, Clone)]
pub struct GeneratedImage {
    pub bytes: Vec<u8>,
    pub format: ImageFormat,
    pub width: u32,
    pub height: u32,
}

impl GeneratedImage {
    /// Wrap raw bytes, probing format and dimensions from the header.
    ///
    /// Empty or unrecognized data is rejected.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, SynthesisError> {
        if bytes.is_empty() {
            return Err(SynthesisError::InvalidImage("empty image payload".into()));
        }

        let reader = ImageReader::new(Cursor::new(bytes.as_slice()))
            .with_guessed_format()
            .map_err(|e| SynthesisError::InvalidImage(e.to_string()))?;
        let format = reader
            .format()
            .ok_or_else(|| SynthesisError::InvalidImage("unrecognized image format".into()))?;
        let (width, height) = reader
            .into_dimensions()
            .map_err(|e| SynthesisError::InvalidImage(e.to_string()))?;

        Ok(Self {
            bytes,
            format,
            width,
            height,
        })
    }

    /// PNG-encoded bytes, re-encoding when the backend returned another format.
    pub fn into_png_bytes(self) -> Result<Vec<u8>, SynthesisError> {
        if self.format == ImageFormat::Png {
            return Ok(self.bytes);
        }

        let decoded = image::load_from_memory_with_format(&self.bytes, self.format)
            .map_err(|e| SynthesisError::InvalidImage(e.to_string()))?;
        let mut out = Cursor::new(Vec::new());
        decoded
            .write_to(&mut out, ImageFormat::Png)
            .map_err(|e| SynthesisError::InvalidImage(e.to_string()))?;
        Ok(out.into_inner())
    }
}

/// A text-to-image backend.
///
/// Calls are expected to be serialized by the caller: the backend
/// monopolizes a single accelerator.
#[async_trait::async_trait]
pub trait ImageSynthesizer: Send + Sync {
    /// Render exactly one image for `request`.
    async fn synthesize(&self, request: &GenerationRequest) -> Result<GeneratedImage, SynthesisError>;

    /// Release transient accelerator memory held after a call.
    async fn release(&self) -> Result<(), SynthesisError>;

    /// Abort the call in flight, if the backend supports it.
    async fn cancel(&self) -> Result<(), SynthesisError> {
        Ok(())
    }

    /// Check that the backend is reachable.
    async fn health(&self) -> Result<(), SynthesisError>;

    /// Short backend name for logs.
    fn name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use image::{ImageBuffer, Rgb};

    use super::*;

    fn encode(width: u32, height: u32, format: ImageFormat) -> Vec<u8> {
        let img: ImageBuffer<Rgb<u8>, Vec<u8>> = ImageBuffer::new(width, height);
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, format).unwrap();
        out.into_inner()
    }

    #[test]
    fn png_dimensions_read() {
        let image = GeneratedImage::from_bytes(encode(16, 8, ImageFormat::Png)).unwrap();
        assert_eq!(image.format, ImageFormat::Png);
        assert_eq!((image.width, image.height), (16, 8));
    }

    #[test]
    fn empty_payload_rejected() {
        assert_matches!(
            GeneratedImage::from_bytes(Vec::new()),
            Err(SynthesisError::InvalidImage(_))
        );
    }

    #[test]
    fn garbage_payload_rejected() {
        assert_matches!(
            GeneratedImage::from_bytes(b"not an image".to_vec()),
            Err(SynthesisError::InvalidImage(_))
        );
    }

    #[test]
    fn jpeg_reencoded_as_png() {
        let image = GeneratedImage::from_bytes(encode(8, 8, ImageFormat::Jpeg)).unwrap();
        assert_eq!(image.format, ImageFormat::Jpeg);
        let png = image.into_png_bytes().unwrap();
        assert_eq!(image::guess_format(&png).unwrap(), ImageFormat::Png);
    }

    #[test]
    fn png_passes_through_untouched() {
        let bytes = encode(8, 8, ImageFormat::Png);
        let image = GeneratedImage::from_bytes(bytes.clone()).unwrap();
        assert_eq!(image.into_png_bytes().unwrap(), bytes);
    }
}
