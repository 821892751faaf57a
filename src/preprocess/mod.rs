mod encode;
mod segment;

pub use encode::{encode_image, EncodedImage};
pub use segment::{BorderKeySegmenter, DisabledSegmenter, Segmenter};

use crate::config::PreprocessConfig;
use crate::error::{ProcessingError, SegmentationError};
use crate::frame::{Frame, Rotation};
use image::DynamicImage;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// How the segmentation step ended for one frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SegmentationOutcome {
    /// Foreground extracted and used
    Foreground,
    /// Segmenter found nothing, or only a degenerate result
    NoForeground,
    /// Segmenter failed or timed out; the upright image was used
    Failed(String),
}

/// Result of preprocessing one frame
#[derive(Debug, Clone)]
pub struct ProcessedImage {
    pub encoded: EncodedImage,
    pub segmentation: SegmentationOutcome,
}

/// Normalizes raw frames into upload-ready payloads.
///
/// Rotation never fails; segmentation failures degrade to the upright image;
/// only decode and encode faults abort with a `ProcessingError`.
pub struct ImagePreprocessor {
    config: PreprocessConfig,
    segmenter: Arc<dyn Segmenter>,
}

impl ImagePreprocessor {
    pub fn new(config: PreprocessConfig, segmenter: Arc<dyn Segmenter>) -> Self {
        Self { config, segmenter }
    }

    /// Build a preprocessor with the segmenter the configuration asks for
    pub fn from_config(config: PreprocessConfig) -> Self {
        let segmenter: Arc<dyn Segmenter> = if config.segmentation_enabled {
            Arc::new(BorderKeySegmenter::new(config.background_tolerance))
        } else {
            Arc::new(DisabledSegmenter)
        };
        Self::new(config, segmenter)
    }

    pub fn config(&self) -> &PreprocessConfig {
        &self.config
    }

    /// Rotate, segment and encode a frame off the calling task
    pub async fn process(&self, frame: Frame) -> Result<ProcessedImage, ProcessingError> {
        let started = Instant::now();
        let frame_id = frame.id;
        let rotation = frame.rotation;

        let upright = tokio::task::spawn_blocking(move || {
            frame.decode().map(|image| rotate_upright(image, rotation))
        })
        .await
        .map_err(|e| ProcessingError::Task {
            details: e.to_string(),
        })??;

        debug!(
            "Frame {} upright at {}x{} (rotated {} degrees)",
            frame_id,
            upright.width(),
            upright.height(),
            rotation.degrees()
        );

        let (image, segmentation) = self.segment_or_fallback(frame_id, upright).await;

        let format = self.config.output_format;
        let quality = self.config.jpeg_quality;
        let encoded = tokio::task::spawn_blocking(move || encode_image(&image, format, quality))
            .await
            .map_err(|e| ProcessingError::Task {
                details: e.to_string(),
            })??;

        info!(
            "Frame {} processed in {:?}: {:?}, {} bytes ({:?})",
            frame_id,
            started.elapsed(),
            format,
            encoded.byte_len,
            segmentation
        );

        Ok(ProcessedImage {
            encoded,
            segmentation,
        })
    }

    async fn segment_or_fallback(
        &self,
        frame_id: u64,
        upright: DynamicImage,
    ) -> (DynamicImage, SegmentationOutcome) {
        let timeout_secs = self.config.segmentation_timeout_secs;
        let result = tokio::time::timeout(
            Duration::from_secs(timeout_secs),
            self.segmenter.extract_foreground(&upright),
        )
        .await
        .unwrap_or(Err(SegmentationError::Timeout {
            seconds: timeout_secs,
        }));

        match result {
            Ok(Some(foreground)) if self.is_usable_foreground(&foreground) => {
                (foreground, SegmentationOutcome::Foreground)
            }
            Ok(Some(_)) => {
                warn!(
                    "Segmentation of frame {} returned a degenerate foreground; using original",
                    frame_id
                );
                (upright, SegmentationOutcome::NoForeground)
            }
            Ok(None) => {
                debug!("No foreground found in frame {}; using original", frame_id);
                (upright, SegmentationOutcome::NoForeground)
            }
            Err(e) => {
                warn!("Segmentation of frame {} failed: {}; using original", frame_id, e);
                (upright, SegmentationOutcome::Failed(e.to_string()))
            }
        }
    }

    fn is_usable_foreground(&self, foreground: &DynamicImage) -> bool {
        if foreground.width() == 0 || foreground.height() == 0 {
            return false;
        }
        let required = self.config.min_foreground_pixels;
        if required == 0 {
            return true;
        }
        let mut opaque = 0u64;
        for pixel in foreground.to_rgba8().pixels() {
            if pixel[3] > 0 {
                opaque += 1;
                if opaque >= required {
                    return true;
                }
            }
        }
        false
    }
}

/// Rotate a decoded frame clockwise to upright; a zero rotation passes through
pub fn rotate_upright(image: DynamicImage, rotation: Rotation) -> DynamicImage {
    rotation.apply(image)
}
