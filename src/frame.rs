use crate::error::ProcessingError;
use image::{DynamicImage, RgbaImage};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Pixel layout of a captured frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FrameFormat {
    /// JPEG compressed bytes
    Jpeg,
    /// PNG compressed bytes
    Png,
    /// Uncompressed RGBA, 8 bits per channel
    Rgba8,
}

impl FrameFormat {
    /// Container format for compressed frames, `None` for raw pixels
    pub fn image_format(&self) -> Option<image::ImageFormat> {
        match self {
            FrameFormat::Jpeg => Some(image::ImageFormat::Jpeg),
            FrameFormat::Png => Some(image::ImageFormat::Png),
            FrameFormat::Rgba8 => None,
        }
    }
}

/// Sensor-reported rotation needed to bring a frame upright
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Rotation {
    /// Already upright
    #[default]
    Upright,
    /// Rotate 90 degrees clockwise
    Rotate90,
    /// Rotate 180 degrees
    Rotate180,
    /// Rotate 270 degrees clockwise (90 degrees counter-clockwise)
    Rotate270,
}

impl Rotation {
    /// Get rotation angle in degrees
    pub fn degrees(&self) -> u16 {
        match self {
            Rotation::Upright => 0,
            Rotation::Rotate90 => 90,
            Rotation::Rotate180 => 180,
            Rotation::Rotate270 => 270,
        }
    }

    /// Map sensor degrees to a rotation; only quarter turns are valid
    pub fn from_degrees(degrees: u16) -> Option<Self> {
        match degrees % 360 {
            0 => Some(Rotation::Upright),
            90 => Some(Rotation::Rotate90),
            180 => Some(Rotation::Rotate180),
            270 => Some(Rotation::Rotate270),
            _ => None,
        }
    }

    /// Rotate an image clockwise by this amount
    pub fn apply(&self, image: DynamicImage) -> DynamicImage {
        match self {
            Rotation::Upright => image,
            Rotation::Rotate90 => image.rotate90(),
            Rotation::Rotate180 => image.rotate180(),
            Rotation::Rotate270 => image.rotate270(),
        }
    }
}

/// One raw captured image plus its sensor-reported rotation
///
/// Immutable once captured; the preprocessing stage takes it by value.
#[derive(Debug, Clone)]
pub struct Frame {
    pub id: u64,
    pub data: Arc<Vec<u8>>,
    /// Frame width in pixels, as stored (before rotation)
    pub width: u32,
    /// Frame height in pixels, as stored (before rotation)
    pub height: u32,
    pub format: FrameFormat,
    pub rotation: Rotation,
}

impl Frame {
    pub fn new(
        id: u64,
        data: Vec<u8>,
        width: u32,
        height: u32,
        format: FrameFormat,
        rotation: Rotation,
    ) -> Self {
        Self {
            id,
            data: Arc::new(data),
            width,
            height,
            format,
            rotation,
        }
    }

    /// Build a frame from an in-memory image, stored as raw RGBA
    pub fn from_image(id: u64, image: &DynamicImage, rotation: Rotation) -> Self {
        let rgba = image.to_rgba8();
        let (width, height) = rgba.dimensions();
        Self::new(id, rgba.into_raw(), width, height, FrameFormat::Rgba8, rotation)
    }

    /// Decode the stored bytes into an image
    pub fn decode(&self) -> Result<DynamicImage, ProcessingError> {
        if let Some(format) = self.format.image_format() {
            return image::load_from_memory_with_format(&self.data, format).map_err(|e| {
                ProcessingError::Decode {
                    details: format!("frame {}: {}", self.id, e),
                }
            });
        }

        let expected = self.width as usize * self.height as usize * 4;
        if self.data.len() != expected {
            return Err(ProcessingError::Decode {
                details: format!(
                    "frame {} has {} bytes, expected {} for {}x{} RGBA",
                    self.id,
                    self.data.len(),
                    expected,
                    self.width,
                    self.height
                ),
            });
        }
        RgbaImage::from_raw(self.width, self.height, self.data.as_ref().clone())
            .map(DynamicImage::ImageRgba8)
            .ok_or_else(|| ProcessingError::Decode {
                details: format!("frame {} buffer does not match dimensions", self.id),
            })
    }
}
