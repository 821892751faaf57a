use super::interface::FrameSource;
use crate::error::CameraError;
use crate::frame::{Frame, FrameFormat, Rotation};
use async_trait::async_trait;
use image::{DynamicImage, Rgba, RgbaImage};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::trace;

/// Frame source backed by an image file on disk
pub struct StillImageSource {
    path: PathBuf,
    rotation: Rotation,
    frame_counter: AtomicU64,
    bound: bool,
}

impl StillImageSource {
    pub fn new<P: Into<PathBuf>>(path: P, rotation: Rotation) -> Self {
        Self {
            path: path.into(),
            rotation,
            frame_counter: AtomicU64::new(0),
            bound: false,
        }
    }
}

#[async_trait]
impl FrameSource for StillImageSource {
    fn name(&self) -> &str {
        "still"
    }

    async fn bind(&mut self) -> Result<(), CameraError> {
        let metadata = tokio::fs::metadata(&self.path).await.map_err(|e| match e.kind() {
            std::io::ErrorKind::PermissionDenied => CameraError::PermissionDenied {
                device: self.path.display().to_string(),
            },
            _ => CameraError::Initialization {
                details: format!("{}: {}", self.path.display(), e),
            },
        })?;

        if !metadata.is_file() {
            return Err(CameraError::Initialization {
                details: format!("{} is not a file", self.path.display()),
            });
        }

        self.bound = true;
        Ok(())
    }

    async fn unbind(&mut self) {
        self.bound = false;
    }

    async fn capture(&mut self) -> Result<Frame, CameraError> {
        if !self.bound {
            return Err(CameraError::NotBound);
        }

        let data = tokio::fs::read(&self.path)
            .await
            .map_err(|e| CameraError::Capture {
                details: format!("{}: {}", self.path.display(), e),
            })?;

        let format = image::guess_format(&data).map_err(|e| CameraError::Capture {
            details: format!("{}: {}", self.path.display(), e),
        })?;

        let (image_format, frame_format) = match format {
            image::ImageFormat::Jpeg => (format, FrameFormat::Jpeg),
            image::ImageFormat::Png => (format, FrameFormat::Png),
            other => {
                return Err(CameraError::Capture {
                    details: format!("unsupported image format {:?}", other),
                })
            }
        };

        let reader = image::io::Reader::with_format(std::io::Cursor::new(&data), image_format);
        let (width, height) = reader.into_dimensions().map_err(|e| CameraError::Capture {
            details: format!("{}: {}", self.path.display(), e),
        })?;

        let frame_id = self.frame_counter.fetch_add(1, Ordering::Relaxed);
        trace!(
            "Read still frame {} from {} ({}x{}, {} bytes)",
            frame_id,
            self.path.display(),
            width,
            height,
            data.len()
        );

        Ok(Frame::new(frame_id, data, width, height, frame_format, self.rotation))
    }
}

/// Synthesized solid-color frame used for debug uploads without a camera
pub struct PlaceholderSource {
    width: u32,
    height: u32,
    color: [u8; 4],
    frame_counter: AtomicU64,
}

impl PlaceholderSource {
    pub fn new() -> Self {
        Self::with_color(500, 500, [255, 0, 0, 255])
    }

    pub fn with_color(width: u32, height: u32, color: [u8; 4]) -> Self {
        Self {
            width,
            height,
            color,
            frame_counter: AtomicU64::new(0),
        }
    }
}

impl Default for PlaceholderSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FrameSource for PlaceholderSource {
    fn name(&self) -> &str {
        "placeholder"
    }

    async fn bind(&mut self) -> Result<(), CameraError> {
        Ok(())
    }

    async fn unbind(&mut self) {}

    async fn capture(&mut self) -> Result<Frame, CameraError> {
        let frame_id = self.frame_counter.fetch_add(1, Ordering::Relaxed);
        let image = RgbaImage::from_pixel(self.width, self.height, Rgba(self.color));
        Ok(Frame::from_image(
            frame_id,
            &DynamicImage::ImageRgba8(image),
            Rotation::Upright,
        ))
    }
}
