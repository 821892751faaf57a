use crate::error::SegmentationError;
use async_trait::async_trait;
use image::{DynamicImage, GrayImage, Luma, Rgba, RgbaImage};
use imageproc::{distance_transform::Norm, morphology::open};
use tracing::debug;

/// Foreground/background separation capability
///
/// `Ok(None)` means the call succeeded but found no foreground.
#[async_trait]
pub trait Segmenter: Send + Sync {
    async fn extract_foreground(
        &self,
        image: &DynamicImage,
    ) -> Result<Option<DynamicImage>, SegmentationError>;
}

/// Removes pixels whose color is close to the mean color of the image border.
///
/// Works for garments photographed against a plain backdrop. The mask is
/// cleaned with a morphological opening so isolated speckles do not count as
/// foreground.
pub struct BorderKeySegmenter {
    tolerance: f32,
    cleanup_radius: u8,
}

impl BorderKeySegmenter {
    pub fn new(tolerance: f32) -> Self {
        Self {
            tolerance,
            cleanup_radius: 1,
        }
    }

    pub fn with_cleanup_radius(mut self, radius: u8) -> Self {
        self.cleanup_radius = radius;
        self
    }

    fn segment(&self, rgba: &RgbaImage) -> Option<RgbaImage> {
        let (width, height) = rgba.dimensions();
        if width == 0 || height == 0 {
            return None;
        }

        let background = border_mean(rgba);
        let mask = GrayImage::from_fn(width, height, |x, y| {
            let p = rgba.get_pixel(x, y);
            if p[3] == 0 || color_distance(p, &background) <= self.tolerance {
                Luma([0u8])
            } else {
                Luma([255u8])
            }
        });

        let mask = if self.cleanup_radius > 0 {
            open(&mask, Norm::LInf, self.cleanup_radius)
        } else {
            mask
        };

        let opaque = mask.pixels().filter(|p| p[0] > 0).count();
        debug!(
            "Border key segmentation kept {} of {} pixels (background {:?})",
            opaque,
            width as usize * height as usize,
            background
        );
        if opaque == 0 {
            return None;
        }

        Some(RgbaImage::from_fn(width, height, |x, y| {
            let p = rgba.get_pixel(x, y);
            let alpha = mask.get_pixel(x, y)[0];
            Rgba([p[0], p[1], p[2], alpha.min(p[3])])
        }))
    }
}

#[async_trait]
impl Segmenter for BorderKeySegmenter {
    async fn extract_foreground(
        &self,
        image: &DynamicImage,
    ) -> Result<Option<DynamicImage>, SegmentationError> {
        let rgba = image.to_rgba8();
        let segmenter = BorderKeySegmenter {
            tolerance: self.tolerance,
            cleanup_radius: self.cleanup_radius,
        };

        tokio::task::spawn_blocking(move || segmenter.segment(&rgba))
            .await
            .map(|result| result.map(DynamicImage::ImageRgba8))
            .map_err(|e| SegmentationError::Failed {
                details: e.to_string(),
            })
    }
}

/// Segmenter that never finds a foreground; used when segmentation is disabled
pub struct DisabledSegmenter;

#[async_trait]
impl Segmenter for DisabledSegmenter {
    async fn extract_foreground(
        &self,
        _image: &DynamicImage,
    ) -> Result<Option<DynamicImage>, SegmentationError> {
        Ok(None)
    }
}

fn border_mean(image: &RgbaImage) -> [f32; 3] {
    let (width, height) = image.dimensions();
    let mut sum = [0f64; 3];
    let mut count = 0f64;

    let mut add = |x: u32, y: u32| {
        let p = image.get_pixel(x, y);
        for c in 0..3 {
            sum[c] += p[c] as f64;
        }
        count += 1.0;
    };

    for x in 0..width {
        add(x, 0);
        if height > 1 {
            add(x, height - 1);
        }
    }
    for y in 1..height.saturating_sub(1) {
        add(0, y);
        if width > 1 {
            add(width - 1, y);
        }
    }

    [
        (sum[0] / count) as f32,
        (sum[1] / count) as f32,
        (sum[2] / count) as f32,
    ]
}

fn color_distance(p: &Rgba<u8>, background: &[f32; 3]) -> f32 {
    let dr = p[0] as f32 - background[0];
    let dg = p[1] as f32 - background[1];
    let db = p[2] as f32 - background[2];
    (dr * dr + dg * dg + db * db).sqrt()
}
