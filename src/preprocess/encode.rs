use crate::config::OutputFormat;
use crate::error::ProcessingError;
use base64::Engine as _;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::{ColorType, DynamicImage, ImageEncoder, Rgb, RgbImage};

/// Transport-ready image: compressed bytes rendered as base64 text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    pub format: OutputFormat,
    pub width: u32,
    pub height: u32,
    /// Size of the compressed image before base64
    pub byte_len: usize,
    pub base64: String,
}

impl EncodedImage {
    /// Decode the payload back into compressed bytes
    pub fn to_bytes(&self) -> Result<Vec<u8>, ProcessingError> {
        base64::engine::general_purpose::STANDARD
            .decode(&self.base64)
            .map_err(|e| ProcessingError::Encoding {
                details: e.to_string(),
            })
    }
}

/// Compress an image and render it as base64.
///
/// JPEG has no alpha channel, so transparent regions (removed background) are
/// flattened onto white first.
pub fn encode_image(
    image: &DynamicImage,
    format: OutputFormat,
    jpeg_quality: u8,
) -> Result<EncodedImage, ProcessingError> {
    let (width, height) = (image.width(), image.height());
    if width == 0 || height == 0 {
        return Err(ProcessingError::Encoding {
            details: "cannot encode an empty image".to_string(),
        });
    }

    let mut buf = Vec::new();
    match format {
        OutputFormat::Jpeg => {
            let flattened = flatten_onto_white(image);
            let mut encoder = JpegEncoder::new_with_quality(&mut buf, jpeg_quality);
            encoder
                .encode_image(&flattened)
                .map_err(|e| ProcessingError::Encoding {
                    details: e.to_string(),
                })?;
        }
        OutputFormat::Png => {
            let rgba = image.to_rgba8();
            PngEncoder::new(&mut buf)
                .write_image(rgba.as_raw(), width, height, ColorType::Rgba8)
                .map_err(|e| ProcessingError::Encoding {
                    details: e.to_string(),
                })?;
        }
    }

    let byte_len = buf.len();
    Ok(EncodedImage {
        format,
        width,
        height,
        byte_len,
        base64: base64::engine::general_purpose::STANDARD.encode(&buf),
    })
}

fn flatten_onto_white(image: &DynamicImage) -> RgbImage {
    let rgba = image.to_rgba8();
    RgbImage::from_fn(rgba.width(), rgba.height(), |x, y| {
        let p = rgba.get_pixel(x, y);
        let alpha = p[3] as u16;
        let blend = |c: u8| ((c as u16 * alpha + 255 * (255 - alpha)) / 255) as u8;
        Rgb([blend(p[0]), blend(p[1]), blend(p[2])])
    })
}
