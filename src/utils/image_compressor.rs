//! Event image compression
//!
//! Uploaded event images are validated, downscaled and re-encoded as JPEG
//! until they fit the configured size, then returned as a data URL that is
//! stored inline with the event.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::GenericImageView;
use tracing::debug;

use crate::config::ImageConfig;
use crate::utils::errors::{Result, VincuHubError};
use crate::utils::helpers::format_bytes;

pub const ACCEPTED_TYPES: [&str; 4] = ["image/jpeg", "image/jpg", "image/png", "image/webp"];

/// Raw upload as received from a client
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl ImageUpload {
    /// Parse a `data:<mime>;base64,<payload>` URL
    pub fn from_data_url(data_url: &str) -> Result<Self> {
        let rest = data_url
            .strip_prefix("data:")
            .ok_or_else(|| VincuHubError::Image("La imagen debe enviarse como data URL".to_string()))?;
        let (header, payload) = rest
            .split_once(',')
            .ok_or_else(|| VincuHubError::Image("Data URL mal formada".to_string()))?;
        let content_type = header
            .strip_suffix(";base64")
            .ok_or_else(|| VincuHubError::Image("Solo se aceptan imágenes en base64".to_string()))?;
        let bytes = STANDARD
            .decode(payload.trim())
            .map_err(|e| VincuHubError::Image(format!("Base64 inválido: {}", e)))?;

        Ok(Self {
            content_type: content_type.to_ascii_lowercase(),
            bytes,
        })
    }
}

/// Compressed JPEG ready for storage
#[derive(Debug, Clone)]
pub struct CompressedImage {
    pub data_url: String,
    pub width: u32,
    pub height: u32,
    pub quality: u8,
    pub size_bytes: usize,
}

#[derive(Debug, Clone)]
pub struct ImageCompressor {
    config: ImageConfig,
}

impl ImageCompressor {
    pub fn new(config: ImageConfig) -> Self {
        Self { config }
    }

    /// Check type and upload size before decoding
    pub fn validate(&self, upload: &ImageUpload) -> Result<()> {
        if !ACCEPTED_TYPES.contains(&upload.content_type.as_str()) {
            return Err(VincuHubError::Image(
                "Tipo de archivo no válido. Solo se permiten JPG, PNG y WEBP".to_string(),
            ));
        }

        let max_bytes = self.config.max_upload_mb * 1024 * 1024;
        if upload.bytes.len() as u64 > max_bytes {
            return Err(VincuHubError::Image(format!(
                "La imagen es demasiado grande ({}). Máximo {}",
                format_bytes(upload.bytes.len() as u64),
                format_bytes(max_bytes)
            )));
        }

        Ok(())
    }

    /// Resize to fit the maximum dimension and lower JPEG quality until the
    /// payload fits the size target or the quality floor is reached
    pub fn compress(&self, upload: &ImageUpload) -> Result<CompressedImage> {
        self.validate(upload)?;

        let decoded = image::load_from_memory(&upload.bytes)
            .map_err(|e| VincuHubError::Image(format!("No se pudo leer la imagen: {}", e)))?;

        let (width, height) = decoded.dimensions();
        let max = self.config.max_dimension;
        let resized = if width > max || height > max {
            decoded.resize(max, max, FilterType::Triangle)
        } else {
            decoded
        };
        let rgb = resized.to_rgb8();

        let target = (self.config.max_size_kb * 1024) as usize;
        let mut quality = self.config.quality;
        let mut encoded = encode_jpeg(&rgb, quality)?;

        while encoded.len() > target && quality > self.config.min_quality {
            quality = quality.saturating_sub(10).max(self.config.min_quality);
            encoded = encode_jpeg(&rgb, quality)?;
            debug!(quality = quality, size_bytes = encoded.len(), "Re-encoded event image");
        }

        debug!(
            original = %format_bytes(upload.bytes.len() as u64),
            compressed = %format_bytes(encoded.len() as u64),
            width = rgb.width(),
            height = rgb.height(),
            quality = quality,
            "Event image compressed"
        );

        Ok(CompressedImage {
            data_url: format!("data:image/jpeg;base64,{}", STANDARD.encode(&encoded)),
            width: rgb.width(),
            height: rgb.height(),
            quality,
            size_bytes: encoded.len(),
        })
    }
}

fn encode_jpeg(image: &image::RgbImage, quality: u8) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    JpegEncoder::new_with_quality(&mut buffer, quality)
        .encode_image(image)
        .map_err(|e| VincuHubError::Image(format!("No se pudo comprimir la imagen: {}", e)))?;
    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
    use std::io::Cursor;

    fn png_upload(width: u32, height: u32) -> ImageUpload {
        let img = RgbImage::from_fn(width, height, |x, y| Rgb([(x % 256) as u8, (y % 256) as u8, 128]));
        let mut bytes = Vec::new();
        DynamicImage::ImageRgb8(img)
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        ImageUpload { content_type: "image/png".to_string(), bytes }
    }

    fn compressor() -> ImageCompressor {
        ImageCompressor::new(Settings::default().images)
    }

    #[test]
    fn test_rejects_unsupported_type() {
        let upload = ImageUpload { content_type: "image/gif".to_string(), bytes: vec![0; 10] };
        assert!(compressor().validate(&upload).is_err());
    }

    #[test]
    fn test_rejects_oversized_upload() {
        let upload = ImageUpload {
            content_type: "image/jpeg".to_string(),
            bytes: vec![0; 10 * 1024 * 1024 + 1],
        };
        let err = compressor().validate(&upload).unwrap_err();
        assert_eq!(err.to_string(), "Image processing error: La imagen es demasiado grande (10.0 MB). Máximo 10.0 MB");
    }

    #[test]
    fn test_downscales_preserving_aspect_ratio() {
        let result = compressor().compress(&png_upload(2400, 1200)).unwrap();
        assert_eq!((result.width, result.height), (1200, 600));
        assert!(result.data_url.starts_with("data:image/jpeg;base64,"));
        assert!(result.quality >= 30 && result.quality <= 80);
    }

    #[test]
    fn test_small_image_keeps_size_and_quality() {
        let result = compressor().compress(&png_upload(64, 32)).unwrap();
        assert_eq!((result.width, result.height), (64, 32));
        assert_eq!(result.quality, 80);
    }

    #[test]
    fn test_data_url_parsing() {
        let upload = png_upload(4, 4);
        let url = format!("data:image/PNG;base64,{}", STANDARD.encode(&upload.bytes));
        let parsed = ImageUpload::from_data_url(&url).unwrap();
        assert_eq!(parsed.content_type, "image/png");
        assert_eq!(parsed.bytes, upload.bytes);

        assert!(ImageUpload::from_data_url("https://example.com/a.png").is_err());
    }
}
