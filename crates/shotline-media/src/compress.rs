//! Image downsampling and re-encoding before upload to a remote model.
//!
//! This is a best-effort normalization step: it never fails. Sources that
//! cannot be decoded are forwarded unchanged with a guessed format tag.

use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{ColorType, DynamicImage, GenericImageView, ImageFormat};
use metrics::counter;
use tracing::{debug, warn};

use shotline_models::ImageAsset;

/// Default bound on the longest side, in pixels.
pub const DEFAULT_MAX_DIMENSION: u32 = 1024;
/// Default lossy quality factor (0.0 - 1.0).
pub const DEFAULT_QUALITY: f32 = 0.8;

/// MIME type of compressor output.
pub const COMPRESSED_MIME: &str = "image/jpeg";

const COMPRESS_TOTAL: &str = "shotline_compress_total";

/// Re-encodes stills as bounded-size JPEG.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AssetCompressor {
    /// Bound on both width and height, in pixels
    pub max_dimension: u32,
    /// Lossy quality factor (0.0 - 1.0)
    pub quality: f32,
}

impl Default for AssetCompressor {
    fn default() -> Self {
        Self {
            max_dimension: DEFAULT_MAX_DIMENSION,
            quality: DEFAULT_QUALITY,
        }
    }
}

impl AssetCompressor {
    pub fn new(max_dimension: u32, quality: f32) -> Self {
        Self {
            max_dimension: max_dimension.max(1),
            quality: quality.clamp(0.01, 1.0),
        }
    }

    /// Compress an image. Never fails; see module docs.
    pub fn compress(&self, source: &ImageAsset) -> ImageAsset {
        let decoded = match image::load_from_memory(&source.data) {
            Ok(img) => img,
            Err(e) => {
                warn!(
                    bytes = source.len(),
                    "Image decode failed, forwarding original bytes: {}", e
                );
                counter!(COMPRESS_TOTAL, "outcome" => "passthrough").increment(1);
                return passthrough(source);
            }
        };

        match self.encode(&decoded) {
            Ok(asset) => {
                debug!(
                    original_bytes = source.len(),
                    compressed_bytes = asset.len(),
                    "Compressed image"
                );
                counter!(COMPRESS_TOTAL, "outcome" => "compressed").increment(1);
                asset
            }
            Err(e) => {
                warn!("Image re-encode failed, forwarding original bytes: {}", e);
                counter!(COMPRESS_TOTAL, "outcome" => "passthrough").increment(1);
                passthrough(source)
            }
        }
    }

    /// Compress on the blocking pool; image codecs are CPU bound.
    pub async fn compress_async(&self, source: ImageAsset) -> ImageAsset {
        let compressor = *self;
        let fallback = source.clone();
        match tokio::task::spawn_blocking(move || compressor.compress(&source)).await {
            Ok(asset) => asset,
            Err(e) => {
                warn!("Compression task failed, forwarding original bytes: {}", e);
                passthrough(&fallback)
            }
        }
    }

    fn encode(&self, img: &DynamicImage) -> image::ImageResult<ImageAsset> {
        let (width, height) = img.dimensions();
        let (target_w, target_h) = scaled_dimensions(width, height, self.max_dimension);

        let resized = if (target_w, target_h) != (width, height) {
            img.resize_exact(target_w, target_h, FilterType::Triangle)
        } else {
            img.clone()
        };

        // JPEG has no alpha channel.
        let rgb = resized.to_rgb8();
        let mut buf = Vec::new();
        let quality = (self.quality * 100.0).round().clamp(1.0, 100.0) as u8;
        JpegEncoder::new_with_quality(&mut buf, quality).encode(
            rgb.as_raw(),
            rgb.width(),
            rgb.height(),
            ColorType::Rgb8,
        )?;

        Ok(ImageAsset::new(buf, COMPRESSED_MIME))
    }
}

/// Target size for an image bounded by `max_dimension` on both sides.
///
/// A single uniform factor `min(max/width, max/height)` is applied only when
/// the image exceeds the bound, so aspect ratio is preserved up to rounding.
pub fn scaled_dimensions(width: u32, height: u32, max_dimension: u32) -> (u32, u32) {
    if width == 0 || height == 0 || (width <= max_dimension && height <= max_dimension) {
        return (width, height);
    }

    let scale = f64::min(
        max_dimension as f64 / width as f64,
        max_dimension as f64 / height as f64,
    );
    let w = ((width as f64 * scale).round() as u32).clamp(1, max_dimension);
    let h = ((height as f64 * scale).round() as u32).clamp(1, max_dimension);
    (w, h)
}

fn passthrough(source: &ImageAsset) -> ImageAsset {
    let mime_type = guess_mime(&source.data).unwrap_or_else(|| {
        if source.mime_type.starts_with("image/") {
            source.mime_type.clone()
        } else {
            COMPRESSED_MIME.to_string()
        }
    });
    ImageAsset::new(source.data.clone(), mime_type)
}

/// Best-effort MIME type from magic bytes.
pub fn guess_mime(data: &[u8]) -> Option<String> {
    let mime = match image::guess_format(data).ok()? {
        ImageFormat::Png => "image/png",
        ImageFormat::Jpeg => "image/jpeg",
        ImageFormat::WebP => "image/webp",
        ImageFormat::Gif => "image/gif",
        ImageFormat::Bmp => "image/bmp",
        ImageFormat::Tiff => "image/tiff",
        _ => return None,
    };
    Some(mime.to_string())
}
