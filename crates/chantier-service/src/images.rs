//! Image preconditions: format, file size and resolution, checked before
//! anything is sent upstream.

use std::io::Cursor;
use std::path::Path;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use chantier_core::EncodedImage;
use futures::future::join_all;
use image::{ImageFormat, ImageReader};
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

/// An uploaded file, as received.
#[derive(Debug, Clone)]
pub struct RawImage {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl RawImage {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }

    pub async fn read(path: &Path) -> std::io::Result<Self> {
        let bytes = tokio::fs::read(path).await?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self { name, bytes })
    }
}

/// Limits applied to one estimation request.
#[derive(Debug, Clone)]
pub struct ServiceLimits {
    pub max_image_bytes: usize,
    pub min_width: u32,
    pub min_height: u32,
    pub accepted_formats: Vec<ImageFormat>,
    /// Budget for the whole serialised request body.
    pub max_payload_bytes: usize,
}

impl Default for ServiceLimits {
    fn default() -> Self {
        Self {
            max_image_bytes: 15 * 1024 * 1024,
            min_width: 400,
            min_height: 400,
            accepted_formats: vec![ImageFormat::Jpeg, ImageFormat::Png, ImageFormat::WebP],
            max_payload_bytes: 4_500_000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RejectReason {
    #[error("unsupported format")]
    UnsupportedFormat,

    #[error("file too large: {size} bytes (max {limit})")]
    TooLarge { size: usize, limit: usize },

    #[error("resolution too low: {width}x{height} (min {min_width}x{min_height})")]
    ResolutionTooLow {
        width: u32,
        height: u32,
        min_width: u32,
        min_height: u32,
    },

    #[error("unreadable image: {message}")]
    Unreadable { message: String },
}

/// Why one file was left out of the request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageRejection {
    pub name: String,
    pub reason: RejectReason,
}

/// Result of checking a batch. Both lists keep input order.
#[derive(Debug, Clone, Default)]
pub struct ImageCheck {
    pub accepted: Vec<EncodedImage>,
    pub rejected: Vec<ImageRejection>,
}

/// Check one image: format first, then size, then resolution.
///
/// Accepted images come back base64-encoded with their media type.
pub fn check_image(image: &RawImage, limits: &ServiceLimits) -> Result<EncodedImage, RejectReason> {
    let format = image::guess_format(&image.bytes).map_err(|_| RejectReason::UnsupportedFormat)?;
    if !limits.accepted_formats.contains(&format) {
        return Err(RejectReason::UnsupportedFormat);
    }

    if image.bytes.len() > limits.max_image_bytes {
        return Err(RejectReason::TooLarge {
            size: image.bytes.len(),
            limit: limits.max_image_bytes,
        });
    }

    let (width, height) = ImageReader::with_format(Cursor::new(&image.bytes), format)
        .into_dimensions()
        .map_err(|e| RejectReason::Unreadable {
            message: e.to_string(),
        })?;
    if width < limits.min_width || height < limits.min_height {
        return Err(RejectReason::ResolutionTooLow {
            width,
            height,
            min_width: limits.min_width,
            min_height: limits.min_height,
        });
    }

    Ok(EncodedImage {
        name: image.name.clone(),
        media_type: format.to_mime_type().to_string(),
        data: BASE64.encode(&image.bytes),
    })
}

/// Check a batch of images in parallel on the blocking pool.
pub async fn check_images(images: Vec<RawImage>, limits: &ServiceLimits) -> ImageCheck {
    let tasks = images.into_iter().map(|image| {
        let limits = limits.clone();
        let name = image.name.clone();
        let task = tokio::task::spawn_blocking(move || check_image(&image, &limits));
        async move {
            let verdict = task.await.unwrap_or_else(|e| {
                Err(RejectReason::Unreadable {
                    message: e.to_string(),
                })
            });
            (name, verdict)
        }
    });

    let mut check = ImageCheck::default();
    for (name, verdict) in join_all(tasks).await {
        match verdict {
            Ok(encoded) => check.accepted.push(encoded),
            Err(reason) => {
                warn!(image = %name, reason = %reason, "image rejected");
                check.rejected.push(ImageRejection { name, reason });
            }
        }
    }
    info!(
        accepted = check.accepted.len(),
        rejected = check.rejected.len(),
        "images checked"
    );
    check
}

#[cfg(test)]
pub(crate) mod fixtures {
    use std::io::Cursor;

    use image::{DynamicImage, ImageFormat, RgbImage};

    pub fn encoded(width: u32, height: u32, format: ImageFormat) -> Vec<u8> {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, image::Rgb([200, 180, 150])));
        let mut buf = Cursor::new(Vec::new());
        img.write_to(&mut buf, format).unwrap();
        buf.into_inner()
    }

    pub fn png(width: u32, height: u32) -> Vec<u8> {
        encoded(width, height, ImageFormat::Png)
    }
}
