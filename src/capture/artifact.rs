//! In-memory image artifacts.
//!
//! Both capture sources normalize into `ImageArtifact`:
//! - uploads keep the submitted bytes after a successful decode
//! - camera frames are encoded as PNG

use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;

use image::{DynamicImage, ImageFormat};
use serde::{Deserialize, Serialize};

use crate::error::CaptureError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceTag {
    Upload,
    Camera,
}

impl SourceTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceTag::Upload => "upload",
            SourceTag::Camera => "camera",
        }
    }
}

/// Decoded image bytes plus the source they came from.
///
/// Bytes are shared, so cloning an artifact into a scan result is cheap.
/// Serializes as metadata only.
#[derive(Debug, Clone, Serialize)]
pub struct ImageArtifact {
    pub source: SourceTag,
    pub mime: &'static str,
    pub width: u32,
    pub height: u32,
    pub byte_len: usize,
    #[serde(skip)]
    format: ImageFormat,
    #[serde(skip)]
    bytes: Arc<[u8]>,
}

impl ImageArtifact {
    /// Decode uploaded file contents. `path` is only used for error reporting.
    pub fn from_upload(path: &Path, bytes: Vec<u8>) -> Result<Self, CaptureError> {
        let read_error = |reason: String| CaptureError::Read {
            path: path.to_path_buf(),
            reason,
        };

        if bytes.is_empty() {
            return Err(read_error("file is empty".to_string()));
        }

        let format = image::guess_format(&bytes)
            .map_err(|e| read_error(format!("unrecognized image format: {e}")))?;
        let decoded = image::load_from_memory_with_format(&bytes, format)
            .map_err(|e| read_error(e.to_string()))?;

        Ok(ImageArtifact {
            source: SourceTag::Upload,
            mime: format.to_mime_type(),
            width: decoded.width(),
            height: decoded.height(),
            byte_len: bytes.len(),
            format,
            bytes: Arc::from(bytes),
        })
    }

    /// Snapshot a camera frame as PNG.
    pub fn from_frame(frame: &DynamicImage) -> Result<Self, CaptureError> {
        let mut buf = Vec::new();
        frame
            .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
            .map_err(|e| CaptureError::Read {
                path: "camera frame".into(),
                reason: e.to_string(),
            })?;

        Ok(ImageArtifact {
            source: SourceTag::Camera,
            mime: ImageFormat::Png.to_mime_type(),
            width: frame.width(),
            height: frame.height(),
            byte_len: buf.len(),
            format: ImageFormat::Png,
            bytes: Arc::from(buf),
        })
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn format(&self) -> ImageFormat {
        self.format
    }

    /// Decode the stored bytes again, e.g. for an analyzer that needs pixels.
    pub fn decode(&self) -> Result<DynamicImage, image::ImageError> {
        image::load_from_memory_with_format(&self.bytes, self.format)
    }
}

#[cfg(test)]
pub(crate) fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = DynamicImage::ImageRgb8(image::RgbImage::from_pixel(
        width,
        height,
        image::Rgb([40, 160, 60]),
    ));
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
        .expect("encode png fixture");
    buf
}
