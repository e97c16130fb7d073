use serde::{Deserialize, Serialize};
use std::str::FromStr;
use crate::utils::StudioError;

/// Upload formats accepted by the studio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    JPEG,
    PNG,
    WebP,
}

impl ImageFormat {
    /// Media type forwarded to the generator
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::JPEG => "image/jpeg",
            Self::PNG => "image/png",
            Self::WebP => "image/webp",
        }
    }

    /// Get file extensions associated with this format
    pub fn extensions(&self) -> &[&str] {
        match self {
            Self::JPEG => &["jpg", "jpeg"],
            Self::PNG => &["png"],
            Self::WebP => &["webp"],
        }
    }

    /// Check if the extension matches this format
    pub fn matches_extension(&self, ext: &str) -> bool {
        let ext = ext.to_lowercase();
        self.extensions().contains(&ext.as_str())
    }

    /// Sniffs the format from the leading bytes.
    pub fn detect(bytes: &[u8]) -> Option<Self> {
        match image::guess_format(bytes).ok()? {
            image::ImageFormat::Jpeg => Some(Self::JPEG),
            image::ImageFormat::Png => Some(Self::PNG),
            image::ImageFormat::WebP => Some(Self::WebP),
            _ => None,
        }
    }
}

impl FromStr for ImageFormat {
    type Err = StudioError;

    fn from_str(ext: &str) -> Result<Self, Self::Err> {
        [Self::JPEG, Self::PNG, Self::WebP]
            .into_iter()
            .find(|format| format.matches_extension(ext))
            .ok_or_else(|| StudioError::upload(format!(
                "Unsupported image format: {}", ext.to_lowercase()
            )))
    }
}

/// Get format from file extension
pub fn format_from_extension(path: &str) -> Result<ImageFormat, StudioError> {
    let ext = std::path::Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .ok_or_else(|| StudioError::upload(
            format!("File has no extension: {}", path)
        ))?;

    ImageFormat::from_str(ext)
}

/// Best-effort media type for a generated image; the service is not required
/// to answer in any particular format.
pub fn mime_for_output(bytes: &[u8]) -> &'static str {
    ImageFormat::detect(bytes)
        .map(|f| f.mime_type())
        .unwrap_or("image/png")
}
