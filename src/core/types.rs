//! Core types for generation settings and image payloads.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use serde::{Deserialize, Serialize};
use crate::utils::{StudioError, validate_hex_color};

/// Output aspect ratio requested from the generation service.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AspectRatio {
    #[default]
    #[serde(rename = "1:1")]
    Square,
    #[serde(rename = "3:4")]
    Portrait,
    #[serde(rename = "4:3")]
    Landscape,
    #[serde(rename = "9:16")]
    Story,
    #[serde(rename = "16:9")]
    Widescreen,
}

impl AspectRatio {
    pub const ALL: [AspectRatio; 5] = [
        Self::Square,
        Self::Portrait,
        Self::Landscape,
        Self::Story,
        Self::Widescreen,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Square => "1:1",
            Self::Portrait => "3:4",
            Self::Landscape => "4:3",
            Self::Story => "9:16",
            Self::Widescreen => "16:9",
        }
    }
}

impl fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AspectRatio {
    type Err = StudioError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|ratio| ratio.as_str() == s.trim())
            .ok_or_else(|| StudioError::validation(format!(
                "Invalid aspect ratio: {s}. Expected one of 1:1, 3:4, 4:3, 9:16, 16:9"
            )))
    }
}

/// A validated `#rrggbb` color, always stored lowercase with six digits.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HexColor(String);

impl HexColor {
    pub fn parse(value: &str) -> Result<Self, StudioError> {
        let digits = validate_hex_color(value)?;
        let expanded = if digits.len() == 3 {
            digits.chars().flat_map(|c| [c, c]).collect::<String>()
        } else {
            digits.to_string()
        };
        Ok(Self(format!("#{}", expanded.to_lowercase())))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for HexColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Background the generated studio shot should use.
///
/// Serialized as a bare string: a named option (`"white"`, `"transparent"`, ...)
/// or a hex color (`"#ffeedd"`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum BackgroundOption {
    White,
    Black,
    Gray,
    Green,
    Transparent,
    Custom(HexColor),
}

impl BackgroundOption {
    /// Hint forwarded verbatim to the generation service.
    pub fn as_hint(&self) -> String {
        match self {
            Self::White => "white".to_string(),
            Self::Black => "black".to_string(),
            Self::Gray => "gray".to_string(),
            Self::Green => "green".to_string(),
            Self::Transparent => "transparent".to_string(),
            Self::Custom(color) => color.to_string(),
        }
    }
}

impl fmt::Display for BackgroundOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_hint())
    }
}

impl FromStr for BackgroundOption {
    type Err = StudioError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        match s.to_lowercase().as_str() {
            "white" => Ok(Self::White),
            "black" => Ok(Self::Black),
            "gray" | "grey" => Ok(Self::Gray),
            "green" => Ok(Self::Green),
            "transparent" => Ok(Self::Transparent),
            _ => HexColor::parse(s).map(Self::Custom),
        }
    }
}

impl TryFrom<String> for BackgroundOption {
    type Error = StudioError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<BackgroundOption> for String {
    fn from(value: BackgroundOption) -> Self {
        value.as_hint()
    }
}

/// Generation hints snapshotted for each attempt.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GenerationSettings {
    /// Requested output aspect ratio
    pub aspect_ratio: AspectRatio,
    /// Optional background override
    pub background: Option<BackgroundOption>,
    /// Optional extra instructions appended to the studio prompt
    pub prompt_modifier: Option<String>,
}

/// Raw bytes of an uploaded photograph (or frame) plus its media type.
///
/// The bytes are shared, never mutated.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceImage {
    pub bytes: Arc<Vec<u8>>,
    pub mime_type: String,
    /// Original file name, when the image came from disk
    pub file_name: Option<String>,
}

impl SourceImage {
    pub fn new(bytes: Vec<u8>, mime_type: impl Into<String>) -> Self {
        Self {
            bytes: Arc::new(bytes),
            mime_type: mime_type.into(),
            file_name: None,
        }
    }

    pub fn with_file_name(mut self, name: impl Into<String>) -> Self {
        self.file_name = Some(name.into());
        self
    }
}

/// Output of one successful generation attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedImage {
    pub bytes: Arc<Vec<u8>>,
    pub mime_type: String,
}

impl GeneratedImage {
    pub fn new(bytes: Vec<u8>, mime_type: impl Into<String>) -> Self {
        Self {
            bytes: Arc::new(bytes),
            mime_type: mime_type.into(),
        }
    }
}

/// Process-wide batch configuration.
///
/// Cloning is cheap: the frame bytes are shared by reference with every
/// snapshot taken from it.
#[derive(Debug, Clone, Default)]
pub struct BatchSettings {
    pub generation: GenerationSettings,
    pub frame: Option<SourceImage>,
}
