use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Quality factor applied to lossy (JPEG) targets, in percent.
pub const JPEG_QUALITY: u8 = 90;

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "webp", "bmp", "gif"];

const ALL_FORMATS: &[FormatToken] = &[
    FormatToken::Auto,
    FormatToken::Png,
    FormatToken::Jpg,
    FormatToken::Jpeg,
    FormatToken::Webp,
    FormatToken::Bmp,
    FormatToken::Gif,
];

/// Canonical identifier for a supported raster format.
///
/// `Auto` is only meaningful as an input hint ("detect from content").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FormatToken {
    #[default]
    Auto,
    Png,
    Jpg,
    Jpeg,
    Webp,
    Bmp,
    Gif,
}

impl FormatToken {
    pub fn as_str(self) -> &'static str {
        match self {
            FormatToken::Auto => "auto",
            FormatToken::Png => "png",
            FormatToken::Jpg => "jpg",
            FormatToken::Jpeg => "jpeg",
            FormatToken::Webp => "webp",
            FormatToken::Bmp => "bmp",
            FormatToken::Gif => "gif",
        }
    }

    pub fn is_lossy(self) -> bool {
        matches!(self, FormatToken::Jpg | FormatToken::Jpeg)
    }
}

impl fmt::Display for FormatToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FormatError {
    #[error("unknown format token {0:?}")]
    UnknownFormat(String),
    #[error("{0} cannot be used as an output format")]
    NotATarget(FormatToken),
}

impl FromStr for FormatToken {
    type Err = FormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_ascii_lowercase();
        ALL_FORMATS
            .iter()
            .copied()
            .find(|token| token.as_str() == lowered)
            .ok_or_else(|| FormatError::UnknownFormat(s.to_string()))
    }
}

/// A format token that is valid as a conversion output (anything but `Auto`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TargetFormat(FormatToken);

impl TargetFormat {
    pub const PNG: TargetFormat = TargetFormat(FormatToken::Png);

    pub fn new(token: FormatToken) -> Option<Self> {
        match token {
            FormatToken::Auto => None,
            other => Some(Self(other)),
        }
    }

    pub fn token(self) -> FormatToken {
        self.0
    }

    pub fn mime(self) -> &'static str {
        mime_for(self.0)
    }

    /// Explicit encoder quality, `None` means codec default.
    pub fn quality(self) -> Option<u8> {
        self.0.is_lossy().then_some(JPEG_QUALITY)
    }
}

impl Default for TargetFormat {
    fn default() -> Self {
        Self::PNG
    }
}

impl fmt::Display for TargetFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl TryFrom<FormatToken> for TargetFormat {
    type Error = FormatError;

    fn try_from(token: FormatToken) -> Result<Self, Self::Error> {
        TargetFormat::new(token).ok_or(FormatError::NotATarget(token))
    }
}

impl FromStr for TargetFormat {
    type Err = FormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TargetFormat::try_from(s.parse::<FormatToken>()?)
    }
}

/// All format tokens in display order, `Auto` first.
pub fn list_formats() -> &'static [FormatToken] {
    ALL_FORMATS
}

/// Output formats only (`list_formats` without `Auto`).
pub fn list_targets() -> impl Iterator<Item = TargetFormat> {
    ALL_FORMATS.iter().copied().filter_map(TargetFormat::new)
}

pub fn mime_for(token: FormatToken) -> &'static str {
    match token {
        FormatToken::Jpg | FormatToken::Jpeg => "image/jpeg",
        FormatToken::Webp => "image/webp",
        FormatToken::Bmp => "image/bmp",
        FormatToken::Gif => "image/gif",
        FormatToken::Png | FormatToken::Auto => "image/png",
    }
}

pub fn normalize_token(token: FormatToken) -> FormatToken {
    match token {
        FormatToken::Jpg => FormatToken::Jpeg,
        other => other,
    }
}

/// Case-insensitive extension check against the recognised image extensions.
pub fn is_image_name(filename: &str) -> bool {
    extension_of(filename)
        .map(|ext| IMAGE_EXTENSIONS.iter().any(|known| known.eq_ignore_ascii_case(ext)))
        .unwrap_or(false)
}

/// Guess the format from a file name, falling back to PNG.
pub fn detect_format(filename: &str) -> FormatToken {
    extension_of(filename)
        .and_then(|ext| ext.parse::<FormatToken>().ok())
        .filter(|token| *token != FormatToken::Auto)
        .map(normalize_token)
        .unwrap_or(FormatToken::Png)
}

fn extension_of(filename: &str) -> Option<&str> {
    let base = filename.rsplit(['/', '\\']).next().unwrap_or(filename);
    base.rsplit_once('.').map(|(_, ext)| ext)
}
