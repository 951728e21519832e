//! # Image Kind Module
//!
//! Closed set of input formats the converter accepts, plus the extension and
//! MIME tables the validator checks against.
//!
//! | Kind | Extensions  | Sniffed MIME types            |
//! |------|-------------|-------------------------------|
//! | JPEG | jpg, jpeg   | image/jpeg                    |
//! | PNG  | png         | image/png                     |
//! | GIF  | gif         | image/gif                     |
//! | BMP  | bmp         | image/bmp, image/x-ms-bmp     |
//!
//! Adding a format means extending `ImageKind` and every `match` on it.

use std::fmt;
use std::path::Path;

/// Lowercase extensions accepted by the pre-filter
pub const SUPPORTED_EXTENSIONS: [&str; 5] = ["jpeg", "jpg", "png", "gif", "bmp"];

/// MIME types accepted by the content sniff
pub const SUPPORTED_MIME_TYPES: [&str; 5] = [
    "image/jpeg",
    "image/png",
    "image/gif",
    "image/bmp",
    "image/x-ms-bmp",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageKind {
    Jpeg,
    Png,
    Gif,
    Bmp,
}

impl ImageKind {
    pub const ALL: [ImageKind; 4] = [Self::Jpeg, Self::Png, Self::Gif, Self::Bmp];

    /// Maps a sniffed MIME type to a kind. `None` for anything outside the allow-list.
    pub fn from_mime(mime: &str) -> Option<Self> {
        if !SUPPORTED_MIME_TYPES.contains(&mime) {
            return None;
        }
        match mime {
            "image/jpeg" => Some(Self::Jpeg),
            "image/png" => Some(Self::Png),
            "image/gif" => Some(Self::Gif),
            "image/bmp" | "image/x-ms-bmp" => Some(Self::Bmp),
            _ => None,
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
            Self::Gif => "image/gif",
            Self::Bmp => "image/bmp",
        }
    }

    /// Whether the format can carry transparency worth preserving
    pub fn supports_transparency(self) -> bool {
        matches!(self, Self::Png | Self::Gif)
    }

    pub(crate) fn image_format(self) -> image::ImageFormat {
        match self {
            Self::Jpeg => image::ImageFormat::Jpeg,
            Self::Png => image::ImageFormat::Png,
            Self::Gif => image::ImageFormat::Gif,
            Self::Bmp => image::ImageFormat::Bmp,
        }
    }
}

impl fmt::Display for ImageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Jpeg => "JPEG",
            Self::Png => "PNG",
            Self::Gif => "GIF",
            Self::Bmp => "BMP",
        };
        f.write_str(name)
    }
}

/// Lowercase text after the last dot of the file name.
///
/// A dot-file such as `.jpg` yields `jpg`; a name without a dot yields `""`.
pub fn extension_of(path: &Path) -> String {
    path.file_name()
        .and_then(|name| {
            name.to_string_lossy()
                .rsplit_once('.')
                .map(|(_, ext)| ext.to_lowercase())
        })
        .unwrap_or_default()
}

/// Check a lowercase extension against the allow-list
pub fn is_supported_extension(ext: &str) -> bool {
    SUPPORTED_EXTENSIONS.contains(&ext)
}
