//! # Image Validation Module
//!
//! Classifies an arbitrary input file and rejects anything that is not a safe,
//! supported image before a decode is attempted.
//!
//! ## Checks (in order, first failure wins):
//! 1. **Existence**: the path must exist (`NotFound`)
//! 2. **Regularity**: it must be a regular file (`InvalidInput`)
//! 3. **Size**: at most `max_file_size` bytes (`TooLarge`)
//! 4. **Extension**: lowercase extension in the allow-list (`UnsupportedFormat`)
//! 5. **Content sniff**: bytes recognised as JPEG/PNG/GIF/BMP with a readable
//!    header (`InvalidInput` when unreadable, `UnsupportedFormat` when another kind)
//!
//! Cheap checks run first; the sniff is last because it reads the file.
//! The sniffed kind is authoritative: a `.jpg` holding PNG data is a PNG.

use std::io::Cursor;
use std::path::{Path, PathBuf};

use image::ImageReader;
use tracing::debug;

use crate::codec::ImageCodec;
use crate::error::{ConvertError, Result};
use crate::format::{self, ImageKind};

/// Default cap on input size: 50 MiB
pub const DEFAULT_MAX_FILE_SIZE: u64 = 50 * 1024 * 1024;

/// Result of inspecting raw bytes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SniffOutcome {
    /// Allowed image with a readable header
    Known {
        kind: ImageKind,
        mime: &'static str,
        width: u32,
        height: u32,
    },
    /// Recognised image type outside the allow-list
    Unknown { mime: String },
    /// Not recognisable or readable as an image
    Unreadable { reason: String },
}

/// An input that passed every check, with the bytes that were sniffed
#[derive(Debug, Clone)]
pub struct ValidatedInput {
    pub path: PathBuf,
    pub kind: ImageKind,
    pub mime: &'static str,
    pub size: u64,
    pub bytes: Vec<u8>,
}

/// Validates image files before conversion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageValidator {
    max_file_size: u64,
}

impl Default for ImageValidator {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_FILE_SIZE)
    }
}

impl ImageValidator {
    pub fn new(max_file_size: u64) -> Self {
        Self { max_file_size }
    }

    pub fn max_file_size(&self) -> u64 {
        self.max_file_size
    }

    /// Fails with `CapabilityUnavailable` when the codec cannot operate on this host
    pub fn ensure_capability_available<C: ImageCodec>(&self, codec: &C) -> Result<()> {
        codec.probe().map_err(|e| ConvertError::CapabilityUnavailable {
            reason: format!("{} codec: {}", codec.name(), e),
        })
    }

    /// Run every check and return the sniffed kind
    pub async fn validate(&self, path: impl AsRef<Path>) -> Result<ImageKind> {
        Ok(self.inspect(path).await?.kind)
    }

    /// Run every check and keep the bytes for decoding
    pub async fn inspect(&self, path: impl AsRef<Path>) -> Result<ValidatedInput> {
        let path = path.as_ref();

        let size = self.check_file(path).await?;
        let extension = self.check_extension(path)?;
        let bytes = read_bytes(path).await?;

        // The file may have grown since the metadata check
        let size = size.max(bytes.len() as u64);
        self.check_size(path, size)?;

        let (kind, mime) = self.check_content(path, &bytes)?;
        if !extension_matches(&extension, kind) {
            debug!(
                "Extension .{} of {} does not match sniffed {}; using sniffed kind",
                extension,
                path.display(),
                kind
            );
        }

        debug!("Validated {} as {} ({} bytes)", path.display(), kind, size);

        Ok(ValidatedInput {
            path: path.to_path_buf(),
            kind,
            mime,
            size,
            bytes,
        })
    }

    /// Kind derived from file content only; the extension is ignored
    pub async fn classify(&self, path: impl AsRef<Path>) -> Result<ImageKind> {
        let path = path.as_ref();
        let size = self.check_file(path).await?;
        self.check_size(path, size)?;
        let bytes = read_bytes(path).await?;
        self.check_content(path, &bytes).map(|(kind, _)| kind)
    }

    /// Sniff raw bytes
    pub fn classify_bytes(bytes: &[u8]) -> SniffOutcome {
        let format = match image::guess_format(bytes) {
            Ok(format) => format,
            Err(e) => {
                return SniffOutcome::Unreadable {
                    reason: e.to_string(),
                }
            }
        };

        let mime = format.to_mime_type();
        let Some(kind) = ImageKind::from_mime(mime) else {
            return SniffOutcome::Unknown {
                mime: mime.to_string(),
            };
        };

        match ImageReader::with_format(Cursor::new(bytes), format).into_dimensions() {
            Ok((width, height)) if width > 0 && height > 0 => SniffOutcome::Known {
                kind,
                mime,
                width,
                height,
            },
            Ok((width, height)) => SniffOutcome::Unreadable {
                reason: format!("image header declares {}x{} pixels", width, height),
            },
            Err(e) => SniffOutcome::Unreadable {
                reason: e.to_string(),
            },
        }
    }

    /// Existence, regularity and size. Returns the size in bytes.
    async fn check_file(&self, path: &Path) -> Result<u64> {
        match tokio::fs::try_exists(path).await {
            Ok(true) => {}
            Ok(false) => {
                return Err(ConvertError::NotFound {
                    path: path.to_path_buf(),
                })
            }
            Err(e) => {
                return Err(ConvertError::invalid_input(
                    path,
                    format!("Unable to access file: {}", e),
                ))
            }
        }

        let metadata = tokio::fs::metadata(path)
            .await
            .map_err(|e| ConvertError::invalid_input(path, format!("Unable to stat file: {}", e)))?;

        if !metadata.is_file() {
            return Err(ConvertError::invalid_input(path, "Path is not a regular file."));
        }

        self.check_size(path, metadata.len())?;
        Ok(metadata.len())
    }

    fn check_size(&self, path: &Path, size: u64) -> Result<()> {
        if size > self.max_file_size {
            return Err(ConvertError::TooLarge {
                path: path.to_path_buf(),
                size,
                limit: self.max_file_size,
            });
        }
        Ok(())
    }

    fn check_extension(&self, path: &Path) -> Result<String> {
        let extension = format::extension_of(path);

        if !format::is_supported_extension(&extension) {
            return Err(ConvertError::UnsupportedFormat { format: extension });
        }
        Ok(extension)
    }

    fn check_content(&self, path: &Path, bytes: &[u8]) -> Result<(ImageKind, &'static str)> {
        match Self::classify_bytes(bytes) {
            SniffOutcome::Known {
                kind,
                mime,
                width,
                height,
            } => {
                debug!("Sniffed {} as {} {}x{}", path.display(), mime, width, height);
                Ok((kind, mime))
            }
            SniffOutcome::Unknown { mime } => Err(ConvertError::UnsupportedFormat { format: mime }),
            SniffOutcome::Unreadable { reason } => Err(ConvertError::invalid_input(
                path,
                format!("The file may be corrupted or not a valid image ({}).", reason),
            )),
        }
    }
}

async fn read_bytes(path: &Path) -> Result<Vec<u8>> {
    tokio::fs::read(path)
        .await
        .map_err(|e| ConvertError::invalid_input(path, format!("Unable to read file: {}", e)))
}

fn extension_matches(extension: &str, kind: ImageKind) -> bool {
    matches!(
        (extension, kind),
        ("jpg" | "jpeg", ImageKind::Jpeg)
            | ("png", ImageKind::Png)
            | ("gif", ImageKind::Gif)
            | ("bmp", ImageKind::Bmp)
    )
}
