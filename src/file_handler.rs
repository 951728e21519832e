//! # File Handling Module
//!
//! Questo modulo gestisce tutte le operazioni sui file di output e la discovery
//! delle immagini per la modalità batch.
//!
//! ## Responsabilità:
//! - Creazione della directory di output (tollerante alle race tra processi)
//! - Encode WebP tramite il codec e scrittura su disco
//! - Verifica indipendente che il file di output esista davvero
//! - Rilascio idempotente dell'immagine decodificata
//! - Discovery ricorsiva di immagini supportate in una directory
//! - Formattazione human-readable delle dimensioni
//!
//! ## Esempio:
//! ```rust,ignore
//! let handler = FileHandler::new();
//! handler.ensure_output_directory(Path::new("out/nested/image.webp")).await?;
//! let written = handler.write_encoded(&codec, output, &decoded, &options).await?;
//! handler.release(&codec, &mut Some(decoded));
//! ```

use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::codec::{DecodedImage, EncodeSettings, ImageCodec};
use crate::error::{ConvertError, Result};
use crate::format;
use crate::options::ConversionOptions;

/// Manages output files and decoded image lifetimes
#[derive(Debug, Default, Clone, Copy)]
pub struct FileHandler;

impl FileHandler {
    pub fn new() -> Self {
        Self
    }

    /// Make sure the parent directory of `output_path` exists.
    ///
    /// A bare file name or a `.` parent is a no-op. Missing ancestors are created
    /// with `rwxr-xr-x` permissions. If creation fails but the directory exists
    /// afterwards (another writer won the race) this is still a success.
    pub async fn ensure_output_directory(&self, output_path: &Path) -> Result<()> {
        let Some(directory) = output_path.parent() else {
            return Ok(());
        };
        if directory.as_os_str().is_empty() || directory == Path::new(".") {
            return Ok(());
        }

        if is_dir(directory).await {
            return Ok(());
        }

        let mut builder = tokio::fs::DirBuilder::new();
        builder.recursive(true);
        #[cfg(unix)]
        builder.mode(0o755);

        let Err(e) = builder.create(directory).await else {
            debug!("Created output directory: {}", directory.display());
            return Ok(());
        };

        if is_dir(directory).await {
            warn!(
                "Output directory {} appeared concurrently ({}), continuing",
                directory.display(),
                e
            );
            return Ok(());
        }

        Err(ConvertError::write_failed(
            output_path,
            format!("Failed to create output directory {}: {}", directory.display(), e),
        ))
    }

    /// Encode `image` as WebP and write it to `output_path`, overwriting any
    /// existing file. Returns the number of bytes written.
    pub async fn write_encoded<C: ImageCodec>(
        &self,
        codec: &C,
        output_path: &Path,
        image: &DecodedImage<C::Surface>,
        options: &ConversionOptions,
    ) -> Result<u64> {
        self.ensure_output_directory(output_path).await?;

        let settings = EncodeSettings::resolve(image, options);
        debug!(
            "Encoding {} -> {} (quality: {}, lossless: {}, alpha: {})",
            image.kind(),
            output_path.display(),
            settings.quality,
            settings.lossless,
            settings.preserve_alpha
        );

        let encoded = codec.encode(image, settings).map_err(|e| {
            ConvertError::write_failed(output_path, format!("Failed to write WebP file: {}", e))
        })?;
        if encoded.is_empty() {
            return Err(ConvertError::write_failed(
                output_path,
                "Failed to write WebP file: encoder produced no data",
            ));
        }

        tokio::fs::write(output_path, &encoded)
            .await
            .map_err(|e| ConvertError::write_failed(output_path, e.to_string()))?;

        // The codec's success claim is not trusted on its own
        if !matches!(tokio::fs::try_exists(output_path).await, Ok(true)) {
            return Err(ConvertError::write_failed(
                output_path,
                "Output file was not created",
            ));
        }

        Ok(encoded.len() as u64)
    }

    /// Release a decoded image. Safe to call with `None` or more than once.
    ///
    /// Release failures are logged and never propagated.
    pub fn release<C: ImageCodec>(&self, codec: &C, image: &mut Option<DecodedImage<C::Surface>>) {
        if let Some(image) = image.take() {
            let kind = image.kind();
            match codec.release(image) {
                Ok(()) => debug!("Released decoded {} image", kind),
                Err(e) => warn!("Failed to release decoded {} image: {}", kind, e),
            }
        }
    }

    /// Find all supported images in a directory
    pub fn find_image_files(dir: &Path) -> Vec<PathBuf> {
        WalkDir::new(dir)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .map(|e| e.into_path())
            .filter(|path| Self::is_supported_format(path))
            .collect()
    }

    /// Check the extension against the allow-list (case-insensitive)
    pub fn is_supported_format(path: &Path) -> bool {
        format::is_supported_extension(&format::extension_of(path))
    }

    /// Get human-readable file size
    pub fn format_size(size: u64) -> String {
        const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
        let mut size = size as f64;
        let mut unit_index = 0;

        while size >= 1024.0 && unit_index < UNITS.len() - 1 {
            size /= 1024.0;
            unit_index += 1;
        }

        if unit_index == 0 {
            format!("{} {}", size as u64, UNITS[unit_index])
        } else {
            format!("{:.2} {}", size, UNITS[unit_index])
        }
    }

    /// Calculate percentage reduction
    pub fn calculate_reduction(original_size: u64, new_size: u64) -> f64 {
        if original_size == 0 {
            0.0
        } else {
            ((original_size as f64 - new_size as f64) / original_size as f64) * 100.0
        }
    }
}

async fn is_dir(path: &Path) -> bool {
    tokio::fs::metadata(path)
        .await
        .map(|m| m.is_dir())
        .unwrap_or(false)
}
