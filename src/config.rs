//! # Configuration Management Module
//!
//! Questo modulo gestisce la configurazione del converter.
//!
//! ## Responsabilità:
//! - Definisce la struct `ConverterConfig` con tutti i parametri di conversione
//! - Fornisce validazione dei parametri di input
//! - Supporta caricamento/salvataggio configurazione da/verso file JSON
//! - Fornisce valori di default sensati per tutti i parametri
//!
//! ## Parametri di configurazione:
//! - `max_file_size`: Dimensione massima input in byte (default: 50 MiB)
//! - `quality`: Qualità WebP (0-100, default: 80)
//! - `lossless`: Encode lossless, forza qualità 100 (default: false)
//! - `preserve_metadata`: Richiede preservazione metadata (default: false)
//! - `workers`: Conversioni concorrenti in modalità batch (default: 4)
//!
//! ## Esempio:
//! ```rust
//! use webp_converter::ConverterConfig;
//!
//! let config = ConverterConfig {
//!     quality: 90,
//!     workers: 8,
//!     ..Default::default()
//! };
//! config.validate()?;
//! # Ok::<(), webp_converter::ConvertError>(())
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{ConvertError, Result};
use crate::options::ConversionOptions;
use crate::validator::DEFAULT_MAX_FILE_SIZE;

/// Configuration for image conversion
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConverterConfig {
    /// Maximum accepted input size in bytes
    pub max_file_size: u64,
    /// WebP quality (0-100)
    pub quality: u8,
    /// Lossless encoding
    pub lossless: bool,
    /// Request metadata preservation
    pub preserve_metadata: bool,
    /// Number of concurrent conversions in batch mode
    pub workers: usize,
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            quality: crate::options::DEFAULT_QUALITY,
            lossless: false,
            preserve_metadata: false,
            workers: 4,
        }
    }
}

impl ConverterConfig {
    /// Validate configuration parameters
    pub fn validate(&self) -> Result<()> {
        if self.quality > 100 {
            return Err(ConvertError::invalid_configuration(format!(
                "Quality must be between 0 and 100, got {}",
                self.quality
            )));
        }

        if self.max_file_size == 0 {
            return Err(ConvertError::invalid_configuration(
                "Maximum file size must be greater than 0",
            ));
        }

        if self.workers == 0 {
            return Err(ConvertError::invalid_configuration(
                "Number of workers must be greater than 0",
            ));
        }

        Ok(())
    }

    /// Build the validated encode options described by this config
    pub fn conversion_options(&self) -> Result<ConversionOptions> {
        Ok(ConversionOptions::create()
            .with_quality(self.quality as i32)?
            .with_lossless(self.lossless)
            .with_preserve_metadata(self.preserve_metadata))
    }

    /// Load configuration from file
    pub async fn from_file(path: &Path) -> Result<Self> {
        if !tokio::fs::try_exists(path).await.unwrap_or(false) {
            return Ok(Self::default());
        }

        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            ConvertError::invalid_configuration(format!("Cannot read {}: {}", path.display(), e))
        })?;
        let config: ConverterConfig = serde_json::from_str(&content).map_err(|e| {
            ConvertError::invalid_configuration(format!("Cannot parse {}: {}", path.display(), e))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to file
    pub async fn save_to_file(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| ConvertError::invalid_configuration(e.to_string()))?;
        tokio::fs::write(path, content)
            .await
            .map_err(|e| ConvertError::write_failed(path, e.to_string()))?;
        Ok(())
    }
}
