//! # Conversion Options Module
//!
//! Immutable value describing how the WebP output is encoded.
//!
//! ## Parameters:
//! - `quality`: lossy quality (0-100, default: 80)
//! - `lossless`: lossless mode, forces the effective quality to 100 (default: false)
//! - `preserve_metadata`: request metadata preservation (default: false)
//!
//! Every `with_*` method returns a new value and leaves the receiver untouched.
//! Quality is checked each time a value is built, including deserialisation.
//!
//! ## Example:
//! ```rust
//! use webp_converter::ConversionOptions;
//!
//! let base = ConversionOptions::create();
//! let lossless = base.with_lossless(true);
//! assert_eq!(base.effective_quality(), 80);
//! assert_eq!(lossless.effective_quality(), 100);
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{ConvertError, Result};

pub const DEFAULT_QUALITY: u8 = 80;
pub const MIN_QUALITY: i32 = 0;
pub const MAX_QUALITY: i32 = 100;

/// Encode settings for a single conversion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawOptions")]
pub struct ConversionOptions {
    quality: u8,
    lossless: bool,
    preserve_metadata: bool,
}

/// Unchecked shape used only for deserialisation
#[derive(Deserialize)]
struct RawOptions {
    #[serde(default = "default_quality")]
    quality: i32,
    #[serde(default)]
    lossless: bool,
    #[serde(default)]
    preserve_metadata: bool,
}

fn default_quality() -> i32 {
    DEFAULT_QUALITY as i32
}

impl TryFrom<RawOptions> for ConversionOptions {
    type Error = ConvertError;

    fn try_from(raw: RawOptions) -> Result<Self> {
        Self::build(raw.quality, raw.lossless, raw.preserve_metadata)
    }
}

impl Default for ConversionOptions {
    fn default() -> Self {
        Self {
            quality: DEFAULT_QUALITY,
            lossless: false,
            preserve_metadata: false,
        }
    }
}

impl ConversionOptions {
    /// Default options: quality 80, lossy, no metadata
    pub fn create() -> Self {
        Self::default()
    }

    fn build(quality: i32, lossless: bool, preserve_metadata: bool) -> Result<Self> {
        if !(MIN_QUALITY..=MAX_QUALITY).contains(&quality) {
            return Err(ConvertError::invalid_configuration(format!(
                "Quality must be between {} and {}, got {}",
                MIN_QUALITY, MAX_QUALITY, quality
            )));
        }

        Ok(Self {
            quality: quality as u8,
            lossless,
            preserve_metadata,
        })
    }

    /// Returns a copy with the given quality.
    ///
    /// # Errors
    /// `InvalidConfiguration` when `quality` is outside `0..=100`.
    pub fn with_quality(&self, quality: i32) -> Result<Self> {
        Self::build(quality, self.lossless, self.preserve_metadata)
    }

    pub fn with_lossless(&self, lossless: bool) -> Self {
        Self { lossless, ..*self }
    }

    pub fn with_preserve_metadata(&self, preserve_metadata: bool) -> Self {
        Self {
            preserve_metadata,
            ..*self
        }
    }

    pub fn quality(&self) -> u8 {
        self.quality
    }

    pub fn is_lossless(&self) -> bool {
        self.lossless
    }

    pub fn preserve_metadata(&self) -> bool {
        self.preserve_metadata
    }

    /// Quality handed to the encoder: 100 in lossless mode, `quality` otherwise
    pub fn effective_quality(&self) -> u8 {
        if self.lossless {
            MAX_QUALITY as u8
        } else {
            self.quality
        }
    }
}
