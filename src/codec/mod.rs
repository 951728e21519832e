//! # Codec Capability Module
//!
//! The pixel-level work (decode JPEG/PNG/GIF/BMP, encode WebP) is delegated to a
//! codec behind the narrow [`ImageCodec`] trait. The pipeline only orchestrates
//! calls and enforces policy, so it can be exercised with a fake codec in tests.
//!
//! - `native`: default implementation (`image` for decode, libwebp via `webp` for encode)
//! - `testing`: counting fake used by the pipeline tests

pub mod native;

#[cfg(test)]
pub(crate) mod testing;

pub use native::NativeCodec;

use crate::format::ImageKind;
use crate::options::ConversionOptions;

/// Errors reported by a codec implementation
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("codec unavailable: {0}")]
    Unavailable(String),

    #[error("decode error: {0}")]
    Decode(String),

    #[error("encode error: {0}")]
    Encode(String),

    #[error("release error: {0}")]
    Release(String),
}

/// Compositing mode of a decoded surface.
///
/// `Blend` is the default: alpha is flattened when encoding.
/// `Preserve` disables blending and keeps the alpha channel in the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AlphaMode {
    #[default]
    Blend,
    Preserve,
}

/// A loaded raster surface owned by exactly one conversion
#[derive(Debug)]
pub struct DecodedImage<S> {
    surface: S,
    kind: ImageKind,
    width: u32,
    height: u32,
    transparent_index: Option<u32>,
    alpha_mode: AlphaMode,
}

impl<S> DecodedImage<S> {
    pub fn new(surface: S, kind: ImageKind, width: u32, height: u32) -> Self {
        Self {
            surface,
            kind,
            width,
            height,
            transparent_index: None,
            alpha_mode: AlphaMode::Blend,
        }
    }

    /// Record the palette index the source declares transparent (GIF)
    pub fn with_transparent_index(mut self, index: Option<u32>) -> Self {
        self.transparent_index = index;
        self
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn kind(&self) -> ImageKind {
        self.kind
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn transparent_index(&self) -> Option<u32> {
        self.transparent_index
    }

    pub fn alpha_mode(&self) -> AlphaMode {
        self.alpha_mode
    }

    /// Whether the source carries transparency worth keeping.
    ///
    /// PNG always does; GIF only when it declares a transparent palette index.
    pub fn has_transparency(&self) -> bool {
        if !self.kind.supports_transparency() {
            return false;
        }
        match self.kind {
            ImageKind::Gif => self.transparent_index.is_some(),
            ImageKind::Png | ImageKind::Jpeg | ImageKind::Bmp => true,
        }
    }

    /// Disable blending and keep alpha through encoding
    pub fn preserve_alpha(&mut self) {
        self.alpha_mode = AlphaMode::Preserve;
    }
}

/// Parameters passed to [`ImageCodec::encode`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodeSettings {
    pub quality: u8,
    pub lossless: bool,
    pub preserve_alpha: bool,
    pub preserve_metadata: bool,
}

impl EncodeSettings {
    pub fn resolve<S>(image: &DecodedImage<S>, options: &ConversionOptions) -> Self {
        Self {
            quality: options.effective_quality(),
            lossless: options.is_lossless(),
            preserve_alpha: image.alpha_mode() == AlphaMode::Preserve,
            preserve_metadata: options.preserve_metadata(),
        }
    }
}

/// External image codec capability
pub trait ImageCodec: Send + Sync {
    type Surface: Send;

    /// Short identifier used in logs
    fn name(&self) -> &str;

    /// Verify the host can actually decode and encode.
    fn probe(&self) -> Result<(), CodecError>;

    fn decode(
        &self,
        bytes: &[u8],
        kind: ImageKind,
    ) -> Result<DecodedImage<Self::Surface>, CodecError>;

    /// Encode into WebP bytes
    fn encode(
        &self,
        image: &DecodedImage<Self::Surface>,
        settings: EncodeSettings,
    ) -> Result<Vec<u8>, CodecError>;

    /// Free the surface. The default just drops it.
    fn release(&self, image: DecodedImage<Self::Surface>) -> Result<(), CodecError> {
        drop(image);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decoded_image_defaults_to_blend() {
        let image = DecodedImage::new((), ImageKind::Png, 3, 4);
        assert_eq!(image.alpha_mode(), AlphaMode::Blend);
        assert_eq!(image.dimensions(), (3, 4));
        assert_eq!(image.transparent_index(), None);
    }

    #[test]
    fn test_encode_settings_follow_options_and_alpha() {
        let mut image = DecodedImage::new((), ImageKind::Png, 1, 1);
        let options = ConversionOptions::create().with_quality(42).unwrap();

        let settings = EncodeSettings::resolve(&image, &options);
        assert_eq!(settings.quality, 42);
        assert!(!settings.lossless);
        assert!(!settings.preserve_alpha);

        image.preserve_alpha();
        let settings = EncodeSettings::resolve(&image, &options.with_lossless(true));
        assert_eq!(settings.quality, 100);
        assert!(settings.lossless);
        assert!(settings.preserve_alpha);
    }

    #[test]
    fn test_transparency_follows_kind_and_declared_index() {
        assert!(DecodedImage::new((), ImageKind::Png, 1, 1).has_transparency());
        assert!(!DecodedImage::new((), ImageKind::Jpeg, 1, 1).has_transparency());
        assert!(!DecodedImage::new((), ImageKind::Bmp, 1, 1)
            .with_transparent_index(Some(0))
            .has_transparency());

        let gif = DecodedImage::new((), ImageKind::Gif, 1, 1);
        assert!(!gif.has_transparency());
        assert!(gif.with_transparent_index(Some(3)).has_transparency());
    }
}
