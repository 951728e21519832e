//! # Native Codec
//!
//! Default [`ImageCodec`]: decodes with the `image` crate and encodes WebP with
//! libwebp through the `webp` crate.
//!
//! The capability probe encodes a 1x1 pixel once per process and caches the
//! outcome in a `OnceLock`, so constructing many converters stays cheap and
//! concurrent construction is safe.

use std::sync::OnceLock;

use image::{DynamicImage, GenericImageView};
use tracing::{debug, warn};

use super::{CodecError, DecodedImage, EncodeSettings, ImageCodec};
use crate::format::ImageKind;

/// In-process codec backed by `image` + libwebp
#[derive(Debug, Default, Clone, Copy)]
pub struct NativeCodec;

impl NativeCodec {
    pub fn new() -> Self {
        Self
    }

    fn probe_once() -> &'static Result<(), String> {
        static PROBE: OnceLock<Result<(), String>> = OnceLock::new();
        PROBE.get_or_init(|| {
            let pixel = [0u8, 0, 0, 0];
            match webp::Encoder::from_rgba(&pixel, 1, 1).encode_simple(true, 100.0) {
                Ok(memory) if !memory.is_empty() => {
                    debug!("libwebp encoder probe succeeded");
                    Ok(())
                }
                Ok(_) => Err("libwebp produced an empty probe image".to_string()),
                Err(e) => Err(format!("libwebp encoder probe failed: {:?}", e)),
            }
        })
    }
}

impl ImageCodec for NativeCodec {
    type Surface = DynamicImage;

    fn name(&self) -> &str {
        "native"
    }

    fn probe(&self) -> Result<(), CodecError> {
        Self::probe_once()
            .clone()
            .map_err(CodecError::Unavailable)
    }

    fn decode(&self, bytes: &[u8], kind: ImageKind) -> Result<DecodedImage<DynamicImage>, CodecError> {
        let surface = image::load_from_memory_with_format(bytes, kind.image_format())
            .map_err(|e| CodecError::Decode(format!("Failed to load {} image: {}", kind, e)))?;

        let (width, height) = surface.dimensions();
        if width == 0 || height == 0 {
            return Err(CodecError::Decode(format!(
                "{} image has no pixels ({}x{})",
                kind, width, height
            )));
        }

        let transparent_index = match kind {
            ImageKind::Gif => gif_transparent_index(bytes).map(u32::from),
            ImageKind::Jpeg | ImageKind::Png | ImageKind::Bmp => None,
        };

        debug!(
            "Decoded {} {}x{} ({:?}), transparent index: {:?}",
            kind,
            width,
            height,
            surface.color(),
            transparent_index
        );

        Ok(DecodedImage::new(surface, kind, width, height).with_transparent_index(transparent_index))
    }

    fn encode(
        &self,
        image: &DecodedImage<DynamicImage>,
        settings: EncodeSettings,
    ) -> Result<Vec<u8>, CodecError> {
        let (width, height) = image.dimensions();
        let quality = settings.quality as f32;

        if settings.preserve_metadata {
            debug!("Metadata preservation requested; WebP output carries pixel data only");
        }

        let encoded = if settings.preserve_alpha {
            let rgba = image.surface().to_rgba8();
            webp::Encoder::from_rgba(rgba.as_raw(), width, height)
                .encode_simple(settings.lossless, quality)
        } else {
            let rgb = image.surface().to_rgb8();
            webp::Encoder::from_rgb(rgb.as_raw(), width, height)
                .encode_simple(settings.lossless, quality)
        }
        .map_err(|e| CodecError::Encode(format!("libwebp rejected {}x{} image: {:?}", width, height, e)))?;

        if encoded.is_empty() {
            warn!("libwebp returned an empty buffer for {}x{} image", width, height);
        }

        Ok(encoded.to_vec())
    }
}

/// Palette index the first frame of a GIF declares transparent
pub(crate) fn gif_transparent_index(bytes: &[u8]) -> Option<u8> {
    let mut options = gif::DecodeOptions::new();
    options.set_color_output(gif::ColorOutput::Indexed);

    let mut decoder = match options.read_info(bytes) {
        Ok(decoder) => decoder,
        Err(e) => {
            debug!("GIF header unreadable for transparency check: {}", e);
            return None;
        }
    };

    match decoder.read_next_frame() {
        Ok(frame) => frame.and_then(|frame| frame.transparent),
        Err(e) => {
            debug!("GIF frame unreadable for transparency check: {}", e);
            None
        }
    }
}
