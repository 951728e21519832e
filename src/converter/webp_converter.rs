//! # WebP Converter
//!
//! Façade that runs one conversion through a fixed sequence of states:
//!
//! ```text
//! Start -> Validated -> Loaded -> Written -> Done
//!   \__________\___________\_________\______-> Failed(kind)
//! ```
//!
//! - **Start → Validated**: every validator check passes; nothing is held yet.
//! - **Validated → Loaded**: decode as the sniffed [`ImageKind`], then apply
//!   the transparency policy ([`DecodedImage::has_transparency`]). The decoded image is held in
//!   an [`ImageLease`] from here on.
//! - **Loaded → Written**: encode and write through the [`FileHandler`].
//! - **Written → Done**: explicit release.
//!
//! Any failure after `Loaded` still releases the image (the lease drops) before
//! the error reaches the caller.

use std::fmt;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use super::lease::ImageLease;
use crate::codec::{AlphaMode, DecodedImage, ImageCodec, NativeCodec};
use crate::config::ConverterConfig;
use crate::error::{ConvertError, Result};
use crate::file_handler::FileHandler;
use crate::format::ImageKind;
use crate::options::ConversionOptions;
use crate::validator::{ImageValidator, ValidatedInput};

/// Pipeline position, used for logging failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversionState {
    Start,
    Validated,
    Loaded,
    Written,
    Done,
}

impl fmt::Display for ConversionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Start => "start",
            Self::Validated => "validated",
            Self::Loaded => "loaded",
            Self::Written => "written",
            Self::Done => "done",
        };
        f.write_str(name)
    }
}

/// Summary of a successful conversion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionReport {
    pub input: PathBuf,
    pub output: PathBuf,
    pub kind: ImageKind,
    pub width: u32,
    pub height: u32,
    pub input_size: u64,
    pub output_size: u64,
    pub quality: u8,
    pub lossless: bool,
    pub alpha_preserved: bool,
}

/// Converts JPEG/PNG/GIF/BMP files to WebP
pub struct WebPConverter<C: ImageCodec = NativeCodec> {
    validator: ImageValidator,
    file_handler: FileHandler,
    codec: C,
}

impl WebPConverter<NativeCodec> {
    /// Converter with the native codec and default limits.
    ///
    /// # Errors
    /// `CapabilityUnavailable` when libwebp cannot encode on this host.
    pub fn new() -> Result<Self> {
        Self::with_codec(NativeCodec::new())
    }

    /// Converter with the native codec and the size cap from `config`
    pub fn from_config(config: &ConverterConfig) -> Result<Self> {
        config.validate()?;
        Self::with_components(
            ImageValidator::new(config.max_file_size),
            FileHandler::new(),
            NativeCodec::new(),
        )
    }
}

impl<C: ImageCodec> WebPConverter<C> {
    pub fn with_codec(codec: C) -> Result<Self> {
        Self::with_components(ImageValidator::default(), FileHandler::new(), codec)
    }

    pub fn with_components(
        validator: ImageValidator,
        file_handler: FileHandler,
        codec: C,
    ) -> Result<Self> {
        validator.ensure_capability_available(&codec)?;
        debug!(
            "Converter ready (codec: {}, max input: {})",
            codec.name(),
            FileHandler::format_size(validator.max_file_size())
        );

        Ok(Self {
            validator,
            file_handler,
            codec,
        })
    }

    pub fn validator(&self) -> &ImageValidator {
        &self.validator
    }

    pub fn codec(&self) -> &C {
        &self.codec
    }

    /// Convert `input` into a WebP file at `output`.
    ///
    /// `None` options means [`ConversionOptions::default`] (quality 80).
    pub async fn convert(
        &self,
        input: impl AsRef<Path>,
        output: impl AsRef<Path>,
        options: Option<ConversionOptions>,
    ) -> Result<()> {
        self.convert_with_report(input, output, options)
            .await
            .map(|_| ())
    }

    /// Same as [`convert`](Self::convert) but returns what was done
    pub async fn convert_with_report(
        &self,
        input: impl AsRef<Path>,
        output: impl AsRef<Path>,
        options: Option<ConversionOptions>,
    ) -> Result<ConversionReport> {
        let input = input.as_ref();
        let output = output.as_ref();
        let options = options.unwrap_or_default();
        let mut state = ConversionState::Start;

        let result = self.run(input, output, &options, &mut state).await;

        match &result {
            Ok(report) => info!(
                "Converted {} ({}) -> {} [{}x{}, {} -> {}]",
                input.display(),
                report.kind,
                output.display(),
                report.width,
                report.height,
                FileHandler::format_size(report.input_size),
                FileHandler::format_size(report.output_size)
            ),
            Err(e) => warn!(
                "Conversion of {} failed after state '{}' ({}): {}",
                input.display(),
                state,
                e.kind(),
                e
            ),
        }

        result
    }

    async fn run(
        &self,
        input: &Path,
        output: &Path,
        options: &ConversionOptions,
        state: &mut ConversionState,
    ) -> Result<ConversionReport> {
        let validated = self.validator.inspect(input).await?;
        advance(state, ConversionState::Validated);

        let lease = ImageLease::acquire(&self.codec, &self.file_handler, self.load(&validated)?);
        advance(state, ConversionState::Loaded);

        let image = lease.image();
        let (width, height) = image.dimensions();
        let alpha_preserved = image.alpha_mode() == AlphaMode::Preserve;

        let output_size = self
            .file_handler
            .write_encoded(&self.codec, output, image, options)
            .await?;
        advance(state, ConversionState::Written);

        lease.release();
        advance(state, ConversionState::Done);

        Ok(ConversionReport {
            input: input.to_path_buf(),
            output: output.to_path_buf(),
            kind: validated.kind,
            width,
            height,
            input_size: validated.size,
            output_size,
            quality: options.effective_quality(),
            lossless: options.is_lossless(),
            alpha_preserved,
        })
    }

    /// Decode as the sniffed kind, then keep alpha where the source carries transparency
    fn load(&self, input: &ValidatedInput) -> Result<DecodedImage<C::Surface>> {
        let mut image = self.codec.decode(&input.bytes, input.kind).map_err(|e| {
            ConvertError::conversion_failed(&input.path, format!("Failed to load image: {}", e))
        })?;

        if image.has_transparency() {
            debug!(
                "{} {} carries transparency (index: {:?}), keeping alpha",
                input.kind,
                input.path.display(),
                image.transparent_index()
            );
            image.preserve_alpha();
        }
        Ok(image)
    }
}

fn advance(state: &mut ConversionState, next: ConversionState) {
    debug!("Conversion state: {} -> {}", state, next);
    *state = next;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::testing::FakeCodec;
    use crate::error::ErrorKind;
    use crate::test_support;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn fake_converter(codec: &FakeCodec) -> WebPConverter<FakeCodec> {
        WebPConverter::with_codec(codec.clone()).unwrap()
    }

    #[test]
    fn test_construction_requires_capability() {
        assert!(WebPConverter::new().is_ok());

        let codec = FakeCodec {
            unavailable: true,
            ..FakeCodec::new()
        };
        let err = WebPConverter::with_codec(codec).err().unwrap();
        assert_eq!(err.kind(), ErrorKind::CapabilityUnavailable);
    }

    #[tokio::test]
    async fn test_small_jpeg_creates_nested_output() {
        let temp_dir = TempDir::new().unwrap();
        let input = test_support::write_solid_jpeg(temp_dir.path(), "small.jpg", 10, 10);
        let output = temp_dir.path().join("out").join("deeper").join("small.webp");

        WebPConverter::new()
            .unwrap()
            .convert(&input, &output, None)
            .await
            .unwrap();

        assert!(output.is_file());
        assert!(std::fs::metadata(&output).unwrap().len() > 0);
    }

    #[tokio::test]
    async fn test_solid_red_jpeg_end_to_end() {
        let temp_dir = TempDir::new().unwrap();
        let input = test_support::write_solid_jpeg(temp_dir.path(), "red.jpg", 100, 100);
        let output = temp_dir.path().join("red.webp");

        let report = WebPConverter::new()
            .unwrap()
            .convert_with_report(&input, &output, None)
            .await
            .unwrap();

        assert_eq!(report.kind, ImageKind::Jpeg);
        assert_eq!(report.quality, 80);
        assert!(!report.alpha_preserved);
        assert!(report.output_size > 0);

        let decoded = test_support::read_webp(&output);
        assert_eq!((decoded.width(), decoded.height()), (100, 100));
        let pixel = decoded.to_rgb8().get_pixel(50, 50).0;
        assert!(pixel[0] > 200 && pixel[1] < 60 && pixel[2] < 60);
    }

    #[tokio::test]
    async fn test_missing_input_creates_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let output = temp_dir.path().join("out").join("never.webp");

        let err = WebPConverter::new()
            .unwrap()
            .convert(temp_dir.path().join("missing.jpg"), &output, None)
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert!(!output.exists());
        assert!(!output.parent().unwrap().exists());
    }

    #[tokio::test]
    async fn test_text_as_jpg_never_reaches_decode() {
        let temp_dir = TempDir::new().unwrap();
        let input = temp_dir.path().join("text.jpg");
        std::fs::write(&input, "hello, I am not a picture").unwrap();

        let codec = FakeCodec::new();
        let err = fake_converter(&codec)
            .convert(&input, temp_dir.path().join("text.webp"), None)
            .await
            .unwrap_err();

        assert!(matches!(
            err.kind(),
            ErrorKind::InvalidInput | ErrorKind::UnsupportedFormat
        ));
        assert_eq!(codec.counters.decodes(), 0);
        assert_eq!(codec.counters.releases(), 0);
    }

    #[tokio::test]
    async fn test_second_conversion_overwrites_output() {
        let temp_dir = TempDir::new().unwrap();
        let first = test_support::write_solid_jpeg(temp_dir.path(), "first.jpg", 20, 20);
        let second = test_support::write_blue_jpeg(temp_dir.path(), "second.jpg", 30, 10);
        let output = temp_dir.path().join("same.webp");
        let converter = WebPConverter::new().unwrap();

        converter.convert(&first, &output, None).await.unwrap();
        converter.convert(&second, &output, None).await.unwrap();

        let decoded = test_support::read_webp(&output);
        assert_eq!((decoded.width(), decoded.height()), (30, 10));
        let pixel = decoded.to_rgb8().get_pixel(15, 5).0;
        assert!(pixel[2] > 200 && pixel[0] < 60);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_conversions_share_new_parent() {
        let temp_dir = TempDir::new().unwrap();
        let input = test_support::write_solid_jpeg(temp_dir.path(), "input.jpg", 16, 16);
        let parent = temp_dir.path().join("fresh").join("parent");
        let converter = Arc::new(WebPConverter::new().unwrap());

        let tasks: Vec<_> = (0..8)
            .map(|i| {
                let converter = Arc::clone(&converter);
                let input = input.clone();
                let output = parent.join(format!("out_{i}.webp"));
                tokio::spawn(async move { converter.convert(&input, &output, None).await })
            })
            .collect();

        for result in futures::future::join_all(tasks).await {
            result.unwrap().unwrap();
        }
        for i in 0..8 {
            assert!(parent.join(format!("out_{i}.webp")).is_file());
        }
    }

    #[tokio::test]
    async fn test_png_alpha_survives_roundtrip() {
        let temp_dir = TempDir::new().unwrap();
        let input = test_support::write_rgba_png(temp_dir.path(), "alpha.png", 16, 16);
        let output = temp_dir.path().join("alpha.webp");

        let report = WebPConverter::new()
            .unwrap()
            .convert_with_report(&input, &output, None)
            .await
            .unwrap();
        assert!(report.alpha_preserved);

        let decoded = test_support::read_webp(&output).to_rgba8();
        let translucent = decoded.get_pixel(2, 2)[3];
        assert!(translucent > 0 && translucent < 255);
        assert_eq!(decoded.get_pixel(12, 12)[3], 255);
    }

    #[tokio::test]
    async fn test_gif_and_bmp_convert() {
        let temp_dir = TempDir::new().unwrap();
        let gif = test_support::write_gif(temp_dir.path(), "pic.gif", 12, 8, true);
        let bmp = test_support::write_bmp(temp_dir.path(), "pic.bmp", 7, 9);
        let converter = WebPConverter::new().unwrap();

        let gif_report = converter
            .convert_with_report(&gif, temp_dir.path().join("gif.webp"), None)
            .await
            .unwrap();
        assert_eq!(gif_report.kind, ImageKind::Gif);
        assert!(gif_report.alpha_preserved);

        let bmp_report = converter
            .convert_with_report(&bmp, temp_dir.path().join("bmp.webp"), None)
            .await
            .unwrap();
        assert_eq!(bmp_report.kind, ImageKind::Bmp);
        assert!(!bmp_report.alpha_preserved);
        let decoded = test_support::read_webp(&temp_dir.path().join("bmp.webp"));
        assert_eq!((decoded.width(), decoded.height()), (7, 9));
    }

    #[tokio::test]
    async fn test_opaque_gif_blends_alpha() {
        let temp_dir = TempDir::new().unwrap();
        let gif = test_support::write_gif(temp_dir.path(), "opaque.gif", 10, 6, false);
        let output = temp_dir.path().join("opaque.webp");

        let report = WebPConverter::new()
            .unwrap()
            .convert_with_report(&gif, &output, None)
            .await
            .unwrap();

        assert_eq!(report.kind, ImageKind::Gif);
        assert!(!report.alpha_preserved);
        let decoded = test_support::read_webp(&output);
        assert_eq!((decoded.width(), decoded.height()), (10, 6));
        assert!(!decoded.color().has_alpha());
    }

    #[tokio::test]
    async fn test_transparency_policy_per_kind() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path();
        let output = dir.join("out.webp");

        let cases = [
            (test_support::write_solid_jpeg(dir, "a.jpg", 4, 4), None, false),
            (test_support::write_bmp(dir, "b.bmp", 4, 4), None, false),
            (test_support::write_rgba_png(dir, "c.png", 4, 4), None, true),
            (test_support::write_gif(dir, "d.gif", 4, 4, false), None, false),
            (test_support::write_gif(dir, "e.gif", 4, 4, false), Some(0), true),
        ];

        for (input, transparent_index, expected_alpha) in cases {
            let codec = FakeCodec {
                transparent_index,
                ..FakeCodec::new()
            };
            fake_converter(&codec).convert(&input, &output, None).await.unwrap();
            let settings = codec.last_settings().unwrap();
            assert_eq!(settings.preserve_alpha, expected_alpha, "{}", input.display());
        }
    }

    #[tokio::test]
    async fn test_png_content_with_jpg_extension_decodes_as_png() {
        let temp_dir = TempDir::new().unwrap();
        let png = test_support::write_rgba_png(temp_dir.path(), "real.png", 4, 4);
        let disguised = temp_dir.path().join("disguised.jpg");
        std::fs::rename(&png, &disguised).unwrap();

        let codec = FakeCodec::new();
        let report = fake_converter(&codec)
            .convert_with_report(&disguised, temp_dir.path().join("out.webp"), None)
            .await
            .unwrap();

        assert_eq!(report.kind, ImageKind::Png);
        assert!(codec.last_settings().unwrap().preserve_alpha);
    }

    #[tokio::test]
    async fn test_release_exactly_once_on_success() {
        let temp_dir = TempDir::new().unwrap();
        let input = test_support::write_solid_jpeg(temp_dir.path(), "in.jpg", 4, 4);
        let codec = FakeCodec::new();

        fake_converter(&codec)
            .convert(&input, temp_dir.path().join("out.webp"), None)
            .await
            .unwrap();

        assert_eq!(codec.counters.decodes(), 1);
        assert_eq!(codec.counters.encodes(), 1);
        assert_eq!(codec.counters.releases(), 1);
    }

    #[tokio::test]
    async fn test_release_exactly_once_on_write_failure() {
        let temp_dir = TempDir::new().unwrap();
        let input = test_support::write_solid_jpeg(temp_dir.path(), "in.jpg", 4, 4);

        for codec in [
            FakeCodec {
                fail_encode: true,
                ..FakeCodec::new()
            },
            FakeCodec {
                empty_output: true,
                ..FakeCodec::new()
            },
        ] {
            let err = fake_converter(&codec)
                .convert(&input, temp_dir.path().join("out.webp"), None)
                .await
                .unwrap_err();
            assert_eq!(err.kind(), ErrorKind::WriteFailed);
            assert_eq!(codec.counters.releases(), 1);
        }
    }

    #[tokio::test]
    async fn test_release_on_directory_failure() {
        let temp_dir = TempDir::new().unwrap();
        let input = test_support::write_solid_jpeg(temp_dir.path(), "in.jpg", 4, 4);
        let blocker = temp_dir.path().join("blocker");
        std::fs::write(&blocker, b"not a directory").unwrap();

        let codec = FakeCodec::new();
        let err = fake_converter(&codec)
            .convert(&input, blocker.join("sub").join("out.webp"), None)
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::WriteFailed);
        assert_eq!(codec.counters.encodes(), 0);
        assert_eq!(codec.counters.releases(), 1);
    }

    #[tokio::test]
    async fn test_decode_failure_holds_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let input = test_support::write_solid_jpeg(temp_dir.path(), "in.jpg", 4, 4);
        let codec = FakeCodec {
            fail_decode: true,
            ..FakeCodec::new()
        };

        let err = fake_converter(&codec)
            .convert(&input, temp_dir.path().join("out.webp"), None)
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::ConversionFailed);
        assert_eq!(codec.counters.releases(), 0);
        assert!(!temp_dir.path().join("out.webp").exists());
    }

    #[tokio::test]
    async fn test_release_failure_does_not_mask_error() {
        let temp_dir = TempDir::new().unwrap();
        let input = test_support::write_solid_jpeg(temp_dir.path(), "in.jpg", 4, 4);
        let codec = FakeCodec {
            fail_encode: true,
            fail_release: true,
            ..FakeCodec::new()
        };

        let err = fake_converter(&codec)
            .convert(&input, temp_dir.path().join("out.webp"), None)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::WriteFailed);

        let codec = FakeCodec {
            fail_release: true,
            ..FakeCodec::new()
        };
        fake_converter(&codec)
            .convert(&input, temp_dir.path().join("ok.webp"), None)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_options_reach_encoder() {
        let temp_dir = TempDir::new().unwrap();
        let input = test_support::write_solid_jpeg(temp_dir.path(), "in.jpg", 4, 4);
        let output = temp_dir.path().join("out.webp");
        let codec = FakeCodec::new();
        let converter = fake_converter(&codec);

        converter.convert(&input, &output, None).await.unwrap();
        assert_eq!(codec.last_settings().unwrap().quality, 80);

        let options = ConversionOptions::create().with_quality(35).unwrap();
        converter.convert(&input, &output, Some(options)).await.unwrap();
        assert_eq!(codec.last_settings().unwrap().quality, 35);

        converter
            .convert(&input, &output, Some(options.with_lossless(true)))
            .await
            .unwrap();
        let settings = codec.last_settings().unwrap();
        assert_eq!(settings.quality, 100);
        assert!(settings.lossless);
    }

    #[tokio::test]
    async fn test_lossless_native_roundtrip_is_exact() {
        let temp_dir = TempDir::new().unwrap();
        let input = test_support::write_rgba_png(temp_dir.path(), "exact.png", 8, 8);
        let output = temp_dir.path().join("exact.webp");
        let options = ConversionOptions::create().with_lossless(true);

        WebPConverter::new()
            .unwrap()
            .convert(&input, &output, Some(options))
            .await
            .unwrap();

        let decoded = test_support::read_webp(&output).to_rgba8();
        assert_eq!(decoded.get_pixel(1, 1).0, [0, 200, 0, 128]);
        assert_eq!(decoded.get_pixel(6, 6).0, [0, 200, 0, 255]);
    }

    #[tokio::test]
    async fn test_from_config_applies_size_cap() {
        let temp_dir = TempDir::new().unwrap();
        let input = test_support::write_solid_jpeg(temp_dir.path(), "in.jpg", 64, 64);
        let config = ConverterConfig {
            max_file_size: 16,
            ..Default::default()
        };

        let converter = WebPConverter::from_config(&config).unwrap();
        assert_eq!(converter.validator().max_file_size(), 16);
        let err = converter
            .convert(&input, temp_dir.path().join("out.webp"), None)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TooLarge);

        let invalid = ConverterConfig {
            workers: 0,
            ..Default::default()
        };
        assert!(WebPConverter::from_config(&invalid).is_err());
    }
}
