//! Counting fake codec for pipeline tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use super::{CodecError, DecodedImage, EncodeSettings, ImageCodec};
use crate::format::ImageKind;

#[derive(Debug, Default)]
pub(crate) struct Counters {
    pub decodes: AtomicUsize,
    pub encodes: AtomicUsize,
    pub releases: AtomicUsize,
}

impl Counters {
    pub fn decodes(&self) -> usize {
        self.decodes.load(Ordering::SeqCst)
    }

    pub fn encodes(&self) -> usize {
        self.encodes.load(Ordering::SeqCst)
    }

    pub fn releases(&self) -> usize {
        self.releases.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FakeSurface {
    pub kind: ImageKind,
    pub len: usize,
}

#[derive(Debug, Default, Clone)]
pub(crate) struct FakeCodec {
    pub counters: Arc<Counters>,
    pub unavailable: bool,
    pub fail_decode: bool,
    pub panic_decode: bool,
    pub fail_encode: bool,
    pub empty_output: bool,
    pub fail_release: bool,
    pub transparent_index: Option<u32>,
    pub last_settings: Arc<std::sync::Mutex<Option<EncodeSettings>>>,
}

impl FakeCodec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_settings(&self) -> Option<EncodeSettings> {
        *self.last_settings.lock().unwrap()
    }
}

impl ImageCodec for FakeCodec {
    type Surface = FakeSurface;

    fn name(&self) -> &str {
        "fake"
    }

    fn probe(&self) -> Result<(), CodecError> {
        if self.unavailable {
            Err(CodecError::Unavailable("fake codec disabled".to_string()))
        } else {
            Ok(())
        }
    }

    fn decode(&self, bytes: &[u8], kind: ImageKind) -> Result<DecodedImage<FakeSurface>, CodecError> {
        self.counters.decodes.fetch_add(1, Ordering::SeqCst);
        if self.panic_decode {
            panic!("fake decode panic");
        }
        if self.fail_decode {
            return Err(CodecError::Decode("fake decode failure".to_string()));
        }
        let surface = FakeSurface {
            kind,
            len: bytes.len(),
        };
        Ok(DecodedImage::new(surface, kind, 2, 2).with_transparent_index(self.transparent_index))
    }

    fn encode(
        &self,
        _image: &DecodedImage<FakeSurface>,
        settings: EncodeSettings,
    ) -> Result<Vec<u8>, CodecError> {
        self.counters.encodes.fetch_add(1, Ordering::SeqCst);
        *self.last_settings.lock().unwrap() = Some(settings);
        if self.fail_encode {
            return Err(CodecError::Encode("fake encode failure".to_string()));
        }
        if self.empty_output {
            return Ok(Vec::new());
        }
        Ok(b"RIFF\x04\x00\x00\x00WEBP".to_vec())
    }

    fn release(&self, image: DecodedImage<FakeSurface>) -> Result<(), CodecError> {
        self.counters.releases.fetch_add(1, Ordering::SeqCst);
        drop(image);
        if self.fail_release {
            Err(CodecError::Release("fake release failure".to_string()))
        } else {
            Ok(())
        }
    }
}
