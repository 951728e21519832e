//! Scoped ownership of a decoded image.
//!
//! The lease is created the moment a decode succeeds and releases the image
//! through [`FileHandler::release`] when it is dropped, so every exit path out
//! of the `Loaded` state frees the surface exactly once.

use crate::codec::{DecodedImage, ImageCodec};
use crate::file_handler::FileHandler;

pub(crate) struct ImageLease<'a, C: ImageCodec> {
    codec: &'a C,
    file_handler: &'a FileHandler,
    // Emptied only by `Drop`; `release` consumes the lease
    image: Option<DecodedImage<C::Surface>>,
}

impl<'a, C: ImageCodec> ImageLease<'a, C> {
    pub(crate) fn acquire(
        codec: &'a C,
        file_handler: &'a FileHandler,
        image: DecodedImage<C::Surface>,
    ) -> Self {
        Self {
            codec,
            file_handler,
            image: Some(image),
        }
    }

    pub(crate) fn image(&self) -> &DecodedImage<C::Surface> {
        match &self.image {
            Some(image) => image,
            None => unreachable!("a live lease always holds its image"),
        }
    }

    pub(crate) fn release(self) {
        drop(self);
    }
}

impl<C: ImageCodec> Drop for ImageLease<'_, C> {
    fn drop(&mut self) {
        self.file_handler.release(self.codec, &mut self.image);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::testing::FakeCodec;
    use crate::format::ImageKind;

    #[test]
    fn test_drop_releases_once() {
        let codec = FakeCodec::new();
        let handler = FileHandler::new();
        {
            let image = codec.decode(b"abc", ImageKind::Jpeg).unwrap();
            let lease = ImageLease::acquire(&codec, &handler, image);
            assert_eq!(lease.image().kind(), ImageKind::Jpeg);
        }
        assert_eq!(codec.counters.releases(), 1);
    }

    #[test]
    fn test_explicit_release_releases_once() {
        let codec = FakeCodec::new();
        let handler = FileHandler::new();
        let image = codec.decode(b"abc", ImageKind::Bmp).unwrap();
        let lease = ImageLease::acquire(&codec, &handler, image);

        lease.release();

        assert_eq!(codec.counters.releases(), 1);
    }
}
