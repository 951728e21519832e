//! Image fixtures shared by the unit tests.

use std::path::{Path, PathBuf};

use image::{DynamicImage, ImageFormat, Rgb, RgbImage, Rgba, RgbaImage};

fn save(image: DynamicImage, dir: &Path, name: &str, format: ImageFormat) -> PathBuf {
    let path = dir.join(name);
    image.save_with_format(&path, format).unwrap();
    path
}

pub(crate) fn write_solid_jpeg(dir: &Path, name: &str, width: u32, height: u32) -> PathBuf {
    let image = RgbImage::from_pixel(width, height, Rgb([255, 0, 0]));
    save(DynamicImage::ImageRgb8(image), dir, name, ImageFormat::Jpeg)
}

pub(crate) fn write_blue_jpeg(dir: &Path, name: &str, width: u32, height: u32) -> PathBuf {
    let image = RgbImage::from_pixel(width, height, Rgb([0, 0, 255]));
    save(DynamicImage::ImageRgb8(image), dir, name, ImageFormat::Jpeg)
}

/// Opaque green PNG whose top-left quarter is half transparent
pub(crate) fn write_rgba_png(dir: &Path, name: &str, width: u32, height: u32) -> PathBuf {
    let image = RgbaImage::from_fn(width, height, |x, y| {
        if x < width / 2 && y < height / 2 {
            Rgba([0, 200, 0, 128])
        } else {
            Rgba([0, 200, 0, 255])
        }
    });
    save(DynamicImage::ImageRgba8(image), dir, name, ImageFormat::Png)
}

/// GIF with an optional fully transparent top-left pixel
pub(crate) fn write_gif(dir: &Path, name: &str, width: u32, height: u32, transparent: bool) -> PathBuf {
    let mut image = RgbaImage::from_pixel(width, height, Rgba([255, 255, 0, 255]));
    if transparent {
        image.put_pixel(0, 0, Rgba([0, 0, 0, 0]));
    }
    save(DynamicImage::ImageRgba8(image), dir, name, ImageFormat::Gif)
}

pub(crate) fn write_bmp(dir: &Path, name: &str, width: u32, height: u32) -> PathBuf {
    let image = RgbImage::from_pixel(width, height, Rgb([10, 20, 30]));
    save(DynamicImage::ImageRgb8(image), dir, name, ImageFormat::Bmp)
}

/// Real WebP content stored under an arbitrary name
pub(crate) fn write_webp_disguised(dir: &Path, name: &str) -> PathBuf {
    let image = RgbaImage::from_pixel(4, 4, Rgba([1, 2, 3, 255]));
    save(DynamicImage::ImageRgba8(image), dir, name, ImageFormat::WebP)
}

/// Decode a written WebP file
pub(crate) fn read_webp(path: &Path) -> DynamicImage {
    let bytes = std::fs::read(path).unwrap();
    image::load_from_memory_with_format(&bytes, ImageFormat::WebP).unwrap()
}
