use std::path::Path;

use image::{DynamicImage, GenericImageView, RgbaImage};
use log::debug;

use crate::AsciiError;

/// Decoded pixels of one source reference.
#[derive(Clone, Debug)]
pub struct SourceImage {
    pixels: RgbaImage,
}

impl SourceImage {
    pub fn new(image: DynamicImage) -> Self {
        Self { pixels: image.into_rgba8() }
    }

    pub fn from_rgba(pixels: RgbaImage) -> Self {
        Self { pixels }
    }

    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, AsciiError> {
        let path = path.as_ref();
        let image = image::open(path).map_err(|source| AsciiError::ImageLoad {
            source_ref: path.display().to_string(),
            source,
        })?;
        let (w, h) = image.dimensions();
        debug!("decoded source image {}x{} from {}", w, h, path.display());
        Ok(Self::new(image))
    }

    pub fn decode(key: &str, bytes: &[u8]) -> Result<Self, AsciiError> {
        let image = image::load_from_memory(bytes)
            .map_err(|source| AsciiError::ImageLoad { source_ref: key.to_owned(), source })?;
        let (w, h) = image.dimensions();
        debug!("decoded source image {}x{} from {} bytes ({key})", w, h, bytes.len());
        Ok(Self::new(image))
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn garbage_bytes_fail_to_load() {
        let err = SourceImage::decode("garbage", b"not an image").unwrap_err();
        assert!(matches!(
            err,
            AsciiError::ImageLoad { ref source_ref, .. } if source_ref == "garbage"
        ));
    }

    #[test]
    fn missing_file_fails_to_load() {
        let err = SourceImage::open("/nonexistent/definitely/missing.png").unwrap_err();
        assert!(matches!(err, AsciiError::ImageLoad { .. }));
    }

    #[test]
    fn png_roundtrip_keeps_dimensions() {
        let pixels = RgbaImage::from_pixel(5, 3, image::Rgba([10, 20, 30, 255]));
        let mut bytes = Vec::new();
        DynamicImage::ImageRgba8(pixels)
            .write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageOutputFormat::Png)
            .unwrap();
        let source = SourceImage::decode("mem", &bytes).unwrap();
        assert_eq!((source.width(), source.height()), (5, 3));
    }
}
