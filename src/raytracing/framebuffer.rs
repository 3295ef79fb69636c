use std::path::Path;

use image::{ImageBuffer, Rgb};
use thiserror::Error;

use super::Vec3;

#[derive(Error, Debug)]
pub enum ImageOutputError {
    #[error("cannot encode {path}: {source}")]
    Encode {
        path: String,
        #[source]
        source: image::ImageError,
    },
}

/// An 8-bit RGB pixel buffer, row-major with row 0 at the top.
#[derive(Debug, Clone, PartialEq)]
pub struct Image {
    pub width: u32,
    pub height: u32,
    data: Vec<u8>,
}

/// Quantizes a color channel from `[0, 1]` to `[0, 255]`; out of range values are clamped.
#[inline(always)]
pub fn to_channel(value: f64) -> u8 {
    (value.clamp(0.0, 1.0) * 255.0).round() as u8
}

impl From<Vec3> for Rgb<u8> {
    fn from(value: Vec3) -> Self {
        Rgb([to_channel(value.x), to_channel(value.y), to_channel(value.z)])
    }
}

impl Image {
    pub fn new(width: u32, height: u32) -> Self {
        Image {
            width,
            height,
            data: vec![0; width as usize * height as usize * 3],
        }
    }

    fn index(&self, x: u32, y: u32) -> usize {
        (y as usize * self.width as usize + x as usize) * 3
    }

    pub fn set_color(&mut self, x: u32, y: u32, color: Vec3) {
        let index = self.index(x, y);
        let Rgb(rgb): Rgb<u8> = color.into();
        self.data[index..index + 3].copy_from_slice(&rgb);
    }

    pub fn pixel(&self, x: u32, y: u32) -> [u8; 3] {
        let index = self.index(x, y);
        [self.data[index], self.data[index + 1], self.data[index + 2]]
    }

    /// Encodes the buffer; the format follows the file extension (PNG for `scene.png`).
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ImageOutputError> {
        let path = path.as_ref();
        let buffer: ImageBuffer<Rgb<u8>, Vec<u8>> =
            ImageBuffer::from_fn(self.width, self.height, |x, y| Rgb(self.pixel(x, y)));
        buffer.save(path).map_err(|source| ImageOutputError::Encode {
            path: path.display().to_string(),
            source,
        })
    }
}
