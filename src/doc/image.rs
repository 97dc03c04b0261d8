//! Pixel storage
//!
//! Images own their raw bytes. The byte layout per pixel depends on the
//! [`PixelFormat`]: RGBA uses four bytes, grayscale two (value, alpha) and
//! indexed one palette index.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SpriteError};

/// Colour representation of a sprite and all of its images
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PixelFormat {
    #[default]
    Rgba,
    Grayscale,
    Indexed,
}

impl PixelFormat {
    /// Number of bytes each pixel occupies in this format
    pub const fn bytes_per_pixel(self) -> usize {
        match self {
            PixelFormat::Rgba => 4,
            PixelFormat::Grayscale => 2,
            PixelFormat::Indexed => 1,
        }
    }
}

impl fmt::Display for PixelFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PixelFormat::Rgba => write!(f, "RGBA"),
            PixelFormat::Grayscale => write!(f, "Grayscale"),
            PixelFormat::Indexed => write!(f, "Indexed"),
        }
    }
}

/// A rectangular block of pixels in one pixel format
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Image {
    width: u32,
    height: u32,
    format: PixelFormat,
    data: Vec<u8>,
}

impl Image {
    /// Create a fully transparent (zeroed) image
    pub fn new(width: u32, height: u32, format: PixelFormat) -> Self {
        let len = width as usize * height as usize * format.bytes_per_pixel();
        Self {
            width,
            height,
            format,
            data: vec![0; len],
        }
    }

    /// Wrap existing pixel bytes, checking the length matches the dimensions
    pub fn from_data(width: u32, height: u32, format: PixelFormat, data: Vec<u8>) -> Result<Self> {
        let expected = width as usize * height as usize * format.bytes_per_pixel();
        if data.len() != expected {
            return Err(SpriteError::InvalidImageData {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            format,
            data,
        })
    }

    /// Create an image with every pixel set to the same bytes
    pub fn filled(width: u32, height: u32, format: PixelFormat, pixel: &[u8]) -> Result<Self> {
        if pixel.len() != format.bytes_per_pixel() {
            return Err(SpriteError::InvalidImageData {
                expected: format.bytes_per_pixel(),
                actual: pixel.len(),
            });
        }
        let count = width as usize * height as usize;
        Self::from_data(width, height, format, pixel.repeat(count))
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Iterate over pixels as byte slices of `bytes_per_pixel` length
    pub fn pixels(&self) -> impl Iterator<Item = &[u8]> {
        self.data.chunks_exact(self.format.bytes_per_pixel())
    }

    /// Replace the pixel data and format in one step (used by colour conversion)
    pub(crate) fn replace(&mut self, format: PixelFormat, data: Vec<u8>) -> Result<()> {
        let expected = self.width as usize * self.height as usize * format.bytes_per_pixel();
        if data.len() != expected {
            return Err(SpriteError::InvalidImageData {
                expected,
                actual: data.len(),
            });
        }
        self.format = format;
        self.data = data;
        Ok(())
    }

    /// Memory footprint of the pixel data in bytes
    pub fn mem_size(&self) -> usize {
        self.data.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_image_is_zeroed() {
        let image = Image::new(4, 2, PixelFormat::Rgba);
        assert_eq!(image.data().len(), 32);
        assert!(image.data().iter().all(|b| *b == 0));
        assert_eq!(image.pixels().count(), 8);
    }

    #[test]
    fn test_from_data_checks_length() {
        let err = Image::from_data(2, 2, PixelFormat::Grayscale, vec![0; 7]).unwrap_err();
        assert!(matches!(
            err,
            SpriteError::InvalidImageData {
                expected: 8,
                actual: 7
            }
        ));
    }

    #[test]
    fn test_filled() {
        let image = Image::filled(3, 1, PixelFormat::Indexed, &[5]).unwrap();
        assert_eq!(image.data(), &[5, 5, 5]);
        assert!(Image::filled(3, 1, PixelFormat::Rgba, &[1, 2]).is_err());
    }

    #[test]
    fn test_pixel_format_display() {
        assert_eq!(PixelFormat::Rgba.to_string(), "RGBA");
        assert_eq!(PixelFormat::Indexed.bytes_per_pixel(), 1);
    }
}
