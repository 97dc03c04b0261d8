//! Cels: the content of one layer at one frame

use super::image::Image;
use super::Frame;

/// Content of an image layer at a specific frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cel {
    frame: Frame,
    x: i32,
    y: i32,
    opacity: u8,
    image: Image,
}

impl Cel {
    /// Create a fully opaque cel at the canvas origin
    pub fn new(frame: Frame, image: Image) -> Self {
        Self {
            frame,
            x: 0,
            y: 0,
            opacity: 255,
            image,
        }
    }

    /// Set the cel position on the canvas
    pub fn with_position(mut self, x: i32, y: i32) -> Self {
        self.x = x;
        self.y = y;
        self
    }

    /// Set the cel opacity
    pub fn with_opacity(mut self, opacity: u8) -> Self {
        self.opacity = opacity;
        self
    }

    pub fn frame(&self) -> Frame {
        self.frame
    }

    pub(crate) fn set_frame(&mut self, frame: Frame) {
        self.frame = frame;
    }

    pub fn position(&self) -> (i32, i32) {
        (self.x, self.y)
    }

    pub fn opacity(&self) -> u8 {
        self.opacity
    }

    pub fn image(&self) -> &Image {
        &self.image
    }

    pub(crate) fn image_mut(&mut self) -> &mut Image {
        &mut self.image
    }

    pub fn mem_size(&self) -> usize {
        std::mem::size_of::<Self>() + self.image.mem_size()
    }
}
