//! Document Model
//!
//! Documents own a sprite; sprites own a tree of layers and a frame count;
//! image layers own cels keyed by frame.

mod cel;
mod document;
mod image;
mod layer;
mod palette;
mod sprite;

pub use cel::Cel;
pub use document::{Document, DocumentId};
pub use image::{Image, PixelFormat};
pub use layer::{ImageLayer, Layer, LayerGroup, LayerId, LayerKind};
pub use palette::{Palette, Rgba};
pub use sprite::{Sprite, SpriteId};

/// Zero-based frame index / frame count
pub type Frame = u32;
