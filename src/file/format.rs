//! JSON sprite documents
//!
//! ```json
//! {
//!   "width": 16, "height": 16, "pixel_format": "rgba", "total_frames": 2,
//!   "layers": [
//!     {"kind": "image", "name": "bg", "cels": [{"frame": 0, "data": [...]}]},
//!     {"kind": "group", "name": "fx", "layers": [...]}
//!   ]
//! }
//! ```
//!
//! Layers are listed bottom to top. A cel image defaults to the canvas size.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::doc::{Cel, Document, Frame, Image, Layer, LayerKind, Palette, PixelFormat, Rgba, Sprite};
use crate::error::{Result, SpriteError};

fn default_total_frames() -> Frame {
    1
}

fn default_opacity() -> u8 {
    255
}

/// On-disk form of a sprite.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpriteFile {
    pub width: u32,
    pub height: u32,

    #[serde(default)]
    pub pixel_format: PixelFormat,

    #[serde(default = "default_total_frames")]
    pub total_frames: Frame,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub palette: Option<Vec<Rgba>>,

    #[serde(default)]
    pub layers: Vec<LayerFile>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LayerFile {
    Image {
        name: String,
        #[serde(default)]
        cels: Vec<CelFile>,
    },
    Group {
        name: String,
        #[serde(default)]
        layers: Vec<LayerFile>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CelFile {
    pub frame: Frame,
    #[serde(default)]
    pub x: i32,
    #[serde(default)]
    pub y: i32,
    #[serde(default = "default_opacity")]
    pub opacity: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    pub data: Vec<u8>,
}

impl SpriteFile {
    pub fn from_sprite(sprite: &Sprite) -> Self {
        let layers = sprite
            .root()
            .as_group()
            .map(|g| g.children().iter().map(LayerFile::from_layer).collect())
            .unwrap_or_default();
        Self {
            width: sprite.width(),
            height: sprite.height(),
            pixel_format: sprite.pixel_format(),
            total_frames: sprite.total_frames(),
            palette: sprite.palette().map(|p| p.entries().to_vec()),
            layers,
        }
    }

    /// Build the in-memory sprite, checking every cel's byte count
    pub fn into_sprite(self) -> Result<Sprite> {
        let mut sprite = Sprite::new(self.width, self.height, self.pixel_format)
            .with_total_frames(self.total_frames);
        if let Some(entries) = self.palette {
            sprite = sprite.with_palette(Palette::from_entries(entries));
        }
        for layer in self.layers {
            let layer = layer.into_layer(self.width, self.height, self.pixel_format)?;
            sprite = sprite.with_layer(layer);
        }
        Ok(sprite)
    }
}

impl LayerFile {
    fn from_layer(layer: &Layer) -> Self {
        match layer.kind() {
            LayerKind::Image(image) => LayerFile::Image {
                name: layer.name().to_string(),
                cels: image
                    .cels()
                    .map(|cel| {
                        let (x, y) = cel.position();
                        CelFile {
                            frame: cel.frame(),
                            x,
                            y,
                            opacity: cel.opacity(),
                            width: Some(cel.image().width()),
                            height: Some(cel.image().height()),
                            data: cel.image().data().to_vec(),
                        }
                    })
                    .collect(),
            },
            LayerKind::Group(group) => LayerFile::Group {
                name: layer.name().to_string(),
                layers: group.children().iter().map(LayerFile::from_layer).collect(),
            },
        }
    }

    fn into_layer(self, width: u32, height: u32, format: PixelFormat) -> Result<Layer> {
        match self {
            LayerFile::Image { name, cels } => {
                let mut layer = Layer::new_image(name);
                for cel in cels {
                    let image = Image::from_data(
                        cel.width.unwrap_or(width),
                        cel.height.unwrap_or(height),
                        format,
                        cel.data,
                    )?;
                    layer = layer.with_cel(
                        Cel::new(cel.frame, image)
                            .with_position(cel.x, cel.y)
                            .with_opacity(cel.opacity),
                    );
                }
                Ok(layer)
            }
            LayerFile::Group { name, layers } => {
                let mut group = Layer::new_group(name);
                for child in layers {
                    group = group.with_child(child.into_layer(width, height, format)?);
                }
                Ok(group)
            }
        }
    }
}

/// Read a sprite document. Parse and content problems become
/// [`SpriteError::InvalidDocument`].
pub fn read_sprite(path: &Path) -> Result<Sprite> {
    if !path.exists() {
        return Err(SpriteError::FileNotFound {
            path: path.to_path_buf(),
        });
    }
    let content = fs::read_to_string(path).map_err(|e| SpriteError::FileReadError {
        path: path.to_path_buf(),
        source: e,
    })?;
    let invalid = |reason: String| SpriteError::InvalidDocument {
        path: path.to_path_buf(),
        reason,
    };
    let file: SpriteFile = serde_json::from_str(&content).map_err(|e| invalid(e.to_string()))?;
    file.into_sprite().map_err(|e| invalid(e.to_string()))
}

pub fn read_document(path: &Path) -> Result<Document> {
    Ok(Document::new(read_sprite(path)?).with_filename(path))
}

pub fn write_sprite(sprite: &Sprite, path: &Path) -> Result<()> {
    let content = serde_json::to_string_pretty(&SpriteFile::from_sprite(sprite))?;
    fs::write(path, content).map_err(|e| SpriteError::FileWriteError {
        path: path.to_path_buf(),
        source: e,
    })
}
