use std::fmt;
use std::sync::Arc;

use super::{Command, CommandKind};
use crate::color::{BasicConverter, ColorConverter, ConversionOptions};
use crate::doc::{Cel, Document, LayerId, Palette, PixelFormat, Sprite};
use crate::error::{Result, SpriteError};

/// Pre-conversion state of every image layer
#[derive(Debug, Clone)]
struct Snapshot {
    format: PixelFormat,
    palette: Option<Palette>,
    cels: Vec<(LayerId, Vec<Cel>)>,
}

impl Snapshot {
    fn take(sprite: &Sprite) -> Self {
        let mut cels = Vec::new();
        sprite.visit_layers(|layer, _| {
            if let Some(image) = layer.as_image() {
                cels.push((layer.id(), image.cels().cloned().collect()));
            }
        });
        Self {
            format: sprite.pixel_format(),
            palette: sprite.palette().cloned(),
            cels,
        }
    }

    fn restore(&self, sprite: &mut Sprite) -> Result<()> {
        for (id, cels) in &self.cels {
            let image = sprite
                .layer_mut(*id)
                .ok_or(SpriteError::LayerNotFound { id: *id })?
                .as_image_mut()
                .ok_or(SpriteError::LayerNotFound { id: *id })?;
            image.restore_cels(cels.iter().map(|c| (c.frame(), c.clone())).collect());
        }
        sprite.set_pixel_format(self.format);
        sprite.set_palette(self.palette.clone());
        Ok(())
    }

    fn mem_size(&self) -> usize {
        self.cels
            .iter()
            .flat_map(|(_, cels)| cels.iter())
            .map(Cel::mem_size)
            .sum()
    }
}

/// Convert the whole sprite to another pixel format
pub struct SetPixelFormat {
    target: PixelFormat,
    options: ConversionOptions,
    converter: Arc<dyn ColorConverter>,
    before: Option<Snapshot>,
}

impl SetPixelFormat {
    pub fn new(target: PixelFormat, options: ConversionOptions) -> Self {
        Self {
            target,
            options,
            converter: Arc::new(BasicConverter),
            before: None,
        }
    }

    pub fn with_converter(mut self, converter: Arc<dyn ColorConverter>) -> Self {
        self.converter = converter;
        self
    }
}

impl Command for SetPixelFormat {
    fn execute(&mut self, doc: &mut Document) -> Result<()> {
        let snapshot = Snapshot::take(doc.sprite());
        if let Err(err) = self
            .converter
            .convert(doc.sprite_mut(), self.target, &self.options)
        {
            snapshot.restore(doc.sprite_mut())?;
            return Err(err);
        }
        self.before = Some(snapshot);
        doc.sprite_mut().increment_version();
        doc.increment_version();
        Ok(())
    }

    fn undo(&mut self, doc: &mut Document) -> Result<()> {
        let snapshot = self.before.take().ok_or(SpriteError::NothingToUndo)?;
        snapshot.restore(doc.sprite_mut())?;
        doc.sprite_mut().increment_version();
        doc.increment_version();
        Ok(())
    }

    fn label(&self) -> &str {
        "Set Pixel Format"
    }

    fn kind(&self) -> CommandKind {
        CommandKind::SetPixelFormat
    }

    fn mem_size(&self) -> usize {
        std::mem::size_of::<Self>() + self.before.as_ref().map_or(0, Snapshot::mem_size)
    }
}

impl fmt::Debug for SetPixelFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SetPixelFormat")
            .field("target", &self.target)
            .field("options", &self.options)
            .field("captured", &self.before.is_some())
            .finish_non_exhaustive()
    }
}
