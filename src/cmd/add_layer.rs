use super::anchor::{InsertionAnchor, LayerInsertion};
use super::{Command, CommandKind};
use crate::doc::{Document, Layer, LayerId};
use crate::error::{Result, SpriteError};

/// Attach one layer, either at an anchor or on top of the root group.
///
/// The command owns the layer while it is not in the sprite.
#[derive(Debug)]
pub struct AddLayer {
    id: LayerId,
    placement: Option<(usize, LayerInsertion)>,
    pending: Option<Layer>,
}

impl AddLayer {
    /// Add on top of every other top-level layer
    pub fn new(layer: Layer) -> Self {
        Self {
            id: layer.id(),
            placement: None,
            pending: Some(layer),
        }
    }

    /// Add next to the layer at `index` in the flattened listing
    pub fn at(layer: Layer, index: usize, insert: LayerInsertion) -> Self {
        Self {
            placement: Some((index, insert)),
            ..Self::new(layer)
        }
    }

    pub fn layer_id(&self) -> LayerId {
        self.id
    }
}

impl Command for AddLayer {
    fn execute(&mut self, doc: &mut Document) -> Result<()> {
        let anchor = match self.placement {
            Some((index, insert)) => Some(InsertionAnchor::resolve(doc.sprite(), index, insert)?),
            None => None,
        };
        let layer = self
            .pending
            .take()
            .ok_or(SpriteError::DuplicateLayer { id: self.id })?;

        match anchor {
            Some(mut anchor) => anchor.attach(doc.sprite_mut(), layer)?,
            None => {
                let root = doc.sprite().root_id();
                doc.sprite_mut().add_layer(root, layer)?
            }
        };
        log::debug!("added {}", self.id);

        doc.sprite_mut().increment_version();
        doc.increment_version();
        doc.notify_layers_changed(Some(self.id));
        Ok(())
    }

    fn undo(&mut self, doc: &mut Document) -> Result<()> {
        let below = doc.sprite().previous_sibling(self.id);
        self.pending = Some(doc.sprite_mut().remove_layer(self.id)?);

        let focus = below.or_else(|| doc.sprite().first_layer());
        doc.sprite_mut().increment_version();
        doc.increment_version();
        doc.notify_layers_changed(focus);
        Ok(())
    }

    fn label(&self) -> &str {
        "Add Layer"
    }

    fn kind(&self) -> CommandKind {
        CommandKind::AddLayer
    }

    fn mem_size(&self) -> usize {
        std::mem::size_of::<Self>() + self.pending.as_ref().map_or(0, Layer::mem_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::doc::{PixelFormat, Sprite};

    #[test]
    fn test_add_on_top_then_undo() {
        let mut doc = Document::new(Sprite::new(1, 1, PixelFormat::Rgba).with_layer(Layer::new_image("a")));
        let mut cmd = AddLayer::new(Layer::new_image("b"));
        let id = cmd.layer_id();

        cmd.execute(&mut doc).unwrap();
        assert_eq!(doc.sprite().all_layers()[1], id);

        cmd.undo(&mut doc).unwrap();
        assert!(!doc.sprite().contains(id));

        cmd.redo(&mut doc).unwrap();
        assert!(doc.sprite().contains(id));
        assert!(matches!(
            cmd.execute(&mut doc),
            Err(SpriteError::DuplicateLayer { .. })
        ));
    }

    #[test]
    fn test_add_before_index() {
        let mut doc = Document::new(
            Sprite::new(1, 1, PixelFormat::Rgba)
                .with_layer(Layer::new_image("a"))
                .with_layer(Layer::new_image("b")),
        );
        let mut cmd = AddLayer::at(Layer::new_image("x"), 1, LayerInsertion::Before);
        cmd.execute(&mut doc).unwrap();
        assert_eq!(doc.sprite().layer_at(1).unwrap().name(), "x");
    }
}
