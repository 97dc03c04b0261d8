use super::{Command, CommandKind};
use crate::doc::{Document, Layer, LayerId};
use crate::error::{Result, SpriteError};

/// Detach a layer (and its subtree) by identity
#[derive(Debug)]
pub struct RemoveLayer {
    id: LayerId,
    parent: Option<LayerId>,
    below: Option<LayerId>,
    removed: Option<Layer>,
}

impl RemoveLayer {
    pub fn new(id: LayerId) -> Self {
        Self {
            id,
            parent: None,
            below: None,
            removed: None,
        }
    }
}

impl Command for RemoveLayer {
    fn execute(&mut self, doc: &mut Document) -> Result<()> {
        let parent = doc
            .sprite()
            .layer(self.id)
            .and_then(Layer::parent)
            .ok_or(SpriteError::LayerNotFound { id: self.id })?;
        self.parent = Some(parent);
        self.below = doc.sprite().previous_sibling(self.id);
        self.removed = Some(doc.sprite_mut().remove_layer(self.id)?);

        let focus = self.below.or_else(|| doc.sprite().first_layer());
        doc.sprite_mut().increment_version();
        doc.increment_version();
        doc.notify_layers_changed(focus);
        Ok(())
    }

    fn undo(&mut self, doc: &mut Document) -> Result<()> {
        let parent = self.parent.ok_or(SpriteError::LayerNotFound { id: self.id })?;
        let layer = self
            .removed
            .take()
            .ok_or(SpriteError::DuplicateLayer { id: self.id })?;

        // The old neighbour may have moved out of the group since.
        let below = self.below.filter(|id| {
            doc.sprite()
                .layer(*id)
                .is_some_and(|l| l.parent() == Some(parent))
        });
        doc.sprite_mut().insert_layer_after(parent, layer, below)?;

        doc.sprite_mut().increment_version();
        doc.increment_version();
        doc.notify_layers_changed(Some(self.id));
        Ok(())
    }

    fn label(&self) -> &str {
        "Remove Layer"
    }

    fn kind(&self) -> CommandKind {
        CommandKind::RemoveLayer
    }

    fn mem_size(&self) -> usize {
        std::mem::size_of::<Self>() + self.removed.as_ref().map_or(0, Layer::mem_size)
    }
}
