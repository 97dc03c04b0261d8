//! Relative insertion anchor
//!
//! An anchor says "insert next to this layer, inside that group". It is
//! derived from a listing index at the moment it is needed and advanced as
//! layers are attached; it is never stored between calls.

use serde::{Deserialize, Serialize};

use crate::doc::{Layer, LayerId, Sprite};
use crate::error::{Result, SpriteError};

/// Where dropped layers go relative to the referenced layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayerInsertion {
    Before,
    #[default]
    After,
}

/// Resolved insertion point: at most one of `after` / `before` is set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InsertionAnchor {
    after: Option<LayerId>,
    before: Option<LayerId>,
    group: LayerId,
}

impl InsertionAnchor {
    /// Resolve against the sprite's current flattened listing.
    ///
    /// `Before` a group means "inside the group, on top of its children";
    /// an empty group yields an anchor with neither neighbour, which
    /// appends to that group.
    pub fn resolve(sprite: &Sprite, index: usize, insert: LayerInsertion) -> Result<Self> {
        let reference = sprite.layer_at(index)?;
        let parent_of = |layer: &Layer| {
            layer
                .parent()
                .ok_or(SpriteError::LayerNotFound { id: layer.id() })
        };

        let anchor = match insert {
            LayerInsertion::After => Self {
                after: Some(reference.id()),
                before: None,
                group: parent_of(reference)?,
            },
            LayerInsertion::Before => match reference.as_group() {
                Some(group) => Self {
                    after: group.last_layer().map(Layer::id),
                    before: None,
                    group: reference.id(),
                },
                None => Self {
                    after: None,
                    before: Some(reference.id()),
                    group: parent_of(reference)?,
                },
            },
        };
        log::debug!(
            "anchor for index {} ({:?}): after {:?}, before {:?}, group {}",
            index,
            insert,
            anchor.after,
            anchor.before,
            anchor.group
        );
        Ok(anchor)
    }

    pub fn after(&self) -> Option<LayerId> {
        self.after
    }

    pub fn before(&self) -> Option<LayerId> {
        self.before
    }

    pub fn group(&self) -> LayerId {
        self.group
    }

    /// Layer observers should focus on
    pub fn focus(&self) -> Option<LayerId> {
        self.after.or(self.before)
    }

    /// Attach `layer` at the anchor and advance the anchor past it
    pub fn attach(&mut self, sprite: &mut Sprite, layer: Layer) -> Result<LayerId> {
        let id = match (self.after, self.before) {
            (Some(after), _) => sprite.insert_layer_after(self.group, layer, Some(after))?,
            (None, Some(before)) => sprite.insert_layer_before(self.group, layer, before)?,
            (None, None) => sprite.add_layer(self.group, layer)?,
        };
        self.before = None;
        self.after = Some(id);
        Ok(id)
    }
}
