//! Sprite: the layer tree plus timeline length
//!
//! The sprite owns a hidden root group. Every visible layer is a descendant
//! of it. Structural mutators keep the parent back-reference and the owning
//! group's child list in sync and bump the owning group's version.

use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use super::image::PixelFormat;
use super::layer::{ImageLayer, Layer, LayerId, LayerKind};
use super::palette::Palette;
use super::Frame;
use crate::error::{Result, SpriteError};

/// Stable sprite identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SpriteId(Uuid);

impl SpriteId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SpriteId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SpriteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An image/animation: layer tree, canvas size, pixel format and frames
#[derive(Debug)]
pub struct Sprite {
    id: SpriteId,
    width: u32,
    height: u32,
    pixel_format: PixelFormat,
    total_frames: Frame,
    palette: Option<Palette>,
    root: Layer,
    version: u64,
}

impl Sprite {
    /// Create an empty single-frame sprite
    pub fn new(width: u32, height: u32, pixel_format: PixelFormat) -> Self {
        Self {
            id: SpriteId::new(),
            width,
            height,
            pixel_format,
            total_frames: 1,
            palette: None,
            root: Layer::new_group("root"),
            version: 0,
        }
    }

    pub fn with_total_frames(mut self, frames: Frame) -> Self {
        self.total_frames = frames;
        self
    }

    pub fn with_palette(mut self, palette: Palette) -> Self {
        self.palette = Some(palette);
        self
    }

    /// Append a layer on top of the root group (builder form of [`Sprite::add_layer`])
    pub fn with_layer(mut self, layer: Layer) -> Self {
        let root = self.root.id();
        if let Some(group) = self.root.as_group_mut() {
            let mut layer = layer;
            layer.set_parent(Some(root));
            let end = group.layers_count();
            group.insert_at(end, layer);
        }
        self
    }

    pub fn id(&self) -> SpriteId {
        self.id
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixel_format(&self) -> PixelFormat {
        self.pixel_format
    }

    pub(crate) fn set_pixel_format(&mut self, format: PixelFormat) {
        self.pixel_format = format;
    }

    pub fn palette(&self) -> Option<&Palette> {
        self.palette.as_ref()
    }

    pub fn set_palette(&mut self, palette: Option<Palette>) {
        self.palette = palette;
    }

    pub fn total_frames(&self) -> Frame {
        self.total_frames
    }

    pub fn set_total_frames(&mut self, frames: Frame) {
        self.total_frames = frames;
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn increment_version(&mut self) {
        self.version += 1;
    }

    pub fn root(&self) -> &Layer {
        &self.root
    }

    pub fn root_id(&self) -> LayerId {
        self.root.id()
    }

    /// Every layer below the root, depth first, with each group's children
    /// listed before the group itself (bottom to top, as the timeline shows
    /// them). Command layer indices index into this listing.
    pub fn all_layers(&self) -> Vec<LayerId> {
        let mut out = Vec::new();
        if let Some(group) = self.root.as_group() {
            for child in group.children() {
                child.collect_post_order(&mut out);
            }
        }
        out
    }

    pub fn layer_count(&self) -> usize {
        self.all_layers().len()
    }

    /// Bottom-most top-level layer
    pub fn first_layer(&self) -> Option<LayerId> {
        self.root
            .as_group()
            .and_then(|group| group.first_layer())
            .map(Layer::id)
    }

    pub fn layer(&self, id: LayerId) -> Option<&Layer> {
        self.root.find(id)
    }

    pub fn layer_mut(&mut self, id: LayerId) -> Option<&mut Layer> {
        self.root.find_mut(id)
    }

    /// Look up a layer by its position in [`Sprite::all_layers`]
    pub fn layer_at(&self, index: usize) -> Result<&Layer> {
        let layers = self.all_layers();
        let id = *layers
            .get(index)
            .ok_or(SpriteError::LayerIndexOutOfRange {
                index,
                len: layers.len(),
            })?;
        self.layer(id).ok_or(SpriteError::LayerNotFound { id })
    }

    pub fn contains(&self, id: LayerId) -> bool {
        self.layer(id).is_some()
    }

    /// Number of groups between the root and the layer (top-level layers are 0)
    pub fn layer_depth(&self, id: LayerId) -> Option<usize> {
        let mut depth = 0;
        let mut current = self.layer(id)?.parent();
        while let Some(parent) = current {
            if parent == self.root.id() {
                return Some(depth);
            }
            depth += 1;
            current = self.layer(parent)?.parent();
        }
        None
    }

    /// The sibling directly below `id` in its group
    pub fn previous_sibling(&self, id: LayerId) -> Option<LayerId> {
        let parent = self.layer(id)?.parent()?;
        let group = self.layer(parent)?.as_group()?;
        let index = group.position_of(id)?;
        index
            .checked_sub(1)
            .map(|i| group.children()[i].id())
    }

    /// Insert `layer` into `group` directly above `after`, or at the bottom
    /// of the group when `after` is `None`
    pub fn insert_layer_after(
        &mut self,
        group: LayerId,
        layer: Layer,
        after: Option<LayerId>,
    ) -> Result<LayerId> {
        self.insert_with(group, layer, |g| match after {
            Some(after) => g
                .position_of(after)
                .map(|i| i + 1)
                .ok_or(SpriteError::LayerNotFound { id: after }),
            None => Ok(0),
        })
    }

    /// Insert `layer` into `group` directly below `before`
    pub fn insert_layer_before(
        &mut self,
        group: LayerId,
        layer: Layer,
        before: LayerId,
    ) -> Result<LayerId> {
        self.insert_with(group, layer, |g| {
            g.position_of(before)
                .ok_or(SpriteError::LayerNotFound { id: before })
        })
    }

    /// Append `layer` on top of `group`
    pub fn add_layer(&mut self, group: LayerId, layer: Layer) -> Result<LayerId> {
        self.insert_with(group, layer, |g| Ok(g.layers_count()))
    }

    fn insert_with(
        &mut self,
        group_id: LayerId,
        mut layer: Layer,
        position: impl FnOnce(&super::layer::LayerGroup) -> Result<usize>,
    ) -> Result<LayerId> {
        let id = layer.id();
        if self.contains(id) {
            return Err(SpriteError::DuplicateLayer { id });
        }
        let owner = self
            .root
            .find_mut(group_id)
            .ok_or(SpriteError::LayerNotFound { id: group_id })?;
        let group = owner
            .as_group_mut()
            .ok_or(SpriteError::NotAGroup { id: group_id })?;
        let index = position(group)?;
        layer.set_parent(Some(group_id));
        group.insert_at(index, layer);
        owner.increment_version();
        Ok(id)
    }

    /// Detach a layer (and its subtree) by identity, wherever it currently
    /// sits. Ownership moves to the caller.
    pub fn remove_layer(&mut self, id: LayerId) -> Result<Layer> {
        if id == self.root.id() {
            return Err(SpriteError::CannotRemoveRoot);
        }
        let parent_id = self
            .layer(id)
            .ok_or(SpriteError::LayerNotFound { id })?
            .parent()
            .ok_or(SpriteError::LayerNotFound { id })?;
        let owner = self
            .root
            .find_mut(parent_id)
            .ok_or(SpriteError::LayerNotFound { id: parent_id })?;
        let group = owner
            .as_group_mut()
            .ok_or(SpriteError::NotAGroup { id: parent_id })?;
        let index = group
            .position_of(id)
            .ok_or(SpriteError::LayerNotFound { id })?;
        let mut layer = group.remove_at(index);
        layer.set_parent(None);
        owner.increment_version();
        Ok(layer)
    }

    /// Bytes held by all layers
    pub fn mem_size(&self) -> usize {
        self.root.mem_size()
    }

    /// Copy of the whole sprite with new sprite and layer identities
    pub fn duplicate(&self) -> Sprite {
        let root = self.root.duplicate();
        Sprite {
            id: SpriteId::new(),
            width: self.width,
            height: self.height,
            pixel_format: self.pixel_format,
            total_frames: self.total_frames,
            palette: self.palette.clone(),
            root,
            version: 0,
        }
    }

    pub(crate) fn for_each_image_mut(&mut self, mut f: impl FnMut(&mut ImageLayer)) {
        self.root.for_each_image_mut(&mut f);
    }

    /// Visit every layer below the root, parents before children
    pub fn visit_layers<'a>(&'a self, mut f: impl FnMut(&'a Layer, usize)) {
        if let Some(group) = self.root.as_group() {
            for child in group.children() {
                child.visit_pre_order(0, &mut f);
            }
        }
    }

    /// SHA-256 over the visible structure and content: frame count, pixel
    /// format, palette, layer names, kinds, nesting, order and cels. Ids and
    /// version counters do not contribute.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.total_frames.to_le_bytes());
        hasher.update([self.pixel_format as u8]);
        if let Some(palette) = &self.palette {
            for c in palette.entries() {
                hasher.update([c.r, c.g, c.b, c.a]);
            }
        }
        self.visit_layers(|layer, depth| {
            hasher.update((depth as u32).to_le_bytes());
            hasher.update(layer.name().as_bytes());
            match layer.kind() {
                LayerKind::Group(group) => {
                    hasher.update(b"G");
                    hasher.update((group.layers_count() as u32).to_le_bytes());
                }
                LayerKind::Image(image) => {
                    hasher.update(b"I");
                    for cel in image.cels() {
                        let (x, y) = cel.position();
                        hasher.update(cel.frame().to_le_bytes());
                        hasher.update(x.to_le_bytes());
                        hasher.update(y.to_le_bytes());
                        hasher.update([cel.opacity()]);
                        hasher.update(cel.image().width().to_le_bytes());
                        hasher.update(cel.image().height().to_le_bytes());
                        hasher.update(cel.image().data());
                    }
                }
            }
        });
        format!("{:x}", hasher.finalize())
    }
}
