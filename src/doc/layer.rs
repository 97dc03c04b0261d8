//! Layer tree nodes
//!
//! A layer is either an image layer holding cels keyed by frame, or a group
//! owning an ordered list of child layers (bottom to top). Groups own their
//! children outright; each child keeps a non-owning `parent` id used only
//! for lookups and detaching.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

use super::cel::Cel;
use super::Frame;
use crate::error::{Result, SpriteError};

static NEXT_LAYER_ID: AtomicU64 = AtomicU64::new(1);

/// Stable layer identity, independent of the layer's position in the tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LayerId(u64);

impl LayerId {
    /// Allocate a process-unique layer id
    pub fn next() -> Self {
        Self(NEXT_LAYER_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for LayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "layer#{}", self.0)
    }
}

/// Frame-indexed content of an image layer
#[derive(Debug, Clone, Default)]
pub struct ImageLayer {
    cels: BTreeMap<Frame, Cel>,
}

impl ImageLayer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cel(&self, frame: Frame) -> Option<&Cel> {
        self.cels.get(&frame)
    }

    /// Cels in frame order
    pub fn cels(&self) -> impl Iterator<Item = &Cel> {
        self.cels.values()
    }

    pub(crate) fn cels_mut(&mut self) -> impl Iterator<Item = &mut Cel> {
        self.cels.values_mut()
    }

    /// Store a cel at its frame, returning the cel it replaced
    pub fn set_cel(&mut self, cel: Cel) -> Option<Cel> {
        self.cels.insert(cel.frame(), cel)
    }

    pub fn remove_cel(&mut self, frame: Frame) -> Option<Cel> {
        self.cels.remove(&frame)
    }

    pub fn cel_count(&self) -> usize {
        self.cels.len()
    }

    /// Last frame holding a cel, if any
    pub fn last_frame(&self) -> Option<Frame> {
        self.cels.keys().next_back().copied()
    }

    pub(crate) fn take_cels(&mut self) -> BTreeMap<Frame, Cel> {
        std::mem::take(&mut self.cels)
    }

    pub(crate) fn restore_cels(&mut self, cels: BTreeMap<Frame, Cel>) {
        self.cels = cels;
    }

    /// Move every cel at or after `from` forward by `delta` frames. Fails
    /// without moving anything if the last cel would pass `Frame::MAX`.
    pub fn displace_frames(&mut self, from: Frame, delta: Frame) -> Result<()> {
        if delta == 0 {
            return Ok(());
        }
        if let Some(last) = self.last_frame().filter(|last| *last >= from) {
            last.checked_add(delta)
                .ok_or(SpriteError::FrameOffsetOverflow {
                    offset: delta,
                    frames: last.saturating_add(1),
                })?;
        }
        let moved = self.cels.split_off(&from);
        for (frame, mut cel) in moved {
            let target = frame + delta;
            cel.set_frame(target);
            self.cels.insert(target, cel);
        }
        Ok(())
    }

    pub fn mem_size(&self) -> usize {
        self.cels.values().map(Cel::mem_size).sum()
    }
}

/// Ordered children of a group layer, bottom to top
#[derive(Debug, Default)]
pub struct LayerGroup {
    children: Vec<Layer>,
}

impl LayerGroup {
    pub fn children(&self) -> &[Layer] {
        &self.children
    }

    pub fn layers_count(&self) -> usize {
        self.children.len()
    }

    /// Bottom-most child
    pub fn first_layer(&self) -> Option<&Layer> {
        self.children.first()
    }

    /// Top-most child
    pub fn last_layer(&self) -> Option<&Layer> {
        self.children.last()
    }

    pub fn position_of(&self, id: LayerId) -> Option<usize> {
        self.children.iter().position(|child| child.id == id)
    }

    pub(crate) fn insert_at(&mut self, index: usize, layer: Layer) {
        let index = index.min(self.children.len());
        self.children.insert(index, layer);
    }

    pub(crate) fn remove_at(&mut self, index: usize) -> Layer {
        self.children.remove(index)
    }
}

/// Closed set of layer variants
#[derive(Debug)]
pub enum LayerKind {
    Image(ImageLayer),
    Group(LayerGroup),
}

/// A node in the sprite's layer tree
#[derive(Debug)]
pub struct Layer {
    id: LayerId,
    name: String,
    parent: Option<LayerId>,
    version: u64,
    kind: LayerKind,
}

impl Layer {
    /// Create an empty image layer with a fresh id
    pub fn new_image(name: impl Into<String>) -> Self {
        Self::with_kind(name, LayerKind::Image(ImageLayer::new()))
    }

    /// Create an empty group with a fresh id
    pub fn new_group(name: impl Into<String>) -> Self {
        Self::with_kind(name, LayerKind::Group(LayerGroup::default()))
    }

    fn with_kind(name: impl Into<String>, kind: LayerKind) -> Self {
        Self {
            id: LayerId::next(),
            name: name.into(),
            parent: None,
            version: 0,
            kind,
        }
    }

    /// Add a cel (image layers only; groups ignore it)
    pub fn with_cel(mut self, cel: Cel) -> Self {
        if let LayerKind::Image(image) = &mut self.kind {
            image.set_cel(cel);
        }
        self
    }

    /// Append a child on top (groups only; image layers ignore it)
    pub fn with_child(mut self, mut child: Layer) -> Self {
        let id = self.id;
        if let LayerKind::Group(group) = &mut self.kind {
            child.parent = Some(id);
            group.children.push(child);
        }
        self
    }

    pub fn id(&self) -> LayerId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Parent group id; `None` while the layer is detached
    pub fn parent(&self) -> Option<LayerId> {
        self.parent
    }

    pub(crate) fn set_parent(&mut self, parent: Option<LayerId>) {
        self.parent = parent;
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn increment_version(&mut self) {
        self.version += 1;
    }

    pub fn is_group(&self) -> bool {
        matches!(self.kind, LayerKind::Group(_))
    }

    pub fn kind(&self) -> &LayerKind {
        &self.kind
    }

    pub fn as_image(&self) -> Option<&ImageLayer> {
        match &self.kind {
            LayerKind::Image(image) => Some(image),
            LayerKind::Group(_) => None,
        }
    }

    pub fn as_image_mut(&mut self) -> Option<&mut ImageLayer> {
        match &mut self.kind {
            LayerKind::Image(image) => Some(image),
            LayerKind::Group(_) => None,
        }
    }

    pub fn as_group(&self) -> Option<&LayerGroup> {
        match &self.kind {
            LayerKind::Group(group) => Some(group),
            LayerKind::Image(_) => None,
        }
    }

    pub fn as_group_mut(&mut self) -> Option<&mut LayerGroup> {
        match &mut self.kind {
            LayerKind::Group(group) => Some(group),
            LayerKind::Image(_) => None,
        }
    }

    /// Structural copy with new identities for this layer and every
    /// descendant. The copy is detached (no parent).
    pub fn duplicate(&self) -> Layer {
        let id = LayerId::next();
        let kind = match &self.kind {
            LayerKind::Image(image) => LayerKind::Image(image.clone()),
            LayerKind::Group(group) => LayerKind::Group(LayerGroup {
                children: group
                    .children
                    .iter()
                    .map(|child| {
                        let mut copy = child.duplicate();
                        copy.parent = Some(id);
                        copy
                    })
                    .collect(),
            }),
        };
        Layer {
            id,
            name: self.name.clone(),
            parent: None,
            version: 0,
            kind,
        }
    }

    /// Shift all content at or after `from` forward by `delta` frames,
    /// recursing into groups
    pub fn displace_frames(&mut self, from: Frame, delta: Frame) -> Result<()> {
        match &mut self.kind {
            LayerKind::Image(image) => image.displace_frames(from, delta),
            LayerKind::Group(group) => {
                for child in &mut group.children {
                    child.displace_frames(from, delta)?;
                }
                Ok(())
            }
        }
    }

    /// Bytes held by this layer and its descendants
    pub fn mem_size(&self) -> usize {
        let own = std::mem::size_of::<Self>() + self.name.len();
        own + match &self.kind {
            LayerKind::Image(image) => image.mem_size(),
            LayerKind::Group(group) => group.children.iter().map(Layer::mem_size).sum(),
        }
    }

    /// Find this layer or a descendant by id
    pub fn find(&self, id: LayerId) -> Option<&Layer> {
        if self.id == id {
            return Some(self);
        }
        match &self.kind {
            LayerKind::Group(group) => group.children.iter().find_map(|c| c.find(id)),
            LayerKind::Image(_) => None,
        }
    }

    pub fn find_mut(&mut self, id: LayerId) -> Option<&mut Layer> {
        if self.id == id {
            return Some(self);
        }
        match &mut self.kind {
            LayerKind::Group(group) => group.children.iter_mut().find_map(|c| c.find_mut(id)),
            LayerKind::Image(_) => None,
        }
    }

    /// Children first, then the layer itself
    pub(crate) fn collect_post_order(&self, out: &mut Vec<LayerId>) {
        if let LayerKind::Group(group) = &self.kind {
            for child in &group.children {
                child.collect_post_order(out);
            }
        }
        out.push(self.id);
    }

    /// Visit this layer and its descendants, parents before children
    pub(crate) fn visit_pre_order<'a>(&'a self, depth: usize, f: &mut dyn FnMut(&'a Layer, usize)) {
        f(self, depth);
        if let LayerKind::Group(group) = &self.kind {
            for child in &group.children {
                child.visit_pre_order(depth + 1, f);
            }
        }
    }

    pub(crate) fn for_each_image_mut(&mut self, f: &mut dyn FnMut(&mut ImageLayer)) {
        match &mut self.kind {
            LayerKind::Image(image) => f(image),
            LayerKind::Group(group) => {
                for child in &mut group.children {
                    child.for_each_image_mut(f);
                }
            }
        }
    }
}
