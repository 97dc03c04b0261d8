//! Document: the editable unit wrapping one sprite

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::image::PixelFormat;
use super::layer::LayerId;
use super::sprite::Sprite;
use crate::observer::{DocEvent, DocObserver, ObserverBus, ObserverId};

/// Stable document identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DocumentId(Uuid);

impl DocumentId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for DocumentId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Top-level editable unit: one sprite, a version counter and observers
#[derive(Debug)]
pub struct Document {
    id: DocumentId,
    sprite: Sprite,
    version: u64,
    filename: Option<PathBuf>,
    observers: ObserverBus,
}

impl Document {
    pub fn new(sprite: Sprite) -> Self {
        Self {
            id: DocumentId::new(),
            sprite,
            version: 0,
            filename: None,
            observers: ObserverBus::new(),
        }
    }

    pub fn with_filename(mut self, filename: impl Into<PathBuf>) -> Self {
        self.filename = Some(filename.into());
        self
    }

    pub fn id(&self) -> DocumentId {
        self.id
    }

    pub fn filename(&self) -> Option<&Path> {
        self.filename.as_deref()
    }

    pub fn sprite(&self) -> &Sprite {
        &self.sprite
    }

    pub fn sprite_mut(&mut self) -> &mut Sprite {
        &mut self.sprite
    }

    pub fn into_sprite(self) -> Sprite {
        self.sprite
    }

    pub fn color_mode(&self) -> PixelFormat {
        self.sprite.pixel_format()
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn increment_version(&mut self) {
        self.version += 1;
    }

    pub fn add_observer(&mut self, observer: Box<dyn DocObserver>) -> ObserverId {
        self.observers.add_observer(observer)
    }

    pub fn remove_observer(&mut self, id: ObserverId) -> bool {
        self.observers.remove_observer(id)
    }

    /// Tell observers the layer structure changed, focusing `layer`.
    /// Nothing is sent when there is no layer to focus.
    pub fn notify_layers_changed(&mut self, layer: Option<LayerId>) {
        let Some(layer) = layer else {
            return;
        };
        let ev = DocEvent {
            document: self.id,
            sprite: self.sprite.id(),
            layer,
        };
        self.observers.notify(&ev);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::doc::Layer;
    use crate::observer::RecordingObserver;

    #[test]
    fn test_notify_without_layer_is_silent() {
        let mut doc = Document::new(Sprite::new(1, 1, PixelFormat::Rgba));
        let recorder = RecordingObserver::new();
        let log = recorder.log();
        doc.add_observer(Box::new(recorder));

        doc.notify_layers_changed(None);
        assert!(log.is_empty());

        let layer = Layer::new_image("a").id();
        doc.notify_layers_changed(Some(layer));
        let ev = log.last().unwrap();
        assert_eq!(ev.layer, layer);
        assert_eq!(ev.document, doc.id());
        assert_eq!(ev.sprite, doc.sprite().id());
    }
}
