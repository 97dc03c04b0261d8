//! Drop files onto the timeline
//!
//! Loads each identifier through a [`DocumentLoader`], converts the loaded
//! sprite to the destination's pixel format, grows the timeline to fit,
//! and splices copies of the loaded layers in next to a layer picked by
//! index. The command remembers the copies by identity so undo can pull
//! them back out and redo can put them back, whatever else happened to the
//! tree in between.

use std::fmt;
use std::sync::Arc;

use log::{debug, info, warn};

use super::anchor::{InsertionAnchor, LayerInsertion};
use super::set_pixel_format::SetPixelFormat;
use super::{Command, CommandKind};
use crate::color::{BasicConverter, ColorConverter, ConversionOptions};
use crate::doc::{Document, Frame, Layer, LayerId, PixelFormat, Sprite};
use crate::error::{Result, SpriteError};
use crate::file::{DocumentLoader, LoadFailure, LoadFlags, LoadResult};
use crate::tx::Transaction;

/// Merge external documents into the destination's layer tree
pub struct DropOnTimeline {
    label: String,
    paths: Vec<String>,
    frame: Frame,
    layer_index: usize,
    insert: LayerInsertion,
    conversion: ConversionOptions,
    flags: LoadFlags,
    loader: Box<dyn DocumentLoader>,
    converter: Arc<dyn ColorConverter>,

    /// Frame count to restore on the next undo/redo (swapped each time)
    previous_total_frames: Frame,
    /// Top-level copies in insertion order
    dropped: Vec<LayerId>,
    /// The same layers while they are undone
    detached: Vec<Layer>,
    load_errors: Vec<LoadFailure>,
    size: usize,
}

impl DropOnTimeline {
    pub fn new<I, S>(
        paths: I,
        frame: Frame,
        layer_index: usize,
        insert: LayerInsertion,
        loader: Box<dyn DocumentLoader>,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let paths: Vec<String> = paths.into_iter().map(Into::into).collect();
        let size = paths.iter().map(String::len).sum();
        Self {
            label: "Drop on Timeline".to_string(),
            paths,
            frame,
            layer_index,
            insert,
            conversion: ConversionOptions::default(),
            flags: LoadFlags::default(),
            loader,
            converter: Arc::new(BasicConverter),
            previous_total_frames: 0,
            dropped: Vec::new(),
            detached: Vec::new(),
            load_errors: Vec::new(),
            size,
        }
    }

    pub fn with_conversion(mut self, conversion: ConversionOptions) -> Self {
        self.conversion = conversion;
        self
    }

    pub fn with_flags(mut self, flags: LoadFlags) -> Self {
        self.flags = flags;
        self
    }

    pub fn with_converter(mut self, converter: Arc<dyn ColorConverter>) -> Self {
        self.converter = converter;
        self
    }

    pub fn paths(&self) -> &[String] {
        &self.paths
    }

    /// Problems reported by the loader during the last execute
    pub fn load_errors(&self) -> &[LoadFailure] {
        &self.load_errors
    }

    /// Layers this command inserted, bottom-most first
    pub fn dropped_layers(&self) -> &[LayerId] {
        &self.dropped
    }

    fn swap_total_frames(&mut self, sprite: &mut Sprite) {
        let current = sprite.total_frames();
        sprite.set_total_frames(self.previous_total_frames);
        self.previous_total_frames = current;
    }

    /// Detach every dropped layer, newest first. Returns the layer that sat
    /// below the first dropped one.
    fn detach_dropped(&mut self, sprite: &mut Sprite) -> Result<Option<LayerId>> {
        if let Some(missing) = self.dropped.iter().find(|id| !sprite.contains(**id)) {
            return Err(SpriteError::LayerNotFound { id: *missing });
        }
        let mut below = None;
        let mut detached = Vec::with_capacity(self.dropped.len());
        for id in self.dropped.iter().rev() {
            below = sprite.previous_sibling(*id);
            detached.push(sprite.remove_layer(*id)?);
        }
        detached.reverse();
        self.detached = detached;
        Ok(below)
    }

    /// Convert `source` to the destination format through its own
    /// transaction. A failed conversion leaves `source` unchanged.
    fn convert_source(&self, source: &mut Document, target: PixelFormat) -> Result<()> {
        if source.color_mode() == target {
            return Ok(());
        }
        let mut tx = Transaction::new(source, "Convert dropped document");
        tx.execute(Box::new(
            SetPixelFormat::new(target, self.conversion).with_converter(Arc::clone(&self.converter)),
        ))?;
        tx.commit_detached();
        Ok(())
    }

    /// Copy the top-level layers of `source` in at the anchor.
    ///
    /// The anchor is resolved against the destination only for the first
    /// merged document; later documents continue from the last inserted
    /// layer instead of re-resolving. Redo re-attaches every dropped layer
    /// from a single resolve, so execute and redo end up with the same
    /// tree even when the listing index shifts between documents.
    fn merge(
        &mut self,
        doc: &mut Document,
        mut source: Document,
        anchor: &mut Option<InsertionAnchor>,
    ) -> Result<()> {
        let needed = self
            .frame
            .checked_add(source.sprite().total_frames())
            .ok_or(SpriteError::FrameOffsetOverflow {
                offset: self.frame,
                frames: source.sprite().total_frames(),
            })?;
        self.convert_source(&mut source, doc.color_mode())?;
        let source = source.into_sprite();

        let mut current = match *anchor {
            Some(current) => current,
            None => InsertionAnchor::resolve(doc.sprite(), self.layer_index, self.insert)?,
        };

        // All copies are displaced before the first one is attached.
        let top_level = source.root().as_group().map(|g| g.children()).unwrap_or(&[]);
        let mut copies = Vec::with_capacity(top_level.len());
        for layer in top_level {
            let mut copy = layer.duplicate();
            copy.displace_frames(0, self.frame)?;
            copies.push(copy);
        }

        if needed > doc.sprite().total_frames() {
            doc.sprite_mut().set_total_frames(needed);
        }

        // Copying a group carries its subtree, so only top-level layers
        // are copied.
        for copy in copies {
            let name = copy.name().to_string();
            let bytes = copy.mem_size();
            let id = current.attach(doc.sprite_mut(), copy)?;
            debug!("dropped '{}' as {}", name, id);
            self.dropped.push(id);
            self.size += bytes;
        }

        if let Some(group) = doc.sprite_mut().layer_mut(current.group()) {
            group.increment_version();
        }
        *anchor = Some(current);
        Ok(())
    }
}

/// Remove one occurrence of each consumed identifier from `pending`
fn remove_consumed(pending: &mut Vec<String>, requested: &str, result: &LoadResult) {
    let mut consumed: Vec<&str> = result.consumed.iter().map(String::as_str).collect();
    if !consumed.contains(&requested) {
        consumed.insert(0, requested);
    }
    for name in consumed {
        if let Some(pos) = pending.iter().position(|p| p == name) {
            pending.remove(pos);
        }
    }
}

impl Command for DropOnTimeline {
    fn execute(&mut self, doc: &mut Document) -> Result<()> {
        let len = doc.sprite().layer_count();
        if self.layer_index >= len {
            return Err(SpriteError::LayerIndexOutOfRange {
                index: self.layer_index,
                len,
            });
        }

        self.dropped.clear();
        self.detached.clear();
        self.load_errors.clear();
        self.previous_total_frames = doc.sprite().total_frames();
        info!(
            "dropping {} file(s) at frame {}, layer {} ({:?})",
            self.paths.len(),
            self.frame,
            self.layer_index,
            self.insert
        );

        let mut pending = self.paths.clone();
        let mut anchor: Option<InsertionAnchor> = None;
        while let Some(identifier) = pending.first().cloned() {
            let result = self.loader.load(&identifier, self.flags);
            remove_consumed(&mut pending, &identifier, &result);

            if result.is_cancelled() {
                info!("loading '{}' was cancelled", identifier);
                break;
            }

            let LoadResult {
                document, error, ..
            } = result;
            if let Some(error) = error {
                warn!("{}", error);
                self.load_errors.push(LoadFailure {
                    identifier: identifier.clone(),
                    error,
                });
            }
            let Some(source) = document else {
                continue;
            };

            if let Err(err) = self.merge(doc, source, &mut anchor) {
                // Leave the destination as it was before execute.
                self.detach_dropped(doc.sprite_mut())?;
                self.detached.clear();
                self.dropped.clear();
                doc.sprite_mut().set_total_frames(self.previous_total_frames);
                return Err(err);
            }
        }

        doc.sprite_mut().increment_version();
        doc.increment_version();
        info!(
            "dropped {} layer(s), timeline now {} frame(s)",
            self.dropped.len(),
            doc.sprite().total_frames()
        );
        doc.notify_layers_changed(anchor.and_then(|a| a.focus()));
        Ok(())
    }

    fn undo(&mut self, doc: &mut Document) -> Result<()> {
        let below = self.detach_dropped(doc.sprite_mut())?;
        self.swap_total_frames(doc.sprite_mut());

        doc.sprite_mut().increment_version();
        doc.increment_version();
        debug!("undid drop of {} layer(s)", self.detached.len());
        if !self.dropped.is_empty() {
            let focus = below.or_else(|| doc.sprite().first_layer());
            doc.notify_layers_changed(focus);
        }
        Ok(())
    }

    fn redo(&mut self, doc: &mut Document) -> Result<()> {
        let mut anchor = if self.detached.is_empty() {
            None
        } else {
            Some(InsertionAnchor::resolve(
                doc.sprite(),
                self.layer_index,
                self.insert,
            )?)
        };
        self.swap_total_frames(doc.sprite_mut());

        if let Some(anchor) = anchor.as_mut() {
            for layer in std::mem::take(&mut self.detached) {
                anchor.attach(doc.sprite_mut(), layer)?;
            }
            if let Some(group) = doc.sprite_mut().layer_mut(anchor.group()) {
                group.increment_version();
            }
        }

        doc.sprite_mut().increment_version();
        doc.increment_version();
        debug!("redid drop of {} layer(s)", self.dropped.len());
        doc.notify_layers_changed(anchor.and_then(|a| a.focus()));
        Ok(())
    }

    fn label(&self) -> &str {
        &self.label
    }

    fn kind(&self) -> CommandKind {
        CommandKind::DropOnTimeline
    }

    fn mem_size(&self) -> usize {
        std::mem::size_of::<Self>()
            + self.size
            + self.detached.iter().map(Layer::mem_size).sum::<usize>()
    }
}

impl fmt::Debug for DropOnTimeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DropOnTimeline")
            .field("paths", &self.paths)
            .field("frame", &self.frame)
            .field("layer_index", &self.layer_index)
            .field("insert", &self.insert)
            .field("conversion", &self.conversion)
            .field("flags", &self.flags)
            .field("previous_total_frames", &self.previous_total_frames)
            .field("dropped", &self.dropped)
            .field("load_errors", &self.load_errors.len())
            .finish_non_exhaustive()
    }
}
