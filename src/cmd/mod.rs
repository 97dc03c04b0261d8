//! Reversible Commands
//!
//! Every mutation of a [`Document`] goes through a [`Command`]. A command
//! captures whatever it needs during `execute` so that `undo` and `redo`
//! can reproduce the structural change using that captured state alone.

mod add_layer;
mod anchor;
mod drop_on_timeline;
mod group;
mod remove_layer;
mod set_pixel_format;
mod set_total_frames;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::doc::Document;
use crate::error::Result;

pub use add_layer::AddLayer;
pub use anchor::{InsertionAnchor, LayerInsertion};
pub use drop_on_timeline::DropOnTimeline;
pub use group::CommandGroup;
pub use remove_layer::RemoveLayer;
pub use set_pixel_format::SetPixelFormat;
pub use set_total_frames::SetTotalFrames;

/// Kinds of commands recorded in the history log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandKind {
    /// Files merged into the timeline.
    DropOnTimeline,

    /// A single layer attached.
    AddLayer,

    /// A single layer detached.
    RemoveLayer,

    /// Sprite converted to another pixel format.
    SetPixelFormat,

    /// Timeline length changed.
    SetTotalFrames,

    /// Several commands committed together.
    Batch,
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandKind::DropOnTimeline => write!(f, "Drop On Timeline"),
            CommandKind::AddLayer => write!(f, "Add Layer"),
            CommandKind::RemoveLayer => write!(f, "Remove Layer"),
            CommandKind::SetPixelFormat => write!(f, "Set Pixel Format"),
            CommandKind::SetTotalFrames => write!(f, "Set Total Frames"),
            CommandKind::Batch => write!(f, "Batch"),
        }
    }
}

/// A reversible unit of work against one document.
///
/// The document is handed in on every call; commands never hold on to it.
/// `undo` must not assume the tree is unchanged since `execute`: it works
/// from layer identities, never from positions.
pub trait Command: fmt::Debug + Send {
    /// Perform the action once, capturing what undo needs.
    fn execute(&mut self, doc: &mut Document) -> Result<()>;

    /// Restore the structure that existed before `execute`.
    fn undo(&mut self, doc: &mut Document) -> Result<()>;

    /// Reapply the action after an undo.
    fn redo(&mut self, doc: &mut Document) -> Result<()> {
        self.execute(doc)
    }

    /// Human-readable description for menus and the history log.
    fn label(&self) -> &str;

    fn kind(&self) -> CommandKind;

    /// Bytes held by the command (captured layers, snapshots).
    fn mem_size(&self) -> usize {
        std::mem::size_of_val(self)
    }
}
