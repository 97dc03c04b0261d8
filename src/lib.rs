//! spritecmd - Reversible Sprite Editing
//!
//! Every change to a sprite document goes through a command that can be
//! undone and redone exactly. The centrepiece is [`cmd::DropOnTimeline`],
//! which loads external documents and splices their layers into an
//! existing timeline.
//!
//! # Architecture
//!
//! - [`doc`]: documents, sprites, the layer tree, cels and images
//! - [`cmd`]: the command contract and the commands built on it
//! - [`tx`] / [`history`]: transactions and the undo/redo stacks
//! - [`file`] / [`color`]: loader and colour-conversion collaborators
//! - [`observer`]: change notifications

pub mod cli;
pub mod cmd;
pub mod color;
pub mod config;
pub mod doc;
pub mod error;
pub mod file;
pub mod history;
pub mod observer;
pub mod tx;

pub use cmd::{Command, CommandGroup, DropOnTimeline, LayerInsertion};
pub use config::EngineConfig;
pub use doc::{Document, Layer, LayerId, PixelFormat, Sprite};
pub use error::{Result, SpriteError};
pub use history::UndoHistory;
pub use tx::Transaction;
