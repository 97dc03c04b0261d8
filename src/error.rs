//! Error handling for spritecmd
//!
//! Every fallible operation in the crate returns [`SpriteError`]. Load
//! errors raised by document loaders are recovered inside commands and
//! surfaced to the caller; structural errors abort the command before it
//! touches the document.

use std::path::PathBuf;

use thiserror::Error;

use crate::doc::{Frame, LayerId, PixelFormat};

/// Result type alias for spritecmd operations
pub type Result<T> = std::result::Result<T, SpriteError>;

/// Main error type for spritecmd operations
#[derive(Error, Debug)]
pub enum SpriteError {
    // Layer tree errors
    #[error("Layer not found: {id}")]
    LayerNotFound { id: LayerId },

    #[error("Layer {id} is not a group")]
    NotAGroup { id: LayerId },

    #[error("Layer {id} is already attached to the sprite")]
    DuplicateLayer { id: LayerId },

    #[error("The root group cannot be detached")]
    CannotRemoveRoot,

    #[error("Layer index {index} out of range (sprite has {len} layers)")]
    LayerIndexOutOfRange { index: usize, len: usize },

    #[error("Frame offset {offset} plus {frames} frames exceeds the frame range")]
    FrameOffsetOverflow { offset: Frame, frames: Frame },

    // Content errors
    #[error("Invalid image data: expected {expected} bytes, got {actual}")]
    InvalidImageData { expected: usize, actual: usize },

    #[error("Cannot convert from {from} to {to}: {reason}")]
    ConversionFailed {
        from: PixelFormat,
        to: PixelFormat,
        reason: String,
    },

    // Loading errors
    #[error("Failed to load '{identifier}': {reason}")]
    LoadFailed { identifier: String, reason: String },

    #[error("Invalid sprite document {path}: {reason}")]
    InvalidDocument { path: PathBuf, reason: String },

    #[error("Invalid palette file {path}: {reason}")]
    InvalidPalette { path: PathBuf, reason: String },

    // File errors
    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("Failed to read file: {path}: {source}")]
    FileReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write file: {path}: {source}")]
    FileWriteError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Directory creation failed: {path}: {source}")]
    DirectoryCreateError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // Configuration errors
    #[error("Invalid configuration: {reason}")]
    InvalidConfig { reason: String },

    // Undo/Redo errors
    #[error("Nothing to undo")]
    NothingToUndo,

    #[error("Nothing to redo")]
    NothingToRedo,

    // Serialization errors
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl SpriteError {
    /// Get the error code for this error type
    pub fn error_code(&self) -> &'static str {
        match self {
            SpriteError::LayerNotFound { .. } => "LAYER_NOT_FOUND",
            SpriteError::NotAGroup { .. } => "NOT_A_GROUP",
            SpriteError::DuplicateLayer { .. } => "DUPLICATE_LAYER",
            SpriteError::CannotRemoveRoot => "CANNOT_REMOVE_ROOT",
            SpriteError::LayerIndexOutOfRange { .. } => "LAYER_INDEX_OUT_OF_RANGE",
            SpriteError::FrameOffsetOverflow { .. } => "FRAME_OFFSET_OVERFLOW",
            SpriteError::InvalidImageData { .. } => "INVALID_IMAGE_DATA",
            SpriteError::ConversionFailed { .. } => "CONVERSION_FAILED",
            SpriteError::LoadFailed { .. } => "LOAD_FAILED",
            SpriteError::InvalidDocument { .. } => "INVALID_DOCUMENT",
            SpriteError::InvalidPalette { .. } => "INVALID_PALETTE",
            SpriteError::FileNotFound { .. } => "FILE_NOT_FOUND",
            SpriteError::FileReadError { .. } => "FILE_READ_ERROR",
            SpriteError::FileWriteError { .. } => "FILE_WRITE_ERROR",
            SpriteError::DirectoryCreateError { .. } => "DIRECTORY_CREATE_ERROR",
            SpriteError::InvalidConfig { .. } => "INVALID_CONFIG",
            SpriteError::NothingToUndo => "NOTHING_TO_UNDO",
            SpriteError::NothingToRedo => "NOTHING_TO_REDO",
            SpriteError::Json(_) => "JSON_ERROR",
            SpriteError::Io(_) => "IO_ERROR",
        }
    }

    /// Returns true for errors a merge can skip over and keep going.
    ///
    /// Per-file load failures are recoverable; anything that indicates the
    /// layer tree is not in the shape a command expects is not.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            SpriteError::LoadFailed { .. }
                | SpriteError::InvalidDocument { .. }
                | SpriteError::InvalidPalette { .. }
                | SpriteError::FileNotFound { .. }
                | SpriteError::FileReadError { .. }
                | SpriteError::NothingToUndo
                | SpriteError::NothingToRedo
        )
    }

    /// Returns a user-friendly recovery suggestion.
    pub fn recovery_suggestion(&self) -> Option<&'static str> {
        match self {
            SpriteError::FileNotFound { .. } => Some("Check the file path and try again."),
            SpriteError::InvalidDocument { .. } => {
                Some("Re-export the sprite; every cel must match its declared size.")
            }
            SpriteError::InvalidPalette { .. } => {
                Some("COL palettes must be 768 bytes (Animator) or carry an Animator Pro header.")
            }
            SpriteError::LayerIndexOutOfRange { .. } => {
                Some("Pick a layer index inside the current timeline.")
            }
            SpriteError::FrameOffsetOverflow { .. } => {
                Some("Drop at an earlier frame; the timeline cannot grow that far.")
            }
            SpriteError::NothingToUndo => Some("There are no actions to undo."),
            SpriteError::NothingToRedo => Some("There are no undone actions to redo."),
            SpriteError::InvalidConfig { .. } => Some("Fix the configuration file and reload."),
            _ => None,
        }
    }
}
