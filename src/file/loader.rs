//! Document loader seam
//!
//! Commands never read files themselves. They ask a [`DocumentLoader`] for
//! one identifier at a time and get back a [`LoadResult`].

use serde::{Deserialize, Serialize};

use crate::doc::Document;
use crate::error::SpriteError;

/// Options forwarded to the loader
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadFlags {
    /// Pick up a palette stored next to the document
    pub embedded_palette: bool,

    /// Give palette-less documents a default palette
    pub create_palette: bool,

    /// Treat numbered files as frames of one animation
    pub detect_sequence: bool,
}

impl Default for LoadFlags {
    fn default() -> Self {
        Self {
            embedded_palette: true,
            create_palette: true,
            detect_sequence: true,
        }
    }
}

/// Outcome of one load request.
///
/// | document | error | meaning                         |
/// |----------|-------|---------------------------------|
/// | some     | none  | loaded                          |
/// | some     | some  | loaded with a warning           |
/// | none     | some  | failed                          |
/// | none     | none  | cancelled                       |
#[derive(Debug)]
pub struct LoadResult {
    pub document: Option<Document>,
    /// Every identifier this request used up, including the requested one
    pub consumed: Vec<String>,
    pub error: Option<SpriteError>,
}

impl LoadResult {
    pub fn loaded(document: Document, consumed: Vec<String>) -> Self {
        Self {
            document: Some(document),
            consumed,
            error: None,
        }
    }

    pub fn failed(identifier: impl Into<String>, error: SpriteError) -> Self {
        Self {
            document: None,
            consumed: vec![identifier.into()],
            error: Some(error),
        }
    }

    pub fn cancelled(identifier: impl Into<String>) -> Self {
        Self {
            document: None,
            consumed: vec![identifier.into()],
            error: None,
        }
    }

    pub fn with_warning(mut self, error: SpriteError) -> Self {
        self.error = Some(error);
        self
    }

    pub fn is_cancelled(&self) -> bool {
        self.document.is_none() && self.error.is_none()
    }
}

/// Turns an identifier (usually a path) into a document
pub trait DocumentLoader: Send {
    /// Blocking load. Never panics on bad input; problems go in
    /// [`LoadResult::error`].
    fn load(&mut self, identifier: &str, flags: LoadFlags) -> LoadResult;
}

/// A load problem recorded by a command
#[derive(Debug)]
pub struct LoadFailure {
    pub identifier: String,
    pub error: SpriteError,
}
