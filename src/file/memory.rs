//! Scripted in-memory loader
//!
//! Answers each identifier with a canned response and records every
//! request, so callers can check which identifiers were (not) attempted.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use super::loader::{DocumentLoader, LoadFlags, LoadResult};
use crate::doc::{Document, Sprite};
use crate::error::SpriteError;

#[derive(Debug)]
enum Response {
    Sprite(Sprite),
    Sequence { others: Vec<String>, sprite: Sprite },
    Warning { sprite: Sprite, reason: String },
    Error(String),
    Cancel,
}

/// Identifiers requested from a [`MemoryLoader`], in order
#[derive(Debug, Clone, Default)]
pub struct RequestLog(Arc<Mutex<Vec<String>>>);

impl RequestLog {
    pub fn snapshot(&self) -> Vec<String> {
        self.0.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.0.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.lock().is_empty()
    }

    pub fn contains(&self, identifier: &str) -> bool {
        self.0.lock().iter().any(|r| r == identifier)
    }
}

#[derive(Debug, Default)]
pub struct MemoryLoader {
    responses: HashMap<String, Response>,
    requests: RequestLog,
}

impl MemoryLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `identifier` with a copy of `sprite`
    pub fn with_sprite(mut self, identifier: impl Into<String>, sprite: Sprite) -> Self {
        self.responses.insert(identifier.into(), Response::Sprite(sprite));
        self
    }

    /// Answer `identifier` with `sprite`, reporting `others` as consumed too
    pub fn with_sequence(
        mut self,
        identifier: impl Into<String>,
        others: &[&str],
        sprite: Sprite,
    ) -> Self {
        let others = others.iter().map(|s| s.to_string()).collect();
        self.responses
            .insert(identifier.into(), Response::Sequence { others, sprite });
        self
    }

    /// Answer with a document and an error at the same time
    pub fn with_warning(
        mut self,
        identifier: impl Into<String>,
        sprite: Sprite,
        reason: impl Into<String>,
    ) -> Self {
        self.responses.insert(
            identifier.into(),
            Response::Warning {
                sprite,
                reason: reason.into(),
            },
        );
        self
    }

    pub fn with_error(mut self, identifier: impl Into<String>, reason: impl Into<String>) -> Self {
        self.responses
            .insert(identifier.into(), Response::Error(reason.into()));
        self
    }

    /// Answer with neither document nor error, as if the user cancelled
    pub fn with_cancel(mut self, identifier: impl Into<String>) -> Self {
        self.responses.insert(identifier.into(), Response::Cancel);
        self
    }

    pub fn requests(&self) -> RequestLog {
        self.requests.clone()
    }
}

impl DocumentLoader for MemoryLoader {
    fn load(&mut self, identifier: &str, _flags: LoadFlags) -> LoadResult {
        self.requests.0.lock().push(identifier.to_string());
        let failed = |reason: &str| SpriteError::LoadFailed {
            identifier: identifier.to_string(),
            reason: reason.to_string(),
        };

        match self.responses.get(identifier) {
            Some(Response::Sprite(sprite)) => LoadResult::loaded(
                Document::new(sprite.duplicate()),
                vec![identifier.to_string()],
            ),
            Some(Response::Sequence { others, sprite }) => {
                let mut consumed = vec![identifier.to_string()];
                consumed.extend(others.iter().cloned());
                LoadResult::loaded(Document::new(sprite.duplicate()), consumed)
            }
            Some(Response::Warning { sprite, reason }) => LoadResult::loaded(
                Document::new(sprite.duplicate()),
                vec![identifier.to_string()],
            )
            .with_warning(failed(reason.as_str())),
            Some(Response::Error(reason)) => LoadResult::failed(identifier, failed(reason.as_str())),
            Some(Response::Cancel) => LoadResult::cancelled(identifier),
            None => LoadResult::failed(identifier, failed("unknown identifier")),
        }
    }
}
