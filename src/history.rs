//! Undo/Redo History
//!
//! Committed transactions land here as one command each. The history keeps
//! the live commands on two stacks and a separate action log (id, label,
//! kind, timestamp) that can be written to disk for inspection.

use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::cmd::{Command, CommandKind};
use crate::doc::Document;
use crate::error::{Result, SpriteError};

/// Default maximum number of undo levels to keep.
pub const DEFAULT_MAX_UNDO_LEVELS: usize = 50;

/// File name for the action log persistence.
const ACTION_LOG_FILE: &str = "action_log.json";

/// Log entry describing one committed command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionRecord {
    /// Unique identifier for this action.
    pub id: String,

    /// Kind of the committed command.
    pub kind: CommandKind,

    /// Human-readable description of the action.
    pub label: String,

    /// When the action was committed.
    pub timestamp: DateTime<Utc>,
}

impl ActionRecord {
    pub fn new(kind: CommandKind, label: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            kind,
            label: label.into(),
            timestamp: Utc::now(),
        }
    }
}

#[derive(Debug)]
struct Entry {
    record: ActionRecord,
    command: Box<dyn Command>,
}

/// Undo and redo stacks of committed commands.
///
/// - The undo stack is bounded by `max_undo_levels`; the oldest entries go first
/// - Pushing clears the redo stack
/// - Ids of entries dropped by trimming or clearing are kept for reference
#[derive(Debug)]
pub struct UndoHistory {
    undo_stack: Vec<Entry>,
    redo_stack: Vec<Entry>,
    max_undo_levels: usize,
    action_log: Vec<ActionRecord>,
    discarded_action_ids: Vec<String>,
}

impl Default for UndoHistory {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_UNDO_LEVELS)
    }
}

impl UndoHistory {
    pub fn new(max_levels: usize) -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            max_undo_levels: max_levels,
            action_log: Vec::new(),
            discarded_action_ids: Vec::new(),
        }
    }

    /// Record an already executed command.
    pub fn push(&mut self, command: Box<dyn Command>) -> ActionRecord {
        let record = ActionRecord::new(command.kind(), command.label());
        log::debug!("history: push '{}' ({})", record.label, record.kind);

        for entry in self.redo_stack.drain(..) {
            self.discarded_action_ids.push(entry.record.id);
        }
        self.action_log.push(record.clone());
        self.undo_stack.push(Entry {
            record: record.clone(),
            command,
        });
        self.trim_history();
        record
    }

    /// Undo the most recent command. On failure the command stays on the
    /// undo stack.
    pub fn undo(&mut self, doc: &mut Document) -> Result<ActionRecord> {
        let mut entry = self.undo_stack.pop().ok_or(SpriteError::NothingToUndo)?;
        if let Err(err) = entry.command.undo(doc) {
            self.undo_stack.push(entry);
            return Err(err);
        }
        let record = entry.record.clone();
        self.redo_stack.push(entry);
        Ok(record)
    }

    /// Redo the most recently undone command.
    pub fn redo(&mut self, doc: &mut Document) -> Result<ActionRecord> {
        let mut entry = self.redo_stack.pop().ok_or(SpriteError::NothingToRedo)?;
        if let Err(err) = entry.command.redo(doc) {
            self.redo_stack.push(entry);
            return Err(err);
        }
        let record = entry.record.clone();
        self.undo_stack.push(entry);
        Ok(record)
    }

    /// Every action ever pushed, oldest first.
    pub fn get_history(&self) -> &[ActionRecord] {
        &self.action_log
    }

    /// Number of applied commands; 0 means nothing to undo.
    pub fn current_position(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn undo_count(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_count(&self) -> usize {
        self.redo_stack.len()
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn peek_undo(&self) -> Option<&ActionRecord> {
        self.undo_stack.last().map(|e| &e.record)
    }

    pub fn peek_redo(&self) -> Option<&ActionRecord> {
        self.redo_stack.last().map(|e| &e.record)
    }

    /// Drop the oldest undo entries beyond `max_undo_levels`.
    pub fn trim_history(&mut self) {
        let excess = self.undo_stack.len().saturating_sub(self.max_undo_levels);
        for entry in self.undo_stack.drain(..excess) {
            self.discarded_action_ids.push(entry.record.id);
        }
    }

    pub fn max_undo_levels(&self) -> usize {
        self.max_undo_levels
    }

    pub fn set_max_undo_levels(&mut self, max_levels: usize) {
        self.max_undo_levels = max_levels;
        self.trim_history();
    }

    pub fn discarded_action_ids(&self) -> &[String] {
        &self.discarded_action_ids
    }

    /// Forget both stacks. The action log is kept.
    pub fn clear(&mut self) {
        for entry in self.undo_stack.drain(..).chain(self.redo_stack.drain(..)) {
            self.discarded_action_ids.push(entry.record.id);
        }
    }

    /// Bytes held by live commands
    pub fn mem_size(&self) -> usize {
        self.undo_stack
            .iter()
            .chain(&self.redo_stack)
            .map(|e| e.command.mem_size())
            .sum()
    }

    /// (id, kind, label) of undoable actions, most recent first.
    pub fn undo_stack_summary(&self) -> Vec<(String, CommandKind, String)> {
        Self::summary(&self.undo_stack)
    }

    /// (id, kind, label) of redoable actions, most recently undone first.
    pub fn redo_stack_summary(&self) -> Vec<(String, CommandKind, String)> {
        Self::summary(&self.redo_stack)
    }

    fn summary(stack: &[Entry]) -> Vec<(String, CommandKind, String)> {
        stack
            .iter()
            .rev()
            .map(|e| (e.record.id.clone(), e.record.kind, e.record.label.clone()))
            .collect()
    }

    /// Write the action log to `<dir>/action_log.json`.
    pub fn save_log(&self, dir: &Path) -> Result<()> {
        if !dir.exists() {
            fs::create_dir_all(dir).map_err(|e| SpriteError::DirectoryCreateError {
                path: dir.to_path_buf(),
                source: e,
            })?;
        }
        let path = dir.join(ACTION_LOG_FILE);
        let content = serde_json::to_string_pretty(&self.action_log)?;
        fs::write(&path, content).map_err(|e| SpriteError::FileWriteError { path, source: e })?;
        Ok(())
    }

    /// Replace the action log with the one saved in `dir` (empty if absent).
    /// Commands themselves are not persisted, so the stacks are untouched.
    pub fn load_log(&mut self, dir: &Path) -> Result<()> {
        let path = dir.join(ACTION_LOG_FILE);
        self.action_log = if path.exists() {
            let content = fs::read_to_string(&path)
                .map_err(|e| SpriteError::FileReadError { path: path.clone(), source: e })?;
            serde_json::from_str(&content)?
        } else {
            Vec::new()
        };
        Ok(())
    }
}
