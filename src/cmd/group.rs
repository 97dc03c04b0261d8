//! Several commands treated as one history entry

use std::fmt;

use super::{Command, CommandKind};
use crate::doc::Document;
use crate::error::Result;

/// Commands applied front to back and undone back to front
pub struct CommandGroup {
    label: String,
    commands: Vec<Box<dyn Command>>,
    /// Number of leading commands currently applied
    applied: usize,
}

impl CommandGroup {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            commands: Vec::new(),
            applied: 0,
        }
    }

    /// Add a command that has not run yet
    pub fn push(&mut self, cmd: Box<dyn Command>) {
        self.commands.push(cmd);
    }

    /// Add a command that the caller already executed
    pub fn push_executed(&mut self, cmd: Box<dyn Command>) {
        self.commands.push(cmd);
        self.applied = self.commands.len();
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn commands(&self) -> &[Box<dyn Command>] {
        &self.commands
    }

    /// Run `step` on commands `applied..`, unwinding on failure
    fn apply_forward(
        &mut self,
        doc: &mut Document,
        step: fn(&mut dyn Command, &mut Document) -> Result<()>,
    ) -> Result<()> {
        let start = self.applied;
        for i in start..self.commands.len() {
            if let Err(err) = step(self.commands[i].as_mut(), doc) {
                for j in (start..i).rev() {
                    if let Err(undo_err) = self.commands[j].undo(doc) {
                        log::error!(
                            "failed to unwind '{}': {}",
                            self.commands[j].label(),
                            undo_err
                        );
                    }
                }
                self.applied = start;
                return Err(err);
            }
            self.applied = i + 1;
        }
        Ok(())
    }
}

impl Command for CommandGroup {
    fn execute(&mut self, doc: &mut Document) -> Result<()> {
        self.apply_forward(doc, |cmd, doc| cmd.execute(doc))
    }

    fn undo(&mut self, doc: &mut Document) -> Result<()> {
        while self.applied > 0 {
            self.commands[self.applied - 1].undo(doc)?;
            self.applied -= 1;
        }
        Ok(())
    }

    fn redo(&mut self, doc: &mut Document) -> Result<()> {
        self.apply_forward(doc, |cmd, doc| cmd.redo(doc))
    }

    fn label(&self) -> &str {
        &self.label
    }

    /// A group of one reports its only command's kind
    fn kind(&self) -> CommandKind {
        match self.commands.as_slice() {
            [only] => only.kind(),
            _ => CommandKind::Batch,
        }
    }

    fn mem_size(&self) -> usize {
        std::mem::size_of::<Self>() + self.commands.iter().map(|c| c.mem_size()).sum::<usize>()
    }
}

impl fmt::Debug for CommandGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandGroup")
            .field("label", &self.label)
            .field("commands", &self.commands)
            .field("applied", &self.applied)
            .finish()
    }
}
