//! Transactions
//!
//! A [`Transaction`] runs commands against a document right away and keeps
//! them. Committing hands them to the history as a single entry; dropping
//! the transaction without committing undoes them, newest first.

use crate::cmd::{Command, CommandGroup};
use crate::doc::Document;
use crate::error::Result;
use crate::history::{ActionRecord, UndoHistory};

pub struct Transaction<'a> {
    doc: &'a mut Document,
    group: Option<CommandGroup>,
}

impl<'a> Transaction<'a> {
    pub fn new(doc: &'a mut Document, label: impl Into<String>) -> Self {
        Self {
            doc,
            group: Some(CommandGroup::new(label)),
        }
    }

    /// Execute `cmd` now. A command that fails is dropped and the error
    /// returned; commands that already ran stay applied.
    pub fn execute(&mut self, mut cmd: Box<dyn Command>) -> Result<()> {
        cmd.execute(self.doc)?;
        log::debug!("tx: executed '{}'", cmd.label());
        if let Some(group) = self.group.as_mut() {
            group.push_executed(cmd);
        }
        Ok(())
    }

    pub fn document(&self) -> &Document {
        &*self.doc
    }

    pub fn len(&self) -> usize {
        self.group.as_ref().map_or(0, CommandGroup::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Move the executed commands into `history` as one entry. An empty
    /// transaction records nothing.
    pub fn commit(mut self, history: &mut UndoHistory) -> Option<ActionRecord> {
        let group = self.group.take().filter(|g| !g.is_empty())?;
        log::info!("committing '{}' ({} command(s))", group.label(), group.len());
        Some(history.push(Box::new(group)))
    }

    /// Keep the changes without recording them in a history
    pub fn commit_detached(mut self) -> Option<CommandGroup> {
        self.group.take().filter(|g| !g.is_empty())
    }

    /// Undo everything executed so far
    pub fn rollback(mut self) -> Result<()> {
        match self.group.take() {
            Some(mut group) => group.undo(self.doc),
            None => Ok(()),
        }
    }
}

impl Drop for Transaction<'_> {
    fn drop(&mut self) {
        if let Some(mut group) = self.group.take() {
            if group.is_empty() {
                return;
            }
            log::info!("rolling back uncommitted '{}'", group.label());
            if let Err(err) = group.undo(self.doc) {
                log::error!("rollback of '{}' failed: {}", group.label(), err);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cmd::{AddLayer, SetTotalFrames};
    use crate::doc::{Layer, PixelFormat, Sprite};

    fn doc() -> Document {
        Document::new(Sprite::new(1, 1, PixelFormat::Rgba))
    }

    #[test]
    fn test_commit_creates_one_entry() {
        let mut doc = doc();
        let mut history = UndoHistory::new(10);
        {
            let mut tx = Transaction::new(&mut doc, "setup");
            tx.execute(Box::new(SetTotalFrames::new(4))).unwrap();
            tx.execute(Box::new(AddLayer::new(Layer::new_image("a")))).unwrap();
            assert_eq!(tx.len(), 2);
            let record = tx.commit(&mut history).unwrap();
            assert_eq!(record.label, "setup");
        }
        assert_eq!(history.undo_count(), 1);
        assert_eq!(doc.sprite().layer_count(), 1);

        history.undo(&mut doc).unwrap();
        assert_eq!(doc.sprite().layer_count(), 0);
        assert_eq!(doc.sprite().total_frames(), 1);
    }

    #[test]
    fn test_drop_rolls_back() {
        let mut doc = doc();
        {
            let mut tx = Transaction::new(&mut doc, "abandoned");
            tx.execute(Box::new(SetTotalFrames::new(6))).unwrap();
            tx.execute(Box::new(AddLayer::new(Layer::new_image("a")))).unwrap();
            assert_eq!(tx.document().sprite().total_frames(), 6);
        }
        assert_eq!(doc.sprite().total_frames(), 1);
        assert_eq!(doc.sprite().layer_count(), 0);
    }

    #[test]
    fn test_empty_commit_records_nothing() {
        let mut doc = doc();
        let mut history = UndoHistory::new(10);
        let tx = Transaction::new(&mut doc, "nothing");
        assert!(tx.commit(&mut history).is_none());
        assert!(!history.can_undo());
    }
}
