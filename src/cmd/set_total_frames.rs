use super::{Command, CommandKind};
use crate::doc::{Document, Frame};
use crate::error::Result;

/// Change the timeline length
#[derive(Debug)]
pub struct SetTotalFrames {
    frames: Frame,
    previous: Frame,
}

impl SetTotalFrames {
    pub fn new(frames: Frame) -> Self {
        Self {
            frames,
            previous: 0,
        }
    }

    fn apply(doc: &mut Document, frames: Frame) {
        doc.sprite_mut().set_total_frames(frames);
        doc.sprite_mut().increment_version();
        doc.increment_version();
    }
}

impl Command for SetTotalFrames {
    fn execute(&mut self, doc: &mut Document) -> Result<()> {
        self.previous = doc.sprite().total_frames();
        Self::apply(doc, self.frames);
        Ok(())
    }

    fn undo(&mut self, doc: &mut Document) -> Result<()> {
        Self::apply(doc, self.previous);
        Ok(())
    }

    fn label(&self) -> &str {
        "Set Total Frames"
    }

    fn kind(&self) -> CommandKind {
        CommandKind::SetTotalFrames
    }
}
