//! CLI Command Implementations
//!
//! Implements the actual logic for each CLI command.

use std::path::{Path, PathBuf};

use log::{info, warn};

use crate::cmd::{Command, DropOnTimeline, LayerInsertion};
use crate::config::EngineConfig;
use crate::doc::{LayerKind, Sprite};
use crate::error::{Result, SpriteError};
use crate::file::{load_col_file, read_document, write_sprite, FsLoader};
use crate::observer::RecordingObserver;
use crate::tx::Transaction;

fn insertion(before: bool) -> LayerInsertion {
    if before {
        LayerInsertion::Before
    } else {
        LayerInsertion::After
    }
}

fn identifiers(files: &[PathBuf]) -> Vec<String> {
    files
        .iter()
        .map(|f| f.to_string_lossy().into_owned())
        .collect()
}

/// Recovery hint for the first [`SpriteError`] in `err`'s chain
pub fn recovery_hint(err: &anyhow::Error) -> Option<&'static str> {
    err.chain()
        .find_map(|cause| cause.downcast_ref::<SpriteError>())
        .and_then(SpriteError::recovery_suggestion)
}

/// Options shared by `drop` and `roundtrip`.
#[derive(Debug, Clone, Copy)]
pub struct DropTarget {
    pub frame: u32,
    pub layer: usize,
    pub before: bool,
}

/// Merge `files` into the document at `doc_path` and save the result.
pub fn drop_files(
    doc_path: &Path,
    files: &[PathBuf],
    target: DropTarget,
    config: Option<&Path>,
    output: Option<&Path>,
    history_dir: Option<&Path>,
) -> Result<()> {
    let config = match config {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };
    info!("Dropping {} file(s) onto {}", files.len(), doc_path.display());

    let mut doc = read_document(doc_path)?;
    let recorder = RecordingObserver::new();
    let events = recorder.log();
    doc.add_observer(Box::new(recorder));

    let mut history = config.new_history();
    let mut cmd = DropOnTimeline::new(
        identifiers(files),
        target.frame,
        target.layer,
        insertion(target.before),
        Box::new(FsLoader::new()),
    )
    .with_conversion(config.conversion)
    .with_flags(config.load);
    cmd.execute(&mut doc)?;

    for failure in cmd.load_errors() {
        warn!("{}: {}", failure.identifier, failure.error);
        println!("Skipped {}: {}", failure.identifier, failure.error);
    }
    println!(
        "Dropped {} layer(s); timeline has {} frame(s)",
        cmd.dropped_layers().len(),
        doc.sprite().total_frames()
    );
    if let Some(ev) = events.last() {
        if let Some(layer) = doc.sprite().layer(ev.layer) {
            println!("Focus: {}", layer.name());
        }
    }
    history.push(Box::new(cmd));

    let output = output.unwrap_or(doc_path);
    write_sprite(doc.sprite(), output)?;
    println!("Saved: {}", output.display());

    if let Some(dir) = history_dir {
        history.save_log(dir)?;
        println!("Action log saved to: {}", dir.display());
    }
    Ok(())
}

fn describe(sprite: &Sprite) -> Vec<String> {
    sprite
        .all_layers()
        .into_iter()
        .enumerate()
        .filter_map(|(index, id)| {
            let layer = sprite.layer(id)?;
            let depth = sprite.layer_depth(id).unwrap_or(0);
            let detail = match layer.kind() {
                LayerKind::Group(group) => format!("group, {} layer(s)", group.layers_count()),
                LayerKind::Image(image) => format!("{} cel(s)", image.cel_count()),
            };
            Some(format!(
                "{:>3}  {}{} [{}]",
                index,
                "  ".repeat(depth),
                layer.name(),
                detail
            ))
        })
        .collect()
}

/// Print the flattened layer listing.
pub fn print_tree(doc_path: &Path) -> Result<()> {
    let doc = read_document(doc_path)?;
    let sprite = doc.sprite();
    println!(
        "{}x{} {}, {} frame(s), {} layer(s)",
        sprite.width(),
        sprite.height(),
        sprite.pixel_format(),
        sprite.total_frames(),
        sprite.layer_count()
    );
    for line in describe(sprite) {
        println!("{}", line);
    }
    Ok(())
}

/// Execute, undo and redo a drop, checking that undo restores the
/// original and redo restores the merged state.
pub fn roundtrip(doc_path: &Path, files: &[PathBuf], target: DropTarget) -> Result<()> {
    let config = EngineConfig::default();
    let mut doc = read_document(doc_path)?;
    let mut history = config.new_history();
    let original = doc.sprite().fingerprint();

    let cmd = DropOnTimeline::new(
        identifiers(files),
        target.frame,
        target.layer,
        insertion(target.before),
        Box::new(FsLoader::new()),
    );
    let mut tx = Transaction::new(&mut doc, "Drop on Timeline");
    tx.execute(Box::new(cmd))?;
    tx.commit(&mut history);
    let merged = doc.sprite().fingerprint();

    history.undo(&mut doc)?;
    let undone = doc.sprite().fingerprint();
    history.redo(&mut doc)?;
    let redone = doc.sprite().fingerprint();

    let verdict = |ok: bool| if ok { "OK" } else { "MISMATCH" };
    println!("original {}", original);
    println!("merged   {}", merged);
    println!("undo     {}  {}", undone, verdict(undone == original));
    println!("redo     {}  {}", redone, verdict(redone == merged));
    Ok(())
}

/// Print every entry of a COL palette.
pub fn print_palette(path: &Path) -> Result<()> {
    let palette = load_col_file(path)?;
    println!("{} entries", palette.len());
    for (i, c) in palette.entries().iter().enumerate() {
        println!("{:>3}  #{:02x}{:02x}{:02x}", i, c.r, c.g, c.b);
    }
    Ok(())
}
