//! Loader reading JSON sprite documents from disk
//!
//! A file whose stem ends in digits (`walk_001.json`) starts a sequence
//! when sequence detection is on: the following numbers in the same
//! directory (`walk_002.json`, `walk_003.json`, ...) are loaded as the next
//! frames of the same document.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use super::col::load_col_file;
use super::format::read_sprite;
use super::loader::{DocumentLoader, LoadFlags, LoadResult};
use crate::doc::{Cel, Document, Frame, Palette, Sprite};
use crate::error::SpriteError;

/// Default palette size for documents that carry none
const DEFAULT_PALETTE_SIZE: usize = 256;

#[derive(Debug, Clone, Copy, Default)]
pub struct FsLoader;

impl FsLoader {
    pub fn new() -> Self {
        Self
    }
}

/// `walk_007.json` -> ("walk_", 7, 3, "json")
fn split_numbered(path: &Path) -> Option<(String, u64, usize, String)> {
    let stem = path.file_stem()?.to_str()?;
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or_default();
    let prefix = stem.trim_end_matches(|c: char| c.is_ascii_digit());
    let digits = &stem[prefix.len()..];
    if digits.is_empty() {
        return None;
    }
    let number = digits.parse().ok()?;
    Some((prefix.to_string(), number, digits.len(), ext.to_string()))
}

/// Paths of the files that continue the sequence started by `first`
fn sequence_siblings(first: &Path) -> Vec<PathBuf> {
    let Some((prefix, number, width, ext)) = split_numbered(first) else {
        return Vec::new();
    };
    let parent = first.parent().unwrap_or_else(|| Path::new(""));
    let listing_dir = if parent.as_os_str().is_empty() {
        Path::new(".")
    } else {
        parent
    };

    let names: HashSet<String> = WalkDir::new(listing_dir)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .filter_map(|entry| entry.file_name().to_str().map(str::to_string))
        .collect();

    let mut siblings = Vec::new();
    let mut next = number + 1;
    loop {
        let name = if ext.is_empty() {
            format!("{prefix}{next:0width$}")
        } else {
            format!("{prefix}{next:0width$}.{ext}")
        };
        if !names.contains(&name) {
            break;
        }
        siblings.push(parent.join(name));
        next += 1;
    }
    siblings
}

/// Copy the first-frame cels of `frame_sprite` into `base` at `frame`,
/// matching image layers by position
fn append_frame(base: &mut Sprite, frame_sprite: &Sprite, frame: Frame) {
    let image_layers = |sprite: &Sprite| {
        sprite
            .all_layers()
            .into_iter()
            .filter(|id| sprite.layer(*id).is_some_and(|l| !l.is_group()))
            .collect::<Vec<_>>()
    };
    let targets = image_layers(base);
    let sources = image_layers(frame_sprite);

    for (target, source) in targets.into_iter().zip(sources) {
        let Some(cel) = frame_sprite
            .layer(source)
            .and_then(|l| l.as_image())
            .and_then(|image| image.cel(0))
        else {
            continue;
        };
        let (x, y) = cel.position();
        let copy = Cel::new(frame, cel.image().clone())
            .with_position(x, y)
            .with_opacity(cel.opacity());
        if let Some(image) = base.layer_mut(target).and_then(|l| l.as_image_mut()) {
            image.set_cel(copy);
        }
    }
}

impl DocumentLoader for FsLoader {
    fn load(&mut self, identifier: &str, flags: LoadFlags) -> LoadResult {
        let path = Path::new(identifier);
        let mut sprite = match read_sprite(path) {
            Ok(sprite) => sprite,
            Err(err) => return LoadResult::failed(identifier, err),
        };
        let mut consumed = vec![identifier.to_string()];
        let mut warning = None;

        if flags.detect_sequence {
            let siblings = sequence_siblings(path);
            let mut frame: Frame = 1;
            for sibling in siblings {
                let next = match read_sprite(&sibling) {
                    Ok(next) if next.pixel_format() == sprite.pixel_format() => next,
                    Ok(next) => {
                        warning = Some(SpriteError::LoadFailed {
                            identifier: sibling.display().to_string(),
                            reason: format!(
                                "sequence frame is {} but the first frame is {}",
                                next.pixel_format(),
                                sprite.pixel_format()
                            ),
                        });
                        break;
                    }
                    Err(err) => {
                        warning = Some(err);
                        break;
                    }
                };
                append_frame(&mut sprite, &next, frame);
                consumed.push(sibling.to_string_lossy().into_owned());
                frame += 1;
            }
            if frame > sprite.total_frames() {
                sprite.set_total_frames(frame);
            }
            if consumed.len() > 1 {
                log::debug!("{} is a sequence of {} files", identifier, consumed.len());
            }
        }

        if flags.embedded_palette {
            if let Some(stem) = path.file_stem() {
                let mut name = stem.to_os_string();
                name.push(".col");
                let col = path.with_file_name(name);
                if col.exists() {
                    match load_col_file(&col) {
                        Ok(palette) => sprite.set_palette(Some(palette)),
                        Err(err) => warning = Some(err),
                    }
                }
            }
        }

        if flags.create_palette && sprite.palette().is_none() {
            sprite.set_palette(Some(Palette::grayscale(DEFAULT_PALETTE_SIZE)));
        }

        let document = Document::new(sprite).with_filename(path);
        let result = LoadResult::loaded(document, consumed);
        match warning {
            Some(err) => result.with_warning(err),
            None => result,
        }
    }
}
