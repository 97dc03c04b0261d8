//! Drop On Timeline Tests
//!
//! Execute / undo / redo behaviour of merging loaded documents into a
//! destination timeline.

use std::sync::Arc;

use pretty_assertions::assert_eq;

use spritecmd::cmd::{AddLayer, Command, DropOnTimeline, LayerInsertion, RemoveLayer};
use spritecmd::color::{ColorConverter, ConversionOptions};
use spritecmd::doc::{Cel, Document, Image, Layer, LayerId, PixelFormat, Sprite};
use spritecmd::file::MemoryLoader;
use spritecmd::observer::RecordingObserver;
use spritecmd::SpriteError;

// === Helpers ===

fn image_layer(name: &str, frames: &[u32]) -> Layer {
    frames.iter().fold(Layer::new_image(name), |layer, frame| {
        let image = Image::filled(2, 2, PixelFormat::Rgba, &[*frame as u8, 0, 0, 255]).unwrap();
        layer.with_cel(Cel::new(*frame, image))
    })
}

fn dest(names: &[&str], frames: u32) -> Document {
    let sprite = names.iter().fold(
        Sprite::new(2, 2, PixelFormat::Rgba).with_total_frames(frames),
        |sprite, name| sprite.with_layer(image_layer(name, &[0])),
    );
    Document::new(sprite)
}

fn source(names: &[&str], frames: u32) -> Sprite {
    names.iter().fold(
        Sprite::new(2, 2, PixelFormat::Rgba).with_total_frames(frames),
        |sprite, name| sprite.with_layer(image_layer(name, &[0])),
    )
}

fn names(doc: &Document) -> Vec<String> {
    let sprite = doc.sprite();
    sprite
        .all_layers()
        .into_iter()
        .map(|id| sprite.layer(id).unwrap().name().to_string())
        .collect()
}

fn name_of(doc: &Document, id: LayerId) -> String {
    doc.sprite().layer(id).unwrap().name().to_string()
}

fn drop_cmd(loader: MemoryLoader, frame: u32, index: usize, insert: LayerInsertion) -> DropOnTimeline {
    let paths: Vec<String> = vec!["a.json".into()];
    DropOnTimeline::new(paths, frame, index, insert, Box::new(loader))
}

// === Placement ===

#[test]
fn test_after_leaf_places_layers_in_source_order() {
    let loader = MemoryLoader::new().with_sprite("a.json", source(&["s1", "s2"], 1));
    let mut doc = dest(&["l0", "l1", "l2"], 1);
    let mut cmd = drop_cmd(loader, 0, 1, LayerInsertion::After);

    cmd.execute(&mut doc).unwrap();
    assert_eq!(names(&doc), vec!["l0", "l1", "s1", "s2", "l2"]);
}

#[test]
fn test_before_leaf_places_layers_below_reference() {
    let loader = MemoryLoader::new().with_sprite("a.json", source(&["s1", "s2"], 1));
    let mut doc = dest(&["l0", "l1", "l2"], 1);
    let mut cmd = drop_cmd(loader, 0, 1, LayerInsertion::Before);

    cmd.execute(&mut doc).unwrap();
    assert_eq!(names(&doc), vec!["l0", "s1", "s2", "l1", "l2"]);
}

#[test]
fn test_before_empty_group_appends_inside_group() {
    let group = Layer::new_group("g");
    let group_id = group.id();
    let mut doc = Document::new(
        Sprite::new(2, 2, PixelFormat::Rgba)
            .with_layer(image_layer("l0", &[0]))
            .with_layer(group),
    );
    let loader = MemoryLoader::new().with_sprite("a.json", source(&["s1", "s2"], 1));
    let mut cmd = drop_cmd(loader, 0, 1, LayerInsertion::Before);

    cmd.execute(&mut doc).unwrap();
    assert_eq!(names(&doc), vec!["l0", "s1", "s2", "g"]);
    for id in cmd.dropped_layers() {
        assert_eq!(doc.sprite().layer(*id).unwrap().parent(), Some(group_id));
    }
}

#[test]
fn test_before_non_empty_group_goes_on_top_of_children() {
    let group = Layer::new_group("g").with_child(image_layer("g.a", &[0]));
    let mut doc = Document::new(Sprite::new(2, 2, PixelFormat::Rgba).with_layer(group));
    let loader = MemoryLoader::new().with_sprite("a.json", source(&["s1"], 1));
    let mut cmd = drop_cmd(loader, 0, 1, LayerInsertion::Before);

    cmd.execute(&mut doc).unwrap();
    assert_eq!(names(&doc), vec!["g.a", "s1", "g"]);
}

#[test]
fn test_source_groups_are_copied_once_with_their_children() {
    let src = Sprite::new(2, 2, PixelFormat::Rgba)
        .with_layer(image_layer("s0", &[0]))
        .with_layer(
            Layer::new_group("sg")
                .with_child(image_layer("sg.a", &[0]))
                .with_child(image_layer("sg.b", &[0])),
        );
    let loader = MemoryLoader::new().with_sprite("a.json", src);
    let mut doc = dest(&["l0"], 1);
    let mut cmd = drop_cmd(loader, 0, 0, LayerInsertion::After);

    cmd.execute(&mut doc).unwrap();
    assert_eq!(names(&doc), vec!["l0", "s0", "sg.a", "sg.b", "sg"]);
    assert_eq!(cmd.dropped_layers().len(), 2);

    cmd.undo(&mut doc).unwrap();
    assert_eq!(names(&doc), vec!["l0"]);
    cmd.redo(&mut doc).unwrap();
    assert_eq!(names(&doc), vec!["l0", "s0", "sg.a", "sg.b", "sg"]);
}

#[test]
fn test_later_documents_stack_above_earlier_ones() {
    let loader = MemoryLoader::new()
        .with_sprite("a.json", source(&["a1"], 1))
        .with_sprite("b.json", source(&["b1", "b2"], 1));
    let mut doc = dest(&["l0", "l1"], 1);
    let mut cmd = DropOnTimeline::new(
        ["a.json", "b.json"],
        0,
        0,
        LayerInsertion::After,
        Box::new(loader),
    );

    cmd.execute(&mut doc).unwrap();
    let merged = vec!["l0", "a1", "b1", "b2", "l1"];
    assert_eq!(names(&doc), merged);

    cmd.undo(&mut doc).unwrap();
    cmd.redo(&mut doc).unwrap();
    assert_eq!(names(&doc), merged);
}

// === Frames ===

#[test]
fn test_timeline_grows_to_fit_offset_content() {
    let src = Sprite::new(2, 2, PixelFormat::Rgba)
        .with_total_frames(5)
        .with_layer(image_layer("s", &[0, 4]));
    let loader = MemoryLoader::new().with_sprite("a.json", src);
    let mut doc = dest(&["l0"], 4);
    let mut cmd = drop_cmd(loader, 3, 0, LayerInsertion::After);

    cmd.execute(&mut doc).unwrap();
    assert_eq!(doc.sprite().total_frames(), 8);

    let copy = doc.sprite().layer(cmd.dropped_layers()[0]).unwrap();
    let image = copy.as_image().unwrap();
    assert!(image.cel(0).is_none());
    assert_eq!(image.cel(3).map(Cel::frame), Some(3));
    assert_eq!(image.cel(7).map(Cel::frame), Some(7));
}

#[test]
fn test_timeline_never_shrinks() {
    let loader = MemoryLoader::new().with_sprite("a.json", source(&["s"], 2));
    let mut doc = dest(&["l0"], 10);
    let mut cmd = drop_cmd(loader, 1, 0, LayerInsertion::After);

    cmd.execute(&mut doc).unwrap();
    assert_eq!(doc.sprite().total_frames(), 10);
}

#[test]
fn test_frame_count_ping_pong() {
    let loader = MemoryLoader::new().with_sprite("a.json", source(&["s"], 8));
    let mut doc = dest(&["l0"], 4);
    let mut cmd = drop_cmd(loader, 0, 0, LayerInsertion::After);

    cmd.execute(&mut doc).unwrap();
    assert_eq!(doc.sprite().total_frames(), 8);
    cmd.undo(&mut doc).unwrap();
    assert_eq!(doc.sprite().total_frames(), 4);
    cmd.redo(&mut doc).unwrap();
    assert_eq!(doc.sprite().total_frames(), 8);
    cmd.undo(&mut doc).unwrap();
    assert_eq!(doc.sprite().total_frames(), 4);
}

// === Undo / redo symmetry ===

#[test]
fn test_undo_restores_original_content() {
    let loader = MemoryLoader::new().with_sprite("a.json", source(&["s1", "s2"], 5));
    let mut doc = dest(&["l0", "l1", "l2"], 4);
    let before = doc.sprite().fingerprint();
    let mut cmd = drop_cmd(loader, 3, 1, LayerInsertion::After);

    cmd.execute(&mut doc).unwrap();
    assert_ne!(doc.sprite().fingerprint(), before);

    cmd.undo(&mut doc).unwrap();
    assert_eq!(doc.sprite().fingerprint(), before);
    assert_eq!(doc.sprite().total_frames(), 4);
}

#[test]
fn test_redo_matches_single_execute() {
    let src = || source(&["s1", "s2"], 3);
    let mut reference = dest(&["l0", "l1", "l2"], 2);
    drop_cmd(MemoryLoader::new().with_sprite("a.json", src()), 1, 1, LayerInsertion::After)
        .execute(&mut reference)
        .unwrap();

    let mut doc = dest(&["l0", "l1", "l2"], 2);
    let mut cmd = drop_cmd(MemoryLoader::new().with_sprite("a.json", src()), 1, 1, LayerInsertion::After);
    cmd.execute(&mut doc).unwrap();
    cmd.undo(&mut doc).unwrap();
    cmd.redo(&mut doc).unwrap();

    assert_eq!(doc.sprite().fingerprint(), reference.sprite().fingerprint());
}

#[test]
fn test_redo_after_unrelated_edits() {
    let mut doc = dest(&["l0", "l1", "l2"], 1);
    let loader = MemoryLoader::new().with_sprite("a.json", source(&["s1", "s2"], 1));
    let mut cmd = drop_cmd(loader, 0, 1, LayerInsertion::After);
    cmd.execute(&mut doc).unwrap();
    cmd.undo(&mut doc).unwrap();

    // Add one layer on top and remove the previous top layer.
    let mut add = AddLayer::new(image_layer("extra", &[0]));
    add.execute(&mut doc).unwrap();
    let l2 = doc.sprite().all_layers()[2];
    let mut remove = RemoveLayer::new(l2);
    remove.execute(&mut doc).unwrap();
    assert_eq!(names(&doc), vec!["l0", "l1", "extra"]);

    cmd.redo(&mut doc).unwrap();
    assert_eq!(names(&doc), vec!["l0", "l1", "s1", "s2", "extra"]);

    cmd.undo(&mut doc).unwrap();
    assert_eq!(names(&doc), vec!["l0", "l1", "extra"]);
}

#[test]
fn test_redo_with_stale_index_fails_before_mutating() {
    let loader = MemoryLoader::new().with_sprite("a.json", source(&["s"], 6));
    let mut doc = dest(&["l0", "l1"], 2);
    let mut cmd = drop_cmd(loader, 0, 1, LayerInsertion::After);
    cmd.execute(&mut doc).unwrap();
    cmd.undo(&mut doc).unwrap();

    let l1 = doc.sprite().all_layers()[1];
    doc.sprite_mut().remove_layer(l1).unwrap();
    let before = doc.sprite().fingerprint();

    let err = cmd.redo(&mut doc).unwrap_err();
    assert!(matches!(err, SpriteError::LayerIndexOutOfRange { index: 1, len: 1 }));
    assert_eq!(doc.sprite().fingerprint(), before);
    assert_eq!(doc.sprite().total_frames(), 2);
}

#[test]
fn test_versions_only_increase() {
    let loader = MemoryLoader::new().with_sprite("a.json", source(&["s"], 1));
    let mut doc = dest(&["l0"], 1);
    let mut cmd = drop_cmd(loader, 0, 0, LayerInsertion::After);

    let mut last = (doc.version(), doc.sprite().version());
    for step in 0..4 {
        match step {
            0 => cmd.execute(&mut doc).unwrap(),
            1 | 3 => cmd.undo(&mut doc).unwrap(),
            _ => cmd.redo(&mut doc).unwrap(),
        }
        let now = (doc.version(), doc.sprite().version());
        assert!(now.0 > last.0 && now.1 > last.1, "step {step}");
        last = now;
    }
}

// === Loading outcomes ===

#[test]
fn test_load_error_is_skipped_and_recorded() {
    let loader = MemoryLoader::new()
        .with_error("a.json", "truncated")
        .with_sprite("b.json", source(&["b1"], 1));
    let mut doc = dest(&["l0"], 1);
    let mut cmd = DropOnTimeline::new(
        ["a.json", "b.json"],
        0,
        0,
        LayerInsertion::After,
        Box::new(loader),
    );

    cmd.execute(&mut doc).unwrap();
    assert_eq!(names(&doc), vec!["l0", "b1"]);
    assert_eq!(cmd.load_errors().len(), 1);
    assert_eq!(cmd.load_errors()[0].identifier, "a.json");
    assert_eq!(cmd.load_errors()[0].error.error_code(), "LOAD_FAILED");
}

#[test]
fn test_cancel_stops_remaining_loads() {
    let loader = MemoryLoader::new()
        .with_sprite("a.json", source(&["a1"], 1))
        .with_cancel("b.json")
        .with_sprite("c.json", source(&["c1"], 1));
    let requests = loader.requests();
    let mut doc = dest(&["l0"], 1);
    let mut cmd = DropOnTimeline::new(
        ["a.json", "b.json", "c.json"],
        0,
        0,
        LayerInsertion::After,
        Box::new(loader),
    );

    cmd.execute(&mut doc).unwrap();
    assert_eq!(names(&doc), vec!["l0", "a1"]);
    assert_eq!(requests.snapshot(), vec!["a.json", "b.json"]);
    assert!(cmd.load_errors().is_empty());
}

#[test]
fn test_undo_of_empty_drop_sends_no_event() {
    let loader = MemoryLoader::new().with_cancel("a.json");
    let mut doc = dest(&["l0"], 1);
    let recorder = RecordingObserver::new();
    let events = recorder.log();
    doc.add_observer(Box::new(recorder));
    let mut cmd = drop_cmd(loader, 0, 0, LayerInsertion::After);

    cmd.execute(&mut doc).unwrap();
    cmd.undo(&mut doc).unwrap();
    cmd.redo(&mut doc).unwrap();
    assert!(events.is_empty());
    assert_eq!(names(&doc), vec!["l0"]);
}

#[test]
fn test_warning_still_merges_document() {
    let loader = MemoryLoader::new().with_warning("a.json", source(&["a1"], 1), "palette ignored");
    let mut doc = dest(&["l0"], 1);
    let mut cmd = drop_cmd(loader, 0, 0, LayerInsertion::After);

    cmd.execute(&mut doc).unwrap();
    assert_eq!(names(&doc), vec!["l0", "a1"]);
    assert_eq!(cmd.load_errors().len(), 1);
}

#[test]
fn test_source_is_converted_to_destination_format() {
    let gray = Image::filled(2, 2, PixelFormat::Grayscale, &[128, 255]).unwrap();
    let src = Sprite::new(2, 2, PixelFormat::Grayscale)
        .with_layer(Layer::new_image("g").with_cel(Cel::new(0, gray)));
    let loader = MemoryLoader::new().with_sprite("a.json", src);
    let mut doc = dest(&["l0"], 1);
    let mut cmd = drop_cmd(loader, 0, 0, LayerInsertion::After);

    cmd.execute(&mut doc).unwrap();
    let copy = doc.sprite().layer(cmd.dropped_layers()[0]).unwrap();
    let image = copy.as_image().unwrap().cel(0).unwrap().image();
    assert_eq!(image.format(), PixelFormat::Rgba);
    assert_eq!(&image.data()[..4], &[128, 128, 128, 255]);
}

// === Observers ===

#[test]
fn test_observer_focus() {
    let loader = MemoryLoader::new().with_sprite("a.json", source(&["s1", "s2"], 1));
    let mut doc = dest(&["l0", "l1", "l2"], 1);
    let recorder = RecordingObserver::new();
    let events = recorder.log();
    doc.add_observer(Box::new(recorder));
    let mut cmd = drop_cmd(loader, 0, 1, LayerInsertion::After);

    cmd.execute(&mut doc).unwrap();
    let ev = events.last().unwrap();
    assert_eq!(name_of(&doc, ev.layer), "s2");
    assert_eq!(ev.document, doc.id());
    assert_eq!(ev.sprite, doc.sprite().id());

    cmd.undo(&mut doc).unwrap();
    assert_eq!(name_of(&doc, events.last().unwrap().layer), "l1");

    cmd.redo(&mut doc).unwrap();
    assert_eq!(name_of(&doc, events.last().unwrap().layer), "s2");
    assert_eq!(events.len(), 3);
}

#[test]
fn test_undo_focus_falls_back_to_first_layer() {
    let group = Layer::new_group("g");
    let mut doc = Document::new(
        Sprite::new(2, 2, PixelFormat::Rgba)
            .with_layer(image_layer("l0", &[0]))
            .with_layer(group),
    );
    let recorder = RecordingObserver::new();
    let events = recorder.log();
    doc.add_observer(Box::new(recorder));
    let loader = MemoryLoader::new().with_sprite("a.json", source(&["s1"], 1));
    let mut cmd = drop_cmd(loader, 1, 1, LayerInsertion::Before);

    cmd.execute(&mut doc).unwrap();
    cmd.undo(&mut doc).unwrap();
    assert_eq!(name_of(&doc, events.last().unwrap().layer), "l0");
}

// === Frame range ===

#[test]
fn test_offset_past_frame_range_is_rejected() {
    let loader = MemoryLoader::new().with_sprite(
        "a.json",
        Sprite::new(2, 2, PixelFormat::Rgba)
            .with_total_frames(2)
            .with_layer(image_layer("a1", &[1])),
    );
    let mut doc = dest(&["l0"], 1);
    let before = doc.sprite().fingerprint();
    let mut cmd = drop_cmd(loader, u32::MAX, 0, LayerInsertion::After);

    let err = cmd.execute(&mut doc).unwrap_err();
    assert!(matches!(err, SpriteError::FrameOffsetOverflow { offset: u32::MAX, frames: 2 }));
    assert_eq!(doc.sprite().fingerprint(), before);
    assert!(cmd.dropped_layers().is_empty());
}

#[test]
fn test_offset_reaching_last_frame_is_accepted() {
    let loader = MemoryLoader::new().with_sprite(
        "a.json",
        Sprite::new(2, 2, PixelFormat::Rgba)
            .with_total_frames(2)
            .with_layer(image_layer("a1", &[1])),
    );
    let mut doc = dest(&["l0"], 1);
    let mut cmd = drop_cmd(loader, u32::MAX - 2, 0, LayerInsertion::After);

    cmd.execute(&mut doc).unwrap();
    assert_eq!(doc.sprite().total_frames(), u32::MAX);
    let a1 = doc.sprite().layer(cmd.dropped_layers()[0]).unwrap();
    assert_eq!(a1.as_image().unwrap().last_frame(), Some(u32::MAX - 1));
}

#[test]
fn test_overflow_in_later_document_rolls_back_earlier_ones() {
    let loader = MemoryLoader::new()
        .with_sprite("a.json", source(&["a1"], 1))
        .with_sprite("b.json", source(&["b1"], u32::MAX));
    let mut doc = dest(&["l0"], 1);
    let before = doc.sprite().fingerprint();
    let mut cmd = DropOnTimeline::new(
        ["a.json", "b.json"],
        1,
        0,
        LayerInsertion::After,
        Box::new(loader),
    );

    let err = cmd.execute(&mut doc).unwrap_err();
    assert_eq!(err.error_code(), "FRAME_OFFSET_OVERFLOW");
    assert_eq!(doc.sprite().fingerprint(), before);
}

// === Conversion ===

#[derive(Debug)]
struct RefusingConverter;

impl ColorConverter for RefusingConverter {
    fn convert(
        &self,
        sprite: &mut Sprite,
        target: PixelFormat,
        _options: &ConversionOptions,
    ) -> spritecmd::Result<()> {
        Err(SpriteError::ConversionFailed {
            from: sprite.pixel_format(),
            to: target,
            reason: "unsupported".to_string(),
        })
    }
}

#[test]
fn test_failed_conversion_leaves_destination_untouched() {
    let gray = Sprite::new(2, 2, PixelFormat::Grayscale).with_layer(Layer::new_image("g1"));
    let loader = MemoryLoader::new()
        .with_sprite("a.json", source(&["a1"], 1))
        .with_sprite("b.json", gray);
    let mut doc = dest(&["l0"], 1);
    let before = doc.sprite().fingerprint();
    let mut cmd = DropOnTimeline::new(
        ["a.json", "b.json"],
        0,
        0,
        LayerInsertion::After,
        Box::new(loader),
    )
    .with_converter(Arc::new(RefusingConverter));

    let err = cmd.execute(&mut doc).unwrap_err();
    assert!(matches!(
        err,
        SpriteError::ConversionFailed { from: PixelFormat::Grayscale, to: PixelFormat::Rgba, .. }
    ));
    assert_eq!(doc.sprite().fingerprint(), before);
    assert_eq!(names(&doc), vec!["l0"]);
}
