use std::fs;
use std::path::Path;

use boxlabel::export::{export_annotations, Destination, ANNOTATIONS_ARCHIVE, VOC_DIR, YOLO_DIR};
use boxlabel::interaction::{PointerEvent, Session, StatusLevel};
use boxlabel::ir::io_voc_xml::read_voc_file;
use boxlabel::ir::{Coord, ImageSize, ImageSpace};
use boxlabel::report::IssueCode;
use tempfile::TempDir;

mod common;

fn loaded_session(images: &[&str], size: ImageSize) -> Session {
    let mut session = Session::default();
    let ticket = session
        .open_images(images.iter().copied())
        .expect("load ticket");
    assert!(session.complete_load(&ticket, size));
    for image in images {
        session.record_dimensions(image, size);
    }
    session
}

fn draw(session: &mut Session, from: (f64, f64), to: (f64, f64)) {
    let transform = *session.transform();
    let a = transform.to_viewport(Coord::<ImageSpace>::new(from.0, from.1));
    let b = transform.to_viewport(Coord::<ImageSpace>::new(to.0, to.1));
    session.on_pointer_down(&PointerEvent::at(a.x, a.y));
    session.on_pointer_move(&PointerEvent::at(b.x, b.y));
    session.on_pointer_up(&PointerEvent::at(b.x, b.y));
}

#[test]
fn drawn_box_exports_to_yolo_and_voc() {
    let mut session = loaded_session(&["hand.jpg"], ImageSize::new(100, 200));
    session.toggle_draw();
    session.set_active_class("palma").expect("known class");
    draw(&mut session, (10.0, 10.0), (50.0, 60.0));

    let boxes = session.store().boxes("hand.jpg");
    assert_eq!(boxes.len(), 1);
    let bbox = boxes[0].bbox();
    assert!((bbox.xmin() - 10.0).abs() < 1e-6);
    assert!((bbox.ymax() - 60.0).abs() < 1e-6);

    let (bundle, report) = export_annotations(session.store()).expect("export");
    assert_eq!(report.processed, 1);
    assert_eq!(
        bundle.text(&format!("{YOLO_DIR}/hand.txt")),
        Some("3 0.300000 0.175000 0.400000 0.250000")
    );
    assert_eq!(
        bundle.text(&format!("{YOLO_DIR}/classes.txt")),
        Some("hipotenar\ninfradigital\nlateral\npalma\ntenar")
    );

    let dir = TempDir::new().expect("temp dir");
    let written = Destination::Directory(dir.path().to_path_buf())
        .write(&bundle)
        .expect("write files");
    assert_eq!(written, dir.path());

    let voc = read_voc_file(&dir.path().join(VOC_DIR).join("hand.xml")).expect("read voc");
    assert_eq!(voc.filename.as_deref(), Some("hand.jpg"));
    assert_eq!(voc.size, Some(ImageSize::new(100, 200)));
    assert_eq!(voc.objects.len(), 1);
    assert_eq!(voc.objects[0].label, "palma");
}

#[test]
fn duplicate_draw_is_rejected_and_existing_box_kept() {
    let mut session = loaded_session(&["hand.jpg"], ImageSize::new(100, 200));
    session.toggle_draw();
    session.set_active_class("palma").expect("known class");
    draw(&mut session, (10.0, 10.0), (50.0, 60.0));
    let before = session.store().boxes("hand.jpg").to_vec();

    draw(&mut session, (60.0, 100.0), (90.0, 150.0));

    assert_eq!(session.store().boxes("hand.jpg"), before.as_slice());
    assert_eq!(session.status().level, StatusLevel::Error);
}

#[test]
fn exported_voc_reimports_into_a_fresh_session() {
    let mut session = loaded_session(&["a.jpg", "b.jpg"], ImageSize::new(320, 240));
    session.toggle_draw();
    session.set_active_class("tenar").expect("known class");
    draw(&mut session, (20.0, 30.0), (120.0, 90.0));

    let (bundle, _) = export_annotations(session.store()).expect("export");
    let dir = TempDir::new().expect("temp dir");
    bundle.write_dir(dir.path()).expect("write files");

    let mut fresh = loaded_session(&["a.jpg", "b.jpg"], ImageSize::new(320, 240));
    let report = fresh.import_annotations(&[dir.path().join(VOC_DIR)]);

    assert_eq!(report.processed, 1);
    assert_eq!(report.warning_count(), 0);
    let boxes = fresh.store().boxes("a.jpg");
    assert_eq!(boxes.len(), 1);
    assert_eq!(boxes[0].label(), "tenar");
    assert_eq!(boxes[0].bbox().round_to_pixels(), [20, 30, 120, 90]);
    assert!(fresh.store().boxes("b.jpg").is_empty());
}

#[test]
fn voc_for_unknown_image_changes_nothing() {
    let dir = TempDir::new().expect("temp dir");
    let xml_path = dir.path().join("stranger.xml");
    common::write_voc(&xml_path, "stranger.jpg", &[("newclass", [1.0, 1.0, 20.0, 20.0])]);

    let mut session = loaded_session(&["hand.jpg"], ImageSize::new(100, 200));
    let classes_before = session.store().classes().clone();

    let report = session.import_annotations(&[&xml_path]);

    assert_eq!(report.processed, 0);
    assert_eq!(report.count_of(IssueCode::UnmatchedImage), 1);
    assert_eq!(session.store().total_boxes(), 0);
    assert_eq!(session.store().classes(), &classes_before);
    assert_eq!(
        session.status().message,
        "XML files loaded. 0 image(s) updated. Errors: 0"
    );
}

#[test]
fn import_batch_survives_bad_files() {
    let dir = TempDir::new().expect("temp dir");
    common::write_voc(
        &dir.path().join("hand.xml"),
        "hand.jpg",
        &[("Palma", [10.0, 10.0, 50.0, 60.0]), ("palma", [0.0, 0.0, 5.0, 5.0])],
    );
    fs::write(dir.path().join("broken.xml"), "<annotation><object>").expect("write");
    fs::write(dir.path().join("notes.txt"), "not xml").expect("write");

    let mut session = loaded_session(&["hand.jpg"], ImageSize::new(100, 200));
    let report = session.import_annotations(&[dir.path()]);

    assert_eq!(report.processed, 1);
    assert_eq!(report.count_of(IssueCode::DecodeFailure), 1);
    assert_eq!(report.count_of(IssueCode::NotXml), 1);
    assert_eq!(report.count_of(IssueCode::DuplicateLabelInFile), 1);

    let boxes = session.store().boxes("hand.jpg");
    assert_eq!(boxes.len(), 1);
    assert_eq!(boxes[0].label(), "palma");
    assert_eq!(
        session.status().message,
        "XML files loaded. 1 image(s) updated. Errors: 1"
    );
}

#[test]
fn import_discovers_new_classes() {
    let dir = TempDir::new().expect("temp dir");
    common::write_voc(
        &dir.path().join("hand.xml"),
        "hand.jpg",
        &[("Thumb", [10.0, 10.0, 50.0, 60.0])],
    );

    let mut session = loaded_session(&["hand.jpg"], ImageSize::new(100, 200));
    let report = session.import_annotations(&[dir.path().join("hand.xml")]);

    assert_eq!(report.count_of(IssueCode::ClassesDiscovered), 1);
    assert!(session.store().classes().contains("thumb"));
    assert!(session.set_active_class("THUMB").is_ok());
}

#[test]
fn import_without_images_warns() {
    let mut session = Session::default();
    let report = session.import_annotations(&[Path::new("whatever.xml")]);
    assert_eq!(report.processed, 0);
    assert_eq!(session.status().level, StatusLevel::Warning);
    assert_eq!(session.status().message, "Load images before importing annotations");
}

#[cfg(feature = "archive")]
#[test]
fn archive_destination_writes_zip() {
    let mut session = loaded_session(&["hand.jpg"], ImageSize::new(100, 200));
    session.toggle_draw();
    draw(&mut session, (10.0, 10.0), (50.0, 60.0));
    let (bundle, _) = export_annotations(session.store()).expect("export");

    let dir = TempDir::new().expect("temp dir");
    let destination = Destination::choose(dir.path(), ANNOTATIONS_ARCHIVE, true);
    let written = destination.write(&bundle).expect("write archive");

    assert_eq!(written, dir.path().join(ANNOTATIONS_ARCHIVE));
    let bytes = fs::read(&written).expect("read archive");
    assert_eq!(&bytes[..2], b"PK");
}
