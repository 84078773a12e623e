//! Pascal VOC import batch.
//!
//! Each XML file is resolved to one loaded image and merged into the store.
//! A bad file never stops the batch: it is recorded in the [`Report`] and
//! the next file is processed.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::ir::io_voc_xml::{has_xml_extension, read_voc_file};
use crate::ir::base_name;
use crate::report::{IssueCode, Report};
use crate::store::{AnnotationStore, ConflictKind};

/// Expands directories (recursively, sorted) and passes files through.
pub fn collect_files(paths: &[impl AsRef<Path>]) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for path in paths {
        let path = path.as_ref();
        if path.is_dir() {
            let mut found: Vec<PathBuf> = WalkDir::new(path)
                .follow_links(true)
                .into_iter()
                .filter_map(Result::ok)
                .filter(|entry| entry.file_type().is_file())
                .map(|entry| entry.into_path())
                .collect();
            found.sort();
            files.extend(found);
        } else {
            files.push(path.to_path_buf());
        }
    }
    files
}

/// Picks the loaded image an XML file describes.
///
/// An exact `<filename>` match wins; otherwise the XML file's own name is
/// compared against image names with extensions stripped.
pub fn resolve_target<'a>(
    images: &'a [String],
    declared: Option<&str>,
    xml_path: &Path,
) -> Option<&'a str> {
    if let Some(declared) = declared {
        if let Some(found) = images.iter().find(|name| name.as_str() == declared) {
            return Some(found);
        }
    }
    let file_name = xml_path.file_name()?.to_str()?;
    let xml_base = base_name(file_name);
    images
        .iter()
        .find(|name| base_name(name) == xml_base)
        .map(String::as_str)
}

/// Imports every VOC file under `paths` into `store`.
///
/// `processed` counts files that updated an image: files that added at
/// least one box, plus valid empty files without duplicates.
pub fn import_voc_files(
    store: &mut AnnotationStore,
    images: &[String],
    paths: &[impl AsRef<Path>],
) -> Report {
    let mut report = Report::new("import");
    let mut discovered = BTreeSet::new();

    for path in collect_files(paths) {
        if !has_xml_extension(&path) {
            log::warn!("skipping non-XML file {}", path.display());
            report.warn(
                IssueCode::NotXml,
                format!("{}: not an .xml file", path.display()),
            );
            continue;
        }

        let document = match read_voc_file(&path) {
            Ok(document) => document,
            Err(err) => {
                log::warn!("{err}");
                report.warn(IssueCode::DecodeFailure, err.to_string());
                continue;
            }
        };

        let Some(image) = resolve_target(images, document.filename.as_deref(), &path) else {
            log::warn!("no loaded image matches {}", path.display());
            report.warn(
                IssueCode::UnmatchedImage,
                format!("{}: no matching image", path.display()),
            );
            continue;
        };

        if document.malformed > 0 {
            report.warn(
                IssueCode::MalformedObject,
                format!(
                    "{}: skipped {} malformed <object> entries",
                    path.display(),
                    document.malformed
                ),
            );
        }

        let total = document.objects.len();
        let outcome = store.merge(
            image,
            document
                .objects
                .into_iter()
                .map(|object| (object.label, object.bbox)),
        );

        for conflict in &outcome.conflicts {
            let (code, reason) = match conflict.kind {
                ConflictKind::Existing => (
                    IssueCode::DuplicateLabelExisting,
                    format!("class '{}' already exists on {image}", conflict.label),
                ),
                ConflictKind::InBatch => (
                    IssueCode::DuplicateLabelInFile,
                    format!("class '{}' repeated in file; kept the first", conflict.label),
                ),
                ConflictKind::Degenerate => (
                    IssueCode::MalformedObject,
                    format!("class '{}' has no area inside the image", conflict.label),
                ),
            };
            report.warn(code, format!("{}: {reason}", path.display()));
        }

        if outcome.added > 0 || (total == 0 && !outcome.has_conflicts()) {
            report.processed += 1;
        }
        log::info!(
            "imported {} of {total} boxes from {} into {image}",
            outcome.added,
            path.display()
        );
        discovered.extend(outcome.new_classes);
    }

    if !discovered.is_empty() {
        let names: Vec<_> = discovered.into_iter().collect();
        report.note(
            IssueCode::ClassesDiscovered,
            format!("new classes: {}", names.join(", ")),
        );
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{BBoxXYXY, KnownClasses};
    use std::fs;
    use tempfile::TempDir;

    fn voc(filename: &str, objects: &[(&str, [f64; 4])]) -> String {
        let mut xml = format!("<annotation><filename>{filename}</filename>");
        for (name, [x1, y1, x2, y2]) in objects {
            xml.push_str(&format!(
                "<object><name>{name}</name><bndbox><xmin>{x1}</xmin><ymin>{y1}</ymin>\
                 <xmax>{x2}</xmax><ymax>{y2}</ymax></bndbox></object>"
            ));
        }
        xml.push_str("</annotation>");
        xml
    }

    fn images() -> Vec<String> {
        vec!["hand.jpg".to_string(), "other.png".to_string()]
    }

    #[test]
    fn resolves_by_filename_then_base_name() {
        let images = images();
        assert_eq!(
            resolve_target(&images, Some("other.png"), Path::new("x.xml")),
            Some("other.png")
        );
        assert_eq!(
            resolve_target(&images, Some("renamed.jpg"), Path::new("dir/hand.xml")),
            Some("hand.jpg")
        );
        assert_eq!(resolve_target(&images, None, Path::new("nope.xml")), None);
    }

    #[test]
    fn imports_and_reports_conflicts() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("hand.xml"),
            voc(
                "hand.jpg",
                &[
                    ("Palma", [10.0, 10.0, 50.0, 60.0]),
                    ("palma", [0.0, 0.0, 5.0, 5.0]),
                    ("custom", [1.0, 1.0, 9.0, 9.0]),
                ],
            ),
        )
        .unwrap();
        fs::write(dir.path().join("notes.txt"), "hello").unwrap();
        fs::write(dir.path().join("broken.xml"), "<annotation>").unwrap();
        fs::write(dir.path().join("lost.xml"), voc("lost.jpg", &[])).unwrap();

        let mut store = AnnotationStore::new(KnownClasses::default());
        let report = import_voc_files(&mut store, &images(), &[dir.path()]);

        assert_eq!(report.processed, 1);
        assert_eq!(store.boxes("hand.jpg").len(), 2);
        assert_eq!(
            *store.boxes("hand.jpg")[0].bbox(),
            BBoxXYXY::from_xyxy(10.0, 10.0, 50.0, 60.0)
        );
        assert!(store.classes().contains("custom"));
        assert_eq!(report.count_of(IssueCode::DuplicateLabelInFile), 1);
        assert_eq!(report.count_of(IssueCode::NotXml), 1);
        assert_eq!(report.count_of(IssueCode::DecodeFailure), 1);
        assert_eq!(report.count_of(IssueCode::UnmatchedImage), 1);
        assert_eq!(report.count_of(IssueCode::ClassesDiscovered), 1);
    }

    #[test]
    fn reimport_skips_existing_labels() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("hand.xml");
        fs::write(&file, voc("hand.jpg", &[("palma", [10.0, 10.0, 50.0, 60.0])])).unwrap();

        let mut store = AnnotationStore::new(KnownClasses::default());
        import_voc_files(&mut store, &images(), &[&file]);
        let report = import_voc_files(&mut store, &images(), &[&file]);

        assert_eq!(store.boxes("hand.jpg").len(), 1);
        assert_eq!(report.processed, 0);
        assert_eq!(report.count_of(IssueCode::DuplicateLabelExisting), 1);
    }

    #[test]
    fn unmatched_file_leaves_store_untouched() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("elsewhere.xml");
        fs::write(&file, voc("elsewhere.jpg", &[("palma", [1.0, 1.0, 5.0, 5.0])])).unwrap();

        let mut store = AnnotationStore::new(KnownClasses::default());
        let report = import_voc_files(&mut store, &images(), &[&file]);

        assert_eq!(store.total_boxes(), 0);
        assert_eq!(report.processed, 0);
        assert_eq!(report.warning_count(), 1);
    }
}
