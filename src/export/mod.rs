//! Annotation export and packaging.
//!
//! An export first builds an [`ExportBundle`] in memory (relative path to
//! file contents), then writes it either as loose files under a directory
//! or as a single zip archive. Per-image problems are recorded in the
//! returned [`Report`]; only an export that produces nothing fails.

mod crops;

pub use crops::{crops_archive_name, export_crops, sanitize_label, CropFormat};

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::BoxlabelError;
use crate::ir::io_voc_xml::encode_voc;
use crate::ir::io_yolo::{classes_txt, encode_yolo, CLASSES_FILE_NAME};
use crate::ir::{base_name, ImageSize};
use crate::report::{IssueCode, Report};
use crate::store::AnnotationStore;

/// Archive name for [`export_annotations`] output.
pub const ANNOTATIONS_ARCHIVE: &str = "image_annotations.zip";
pub const YOLO_DIR: &str = "yolo_annotations";
pub const VOC_DIR: &str = "voc_annotations";

/// In-memory export output, keyed by `/`-separated relative path.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ExportBundle {
    files: BTreeMap<String, Vec<u8>>,
}

impl ExportBundle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: impl Into<String>, contents: impl Into<Vec<u8>>) {
        self.files.insert(path.into(), contents.into());
    }

    pub fn get(&self, path: &str) -> Option<&[u8]> {
        self.files.get(path).map(Vec::as_slice)
    }

    /// Contents of a text entry.
    pub fn text(&self, path: &str) -> Option<&str> {
        self.get(path).and_then(|bytes| std::str::from_utf8(bytes).ok())
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.files.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Writes every entry below `dir`, creating folders as needed.
    pub fn write_dir(&self, dir: &Path) -> Result<Vec<PathBuf>, BoxlabelError> {
        let mut written = Vec::with_capacity(self.files.len());
        for (relative, contents) in &self.files {
            let target = relative
                .split('/')
                .fold(dir.to_path_buf(), |acc, part| acc.join(part));
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&target, contents)?;
            log::debug!("wrote {}", target.display());
            written.push(target);
        }
        Ok(written)
    }

    /// Packs every entry into one deflated zip archive at `path`.
    #[cfg(feature = "archive")]
    pub fn write_archive(&self, path: &Path) -> Result<(), BoxlabelError> {
        use std::io::Write;
        use zip::write::SimpleFileOptions;

        let archive_error = |source| BoxlabelError::Archive {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let file = fs::File::create(path)?;
        let mut writer = zip::ZipWriter::new(file);
        let options =
            SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);

        for (relative, contents) in &self.files {
            writer
                .start_file(relative.as_str(), options)
                .map_err(archive_error)?;
            writer.write_all(contents)?;
        }
        writer.finish().map_err(archive_error)?;
        log::info!("wrote {} entries to {}", self.files.len(), path.display());
        Ok(())
    }
}

/// Where a bundle should go.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Destination {
    /// Loose files under this directory.
    Directory(PathBuf),
    /// One zip archive at this path.
    #[cfg(feature = "archive")]
    Archive(PathBuf),
}

impl Destination {
    /// Archive at `out/<archive_name>` when packaging is available and
    /// wanted, loose files under `out` otherwise.
    #[cfg(feature = "archive")]
    pub fn choose(out: &Path, archive_name: &str, want_archive: bool) -> Self {
        if want_archive {
            Destination::Archive(out.join(archive_name))
        } else {
            Destination::Directory(out.to_path_buf())
        }
    }

    #[cfg(not(feature = "archive"))]
    pub fn choose(out: &Path, _archive_name: &str, want_archive: bool) -> Self {
        if want_archive {
            log::warn!("built without the `archive` feature; writing individual files");
        }
        Destination::Directory(out.to_path_buf())
    }

    pub fn write(&self, bundle: &ExportBundle) -> Result<PathBuf, BoxlabelError> {
        match self {
            Destination::Directory(dir) => {
                bundle.write_dir(dir)?;
                Ok(dir.clone())
            }
            #[cfg(feature = "archive")]
            Destination::Archive(path) => {
                bundle.write_archive(path)?;
                Ok(path.clone())
            }
        }
    }
}

/// Builds the YOLO and VOC files for every annotated image.
///
/// Layout: `yolo_annotations/classes.txt`, `yolo_annotations/<base>.txt`
/// and `voc_annotations/<base>.xml`. Images without recorded dimensions
/// are skipped; an image whose YOLO lines are all rejected gets no `.txt`.
pub fn export_annotations(store: &AnnotationStore) -> Result<(ExportBundle, Report), BoxlabelError> {
    if store.total_boxes() == 0 {
        return Err(BoxlabelError::NoOutput {
            message: "there are no annotations to save".to_string(),
        });
    }
    let classes = store.classes().sorted();
    if classes.is_empty() {
        return Err(BoxlabelError::NoOutput {
            message: "no classes are defined".to_string(),
        });
    }

    let mut bundle = ExportBundle::new();
    let mut report = Report::new("export");

    for (image, annotations) in store.annotated_images() {
        let base = base_name(image);
        let size = match store.dimensions(image) {
            Some(size) if size.is_valid() => size,
            other => {
                let ImageSize { width, height } = other.unwrap_or(ImageSize::new(0, 0));
                log::warn!("{image}: no usable dimensions ({width}x{height}); not exported");
                report.warn(
                    IssueCode::InvalidDimensions,
                    format!("{image}: dimensions {width}x{height} unknown or invalid; skipped"),
                );
                continue;
            }
        };

        let lines = encode_yolo(image, size, annotations, &classes, &mut report);
        if lines.is_empty() {
            log::warn!("{image}: no valid YOLO lines");
            report.warn(
                IssueCode::NoYoloLines,
                format!("{image}: every YOLO line was rejected; no label file written"),
            );
        } else {
            bundle.insert(format!("{YOLO_DIR}/{base}.txt"), lines.join("\n"));
        }

        let xml = encode_voc(image, size, annotations, &mut report);
        bundle.insert(format!("{VOC_DIR}/{base}.xml"), xml);
        report.processed += 1;
    }

    if bundle.is_empty() {
        return Err(BoxlabelError::NoOutput {
            message: "no image had valid annotations in any format".to_string(),
        });
    }
    bundle.insert(format!("{YOLO_DIR}/{CLASSES_FILE_NAME}"), classes_txt(&classes));
    Ok((bundle, report))
}
