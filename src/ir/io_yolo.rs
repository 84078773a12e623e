//! Ultralytics-style YOLO label encoding.
//!
//! Each box becomes one line `"<class_index> <xc> <yc> <w> <h>"` with the
//! center, width and height normalized by the image dimensions, clamped to
//! `[0, 1]` and printed with six decimals. Class indices refer to the sorted
//! class list written to `classes.txt`.

use std::path::Path;

use super::model::{Annotation, ImageSize};
use super::{BBoxXYXY, ImageSpace, Normalized};
use crate::error::BoxlabelError;
use crate::report::{IssueCode, Report};

/// Name of the class list file written next to the label files.
pub const CLASSES_FILE_NAME: &str = "classes.txt";

/// Encode one box as a YOLO label line.
///
/// Fails with `UnknownClass` if the label is absent from `classes`, and
/// with `InvalidDimensions` if either image dimension is zero.
pub fn encode_yolo_line(
    size: ImageSize,
    annotation: &Annotation,
    classes: &[String],
) -> Result<String, BoxlabelError> {
    let class_id = classes
        .iter()
        .position(|name| name == annotation.label())
        .ok_or_else(|| BoxlabelError::UnknownClass {
            label: annotation.label().to_string(),
        })?;

    if !size.is_valid() {
        return Err(BoxlabelError::InvalidDimensions {
            width: size.width,
            height: size.height,
        });
    }

    let bbox_norm = annotation
        .bbox()
        .normalized()
        .to_normalized(size.width as f64, size.height as f64);
    let (cx, cy, w, h) = bbox_norm.to_cxcywh();
    let (cx, cy, w, h) = (unit(cx), unit(cy), unit(w), unit(h));

    if w <= 1e-6 || h <= 1e-6 {
        log::warn!(
            "YOLO: normalized size of '{}' is nearly zero ({w:.6}x{h:.6})",
            annotation.label()
        );
    }

    Ok(format!("{} {:.6} {:.6} {:.6} {:.6}", class_id, cx, cy, w, h))
}

/// Encode all boxes of one image.
///
/// Boxes that cannot be encoded are skipped and recorded in `report`; the
/// remaining lines are returned in box order.
pub fn encode_yolo(
    image_name: &str,
    size: ImageSize,
    annotations: &[Annotation],
    classes: &[String],
    report: &mut Report,
) -> Vec<String> {
    let mut lines = Vec::with_capacity(annotations.len());
    for annotation in annotations {
        match encode_yolo_line(size, annotation, classes) {
            Ok(line) => lines.push(line),
            Err(err @ BoxlabelError::UnknownClass { .. }) => report.warn(
                IssueCode::UnknownClass,
                format!("{image_name}: skipping YOLO line: {err}"),
            ),
            Err(err) => report.warn(
                IssueCode::InvalidDimensions,
                format!("{image_name}: skipping YOLO line for '{}': {err}", annotation.label()),
            ),
        }
    }
    lines
}

/// Contents of `classes.txt`: one class per line, in index order.
pub fn classes_txt(classes: &[String]) -> String {
    classes.join("\n")
}

/// A parsed YOLO label row.
#[derive(Debug, PartialEq)]
pub struct YoloLabelRow {
    pub class_id: usize,
    pub cx: f64,
    pub cy: f64,
    pub w: f64,
    pub h: f64,
}

impl YoloLabelRow {
    /// Re-derives the image-space box this row describes.
    pub fn to_image_bbox(&self, size: ImageSize) -> BBoxXYXY<ImageSpace> {
        BBoxXYXY::<Normalized>::from_cxcywh(self.cx, self.cy, self.w, self.h)
            .to_image(size.width as f64, size.height as f64)
    }
}

/// Decode exported label lines back into `(label, bbox)` pairs.
///
/// Used to verify exports; empty lines are skipped.
pub fn decode_yolo(
    content: &str,
    size: ImageSize,
    classes: &[String],
    file_path: &Path,
) -> Result<Vec<(String, BBoxXYXY<ImageSpace>)>, BoxlabelError> {
    let mut boxes = Vec::new();
    for (line_idx, line) in content.lines().enumerate() {
        let line_num = line_idx + 1;
        let Some(row) = parse_label_line(line, file_path, line_num)? else {
            continue;
        };
        let label = classes
            .get(row.class_id)
            .ok_or_else(|| BoxlabelError::DecodeFailure {
                path: file_path.to_path_buf(),
                message: format!(
                    "line {line_num}: class_id {} is out of range for class list with {} class(es)",
                    row.class_id,
                    classes.len()
                ),
            })?;
        boxes.push((label.clone(), row.to_image_bbox(size)));
    }
    Ok(boxes)
}

/// Parse a single YOLO label line. Blank lines yield `Ok(None)`.
pub fn parse_label_line(
    line: &str,
    file_path: &Path,
    line_num: usize,
) -> Result<Option<YoloLabelRow>, BoxlabelError> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    // Take at most 6 tokens so pathological inputs do not allocate unbounded memory.
    let tokens: Vec<&str> = trimmed.split_whitespace().take(6).collect();

    if tokens.len() != 5 {
        return Err(line_error(
            file_path,
            line_num,
            format!("expected 5 tokens, found {}", tokens.len()),
        ));
    }

    let class_id = tokens[0].parse::<usize>().map_err(|_| {
        line_error(
            file_path,
            line_num,
            format!(
                "invalid class_id '{}'; expected non-negative integer",
                tokens[0]
            ),
        )
    })?;

    let cx = parse_f64_token(tokens[1], "x_center", file_path, line_num)?;
    let cy = parse_f64_token(tokens[2], "y_center", file_path, line_num)?;
    let w = parse_f64_token(tokens[3], "width", file_path, line_num)?;
    let h = parse_f64_token(tokens[4], "height", file_path, line_num)?;

    Ok(Some(YoloLabelRow {
        class_id,
        cx,
        cy,
        w,
        h,
    }))
}

/// Fuzz-only entrypoint for YOLO single-line parsing.
#[cfg(feature = "fuzzing")]
pub fn fuzz_parse_label_line(input: &str) -> Result<(), BoxlabelError> {
    let _ = parse_label_line(input, Path::new("<fuzz>"), 1)?;
    Ok(())
}

fn parse_f64_token(
    raw: &str,
    field_name: &str,
    file_path: &Path,
    line_num: usize,
) -> Result<f64, BoxlabelError> {
    raw.parse::<f64>().map_err(|_| {
        line_error(
            file_path,
            line_num,
            format!("invalid {field_name} '{raw}'; expected floating-point number"),
        )
    })
}

fn line_error(file_path: &Path, line_num: usize, message: String) -> BoxlabelError {
    BoxlabelError::DecodeFailure {
        path: file_path.to_path_buf(),
        message: format!("line {line_num}: {message}"),
    }
}

fn unit(value: f64) -> f64 {
    value.clamp(0.0, 1.0)
}
