//! Crop export: one raster file per box of a single image.

use std::io::Cursor;
use std::str::FromStr;

use image::{DynamicImage, ImageFormat, RgbaImage};

use super::ExportBundle;
use crate::error::BoxlabelError;
use crate::ir::{base_name, Annotation};
use crate::report::{IssueCode, Report};

/// Raster formats a crop can be written in.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CropFormat {
    #[default]
    Png,
    Jpeg,
    Webp,
    Gif,
    Bmp,
}

impl CropFormat {
    pub fn extension(self) -> &'static str {
        match self {
            CropFormat::Png => "png",
            CropFormat::Jpeg => "jpeg",
            CropFormat::Webp => "webp",
            CropFormat::Gif => "gif",
            CropFormat::Bmp => "bmp",
        }
    }

    fn image_format(self) -> ImageFormat {
        match self {
            CropFormat::Png => ImageFormat::Png,
            CropFormat::Jpeg => ImageFormat::Jpeg,
            CropFormat::Webp => ImageFormat::WebP,
            CropFormat::Gif => ImageFormat::Gif,
            CropFormat::Bmp => ImageFormat::Bmp,
        }
    }
}

impl FromStr for CropFormat {
    type Err = BoxlabelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "png" => Ok(CropFormat::Png),
            "jpeg" | "jpg" => Ok(CropFormat::Jpeg),
            "webp" => Ok(CropFormat::Webp),
            "gif" => Ok(CropFormat::Gif),
            "bmp" => Ok(CropFormat::Bmp),
            other => Err(BoxlabelError::UnsupportedFormat(format!(
                "crop format '{other}' (supported: png, jpeg, webp, gif, bmp)"
            ))),
        }
    }
}

/// Replaces every character outside `[A-Za-z0-9]` with `_`.
pub fn sanitize_label(label: &str) -> String {
    label
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

/// Crops every box of `image_name` out of `image`.
///
/// Entries are `<base>_crops/<base>_<label>_<index>.<ext>`, where `index`
/// is the box's position in the image's list. Boxes whose rounded pixel
/// rectangle is empty inside the image, or that fail to encode, are
/// skipped with a warning.
pub fn export_crops(
    image_name: &str,
    image: &RgbaImage,
    annotations: &[Annotation],
    format: CropFormat,
) -> Result<(ExportBundle, Report), BoxlabelError> {
    let base = base_name(image_name);
    let folder = format!("{base}_crops");
    let mut bundle = ExportBundle::new();
    let mut report = Report::new("crops");

    for (index, annotation) in annotations.iter().enumerate() {
        let label = sanitize_label(annotation.label());
        let Some((x, y, w, h)) = pixel_rect(annotation, image.width(), image.height()) else {
            log::warn!("{image_name}: skipping crop {index} ('{label}'): zero width or height");
            report.warn(
                IssueCode::DegenerateCrop,
                format!("{image_name}: crop {index} ('{label}') has zero width or height"),
            );
            continue;
        };

        let crop = image::imageops::crop_imm(image, x, y, w, h).to_image();
        let name = format!("{base}_{label}_{index}.{}", format.extension());
        let bytes = match encode(crop, format) {
            Ok(bytes) => bytes,
            Err(err) => {
                log::warn!("{image_name}: failed to encode {name}: {err}");
                report.warn(
                    IssueCode::CropEncodeFailure,
                    format!("{image_name}: crop {index} ('{label}') could not be encoded: {err}"),
                );
                continue;
            }
        };
        bundle.insert(format!("{folder}/{name}"), bytes);
        report.processed += 1;
    }

    if bundle.is_empty() {
        return Err(BoxlabelError::NoOutput {
            message: format!("no croppable boxes on {image_name}"),
        });
    }
    Ok((bundle, report))
}

/// Archive name for a crop export of `image_name`.
pub fn crops_archive_name(image_name: &str) -> String {
    format!("{}_crops.zip", base_name(image_name))
}

/// Rounded `(x, y, w, h)` limited to the image, or `None` when empty.
fn pixel_rect(annotation: &Annotation, width: u32, height: u32) -> Option<(u32, u32, u32, u32)> {
    let [x1, y1, x2, y2] = annotation.bbox().round_to_pixels();
    let (width, height) = (i64::from(width), i64::from(height));
    let (x1, x2) = (x1.clamp(0, width), x2.clamp(0, width));
    let (y1, y2) = (y1.clamp(0, height), y2.clamp(0, height));
    let (w, h) = (x2 - x1, y2 - y1);
    if w <= 0 || h <= 0 {
        return None;
    }
    Some((x1 as u32, y1 as u32, w as u32, h as u32))
}

fn encode(crop: RgbaImage, format: CropFormat) -> Result<Vec<u8>, image::ImageError> {
    let image = match format {
        // JPEG has no alpha channel.
        CropFormat::Jpeg => DynamicImage::ImageRgb8(DynamicImage::ImageRgba8(crop).to_rgb8()),
        _ => DynamicImage::ImageRgba8(crop),
    };
    let mut buffer = Cursor::new(Vec::new());
    image.write_to(&mut buffer, format.image_format())?;
    Ok(buffer.into_inner())
}
