//! Core annotation model.
//!
//! An [`Annotation`] is the committed form of a box: a labeled,
//! non-degenerate rectangle in image space. Working geometry during a drag
//! lives in plain [`BBoxXYXY`] values and only becomes an `Annotation` once
//! it passes validation.

use serde::{Deserialize, Serialize};

use super::bbox::BBoxXYXY;
use super::space::ImageSpace;
use crate::error::BoxlabelError;

/// A labeled bounding box in image pixel coordinates.
///
/// Construction rejects NaN/infinite coordinates and boxes without
/// positive width and height. Corners are stored ordered.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Annotation {
    bbox: BBoxXYXY<ImageSpace>,
    label: String,
}

impl Annotation {
    /// Creates a validated annotation. Corner order is normalized.
    pub fn new(
        bbox: BBoxXYXY<ImageSpace>,
        label: impl Into<String>,
    ) -> Result<Self, BoxlabelError> {
        let bbox = bbox.normalized();
        if bbox.is_degenerate() {
            return Err(BoxlabelError::DegenerateBox);
        }
        Ok(Self {
            bbox,
            label: label.into(),
        })
    }

    /// The committed geometry.
    #[inline]
    pub fn bbox(&self) -> &BBoxXYXY<ImageSpace> {
        &self.bbox
    }

    /// The class label.
    #[inline]
    pub fn label(&self) -> &str {
        &self.label
    }

    pub(crate) fn set_label(&mut self, label: String) {
        self.label = label;
    }

    pub(crate) fn set_bbox(&mut self, bbox: BBoxXYXY<ImageSpace>) {
        self.bbox = bbox;
    }

    /// One-line summary used by annotation lists: `label (x1,y1)-(x2,y2)`.
    pub fn summary(&self) -> String {
        let [x1, y1, x2, y2] = self.bbox.round_to_pixels();
        format!("{} ({},{})-({},{})", self.label, x1, y1, x2, y2)
    }
}

/// Pixel dimensions of a decoded image.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ImageSize {
    pub width: u32,
    pub height: u32,
}

impl ImageSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// True when both dimensions are non-zero.
    pub fn is_valid(&self) -> bool {
        self.width > 0 && self.height > 0
    }
}

/// Size of the on-screen viewport in viewport (CSS) pixels.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ViewportSize {
    pub width: f64,
    pub height: f64,
}

impl ViewportSize {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// True when the viewport has positive, finite extent.
    pub fn is_usable(&self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn annotation_normalizes_corners() {
        let ann = Annotation::new(BBoxXYXY::from_xyxy(50.0, 60.0, 10.0, 10.0), "palma")
            .expect("valid box");
        assert_eq!(ann.bbox(), &BBoxXYXY::from_xyxy(10.0, 10.0, 50.0, 60.0));
        assert_eq!(ann.label(), "palma");
    }

    #[test]
    fn annotation_rejects_degenerate_and_nan() {
        let flat = Annotation::new(BBoxXYXY::from_xyxy(10.0, 10.0, 10.0, 60.0), "palma");
        assert!(matches!(flat, Err(BoxlabelError::DegenerateBox)));

        let nan = Annotation::new(BBoxXYXY::from_xyxy(f64::NAN, 10.0, 20.0, 60.0), "palma");
        assert!(matches!(nan, Err(BoxlabelError::DegenerateBox)));
    }

    #[test]
    fn annotation_summary_rounds_coordinates() {
        let ann = Annotation::new(BBoxXYXY::from_xyxy(10.4, 10.6, 50.0, 60.2), "tenar")
            .expect("valid box");
        assert_eq!(ann.summary(), "tenar (10,11)-(50,60)");
    }
}
