//! Bounding box types in canonical XYXY format.

use serde::{Deserialize, Serialize};

use super::coord::Coord;

/// An axis-aligned bounding box in XYXY format (xmin, ymin, xmax, ymax).
///
/// The `TSpace` parameter is one of the marker types in
/// [`space`](super::ImageSpace), ensuring type safety across coordinate
/// spaces.
///
/// Note: This type does NOT enforce that min < max in the constructor.
/// Working copies during a drag are allowed to be inverted or degenerate;
/// [`Annotation`](super::Annotation) is where committed geometry is
/// validated.
#[derive(Clone, Copy, PartialEq)]
pub struct BBoxXYXY<TSpace> {
    pub min: Coord<TSpace>,
    pub max: Coord<TSpace>,
}

impl<TSpace> BBoxXYXY<TSpace> {
    /// Creates a new bounding box from min and max coordinates.
    #[inline]
    pub fn new(min: Coord<TSpace>, max: Coord<TSpace>) -> Self {
        Self { min, max }
    }

    /// Creates a new bounding box from explicit coordinates.
    #[inline]
    pub fn from_xyxy(xmin: f64, ymin: f64, xmax: f64, ymax: f64) -> Self {
        Self {
            min: Coord::new(xmin, ymin),
            max: Coord::new(xmax, ymax),
        }
    }

    /// Creates an ordered box spanning two arbitrary corner points.
    pub fn from_corners(a: Coord<TSpace>, b: Coord<TSpace>) -> Self {
        Self::from_xyxy(a.x, a.y, b.x, b.y).normalized()
    }

    /// Returns the minimum x coordinate.
    #[inline]
    pub fn xmin(&self) -> f64 {
        self.min.x
    }

    /// Returns the minimum y coordinate.
    #[inline]
    pub fn ymin(&self) -> f64 {
        self.min.y
    }

    /// Returns the maximum x coordinate.
    #[inline]
    pub fn xmax(&self) -> f64 {
        self.max.x
    }

    /// Returns the maximum y coordinate.
    #[inline]
    pub fn ymax(&self) -> f64 {
        self.max.y
    }

    /// Returns the width of the bounding box.
    ///
    /// May be negative if the box is inverted (xmax < xmin).
    #[inline]
    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    /// Returns the height of the bounding box.
    ///
    /// May be negative if the box is inverted (ymax < ymin).
    #[inline]
    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }

    /// Returns the area of the bounding box.
    #[inline]
    pub fn area(&self) -> f64 {
        self.width() * self.height()
    }

    /// Returns true if all coordinates are finite (not NaN or infinite).
    #[inline]
    pub fn is_finite(&self) -> bool {
        self.min.is_finite() && self.max.is_finite()
    }

    /// Returns true if the box is properly ordered (min <= max for both axes).
    #[inline]
    pub fn is_ordered(&self) -> bool {
        self.min.x <= self.max.x && self.min.y <= self.max.y
    }

    /// Returns true unless the box is finite with strictly positive extent.
    #[inline]
    pub fn is_degenerate(&self) -> bool {
        !(self.is_finite() && self.width() > 0.0 && self.height() > 0.0)
    }

    /// Returns a copy with min/max swapped where needed so the box is ordered.
    pub fn normalized(&self) -> Self {
        Self::from_xyxy(
            self.min.x.min(self.max.x),
            self.min.y.min(self.max.y),
            self.min.x.max(self.max.x),
            self.min.y.max(self.max.y),
        )
    }

    /// Returns the box shifted by `(dx, dy)`.
    #[inline]
    pub fn translate(&self, dx: f64, dy: f64) -> Self {
        Self::new(self.min.offset(dx, dy), self.max.offset(dx, dy))
    }

    /// Inclusive containment test; the box is normalized first.
    pub fn contains(&self, point: &Coord<TSpace>) -> bool {
        let b = self.normalized();
        point.x >= b.min.x && point.x <= b.max.x && point.y >= b.min.y && point.y <= b.max.y
    }
}

impl<TSpace> std::fmt::Debug for BBoxXYXY<TSpace> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BBoxXYXY")
            .field("xmin", &self.min.x)
            .field("ymin", &self.min.y)
            .field("xmax", &self.max.x)
            .field("ymax", &self.max.y)
            .finish()
    }
}

impl<TSpace> Default for BBoxXYXY<TSpace> {
    fn default() -> Self {
        Self::from_xyxy(0.0, 0.0, 0.0, 0.0)
    }
}

// Custom serde implementation to avoid TSpace: Serialize/Deserialize bounds
impl<TSpace> Serialize for BBoxXYXY<TSpace> {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeStruct;
        let mut state = serializer.serialize_struct("BBoxXYXY", 4)?;
        state.serialize_field("xmin", &self.min.x)?;
        state.serialize_field("ymin", &self.min.y)?;
        state.serialize_field("xmax", &self.max.x)?;
        state.serialize_field("ymax", &self.max.y)?;
        state.end()
    }
}

impl<'de, TSpace> Deserialize<'de> for BBoxXYXY<TSpace> {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        struct BBoxData {
            xmin: f64,
            ymin: f64,
            xmax: f64,
            ymax: f64,
        }
        let data = BBoxData::deserialize(deserializer)?;
        Ok(BBoxXYXY::from_xyxy(
            data.xmin, data.ymin, data.xmax, data.ymax,
        ))
    }
}

/// Conversion between image and normalized coordinates, plus clamping.
use super::{ImageSpace, Normalized};

impl BBoxXYXY<ImageSpace> {
    /// Clamps every coordinate into `[0, width] x [0, height]`.
    ///
    /// A box lying wholly outside collapses onto the border.
    pub fn clamp_to(&self, width: f64, height: f64) -> Self {
        Self::from_xyxy(
            self.min.x.clamp(0.0, width),
            self.min.y.clamp(0.0, height),
            self.max.x.clamp(0.0, width),
            self.max.y.clamp(0.0, height),
        )
    }

    /// Shifts the box back inside `[0, width] x [0, height]` while keeping
    /// its size, then clamps whatever still overhangs.
    pub fn shift_inside(&self, width: f64, height: f64) -> Self {
        let w = self.width();
        let h = self.height();
        let x = self.min.x.min(width - w).max(0.0);
        let y = self.min.y.min(height - h).max(0.0);
        Self::from_xyxy(x, y, x + w, y + h).clamp_to(width, height)
    }

    /// Rounds each edge to the nearest integer pixel (halves round up).
    pub fn round_to_pixels(&self) -> [i64; 4] {
        let b = self.normalized();
        [
            round_half_up(b.min.x),
            round_half_up(b.min.y),
            round_half_up(b.max.x),
            round_half_up(b.max.y),
        ]
    }

    /// Converts image coordinates to normalized coordinates.
    pub fn to_normalized(&self, image_width: f64, image_height: f64) -> BBoxXYXY<Normalized> {
        BBoxXYXY::from_xyxy(
            self.min.x / image_width,
            self.min.y / image_height,
            self.max.x / image_width,
            self.max.y / image_height,
        )
    }
}

impl BBoxXYXY<Normalized> {
    /// Builds a box from center-x, center-y, width and height.
    pub fn from_cxcywh(cx: f64, cy: f64, w: f64, h: f64) -> Self {
        Self::from_xyxy(cx - w / 2.0, cy - h / 2.0, cx + w / 2.0, cy + h / 2.0)
    }

    /// Returns (center-x, center-y, width, height).
    pub fn to_cxcywh(&self) -> (f64, f64, f64, f64) {
        (
            (self.min.x + self.max.x) / 2.0,
            (self.min.y + self.max.y) / 2.0,
            self.width(),
            self.height(),
        )
    }

    /// Converts normalized coordinates to image coordinates.
    pub fn to_image(&self, image_width: f64, image_height: f64) -> BBoxXYXY<ImageSpace> {
        BBoxXYXY::from_xyxy(
            self.min.x * image_width,
            self.min.y * image_height,
            self.max.x * image_width,
            self.max.y * image_height,
        )
    }
}

fn round_half_up(value: f64) -> i64 {
    (value + 0.5).floor() as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bbox_from_xyxy() {
        let bbox: BBoxXYXY<ImageSpace> = BBoxXYXY::from_xyxy(10.0, 20.0, 100.0, 80.0);
        assert_eq!(bbox.xmin(), 10.0);
        assert_eq!(bbox.ymin(), 20.0);
        assert_eq!(bbox.xmax(), 100.0);
        assert_eq!(bbox.ymax(), 80.0);
    }

    #[test]
    fn test_bbox_dimensions() {
        let bbox: BBoxXYXY<ImageSpace> = BBoxXYXY::from_xyxy(10.0, 20.0, 100.0, 80.0);
        assert_eq!(bbox.width(), 90.0);
        assert_eq!(bbox.height(), 60.0);
        assert_eq!(bbox.area(), 5400.0);
    }

    #[test]
    fn test_bbox_ordering() {
        let ordered: BBoxXYXY<ImageSpace> = BBoxXYXY::from_xyxy(10.0, 20.0, 100.0, 80.0);
        assert!(ordered.is_ordered());

        let unordered: BBoxXYXY<ImageSpace> = BBoxXYXY::from_xyxy(100.0, 80.0, 10.0, 20.0);
        assert!(!unordered.is_ordered());
        assert_eq!(unordered.normalized(), ordered);
    }

    #[test]
    fn test_bbox_degenerate() {
        let flat: BBoxXYXY<ImageSpace> = BBoxXYXY::from_xyxy(10.0, 20.0, 10.0, 80.0);
        assert!(flat.is_degenerate());

        let nan: BBoxXYXY<ImageSpace> = BBoxXYXY::from_xyxy(f64::NAN, 0.0, 1.0, 1.0);
        assert!(nan.is_degenerate());

        let inverted: BBoxXYXY<ImageSpace> = BBoxXYXY::from_xyxy(5.0, 5.0, 1.0, 1.0);
        assert!(inverted.is_degenerate());
    }

    #[test]
    fn test_bbox_clamp_and_shift() {
        let bbox: BBoxXYXY<ImageSpace> = BBoxXYXY::from_xyxy(-5.0, 10.0, 30.0, 250.0);
        assert_eq!(
            bbox.clamp_to(100.0, 200.0),
            BBoxXYXY::from_xyxy(0.0, 10.0, 30.0, 200.0)
        );

        let outside: BBoxXYXY<ImageSpace> = BBoxXYXY::from_xyxy(120.0, 10.0, 150.0, 50.0);
        assert!(outside.clamp_to(100.0, 200.0).is_degenerate());

        let past_edge: BBoxXYXY<ImageSpace> = BBoxXYXY::from_xyxy(90.0, -10.0, 120.0, 20.0);
        assert_eq!(
            past_edge.shift_inside(100.0, 200.0),
            BBoxXYXY::from_xyxy(70.0, 0.0, 100.0, 30.0)
        );
    }

    #[test]
    fn test_bbox_rounding_is_half_up() {
        let bbox: BBoxXYXY<ImageSpace> = BBoxXYXY::from_xyxy(10.5, 2.49, 20.5, 7.5);
        assert_eq!(bbox.round_to_pixels(), [11, 2, 21, 8]);
    }

    #[test]
    fn test_bbox_cxcywh_roundtrip() {
        let original: BBoxXYXY<Normalized> = BBoxXYXY::from_cxcywh(0.5, 0.25, 0.2, 0.1);
        let (cx, cy, w, h) = original.to_cxcywh();
        assert!((cx - 0.5).abs() < 1e-12);
        assert!((cy - 0.25).abs() < 1e-12);
        assert!((w - 0.2).abs() < 1e-12);
        assert!((h - 0.1).abs() < 1e-12);
    }

    #[test]
    fn test_bbox_contains_is_inclusive() {
        let bbox: BBoxXYXY<ImageSpace> = BBoxXYXY::from_xyxy(10.0, 10.0, 20.0, 20.0);
        assert!(bbox.contains(&Coord::new(10.0, 20.0)));
        assert!(!bbox.contains(&Coord::new(20.1, 15.0)));
    }
}
