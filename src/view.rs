//! Viewport transform: mapping between image space and viewport space.
//!
//! `viewport = image * scale + pan` and `image = (viewport - pan) / scale`.
//! Everything here is in viewport (CSS) pixels; device pixel ratio is
//! applied by the renderer, never inside this module.

use serde::Serialize;

use crate::config::EditorConfig;
use crate::ir::{BBoxXYXY, Coord, ImageSize, ImageSpace, ViewportSize, ViewportSpace};

/// Zoom changes smaller than this are treated as no-ops.
const SCALE_EPSILON: f64 = 1e-6;

/// The (scale, pan) pair of one image session.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Transform {
    scale: f64,
    pan_x: f64,
    pan_y: f64,
    min_zoom: f64,
    max_zoom: f64,
}

impl Transform {
    /// Identity transform with the given zoom bounds.
    pub fn new(min_zoom: f64, max_zoom: f64) -> Self {
        Self {
            scale: 1.0_f64.clamp(min_zoom, max_zoom),
            pan_x: 0.0,
            pan_y: 0.0,
            min_zoom,
            max_zoom,
        }
    }

    pub fn from_config(config: &EditorConfig) -> Self {
        Self::new(config.min_zoom, config.max_zoom)
    }

    /// Builds a transform with explicit parameters; scale is clamped.
    pub fn with_params(mut self, scale: f64, pan_x: f64, pan_y: f64) -> Self {
        self.scale = scale.clamp(self.min_zoom, self.max_zoom);
        self.pan_x = pan_x;
        self.pan_y = pan_y;
        self
    }

    #[inline]
    pub fn scale(&self) -> f64 {
        self.scale
    }

    #[inline]
    pub fn pan(&self) -> (f64, f64) {
        (self.pan_x, self.pan_y)
    }

    pub fn min_zoom(&self) -> f64 {
        self.min_zoom
    }

    pub fn max_zoom(&self) -> f64 {
        self.max_zoom
    }

    /// Back to scale 1 (within bounds) and zero pan.
    pub fn reset(&mut self) {
        *self = Self::new(self.min_zoom, self.max_zoom);
    }

    #[inline]
    pub fn to_image(&self, point: Coord<ViewportSpace>) -> Coord<ImageSpace> {
        Coord::new(
            (point.x - self.pan_x) / self.scale,
            (point.y - self.pan_y) / self.scale,
        )
    }

    #[inline]
    pub fn to_viewport(&self, point: Coord<ImageSpace>) -> Coord<ViewportSpace> {
        Coord::new(
            point.x * self.scale + self.pan_x,
            point.y * self.scale + self.pan_y,
        )
    }

    /// Maps a box to viewport space; the result is ordered.
    pub fn bbox_to_viewport(&self, bbox: &BBoxXYXY<ImageSpace>) -> BBoxXYXY<ViewportSpace> {
        BBoxXYXY::from_corners(self.to_viewport(bbox.min), self.to_viewport(bbox.max))
    }

    /// Converts a viewport-pixel distance into image pixels.
    #[inline]
    pub fn length_to_image(&self, length: f64) -> f64 {
        length / self.scale
    }

    /// Zooms by `factor` keeping the image point under `pivot` fixed.
    ///
    /// Returns false (and changes nothing) when the clamped scale equals the
    /// current one.
    pub fn zoom_at(&mut self, factor: f64, pivot: Coord<ViewportSpace>) -> bool {
        let new_scale = (self.scale * factor).clamp(self.min_zoom, self.max_zoom);
        if !new_scale.is_finite() || (new_scale - self.scale).abs() < SCALE_EPSILON {
            return false;
        }

        let anchor = self.to_image(pivot);
        self.scale = new_scale;
        self.pan_x = pivot.x - anchor.x * new_scale;
        self.pan_y = pivot.y - anchor.y * new_scale;
        true
    }

    /// Fits the whole image into the viewport and centers it.
    ///
    /// Does nothing when either size is empty.
    pub fn fit_to_viewport(&mut self, image: ImageSize, viewport: ViewportSize) {
        if !image.is_valid() || !viewport.is_usable() {
            return;
        }
        let (img_w, img_h) = (image.width as f64, image.height as f64);
        let scale = (viewport.width / img_w)
            .min(viewport.height / img_h)
            .clamp(self.min_zoom, self.max_zoom);

        self.scale = scale;
        self.pan_x = (viewport.width - img_w * scale) / 2.0;
        self.pan_y = (viewport.height - img_h * scale) / 2.0;
    }

    /// Shifts the pan by a raw viewport delta.
    #[inline]
    pub fn pan_by(&mut self, dx: f64, dy: f64) {
        self.pan_x += dx;
        self.pan_y += dy;
    }

    pub fn can_zoom_in(&self) -> bool {
        self.scale < self.max_zoom
    }

    pub fn can_zoom_out(&self) -> bool {
        self.scale > self.min_zoom
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::from_config(&EditorConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn identity_maps_points_unchanged() {
        let t = Transform::default();
        let p = t.to_image(Coord::new(12.0, 34.0));
        assert_eq!((p.x, p.y), (12.0, 34.0));
    }

    #[test]
    fn zoom_keeps_pivot_fixed() {
        let mut t = Transform::default().with_params(1.5, 20.0, -10.0);
        let pivot = Coord::new(200.0, 150.0);
        let before = t.to_image(pivot);

        assert!(t.zoom_at(1.2, pivot));
        let after = t.to_image(pivot);
        assert!(close(before.x, after.x));
        assert!(close(before.y, after.y));
        assert!(close(t.scale(), 1.8));
    }

    #[test]
    fn zoom_at_bound_is_a_noop() {
        let mut t = Transform::default().with_params(10.0, 5.0, 5.0);
        assert!(!t.zoom_at(1.2, Coord::new(0.0, 0.0)));
        assert_eq!(t.pan(), (5.0, 5.0));
        assert!(!t.can_zoom_in());
    }

    #[test]
    fn zoom_clamps_to_bounds() {
        let mut t = Transform::default().with_params(0.11, 0.0, 0.0);
        assert!(t.zoom_at(0.5, Coord::new(0.0, 0.0)));
        assert!(close(t.scale(), 0.1));
    }

    #[test]
    fn fit_centers_letterboxed_image() {
        let mut t = Transform::default();
        t.fit_to_viewport(ImageSize::new(100, 200), ViewportSize::new(400.0, 200.0));
        assert!(close(t.scale(), 1.0));
        assert_eq!(t.pan(), (150.0, 0.0));

        t.fit_to_viewport(ImageSize::new(4000, 1000), ViewportSize::new(200.0, 200.0));
        assert!(close(t.scale(), 0.1));
        assert_eq!(t.pan(), (-100.0, 50.0));
    }

    #[test]
    fn fit_ignores_empty_sizes() {
        let mut t = Transform::default().with_params(2.0, 3.0, 4.0);
        t.fit_to_viewport(ImageSize::new(0, 100), ViewportSize::new(100.0, 100.0));
        t.fit_to_viewport(ImageSize::new(100, 100), ViewportSize::new(0.0, 100.0));
        assert_eq!(t.scale(), 2.0);
        assert_eq!(t.pan(), (3.0, 4.0));
    }

    #[test]
    fn bbox_maps_to_ordered_viewport_rect() {
        let t = Transform::default().with_params(2.0, 10.0, 20.0);
        let rect = t.bbox_to_viewport(&BBoxXYXY::from_xyxy(5.0, 5.0, 1.0, 1.0));
        assert_eq!(rect, BBoxXYXY::from_xyxy(12.0, 22.0, 20.0, 30.0));
    }
}
