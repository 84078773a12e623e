//! Coordinate space marker types.
//!
//! These are zero-sized types (ZSTs) used as type parameters to distinguish
//! between different coordinate systems at compile time.

use std::fmt;

/// Marker type for image coordinates (original image pixels, origin top-left).
///
/// Annotation boxes are always stored in this space.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageSpace {}

/// Marker type for viewport coordinates (on-screen pixels).
///
/// Viewport coordinates are measured before any device pixel-density
/// scaling; that factor is applied once at the render boundary.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViewportSpace {}

/// Marker type for normalized coordinates (0.0 to 1.0).
///
/// Normalized coordinates represent positions as fractions of the image
/// dimensions. Only the YOLO codec produces them.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub enum Normalized {}

impl fmt::Debug for ImageSpace {
    fn fmt(&self, _: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {}
    }
}

impl fmt::Debug for ViewportSpace {
    fn fmt(&self, _: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {}
    }
}

impl fmt::Debug for Normalized {
    fn fmt(&self, _: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {}
    }
}
