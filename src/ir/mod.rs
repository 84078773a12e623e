//! Annotation data types and format codecs.
//!
//! This module defines the typed building blocks every other component
//! shares: coordinates tagged with the space they live in, boxes over those
//! coordinates, committed [`Annotation`]s, the [`KnownClasses`] vocabulary,
//! and the YOLO / Pascal VOC codecs.
//!
//! # Design Principles
//!
//! 1. **Type Safety**: marker types keep image-space, viewport-space and
//!    normalized coordinates apart at compile time.
//!
//! 2. **Validate at commit**: [`BBoxXYXY`] is permissive so drag previews
//!    can be inverted or empty; [`Annotation::new`] is where NaN and
//!    degenerate geometry are rejected.
//!
//! # Example
//!
//! ```
//! use boxlabel::ir::{Annotation, BBoxXYXY, ImageSpace};
//!
//! let ann = Annotation::new(
//!     BBoxXYXY::<ImageSpace>::from_xyxy(50.0, 60.0, 10.0, 10.0),
//!     "palma",
//! )
//! .unwrap();
//! assert_eq!(ann.bbox().xmin(), 10.0);
//! ```

mod bbox;
mod classes;
mod coord;
pub mod io_voc_xml;
pub mod io_yolo;
mod model;
mod space;

// Re-export core types for convenient access
pub use bbox::BBoxXYXY;
pub use classes::{normalize_label, KnownClasses, PREDEFINED_CLASSES};
pub use coord::Coord;
pub use model::{Annotation, ImageSize, ViewportSize};
pub use space::{ImageSpace, Normalized, ViewportSpace};

/// Strips the last extension from a file name (`"a.b.jpg"` -> `"a.b"`).
pub fn base_name(file_name: &str) -> &str {
    match file_name.rfind('.') {
        Some(idx) if idx > 0 && !file_name[idx + 1..].contains('/') => &file_name[..idx],
        _ => file_name,
    }
}
