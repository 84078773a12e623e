//! Editor configuration.
//!
//! All interaction tunables live here so shells can override them from a
//! JSON file. Missing keys fall back to the defaults.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::BoxlabelError;
use crate::ir::PREDEFINED_CLASSES;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Lower zoom bound.
    pub min_zoom: f64,
    /// Upper zoom bound.
    pub max_zoom: f64,
    /// Multiplicative zoom factor for one step (buttons, keys, wheel notch).
    pub zoom_step: f64,
    /// Side of a resize handle, in viewport pixels.
    pub handle_size: f64,
    /// Extra hit slop around a handle, in viewport pixels.
    pub handle_hit_tolerance: f64,
    /// Smallest drawn extent (per axis, viewport pixels) that creates a box.
    pub min_box_size_px: f64,
    /// Pointer travel (viewport pixels) that turns a click into a move.
    pub drag_threshold_px: f64,
    /// Seed vocabulary for the known classes.
    pub classes: Vec<String>,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            min_zoom: 0.1,
            max_zoom: 10.0,
            zoom_step: 1.2,
            handle_size: 8.0,
            handle_hit_tolerance: 6.0,
            min_box_size_px: 4.0,
            drag_threshold_px: 5.0,
            classes: PREDEFINED_CLASSES.iter().map(|c| c.to_string()).collect(),
        }
    }
}

impl EditorConfig {
    /// Load and validate a JSON config file.
    pub fn load(path: &Path) -> Result<Self, BoxlabelError> {
        let raw = fs::read_to_string(path)?;
        let config: EditorConfig =
            serde_json::from_str(&raw).map_err(|source| BoxlabelError::ConfigParse {
                path: path.to_path_buf(),
                source,
            })?;
        config.validate()?;
        Ok(config)
    }

    /// Screen-space radius within which a pointer grabs a handle.
    pub fn handle_hit_radius(&self) -> f64 {
        self.handle_size / 2.0 + self.handle_hit_tolerance
    }

    pub fn validate(&self) -> Result<(), BoxlabelError> {
        if !(self.min_zoom > 0.0 && self.min_zoom <= self.max_zoom && self.max_zoom.is_finite()) {
            return Err(BoxlabelError::ConfigInvalid(format!(
                "zoom range [{}, {}] must satisfy 0 < min_zoom <= max_zoom",
                self.min_zoom, self.max_zoom
            )));
        }
        if !(self.zoom_step > 1.0 && self.zoom_step.is_finite()) {
            return Err(BoxlabelError::ConfigInvalid(format!(
                "zoom_step {} must be greater than 1",
                self.zoom_step
            )));
        }
        for (name, value) in [
            ("handle_size", self.handle_size),
            ("handle_hit_tolerance", self.handle_hit_tolerance),
            ("min_box_size_px", self.min_box_size_px),
            ("drag_threshold_px", self.drag_threshold_px),
        ] {
            if !(value >= 0.0 && value.is_finite()) {
                return Err(BoxlabelError::ConfigInvalid(format!(
                    "{name} must be a non-negative number, got {value}"
                )));
            }
        }
        if self.classes.iter().any(|c| c.trim().is_empty()) {
            return Err(BoxlabelError::ConfigInvalid(
                "class names cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}
