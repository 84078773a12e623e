//! Gesture state carried between pointer-down and pointer-up.

use serde::Serialize;

use super::events::Handle;
use crate::ir::{BBoxXYXY, Coord, ImageSpace, ViewportSpace};

/// What the current pointer gesture is doing.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    #[default]
    Idle,
    Draw,
    Select,
    Move,
    Resize,
    Pan,
}

/// Transient state of one pointer gesture.
///
/// Resize and move edit `working`, a copy of the selected box; the store
/// only sees the result at pointer-up.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct InteractionState {
    pub(crate) mode: Mode,
    pub(crate) handle: Option<Handle>,
    pub(crate) anchor: Coord<ViewportSpace>,
    pub(crate) last: Coord<ViewportSpace>,
    pub(crate) dragging: bool,
    pub(crate) working: Option<BBoxXYXY<ImageSpace>>,
    /// Image-space translation accumulated by a move.
    pub(crate) offset: (f64, f64),
}

impl InteractionState {
    pub(crate) fn begin(mode: Mode, at: Coord<ViewportSpace>) -> Self {
        Self {
            mode,
            anchor: at,
            last: at,
            dragging: true,
            ..Default::default()
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn handle(&self) -> Option<Handle> {
        self.handle
    }

    pub fn anchor(&self) -> Coord<ViewportSpace> {
        self.anchor
    }

    pub fn last(&self) -> Coord<ViewportSpace> {
        self.last
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    /// Uncommitted geometry of the selected box, while resizing or moving.
    pub fn working(&self) -> Option<&BBoxXYXY<ImageSpace>> {
        self.working.as_ref()
    }

    /// Live rubber band of a draw, in viewport space.
    pub fn preview(&self) -> Option<BBoxXYXY<ViewportSpace>> {
        (self.dragging && self.mode == Mode::Draw)
            .then(|| BBoxXYXY::from_corners(self.anchor, self.last))
    }

    pub(crate) fn reset(&mut self) {
        *self = Self::default();
    }

    /// Sets the corner tracked by `handle` on the working copy.
    pub(crate) fn drag_corner(&mut self, to: Coord<ImageSpace>) {
        let (Some(handle), Some(working)) = (self.handle, self.working.as_mut()) else {
            return;
        };
        match handle {
            Handle::Nw => {
                working.min.x = to.x;
                working.min.y = to.y;
            }
            Handle::Ne => {
                working.max.x = to.x;
                working.min.y = to.y;
            }
            Handle::Sw => {
                working.min.x = to.x;
                working.max.y = to.y;
            }
            Handle::Se => {
                working.max.x = to.x;
                working.max.y = to.y;
            }
        }
    }

    pub(crate) fn translate_working(&mut self, dx: f64, dy: f64) {
        if let Some(working) = self.working.as_mut() {
            *working = working.translate(dx, dy);
            self.offset.0 += dx;
            self.offset.1 += dy;
        }
    }
}
