//! Input and output types of the interaction state machine.
//!
//! Shells translate their native events into these types. All positions
//! are viewport (CSS) pixels relative to the canvas origin.

use serde::{Deserialize, Serialize};

use crate::ir::{Coord, ViewportSpace};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PointerButton {
    #[default]
    Primary,
    Secondary,
    Middle,
}

/// A pointer position plus the button involved.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PointerEvent {
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub button: PointerButton,
}

impl PointerEvent {
    /// Primary-button event at `(x, y)`.
    pub fn at(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            button: PointerButton::Primary,
        }
    }

    pub fn with_button(mut self, button: PointerButton) -> Self {
        self.button = button;
        self
    }

    #[inline]
    pub fn position(&self) -> Coord<ViewportSpace> {
        Coord::new(self.x, self.y)
    }

    pub fn is_primary(&self) -> bool {
        self.button == PointerButton::Primary
    }
}

/// Wheel rotation at a pointer position. Positive `delta_y` scrolls down.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct WheelEvent {
    pub x: f64,
    pub y: f64,
    pub delta_y: f64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Modifiers {
    pub ctrl: bool,
    pub meta: bool,
    pub alt: bool,
    pub shift: bool,
}

/// A key press, named the way browsers name `KeyboardEvent.key`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyEvent {
    pub key: String,
    #[serde(default)]
    pub modifiers: Modifiers,
}

impl KeyEvent {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            modifiers: Modifiers::default(),
        }
    }

    pub fn with_ctrl(mut self) -> Self {
        self.modifiers.ctrl = true;
        self
    }

    /// Resolves the key to an editor command.
    ///
    /// Ctrl/Cmd is only honoured for save; any other chord (including Alt)
    /// is ignored so browser and OS shortcuts pass through.
    pub fn command(&self) -> Option<Command> {
        let command_key = self.modifiers.ctrl || self.modifiers.meta;
        let key = self.key.as_str();

        if command_key && !self.modifiers.alt {
            return matches!(key, "s" | "S").then_some(Command::Save);
        }
        if command_key || self.modifiers.alt {
            return None;
        }

        match key {
            "ArrowLeft" | "a" | "A" => Some(Command::PrevImage),
            "ArrowRight" | "d" | "D" => Some(Command::NextImage),
            "Delete" | "Backspace" => Some(Command::DeleteSelected),
            "+" | "=" => Some(Command::ZoomIn),
            "-" | "_" => Some(Command::ZoomOut),
            "w" | "W" => Some(Command::ToggleDraw),
            "Escape" => Some(Command::Escape),
            _ => None,
        }
    }
}

/// Editor commands reachable from the keyboard.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Command {
    PrevImage,
    NextImage,
    DeleteSelected,
    ZoomIn,
    ZoomOut,
    ToggleDraw,
    Escape,
    Save,
}

/// Pointer cursor the shell should show.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Cursor {
    #[default]
    Default,
    Crosshair,
    Grab,
    Grabbing,
    Move,
    NwseResize,
    NeswResize,
}

/// One of the four resize handles of the selected box.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Handle {
    Nw,
    Ne,
    Sw,
    Se,
}

impl Handle {
    /// Hit-test order.
    pub const ALL: [Handle; 4] = [Handle::Nw, Handle::Ne, Handle::Sw, Handle::Se];

    pub fn tag(self) -> &'static str {
        match self {
            Handle::Nw => "nw",
            Handle::Ne => "ne",
            Handle::Sw => "sw",
            Handle::Se => "se",
        }
    }

    pub fn cursor(self) -> Cursor {
        match self {
            Handle::Nw | Handle::Se => Cursor::NwseResize,
            Handle::Ne | Handle::Sw => Cursor::NeswResize,
        }
    }

    /// `(x, y)` of this corner on an ordered rect given as
    /// `(xmin, ymin, xmax, ymax)`.
    pub fn corner(self, xmin: f64, ymin: f64, xmax: f64, ymax: f64) -> (f64, f64) {
        match self {
            Handle::Nw => (xmin, ymin),
            Handle::Ne => (xmax, ymin),
            Handle::Sw => (xmin, ymax),
            Handle::Se => (xmax, ymax),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusLevel {
    Info,
    Warning,
    Error,
}

/// The status line.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Status {
    pub level: StatusLevel,
    pub message: String,
}

impl Status {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: StatusLevel::Info,
            message: message.into(),
        }
    }
}

/// Ask the shell for a new class name for one box.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct LabelEditRequest {
    pub image: String,
    pub index: usize,
    pub current: String,
}

/// What the shell should do after an event.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Response {
    /// The event was consumed.
    pub handled: bool,
    /// The frame changed and should be repainted.
    pub redraw: bool,
    pub cursor: Cursor,
    pub label_edit: Option<LabelEditRequest>,
    pub save_requested: bool,
}

impl Response {
    pub fn ignored(cursor: Cursor) -> Self {
        Self {
            cursor,
            ..Default::default()
        }
    }

    pub fn handled(cursor: Cursor) -> Self {
        Self {
            handled: true,
            cursor,
            ..Default::default()
        }
    }

    pub fn redraw(cursor: Cursor) -> Self {
        Self {
            handled: true,
            redraw: true,
            cursor,
            ..Default::default()
        }
    }
}
