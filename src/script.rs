//! Scripted replay of editor input.
//!
//! A script is a JSON document listing the events a user would produce.
//! Replaying it drives a [`Session`] exactly the way an interactive shell
//! would, including answering image load tickets.
//!
//! ```json
//! {
//!   "viewport": { "width": 800, "height": 600 },
//!   "steps": [
//!     { "action": "toggle_draw" },
//!     { "action": "set_class", "class": "palma" },
//!     { "action": "pointer_down", "x": 10, "y": 10 },
//!     { "action": "pointer_move", "x": 50, "y": 60 },
//!     { "action": "pointer_up", "x": 50, "y": 60 }
//!   ]
//! }
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::BoxlabelError;
use crate::interaction::{
    KeyEvent, Modifiers, PointerButton, PointerEvent, Response, Session, Status, StatusLevel,
    WheelEvent,
};
use crate::ir::ViewportSize;
use crate::source::ImageSource;

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct Script {
    #[serde(default)]
    pub viewport: Option<ViewportSize>,
    pub steps: Vec<Step>,
}

/// One scripted input.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Step {
    PointerDown {
        x: f64,
        y: f64,
        #[serde(default)]
        button: PointerButton,
    },
    PointerMove {
        x: f64,
        y: f64,
    },
    PointerUp {
        x: f64,
        y: f64,
    },
    PointerLeave,
    /// Double-click; `label` answers the resulting label-edit request.
    DoubleClick {
        x: f64,
        y: f64,
        #[serde(default)]
        label: Option<String>,
    },
    Key {
        key: String,
        #[serde(default)]
        modifiers: Modifiers,
    },
    Wheel {
        x: f64,
        y: f64,
        delta_y: f64,
    },
    ZoomIn,
    ZoomOut,
    ToggleDraw,
    SetClass {
        class: String,
    },
    SelectBox {
        index: usize,
    },
    Deselect,
    DeleteSelected,
    NextImage,
    PrevImage,
    SelectImage {
        index: usize,
    },
    /// VOC files or directories, relative to the script's directory.
    Import {
        paths: Vec<PathBuf>,
    },
    Viewport {
        width: f64,
        height: f64,
    },
}

/// What happened during a replay.
#[derive(Clone, Debug, Default, Serialize)]
pub struct ReplayLog {
    pub steps: usize,
    /// Status line after each step that changed it.
    pub statuses: Vec<Status>,
    pub errors: usize,
    /// Number of save requests (Ctrl+S) seen.
    pub save_requests: usize,
}

impl Script {
    pub fn load(path: &Path) -> Result<Self, BoxlabelError> {
        let raw = fs::read_to_string(path)?;
        Self::parse(&raw, path)
    }

    pub fn parse(raw: &str, path: &Path) -> Result<Self, BoxlabelError> {
        serde_json::from_str(raw).map_err(|source| BoxlabelError::ScriptParse {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Runs `script` against `session`. `base_dir` resolves import paths.
pub fn replay(
    session: &mut Session,
    script: &Script,
    source: &mut dyn ImageSource,
    base_dir: &Path,
) -> ReplayLog {
    let mut log = ReplayLog::default();

    if let Some(viewport) = script.viewport {
        session.set_viewport(viewport);
    }
    fulfil_pending(session, source);

    for step in &script.steps {
        let before = session.status().clone();
        let response = apply(session, step, base_dir);
        if response.save_requested {
            log.save_requests += 1;
        }
        fulfil_pending(session, source);

        log.steps += 1;
        let after = session.status();
        if *after != before {
            if after.level == StatusLevel::Error {
                log.errors += 1;
            }
            log.statuses.push(after.clone());
        }
    }
    log
}

/// Answers the session's outstanding load ticket, if any.
pub fn fulfil_pending(session: &mut Session, source: &mut dyn ImageSource) {
    let Some(ticket) = session.pending_load().cloned() else {
        return;
    };
    match source.dimensions(&ticket.image) {
        Ok(size) => {
            session.complete_load(&ticket, size);
        }
        Err(err) => {
            session.fail_load(&ticket, &err.to_string());
        }
    }
}

fn apply(session: &mut Session, step: &Step, base_dir: &Path) -> Response {
    log::debug!("replay step: {step:?}");
    match step {
        Step::PointerDown { x, y, button } => {
            session.on_pointer_down(&PointerEvent::at(*x, *y).with_button(*button))
        }
        Step::PointerMove { x, y } => session.on_pointer_move(&PointerEvent::at(*x, *y)),
        Step::PointerUp { x, y } => session.on_pointer_up(&PointerEvent::at(*x, *y)),
        Step::PointerLeave => session.on_pointer_leave(),
        Step::DoubleClick { x, y, label } => {
            let response = session.on_double_click(&PointerEvent::at(*x, *y));
            if let (Some(request), Some(label)) = (response.label_edit.as_ref(), label) {
                session.submit_label(request, label);
            }
            response
        }
        Step::Key { key, modifiers } => session.on_key_down(&KeyEvent {
            key: key.clone(),
            modifiers: *modifiers,
        }),
        Step::Wheel { x, y, delta_y } => session.on_wheel(&WheelEvent {
            x: *x,
            y: *y,
            delta_y: *delta_y,
        }),
        Step::ZoomIn => session.zoom_in(),
        Step::ZoomOut => session.zoom_out(),
        Step::ToggleDraw => session.toggle_draw(),
        Step::SetClass { class } => {
            // A rejected class is already on the status line.
            let _ = session.set_active_class(class);
            Response::default()
        }
        Step::SelectBox { index } => {
            if let Err(err) = session.select_box(*index) {
                session.report_error(&err);
            }
            Response::default()
        }
        Step::Deselect => {
            session.deselect();
            Response::default()
        }
        Step::DeleteSelected => session.delete_selected(),
        Step::NextImage => {
            session.next_image();
            Response::default()
        }
        Step::PrevImage => {
            session.prev_image();
            Response::default()
        }
        Step::SelectImage { index } => {
            if let Err(err) = session.select_image(*index) {
                session.report_error(&err);
            }
            Response::default()
        }
        Step::Import { paths } => {
            let resolved: Vec<PathBuf> = paths.iter().map(|p| base_dir.join(p)).collect();
            let report = session.import_annotations(&resolved);
            log::info!("{report}");
            Response::default()
        }
        Step::Viewport { width, height } => {
            session.set_viewport(ViewportSize::new(*width, *height))
        }
    }
}
