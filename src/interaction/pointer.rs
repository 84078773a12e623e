//! Pointer handling: hit testing, gesture dispatch and commit.

use super::events::{Cursor, Handle, LabelEditRequest, PointerEvent, Response, StatusLevel};
use super::session::Session;
use super::state::{InteractionState, Mode};
use crate::error::BoxlabelError;
use crate::ir::{BBoxXYXY, Coord, ViewportSpace};
use crate::store::BoxEdit;

impl Session {
    /// Handle of the selected box under `point`, tested nw, ne, sw, se.
    ///
    /// The hit radius is in screen pixels and does not change with zoom.
    pub fn hit_handle(&self, point: Coord<ViewportSpace>) -> Option<Handle> {
        let image = self.current_image()?;
        let annotation = self.store.get(image, self.selection?)?;
        let rect = self.transform.bbox_to_viewport(annotation.bbox());
        let radius = self.config.handle_hit_radius();

        Handle::ALL.into_iter().find(|handle| {
            let (cx, cy) = handle.corner(rect.xmin(), rect.ymin(), rect.xmax(), rect.ymax());
            (point.x - cx).abs() < radius && (point.y - cy).abs() < radius
        })
    }

    /// Topmost (last inserted) box whose rectangle contains `point`.
    pub fn hit_box(&self, point: Coord<ViewportSpace>) -> Option<usize> {
        let image = self.current_image()?;
        self.store
            .boxes(image)
            .iter()
            .enumerate()
            .rev()
            .find(|(_, ann)| self.transform.bbox_to_viewport(ann.bbox()).contains(&point))
            .map(|(idx, _)| idx)
    }

    pub fn on_pointer_down(&mut self, event: &PointerEvent) -> Response {
        if self.loaded.is_none() || !event.is_primary() {
            return Response::ignored(self.idle_cursor());
        }
        let point = event.position();

        if let (Some(handle), Some(index)) = (self.hit_handle(point), self.selection) {
            let working = self
                .current_image()
                .and_then(|image| self.store.get(image, index))
                .map(|ann| *ann.bbox());
            self.interaction = InteractionState::begin(Mode::Resize, point);
            self.interaction.handle = Some(handle);
            self.interaction.working = working;
            self.set_status(
                StatusLevel::Info,
                format!("Resizing box {index} ({})", handle.tag()),
            );
            return Response::handled(handle.cursor());
        }

        if let Some(index) = self.hit_box(point) {
            let changed = self.selection != Some(index);
            self.selection = Some(index);
            self.interaction = InteractionState::begin(Mode::Select, point);
            self.set_status(
                StatusLevel::Info,
                format!("Box {index} selected. Drag to move or double-click to edit"),
            );
            let mut response = Response::handled(Cursor::Move);
            response.redraw = changed;
            return response;
        }

        self.selection = None;
        if self.draw_enabled {
            self.interaction = InteractionState::begin(Mode::Draw, point);
            let class = self.active_class.clone().unwrap_or_default();
            self.set_status(
                StatusLevel::Info,
                format!("Drawing new box for class: {class}"),
            );
            Response::redraw(Cursor::Crosshair)
        } else {
            self.interaction = InteractionState::begin(Mode::Pan, point);
            self.set_status(StatusLevel::Info, "Panning");
            Response::redraw(Cursor::Grab)
        }
    }

    pub fn on_pointer_move(&mut self, event: &PointerEvent) -> Response {
        let point = event.position();
        if self.loaded.is_none() {
            return Response::ignored(Cursor::Default);
        }
        if !self.interaction.is_dragging() {
            return Response::ignored(self.hover_cursor(point));
        }

        let last = self.interaction.last;
        let (dx, dy) = (point.x - last.x, point.y - last.y);
        let scale = self.transform.scale();

        let response = match self.interaction.mode {
            Mode::Draw => Response::redraw(Cursor::Crosshair),
            Mode::Resize => {
                self.interaction.drag_corner(self.transform.to_image(point));
                let cursor = self
                    .interaction
                    .handle
                    .map_or(Cursor::Move, Handle::cursor);
                Response::redraw(cursor)
            }
            Mode::Select => {
                let travelled = point.distance_to(&self.interaction.anchor);
                if travelled > self.config.drag_threshold_px {
                    self.promote_to_move();
                    self.interaction.translate_working(dx / scale, dy / scale);
                    Response::redraw(Cursor::Move)
                } else {
                    Response::handled(Cursor::Move)
                }
            }
            Mode::Move => {
                self.interaction.translate_working(dx / scale, dy / scale);
                Response::redraw(Cursor::Move)
            }
            Mode::Pan => {
                self.transform.pan_by(dx, dy);
                Response::redraw(Cursor::Grabbing)
            }
            Mode::Idle => Response::ignored(self.idle_cursor()),
        };

        self.interaction.last = point;
        response
    }

    pub fn on_pointer_up(&mut self, event: &PointerEvent) -> Response {
        if !self.interaction.is_dragging() || !event.is_primary() {
            return Response::ignored(self.idle_cursor());
        }
        self.commit_gesture(event.position())
    }

    /// Leaving the canvas mid-gesture commits at the last known position.
    pub fn on_pointer_leave(&mut self) -> Response {
        if !self.interaction.is_dragging() {
            return Response::ignored(Cursor::Default);
        }
        log::debug!("pointer left the canvas while dragging; committing");
        let last = self.interaction.last;
        let mut response = self.commit_gesture(last);
        response.cursor = Cursor::Default;
        response
    }

    /// Requests a label edit when the selected box is double-clicked.
    pub fn on_double_click(&mut self, event: &PointerEvent) -> Response {
        if self.loaded.is_none() || !event.is_primary() {
            return Response::ignored(self.idle_cursor());
        }
        let hit = self.hit_box(event.position());
        let (Some(index), Some(image)) = (hit, self.current_image()) else {
            return Response::ignored(self.idle_cursor());
        };
        if self.selection != Some(index) {
            return Response::ignored(self.idle_cursor());
        }
        let Some(annotation) = self.store.get(image, index) else {
            return Response::ignored(self.idle_cursor());
        };

        let request = LabelEditRequest {
            image: image.to_string(),
            index,
            current: annotation.label().to_string(),
        };
        Response {
            handled: true,
            cursor: Cursor::Move,
            label_edit: Some(request),
            ..Default::default()
        }
    }

    fn hover_cursor(&self, point: Coord<ViewportSpace>) -> Cursor {
        if let Some(handle) = self.hit_handle(point) {
            handle.cursor()
        } else if self.hit_box(point).is_some() {
            Cursor::Move
        } else {
            self.idle_cursor()
        }
    }

    fn promote_to_move(&mut self) {
        let working = self
            .current_image()
            .zip(self.selection)
            .and_then(|(image, index)| self.store.get(image, index))
            .map(|ann| *ann.bbox());
        self.interaction.mode = Mode::Move;
        self.interaction.working = working;
        if let Some(index) = self.selection {
            self.set_status(StatusLevel::Info, format!("Moving box {index}"));
        }
    }

    fn commit_gesture(&mut self, end: Coord<ViewportSpace>) -> Response {
        let state = std::mem::take(&mut self.interaction);
        let image = self.current_image().unwrap_or_default().to_string();

        match state.mode {
            Mode::Draw => self.commit_draw(&image, state.anchor, end),
            Mode::Resize => {
                if let (Some(index), Some(working)) = (self.selection, state.working) {
                    match self.store.transform_box(&image, index, BoxEdit::Resize(working)) {
                        Ok(_) => self.set_status(StatusLevel::Info, format!("Box {index} resized")),
                        Err(err) => self.set_status(
                            StatusLevel::Error,
                            format!("Error: resize discarded: {err}"),
                        ),
                    }
                }
            }
            Mode::Move => {
                if let Some(index) = self.selection {
                    let (dx, dy) = state.offset;
                    match self.store.transform_box(&image, index, BoxEdit::Translate { dx, dy }) {
                        Ok(_) => self.set_status(StatusLevel::Info, format!("Box {index} moved")),
                        Err(err) => self.set_status(
                            StatusLevel::Error,
                            format!("Error: move discarded: {err}"),
                        ),
                    }
                }
            }
            Mode::Pan => {
                if let Some(index) = self.current {
                    self.set_status(
                        StatusLevel::Info,
                        format!("Showing {image} ({}/{})", index + 1, self.images.len()),
                    );
                }
            }
            Mode::Select => {
                if let Some(index) = self.selection {
                    self.set_status(StatusLevel::Info, format!("Box {index} selected"));
                }
            }
            Mode::Idle => {}
        }

        Response::redraw(self.idle_cursor())
    }

    fn commit_draw(
        &mut self,
        image: &str,
        anchor: Coord<ViewportSpace>,
        end: Coord<ViewportSpace>,
    ) {
        let min = self.config.min_box_size_px;
        if (end.x - anchor.x).abs() < min || (end.y - anchor.y).abs() < min {
            self.set_status(StatusLevel::Warning, "Draw cancelled (box too small)");
            return;
        }
        let Some(class) = self.active_class.clone() else {
            self.report_error(&BoxlabelError::NoActiveClass);
            return;
        };

        let rect = BBoxXYXY::from_corners(
            self.transform.to_image(anchor),
            self.transform.to_image(end),
        );
        match self.store.add_box(image, rect, &class) {
            Ok(index) => {
                self.selection = Some(index);
                self.set_status(
                    StatusLevel::Info,
                    format!("Added box {index} ('{class}')"),
                );
            }
            Err(err) => self.report_error(&err),
        }
    }
}
