//! The session context: image list, load tickets, view and mode state.

use std::path::Path;

use serde::Serialize;

use super::events::{
    Command, Cursor, KeyEvent, LabelEditRequest, Response, Status, StatusLevel, WheelEvent,
};
use super::state::InteractionState;
use crate::config::EditorConfig;
use crate::error::BoxlabelError;
use crate::import;
use crate::ir::{normalize_label, Coord, ImageSize, KnownClasses, ViewportSize, ViewportSpace};
use crate::report::{IssueCode, Report};
use crate::store::AnnotationStore;
use crate::view::Transform;

/// Identifies one image load request.
///
/// The shell decodes `image` and hands the ticket back to
/// [`Session::complete_load`] or [`Session::fail_load`]. Only the newest
/// ticket is honoured.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct LoadTicket {
    pub token: u64,
    pub index: usize,
    pub image: String,
}

/// All editor state for one user session.
#[derive(Debug)]
pub struct Session {
    pub(crate) config: EditorConfig,
    pub(crate) store: AnnotationStore,
    pub(crate) images: Vec<String>,
    pub(crate) current: Option<usize>,
    /// Dimensions of the current image once it has been decoded.
    pub(crate) loaded: Option<ImageSize>,
    pub(crate) pending: Option<LoadTicket>,
    next_token: u64,
    pub(crate) viewport: ViewportSize,
    pub(crate) transform: Transform,
    pub(crate) draw_enabled: bool,
    pub(crate) active_class: Option<String>,
    pub(crate) selection: Option<usize>,
    pub(crate) interaction: InteractionState,
    pub(crate) status: Status,
}

impl Session {
    pub fn new(config: EditorConfig) -> Self {
        let store = AnnotationStore::new(KnownClasses::with_vocabulary(&config.classes));
        let transform = Transform::from_config(&config);
        let mut session = Self {
            config,
            store,
            images: Vec::new(),
            current: None,
            loaded: None,
            pending: None,
            next_token: 0,
            viewport: ViewportSize::new(800.0, 600.0),
            transform,
            draw_enabled: false,
            active_class: None,
            selection: None,
            interaction: InteractionState::default(),
            status: Status::info("Open images to start"),
        };
        session.refresh_active_class();
        session
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn store(&self) -> &AnnotationStore {
        &self.store
    }

    pub fn images(&self) -> &[String] {
        &self.images
    }

    pub fn current_index(&self) -> Option<usize> {
        self.current
    }

    pub fn current_image(&self) -> Option<&str> {
        self.current
            .and_then(|idx| self.images.get(idx))
            .map(String::as_str)
    }

    /// Dimensions of the current image, once decoded.
    pub fn loaded_size(&self) -> Option<ImageSize> {
        self.loaded
    }

    pub fn pending_load(&self) -> Option<&LoadTicket> {
        self.pending.as_ref()
    }

    pub fn viewport(&self) -> ViewportSize {
        self.viewport
    }

    pub fn transform(&self) -> &Transform {
        &self.transform
    }

    pub fn draw_enabled(&self) -> bool {
        self.draw_enabled
    }

    pub fn active_class(&self) -> Option<&str> {
        self.active_class.as_deref()
    }

    pub fn selection(&self) -> Option<usize> {
        self.selection
    }

    pub fn interaction(&self) -> &InteractionState {
        &self.interaction
    }

    pub fn status(&self) -> &Status {
        &self.status
    }

    pub(crate) fn set_status(&mut self, level: StatusLevel, message: impl Into<String>) {
        let message = message.into();
        match level {
            StatusLevel::Info => log::debug!("status: {message}"),
            StatusLevel::Warning | StatusLevel::Error => log::warn!("status: {message}"),
        }
        self.status = Status { level, message };
    }

    pub(crate) fn report_error(&mut self, err: &BoxlabelError) {
        self.set_status(StatusLevel::Error, format!("Error: {err}"));
    }

    // ---- image set and navigation ----

    /// Replaces the image set and clears all annotations.
    ///
    /// Returns the load request for the first image.
    pub fn open_images<I, S>(&mut self, names: I) -> Option<LoadTicket>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut names: Vec<String> = names.into_iter().map(Into::into).collect();
        if names.is_empty() {
            return None;
        }
        names.sort();
        names.dedup();

        self.images = names;
        self.store.clear();
        self.refresh_active_class();
        log::info!("opened {} image(s)", self.images.len());
        let ticket = self.switch_to(0);
        self.set_status(
            StatusLevel::Info,
            format!("Loaded {} new image(s)", self.images.len()),
        );
        Some(ticket)
    }

    /// Adds images to the set, skipping names already present.
    ///
    /// The current image stays selected when it is still in the set, in
    /// which case nothing is reloaded and `None` is returned.
    pub fn add_images<I, S>(&mut self, names: I) -> Option<LoadTicket>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let current_name = self.current_image().map(str::to_string);
        let mut added = 0;
        for name in names {
            let name = name.into();
            if self.images.contains(&name) {
                log::warn!("image '{name}' is already in the list, skipping");
                continue;
            }
            self.images.push(name);
            added += 1;
        }

        if added == 0 {
            self.set_status(
                StatusLevel::Warning,
                "No new images added (possibly duplicates)",
            );
            return None;
        }
        self.images.sort();

        let total = self.images.len();
        match current_name.and_then(|name| self.images.iter().position(|n| *n == name)) {
            Some(idx) => {
                self.current = Some(idx);
                let name = self.images[idx].clone();
                self.set_status(
                    StatusLevel::Info,
                    format!("{added} image(s) added. Total: {total}. Current image: {name}"),
                );
                None
            }
            None => {
                let ticket = self.switch_to(0);
                self.set_status(
                    StatusLevel::Info,
                    format!("{added} image(s) added. Total: {total}. Showing the first image"),
                );
                Some(ticket)
            }
        }
    }

    pub fn next_image(&mut self) -> Option<LoadTicket> {
        let idx = self.current?;
        (idx + 1 < self.images.len()).then(|| self.switch_to(idx + 1))
    }

    pub fn prev_image(&mut self) -> Option<LoadTicket> {
        let idx = self.current?;
        (idx > 0).then(|| self.switch_to(idx - 1))
    }

    pub fn select_image(&mut self, index: usize) -> Result<LoadTicket, BoxlabelError> {
        if index >= self.images.len() {
            return Err(BoxlabelError::NotFound {
                image: "<image list>".to_string(),
                index,
            });
        }
        Ok(self.switch_to(index))
    }

    fn switch_to(&mut self, index: usize) -> LoadTicket {
        self.current = Some(index);
        self.loaded = None;
        self.selection = None;
        self.interaction.reset();
        self.transform.reset();

        self.next_token += 1;
        let ticket = LoadTicket {
            token: self.next_token,
            index,
            image: self.images[index].clone(),
        };
        log::debug!("load request {} for '{}'", ticket.token, ticket.image);
        self.set_status(StatusLevel::Info, format!("Loading {}...", ticket.image));
        self.pending = Some(ticket.clone());
        ticket
    }

    fn accept(&self, ticket: &LoadTicket) -> Result<(), BoxlabelError> {
        let matches_request = self.pending.as_ref() == Some(ticket);
        let matches_current = self.current_image() == Some(ticket.image.as_str());
        if matches_request && matches_current {
            Ok(())
        } else {
            Err(BoxlabelError::AsyncStale)
        }
    }

    /// Finishes a load. Returns false for a superseded ticket, which is
    /// dropped without touching any state.
    pub fn complete_load(&mut self, ticket: &LoadTicket, size: ImageSize) -> bool {
        if let Err(err) = self.accept(ticket) {
            log::debug!("dropping load {} for '{}': {err}", ticket.token, ticket.image);
            return false;
        }
        self.pending = None;

        if !size.is_valid() {
            self.loaded = None;
            self.report_error(&BoxlabelError::InvalidDimensions {
                width: size.width,
                height: size.height,
            });
            return true;
        }

        self.store.set_dimensions(&ticket.image, size);
        self.loaded = Some(size);
        self.transform.reset();
        self.transform.fit_to_viewport(size, self.viewport);
        self.set_status(
            StatusLevel::Info,
            format!(
                "Showing {} ({}/{})",
                ticket.image,
                self.current.unwrap_or(ticket.index) + 1,
                self.images.len()
            ),
        );
        true
    }

    /// Reports a decode failure for the current image.
    pub fn fail_load(&mut self, ticket: &LoadTicket, message: &str) -> bool {
        if let Err(err) = self.accept(ticket) {
            log::debug!("dropping failed load {} for '{}': {err}", ticket.token, ticket.image);
            return false;
        }
        self.pending = None;
        self.loaded = None;
        self.set_status(
            StatusLevel::Error,
            format!("Error loading image {}: {message}", ticket.image),
        );
        true
    }

    /// Caches the dimensions of an image that is not on screen.
    pub fn record_dimensions(&mut self, image: &str, size: ImageSize) {
        if size.is_valid() {
            self.store.set_dimensions(image, size);
        }
    }

    /// Resizes the viewport and re-fits the current image.
    pub fn set_viewport(&mut self, size: ViewportSize) -> Response {
        self.viewport = size;
        match self.loaded {
            Some(image) => {
                self.transform.fit_to_viewport(image, size);
                Response::redraw(self.idle_cursor())
            }
            None => Response::ignored(self.idle_cursor()),
        }
    }

    // ---- modes and controls ----

    pub fn toggle_draw(&mut self) -> Response {
        if self.loaded.is_none() {
            return Response::ignored(Cursor::Default);
        }
        self.draw_enabled = !self.draw_enabled;
        self.selection = None;
        self.interaction.reset();
        let message = if self.draw_enabled {
            "Draw mode on"
        } else {
            "Draw mode off"
        };
        self.set_status(StatusLevel::Info, message);
        Response::redraw(self.idle_cursor())
    }

    /// Chooses the class used for new boxes.
    pub fn set_active_class(&mut self, class: &str) -> Result<(), BoxlabelError> {
        let class = normalize_label(class);
        if !self.store.classes().contains(&class) {
            let err = BoxlabelError::InvalidClass { label: class };
            self.report_error(&err);
            return Err(err);
        }
        self.active_class = Some(class);
        Ok(())
    }

    /// Keeps the active class if still known, else falls back to the first
    /// class in sorted order.
    pub(crate) fn refresh_active_class(&mut self) {
        let keep = self
            .active_class
            .as_deref()
            .is_some_and(|class| self.store.classes().contains(class));
        if !keep {
            self.active_class = self.store.classes().first().map(str::to_string);
        }
    }

    pub fn zoom_in(&mut self) -> Response {
        let pivot = self.viewport_center();
        self.zoom_by(self.config.zoom_step, pivot)
    }

    pub fn zoom_out(&mut self) -> Response {
        let pivot = self.viewport_center();
        self.zoom_by(1.0 / self.config.zoom_step, pivot)
    }

    pub fn on_wheel(&mut self, event: &WheelEvent) -> Response {
        let factor = if event.delta_y > 0.0 {
            1.0 / self.config.zoom_step
        } else {
            self.config.zoom_step
        };
        self.zoom_by(factor, Coord::new(event.x, event.y))
    }

    fn zoom_by(&mut self, factor: f64, pivot: Coord<ViewportSpace>) -> Response {
        if self.loaded.is_none() || !self.transform.zoom_at(factor, pivot) {
            return Response::ignored(self.idle_cursor());
        }
        log::debug!("zoom {:.3}x", self.transform.scale());
        Response::redraw(self.idle_cursor())
    }

    fn viewport_center(&self) -> Coord<ViewportSpace> {
        Coord::new(self.viewport.width / 2.0, self.viewport.height / 2.0)
    }

    /// Selects a box from the annotation list.
    pub fn select_box(&mut self, index: usize) -> Result<(), BoxlabelError> {
        let image = self.current_image().unwrap_or_default().to_string();
        let Some(annotation) = self.store.get(&image, index) else {
            return Err(BoxlabelError::NotFound { image, index });
        };
        let message = format!("Box {index} ('{}') selected", annotation.label());
        self.selection = Some(index);
        self.set_status(StatusLevel::Info, message);
        Ok(())
    }

    pub fn deselect(&mut self) {
        self.selection = None;
    }

    pub fn delete_selected(&mut self) -> Response {
        let (Some(image), Some(index)) = (self.current_image().map(str::to_string), self.selection)
        else {
            self.set_status(StatusLevel::Warning, "No box selected to delete");
            return Response::ignored(self.idle_cursor());
        };
        match self.store.delete_box(&image, index) {
            Ok(removed) => {
                self.selection = None;
                self.set_status(
                    StatusLevel::Info,
                    format!("Box {index} ('{}') deleted", removed.label()),
                );
                Response::redraw(self.idle_cursor())
            }
            Err(err) => {
                self.selection = None;
                self.report_error(&err);
                Response::ignored(self.idle_cursor())
            }
        }
    }

    /// Applies the shell's answer to a [`LabelEditRequest`].
    ///
    /// Returns true when the label changed. A request for an image or box
    /// that is no longer selected is dropped.
    pub fn submit_label(&mut self, request: &LabelEditRequest, new_label: &str) -> bool {
        let still_current = self.current_image() == Some(request.image.as_str())
            && self.selection == Some(request.index);
        if !still_current {
            log::debug!("dropping label edit: {}", BoxlabelError::AsyncStale);
            return false;
        }

        match self
            .store
            .update_label(&request.image, request.index, new_label)
        {
            Ok(true) => {
                let label = self
                    .store
                    .get(&request.image, request.index)
                    .map(|a| a.label().to_string())
                    .unwrap_or_default();
                self.set_status(
                    StatusLevel::Info,
                    format!("Class of box {} changed to '{label}'", request.index),
                );
                true
            }
            Ok(false) => false,
            Err(err) => {
                self.report_error(&err);
                false
            }
        }
    }

    pub fn on_key_down(&mut self, event: &KeyEvent) -> Response {
        let Some(command) = event.command() else {
            return Response::ignored(self.idle_cursor());
        };
        self.run_command(command)
    }

    /// Runs a command if its control is enabled in the current state.
    pub fn run_command(&mut self, command: Command) -> Response {
        let has_image = self.loaded.is_some();
        let idle = self.idle_cursor();
        match command {
            Command::PrevImage => match self.prev_image() {
                Some(_) => Response::redraw(Cursor::Default),
                None => Response::ignored(idle),
            },
            Command::NextImage => match self.next_image() {
                Some(_) => Response::redraw(Cursor::Default),
                None => Response::ignored(idle),
            },
            Command::DeleteSelected if has_image && self.selection.is_some() => {
                self.delete_selected()
            }
            Command::ZoomIn if has_image => self.zoom_in(),
            Command::ZoomOut if has_image => self.zoom_out(),
            Command::ToggleDraw => self.toggle_draw(),
            Command::Escape => self.escape(),
            Command::Save => {
                if self.store.total_boxes() > 0 {
                    Response {
                        handled: true,
                        save_requested: true,
                        cursor: idle,
                        ..Default::default()
                    }
                } else {
                    self.set_status(StatusLevel::Warning, "Nothing to save");
                    Response::ignored(idle)
                }
            }
            _ => Response::ignored(idle),
        }
    }

    /// Cancels the active gesture, else deselects, else leaves draw mode.
    pub fn escape(&mut self) -> Response {
        if self.interaction.is_dragging() {
            let mode = self.interaction.mode();
            self.interaction.reset();
            self.set_status(StatusLevel::Info, format!("{mode:?} cancelled"));
            return Response::redraw(self.idle_cursor());
        }
        if self.selection.is_some() {
            self.selection = None;
            self.set_status(StatusLevel::Info, "Box deselected");
            return Response::redraw(self.idle_cursor());
        }
        if self.draw_enabled {
            return self.toggle_draw();
        }
        Response::ignored(self.idle_cursor())
    }

    /// Imports Pascal VOC files into the loaded image set.
    pub fn import_annotations(&mut self, paths: &[impl AsRef<Path>]) -> Report {
        if self.images.is_empty() {
            self.set_status(StatusLevel::Warning, "Load images before importing annotations");
            return Report::new("import");
        }
        let report = import::import_voc_files(&mut self.store, &self.images, paths);
        self.refresh_active_class();
        if let Some(sel) = self.selection {
            let image = self.current_image().unwrap_or_default();
            if self.store.get(image, sel).is_none() {
                self.selection = None;
            }
        }
        let failed = report.count_of(IssueCode::DecodeFailure);
        self.set_status(
            StatusLevel::Info,
            format!(
                "XML files loaded. {} image(s) updated. Errors: {failed}",
                report.processed
            ),
        );
        report
    }

    /// `"<i>: <label> (x1,y1)-(x2,y2)"` for each box of the current image.
    pub fn annotation_list(&self) -> Vec<String> {
        let Some(image) = self.current_image() else {
            return Vec::new();
        };
        self.store
            .boxes(image)
            .iter()
            .enumerate()
            .map(|(i, ann)| format!("{i}: {}", ann.summary()))
            .collect()
    }

    /// `"<name> (i/n) Z:1.00x"`, or `None` before an image is shown.
    pub fn image_info(&self) -> Option<String> {
        self.loaded?;
        let name = self.current_image()?;
        Some(format!(
            "{name} ({}/{}) Z:{:.2}x",
            self.current? + 1,
            self.images.len(),
            self.transform.scale()
        ))
    }

    pub(crate) fn idle_cursor(&self) -> Cursor {
        if self.draw_enabled {
            Cursor::Crosshair
        } else {
            Cursor::Grab
        }
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new(EditorConfig::default())
    }
}
