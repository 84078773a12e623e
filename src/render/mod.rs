//! Frame composition.
//!
//! [`compose`] turns a [`Scene`] into a [`Frame`]: an ordered display list
//! of draw commands. Painting that list onto a [`Surface`] is the only
//! place a drawing backend is touched. Box outlines, fills and label tags
//! are in image space and follow the transform; the draw preview and the
//! resize handles are in screen space and keep a fixed size at every zoom.

mod raster;

pub use raster::PixmapSurface;

use serde::Serialize;

use crate::interaction::Session;
use crate::ir::{BBoxXYXY, Coord, ImageSize, ImageSpace, ViewportSize, ViewportSpace};
use crate::view::Transform;

/// Straight (non-premultiplied) RGBA color.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Color(pub [u8; 4]);

impl Color {
    pub const BOX: Color = Color([255, 0, 0, 255]);
    pub const BOX_FILL: Color = Color([255, 0, 0, 26]);
    pub const BOX_TAG: Color = Color([200, 0, 0, 230]);
    pub const SELECTED: Color = Color([0, 255, 255, 255]);
    pub const SELECTED_FILL: Color = Color([0, 255, 255, 38]);
    pub const SELECTED_TAG: Color = Color([0, 200, 200, 230]);
    pub const PREVIEW: Color = Color([0, 0, 255, 204]);
    pub const HANDLE: Color = Color([0, 255, 255, 204]);
    pub const HANDLE_BORDER: Color = Color([0, 0, 0, 255]);
    pub const TEXT: Color = Color([255, 255, 255, 255]);
}

/// Screen-pixel stroke widths; box strokes are divided by the zoom.
const BOX_LINE_WIDTH: f64 = 1.5;
const SELECTED_LINE_WIDTH: f64 = 2.5;
const PREVIEW_DASH: [f64; 2] = [3.0, 3.0];
/// Image smoothing is turned off from this zoom level on.
const PIXELATED_ZOOM: f64 = 3.0;

/// One box as the renderer sees it.
#[derive(Clone, Debug, PartialEq)]
pub struct BoxView<'a> {
    pub label: &'a str,
    pub bbox: BBoxXYXY<ImageSpace>,
}

/// Everything a frame depends on.
#[derive(Clone, Debug)]
pub struct Scene<'a> {
    pub viewport: ViewportSize,
    /// `None` until the current image has been decoded.
    pub image: Option<ImageSize>,
    pub transform: Transform,
    pub boxes: Vec<BoxView<'a>>,
    pub selected: Option<usize>,
    pub preview: Option<BBoxXYXY<ViewportSpace>>,
    pub handle_size: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum DrawCommand {
    Clear,
    Image {
        size: ImageSize,
        smoothing: bool,
    },
    BoxFill {
        rect: BBoxXYXY<ImageSpace>,
        color: Color,
    },
    /// `line_width` is in image pixels.
    BoxStroke {
        rect: BBoxXYXY<ImageSpace>,
        color: Color,
        line_width: f64,
    },
    /// Label tag anchored at the top-left corner of a box, image units.
    LabelTag {
        origin: Coord<ImageSpace>,
        text: String,
        font_size: f64,
        padding: f64,
        background: Color,
        color: Color,
    },
    ScreenRect {
        rect: BBoxXYXY<ViewportSpace>,
        fill: Option<Color>,
        stroke: Option<Color>,
        line_width: f64,
        dash: Option<[f64; 2]>,
    },
}

/// A composed frame.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Frame {
    pub viewport: ViewportSize,
    pub transform: Transform,
    pub commands: Vec<DrawCommand>,
}

/// Drawing backend.
///
/// All coordinates are viewport pixels; a surface applies its own device
/// pixel ratio.
pub trait Surface {
    fn clear(&mut self);
    fn draw_image(&mut self, transform: &Transform, smoothing: bool);
    fn fill_rect(&mut self, rect: BBoxXYXY<ViewportSpace>, color: Color);
    fn stroke_rect(
        &mut self,
        rect: BBoxXYXY<ViewportSpace>,
        color: Color,
        line_width: f64,
        dash: Option<[f64; 2]>,
    );
    fn fill_text(&mut self, origin: Coord<ViewportSpace>, text: &str, font_size: f64, color: Color);

    /// Advance width of `text`, in viewport pixels.
    fn measure_text(&self, text: &str, font_size: f64) -> f64 {
        text.chars().count() as f64 * font_size * 0.6
    }
}

/// Builds the display list for one scene.
pub fn compose(scene: &Scene<'_>) -> Frame {
    let mut commands = vec![DrawCommand::Clear];
    let transform = scene.transform;

    let Some(size) = scene.image else {
        return Frame {
            viewport: scene.viewport,
            transform,
            commands,
        };
    };

    let scale = transform.scale();
    commands.push(DrawCommand::Image {
        size,
        smoothing: scale < PIXELATED_ZOOM,
    });

    for (index, view) in scene.boxes.iter().enumerate() {
        let rect = view.bbox.normalized();
        if rect.width() <= 0.0 || rect.height() <= 0.0 {
            continue;
        }
        let selected = scene.selected == Some(index);
        let (stroke, fill, tag, width) = if selected {
            (Color::SELECTED, Color::SELECTED_FILL, Color::SELECTED_TAG, SELECTED_LINE_WIDTH)
        } else {
            (Color::BOX, Color::BOX_FILL, Color::BOX_TAG, BOX_LINE_WIDTH)
        };

        commands.push(DrawCommand::BoxFill { rect, color: fill });
        commands.push(DrawCommand::BoxStroke {
            rect,
            color: stroke,
            line_width: width / scale,
        });
        commands.push(DrawCommand::LabelTag {
            origin: rect.min,
            text: view.label.to_string(),
            font_size: (10.0 / scale).max(8.0),
            padding: 2.0 / scale,
            background: tag,
            color: Color::TEXT,
        });
    }

    if let Some(preview) = scene.preview {
        commands.push(DrawCommand::ScreenRect {
            rect: preview,
            fill: None,
            stroke: Some(Color::PREVIEW),
            line_width: 1.0,
            dash: Some(PREVIEW_DASH),
        });
    }

    if let Some(view) = scene.selected.and_then(|idx| scene.boxes.get(idx)) {
        let rect = transform.bbox_to_viewport(&view.bbox);
        let half = scene.handle_size / 2.0;
        for (x, y) in [
            (rect.xmin(), rect.ymin()),
            (rect.xmax(), rect.ymin()),
            (rect.xmin(), rect.ymax()),
            (rect.xmax(), rect.ymax()),
        ] {
            commands.push(DrawCommand::ScreenRect {
                rect: BBoxXYXY::from_xyxy(x - half, y - half, x + half, y + half),
                fill: Some(Color::HANDLE),
                stroke: Some(Color::HANDLE_BORDER),
                line_width: 1.0,
                dash: None,
            });
        }
    }

    Frame {
        viewport: scene.viewport,
        transform,
        commands,
    }
}

impl Frame {
    /// Replays the display list onto a surface.
    pub fn paint<S: Surface + ?Sized>(&self, surface: &mut S) {
        let transform = &self.transform;
        let scale = transform.scale();

        for command in &self.commands {
            match command {
                DrawCommand::Clear => surface.clear(),
                DrawCommand::Image { smoothing, .. } => surface.draw_image(transform, *smoothing),
                DrawCommand::BoxFill { rect, color } => {
                    surface.fill_rect(transform.bbox_to_viewport(rect), *color)
                }
                DrawCommand::BoxStroke {
                    rect,
                    color,
                    line_width,
                } => surface.stroke_rect(
                    transform.bbox_to_viewport(rect),
                    *color,
                    line_width * scale,
                    None,
                ),
                DrawCommand::LabelTag {
                    origin,
                    text,
                    font_size,
                    padding,
                    background,
                    color,
                } => {
                    let at = transform.to_viewport(*origin);
                    let font_px = font_size * scale;
                    let pad_px = padding * scale;
                    let width = surface.measure_text(text, font_px) + pad_px * 2.0;
                    let height = font_px * 1.2 + pad_px;
                    surface.fill_rect(
                        BBoxXYXY::from_xyxy(at.x, at.y, at.x + width, at.y + height),
                        *background,
                    );
                    surface.fill_text(at.offset(pad_px, pad_px / 2.0), text, font_px, *color);
                }
                DrawCommand::ScreenRect {
                    rect,
                    fill,
                    stroke,
                    line_width,
                    dash,
                } => {
                    if let Some(fill) = fill {
                        surface.fill_rect(*rect, *fill);
                    }
                    if let Some(stroke) = stroke {
                        surface.stroke_rect(*rect, *stroke, *line_width, *dash);
                    }
                }
            }
        }
    }
}

impl Session {
    /// Snapshot of what should be on screen now.
    ///
    /// The selected box shows its uncommitted geometry while it is being
    /// resized or moved.
    pub fn scene(&self) -> Scene<'_> {
        let boxes = self
            .current_image()
            .map(|image| self.store().boxes(image))
            .unwrap_or(&[])
            .iter()
            .enumerate()
            .map(|(index, ann)| {
                let bbox = match self.interaction().working() {
                    Some(working) if self.selection() == Some(index) => *working,
                    _ => *ann.bbox(),
                };
                BoxView {
                    label: ann.label(),
                    bbox,
                }
            })
            .collect();

        Scene {
            viewport: self.viewport(),
            image: self.loaded_size(),
            transform: *self.transform(),
            boxes,
            selected: self.selection(),
            preview: self.interaction().preview(),
            handle_size: self.config().handle_size,
        }
    }

    pub fn frame(&self) -> Frame {
        compose(&self.scene())
    }
}
