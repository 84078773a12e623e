//! Offscreen raster surface backed by tiny-skia.

use image::RgbaImage;
use tiny_skia::{
    FilterQuality, IntSize, Paint, PathBuilder, Pixmap, PixmapPaint, Stroke, StrokeDash,
};

use super::{Color, Surface};
use crate::error::BoxlabelError;
use crate::ir::{BBoxXYXY, Coord, ViewportSize, ViewportSpace};
use crate::view::Transform;

const BACKGROUND: [u8; 4] = [32, 32, 32, 255];

/// Paints frames into a pixmap sized `viewport * dpr`.
///
/// Text is not rasterized: label tags keep their background only.
pub struct PixmapSurface {
    pixmap: Pixmap,
    source: Option<Pixmap>,
    dpr: f32,
}

impl PixmapSurface {
    pub fn new(
        viewport: ViewportSize,
        dpr: f64,
        source: Option<&RgbaImage>,
    ) -> Result<Self, BoxlabelError> {
        let dpr = if dpr.is_finite() && dpr > 0.0 { dpr } else { 1.0 };
        let width = (viewport.width * dpr).ceil();
        let height = (viewport.height * dpr).ceil();
        let pixmap = Pixmap::new(width as u32, height as u32).ok_or(
            BoxlabelError::InvalidDimensions {
                width: width as u32,
                height: height as u32,
            },
        )?;

        let source = match source {
            Some(img) => {
                let (w, h) = img.dimensions();
                let size = IntSize::from_wh(w, h)
                    .ok_or(BoxlabelError::InvalidDimensions { width: w, height: h })?;
                Some(premultiplied(img, size)?)
            }
            None => None,
        };

        Ok(Self {
            pixmap,
            source,
            dpr: dpr as f32,
        })
    }

    pub fn width(&self) -> u32 {
        self.pixmap.width()
    }

    pub fn height(&self) -> u32 {
        self.pixmap.height()
    }

    /// Converts the painted pixmap back to straight RGBA.
    pub fn into_image(self) -> RgbaImage {
        let (width, height) = (self.pixmap.width(), self.pixmap.height());
        let mut out = RgbaImage::new(width, height);
        for (dst, src) in out.pixels_mut().zip(self.pixmap.pixels()) {
            let c = src.demultiply();
            dst.0 = [c.red(), c.green(), c.blue(), c.alpha()];
        }
        out
    }

    fn device_rect(&self, rect: &BBoxXYXY<ViewportSpace>) -> Option<tiny_skia::Rect> {
        let r = rect.normalized();
        tiny_skia::Rect::from_ltrb(
            (r.xmin() as f32) * self.dpr,
            (r.ymin() as f32) * self.dpr,
            (r.xmax() as f32) * self.dpr,
            (r.ymax() as f32) * self.dpr,
        )
    }
}

fn premultiplied(img: &RgbaImage, size: IntSize) -> Result<Pixmap, BoxlabelError> {
    let mut pixmap = Pixmap::new(size.width(), size.height()).ok_or(
        BoxlabelError::InvalidDimensions {
            width: size.width(),
            height: size.height(),
        },
    )?;
    for (dst, src) in pixmap.pixels_mut().iter_mut().zip(img.pixels()) {
        let [r, g, b, a] = src.0;
        *dst = tiny_skia::ColorU8::from_rgba(r, g, b, a).premultiply();
    }
    Ok(pixmap)
}

fn paint_for(color: Color) -> Paint<'static> {
    let [r, g, b, a] = color.0;
    let mut paint = Paint::default();
    paint.set_color_rgba8(r, g, b, a);
    paint.anti_alias = true;
    paint
}

impl Surface for PixmapSurface {
    fn clear(&mut self) {
        let [r, g, b, a] = BACKGROUND;
        self.pixmap.fill(tiny_skia::Color::from_rgba8(r, g, b, a));
    }

    fn draw_image(&mut self, transform: &Transform, smoothing: bool) {
        let Some(source) = self.source.as_ref() else {
            log::trace!("no source image attached; skipping image layer");
            return;
        };
        let scale = transform.scale() as f32 * self.dpr;
        let (pan_x, pan_y) = transform.pan();
        let placement = tiny_skia::Transform::from_row(
            scale,
            0.0,
            0.0,
            scale,
            pan_x as f32 * self.dpr,
            pan_y as f32 * self.dpr,
        );
        let paint = PixmapPaint {
            quality: if smoothing {
                FilterQuality::Bilinear
            } else {
                FilterQuality::Nearest
            },
            ..Default::default()
        };
        self.pixmap
            .draw_pixmap(0, 0, source.as_ref(), &paint, placement, None);
    }

    fn fill_rect(&mut self, rect: BBoxXYXY<ViewportSpace>, color: Color) {
        if let Some(rect) = self.device_rect(&rect) {
            self.pixmap.fill_rect(
                rect,
                &paint_for(color),
                tiny_skia::Transform::identity(),
                None,
            );
        }
    }

    fn stroke_rect(
        &mut self,
        rect: BBoxXYXY<ViewportSpace>,
        color: Color,
        line_width: f64,
        dash: Option<[f64; 2]>,
    ) {
        let Some(rect) = self.device_rect(&rect) else {
            return;
        };
        let path = PathBuilder::from_rect(rect);
        let stroke = Stroke {
            width: line_width as f32 * self.dpr,
            dash: dash.and_then(|[on, off]| {
                StrokeDash::new(vec![on as f32 * self.dpr, off as f32 * self.dpr], 0.0)
            }),
            ..Default::default()
        };
        self.pixmap.stroke_path(
            &path,
            &paint_for(color),
            &stroke,
            tiny_skia::Transform::identity(),
            None,
        );
    }

    fn fill_text(&mut self, _origin: Coord<ViewportSpace>, text: &str, _size: f64, _c: Color) {
        log::trace!("text rasterization unavailable; skipping label {text:?}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::{compose, BoxView, Scene};
    use crate::ir::ImageSize;

    fn white_image(w: u32, h: u32) -> RgbaImage {
        RgbaImage::from_pixel(w, h, image::Rgba([255, 255, 255, 255]))
    }

    #[test]
    fn surface_is_scaled_by_device_pixel_ratio() {
        let surface = PixmapSurface::new(ViewportSize::new(100.0, 50.0), 2.0, None).unwrap();
        assert_eq!((surface.width(), surface.height()), (200, 100));
    }

    #[test]
    fn zero_sized_viewport_is_rejected() {
        assert!(PixmapSurface::new(ViewportSize::new(0.0, 10.0), 1.0, None).is_err());
    }

    #[test]
    fn paints_image_and_box_outline() {
        let source = white_image(40, 40);
        let scene = Scene {
            viewport: ViewportSize::new(40.0, 40.0),
            image: Some(ImageSize::new(40, 40)),
            transform: Transform::default(),
            boxes: vec![BoxView {
                label: "palma",
                bbox: BBoxXYXY::from_xyxy(5.0, 20.0, 35.0, 35.0),
            }],
            selected: None,
            preview: None,
            handle_size: 8.0,
        };
        let mut surface =
            PixmapSurface::new(scene.viewport, 1.0, Some(&source)).unwrap();
        compose(&scene).paint(&mut surface);
        let out = surface.into_image();

        // untouched image area stays white
        assert_eq!(out.get_pixel(2, 2).0, [255, 255, 255, 255]);
        // the bottom edge of the outline is red
        let edge = out.get_pixel(20, 35).0;
        assert!(edge[0] > 200 && edge[1] < 120 && edge[2] < 120, "{edge:?}");
    }

    #[test]
    fn clears_to_background_without_image() {
        let mut surface = PixmapSurface::new(ViewportSize::new(4.0, 4.0), 1.0, None).unwrap();
        surface.clear();
        assert_eq!(surface.into_image().get_pixel(0, 0).0, BACKGROUND);
    }
}
