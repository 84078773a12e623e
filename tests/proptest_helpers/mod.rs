#![allow(dead_code)]

use boxlabel::ir::{BBoxXYXY, Coord, ImageSize, ImageSpace, ViewportSpace, PREDEFINED_CLASSES};
use boxlabel::view::Transform;
use proptest::prelude::*;
use proptest::test_runner::{Config as ProptestConfig, FileFailurePersistence};

pub const EPS_VIEW: f64 = 1e-6;

/// YOLO lines carry six decimals, so the error grows with the image side.
pub fn eps_yolo(size: ImageSize) -> f64 {
    size.width.max(size.height) as f64 * 1e-6
}

pub fn proptest_config() -> ProptestConfig {
    let cases = std::env::var("PROPTEST_CASES")
        .ok()
        .and_then(|v| v.parse::<u32>().ok())
        .unwrap_or(64);

    let mut config = ProptestConfig::with_failure_persistence(FileFailurePersistence::WithSource(
        "proptest-regressions",
    ));
    config.cases = cases;
    config.max_shrink_iters = 1024;
    config
}

pub fn arb_image_size() -> impl Strategy<Value = ImageSize> {
    (1u32..=4000, 1u32..=4000).prop_map(|(w, h)| ImageSize::new(w, h))
}

/// A transform with scale inside the default zoom range.
pub fn arb_transform() -> impl Strategy<Value = Transform> {
    (0.1f64..=10.0, -2000.0f64..2000.0, -2000.0f64..2000.0)
        .prop_map(|(scale, px, py)| Transform::default().with_params(scale, px, py))
}

pub fn arb_viewport_point() -> impl Strategy<Value = Coord<ViewportSpace>> {
    (-5000.0f64..5000.0, -5000.0f64..5000.0).prop_map(|(x, y)| Coord::new(x, y))
}

/// An image with one box that lies fully inside it and has positive area.
pub fn arb_image_with_box() -> impl Strategy<Value = (ImageSize, BBoxXYXY<ImageSpace>)> {
    arb_image_size().prop_flat_map(|size| {
        let (w, h) = (size.width as f64, size.height as f64);
        (0.0..1.0f64, 0.0..1.0f64, 0.0..1.0f64, 0.0..1.0f64).prop_filter_map(
            "box needs positive area",
            move |(a, b, c, d)| {
                let (x1, x2) = (a.min(c) * w, a.max(c) * w);
                let (y1, y2) = (b.min(d) * h, b.max(d) * h);
                (x2 - x1 > 1e-3 && y2 - y1 > 1e-3)
                    .then(|| (size, BBoxXYXY::from_xyxy(x1, y1, x2, y2)))
            },
        )
    })
}

/// An image with a box whose corners sit on integer pixels.
pub fn arb_image_with_pixel_box() -> impl Strategy<Value = (ImageSize, BBoxXYXY<ImageSpace>)> {
    (2u32..=2000, 2u32..=2000).prop_flat_map(|(w, h)| {
        (0..w - 1, 0..h - 1).prop_flat_map(move |(x1, y1)| {
            (x1 + 1..=w, y1 + 1..=h).prop_map(move |(x2, y2)| {
                (
                    ImageSize::new(w, h),
                    BBoxXYXY::from_xyxy(x1 as f64, y1 as f64, x2 as f64, y2 as f64),
                )
            })
        })
    })
}

/// A label from a small pool, including messy casing and padding, so
/// collisions are frequent.
pub fn arb_label() -> impl Strategy<Value = String> {
    (0..PREDEFINED_CLASSES.len(), 0..3u8).prop_map(|(idx, style)| {
        let base = PREDEFINED_CLASSES[idx];
        match style {
            0 => base.to_string(),
            1 => base.to_uppercase(),
            _ => format!("  {base} "),
        }
    })
}

/// A box that may be inverted, tiny or partly outside a 100x100 image.
pub fn arb_loose_box() -> impl Strategy<Value = BBoxXYXY<ImageSpace>> {
    (
        -20.0f64..120.0,
        -20.0f64..120.0,
        -20.0f64..120.0,
        -20.0f64..120.0,
    )
        .prop_map(|(x1, y1, x2, y2)| BBoxXYXY::from_xyxy(x1, y1, x2, y2))
}

/// One mutation of the annotation store.
#[derive(Clone, Debug)]
pub enum StoreOp {
    Add {
        image: usize,
        rect: BBoxXYXY<ImageSpace>,
        label: String,
    },
    Relabel {
        image: usize,
        index: usize,
        label: String,
    },
    Merge {
        image: usize,
        boxes: Vec<(String, BBoxXYXY<ImageSpace>)>,
    },
    Delete {
        image: usize,
        index: usize,
    },
}

pub const STORE_IMAGES: [&str; 2] = ["a.jpg", "b.jpg"];

pub fn arb_store_op() -> impl Strategy<Value = StoreOp> {
    let image = 0..STORE_IMAGES.len();
    prop_oneof![
        (image.clone(), arb_loose_box(), arb_label())
            .prop_map(|(image, rect, label)| StoreOp::Add { image, rect, label }),
        (image.clone(), 0usize..6, arb_label())
            .prop_map(|(image, index, label)| StoreOp::Relabel { image, index, label }),
        (
            image.clone(),
            proptest::collection::vec((arb_label(), arb_loose_box()), 0..6)
        )
            .prop_map(|(image, boxes)| StoreOp::Merge { image, boxes }),
        (image, 0usize..6).prop_map(|(image, index)| StoreOp::Delete { image, index }),
    ]
}
