//! Criterion microbenches for boxlabel codecs and frame composition.
//!
//! Run with: `cargo bench`
//!
//! These benchmarks measure:
//! - YOLO line encoding for a busy image
//! - Pascal VOC writing and reading
//! - display-list composition for a session with many boxes

use std::hint::black_box;
use std::path::Path;

use criterion::{criterion_group, criterion_main, Criterion, Throughput};

use boxlabel::interaction::Session;
use boxlabel::ir::io_voc_xml::{decode_voc, encode_voc};
use boxlabel::ir::io_yolo::encode_yolo;
use boxlabel::ir::{Annotation, BBoxXYXY, ImageSize};
use boxlabel::report::Report;

const SIZE: ImageSize = ImageSize {
    width: 1920,
    height: 1080,
};

/// A grid of 64 boxes, each with its own label.
fn sample_annotations() -> Vec<Annotation> {
    (0..64)
        .map(|i| {
            let x = (i % 8) as f64 * 230.0 + 5.0;
            let y = (i / 8) as f64 * 130.0 + 5.0;
            Annotation::new(BBoxXYXY::from_xyxy(x, y, x + 200.5, y + 110.25), format!("class{i:02}"))
                .expect("valid box")
        })
        .collect()
}

fn bench_yolo_encode(c: &mut Criterion) {
    let annotations = sample_annotations();
    let mut classes: Vec<String> = annotations.iter().map(|a| a.label().to_string()).collect();
    classes.sort();

    let mut group = c.benchmark_group("yolo_encode");
    group.throughput(Throughput::Elements(annotations.len() as u64));
    group.bench_function("encode_yolo", |b| {
        b.iter(|| {
            let mut report = Report::new("export");
            let lines = encode_yolo(
                "bench.jpg",
                SIZE,
                black_box(&annotations),
                &classes,
                &mut report,
            );
            black_box(lines)
        })
    });
    group.finish();
}

fn bench_voc(c: &mut Criterion) {
    let annotations = sample_annotations();
    let mut report = Report::new("export");
    let xml = encode_voc("bench.jpg", SIZE, &annotations, &mut report);

    let mut group = c.benchmark_group("voc");
    group.throughput(Throughput::Elements(annotations.len() as u64));
    group.bench_function("encode_voc", |b| {
        b.iter(|| {
            let mut report = Report::new("export");
            black_box(encode_voc("bench.jpg", SIZE, black_box(&annotations), &mut report))
        })
    });
    group.throughput(Throughput::Bytes(xml.len() as u64));
    group.bench_function("decode_voc", |b| {
        b.iter(|| {
            let doc = decode_voc(black_box(&xml), Path::new("bench.xml")).unwrap();
            black_box(doc)
        })
    });
    group.finish();
}

fn bench_compose(c: &mut Criterion) {
    let dir = tempfile::TempDir::new().unwrap();
    let mut report = Report::new("export");
    let xml = encode_voc("bench.jpg", SIZE, &sample_annotations(), &mut report);
    let xml_path = dir.path().join("bench.xml");
    std::fs::write(&xml_path, xml).unwrap();

    let mut session = Session::default();
    let ticket = session.open_images(["bench.jpg"]).unwrap();
    session.complete_load(&ticket, SIZE);
    session.import_annotations(&[&xml_path]);
    session.select_box(10).unwrap();

    let mut group = c.benchmark_group("render");
    group.bench_function("compose_frame", |b| b.iter(|| black_box(session.frame())));
    group.finish();
}

criterion_group!(benches, bench_yolo_encode, bench_voc, bench_compose);
criterion_main!(benches);
