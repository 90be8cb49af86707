//! Benchmarks for the CPU-side image work around inference
//!
//! Preview scaling, detector post-processing and paste-back all run on the UI
//! thread during a swap, so their cost adds directly to perceived latency.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use faceswapper::faces::align::Similarity;
use faceswapper::faces::detector::{decode_stride, nms};
use faceswapper::faces::inswapper::paste_back;
use faceswapper::imaging::thumbnail;
use image::{Rgb, RgbImage};

fn benchmark_thumbnail(c: &mut Criterion) {
    let mut group = c.benchmark_group("thumbnail");

    for &(w, h) in &[(1280u32, 720u32), (1920, 1080), (4000, 3000)] {
        let image = RgbImage::from_fn(w, h, |x, y| Rgb([(x % 256) as u8, (y % 256) as u8, 128]));
        group.bench_with_input(
            BenchmarkId::new("to_400", format!("{}x{}", w, h)),
            &image,
            |b, image| b.iter(|| thumbnail(black_box(image), 400, 400)),
        );
    }

    group.finish();
}

fn benchmark_detector_postprocess(c: &mut Criterion) {
    let mut group = c.benchmark_group("detector_postprocess");

    // stride 8 on a 640 canvas: 80x80 cells, 2 anchors each
    let anchors = 80 * 80 * 2;
    let scores: Vec<f32> = (0..anchors).map(|i| if i % 97 == 0 { 0.9 } else { 0.1 }).collect();
    let boxes = vec![1.5f32; anchors * 4];
    let kps = vec![0.5f32; anchors * 10];

    group.bench_function("decode_stride_8", |b| {
        b.iter(|| {
            decode_stride(
                black_box(&scores),
                black_box(&boxes),
                black_box(&kps),
                8,
                640,
                2,
                0.5,
            )
        })
    });

    let candidates = decode_stride(&scores, &boxes, &kps, 8, 640, 2, 0.5);
    group.bench_function("nms", |b| b.iter(|| nms(black_box(candidates.clone()), 0.4)));

    group.finish();
}

fn benchmark_paste_back(c: &mut Criterion) {
    let target = RgbImage::from_pixel(1280, 720, Rgb([40, 40, 40]));
    let crop = RgbImage::from_pixel(128, 128, Rgb([220, 180, 160]));
    let transform = Similarity {
        a: 0.5,
        b: 0.1,
        tx: -250.0,
        ty: -120.0,
    };

    c.bench_function("paste_back_720p", |b| {
        b.iter(|| paste_back(black_box(&target), black_box(&crop), &transform))
    });
}

criterion_group!(
    benches,
    benchmark_thumbnail,
    benchmark_detector_postprocess,
    benchmark_paste_back
);
criterion_main!(benches);
