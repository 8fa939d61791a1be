use criterion::{black_box, criterion_group, criterion_main, Criterion};
use image::{DynamicImage, Rgb, RgbImage};
use slab_crop::{CardCropper, CropConfig};
use std::io::Cursor;

/// 1000x1400 black photo with a white 600x840 card and a red label strip
fn synthetic_photo(landscape: bool) -> Vec<u8> {
    let (w, h) = if landscape { (1400, 1000) } else { (1000, 1400) };
    let img = RgbImage::from_fn(w, h, |x, y| {
        let (cx, cy, cw, ch) = if landscape { (280, 200, 840, 600) } else { (200, 280, 600, 840) };
        if x >= cx && x < cx + cw && y >= cy && y < cy + ch {
            if landscape && (1030..1090).contains(&x) {
                Rgb([220, 0, 0])
            } else {
                Rgb([255, 255, 255])
            }
        } else {
            Rgb([0, 0, 0])
        }
    });
    let mut buffer = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(img)
        .write_to(&mut buffer, image::ImageFormat::Png)
        .unwrap();
    buffer.into_inner()
}

fn benchmark_crop_pipeline(c: &mut Criterion) {
    let cropper = CardCropper::new();
    let portrait = synthetic_photo(false);
    let landscape = synthetic_photo(true);

    c.bench_function("crop_card_portrait", |b| {
        b.iter(|| cropper.crop_card(black_box(&portrait)))
    });

    c.bench_function("crop_card_sideways", |b| {
        b.iter(|| cropper.crop_card(black_box(&landscape)))
    });

    let mut config = CropConfig::default();
    config.encoding.compression = slab_crop::config::PngCompression::Fast;
    let fast = CardCropper::with_config(config).unwrap();
    c.bench_function("crop_card_fast_png", |b| {
        b.iter(|| fast.crop_card(black_box(&portrait)))
    });
}

criterion_group!(benches, benchmark_crop_pipeline);
criterion_main!(benches);
