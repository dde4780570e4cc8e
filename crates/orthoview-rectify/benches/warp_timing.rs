use criterion::{black_box, criterion_group, criterion_main, Criterion};

use orthoview_core::{ImagePoint, PlateCalibration, PlateDimensions, RgbFrame};
use orthoview_rectify::{rectify_full_frame, warp_plate, RectifyParams};

fn make_frame(width: usize, height: usize) -> RgbFrame {
    let mut data = Vec::with_capacity(width * height * 3);
    for y in 0..height {
        for x in 0..width {
            let v = 128.0 + 96.0 * (x as f64 * 0.013).sin() * (y as f64 * 0.017).cos();
            data.push(v.clamp(0.0, 255.0) as u8);
            data.push(((x * 5 + y * 3) % 256) as u8);
            data.push(((x + 2 * y) % 256) as u8);
        }
    }
    RgbFrame {
        width,
        height,
        data,
    }
}

fn make_calibration() -> PlateCalibration {
    let mut cal = PlateCalibration::new();
    cal.calibrate_with(
        [
            ImagePoint::new(92.0, 64.0),
            ImagePoint::new(560.0, 80.0),
            ImagePoint::new(540.0, 420.0),
            ImagePoint::new(70.0, 400.0),
        ],
        PlateDimensions {
            width: 120.0,
            height: 80.0,
        },
    )
    .expect("bench fixture calibration");
    cal
}

fn bench_warp_plate(c: &mut Criterion) {
    let frame = make_frame(640, 480);
    let cal = make_calibration();

    c.bench_function("warp_plate_480x320", |b| {
        b.iter(|| {
            let out = warp_plate(
                black_box(&frame.as_view()),
                black_box(&cal),
                480,
                320,
                [0, 0, 0],
            )
            .expect("warp");
            black_box(out.data.len())
        })
    });
}

fn bench_full_frame(c: &mut Criterion) {
    let frame = make_frame(640, 480);
    let cal = make_calibration();
    let params = RectifyParams::default();

    c.bench_function("rectify_full_frame_640x480", |b| {
        b.iter(|| {
            let view = rectify_full_frame(
                black_box(&frame.as_view()),
                black_box(&cal),
                black_box(&params),
            )
            .expect("rectify");
            black_box(view.frame.data.len())
        })
    });
}

criterion_group!(warps, bench_warp_plate, bench_full_frame);
criterion_main!(warps);
