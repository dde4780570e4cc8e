//! Calibrate from four picks and rectify a synthetic camera frame.
//!
//! ```bash
//! RUST_LOG=debug cargo run -p orthoview-rectify --example rectify_frame
//! ```

use orthoview_core::{ImagePoint, PlateCalibration, PlateDimensions, RgbFrame};
use orthoview_rectify::{grid_lines, rectify_full_frame, warp_plate, GridSpec, RectifyParams};

fn synthetic_frame(width: usize, height: usize) -> RgbFrame {
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

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let mut calib = PlateCalibration::new();
    calib.calibrate_with(
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
    )?;
    calib.set_local_origin(ImagePoint::new(320.0, 240.0))?;

    let frame = synthetic_frame(640, 480);

    let plate = warp_plate(&frame.as_view(), &calib, 480, 320, [16, 16, 16])?;
    println!("plate view: {}x{} px", plate.width, plate.height);

    let view = rectify_full_frame(&frame.as_view(), &calib, &RectifyParams::default())?;
    let lines = grid_lines(&view, &GridSpec::default());
    println!(
        "full frame view: {}x{} px at {} px/unit, {} vertical and {} horizontal grid lines",
        view.frame.width,
        view.frame.height,
        view.px_per_unit,
        lines.xs.len(),
        lines.ys.len()
    );
    if let Some(o) = view.origin_px() {
        println!("local origin at ({:.1}, {:.1}) px", o.x, o.y);
    }
    Ok(())
}
