//! Render marker overlays and write PNG views of a synthetic frame.
//!
//! Run with `cargo run -p orthoview --example annotate_and_save`.
//! Outputs land in the system temp directory.

use std::env;

use log::LevelFilter;

use orthoview::core::{init_with_level, ImagePoint, PlateCalibration, PlateDimensions};
use orthoview::frame::{rgb_view, to_rgb_image};
use orthoview::overlay::{annotate_live, annotate_rectified, OverlayStyle};
use orthoview::rectify::{grid_lines, rectify_full_frame, GridSpec, RectifyParams};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_with_level(LevelFilter::Info)?;

    // checkerboard stand-in for a camera frame
    let img = image::RgbImage::from_fn(640, 480, |x, y| {
        let v = ((x / 20 + y / 20) % 2 * 180 + 40) as u8;
        image::Rgb([v, v, v])
    });

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

    let style = OverlayStyle::default();
    let live = annotate_live(&img, &calib, &style);
    let live_path = env::temp_dir().join("orthoview_live.png");
    live.save(&live_path)?;
    println!("live view: {}", live_path.display());

    let view = rectify_full_frame(&rgb_view(&img), &calib, &RectifyParams::default())?;
    let lines = grid_lines(&view, &GridSpec::default());
    let base = to_rgb_image(&view.frame.as_view())?;
    let rectified = annotate_rectified(&base, &view, &lines, &style);
    let rect_path = env::temp_dir().join("orthoview_rectified.png");
    rectified.save(&rect_path)?;
    println!(
        "rectified view: {} ({}x{} px)",
        rect_path.display(),
        rectified.width(),
        rectified.height()
    );
    Ok(())
}
