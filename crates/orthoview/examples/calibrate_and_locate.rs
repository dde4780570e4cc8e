//! Staged calibration walkthrough: decode a packed frame, pick the four
//! corners, mark the origin, plan a stage move and persist the session.
//!
//! Run with `cargo run -p orthoview --example calibrate_and_locate`.
//! An optional argument overrides the session file path.

use std::env;
use std::path::PathBuf;

use log::LevelFilter;

use orthoview::core::{init_with_level, ImagePoint, PlateCalibration, PlateDimensions};
use orthoview::frame::decode_packed_rgb;
use orthoview::motion::{plan_shift, DryRunDriver, MotionDriver, MotionSettings};
use orthoview::session::PlateSession;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_with_level(LevelFilter::Debug)?;

    // A 64x48 frame the way camera services deliver it: one 0x00BBGGRR
    // word per pixel, row major.
    let words: Vec<u32> = (0..64u32 * 48)
        .map(|i| {
            let x = i % 64;
            let y = i / 64;
            ((x * 4 % 256) << 16) | ((y * 5 % 256) << 8) | ((x + y) % 256)
        })
        .collect();
    let frame = decode_packed_rgb(&words, 64, 48)?;
    println!("frame: {}x{} px", frame.width, frame.height);

    let mut calib = PlateCalibration::new();
    for pick in [
        ImagePoint::new(9.0, 6.0),
        ImagePoint::new(56.0, 9.0),
        ImagePoint::new(53.0, 42.0),
        ImagePoint::new(6.0, 39.0),
    ] {
        if let Some(id) = calib.next_corner() {
            println!("picking {} at ({}, {})", id.label(), pick.x, pick.y);
        }
        calib.add_corner(pick)?;
    }
    calib.set_dimensions(PlateDimensions {
        width: 120.0,
        height: 80.0,
    })?;
    calib.set_local_origin(ImagePoint::new(32.0, 24.0))?;

    let probe = ImagePoint::new(40.0, 30.0);
    let p = calib.to_plane(probe)?;
    println!(
        "pixel ({}, {}) sits at ({:.2}, {:.2}) from the origin",
        probe.x, probe.y, p.x, p.y
    );

    let shift = plan_shift(&calib, probe, &MotionSettings::default())?;
    DryRunDriver.move_relative(shift)?;

    let session_path = env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| env::temp_dir().join("orthoview_session.json"));
    PlateSession::capture(&calib, 4.0).write_json(&session_path)?;
    println!("session saved to {}", session_path.display());

    let restored = PlateSession::load_json(&session_path)?.restore()?;
    let q = restored.to_plane(probe)?;
    println!("restored session agrees: ({:.2}, {:.2})", q.x, q.y);
    Ok(())
}
