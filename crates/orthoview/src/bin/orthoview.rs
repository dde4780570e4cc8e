//! Command line front end over stored calibration sessions.
//!
//! `check` restores a session and reports what it maps, `locate` converts
//! one pixel to plate coordinates and `rectify` writes an orthographic
//! view of an image file. All subcommands read the JSON session files
//! written by [`orthoview::session::PlateSession`].

use std::error::Error;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use image::ImageReader;
use log::LevelFilter;

use orthoview::core::{CornerId, ImagePoint, PlanePoint};
use orthoview::frame::{rgb_view, to_rgb_image};
use orthoview::overlay::{annotate_rectified, OverlayStyle};
use orthoview::rectify::{grid_lines, rectify_full_frame, warp_plate, GridSpec};
use orthoview::session::PlateSession;
use orthoview::{CalibrationError, RectifyParams};

#[derive(Debug, Parser)]
#[command(
    name = "orthoview",
    version,
    about = "Perspective plate calibration and orthographic views"
)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Restore a session file and report the calibration state.
    Check {
        /// Session JSON path.
        #[arg(long)]
        session: PathBuf,
    },
    /// Convert one image pixel to plate coordinates.
    Locate {
        /// Session JSON path.
        #[arg(long)]
        session: PathBuf,
        /// Pixel x coordinate.
        #[arg(long)]
        x: f64,
        /// Pixel y coordinate.
        #[arg(long)]
        y: f64,
    },
    /// Rectify an image file through a stored session.
    Rectify {
        /// Session JSON path.
        #[arg(long)]
        session: PathBuf,
        /// Input image, any format the image crate decodes.
        #[arg(long)]
        image: PathBuf,
        /// Output image path; the extension selects the format.
        #[arg(long)]
        out: PathBuf,
        /// Override the session's rectified scale, in px per plane unit.
        #[arg(long)]
        px_per_unit: Option<f64>,
        /// Keep the whole frame instead of cropping to the plate.
        #[arg(long)]
        full: bool,
        /// Blend grid and plate markers into the output.
        #[arg(long, requires = "full")]
        grid: bool,
    },
}

fn main() {
    if let Err(err) = try_main() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn try_main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    orthoview::core::init_with_level(level_for(cli.verbose))?;

    match cli.command {
        Commands::Check { session } => run_check(&session),
        Commands::Locate { session, x, y } => run_locate(&session, x, y),
        Commands::Rectify {
            session,
            image,
            out,
            px_per_unit,
            full,
            grid,
        } => run_rectify(&session, &image, &out, px_per_unit, full, grid),
    }
}

fn level_for(verbose: u8) -> LevelFilter {
    match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

fn run_check(session_path: &Path) -> Result<(), Box<dyn Error>> {
    let session = PlateSession::load_json(session_path)?;
    let calib = session.restore()?;

    println!("state: {:?}", calib.state());
    if let Some(dims) = calib.dimensions() {
        println!("plate: {} x {} units", dims.width, dims.height);
    }
    println!("rectified scale: {} px/unit", session.px_per_unit);

    if calib.is_calibrated() {
        for (id, pick) in CornerId::ALL.iter().zip(calib.corners()) {
            let p = calib.to_plane(*pick)?;
            println!(
                "  {}: ({:.1}, {:.1}) px -> ({:.3}, {:.3})",
                id.label(),
                pick.x,
                pick.y,
                p.x,
                p.y
            );
        }
        if let Some(origin) = calib.local_origin() {
            println!("origin: ({:.3}, {:.3}) on the plate", origin.x, origin.y);
        }
    }
    Ok(())
}

fn locate_point(session_path: &Path, x: f64, y: f64) -> Result<PlanePoint, Box<dyn Error>> {
    let session = PlateSession::load_json(session_path)?;
    let calib = session.restore()?;
    Ok(calib.to_plane(ImagePoint::new(x, y))?)
}

fn run_locate(session_path: &Path, x: f64, y: f64) -> Result<(), Box<dyn Error>> {
    let p = locate_point(session_path, x, y)?;
    println!("plate: x={:.3} y={:.3}", p.x, p.y);
    Ok(())
}

fn run_rectify(
    session_path: &Path,
    image_path: &Path,
    out_path: &Path,
    px_per_unit: Option<f64>,
    full: bool,
    grid: bool,
) -> Result<(), Box<dyn Error>> {
    let session = PlateSession::load_json(session_path)?;
    let calib = session.restore()?;
    let img = ImageReader::open(image_path)?.decode()?.to_rgb8();
    let src = rgb_view(&img);

    let params = RectifyParams {
        px_per_unit: px_per_unit.unwrap_or(session.px_per_unit),
        ..RectifyParams::default()
    };

    let out_img = if full {
        let view = rectify_full_frame(&src, &calib, &params)?;
        let base = to_rgb_image(&view.frame.as_view())?;
        if grid {
            let lines = grid_lines(&view, &GridSpec::default());
            annotate_rectified(&base, &view, &lines, &OverlayStyle::default())
        } else {
            base
        }
    } else {
        let dims = calib.dimensions().ok_or(CalibrationError::NotCalibrated)?;
        let out_w = (dims.width * params.px_per_unit).round().max(1.0) as usize;
        let out_h = (dims.height * params.px_per_unit).round().max(1.0) as usize;
        let plate = warp_plate(&src, &calib, out_w, out_h, params.background)?;
        to_rgb_image(&plate.as_view())?
    };

    out_img.save(out_path)?;
    println!(
        "wrote {} ({}x{} px)",
        out_path.display(),
        out_img.width(),
        out_img.height()
    );
    Ok(())
}
