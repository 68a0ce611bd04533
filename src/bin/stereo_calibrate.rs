//! Stereo camera calibration capture
//!
//! Shows both halves of a side-by-side camera with live chessboard overlay.
//! Space buffers the current pair, `c` calibrates each camera once more than
//! the configured minimum of pairs has been buffered.

use std::path::PathBuf;

use clap::Parser;
use color_eyre::Result;
use tracing::{info, warn};

use stereo_rig::backend::opencv::{
    CameraSource, ChessboardDetector, FileStorageStore, HighGuiPreview, OpenCvSolver,
};
use stereo_rig::calib::{Calibrator, ParameterStore, YamlStore};
use stereo_rig::session::CaptureSession;
use stereo_rig::{utils, ParameterFormat};

#[derive(Debug, Parser)]
#[command(version, about = "Stereo camera chessboard capture and calibration")]
struct Cli {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Camera number, overrides `capture.device_index`
    #[arg(short, long)]
    device: Option<i32>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    utils::init_logging("stereo_calibrate")?;

    info!("Stereo calibration launching...");
    let mut config = utils::load_config(cli.config.as_deref())?;
    if let Some(device) = cli.device {
        config.capture.device_index = device;
    }

    let Some(mut camera) = CameraSource::open_device(config.capture.device_index)? else {
        warn!("Camera {} could not be opened", config.capture.device_index);
        return Ok(());
    };

    let store: Box<dyn ParameterStore> = match config.calibration.format {
        ParameterFormat::Opencv => Box::new(FileStorageStore),
        ParameterFormat::Yaml => Box::new(YamlStore),
    };
    let calibrator = Calibrator::new(
        ChessboardDetector,
        OpenCvSolver,
        store,
        config.board,
        &config.calibration,
    );

    let windows = &config.preview;
    let mut preview = HighGuiPreview::new(&windows.left_window, &windows.right_window)?;
    let mut session = CaptureSession::new(&calibrator, config.layout, &config.preview);
    let summary = session.run(&mut camera, &mut preview)?;

    info!(
        frames = summary.frames,
        pairs = summary.pairs_buffered,
        calibrations = summary.calibrations,
        "Stereo calibration shutting down"
    );
    Ok(())
}
