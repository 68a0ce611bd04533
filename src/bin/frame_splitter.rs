//! Frame Splitter for stereo cameras
//!
//! Writes the left and right halves of a side-by-side recording to two
//! separate videos.

use std::path::PathBuf;

use clap::Parser;
use color_eyre::Result;
use tracing::{info, warn};

use stereo_rig::backend::opencv::{CameraSource, VideoFileSink};
use stereo_rig::splitter::split_video;
use stereo_rig::utils;

#[derive(Debug, Parser)]
#[command(version, about = "Frame Splitter for Stereo cameras")]
struct Cli {
    /// Input video
    video: PathBuf,

    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    utils::init_logging("frame_splitter")?;

    let config = utils::load_config(cli.config.as_deref())?;
    let output = &config.splitter;

    let Some(mut source) = CameraSource::open_file(&cli.video)? else {
        warn!("Video {} could not be opened", cli.video.display());
        return Ok(());
    };

    let codec = output.codec_tag()?;
    let size = config.layout.side_size();
    let mut left = VideoFileSink::create(&output.left_output, codec, output.fps, size)?;
    let mut right = VideoFileSink::create(&output.right_output, codec, output.fps, size)?;

    let summary = split_video(&mut source, &config.layout, &mut left, &mut right)?;
    source.release()?;

    info!(
        frames = summary.frames,
        "Wrote {} and {}",
        left.path().display(),
        right.path().display()
    );
    Ok(())
}
