//! OpenCV implementations of the capture, codec, detector, solver,
//! storage and preview seams.

mod convert;
mod detect;
mod highgui;
mod solver;
mod storage;
mod video;

pub use convert::{mat_from_rgb, rgb_from_mat};
pub use detect::ChessboardDetector;
pub use highgui::HighGuiPreview;
pub use solver::OpenCvSolver;
pub use storage::FileStorageStore;
pub use video::{CameraSource, VideoFileSink};

use std::path::Path;

use crate::error::{Error, Result};

/// OpenCV takes file names as `&str`
fn path_str(path: &Path) -> Result<&str> {
    path.to_str()
        .ok_or_else(|| Error::Backend(format!("path is not valid UTF-8: {}", path.display())))
}
