use chrono::Local;
use serde::{Deserialize, Serialize};

use crate::calib::{BoardGeometry, CalibrationFlags, ImagePoint, Solution};

/// Which optional sections go into the parameter file.
///
/// The average reprojection error is always written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersistOptions {
    /// One rotation + translation 6-tuple per view
    pub extrinsics: bool,
    pub per_view_errors: bool,
    /// Detected corners of every view
    pub image_points: bool,
}

impl Default for PersistOptions {
    fn default() -> Self {
        Self {
            extrinsics: true,
            per_view_errors: false,
            image_points: false,
        }
    }
}

/// Everything persisted for one calibrated camera
#[derive(Debug, Clone, PartialEq)]
pub struct CalibrationRecord {
    pub calibration_time: String,
    pub nframes: Option<usize>,
    pub image_width: u32,
    pub image_height: u32,
    pub board_width: u32,
    pub board_height: u32,
    pub square_size: f32,
    pub flags: CalibrationFlags,
    pub camera_matrix: [[f64; 3]; 3],
    pub distortion_coefficients: Vec<f64>,
    pub avg_reprojection_error: f64,
    pub per_view_reprojection_errors: Option<Vec<f64>>,
    pub extrinsic_parameters: Option<Vec<[f64; 6]>>,
    pub image_points: Option<Vec<Vec<ImagePoint>>>,
}

impl CalibrationRecord {
    pub fn new(
        solution: Solution,
        image_size: (u32, u32),
        board: &BoardGeometry,
        flags: CalibrationFlags,
        image_points: Vec<Vec<ImagePoint>>,
        options: PersistOptions,
    ) -> Self {
        let extrinsics = (options.extrinsics && !solution.rotations.is_empty()).then(|| {
            solution
                .rotations
                .iter()
                .zip(&solution.translations)
                .map(|(r, t)| [r[0], r[1], r[2], t[0], t[1], t[2]])
                .collect::<Vec<_>>()
        });
        let per_view = (options.per_view_errors && !solution.per_view_errors.is_empty())
            .then_some(solution.per_view_errors);
        let image_points =
            (options.image_points && !image_points.is_empty()).then_some(image_points);

        let nframes = match (&extrinsics, &per_view) {
            (None, None) => None,
            (e, p) => Some(
                e.as_ref()
                    .map_or(0, Vec::len)
                    .max(p.as_ref().map_or(0, Vec::len)),
            ),
        };

        Self {
            calibration_time: Local::now().format("%c").to_string(),
            nframes,
            image_width: image_size.0,
            image_height: image_size.1,
            board_width: board.columns,
            board_height: board.rows,
            square_size: board.square_size,
            flags,
            camera_matrix: solution.camera_matrix,
            distortion_coefficients: solution.distortion,
            avg_reprojection_error: solution.rms,
            per_view_reprojection_errors: per_view,
            extrinsic_parameters: extrinsics,
            image_points,
        }
    }

    /// Written only when the aspect ratio is held fixed
    pub fn aspect_ratio(&self) -> Option<f64> {
        self.flags
            .fix_aspect_ratio
            .then_some(self.flags.aspect_ratio)
    }
}
