//! Seams to the vision library: corner detection and the calibration solver

use image::RgbImage;
use serde::{Deserialize, Serialize};

use crate::calib::{BoardGeometry, ImagePoint, ObjectPoint};
use crate::error::{Error, Result};

/// How hard the detector should look
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectionMode {
    /// Live preview: bail out early on frames without a board
    Preview,
    /// Buffered images before solving
    Thorough,
}

pub trait CornerDetector {
    /// Interior corners in row-major board order, or `None` if the board
    /// was not found in full.
    fn find_corners(
        &self,
        image: &RgbImage,
        board: &BoardGeometry,
        mode: DetectionMode,
    ) -> Result<Option<Vec<ImagePoint>>>;

    /// Overlay detected corners onto `image`
    fn draw_corners(
        &self,
        image: &mut RgbImage,
        board: &BoardGeometry,
        corners: &[ImagePoint],
        found: bool,
    ) -> Result<()>;
}

/// Solver options, stored with the library's bit values
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalibrationFlags {
    pub use_intrinsic_guess: bool,
    pub fix_aspect_ratio: bool,
    pub fix_principal_point: bool,
    pub zero_tangent_dist: bool,
    /// fx/fy ratio held fixed when `fix_aspect_ratio` is set
    pub aspect_ratio: f64,
}

impl Default for CalibrationFlags {
    fn default() -> Self {
        Self {
            use_intrinsic_guess: false,
            fix_aspect_ratio: false,
            fix_principal_point: false,
            zero_tangent_dist: false,
            aspect_ratio: 1.0,
        }
    }
}

impl CalibrationFlags {
    pub const USE_INTRINSIC_GUESS: i32 = 1;
    pub const FIX_ASPECT_RATIO: i32 = 2;
    pub const FIX_PRINCIPAL_POINT: i32 = 4;
    pub const ZERO_TANGENT_DIST: i32 = 8;

    pub fn bits(&self) -> i32 {
        let mut bits = 0;
        if self.use_intrinsic_guess {
            bits |= Self::USE_INTRINSIC_GUESS;
        }
        if self.fix_aspect_ratio {
            bits |= Self::FIX_ASPECT_RATIO;
        }
        if self.fix_principal_point {
            bits |= Self::FIX_PRINCIPAL_POINT;
        }
        if self.zero_tangent_dist {
            bits |= Self::ZERO_TANGENT_DIST;
        }
        bits
    }

    pub fn from_bits(bits: i32, aspect_ratio: f64) -> Self {
        Self {
            use_intrinsic_guess: bits & Self::USE_INTRINSIC_GUESS != 0,
            fix_aspect_ratio: bits & Self::FIX_ASPECT_RATIO != 0,
            fix_principal_point: bits & Self::FIX_PRINCIPAL_POINT != 0,
            zero_tangent_dist: bits & Self::ZERO_TANGENT_DIST != 0,
            aspect_ratio,
        }
    }

    /// A fixed aspect ratio seeds fx, so it must be a usable positive number
    pub fn validate(&self) -> Result<()> {
        if self.fix_aspect_ratio && !(self.aspect_ratio.is_finite() && self.aspect_ratio > 0.0) {
            return Err(Error::InvalidConfig(format!(
                "fix_aspect_ratio needs a positive aspect_ratio, got {}",
                self.aspect_ratio
            )));
        }
        Ok(())
    }

    /// `flags: +use_intrinsic_guess+fix_aspectRatio...`, or `None` when no flag is set
    pub fn describe(&self) -> Option<String> {
        if self.bits() == 0 {
            return None;
        }
        let mut text = String::from("flags: ");
        for (set, name) in [
            (self.use_intrinsic_guess, "+use_intrinsic_guess"),
            (self.fix_aspect_ratio, "+fix_aspectRatio"),
            (self.fix_principal_point, "+fix_principal_point"),
            (self.zero_tangent_dist, "+zero_tangent_dist"),
        ] {
            if set {
                text.push_str(name);
            }
        }
        Some(text)
    }
}

/// Solver output for one camera
#[derive(Debug, Clone, PartialEq)]
pub struct Solution {
    pub camera_matrix: [[f64; 3]; 3],
    pub distortion: Vec<f64>,
    /// Rodrigues rotation vector per view
    pub rotations: Vec<[f64; 3]>,
    pub translations: Vec<[f64; 3]>,
    /// Overall RMS reprojection error in pixels
    pub rms: f64,
    pub per_view_errors: Vec<f64>,
}

pub trait CalibrationSolver {
    /// `object_points[i]` and `image_points[i]` describe the same view.
    fn solve(
        &self,
        object_points: &[Vec<ObjectPoint>],
        image_points: &[Vec<ImagePoint>],
        image_size: (u32, u32),
        flags: &CalibrationFlags,
    ) -> Result<Solution>;
}
