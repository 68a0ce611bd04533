//! Calibration invocation: detect, pair with reference points, solve, persist

use std::path::{Path, PathBuf};
use std::time::Instant;

use image::RgbImage;
use tracing::{debug, info, instrument};

use crate::calib::{
    BoardGeometry, CalibrationFlags, CalibrationRecord, CornerDetector, CalibrationSolver,
    DetectionMode, ParameterStore, PersistOptions, StereoBuffers,
};
use crate::error::{Error, Result};
use crate::CalibrationConfig;

/// Result of a successful stereo calibration
#[derive(Debug, Clone)]
pub struct StereoCalibration {
    pub left: CalibrationRecord,
    pub right: CalibrationRecord,
}

/// Runs the detector and solver over buffered images and writes the result
pub struct Calibrator<D, S, P> {
    detector: D,
    solver: S,
    store: P,
    board: BoardGeometry,
    flags: CalibrationFlags,
    persist: PersistOptions,
    min_images: usize,
    left_output: PathBuf,
    right_output: PathBuf,
}

impl<D, S, P> Calibrator<D, S, P>
where
    D: CornerDetector,
    S: CalibrationSolver,
    P: ParameterStore,
{
    pub fn new(
        detector: D,
        solver: S,
        store: P,
        board: BoardGeometry,
        config: &CalibrationConfig,
    ) -> Self {
        Self {
            detector,
            solver,
            store,
            board,
            flags: config.flags,
            persist: config.persist,
            min_images: config.min_images,
            left_output: config.left_output.clone(),
            right_output: config.right_output.clone(),
        }
    }

    pub fn detector(&self) -> &D {
        &self.detector
    }

    pub fn solver(&self) -> &S {
        &self.solver
    }

    pub fn store(&self) -> &P {
        &self.store
    }

    pub fn board(&self) -> &BoardGeometry {
        &self.board
    }

    /// Calibrate one camera from its buffered views and save to `path`.
    ///
    /// Views where the board is not found are dropped. The solver is never
    /// invoked without at least one detected view.
    #[instrument(skip(self, images), fields(images = images.len()))]
    pub fn calibrate(&self, images: &[RgbImage], path: &Path) -> Result<CalibrationRecord> {
        let image_size = uniform_size(images)?;

        let mut image_points = Vec::with_capacity(images.len());
        for (index, image) in images.iter().enumerate() {
            match self
                .detector
                .find_corners(image, &self.board, DetectionMode::Thorough)?
            {
                Some(corners) => image_points.push(corners),
                None => debug!("No board in buffered image {index}"),
            }
        }

        if image_points.is_empty() {
            return Err(Error::NoCorrespondences {
                images: images.len(),
            });
        }
        info!(
            "Board found in {} of {} images",
            image_points.len(),
            images.len()
        );

        let reference = self.board.object_points();
        let object_points = vec![reference; image_points.len()];

        let started = Instant::now();
        let solution = self
            .solver
            .solve(&object_points, &image_points, image_size, &self.flags)?;
        metrics::histogram!("calibration_solve_ms").record(started.elapsed().as_millis() as f64);
        metrics::gauge!("calibration_rms").set(solution.rms);
        info!("Solved with RMS reprojection error {:.4}", solution.rms);

        let record = CalibrationRecord::new(
            solution,
            image_size,
            &self.board,
            self.flags,
            image_points,
            self.persist,
        );
        self.store.save(path, &record)?;
        info!("Calibration written to {}", path.display());
        Ok(record)
    }

    /// Calibrate both cameras, refusing unless each buffer holds more than
    /// the minimum number of images.
    pub fn calibrate_stereo(&self, buffers: &StereoBuffers) -> Result<StereoCalibration> {
        if !buffers.ready(self.min_images) {
            return Err(Error::NotEnoughImages {
                left: buffers.left.len(),
                right: buffers.right.len(),
                required: self.min_images,
            });
        }

        let left = self.calibrate(buffers.left.images(), &self.left_output)?;
        let right = self.calibrate(buffers.right.images(), &self.right_output)?;
        Ok(StereoCalibration { left, right })
    }
}

fn uniform_size(images: &[RgbImage]) -> Result<(u32, u32)> {
    let first = images.first().ok_or(Error::EmptyBuffer)?;
    let expected = first.dimensions();
    for (index, image) in images.iter().enumerate().skip(1) {
        let actual = image.dimensions();
        if actual != expected {
            return Err(Error::ImageSizeMismatch {
                index,
                expected,
                actual,
            });
        }
    }
    Ok(expected)
}
