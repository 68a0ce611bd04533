use std::path::Path;

use opencv::core::{FileStorage, FileStorage_WRITE, Mat, Vec2f};
use opencv::prelude::*;
use tracing::instrument;

use super::path_str;
use crate::calib::{CalibrationRecord, ParameterStore};
use crate::error::Result;

const EXTRINSICS_COMMENT: &str =
    "a set of 6-tuples (rotation vector + translation vector) for each view";

/// Parameter files in OpenCV's own `FileStorage` YAML
#[derive(Debug, Clone, Copy, Default)]
pub struct FileStorageStore;

fn column(values: &[f64]) -> Result<Mat> {
    let rows: Vec<[f64; 1]> = values.iter().map(|v| [*v]).collect();
    Ok(Mat::from_slice_2d(rows.as_slice())?)
}

impl ParameterStore for FileStorageStore {
    #[instrument(skip(self, record))]
    fn save(&self, path: &Path, record: &CalibrationRecord) -> Result<()> {
        let mut fs = FileStorage::new_def(path_str(path)?, FileStorage_WRITE)?;

        fs.write_str("calibration_time", &record.calibration_time)?;
        if let Some(nframes) = record.nframes {
            fs.write_i32("nframes", nframes as i32)?;
        }
        fs.write_i32("image_width", record.image_width as i32)?;
        fs.write_i32("image_height", record.image_height as i32)?;
        fs.write_i32("board_width", record.board_width as i32)?;
        fs.write_i32("board_height", record.board_height as i32)?;
        fs.write_f64("square_size", f64::from(record.square_size))?;
        if let Some(aspect_ratio) = record.aspect_ratio() {
            fs.write_f64("aspectRatio", aspect_ratio)?;
        }
        if let Some(comment) = record.flags.describe() {
            fs.write_comment(&comment, false)?;
        }
        fs.write_i32("flags", record.flags.bits())?;

        fs.write_mat("camera_matrix", &Mat::from_slice_2d(record.camera_matrix.as_slice())?)?;
        fs.write_mat(
            "distortion_coefficients",
            &column(&record.distortion_coefficients)?,
        )?;
        fs.write_f64("avg_reprojection_error", record.avg_reprojection_error)?;

        if let Some(errors) = &record.per_view_reprojection_errors {
            fs.write_mat("per_view_reprojection_errors", &column(errors)?)?;
        }
        if let Some(extrinsics) = &record.extrinsic_parameters {
            fs.write_comment(EXTRINSICS_COMMENT, false)?;
            fs.write_mat("extrinsic_parameters", &Mat::from_slice_2d(extrinsics.as_slice())?)?;
        }
        if let Some(views) = &record.image_points {
            let rows: Vec<Vec<Vec2f>> = views
                .iter()
                .map(|view| view.iter().map(|p| Vec2f::from([p.x, p.y])).collect())
                .collect();
            fs.write_mat("image_points", &Mat::from_slice_2d(rows.as_slice())?)?;
        }

        fs.release()?;
        Ok(())
    }
}
