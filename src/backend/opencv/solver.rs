use opencv::calib3d;
use opencv::core::{Mat, Point2f, Point3f, Size, TermCriteria, Vector, CV_64F};
use opencv::prelude::*;
use tracing::{debug, instrument};

use crate::calib::{CalibrationFlags, CalibrationSolver, ImagePoint, ObjectPoint, Solution};
use crate::error::{Error, Result};

/// COUNT | EPS
const TERM_COUNT_EPS: i32 = 3;

/// `calibrateCameraExtended` with the library's default termination criteria
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenCvSolver;

fn vec3(mat: &Mat) -> Result<[f64; 3]> {
    match mat.data_typed::<f64>()? {
        [a, b, c] => Ok([*a, *b, *c]),
        other => Err(Error::Backend(format!(
            "expected a 3-vector, got {} values",
            other.len()
        ))),
    }
}

fn column(mat: &Mat) -> Result<Vec<f64>> {
    if mat.empty() {
        return Ok(Vec::new());
    }
    let contiguous = mat.try_clone()?;
    Ok(contiguous.data_typed::<f64>()?.to_vec())
}

impl CalibrationSolver for OpenCvSolver {
    #[instrument(skip_all, fields(views = image_points.len()))]
    fn solve(
        &self,
        object_points: &[Vec<ObjectPoint>],
        image_points: &[Vec<ImagePoint>],
        image_size: (u32, u32),
        flags: &CalibrationFlags,
    ) -> Result<Solution> {
        let objects: Vector<Vector<Point3f>> = object_points
            .iter()
            .map(|view| view.iter().map(|p| Point3f::new(p.x, p.y, p.z)).collect())
            .collect();
        let images: Vector<Vector<Point2f>> = image_points
            .iter()
            .map(|view| view.iter().map(|p| Point2f::new(p.x, p.y)).collect())
            .collect();

        let mut camera_matrix = Mat::eye(3, 3, CV_64F)?.to_mat()?;
        if flags.fix_aspect_ratio {
            *camera_matrix.at_2d_mut::<f64>(0, 0)? = flags.aspect_ratio;
        }
        let mut distortion = Mat::default();
        let mut rvecs = Vector::<Mat>::new();
        let mut tvecs = Vector::<Mat>::new();
        let mut std_intrinsics = Mat::default();
        let mut std_extrinsics = Mat::default();
        let mut per_view = Mat::default();

        let rms = calib3d::calibrate_camera_extended(
            &objects,
            &images,
            Size::new(image_size.0 as i32, image_size.1 as i32),
            &mut camera_matrix,
            &mut distortion,
            &mut rvecs,
            &mut tvecs,
            &mut std_intrinsics,
            &mut std_extrinsics,
            &mut per_view,
            flags.bits(),
            TermCriteria::new(TERM_COUNT_EPS, 30, f64::EPSILON)?,
        )?;
        debug!(rms, "calibrateCameraExtended finished");

        let mut intrinsics = [[0.0; 3]; 3];
        for (r, row) in intrinsics.iter_mut().enumerate() {
            for (c, value) in row.iter_mut().enumerate() {
                *value = *camera_matrix.at_2d::<f64>(r as i32, c as i32)?;
            }
        }

        Ok(Solution {
            camera_matrix: intrinsics,
            distortion: column(&distortion)?,
            rotations: rvecs.iter().map(|m| vec3(&m)).collect::<Result<_>>()?,
            translations: tvecs.iter().map(|m| vec3(&m)).collect::<Result<_>>()?,
            rms,
            per_view_errors: column(&per_view)?,
        })
    }
}
