use image::RgbImage;
use opencv::calib3d;
use opencv::core::{Mat, Point2f, Size, TermCriteria, Vector};
use opencv::imgproc;

use super::{mat_from_rgb, rgb_from_mat};
use crate::calib::{BoardGeometry, CornerDetector, DetectionMode, ImagePoint};
use crate::error::Result;

/// COUNT | EPS
const TERM_COUNT_EPS: i32 = 3;

/// `findChessboardCorners`, refined to sub-pixel accuracy in thorough mode
#[derive(Debug, Clone, Copy, Default)]
pub struct ChessboardDetector;

fn pattern_size(board: &BoardGeometry) -> Size {
    Size::new(board.columns as i32, board.rows as i32)
}

impl CornerDetector for ChessboardDetector {
    fn find_corners(
        &self,
        image: &RgbImage,
        board: &BoardGeometry,
        mode: DetectionMode,
    ) -> Result<Option<Vec<ImagePoint>>> {
        let mat = mat_from_rgb(image)?;
        let mut flags = calib3d::CALIB_CB_ADAPTIVE_THRESH | calib3d::CALIB_CB_NORMALIZE_IMAGE;
        if mode == DetectionMode::Preview {
            flags |= calib3d::CALIB_CB_FAST_CHECK;
        }

        let mut corners = Vector::<Point2f>::new();
        if !calib3d::find_chessboard_corners(&mat, pattern_size(board), &mut corners, flags)? {
            return Ok(None);
        }

        if mode == DetectionMode::Thorough {
            let mut gray = Mat::default();
            imgproc::cvt_color_def(&mat, &mut gray, imgproc::COLOR_BGR2GRAY)?;
            imgproc::corner_sub_pix(
                &gray,
                &mut corners,
                Size::new(5, 5),
                Size::new(-1, -1),
                TermCriteria::new(TERM_COUNT_EPS, 30, 0.01)?,
            )?;
        }

        Ok(Some(
            corners.iter().map(|p| ImagePoint::new(p.x, p.y)).collect(),
        ))
    }

    fn draw_corners(
        &self,
        image: &mut RgbImage,
        board: &BoardGeometry,
        corners: &[ImagePoint],
        found: bool,
    ) -> Result<()> {
        let mut mat = mat_from_rgb(image)?;
        let points: Vector<Point2f> = corners.iter().map(|p| Point2f::new(p.x, p.y)).collect();
        calib3d::draw_chessboard_corners(&mut mat, pattern_size(board), &points, found)?;
        *image = rgb_from_mat(&mat)?;
        Ok(())
    }
}
