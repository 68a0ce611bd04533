use image::RgbImage;
use opencv::core::{Mat, Scalar, CV_8UC1, CV_8UC3};
use opencv::imgproc;
use opencv::prelude::*;

use crate::error::{Error, Result};

/// Copy an RGB image into a BGR `Mat`
pub fn mat_from_rgb(image: &RgbImage) -> Result<Mat> {
    let (width, height) = image.dimensions();
    let mut mat =
        Mat::new_rows_cols_with_default(height as i32, width as i32, CV_8UC3, Scalar::all(0.0))?;
    let dst = mat.data_bytes_mut()?;
    for (bgr, rgb) in dst.chunks_exact_mut(3).zip(image.as_raw().chunks_exact(3)) {
        bgr[0] = rgb[2];
        bgr[1] = rgb[1];
        bgr[2] = rgb[0];
    }
    Ok(mat)
}

/// Copy an 8-bit BGR or grayscale `Mat` into an RGB image
pub fn rgb_from_mat(mat: &Mat) -> Result<RgbImage> {
    let expanded;
    let bgr = match mat.typ() {
        CV_8UC3 => mat,
        CV_8UC1 => {
            let mut out = Mat::default();
            imgproc::cvt_color_def(mat, &mut out, imgproc::COLOR_GRAY2BGR)?;
            expanded = out;
            &expanded
        }
        other => {
            return Err(Error::Backend(format!("unsupported Mat type {other}")));
        }
    };

    let contiguous;
    let bgr = if bgr.is_continuous() {
        bgr
    } else {
        contiguous = bgr.try_clone()?;
        &contiguous
    };

    let size = bgr.size()?;
    let mut raw = Vec::with_capacity(bgr.data_bytes()?.len());
    for px in bgr.data_bytes()?.chunks_exact(3) {
        raw.extend_from_slice(&[px[2], px[1], px[0]]);
    }
    RgbImage::from_raw(size.width as u32, size.height as u32, raw)
        .ok_or_else(|| Error::Backend(format!("Mat of {size:?} has a short pixel buffer")))
}
