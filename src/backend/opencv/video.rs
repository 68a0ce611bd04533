//! Camera and video file input, encoded video output

use std::path::{Path, PathBuf};

use image::RgbImage;
use opencv::core::{Mat, Size};
use opencv::prelude::*;
use opencv::videoio::{self, VideoCapture, VideoWriter};
use tracing::{info, instrument};

use super::{mat_from_rgb, path_str, rgb_from_mat};
use crate::capture::{Frame, FrameSink, FrameSource};
use crate::error::{Error, Result};

/// Frames from a numbered camera or a video file
pub struct CameraSource {
    capture: VideoCapture,
    sequence: u64,
}

impl CameraSource {
    /// `None` when the device cannot be opened
    #[instrument]
    pub fn open_device(index: i32) -> Result<Option<Self>> {
        let capture = VideoCapture::new(index, videoio::CAP_ANY)?;
        Self::opened(capture)
    }

    /// `None` when the file cannot be opened or decoded
    #[instrument]
    pub fn open_file(path: &Path) -> Result<Option<Self>> {
        let capture = VideoCapture::from_file(path_str(path)?, videoio::CAP_ANY)?;
        Self::opened(capture)
    }

    fn opened(capture: VideoCapture) -> Result<Option<Self>> {
        if !capture.is_opened()? {
            return Ok(None);
        }
        info!(
            "Opened source: {}x{} @ {} fps",
            capture.get(videoio::CAP_PROP_FRAME_WIDTH)?,
            capture.get(videoio::CAP_PROP_FRAME_HEIGHT)?,
            capture.get(videoio::CAP_PROP_FPS)?
        );
        Ok(Some(Self {
            capture,
            sequence: 0,
        }))
    }

    pub fn release(&mut self) -> Result<()> {
        self.capture.release()?;
        Ok(())
    }
}

impl FrameSource for CameraSource {
    fn read_frame(&mut self) -> Result<Option<Frame>> {
        let mut mat = Mat::default();
        if !self.capture.read(&mut mat)? || mat.empty() {
            return Ok(None);
        }
        let frame = Frame::new(rgb_from_mat(&mat)?, self.sequence);
        self.sequence += 1;
        Ok(Some(frame))
    }
}

/// Encoded output video of fixed frame size. Existing files are truncated.
pub struct VideoFileSink {
    writer: VideoWriter,
    path: PathBuf,
    size: (u32, u32),
}

impl VideoFileSink {
    #[instrument]
    pub fn create(path: &Path, codec: [char; 4], fps: f64, size: (u32, u32)) -> Result<Self> {
        let fourcc = VideoWriter::fourcc(codec[0], codec[1], codec[2], codec[3])?;
        let writer = VideoWriter::new(
            path_str(path)?,
            fourcc,
            fps,
            Size::new(size.0 as i32, size.1 as i32),
            true,
        )?;
        if !writer.is_opened()? {
            return Err(Error::Backend(format!(
                "cannot open video writer for {}",
                path.display()
            )));
        }
        Ok(Self {
            writer,
            path: path.to_path_buf(),
            size,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl FrameSink for VideoFileSink {
    fn write_frame(&mut self, image: &RgbImage) -> Result<()> {
        // The encoder drops frames of the wrong size without complaint
        if image.dimensions() != self.size {
            return Err(Error::Backend(format!(
                "{}: frame is {:?}, writer expects {:?}",
                self.path.display(),
                image.dimensions(),
                self.size
            )));
        }
        self.writer.write(&mat_from_rgb(image)?)?;
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.writer.release()?;
        Ok(())
    }
}
