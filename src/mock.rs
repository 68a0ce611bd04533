//! In-memory stand-ins for the camera, codecs, detector, solver and windows.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::time::Duration;

use image::{Rgb, RgbImage};

use crate::calib::{
    BoardGeometry, CalibrationFlags, CalibrationRecord, CalibrationSolver, CornerDetector,
    DetectionMode, ImagePoint, ObjectPoint, ParameterStore, Solution,
};
use crate::capture::{Frame, FrameSink, FrameSource};
use crate::display::PreviewSurface;
use crate::error::{Error, Result};

/// Top-left pixel of every image [`MockDetector`] treats as showing a board
pub const BOARD_MARKER: Rgb<u8> = Rgb([0, 255, 0]);
/// Pixel painted by [`MockDetector::draw_corners`] on a successful detection
pub const OVERLAY_MARKER: Rgb<u8> = Rgb([255, 0, 255]);
const BLANK: Rgb<u8> = Rgb([128, 128, 128]);

/// Checker pattern carrying the board marker
pub fn board_image(width: u32, height: u32) -> RgbImage {
    let mut image = RgbImage::from_fn(width, height, |x, y| {
        if (x / 8 + y / 8) % 2 == 0 {
            Rgb([255, 255, 255])
        } else {
            Rgb([0, 0, 0])
        }
    });
    image.put_pixel(0, 0, BOARD_MARKER);
    image
}

pub fn blank_image(width: u32, height: u32) -> RgbImage {
    RgbImage::from_pixel(width, height, BLANK)
}

/// Side-by-side frame, each half optionally showing a board, tagged with `sequence`
pub fn stereo_frame(width: u32, height: u32, left: bool, right: bool, sequence: u64) -> Frame {
    let half = width / 2;
    let side = |board: bool| {
        if board {
            board_image(half, height)
        } else {
            blank_image(half, height)
        }
    };
    let (left, right) = (side(left), side(right));

    let mut image = RgbImage::new(width, height);
    image::imageops::replace(&mut image, &left, 0, 0);
    image::imageops::replace(&mut image, &right, i64::from(half), 0);
    let tag = Rgb([sequence as u8, (sequence >> 8) as u8, 7]);
    image.put_pixel(2, 0, tag);
    image.put_pixel(half + 2, 0, tag);
    Frame::new(image, sequence)
}

/// Sequence number stored by [`stereo_frame`] in either half
pub fn frame_tag(image: &RgbImage) -> u64 {
    let px = image.get_pixel(2, 0);
    u64::from(px[0]) | (u64::from(px[1]) << 8)
}

/// Camera or video file replaying a fixed list of frames
#[derive(Default)]
pub struct MockCamera {
    frames: VecDeque<Frame>,
    fail_after: Option<usize>,
    delivered: usize,
}

impl MockCamera {
    pub fn new(frames: impl IntoIterator<Item = Frame>) -> Self {
        Self {
            frames: frames.into_iter().collect(),
            ..Self::default()
        }
    }

    /// One frame per `(left_has_board, right_has_board)` entry
    pub fn stereo(width: u32, height: u32, boards: &[(bool, bool)]) -> Self {
        Self::new(
            boards
                .iter()
                .enumerate()
                .map(|(i, (l, r))| stereo_frame(width, height, *l, *r, i as u64)),
        )
    }

    /// `count` frames without boards
    pub fn sequence(count: usize, width: u32, height: u32) -> Self {
        Self::stereo(width, height, &vec![(false, false); count])
    }

    /// Return a read error once `count` frames were delivered
    pub fn fail_after(mut self, count: usize) -> Self {
        self.fail_after = Some(count);
        self
    }
}

impl FrameSource for MockCamera {
    fn read_frame(&mut self) -> Result<Option<Frame>> {
        if self.fail_after == Some(self.delivered) {
            return Err(Error::Backend("mock read failure".into()));
        }
        self.delivered += 1;
        Ok(self.frames.pop_front())
    }
}

/// Output video kept in memory
#[derive(Default)]
pub struct MemorySink {
    pub frames: Vec<RgbImage>,
    pub finished: bool,
}

impl FrameSink for MemorySink {
    fn write_frame(&mut self, image: &RgbImage) -> Result<()> {
        if self.finished {
            return Err(Error::Backend("write after finish".into()));
        }
        self.frames.push(image.clone());
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.finished = true;
        Ok(())
    }
}

/// Finds a board wherever the top-left pixel is [`BOARD_MARKER`]
#[derive(Debug, Clone, Copy, Default)]
pub struct MockDetector;

impl CornerDetector for MockDetector {
    fn find_corners(
        &self,
        image: &RgbImage,
        board: &BoardGeometry,
        _mode: DetectionMode,
    ) -> Result<Option<Vec<ImagePoint>>> {
        if image.get_pixel(0, 0) != &BOARD_MARKER {
            return Ok(None);
        }
        let corners = board
            .object_points()
            .iter()
            .map(|p| ImagePoint::new(10.0 + p.x * 100.0, 10.0 + p.y * 100.0))
            .collect();
        Ok(Some(corners))
    }

    fn draw_corners(
        &self,
        image: &mut RgbImage,
        _board: &BoardGeometry,
        _corners: &[ImagePoint],
        found: bool,
    ) -> Result<()> {
        if found {
            image.put_pixel(1, 1, OVERLAY_MARKER);
        }
        Ok(())
    }
}

/// Counts invocations and returns a fixed solution, or an error when failing
#[derive(Debug, Default)]
pub struct MockSolver {
    calls: Cell<usize>,
    last_views: Cell<Option<usize>>,
    failing: bool,
}

impl MockSolver {
    pub const CAMERA_MATRIX: [[f64; 3]; 3] =
        [[500.0, 0.0, 320.0], [0.0, 500.0, 240.0], [0.0, 0.0, 1.0]];

    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.get()
    }

    pub fn last_view_count(&self) -> Option<usize> {
        self.last_views.get()
    }
}

impl CalibrationSolver for MockSolver {
    fn solve(
        &self,
        object_points: &[Vec<ObjectPoint>],
        image_points: &[Vec<ImagePoint>],
        _image_size: (u32, u32),
        _flags: &CalibrationFlags,
    ) -> Result<Solution> {
        assert_eq!(object_points.len(), image_points.len());
        assert!(!image_points.is_empty(), "solver called without views");
        self.calls.set(self.calls.get() + 1);
        self.last_views.set(Some(image_points.len()));
        if self.failing {
            return Err(Error::Backend("solver rejected input".into()));
        }

        let views = image_points.len();
        Ok(Solution {
            camera_matrix: Self::CAMERA_MATRIX,
            distortion: vec![0.0; 5],
            rotations: vec![[0.0, 0.0, 0.0]; views],
            translations: vec![[0.0, 0.0, 1.0]; views],
            rms: 0.25,
            per_view_errors: vec![0.25; views],
        })
    }
}

/// Keeps every saved record
#[derive(Debug, Default)]
pub struct MemoryStore {
    saved: RefCell<Vec<(PathBuf, CalibrationRecord)>>,
}

impl MemoryStore {
    pub fn saved(&self) -> Vec<(PathBuf, CalibrationRecord)> {
        self.saved.borrow().clone()
    }
}

impl ParameterStore for MemoryStore {
    fn save(&self, path: &Path, record: &CalibrationRecord) -> Result<()> {
        self.saved
            .borrow_mut()
            .push((path.to_path_buf(), record.clone()));
        Ok(())
    }
}

/// Replays a key script, one entry per poll; records what was shown
#[derive(Default)]
pub struct ScriptedPreview {
    keys: VecDeque<Option<char>>,
    pub shown: Vec<(RgbImage, RgbImage)>,
    pub waits: Vec<Duration>,
}

impl ScriptedPreview {
    pub fn new(keys: impl IntoIterator<Item = Option<char>>) -> Self {
        Self {
            keys: keys.into_iter().collect(),
            ..Self::default()
        }
    }
}

impl PreviewSurface for ScriptedPreview {
    fn show(&mut self, left: &RgbImage, right: &RgbImage) -> Result<()> {
        self.shown.push((left.clone(), right.clone()));
        Ok(())
    }

    fn poll_key(&mut self, timeout: Duration) -> Result<Option<char>> {
        self.waits.push(timeout);
        Ok(self.keys.pop_front().flatten())
    }
}
