//! Interactive capture loop: preview, buffer accepted pairs, calibrate on request

use std::borrow::Cow;
use std::time::{Duration, Instant};

use image::RgbImage;
use tracing::{debug, info, warn};

use crate::calib::{
    CalibrationSolver, Calibrator, CornerDetector, DetectionMode, ImagePoint, ParameterStore,
    StereoBuffers,
};
use crate::capture::{FrameSource, StereoLayout};
use crate::display::{Command, ExitAction, KeyBindings, PreviewSurface};
use crate::error::{Error, Result};
use crate::PreviewConfig;

/// What a key press led to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOutcome {
    Buffered { pairs: usize },
    /// Accept pressed while neither side showed a board
    NothingDetected,
    Calibrated,
    NotEnoughImages { left: usize, right: usize },
    /// Both buffers were large enough but no usable views were found
    CalibrationRejected,
    /// Solver or parameter file failure; buffers are kept for another attempt
    CalibrationFailed,
    ExitIgnored,
    Quit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// A frame was processed; carries the result of the key press, if any
    Frame(Option<CommandOutcome>),
    EndOfStream,
    Quit,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionSummary {
    pub frames: u64,
    pub pairs_buffered: usize,
    pub calibrations: usize,
}

/// Per-side detections of the current frame
#[derive(Debug, Clone, Default)]
struct Detections {
    left: Option<Vec<ImagePoint>>,
    right: Option<Vec<ImagePoint>>,
}

impl Detections {
    fn any(&self) -> bool {
        self.left.is_some() || self.right.is_some()
    }
}

pub struct CaptureSession<'c, D, S, P> {
    calibrator: &'c Calibrator<D, S, P>,
    layout: StereoLayout,
    keys: KeyBindings,
    exit_action: ExitAction,
    key_wait: Duration,
    buffers: StereoBuffers,
    summary: SessionSummary,
}

impl<'c, D, S, P> CaptureSession<'c, D, S, P>
where
    D: CornerDetector,
    S: CalibrationSolver,
    P: ParameterStore,
{
    pub fn new(
        calibrator: &'c Calibrator<D, S, P>,
        layout: StereoLayout,
        preview: &PreviewConfig,
    ) -> Self {
        Self {
            calibrator,
            layout,
            keys: preview.keys,
            exit_action: preview.exit_action,
            key_wait: preview.key_wait(),
            buffers: StereoBuffers::default(),
            summary: SessionSummary::default(),
        }
    }

    pub fn buffers(&self) -> &StereoBuffers {
        &self.buffers
    }

    pub fn summary(&self) -> SessionSummary {
        self.summary
    }

    /// Loop until the source runs dry or the exit key quits
    pub fn run<Src, Prev>(&mut self, source: &mut Src, preview: &mut Prev) -> Result<SessionSummary>
    where
        Src: FrameSource,
        Prev: PreviewSurface,
    {
        info!(
            "Press '{}' to buffer a pair, '{}' to calibrate",
            self.keys.accept.escape_default(),
            self.keys.calibrate
        );
        loop {
            match self.step(source, preview)? {
                StepOutcome::Frame(_) => {}
                StepOutcome::EndOfStream => {
                    info!("Capture source ended");
                    break;
                }
                StepOutcome::Quit => break,
            }
        }
        Ok(self.summary)
    }

    /// One read, detect, display and key-poll iteration
    pub fn step<Src, Prev>(&mut self, source: &mut Src, preview: &mut Prev) -> Result<StepOutcome>
    where
        Src: FrameSource,
        Prev: PreviewSurface,
    {
        let Some(frame) = source.read_frame()? else {
            return Ok(StepOutcome::EndOfStream);
        };
        self.summary.frames += 1;

        let view = self.layout.split(&frame)?;
        let left = view.left.to_image();
        let right = view.right.to_image();

        let started = Instant::now();
        let detections = Detections {
            left: self.detect(&left)?,
            right: self.detect(&right)?,
        };
        metrics::histogram!("preview_detect_ms").record(started.elapsed().as_millis() as f64);

        {
            let left_shown = self.overlay(&left, detections.left.as_deref())?;
            let right_shown = self.overlay(&right, detections.right.as_deref())?;
            preview.show(&left_shown, &right_shown)?;
        }

        let Some(command) = preview
            .poll_key(self.key_wait)?
            .and_then(|key| self.keys.command(key))
        else {
            return Ok(StepOutcome::Frame(None));
        };

        let outcome = match command {
            Command::Accept => self.accept(left, right, &detections),
            Command::Calibrate => self.calibrate(),
            Command::Exit => match self.exit_action {
                ExitAction::Ignore => {
                    debug!("Exit key has no action bound");
                    CommandOutcome::ExitIgnored
                }
                ExitAction::Quit => {
                    info!("Exit requested");
                    return Ok(StepOutcome::Quit);
                }
            },
        };
        Ok(StepOutcome::Frame(Some(outcome)))
    }

    fn detect(&self, image: &RgbImage) -> Result<Option<Vec<ImagePoint>>> {
        self.calibrator.detector().find_corners(
            image,
            self.calibrator.board(),
            DetectionMode::Preview,
        )
    }

    fn overlay<'a>(
        &self,
        image: &'a RgbImage,
        corners: Option<&[ImagePoint]>,
    ) -> Result<Cow<'a, RgbImage>> {
        let Some(corners) = corners else {
            return Ok(Cow::Borrowed(image));
        };
        let mut drawn = image.clone();
        self.calibrator
            .detector()
            .draw_corners(&mut drawn, self.calibrator.board(), corners, true)?;
        Ok(Cow::Owned(drawn))
    }

    fn accept(
        &mut self,
        left: RgbImage,
        right: RgbImage,
        detections: &Detections,
    ) -> CommandOutcome {
        if !detections.any() {
            debug!("No board visible, pair not buffered");
            return CommandOutcome::NothingDetected;
        }
        self.buffers.push_pair(left, right);
        self.summary.pairs_buffered += 1;
        metrics::counter!("stereo_pairs_buffered").increment(1);
        let pairs = self.buffers.pairs();
        info!(
            pairs,
            left_found = detections.left.is_some(),
            right_found = detections.right.is_some(),
            "Image saved to buffer"
        );
        CommandOutcome::Buffered { pairs }
    }

    fn calibrate(&mut self) -> CommandOutcome {
        match self.calibrator.calibrate_stereo(&self.buffers) {
            Ok(_) => {
                self.summary.calibrations += 1;
                info!("Calibration files saved");
                CommandOutcome::Calibrated
            }
            Err(Error::NotEnoughImages {
                left,
                right,
                required,
            }) => {
                warn!("Not enough images: left {left}, right {right}, need more than {required}");
                CommandOutcome::NotEnoughImages { left, right }
            }
            Err(err @ Error::NoCorrespondences { .. }) => {
                warn!("Calibration rejected: {err}");
                CommandOutcome::CalibrationRejected
            }
            Err(err) => {
                warn!(pairs = self.buffers.pairs(), "Calibration failed: {err}");
                CommandOutcome::CalibrationFailed
            }
        }
    }
}
