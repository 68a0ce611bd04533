//! Split a side-by-side stereo recording into one video per camera

use tracing::{debug, info, instrument};

use crate::capture::{FrameSink, FrameSource, StereoLayout};
use crate::error::Result;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SplitSummary {
    pub frames: u64,
}

/// Copy every frame's left and right regions into their sinks, in order.
///
/// Both sinks are finished once the source is exhausted. On error the
/// sinks are left as they are.
#[instrument(skip_all)]
pub fn split_video<Src, L, R>(
    source: &mut Src,
    layout: &StereoLayout,
    left: &mut L,
    right: &mut R,
) -> Result<SplitSummary>
where
    Src: FrameSource,
    L: FrameSink,
    R: FrameSink,
{
    let mut summary = SplitSummary::default();
    info!("Splitting... Wait a moment!");

    while let Some(frame) = source.read_frame()? {
        let view = layout.split(&frame)?;
        left.write_frame(&view.left.to_image())?;
        right.write_frame(&view.right.to_image())?;

        summary.frames += 1;
        metrics::counter!("split_frames").increment(1);
        if summary.frames % 100 == 0 {
            debug!(frames = summary.frames, "Split progress");
        }
    }

    left.finish()?;
    right.finish()?;
    info!(frames = summary.frames, "Split completed");
    Ok(summary)
}
