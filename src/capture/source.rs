use image::RgbImage;

use crate::capture::Frame;
use crate::error::Result;

/// Anything that yields combined frames one at a time: a camera or a video file
pub trait FrameSource {
    /// Next frame, or `None` once the source is exhausted
    fn read_frame(&mut self) -> Result<Option<Frame>>;
}

/// Sequential frame consumer, typically an encoded output video
pub trait FrameSink {
    fn write_frame(&mut self, image: &RgbImage) -> Result<()>;

    /// Flush and release the sink; no writes may follow
    fn finish(&mut self) -> Result<()>;
}

impl<S: FrameSource + ?Sized> FrameSource for Box<S> {
    fn read_frame(&mut self) -> Result<Option<Frame>> {
        (**self).read_frame()
    }
}

impl<S: FrameSink + ?Sized> FrameSink for Box<S> {
    fn write_frame(&mut self, image: &RgbImage) -> Result<()> {
        (**self).write_frame(image)
    }

    fn finish(&mut self) -> Result<()> {
        (**self).finish()
    }
}
