use std::time::Instant;

use image::RgbImage;

/// A decoded frame as delivered by a camera or video file
#[derive(Clone)]
pub struct Frame {
    /// Decoded pixels, RGB order
    pub image: RgbImage,

    /// Frame metadata
    pub meta: FrameMetadata,

    /// Capture timestamp
    pub timestamp: Instant,
}

/// Frame metadata
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameMetadata {
    pub sequence: u64,
    pub width: u32,
    pub height: u32,
}

impl Frame {
    pub fn new(image: RgbImage, sequence: u64) -> Self {
        let meta = FrameMetadata {
            sequence,
            width: image.width(),
            height: image.height(),
        };
        Self {
            image,
            meta,
            timestamp: Instant::now(),
        }
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.meta.width, self.meta.height)
    }
}

impl std::fmt::Debug for Frame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Frame")
            .field("meta", &self.meta)
            .field("timestamp", &self.timestamp)
            .finish_non_exhaustive()
    }
}
