//! Fixed pixel-rectangle split of a combined side-by-side frame

use image::{imageops, RgbImage, SubImage};
use serde::{Deserialize, Serialize};

use crate::capture::Frame;
use crate::error::{Error, Result};

/// Pixel rectangle inside a combined frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Region {
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// True when the whole rectangle lies inside a `width`x`height` frame
    pub fn fits(&self, width: u32, height: u32) -> bool {
        let right = u64::from(self.x) + u64::from(self.width);
        let bottom = u64::from(self.y) + u64::from(self.height);
        right <= u64::from(width) && bottom <= u64::from(height)
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

/// Where the left and right cameras sit inside the combined frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StereoLayout {
    pub combined_width: u32,
    pub combined_height: u32,
    pub left: Region,
    pub right: Region,
}

impl Default for StereoLayout {
    fn default() -> Self {
        Self::midpoint(1280, 480)
    }
}

impl StereoLayout {
    /// Halves a `width`x`height` frame at the vertical midline
    pub fn midpoint(width: u32, height: u32) -> Self {
        let half = width / 2;
        Self {
            combined_width: width,
            combined_height: height,
            left: Region::new(0, 0, half, height),
            right: Region::new(half, 0, half, height),
        }
    }

    /// Size of each output side
    pub fn side_size(&self) -> (u32, u32) {
        self.left.size()
    }

    pub fn validate(&self) -> Result<()> {
        for region in [self.left, self.right] {
            if region.is_empty() {
                return Err(Error::InvalidConfig(format!("empty region {region:?}")));
            }
            if !region.fits(self.combined_width, self.combined_height) {
                return Err(Error::RegionOutOfBounds {
                    region,
                    width: self.combined_width,
                    height: self.combined_height,
                });
            }
        }
        if self.left.size() != self.right.size() {
            return Err(Error::InvalidConfig(format!(
                "left region {:?} and right region {:?} differ in size",
                self.left.size(),
                self.right.size()
            )));
        }
        Ok(())
    }

    /// Borrow the left and right sub-frames of `frame`.
    ///
    /// Fails with [`Error::RegionOutOfBounds`] when the frame is too small
    /// for either region; larger frames are cropped normally.
    pub fn split<'a>(&self, frame: &'a Frame) -> Result<StereoView<'a>> {
        Ok(StereoView {
            left: SubFrame::new(&frame.image, self.left)?,
            right: SubFrame::new(&frame.image, self.right)?,
        })
    }
}

/// Non-owning view of one camera's rectangle
pub struct SubFrame<'a> {
    view: SubImage<&'a RgbImage>,
    region: Region,
}

impl<'a> SubFrame<'a> {
    pub fn new(image: &'a RgbImage, region: Region) -> Result<Self> {
        let (width, height) = image.dimensions();
        if region.is_empty() || !region.fits(width, height) {
            return Err(Error::RegionOutOfBounds {
                region,
                width,
                height,
            });
        }
        let view = imageops::crop_imm(image, region.x, region.y, region.width, region.height);
        Ok(Self { view, region })
    }

    pub fn region(&self) -> Region {
        self.region
    }

    /// Owned copy, detached from the combined frame
    pub fn to_image(&self) -> RgbImage {
        self.view.to_image()
    }
}

/// Left and right views of one combined frame
pub struct StereoView<'a> {
    pub left: SubFrame<'a>,
    pub right: SubFrame<'a>,
}
