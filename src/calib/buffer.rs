use image::RgbImage;

/// Accepted views for one camera, in the order they were accepted
#[derive(Debug, Clone, Default)]
pub struct CalibrationBuffer {
    images: Vec<RgbImage>,
}

impl CalibrationBuffer {
    pub fn push(&mut self, image: RgbImage) {
        self.images.push(image);
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    pub fn images(&self) -> &[RgbImage] {
        &self.images
    }

    /// True when the buffer holds strictly more than `minimum` images
    pub fn exceeds(&self, minimum: usize) -> bool {
        self.images.len() > minimum
    }
}

impl FromIterator<RgbImage> for CalibrationBuffer {
    fn from_iter<I: IntoIterator<Item = RgbImage>>(iter: I) -> Self {
        Self {
            images: iter.into_iter().collect(),
        }
    }
}

/// Left and right buffers, always appended together
#[derive(Debug, Clone, Default)]
pub struct StereoBuffers {
    pub left: CalibrationBuffer,
    pub right: CalibrationBuffer,
}

impl StereoBuffers {
    /// Append one accepted pair
    pub fn push_pair(&mut self, left: RgbImage, right: RgbImage) {
        self.left.push(left);
        self.right.push(right);
    }

    /// Number of accepted pairs
    pub fn pairs(&self) -> usize {
        self.left.len()
    }

    pub fn ready(&self, minimum: usize) -> bool {
        self.left.exceeds(minimum) && self.right.exceeds(minimum)
    }
}
