use std::time::Duration;

use image::RgbImage;
use opencv::highgui;
use tracing::{instrument, warn};

use super::mat_from_rgb;
use crate::display::PreviewSurface;
use crate::error::Result;

/// Two auto-sized highgui windows, one per camera
pub struct HighGuiPreview {
    left: String,
    right: String,
}

impl HighGuiPreview {
    #[instrument]
    pub fn new(left: &str, right: &str) -> Result<Self> {
        highgui::named_window(left, highgui::WINDOW_AUTOSIZE)?;
        highgui::named_window(right, highgui::WINDOW_AUTOSIZE)?;
        Ok(Self {
            left: left.to_owned(),
            right: right.to_owned(),
        })
    }
}

impl PreviewSurface for HighGuiPreview {
    fn show(&mut self, left: &RgbImage, right: &RgbImage) -> Result<()> {
        highgui::imshow(&self.left, &mat_from_rgb(left)?)?;
        highgui::imshow(&self.right, &mat_from_rgb(right)?)?;
        Ok(())
    }

    fn poll_key(&mut self, timeout: Duration) -> Result<Option<char>> {
        let delay = i32::try_from(timeout.as_millis()).unwrap_or(i32::MAX).max(1);
        let key = highgui::wait_key(delay)?;
        if key < 0 {
            return Ok(None);
        }
        Ok(char::from_u32((key & 0xff) as u32))
    }
}

impl Drop for HighGuiPreview {
    fn drop(&mut self) {
        for name in [&self.left, &self.right] {
            if let Err(err) = highgui::destroy_window(name) {
                warn!("Failed to close window {name}: {err}");
            }
        }
    }
}
